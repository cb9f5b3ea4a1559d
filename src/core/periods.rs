//! Calendar period constants used for window and horizon sizing.

/// Trading days in a year.
pub const TDAYS_PER_YEAR: usize = 252;

/// Trading days in a month.
pub const TDAYS_PER_MONTH: usize = 21;

/// Trading days in a week.
pub const TDAYS_PER_WEEK: usize = 5;

/// Calendar days in a year.
pub const CDAYS_PER_YEAR: usize = 365;
