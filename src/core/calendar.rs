//! Business-day calendar arithmetic.

use chrono::{DateTime, Datelike, Duration, Utc, Weekday};

/// Holiday annotations for a business-day calendar.
#[derive(Debug, Clone, Default)]
pub struct CalendarAnnotations {
    holidays: Vec<DateTime<Utc>>,
}

impl CalendarAnnotations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_holidays(mut self, holidays: Vec<DateTime<Utc>>) -> Self {
        self.holidays = holidays;
        self
    }

    pub fn holidays(&self) -> &[DateTime<Utc>] {
        &self.holidays
    }

    pub fn is_holiday(&self, timestamp: &DateTime<Utc>) -> bool {
        self.holidays
            .iter()
            .any(|h| h.date_naive() == timestamp.date_naive())
    }

    pub fn is_business_day(&self, timestamp: &DateTime<Utc>) -> bool {
        is_weekday(timestamp) && !self.is_holiday(timestamp)
    }
}

/// Check whether a timestamp falls on Monday to Friday.
pub fn is_weekday(timestamp: &DateTime<Utc>) -> bool {
    !matches!(timestamp.weekday(), Weekday::Sat | Weekday::Sun)
}

/// First business day strictly after `timestamp`.
///
/// Without a calendar only weekends are skipped.
pub fn next_business_day(
    timestamp: DateTime<Utc>,
    calendar: Option<&CalendarAnnotations>,
) -> DateTime<Utc> {
    let mut next = timestamp + Duration::days(1);
    while !is_business(&next, calendar) {
        next += Duration::days(1);
    }
    next
}

/// The `n` business days following `last`, in increasing order.
///
/// # Example
/// ```
/// use chrono::{TimeZone, Utc};
/// use sigforecast::core::business_days_after;
///
/// // Friday 2024-01-05 -> Mon 8th, Tue 9th
/// let friday = Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap();
/// let days = business_days_after(friday, 2, None);
/// assert_eq!(days[0], Utc.with_ymd_and_hms(2024, 1, 8, 0, 0, 0).unwrap());
/// assert_eq!(days[1], Utc.with_ymd_and_hms(2024, 1, 9, 0, 0, 0).unwrap());
/// ```
pub fn business_days_after(
    last: DateTime<Utc>,
    n: usize,
    calendar: Option<&CalendarAnnotations>,
) -> Vec<DateTime<Utc>> {
    let mut days = Vec::with_capacity(n);
    let mut current = last;
    for _ in 0..n {
        current = next_business_day(current, calendar);
        days.push(current);
    }
    days
}

/// The `n` calendar days following `last`, one day apart.
pub fn calendar_days_after(last: DateTime<Utc>, n: usize) -> Vec<DateTime<Utc>> {
    (1..=n as i64).map(|i| last + Duration::days(i)).collect()
}

fn is_business(timestamp: &DateTime<Utc>, calendar: Option<&CalendarAnnotations>) -> bool {
    match calendar {
        Some(c) => c.is_business_day(timestamp),
        None => is_weekday(timestamp),
    }
}
