//! Recurrent network mapping an input window to an output window.
//!
//! One LSTM layer reads the window one value per step; a dense layer projects
//! the final hidden state onto the output window. Training minimises mean
//! squared error with Adam and backpropagation through time.

mod adam;
mod config;
mod network;
mod params;

pub use adam::AdamConfig;
pub use config::LstmConfig;
pub use network::{LayerSummary, LstmNetwork, NetworkSummary};
