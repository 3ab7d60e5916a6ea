pub mod commands;
pub mod controller;
pub mod state;

pub use controller::{SessionStatistics, TrackerController, TrackerSnapshot};
pub use state::{TrackerState, TrackerStatus};
