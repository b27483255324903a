//! CLI command handlers, one file per command.

mod config;
mod delays;
mod simulate;

pub use config::run_config;
pub use delays::run_delays;
pub use simulate::{run_simulate, SimulateArgs};
