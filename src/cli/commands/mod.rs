//! CLI command implementations.

mod config;
mod doctor;
mod history;
mod process;
mod serve;

pub use config::run_config;
pub use doctor::run_doctor;
pub use history::run_history;
pub use process::run_process;
pub use serve::run_serve;
