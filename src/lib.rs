pub mod commands;
pub mod config;
pub mod discord;
pub mod error;

// Re-export commonly used types
pub use config::Config;
pub use error::{CommandError, DoormanError, Result};
