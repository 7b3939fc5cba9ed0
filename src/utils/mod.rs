//! Utility modules for error handling, configuration and display formatting

pub mod config;
pub mod error;
pub mod format;

// Re-export for convenience
pub use config::ClientSettings;
pub use error::{Result, VidloaderError};
pub use format::{format_eta, format_file_size, format_speed};
