//! Recall Core Library
//!
//! This crate provides the foundational utilities shared by the Recall crates:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management, including the history policy knobs

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::{AppConfig, HistoryPolicy};
pub use error::{AppError, AppResult};
