//! Common utilities and shared types for Broto Complain Track.
//!
//! This crate provides foundational components used across all broto crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **Storage**: The [`StorageBackend`] seam and attachment object paths
//!
//! # Example
//!
//! ```no_run
//! use broto_common::{AppResult, Config};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     println!("Backend: {}", config.backend.url);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod storage;

pub use config::{BackendConfig, ChatbotConfig, Config};
pub use error::{AppError, AppResult};
pub use storage::{FileUpload, StorageBackend, UploadedFile, attachment_key};
