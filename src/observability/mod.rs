//! Structured logging with optional size-rotated file output.
//!
//! # Architecture
//!
//! ```text
//! tracing macros → EnvFilter → fmt layer → stderr
//!                                        ↘ RotatingFile (when log_file is set)
//! ```
//!
//! # Features
//!
//! - **Automatic Rotation**: Files rotate at 10MB with 3-backup retention
//! - **Spans**: One span per handled event, per search, and per download batch
//!
//! # Configuration
//!
//! Log level is controlled via:
//! 1. `RUST_LOG` environment variable (highest priority)
//! 2. `trace_level` config option
//! 3. Default: `"info"`
//!
//! # Modules
//!
//! - [`init`]: Subscriber setup
//! - [`file_writer`]: Rotating file writer with size-based rotation

pub mod file_writer;
mod init;

pub use file_writer::RotatingFile;
pub use init::init_tracing;
