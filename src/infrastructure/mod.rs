//! Infrastructure layer for filesystem and environment interactions.
//!
//! Platform-specific locations for the configuration file and the optional
//! log file, plus `~` expansion for user-supplied paths.

pub mod paths;

pub use paths::{config_dir, default_config_path, ensure_parent, expand_tilde};
