//! Configuration module for streamvault.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - Resume policy selection
//! - Configuration validation

pub mod loader;
pub mod modes;
pub mod validation;

pub use loader::{Config, DownloadConfig, NetworkConfig, RegistryConfig, DEFAULT_CHUNK_SIZE};
pub use modes::ResumePolicy;
pub use validation::validate_config;
