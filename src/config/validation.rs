//! Configuration validation logic.

use crate::config::loader::Config;
use crate::error::{Error, Result};

/// Smallest accepted chunk size.
const MIN_CHUNK_SIZE: usize = 1024;

/// Largest accepted chunk size.
const MAX_CHUNK_SIZE: usize = 1024 * 1024;

/// Longest accepted cancel grace period.
const MAX_CANCEL_GRACE_MS: u64 = 60_000;

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_chunk_size(config.download.chunk_size)?;
    validate_cancel_grace(config.registry.cancel_grace_ms)?;
    validate_user_agent(&config.network.user_agent)?;
    validate_connect_timeout(config.network.connect_timeout_secs)?;

    Ok(())
}

/// Validate the copy loop chunk size.
pub fn validate_chunk_size(chunk_size: usize) -> Result<()> {
    if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&chunk_size) {
        return Err(Error::ConfigValidation {
            field: "chunk_size".to_string(),
            message: format!(
                "Chunk size must be between {} and {} bytes (got {})",
                MIN_CHUNK_SIZE, MAX_CHUNK_SIZE, chunk_size
            ),
        });
    }

    Ok(())
}

/// Validate the cancel grace period.
pub fn validate_cancel_grace(grace_ms: u64) -> Result<()> {
    if grace_ms > MAX_CANCEL_GRACE_MS {
        return Err(Error::ConfigValidation {
            field: "cancel_grace_ms".to_string(),
            message: format!(
                "Grace period must be at most {} ms (got {})",
                MAX_CANCEL_GRACE_MS, grace_ms
            ),
        });
    }

    Ok(())
}

/// Validate the user agent string.
pub fn validate_user_agent(user_agent: &str) -> Result<()> {
    if user_agent.trim().is_empty() {
        return Err(Error::ConfigValidation {
            field: "user_agent".to_string(),
            message: "User agent cannot be empty".to_string(),
        });
    }

    Ok(())
}

/// Validate the optional connect timeout.
pub fn validate_connect_timeout(timeout_secs: Option<u64>) -> Result<()> {
    if timeout_secs == Some(0) {
        return Err(Error::ConfigValidation {
            field: "connect_timeout_secs".to_string(),
            message: "Connect timeout must be greater than zero; omit it to disable".to_string(),
        });
    }

    Ok(())
}
