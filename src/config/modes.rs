//! Resume policy definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a paused session picks up its transfer again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResumePolicy {
    /// Reopen the source at the bytes already written and append (default).
    ///
    /// Falls back to a restart when the source cannot seek.
    #[default]
    Continue,
    /// Reopen the source from byte 0 and truncate the output file.
    Restart,
}

impl fmt::Display for ResumePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResumePolicy::Continue => write!(f, "continue"),
            ResumePolicy::Restart => write!(f, "restart"),
        }
    }
}

impl FromStr for ResumePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "continue" => Ok(ResumePolicy::Continue),
            "restart" => Ok(ResumePolicy::Restart),
            _ => Err(format!("Unknown resume policy: {}", s)),
        }
    }
}
