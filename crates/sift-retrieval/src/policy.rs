//! What to do when a retrieval backend fails.

use serde::{Deserialize, Serialize};
use sift_core::Error;
use std::fmt;
use std::str::FromStr;

/// Behavior when the embedder or an index fails during a call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Propagate the failure to the caller.
    #[default]
    Fail,
    /// Serve whatever the surviving retrieval path returns.
    ///
    /// A failed semantic path falls back to lexical results; in hybrid mode
    /// either side may stand in for the other. Reranker failures are never
    /// degraded.
    Degrade,
}

impl FallbackPolicy {
    /// True if `err` may be absorbed under this policy.
    pub fn absorbs(&self, err: &Error) -> bool {
        match self {
            Self::Fail => false,
            Self::Degrade => {
                matches!(err, Error::EmbeddingFailure(_) | Error::IndexUnavailable { .. })
            }
        }
    }

    /// Policy name as used in configuration files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fail => "fail",
            Self::Degrade => "degrade",
        }
    }
}

impl fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FallbackPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fail" => Ok(Self::Fail),
            "degrade" => Ok(Self::Degrade),
            other => Err(Error::config(format!(
                "Unknown fallback policy '{other}', expected 'fail' or 'degrade'"
            ))),
        }
    }
}
