//! Shared core types: the error taxonomy and protocol selection.

mod error;

pub use error::PublishError;

use serde::{Deserialize, Serialize};

/// URL scheme used when joining an object name onto a CDN base URL.
///
/// Commands accept this as an explicit override; without one, the
/// configured `always_use_https` flag decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Http,
    Https,
}

impl Protocol {
    /// Scheme name as it appears in config keys and URLs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
