//! Supported webhook provider families.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A webhook provider this service knows how to translate.
///
/// The wire form (and the inbox `family` field) uses the provider's own
/// capitalization: `"GitHub"`, `"GitLab"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProviderFamily {
    GitHub,
    GitLab,
}

impl ProviderFamily {
    /// All supported families, in translator priority order.
    pub const ALL: [ProviderFamily; 2] = [ProviderFamily::GitHub, ProviderFamily::GitLab];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderFamily::GitHub => "GitHub",
            ProviderFamily::GitLab => "GitLab",
        }
    }
}

impl fmt::Display for ProviderFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The input named a provider family this service does not support.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("\"{0}\" is not a supported provider family")]
pub struct UnknownFamily(pub String);

impl FromStr for ProviderFamily {
    type Err = UnknownFamily;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GitHub" => Ok(ProviderFamily::GitHub),
            "GitLab" => Ok(ProviderFamily::GitLab),
            other => Err(UnknownFamily(other.to_string())),
        }
    }
}
