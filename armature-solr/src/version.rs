//! Solr protocol versions.

use crate::error::{Result, SolrError};

/// Wire protocol generation spoken by the target server.
///
/// Only the major release matters: it decides which attributes the
/// maintenance messages carry and which update formats are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProtocolVersion {
    /// Solr 1.x.
    Solr1,
    /// Solr 3.x.
    Solr3,
    /// Solr 4.x and every later major release.
    Solr4,
}

impl ProtocolVersion {
    /// Map a Solr major release number to a protocol version.
    pub fn from_major(major: u32) -> Result<Self> {
        match major {
            1 => Ok(Self::Solr1),
            3 => Ok(Self::Solr3),
            n if n >= 4 => Ok(Self::Solr4),
            n => Err(SolrError::Configuration(format!(
                "unsupported Solr major version: {}",
                n
            ))),
        }
    }

    /// Parse a spec version string such as `"4.10.2"`.
    pub fn from_spec_version(spec: &str) -> Result<Self> {
        let major = spec
            .split('.')
            .next()
            .and_then(|m| m.trim().parse::<u32>().ok())
            .ok_or_else(|| {
                SolrError::Configuration(format!("unrecognized Solr version: {:?}", spec))
            })?;
        Self::from_major(major)
    }

    /// Value forced into the `wt` parameter of every query.
    pub fn response_format(&self) -> &'static str {
        "json"
    }

    /// Whether commit/optimize messages still carry `waitFlush`.
    ///
    /// The attribute was removed server-side in 4.0.
    pub fn supports_wait_flush(&self) -> bool {
        *self < Self::Solr4
    }

    /// Whether `update/json` is available.
    pub fn supports_json_update(&self) -> bool {
        *self >= Self::Solr3
    }
}

impl std::fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Solr1 => "1.x",
            Self::Solr3 => "3.x",
            Self::Solr4 => "4.x+",
        };
        write!(f, "Solr {}", name)
    }
}
