//! Bucket settings and their JSON form

use crate::Result;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Retention policy applied by the server when a bucket reaches its quota
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum QuotaType {
    /// No quota
    None,
    /// Oldest blocks are evicted first
    Fifo,
}

impl QuotaType {
    /// Wire name of the quota type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::Fifo => "FIFO",
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "NONE" => Some(Self::None),
            "FIFO" => Some(Self::Fifo),
            _ => None,
        }
    }
}

/// Bucket configuration.
///
/// Every field is optional. On creation an absent field keeps the server
/// default; in [`Bucket::update_settings`](crate::Bucket::update_settings) an
/// absent field keeps the current value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Maximum size of a storage block in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_block_size: Option<u64>,
    /// Quota policy
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_quota_type"
    )]
    pub quota_type: Option<QuotaType>,
    /// Quota size in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quota_size: Option<u64>,
}

// An unrecognized quota type is dropped rather than rejected. This silently
// loses whatever the server sent, but callers rely on parsing never failing
// on it.
fn lenient_quota_type<'de, D>(deserializer: D) -> std::result::Result<Option<QuotaType>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_str().and_then(QuotaType::from_wire)))
}

impl Settings {
    /// Create settings with every field absent
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum block size
    pub fn with_max_block_size(mut self, size: u64) -> Self {
        self.max_block_size = Some(size);
        self
    }

    /// Set the quota type
    pub fn with_quota_type(mut self, quota_type: QuotaType) -> Self {
        self.quota_type = Some(quota_type);
        self
    }

    /// Set the quota size
    pub fn with_quota_size(mut self, size: u64) -> Self {
        self.quota_size = Some(size);
        self
    }

    /// Overlay the fields present in `patch` on top of `self`
    pub fn merge(&self, patch: &Settings) -> Settings {
        Settings {
            max_block_size: patch.max_block_size.or(self.max_block_size),
            quota_type: patch.quota_type.or(self.quota_type),
            quota_size: patch.quota_size.or(self.quota_size),
        }
    }

    /// Serialize to JSON, emitting only the present fields
    pub fn to_json_string(&self) -> String {
        // A struct of optional integers and a unit enum always serializes.
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Parse settings from a JSON document, ignoring unknown keys
    pub fn parse(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub(crate) fn parse_slice(json: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(json)?)
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_json_string())
    }
}
