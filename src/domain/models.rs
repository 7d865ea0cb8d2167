use crate::domain::id::ID;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Stored mapping from a short code to its target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShortenedLink {
    pub id: ID,
    pub target_url: Url,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Incoming shorten request. Attacker-controlled; nothing here is trusted
/// until it has passed the validation gates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub url: String,
    /// Requested short-code alias; empty means auto-generate.
    #[serde(default)]
    pub custom: String,
    /// Lifetime of the mapping in seconds; 0 means the service default.
    #[serde(default)]
    pub expiry: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmissionResponse {
    pub url: String,
    pub custom: String,
    pub expiry: u64,
    pub rate_limit: u32,
    pub rate_limit_reset: u64,
}
