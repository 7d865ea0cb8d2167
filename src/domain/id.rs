use std::sync::OnceLock;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sqids::Sqids;

// 0/O/o and 1/l/I are left out so codes survive being read aloud or
// transcribed by hand.
const ALPHABET: &str = "23456789abcdefghijkmnpqrstuvwxyzABCDEFGHJKLMNPQRSTUVWXYZ";

const MIN_LENGTH: u8 = 6;

static SQIDS: OnceLock<Sqids> = OnceLock::new();

/// Short code that becomes the path segment of a shortened link.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct ID(pub String);

impl ID {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_string())
    }

    /// Encode a sequence number into a short code. Deterministic: the same
    /// sequence always yields the same code.
    pub fn generate(seq: u64) -> Result<Self> {
        let sqids = SQIDS.get_or_init(|| {
            Sqids::builder()
                .min_length(MIN_LENGTH)
                .alphabet(ALPHABET.chars().collect())
                .build()
                .expect("static alphabet is valid")
        });

        let code = sqids.encode(&[seq])?;
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
