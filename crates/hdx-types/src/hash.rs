use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Path prefix used by content-addressed gateways (`/ipfs/<hash>`).
pub const CONTENT_PATH_PREFIX: &str = "/ipfs/";

/// Identifier of an immutable blob in the content store.
///
/// The store decides the hash format: the in-memory backend uses hex-encoded
/// BLAKE3 digests, the Kubo backend uses CIDs. Either way, identical content
/// always yields the same `ContentHash` and the content behind a hash never
/// changes.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(String);

impl ContentHash {
    /// Hash raw bytes with BLAKE3 and hex-encode the digest.
    pub fn digest(data: &[u8]) -> Self {
        Self(hex::encode(blake3::hash(data).as_bytes()))
    }

    /// Wrap a hash string produced by a content store.
    ///
    /// Accepts either a bare hash or a `/ipfs/<hash>` path.
    pub fn parse(value: &str) -> Result<Self, TypeError> {
        let bare = value.strip_prefix(CONTENT_PATH_PREFIX).unwrap_or(value);
        if bare.is_empty() {
            return Err(TypeError::InvalidHash {
                value: value.to_string(),
                reason: "hash must not be empty".into(),
            });
        }
        if bare.chars().any(|c| c.is_whitespace() || c == '/') {
            return Err(TypeError::InvalidHash {
                value: value.to_string(),
                reason: "hash must not contain whitespace or '/'".into(),
            });
        }
        Ok(Self(bare.to_string()))
    }

    /// The hash string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Gateway path form: `/ipfs/<hash>`.
    pub fn to_path(&self) -> String {
        format!("{CONTENT_PATH_PREFIX}{}", self.0)
    }

    /// Short representation (first 12 characters).
    pub fn short(&self) -> &str {
        let end = self.0.len().min(12);
        &self.0[..end]
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.short())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContentHash {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContentHash {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.0
    }
}
