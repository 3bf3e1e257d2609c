//! Document identifiers.
//!
//! Every product and user reference on the wire is a 24-character
//! hexadecimal string (the upstream document database's native id
//! format). [`DocId`] enforces that shape at construction so malformed
//! ids cannot reach a query or an order payload.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Number of hex characters in a document id.
pub const DOC_ID_LEN: usize = 24;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdError {
    #[error("document id must be {DOC_ID_LEN} hex characters, got '{0}'")]
    Malformed(String),
}

/// A validated 24-hex-character document id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DocId(String);

impl DocId {
    /// Returns `true` if `raw` is a syntactically valid document id.
    #[must_use]
    pub fn is_valid(raw: &str) -> bool {
        raw.len() == DOC_ID_LEN && raw.bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// Generates a new id: 4-byte unix timestamp followed by 8 random
    /// bytes, hex-encoded. Ids sort roughly by creation time.
    #[must_use]
    pub fn generate() -> Self {
        let secs = u32::try_from(chrono::Utc::now().timestamp()).unwrap_or(0);
        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..].copy_from_slice(&rand::random::<[u8; 8]>());

        let mut hex = String::with_capacity(DOC_ID_LEN);
        for b in bytes {
            use fmt::Write;
            let _ = write!(hex, "{b:02x}");
        }
        Self(hex)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for DocId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if Self::is_valid(s) {
            Ok(Self(s.to_owned()))
        } else {
            Err(IdError::Malformed(s.to_owned()))
        }
    }
}

impl TryFrom<String> for DocId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if Self::is_valid(&value) {
            Ok(Self(value))
        } else {
            Err(IdError::Malformed(value))
        }
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for DocId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::try_from(raw).map_err(serde::de::Error::custom)
    }
}
