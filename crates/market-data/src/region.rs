use serde::{Deserialize, Serialize};
use std::fmt;

/// Case-normalized identity for a market area.
///
/// Inputs differing only by case or surrounding/internal whitespace resolve
/// to the same key. Normalization is total and idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionKey(String);

impl RegionKey {
    pub fn new(raw: &str) -> Self {
        let normalized = raw
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        Self(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionKey {
    fn from(raw: &str) -> Self {
        RegionKey::new(raw)
    }
}
