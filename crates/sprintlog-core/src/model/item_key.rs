//! Project-prefixed item keys (`ABC-123`).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::TrackError;

/// A tracker item key of the form `<PROJECT>-<number>`.
///
/// Keys order by numeric suffix first so that `ABC-9` sorts before `ABC-10`;
/// equal suffixes fall back to the lexical order of the whole key, which keeps
/// the order total across projects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemKey {
    raw: String,
    split: usize,
    number: u64,
}

impl ItemKey {
    /// Parse and validate a key.
    ///
    /// The project part must be non-empty and must not contain whitespace;
    /// the suffix after the last `-` must be a decimal number.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::InvalidItemKey`] when the input does not match
    /// `<PROJECT>-<number>`.
    pub fn parse(raw: &str) -> Result<Self, TrackError> {
        let trimmed = raw.trim();
        let Some(split) = trimmed.rfind('-') else {
            return Err(TrackError::InvalidItemKey(raw.to_string()));
        };

        let (project, digits) = (&trimmed[..split], &trimmed[split + 1..]);
        if project.is_empty() || project.chars().any(char::is_whitespace) {
            return Err(TrackError::InvalidItemKey(raw.to_string()));
        }
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(TrackError::InvalidItemKey(raw.to_string()));
        }
        let number = digits
            .parse::<u64>()
            .map_err(|_| TrackError::InvalidItemKey(raw.to_string()))?;

        Ok(Self {
            raw: trimmed.to_string(),
            split,
            number,
        })
    }

    /// The full key text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The project prefix (`ABC` for `ABC-123`).
    #[must_use]
    pub fn project(&self) -> &str {
        &self.raw[..self.split]
    }

    /// The numeric suffix (`123` for `ABC-123`).
    #[must_use]
    pub const fn number(&self) -> u64 {
        self.number
    }
}

impl Ord for ItemKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.number
            .cmp(&other.number)
            .then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for ItemKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for ItemKey {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for ItemKey {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

impl Serialize for ItemKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for ItemKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(raw: &str) -> ItemKey {
        ItemKey::parse(raw).expect("valid key")
    }

    #[test]
    fn parses_project_and_number() {
        let k = key("RHOAIENG-4521");
        assert_eq!(k.project(), "RHOAIENG");
        assert_eq!(k.number(), 4521);
        assert_eq!(k.to_string(), "RHOAIENG-4521");
    }

    #[test]
    fn project_may_contain_dashes() {
        let k = key("MY-PROJ-12");
        assert_eq!(k.project(), "MY-PROJ");
        assert_eq!(k.number(), 12);
    }

    #[test]
    fn rejects_malformed_keys() {
        for raw in ["", "ABC", "ABC-", "-12", "ABC-12a", "A B-1", "ABC-+1"] {
            assert!(ItemKey::parse(raw).is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn orders_numerically_not_lexically() {
        let mut keys = vec![key("ABC-10"), key("ABC-9"), key("ABC-100"), key("ABC-1")];
        keys.sort();
        let sorted: Vec<_> = keys.iter().map(ItemKey::as_str).collect();
        assert_eq!(sorted, ["ABC-1", "ABC-9", "ABC-10", "ABC-100"]);
    }

    #[test]
    fn equal_numbers_break_ties_lexically() {
        let mut keys = vec![key("XYZ-5"), key("ABC-5")];
        keys.sort();
        assert_eq!(keys[0].as_str(), "ABC-5");
    }

    #[test]
    fn serde_roundtrips_as_plain_string() {
        let k = key("ABC-42");
        let json = serde_json::to_string(&k).expect("serialize");
        assert_eq!(json, "\"ABC-42\"");
        let back: ItemKey = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, k);
        assert!(serde_json::from_str::<ItemKey>("\"nope\"").is_err());
    }
}
