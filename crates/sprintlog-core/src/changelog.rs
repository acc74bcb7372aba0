//! Change histories as cached from the tracker.
//!
//! A [`Changelog`] is kept in the order the tracker returned it; nothing here
//! re-sorts entries. Timestamps stay as raw strings until replay so that one
//! bad entry can be dropped without rejecting the whole history.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::TrackError;

/// The only accepted history timestamp layout, e.g.
/// `2024-01-01T10:00:00.000+0000`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.%3f%z";

/// Parse a history timestamp in [`TIMESTAMP_FORMAT`].
///
/// No alternate layouts are attempted: a missing millisecond fraction, a
/// `Z` suffix or a `+HH:MM` offset fails.
///
/// # Errors
///
/// Returns [`TrackError::UnparsableTimestamp`] with the raw text.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, TrackError> {
    // `%z` also accepts `+HH:MM`; only `±HHMM` is valid here.
    if !has_compact_offset(raw) {
        return Err(TrackError::UnparsableTimestamp(raw.to_string()));
    }
    DateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map_err(|_| TrackError::UnparsableTimestamp(raw.to_string()))
}

fn has_compact_offset(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() >= 5 && {
        let (sign, digits) = bytes[bytes.len() - 5..].split_at(1);
        matches!(sign, [b'+' | b'-']) && digits.iter().all(u8::is_ascii_digit)
    }
}

/// Render a timestamp back into [`TIMESTAMP_FORMAT`].
#[must_use]
pub fn format_timestamp(ts: &DateTime<FixedOffset>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.3f%z").to_string()
}

/// One field change inside a history entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub field: String,
    #[serde(rename = "fromString", default, deserialize_with = "null_as_empty")]
    pub from_string: String,
    #[serde(rename = "toString", default, deserialize_with = "null_as_empty")]
    pub to_string: String,
}

impl HistoryItem {
    #[must_use]
    pub fn new(field: &str, from: &str, to: &str) -> Self {
        Self {
            field: field.to_string(),
            from_string: from.to_string(),
            to_string: to.to_string(),
        }
    }
}

/// One change event: a timestamp and the field changes made at that instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub created: String,
    #[serde(default)]
    pub items: Vec<HistoryItem>,
}

impl HistoryEntry {
    /// Parse this entry's timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::UnparsableTimestamp`] if `created` does not match
    /// [`TIMESTAMP_FORMAT`].
    pub fn timestamp(&self) -> Result<DateTime<FixedOffset>, TrackError> {
        parse_timestamp(&self.created)
    }
}

/// The ordered change history for one item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Changelog {
    #[serde(default)]
    pub histories: Vec<HistoryEntry>,
}

impl Changelog {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            histories: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }

    /// Whether any entry changes `field`.
    #[must_use]
    pub fn touches_field(&self, field: &str) -> bool {
        self.histories
            .iter()
            .flat_map(|entry| entry.items.iter())
            .any(|item| item.field == field)
    }

    /// Build a one-entry history that joins every sprint in `sprints` at
    /// `created`.
    ///
    /// Used when the tracker's audit trail never recorded the original sprint
    /// assignment.
    #[must_use]
    pub fn joined_at_creation(
        created: &DateTime<FixedOffset>,
        sprint_field: &str,
        sprints: &[String],
    ) -> Self {
        let items = sprints
            .iter()
            .map(|name| HistoryItem::new(sprint_field, "", name))
            .collect();

        Self {
            histories: vec![HistoryEntry {
                created: format_timestamp(created),
                items,
            }],
        }
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
