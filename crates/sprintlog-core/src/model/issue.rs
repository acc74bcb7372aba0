//! Current field state of a cached issue.
//!
//! Issue documents are loosely shaped tracker JSON. [`IssueRecord::decode`]
//! turns one into a fixed schema once, at the cache boundary, so nothing
//! downstream touches untyped JSON.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

use crate::changelog::parse_timestamp;
use crate::config::FieldNames;
use crate::error::TrackError;
use crate::model::item_key::ItemKey;
use crate::model::sprint::SprintValue;

/// Decoded current state of one item.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueRecord {
    pub key: ItemKey,
    pub created: Option<DateTime<FixedOffset>>,
    pub parent: Option<ItemKey>,
    pub project: Option<String>,
    pub status: Option<String>,
    /// Current sprint memberships, de-duplicated, in field order.
    pub sprints: Vec<String>,
    pub estimate: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    key: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct KeyRef {
    key: String,
}

#[derive(Debug, Deserialize)]
struct NameRef {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Estimate {
    Number(f64),
    Text(String),
}

impl IssueRecord {
    /// A record with only a key and no field state.
    #[must_use]
    pub const fn bare(key: ItemKey) -> Self {
        Self {
            key,
            created: None,
            parent: None,
            project: None,
            status: None,
            sprints: Vec::new(),
            estimate: None,
        }
    }

    /// Decode an issue document.
    ///
    /// `source` names the document in error messages (usually the key the
    /// caller asked for). An unreadable `created`, `status` or estimate is
    /// logged and decoded as absent: the item can still be replayed from its
    /// history.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::MalformedRecord`] if the document is not an
    /// object with a valid `key`, or if the parent or sprint field has the
    /// wrong shape.
    pub fn decode(source: &str, doc: Value, names: &FieldNames) -> Result<Self, TrackError> {
        let raw: RawIssue =
            serde_json::from_value(doc).map_err(|e| TrackError::malformed(source, "issue", e))?;
        let key = ItemKey::parse(&raw.key).map_err(|e| TrackError::malformed(source, "issue", e))?;
        let fields = &raw.fields;

        let created = lenient(
            source,
            "created",
            field::<String>(source, fields, "created").and_then(|ts| {
                ts.map(|ts| parse_timestamp(&ts))
                    .transpose()
                    .map_err(|e| TrackError::malformed(source, "issue", format!("created: {e}")))
            }),
        );

        let parent = field::<KeyRef>(source, fields, "parent")?
            .map(|parent| ItemKey::parse(&parent.key))
            .transpose()
            .map_err(|e| TrackError::malformed(source, "issue", e))?;

        let project = field::<KeyRef>(source, fields, "project")?.map(|p| p.key);
        let status = lenient(
            source,
            "status",
            field::<NameRef>(source, fields, "status").map(|s| s.map(|s| s.name)),
        );

        let mut sprints: Vec<String> = Vec::new();
        for value in field::<Vec<SprintValue>>(source, fields, &names.sprint_field)?.unwrap_or_default() {
            if let Some(name) = value.name() {
                if !sprints.contains(&name) {
                    sprints.push(name);
                }
            }
        }

        let estimate = lenient(
            source,
            "estimate",
            decode_estimate(source, fields, &names.estimate_field),
        );

        Ok(Self {
            key,
            created,
            parent,
            project,
            status,
            sprints,
            estimate,
        })
    }

    /// Whether the item currently sits in at least one sprint.
    #[must_use]
    pub fn has_sprints(&self) -> bool {
        !self.sprints.is_empty()
    }
}

fn decode_estimate(source: &str, fields: &Map<String, Value>, name: &str) -> Result<Option<f64>, TrackError> {
    match field::<Estimate>(source, fields, name)? {
        Some(Estimate::Number(n)) => Ok(Some(n)),
        Some(Estimate::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Estimate::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|e| TrackError::malformed(source, "issue", format!("{name}: {e}"))),
        None => Ok(None),
    }
}

/// Keep a decoded optional field, or log the failure and treat it as absent.
fn lenient<T>(source: &str, name: &str, decoded: Result<Option<T>, TrackError>) -> Option<T> {
    decoded.unwrap_or_else(|err| {
        warn!("{source}: ignoring unreadable {name}: {err}");
        None
    })
}

/// Read an optional field, treating JSON `null` like a missing key.
fn field<T: DeserializeOwned>(
    source: &str,
    fields: &Map<String, Value>,
    name: &str,
) -> Result<Option<T>, TrackError> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => T::deserialize(value)
            .map(Some)
            .map_err(|e| TrackError::malformed(source, "issue", format!("{name}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names() -> FieldNames {
        FieldNames::default()
    }

    #[test]
    fn decodes_full_issue_document() {
        let doc = json!({
            "key": "ABC-12",
            "fetched": "2024-05-01T00:00:00Z",
            "fields": {
                "created": "2024-01-01T09:30:00.000+0000",
                "parent": {"key": "ABC-3", "fields": {"summary": "Epic"}},
                "project": {"key": "ABC", "name": "Alphabet"},
                "status": {"name": "In Progress"},
                "customfield_12310940": [
                    "com.atlassian.greenhopper.service.sprint.Sprint@1[id=1,rapidViewId=9,state=CLOSED,name=Sprint 1,startDate=<null>]",
                    "com.atlassian.greenhopper.service.sprint.Sprint@2[id=2,rapidViewId=9,state=ACTIVE,name=Sprint 2,startDate=<null>]",
                    "com.atlassian.greenhopper.service.sprint.Sprint@3[id=2,rapidViewId=9,state=ACTIVE,name=Sprint 2,startDate=<null>]"
                ],
                "customfield_12310243": 3.0
            }
        });

        let issue = IssueRecord::decode("ABC-12", doc, &names()).expect("decode");
        assert_eq!(issue.key.as_str(), "ABC-12");
        assert_eq!(issue.parent.as_ref().map(ItemKey::as_str), Some("ABC-3"));
        assert_eq!(issue.project.as_deref(), Some("ABC"));
        assert_eq!(issue.status.as_deref(), Some("In Progress"));
        assert_eq!(issue.sprints, ["Sprint 1", "Sprint 2"]);
        assert_eq!(issue.estimate, Some(3.0));
        assert!(issue.created.is_some());
        assert!(issue.has_sprints());
    }

    #[test]
    fn nulls_and_missing_fields_decode_as_absent() {
        let doc = json!({
            "key": "ABC-1",
            "fields": {
                "parent": null,
                "customfield_12310940": null,
                "customfield_12310243": null
            }
        });

        let issue = IssueRecord::decode("ABC-1", doc, &names()).expect("decode");
        assert_eq!(issue, IssueRecord::bare(ItemKey::parse("ABC-1").expect("valid key")));
        assert!(!issue.has_sprints());
    }

    #[test]
    fn estimate_may_be_a_numeric_string() {
        let doc = json!({"key": "ABC-2", "fields": {"customfield_12310243": " 8 "}});
        let issue = IssueRecord::decode("ABC-2", doc, &names()).expect("decode");
        assert_eq!(issue.estimate, Some(8.0));
    }

    #[test]
    fn honours_configured_field_names() {
        let names = FieldNames {
            sprint_field: "sprints".to_string(),
            estimate_field: "points".to_string(),
            ..FieldNames::default()
        };
        let doc = json!({
            "key": "OPS-5",
            "fields": {
                "sprints": [{"id": 7, "name": "Ops 7", "state": "active"}],
                "points": 2
            }
        });
        let issue = IssueRecord::decode("OPS-5", doc, &names).expect("decode");
        assert_eq!(issue.sprints, ["Ops 7"]);
        assert_eq!(issue.estimate, Some(2.0));
    }

    #[test]
    fn malformed_documents_are_rejected() {
        let cases = [
            json!([1, 2, 3]),
            json!({"fields": {}}),
            json!({"key": "not-a-key"}),
            json!({"key": "ABC-1", "fields": {"parent": "ABC-2"}}),
            json!({"key": "ABC-1", "fields": {"customfield_12310940": "Sprint 1"}}),
        ];

        for doc in cases {
            let err = IssueRecord::decode("ABC-1", doc.clone(), &names())
                .expect_err(&format!("{doc} should be rejected"));
            assert!(
                matches!(err, TrackError::MalformedRecord { ref key, .. } if key == "ABC-1"),
                "unexpected error {err:?}"
            );
        }
    }

    #[test]
    fn unreadable_scalar_fields_decode_as_absent() {
        let doc = json!({
            "key": "ABC-1",
            "fields": {
                "created": "2024-01-01T10:00:00Z",
                "status": "Open",
                "project": {"key": "ABC"},
                "customfield_12310940": [{"id": 1, "name": "Sprint 1"}],
                "customfield_12310243": "lots"
            }
        });

        let issue = IssueRecord::decode("ABC-1", doc, &names()).expect("decode");
        assert!(issue.created.is_none());
        assert!(issue.status.is_none());
        assert!(issue.estimate.is_none());
        assert_eq!(issue.project.as_deref(), Some("ABC"));
        assert_eq!(issue.sprints, ["Sprint 1"]);
    }
}
