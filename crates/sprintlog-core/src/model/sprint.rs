//! Sprint references as they appear in cached issue documents.
//!
//! Older tracker exports store sprint membership as opaque Java `toString()`
//! dumps such as
//! `com.atlassian.greenhopper.service.sprint.Sprint@1a2b[id=42,name=Sprint 1,...]`.
//! Newer exports use JSON objects. [`SprintValue`] accepts both and
//! [`SprintValue::name`] yields the iteration name used everywhere else.

use serde::{Deserialize, Serialize};

/// A decoded sprint record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Sprint {
    pub id: u64,
    pub rapid_view_id: u64,
    pub state: String,
    pub name: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub complete_date: Option<String>,
    pub activated_date: Option<String>,
    pub sequence: u64,
    pub goal: Option<String>,
    pub synced: bool,
    pub auto_start_stop: bool,
    #[serde(rename = "incompleteIssuesDestinationId")]
    pub incomplete_destination: Option<String>,
}

/// Error returned when a legacy sprint string has no `[...]` body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid sprint string: missing bracketed field list in '{0}'")]
pub struct SprintStringError(pub String);

/// Parse a legacy `Sprint@hash[key=value,...]` dump.
///
/// Unknown keys and unparsable numbers are ignored, `<null>` becomes `None`.
/// Values are split on `,`, so a goal or name containing a comma is cut at
/// the comma.
///
/// # Errors
///
/// Returns [`SprintStringError`] if the string has no bracketed body.
pub fn parse_sprint_string(raw: &str) -> Result<Sprint, SprintStringError> {
    let (Some(start), Some(end)) = (raw.find('['), raw.rfind(']')) else {
        return Err(SprintStringError(raw.to_string()));
    };
    if end < start {
        return Err(SprintStringError(raw.to_string()));
    }

    let mut sprint = Sprint::default();
    for part in raw[start + 1..end].split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        let value = value.trim();
        let optional = || (value != "<null>").then(|| value.to_string());

        match key {
            "id" => sprint.id = value.parse().unwrap_or_default(),
            "rapidViewId" => sprint.rapid_view_id = value.parse().unwrap_or_default(),
            "state" => sprint.state = value.to_string(),
            "name" => sprint.name = value.to_string(),
            "startDate" => sprint.start_date = optional(),
            "endDate" => sprint.end_date = optional(),
            "completeDate" => sprint.complete_date = optional(),
            "activatedDate" => sprint.activated_date = optional(),
            "sequence" => sprint.sequence = value.parse().unwrap_or_default(),
            "goal" => sprint.goal = optional(),
            "synced" => sprint.synced = value == "true",
            "autoStartStop" => sprint.auto_start_stop = value == "true",
            "incompleteIssuesDestinationId" => sprint.incomplete_destination = optional(),
            _ => {}
        }
    }

    Ok(sprint)
}

/// One entry of an issue's current sprint field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SprintValue {
    /// Legacy string dump, or a bare sprint name.
    Text(String),
    /// Structured sprint object.
    Object(Sprint),
}

impl SprintValue {
    /// The iteration name carried by this value.
    ///
    /// Legacy dumps are parsed for their `name=` field. A string without a
    /// bracketed body is taken to be the name itself. Empty names yield
    /// `None`.
    #[must_use]
    pub fn name(&self) -> Option<String> {
        let name = match self {
            Self::Text(raw) => match parse_sprint_string(raw) {
                Ok(sprint) => sprint.name,
                Err(_) => raw.trim().to_string(),
            },
            Self::Object(sprint) => sprint.name.trim().to_string(),
        };
        (!name.is_empty()).then_some(name)
    }
}
