//! Lookups over current issue state, independent of change history.

use tracing::warn;

use crate::cache::IssueSource;
use crate::error::TrackError;
use crate::model::item_key::ItemKey;
use crate::run::belongs_to;

/// Items whose current sprint field names `sprint`, in key order.
///
/// Unreadable items are logged and left out.
///
/// # Errors
///
/// Returns errors that are not item-local, such as a cache that cannot be
/// listed.
pub fn sprint_members<S: IssueSource>(
    source: &S,
    sprint: &str,
    project: Option<&str>,
) -> Result<Vec<ItemKey>, TrackError> {
    let mut members = Vec::new();
    for key in source.keys()? {
        let issue = match source.issue(&key) {
            Ok(Some(issue)) => issue,
            Ok(None) => continue,
            Err(err) if err.is_item_local() => {
                warn!("skipping {key}: {err}");
                continue;
            }
            Err(err) => return Err(err),
        };
        if project.is_some_and(|p| !belongs_to(&issue, p)) {
            continue;
        }
        if issue.sprints.iter().any(|name| name == sprint) {
            members.push(key);
        }
    }
    Ok(members)
}
