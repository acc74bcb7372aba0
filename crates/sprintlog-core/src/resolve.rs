//! Pick the change history that drives an item's sprint timeline.
//!
//! # Fallback chain
//!
//! 1. The item's own changelog, if it ever changes the sprint field.
//! 2. The parent's changelog, if the item has a parent and the parent's
//!    history changes the sprint field. Sub-tasks and similar item types
//!    never record sprint changes of their own.
//! 3. A synthetic one-entry history joining every current sprint at the
//!    item's creation time, when the item is in sprints today but no history
//!    says how it got there.
//! 4. An empty history.
//!
//! The first match wins and is returned whole: estimate and status changes in
//! the chosen history still feed the replay trackers.

use tracing::debug;

use crate::cache::IssueSource;
use crate::changelog::Changelog;
use crate::config::FieldNames;
use crate::error::TrackError;
use crate::model::issue::IssueRecord;
use crate::model::item_key::ItemKey;

/// Where a resolved history came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// The item's own changelog.
    Own,
    /// The parent's changelog, inherited.
    Parent(ItemKey),
    /// Synthesized from current sprint membership at creation time.
    Synthesized,
    /// Nothing usable; the item produces no windows.
    Empty,
}

impl Origin {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Own => "own",
            Self::Parent(_) => "parent",
            Self::Synthesized => "synthesized",
            Self::Empty => "empty",
        }
    }
}

/// The history chosen for one item.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedChangelog {
    pub issue: IssueRecord,
    pub changelog: Changelog,
    pub origin: Origin,
}

/// Resolves the authoritative sprint history for items in an [`IssueSource`].
#[derive(Debug, Clone)]
pub struct ChangelogResolver<'a, S: IssueSource> {
    source: &'a S,
    names: &'a FieldNames,
}

impl<'a, S: IssueSource> ChangelogResolver<'a, S> {
    #[must_use]
    pub const fn new(source: &'a S, names: &'a FieldNames) -> Self {
        Self { source, names }
    }

    /// Fetch `key` and resolve its history.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::NotFoundInCache`] if the item itself is not
    /// cached, or any error the source reports while reading it or its
    /// changelogs.
    pub fn resolve(&self, key: &ItemKey) -> Result<ResolvedChangelog, TrackError> {
        let issue = self
            .source
            .issue(key)?
            .ok_or_else(|| TrackError::NotFoundInCache(key.clone()))?;
        self.resolve_issue(issue)
    }

    /// Resolve the history for an already-loaded issue record.
    ///
    /// # Errors
    ///
    /// Returns source read errors, or [`TrackError::MalformedRecord`] when a
    /// history has to be synthesized but the issue has no creation time.
    pub fn resolve_issue(&self, issue: IssueRecord) -> Result<ResolvedChangelog, TrackError> {
        let sprint_field = self.names.sprint.as_str();

        if let Some(own) = self.source.changelog(&issue.key)? {
            if own.touches_field(sprint_field) {
                return Ok(resolved(issue, own, Origin::Own));
            }
        }

        if let Some(parent) = issue.parent.clone() {
            match self.source.changelog(&parent)? {
                Some(inherited) if inherited.touches_field(sprint_field) => {
                    debug!("{}: inheriting sprint history from parent {parent}", issue.key);
                    return Ok(resolved(issue, inherited, Origin::Parent(parent)));
                }
                _ => {}
            }
        }

        if issue.has_sprints() {
            let Some(created) = issue.created else {
                return Err(TrackError::malformed(
                    issue.key.as_str(),
                    "issue",
                    "in a sprint but has no usable creation time",
                ));
            };
            debug!(
                "{}: no sprint history, joining {:?} at creation",
                issue.key, issue.sprints
            );
            let synthetic = Changelog::joined_at_creation(&created, sprint_field, &issue.sprints);
            return Ok(resolved(issue, synthetic, Origin::Synthesized));
        }

        Ok(resolved(issue, Changelog::empty(), Origin::Empty))
    }
}

const fn resolved(issue: IssueRecord, changelog: Changelog, origin: Origin) -> ResolvedChangelog {
    ResolvedChangelog {
        issue,
        changelog,
        origin,
    }
}
