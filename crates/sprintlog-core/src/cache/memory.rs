use std::collections::BTreeMap;

use crate::cache::IssueSource;
use crate::changelog::Changelog;
use crate::error::TrackError;
use crate::model::issue::IssueRecord;
use crate::model::item_key::ItemKey;

/// An [`IssueSource`] backed by in-memory maps.
///
/// Changelogs may be registered for keys that have no issue record; they are
/// still reachable through [`IssueSource::changelog`] (a parent whose issue
/// document was never fetched, for example) but are not enumerated by
/// [`IssueSource::keys`].
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    issues: BTreeMap<ItemKey, IssueRecord>,
    changelogs: BTreeMap<ItemKey, Changelog>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an issue record.
    pub fn insert_issue(&mut self, issue: IssueRecord) -> &mut Self {
        self.issues.insert(issue.key.clone(), issue);
        self
    }

    /// Add or replace the change history for `key`.
    pub fn insert_changelog(&mut self, key: ItemKey, changelog: Changelog) -> &mut Self {
        self.changelogs.insert(key, changelog);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.issues.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}

impl IssueSource for MemoryCache {
    fn keys(&self) -> Result<Vec<ItemKey>, TrackError> {
        Ok(self.issues.keys().cloned().collect())
    }

    fn issue(&self, key: &ItemKey) -> Result<Option<IssueRecord>, TrackError> {
        Ok(self.issues.get(key).cloned())
    }

    fn changelog(&self, key: &ItemKey) -> Result<Option<Changelog>, TrackError> {
        Ok(self.changelogs.get(key).cloned())
    }
}
