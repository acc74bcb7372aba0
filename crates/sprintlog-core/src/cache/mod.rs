//! Read-only access to cached issues and their change histories.
//!
//! The timeline code only ever talks to an [`IssueSource`]. Two sources ship
//! with the crate:
//!
//! - [`DirCache`]: the flat directory the fetcher writes
//!   (`<KEY>.json`, `<KEY>.changelog.json`, `<KEY>.denied`).
//! - [`MemoryCache`]: in-memory records, for embedding and tests.
//!
//! A missing record is `Ok(None)`; a record that exists but cannot be decoded
//! is [`TrackError::MalformedRecord`].

pub mod dir;
pub mod memory;

pub use dir::DirCache;
pub use memory::MemoryCache;

use crate::changelog::Changelog;
use crate::error::TrackError;
use crate::model::issue::IssueRecord;
use crate::model::item_key::ItemKey;

/// Read-only accessor over a fixed snapshot of cached items.
pub trait IssueSource {
    /// Every item key in the snapshot, in [`ItemKey`] order.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::CacheRead`] if the snapshot cannot be listed.
    fn keys(&self) -> Result<Vec<ItemKey>, TrackError>;

    /// Current field state for `key`, or `None` if the item is not cached.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::MalformedRecord`] if the record cannot be read
    /// or decoded. Such failures only concern this item.
    fn issue(&self, key: &ItemKey) -> Result<Option<IssueRecord>, TrackError>;

    /// Change history for `key`, or `None` if no history is cached.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::MalformedRecord`] if the history cannot be read
    /// or decoded.
    fn changelog(&self, key: &ItemKey) -> Result<Option<Changelog>, TrackError>;
}

impl<S: IssueSource + ?Sized> IssueSource for &S {
    fn keys(&self) -> Result<Vec<ItemKey>, TrackError> {
        (**self).keys()
    }

    fn issue(&self, key: &ItemKey) -> Result<Option<IssueRecord>, TrackError> {
        (**self).issue(key)
    }

    fn changelog(&self, key: &ItemKey) -> Result<Option<Changelog>, TrackError> {
        (**self).changelog(key)
    }
}
