//! Flat-directory cache written by the fetcher.
//!
//! Layout, one set of files per item:
//!
//! ```text
//! issues/
//!   ABC-1.json            current issue document ("changelog" stripped)
//!   ABC-1.changelog.json  change history
//!   ABC-2.denied          fetch was refused (403); item is ignored
//! ```
//!
//! Issue documents written before the fetcher started stripping changelogs
//! carry the history inline under a top-level `changelog` key; that copy is
//! used when no separate changelog file exists.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::cache::IssueSource;
use crate::changelog::Changelog;
use crate::config::FieldNames;
use crate::error::TrackError;
use crate::model::issue::IssueRecord;
use crate::model::item_key::ItemKey;

const ISSUE_SUFFIX: &str = ".json";
const CHANGELOG_SUFFIX: &str = ".changelog.json";
const DENIED_SUFFIX: &str = ".denied";

/// An [`IssueSource`] over a fetcher cache directory.
#[derive(Debug, Clone)]
pub struct DirCache {
    root: PathBuf,
    names: FieldNames,
}

impl DirCache {
    /// Open a cache directory.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::CacheRead`] if `root` is not a readable
    /// directory.
    pub fn open(root: impl Into<PathBuf>, names: FieldNames) -> Result<Self, TrackError> {
        let root = root.into();
        fs::read_dir(&root).map_err(|source| TrackError::CacheRead {
            path: root.display().to_string(),
            source,
        })?;
        Ok(Self { root, names })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn issue_path(&self, key: &ItemKey) -> PathBuf {
        self.root.join(format!("{key}{ISSUE_SUFFIX}"))
    }

    fn changelog_path(&self, key: &ItemKey) -> PathBuf {
        self.root.join(format!("{key}{CHANGELOG_SUFFIX}"))
    }

    fn is_denied(&self, stem: &str) -> bool {
        self.root.join(format!("{stem}{DENIED_SUFFIX}")).exists()
    }

    /// Read and JSON-decode a file, or `None` if it does not exist.
    ///
    /// An unreadable file only spoils its own item, so read failures are
    /// reported as [`TrackError::MalformedRecord`] rather than
    /// [`TrackError::CacheRead`].
    fn read_json(&self, path: &Path, key: &ItemKey, what: &'static str) -> Result<Option<Value>, TrackError> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => {
                return Err(TrackError::malformed(
                    key.as_str(),
                    what,
                    format!("cannot read {}: {err}", path.display()),
                ));
            }
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| TrackError::malformed(key.as_str(), what, e))
    }
}

impl IssueSource for DirCache {
    fn keys(&self) -> Result<Vec<ItemKey>, TrackError> {
        let entries = fs::read_dir(&self.root).map_err(|source| TrackError::CacheRead {
            path: self.root.display().to_string(),
            source,
        })?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("skipping unreadable entry in {}: {err}", self.root.display());
                    continue;
                }
            };
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.ends_with(CHANGELOG_SUFFIX) {
                continue;
            }
            let Some(stem) = name.strip_suffix(ISSUE_SUFFIX) else {
                continue;
            };
            if self.is_denied(stem) {
                debug!("skipping {stem}: marked as denied");
                continue;
            }
            match ItemKey::parse(stem) {
                Ok(key) => keys.push(key),
                Err(_) => trace!("ignoring non-item file {name}"),
            }
        }

        keys.sort();
        Ok(keys)
    }

    fn issue(&self, key: &ItemKey) -> Result<Option<IssueRecord>, TrackError> {
        self.read_json(&self.issue_path(key), key, "issue")?
            .map(|doc| IssueRecord::decode(key.as_str(), doc, &self.names))
            .transpose()
    }

    fn changelog(&self, key: &ItemKey) -> Result<Option<Changelog>, TrackError> {
        if let Some(doc) = self.read_json(&self.changelog_path(key), key, "changelog")? {
            return serde_json::from_value(doc)
                .map(Some)
                .map_err(|e| TrackError::malformed(key.as_str(), "changelog", e));
        }

        let Some(Value::Object(mut issue)) = self.read_json(&self.issue_path(key), key, "issue")? else {
            return Ok(None);
        };
        match issue.remove("changelog") {
            None | Some(Value::Null) => Ok(None),
            Some(embedded) => {
                trace!("using changelog embedded in {key}{ISSUE_SUFFIX}");
                serde_json::from_value(embedded)
                    .map(Some)
                    .map_err(|e| TrackError::malformed(key.as_str(), "changelog", e))
            }
        }
    }
}
