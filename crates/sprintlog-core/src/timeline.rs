//! Sprint membership timeline reconstruction.
//!
//! Replays a resolved changelog entry by entry and turns sprint field changes
//! into membership [`Window`]s per (item, sprint) pair.
//!
//! # State machine
//!
//! For a sprint change `from -> to` (both comma-separated name lists):
//!
//! - names only in `from` close the pair's most recent open window;
//! - names only in `to` open a new window;
//! - names in both are left alone.
//!
//! Alongside, two per-item trackers follow the latest estimate and status.
//! The first time a pair is ever opened, the trackers are copied into its
//! [`PairMeta`]. Later joins of the same pair, and later estimate or status
//! changes, never touch that snapshot.
//!
//! All windows and snapshots accumulate in one [`AggregationState`] that the
//! run owns and hands to the aggregator at the end.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::changelog::Changelog;
use crate::config::FieldNames;
use crate::model::item_key::ItemKey;

/// An (item, sprint) pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct PairKey {
    pub item: ItemKey,
    pub sprint: String,
}

impl PairKey {
    #[must_use]
    pub fn new(item: ItemKey, sprint: impl Into<String>) -> Self {
        Self {
            item,
            sprint: sprint.into(),
        }
    }
}

/// A half-open membership interval `[from, to)`. `to == None` means the item
/// is still in the sprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    pub from: DateTime<Utc>,
    pub to: Option<DateTime<Utc>>,
}

impl Window {
    #[must_use]
    pub const fn open(from: DateTime<Utc>) -> Self {
        Self { from, to: None }
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.to.is_none()
    }
}

/// Estimate and status captured the first time a pair was opened.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PairMeta {
    pub estimate: f64,
    pub status: String,
}

/// Windows and pair snapshots for every item replayed in a run.
#[derive(Debug, Clone, Default)]
pub struct AggregationState {
    windows: BTreeMap<PairKey, Vec<Window>>,
    meta: BTreeMap<PairKey, PairMeta>,
}

impl AggregationState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every pair with its windows, in pair order.
    pub fn windows(&self) -> impl Iterator<Item = (&PairKey, &[Window])> {
        self.windows.iter().map(|(pair, windows)| (pair, windows.as_slice()))
    }

    #[must_use]
    pub fn windows_for(&self, pair: &PairKey) -> &[Window] {
        self.windows.get(pair).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn meta(&self, pair: &PairKey) -> Option<&PairMeta> {
        self.meta.get(pair)
    }

    #[must_use]
    pub fn pair_count(&self) -> usize {
        self.windows.len()
    }

    #[must_use]
    pub fn window_count(&self) -> usize {
        self.windows.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    fn open(&mut self, pair: PairKey, at: DateTime<Utc>, trackers: &Trackers) {
        if let Entry::Vacant(slot) = self.meta.entry(pair.clone()) {
            slot.insert(PairMeta {
                estimate: trackers.estimate,
                status: trackers.status.clone(),
            });
        }
        self.windows.entry(pair).or_default().push(Window::open(at));
    }

    fn close(&mut self, pair: &PairKey, at: DateTime<Utc>) -> bool {
        let Some(window) = self
            .windows
            .get_mut(pair)
            .and_then(|windows| windows.iter_mut().rev().find(|w| w.is_open()))
        else {
            return false;
        };
        window.to = Some(at);
        true
    }
}

/// Counters for one item's replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReplayStats {
    pub entries_replayed: usize,
    pub entries_dropped: usize,
    pub windows_opened: usize,
    pub windows_closed: usize,
}

#[derive(Debug, Default)]
struct Trackers {
    estimate: f64,
    status: String,
}

/// Replays resolved changelogs into an [`AggregationState`].
#[derive(Debug)]
pub struct TimelineBuilder<'a> {
    state: &'a mut AggregationState,
    names: &'a FieldNames,
    sprint_filter: Option<&'a str>,
}

impl<'a> TimelineBuilder<'a> {
    #[must_use]
    pub const fn new(state: &'a mut AggregationState, names: &'a FieldNames) -> Self {
        Self {
            state,
            names,
            sprint_filter: None,
        }
    }

    /// Only produce windows for `sprint`. Estimate and status tracking is
    /// unaffected.
    #[must_use]
    pub const fn with_sprint_filter(mut self, sprint: Option<&'a str>) -> Self {
        self.sprint_filter = sprint;
        self
    }

    fn wanted(&self, sprint: &str) -> bool {
        self.sprint_filter.is_none_or(|only| only == sprint)
    }

    /// Replay `changelog` and attribute every window to `item`.
    ///
    /// Entries with an unparsable timestamp are dropped one at a time; the
    /// rest of the history is still replayed. Trackers start at estimate 0 and
    /// empty status for every call.
    pub fn replay(&mut self, item: &ItemKey, changelog: &Changelog) -> ReplayStats {
        let mut stats = ReplayStats::default();
        let mut trackers = Trackers::default();

        for entry in &changelog.histories {
            let at = match entry.timestamp() {
                Ok(ts) => ts.with_timezone(&Utc),
                Err(err) => {
                    warn!("{item}: dropping history entry: {err}");
                    stats.entries_dropped += 1;
                    continue;
                }
            };
            stats.entries_replayed += 1;

            for change in &entry.items {
                if change.field == self.names.sprint {
                    let before = split_sprints(&change.from_string);
                    let after = split_sprints(&change.to_string);
                    if self.sprint_filter.is_none_or(|only| before.contains(&only) || after.contains(&only)) {
                        debug!("{} {item} {before:?} -> {after:?}", entry.created);
                    }

                    for left in before.iter().filter(|name| !after.contains(name)) {
                        if self.wanted(left)
                            && self.state.close(&PairKey::new(item.clone(), *left), at)
                        {
                            stats.windows_closed += 1;
                        }
                    }
                    for joined in after.iter().filter(|name| !before.contains(name)) {
                        if self.wanted(joined) {
                            self.state.open(PairKey::new(item.clone(), *joined), at, &trackers);
                            stats.windows_opened += 1;
                        }
                    }
                } else if change.field == self.names.estimate {
                    let raw = change.to_string.trim();
                    if raw.is_empty() {
                        continue;
                    }
                    match raw.parse::<f64>() {
                        Ok(points) => trackers.estimate = points,
                        Err(_) => debug!("{item}: ignoring non-numeric estimate '{raw}'"),
                    }
                } else if change.field == self.names.status && !change.to_string.is_empty() {
                    trackers.status.clone_from(&change.to_string);
                }
            }
        }

        stats
    }
}

/// Split a comma-separated sprint list, trimming names and dropping empties.
#[must_use]
pub fn split_sprints(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect()
}
