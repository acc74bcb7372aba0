//! Bucketed per-sprint snapshots.
//!
//! Every membership window is walked on a uniform UTC grid. Each grid point
//! the window covers (both ends inclusive, after truncating the start down to
//! a boundary) contributes to the `(label, sprint)` bucket:
//!
//! - the item joins the bucket's distinct item set;
//! - the pair's estimate is added once per pair per bucket, however many of
//!   its windows cover the bucket;
//! - the pair's status is counted once per covering window.
//!
//! Open windows are walked up to the aggregator's reference `now`; the window
//! itself is not modified.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use serde::Serialize;
use tracing::warn;

use crate::error::TrackError;
use crate::model::item_key::ItemKey;
use crate::timeline::AggregationState;

/// Grid step for aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Daily,
    Hourly,
    Minutely,
}

impl Granularity {
    pub const ALL: [Self; 3] = [Self::Daily, Self::Hourly, Self::Minutely];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Hourly => "hourly",
            Self::Minutely => "minutely",
        }
    }

    #[must_use]
    pub fn step(self) -> TimeDelta {
        match self {
            Self::Daily => TimeDelta::days(1),
            Self::Hourly => TimeDelta::hours(1),
            Self::Minutely => TimeDelta::minutes(1),
        }
    }

    /// `strftime` layout of bucket labels.
    #[must_use]
    pub const fn label_format(self) -> &'static str {
        match self {
            Self::Daily => "%Y-%m-%d",
            Self::Hourly => "%Y-%m-%d %H:00",
            Self::Minutely => "%Y-%m-%d %H:%M",
        }
    }

    /// Round `ts` down to the enclosing grid boundary, or `None` when `ts`
    /// lies outside the nanosecond range chrono can round (1677 to 2262).
    #[must_use]
    pub fn truncate(self, ts: DateTime<Utc>) -> Option<DateTime<Utc>> {
        ts.duration_trunc(self.step()).ok()
    }

    #[must_use]
    pub fn label(self, ts: DateTime<Utc>) -> String {
        ts.format(self.label_format()).to_string()
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| {
                TrackError::InvalidConfiguration(format!(
                    "unknown interval '{s}': expected daily, hourly or minutely"
                ))
            })
    }
}

/// `(label, sprint)`; derives the report's row order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct BucketKey {
    pub label: String,
    pub sprint: String,
}

/// What one sprint looked like at one grid point.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub items: BTreeSet<ItemKey>,
    pub estimate: f64,
    pub statuses: BTreeMap<String, usize>,
}

impl Snapshot {
    #[must_use]
    pub fn issue_count(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn status_count(&self, status: &str) -> usize {
        self.statuses.get(status).copied().unwrap_or(0)
    }
}

/// All buckets of a run, ordered by label then sprint name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregate {
    granularity: Granularity,
    buckets: BTreeMap<BucketKey, Snapshot>,
}

impl Aggregate {
    #[must_use]
    pub const fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn rows(&self) -> impl Iterator<Item = (&BucketKey, &Snapshot)> {
        self.buckets.iter()
    }

    #[must_use]
    pub fn get(&self, label: &str, sprint: &str) -> Option<&Snapshot> {
        self.buckets.get(&BucketKey {
            label: label.to_string(),
            sprint: sprint.to_string(),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Turns an [`AggregationState`] into an [`Aggregate`].
#[derive(Debug, Clone, Copy)]
pub struct Aggregator {
    granularity: Granularity,
    now: DateTime<Utc>,
}

impl Aggregator {
    #[must_use]
    pub const fn new(granularity: Granularity, now: DateTime<Utc>) -> Self {
        Self { granularity, now }
    }

    #[must_use]
    pub fn aggregate(&self, state: &AggregationState) -> Aggregate {
        let step = self.granularity.step();
        let mut buckets: BTreeMap<BucketKey, Snapshot> = BTreeMap::new();

        for (pair, windows) in state.windows() {
            let meta = state.meta(pair).cloned().unwrap_or_default();
            let mut estimated: HashSet<String> = HashSet::new();

            for window in windows {
                let end = window.to.unwrap_or(self.now);
                let Some(mut cursor) = self.granularity.truncate(window.from) else {
                    warn!(
                        "skipping {} window in {} starting {}: outside the {} grid",
                        pair.item, pair.sprint, window.from, self.granularity
                    );
                    continue;
                };
                while cursor <= end {
                    let label = self.granularity.label(cursor);
                    let snapshot = buckets
                        .entry(BucketKey {
                            label: label.clone(),
                            sprint: pair.sprint.clone(),
                        })
                        .or_default();

                    snapshot.items.insert(pair.item.clone());
                    if estimated.insert(label) {
                        snapshot.estimate += meta.estimate;
                    }
                    *snapshot.statuses.entry(meta.status.clone()).or_default() += 1;

                    cursor += step;
                }
            }
        }

        Aggregate {
            granularity: self.granularity,
            buckets,
        }
    }
}
