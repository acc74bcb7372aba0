//! One batch pass: enumerate, resolve, replay, aggregate.
//!
//! Item-local failures (see [`TrackError::is_item_local`]) are logged and
//! counted in [`RunStats`]; the item is skipped and the run continues. Any
//! other error aborts the pass.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::aggregate::{Aggregate, Aggregator, Granularity};
use crate::cache::IssueSource;
use crate::config::FieldNames;
use crate::error::TrackError;
use crate::model::issue::IssueRecord;
use crate::model::item_key::ItemKey;
use crate::resolve::{ChangelogResolver, Origin};
use crate::timeline::{AggregationState, TimelineBuilder};

/// Knobs for a tracking pass.
#[derive(Debug, Clone)]
pub struct TrackOptions {
    /// Only items owned by this project key.
    pub project: Option<String>,
    /// Only windows for this sprint name.
    pub sprint_filter: Option<String>,
    pub granularity: Granularity,
    /// Reference time that open windows are walked up to.
    pub now: DateTime<Utc>,
}

impl Default for TrackOptions {
    fn default() -> Self {
        Self {
            project: None,
            sprint_filter: None,
            granularity: Granularity::Daily,
            now: Utc::now(),
        }
    }
}

/// How many items resolved through each fallback step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OriginCounts {
    pub own: usize,
    pub parent: usize,
    pub synthesized: usize,
    pub empty: usize,
}

impl OriginCounts {
    const fn record(&mut self, origin: &Origin) {
        match origin {
            Origin::Own => self.own += 1,
            Origin::Parent(_) => self.parent += 1,
            Origin::Synthesized => self.synthesized += 1,
            Origin::Empty => self.empty += 1,
        }
    }
}

/// Counters for one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub seen: usize,
    pub processed: usize,
    pub not_found: usize,
    pub malformed: usize,
    pub filtered: usize,
    pub entries_dropped: usize,
    pub windows_opened: usize,
    pub windows_closed: usize,
    pub origins: OriginCounts,
}

impl RunStats {
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.not_found + self.malformed + self.filtered
    }
}

/// Everything a pass produced.
#[derive(Debug, Clone)]
pub struct TrackOutcome {
    pub state: AggregationState,
    pub aggregate: Aggregate,
    pub stats: RunStats,
}

/// Resolve and replay every item in `source`, without aggregating.
///
/// # Errors
///
/// Returns the first error that is not item-local, typically
/// [`TrackError::CacheRead`] when the source cannot be listed.
pub fn build_timeline<S: IssueSource>(
    source: &S,
    names: &FieldNames,
    opts: &TrackOptions,
) -> Result<(AggregationState, RunStats), TrackError> {
    let resolver = ChangelogResolver::new(source, names);
    let mut state = AggregationState::new();
    let mut stats = RunStats::default();

    for key in source.keys()? {
        stats.seen += 1;

        let issue = match load(source, &key) {
            Ok(issue) => issue,
            Err(err) => {
                skip(&mut stats, &key, err)?;
                continue;
            }
        };

        if let Some(project) = opts.project.as_deref() {
            if !belongs_to(&issue, project) {
                stats.filtered += 1;
                continue;
            }
        }

        let resolved = match resolver.resolve_issue(issue) {
            Ok(resolved) => resolved,
            Err(err) => {
                skip(&mut stats, &key, err)?;
                continue;
            }
        };
        stats.origins.record(&resolved.origin);

        let replay = TimelineBuilder::new(&mut state, names)
            .with_sprint_filter(opts.sprint_filter.as_deref())
            .replay(&key, &resolved.changelog);
        stats.entries_dropped += replay.entries_dropped;
        stats.windows_opened += replay.windows_opened;
        stats.windows_closed += replay.windows_closed;
        stats.processed += 1;
    }

    info!(
        "replayed {} of {} items ({} skipped, {} entries dropped); {} pairs, {} windows",
        stats.processed,
        stats.seen,
        stats.skipped(),
        stats.entries_dropped,
        state.pair_count(),
        state.window_count()
    );
    Ok((state, stats))
}

/// Run a full pass: timeline reconstruction followed by aggregation.
///
/// # Errors
///
/// See [`build_timeline`].
pub fn run_track<S: IssueSource>(
    source: &S,
    names: &FieldNames,
    opts: &TrackOptions,
) -> Result<TrackOutcome, TrackError> {
    let (state, stats) = build_timeline(source, names, opts)?;
    let aggregate = Aggregator::new(opts.granularity, opts.now).aggregate(&state);
    info!(
        "aggregated {} {} buckets",
        aggregate.len(),
        opts.granularity
    );
    Ok(TrackOutcome {
        state,
        aggregate,
        stats,
    })
}

fn load<S: IssueSource>(source: &S, key: &ItemKey) -> Result<IssueRecord, TrackError> {
    source
        .issue(key)?
        .ok_or_else(|| TrackError::NotFoundInCache(key.clone()))
}

/// Project match on the decoded owner, falling back to the key prefix.
pub(crate) fn belongs_to(issue: &IssueRecord, project: &str) -> bool {
    issue
        .project
        .as_deref()
        .unwrap_or_else(|| issue.key.project())
        .eq_ignore_ascii_case(project)
}

fn skip(stats: &mut RunStats, key: &ItemKey, err: TrackError) -> Result<(), TrackError> {
    if !err.is_item_local() {
        return Err(err);
    }
    warn!("skipping {key}: {err}");
    match err {
        TrackError::NotFoundInCache(_) => stats.not_found += 1,
        _ => stats.malformed += 1,
    }
    Ok(())
}
