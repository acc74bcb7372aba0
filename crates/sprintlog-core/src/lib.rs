//! sprintlog-core library.
//!
//! Rebuilds sprint membership timelines from cached tracker changelogs and
//! aggregates them into per-sprint time series.
//!
//! Pipeline: [`cache::IssueSource`] → [`resolve::ChangelogResolver`] →
//! [`timeline::TimelineBuilder`] → [`aggregate::Aggregator`] →
//! [`report::ReportEmitter`]. [`run::run_track`] drives one batch pass.

pub mod aggregate;
pub mod cache;
pub mod changelog;
pub mod config;
pub mod error;
pub mod model;
pub mod query;
pub mod report;
pub mod resolve;
pub mod run;
pub mod timeline;

/// # Conventions
///
/// - **Errors**: Library operations return [`error::TrackError`]; config
///   loading uses `anyhow::Result`.
/// - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).
pub use error::{ErrorCode, TrackError};
pub use model::item_key::ItemKey;
