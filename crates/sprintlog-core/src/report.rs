//! Render an [`Aggregate`] as CSV (or JSON rows).
//!
//! CSV layout: `timestamp,iteration,issue_count,story_points`, then one column
//! per tracked status in configured order. Estimates print with one decimal.
//! A row whose snapshot has no items in a tracked status gets `0` there;
//! statuses that are not tracked are left out.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::io::{self, Write};

use serde::Serialize;

use crate::aggregate::Aggregate;
use crate::error::TrackError;

/// Columns every report starts with.
pub const FIXED_COLUMNS: [&str; 4] = ["timestamp", "iteration", "issue_count", "story_points"];

/// One report row, as serialized in JSON mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    pub timestamp: String,
    pub iteration: String,
    pub issue_count: usize,
    pub story_points: f64,
    pub statuses: BTreeMap<String, usize>,
}

/// Writes aggregate rows with a fixed set of status columns.
#[derive(Debug, Clone)]
pub struct ReportEmitter {
    statuses: Vec<String>,
}

impl ReportEmitter {
    #[must_use]
    pub const fn new(statuses: Vec<String>) -> Self {
        Self { statuses }
    }

    #[must_use]
    pub fn statuses(&self) -> &[String] {
        &self.statuses
    }

    #[must_use]
    pub fn header(&self) -> Vec<&str> {
        FIXED_COLUMNS
            .into_iter()
            .chain(self.statuses.iter().map(String::as_str))
            .collect()
    }

    /// Rows in bucket order, with zero-filled tracked statuses.
    #[must_use]
    pub fn rows(&self, aggregate: &Aggregate) -> Vec<ReportRow> {
        aggregate
            .rows()
            .map(|(bucket, snapshot)| ReportRow {
                timestamp: bucket.label.clone(),
                iteration: bucket.sprint.clone(),
                issue_count: snapshot.issue_count(),
                story_points: snapshot.estimate,
                statuses: self
                    .statuses
                    .iter()
                    .map(|status| (status.clone(), snapshot.status_count(status)))
                    .collect(),
            })
            .collect()
    }

    /// Write the header and every row as CSV, then flush.
    ///
    /// Returns the number of data rows written.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::SinkWrite`] if writing or flushing fails.
    pub fn write_csv<W: Write>(&self, aggregate: &Aggregate, mut sink: W) -> Result<usize, TrackError> {
        let rows = self.rows(aggregate);
        self.write_csv_rows(&rows, &mut sink).map_err(TrackError::SinkWrite)?;
        Ok(rows.len())
    }

    fn write_csv_rows<W: Write>(&self, rows: &[ReportRow], sink: &mut W) -> io::Result<()> {
        write_record(sink, self.header())?;
        for row in rows {
            let mut fields = vec![
                row.timestamp.clone(),
                row.iteration.clone(),
                row.issue_count.to_string(),
                format!("{:.1}", row.story_points),
            ];
            fields.extend(
                self.statuses
                    .iter()
                    .map(|status| row.statuses.get(status).copied().unwrap_or(0).to_string()),
            );
            write_record(sink, fields.iter().map(String::as_str))?;
        }
        sink.flush()
    }

    /// Write every row as a pretty JSON array, then flush.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::SinkWrite`] if serializing, writing or flushing
    /// fails.
    pub fn write_json<W: Write>(&self, aggregate: &Aggregate, mut sink: W) -> Result<usize, TrackError> {
        let rows = self.rows(aggregate);
        serde_json::to_writer_pretty(&mut sink, &rows)
            .map_err(|e| TrackError::SinkWrite(e.into()))?;
        writeln!(sink)
            .and_then(|()| sink.flush())
            .map_err(TrackError::SinkWrite)?;
        Ok(rows.len())
    }
}

fn write_record<'a, W: Write>(sink: &mut W, fields: impl IntoIterator<Item = &'a str>) -> io::Result<()> {
    let line = fields
        .into_iter()
        .map(csv_field)
        .collect::<Vec<_>>()
        .join(",");
    writeln!(sink, "{line}")
}

/// Quote a field if it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}
