//! Batch driver: one writer session per run, rows fed in dataset order.

use indicatif::ProgressBar;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::error::Error;
use crate::normalize::Normalizer;
use crate::schema::Schema;
use crate::traits::{IndexBackend, WriterSession};
use crate::types::{OpenMode, RawRecord};

pub const DEFAULT_MAX_SKIP_REASONS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipKind {
    DateFormat,
    UnknownField,
    ValueMismatch,
}

/// A row that was not indexed. `row` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkipRecord {
    pub row: usize,
    pub kind: SkipKind,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub seen: usize,
    pub indexed: usize,
    pub skipped: usize,
    /// The first `max_skip_reasons` skips, in row order.
    pub skips: Vec<SkipRecord>,
    /// Documents in the store after the final commit, `None` when the
    /// closing commit failed and the count is not known.
    pub committed: Option<u64>,
    pub elapsed: Duration,
    #[serde(skip)]
    max_skip_reasons: usize,
}

impl BatchReport {
    fn new(max_skip_reasons: usize) -> Self { Self { max_skip_reasons, ..Self::default() } }

    fn record_skip(&mut self, row: usize, err: &Error) {
        self.skipped += 1;
        let kind = match err {
            Error::DateFormat { .. } => SkipKind::DateFormat,
            Error::UnknownField(_) => SkipKind::UnknownField,
            _ => SkipKind::ValueMismatch,
        };
        warn!(row, reason = %err, "row skipped");
        if self.skips.len() < self.max_skip_reasons {
            self.skips.push(SkipRecord { row, kind, reason: err.to_string() });
        }
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "rows seen: {}, indexed: {}, skipped: {} (store holds {} documents, {:.2?})",
            self.seen,
            self.indexed,
            self.skipped,
            self.committed.map_or_else(|| "unknown".to_string(), |n| n.to_string()),
            self.elapsed
        )?;
        for skip in &self.skips {
            writeln!(f, "  row {}: {}", skip.row, skip.reason)?;
        }
        if self.skipped > self.skips.len() {
            writeln!(f, "  ... and {} more", self.skipped - self.skips.len())?;
        }
        Ok(())
    }
}

/// A store-level failure, with the report of what happened before it.
#[derive(Debug, thiserror::Error)]
#[error("batch aborted after {seen} rows ({indexed} indexed): {source}", seen = .report.seen, indexed = .report.indexed)]
pub struct BatchAborted {
    #[source]
    pub source: Error,
    pub report: BatchReport,
}

pub struct BatchDriver<'a> {
    backend: &'a dyn IndexBackend,
    normalizer: Normalizer,
    max_skip_reasons: usize,
    progress: Option<ProgressBar>,
}

impl<'a> BatchDriver<'a> {
    pub fn new(backend: &'a dyn IndexBackend) -> Self {
        Self { backend, normalizer: Normalizer::default(), max_skip_reasons: DEFAULT_MAX_SKIP_REASONS, progress: None }
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_max_skip_reasons(mut self, max: usize) -> Self {
        self.max_skip_reasons = max;
        self
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Index `dataset` into the store at `store`.
    ///
    /// Rows that fail normalization or are rejected by the store schema are
    /// skipped. Any other failure aborts the batch; the session is still
    /// closed first, so rows inserted before the failure stay committed.
    pub fn run<I>(&self, dataset: I, schema: &Schema, store: &Path, mode: OpenMode) -> Result<BatchReport, BatchAborted>
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let started = Instant::now();
        let mut report = BatchReport::new(self.max_skip_reasons);
        info!(store = %store.display(), %mode, "starting batch");
        let mut session = match self.backend.open(store, mode, schema) {
            Ok(session) => session,
            Err(source) => {
                self.finish_progress();
                report.elapsed = started.elapsed();
                return Err(BatchAborted { source, report });
            }
        };

        let fed = self.feed(session.as_mut(), dataset, schema, &mut report);
        let closed = session.close();
        self.finish_progress();
        report.elapsed = started.elapsed();

        match (fed, closed) {
            (Ok(()), Ok(committed)) => {
                report.committed = Some(committed);
                info!(seen = report.seen, indexed = report.indexed, skipped = report.skipped, committed, "batch complete");
                Ok(report)
            }
            (Err(source), closed) => {
                match closed {
                    Ok(committed) => report.committed = Some(committed),
                    Err(err) => warn!(error = %err, "close after failure also failed"),
                }
                Err(BatchAborted { source, report })
            }
            (Ok(()), Err(source)) => Err(BatchAborted { source, report }),
        }
    }

    fn finish_progress(&self) {
        if let Some(pb) = &self.progress {
            pb.finish_and_clear();
        }
    }

    fn feed<I>(&self, session: &mut dyn WriterSession, dataset: I, schema: &Schema, report: &mut BatchReport) -> Result<(), Error>
    where
        I: IntoIterator<Item = RawRecord>,
    {
        for raw in dataset {
            report.seen += 1;
            let row = report.seen;
            if let Some(pb) = &self.progress {
                pb.inc(1);
            }
            let outcome = self.normalizer.normalize(&raw, schema).and_then(|doc| session.insert(doc));
            match outcome {
                Ok(()) => report.indexed += 1,
                Err(err) if err.is_row_level() => report.record_skip(row, &err),
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }
}
