// src/runner.rs
// Drives the whole batch: render each record, publish, pace, tally.

use std::time::Duration;

use anyhow::Result;

use crate::extract::HighlightRecord;
use crate::note::{is_well_formed_enml, render_note, BatchId};
use crate::publish::{notestore::NoteStore, PublishOutcome, Publisher};

/// Per-outcome tally for one run, logged when the batch finishes.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchStats {
    pub created: usize,
    pub skipped: usize,
    pub exhausted: usize,
}

/// Publishes every record in document order, strictly serial, with a short
/// pause between successive records regardless of outcome. Serial on
/// purpose: the note store rate-limits aggressively.
pub async fn run_batch<S: NoteStore>(
    publisher: &Publisher<S>,
    records: &[HighlightRecord],
    batch: &BatchId,
) -> Result<BatchStats> {
    run_batch_paced(publisher, records, batch, Duration::from_secs(2)).await
}

pub async fn run_batch_paced<S: NoteStore>(
    publisher: &Publisher<S>,
    records: &[HighlightRecord],
    batch: &BatchId,
    pacing: Duration,
) -> Result<BatchStats> {
    let mut stats = BatchStats::default();
    for (i, rec) in records.iter().enumerate() {
        let note = render_note(rec, batch);
        if !is_well_formed_enml(&note.body) {
            tracing::warn!(id = %rec.id, "rendered note body is not well-formed ENML");
        }
        match publisher.publish(&note).await? {
            PublishOutcome::Created => stats.created += 1,
            PublishOutcome::SkippedUnparseable => stats.skipped += 1,
            PublishOutcome::FailedExhausted => stats.exhausted += 1,
        }
        if i + 1 < records.len() {
            tokio::time::sleep(pacing).await;
        }
    }
    tracing::info!(
        created = stats.created,
        skipped = stats.skipped,
        exhausted = stats.exhausted,
        "finished adding notes"
    );
    Ok(stats)
}
