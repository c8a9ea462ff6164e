// src/lib.rs
// Public library surface for integration tests (and the CLI binary).

pub mod config;
pub mod extract;
pub mod locator;
pub mod note;
pub mod publish;
pub mod runner;

// ---- Re-exports for stable public API ----
pub use crate::extract::{extract_highlights, HighlightRecord};
pub use crate::note::{render_note, BatchId, RenderedNote};
pub use crate::publish::{PublishOutcome, Publisher, RetryPolicy};
pub use crate::runner::{run_batch, BatchStats};
