// src/publish/mod.rs
// Session setup and the bounded retry machine around note creation.

pub mod notestore;

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;

use crate::note::RenderedNote;
use crate::publish::notestore::{NewNote, NoteStore, Notebook, RemoteFailure};

const RATE_LIMIT_BANNER: &str = r"
*********************************************
***                                       ***
***        API  LIMIT  EXCEEDED           ***
***                                       ***
*********************************************
";

/// Attempt bounds and backoff durations. Tests shrink the durations;
/// production uses the defaults, which match the service's expectations.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Safety margin added on top of the server-suggested rate limit wait.
    pub rate_limit_margin: Duration,
    /// Fixed pause before retrying a connection-level failure.
    pub transient_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            rate_limit_margin: Duration::from_secs(60),
            transient_backoff: Duration::from_secs(60),
        }
    }
}

/// Terminal outcome of one record's publish attempt sequence. Exhausted
/// retries are explicit, never a silent fall-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    Created,
    SkippedUnparseable,
    FailedExhausted,
}

/// Next move after a failed attempt. A give-up may still carry a wait the
/// server mandated; it is slept before the record is written off so the next
/// record does not fire straight into the known rate limit window.
#[derive(Debug)]
pub enum RetryStep {
    BackOff { wait: Duration, rate_limited: bool },
    Skip,
    GiveUp { mandated_wait: Option<Duration> },
    Abort(RemoteFailure),
}

/// Pure classification of a failed attempt (`attempt` is 1-based), so the
/// whole machine is checkable without sleeping:
/// content rejection skips the record, unclassified system errors abort the
/// run, rate limits wait out the server's suggestion plus the margin, and
/// transport failures take the fixed backoff. Either retryable failure on
/// the final attempt gives up instead, though a rate limit keeps its
/// mandated wait.
pub fn classify_failure(attempt: u32, err: RemoteFailure, policy: &RetryPolicy) -> RetryStep {
    match err {
        RemoteFailure::ContentRejected(_) => RetryStep::Skip,
        RemoteFailure::System(_) => RetryStep::Abort(err),
        RemoteFailure::RateLimited { wait_secs } => {
            let wait = Duration::from_secs(wait_secs) + policy.rate_limit_margin;
            if attempt < policy.max_attempts {
                RetryStep::BackOff {
                    wait,
                    rate_limited: true,
                }
            } else {
                RetryStep::GiveUp {
                    mandated_wait: Some(wait),
                }
            }
        }
        RemoteFailure::Transport(_) if attempt < policy.max_attempts => RetryStep::BackOff {
            wait: policy.transient_backoff,
            rate_limited: false,
        },
        RemoteFailure::Transport(_) => RetryStep::GiveUp { mandated_wait: None },
    }
}

async fn back_off(wait: Duration, rate_limited: bool) {
    let resume_at = Local::now() + chrono::Duration::seconds(wait.as_secs() as i64);
    if rate_limited {
        println!("{RATE_LIMIT_BANNER}");
        tracing::warn!(
            wait_secs = wait.as_secs(),
            resume_at = %resume_at.format("%H:%M:%S"),
            "API rate limit exceeded, backing off"
        );
    } else {
        tracing::warn!(
            wait_secs = wait.as_secs(),
            resume_at = %resume_at.format("%H:%M:%S"),
            "transient failure, backing off"
        );
    }
    tokio::time::sleep(wait).await;
}

/// Owns the note store session. Resolves the target notebook once at
/// connect time; publishes one note per call under the retry policy.
pub struct Publisher<S> {
    store: S,
    notebook_guid: Option<String>,
    policy: RetryPolicy,
    /// Short pause after each successful create. Nice to the API.
    pacing: Duration,
}

impl<S: NoteStore> Publisher<S> {
    pub async fn connect(store: S, notebook: Option<&str>) -> Result<Self> {
        Self::connect_with(
            store,
            notebook,
            RetryPolicy::default(),
            Duration::from_secs(1),
        )
        .await
    }

    pub async fn connect_with(
        store: S,
        notebook: Option<&str>,
        policy: RetryPolicy,
        pacing: Duration,
    ) -> Result<Self> {
        let notebooks = list_notebooks_with_retry(&store, &policy).await?;
        let notebook_guid = match notebook {
            None => None,
            Some(name) => {
                let guid = notebooks
                    .iter()
                    .find(|nb| nb.name == name)
                    .map(|nb| nb.guid.clone());
                match guid {
                    Some(guid) => Some(guid),
                    None => bail!("notebook {name:?} not found in note store"),
                }
            }
        };
        tracing::info!(notebooks = notebooks.len(), "note store session established");
        Ok(Self {
            store,
            notebook_guid,
            policy,
            pacing,
        })
    }

    /// Runs the retry machine for one rendered note. `Ok` carries the
    /// record's terminal outcome; `Err` is an unrecoverable service failure
    /// and the caller aborts the batch.
    pub async fn publish(&self, note: &RenderedNote) -> Result<PublishOutcome> {
        let payload = NewNote {
            title: note.title.clone(),
            content: note.body.clone(),
            notebook_guid: self.notebook_guid.clone(),
        };

        for attempt in 1..=self.policy.max_attempts {
            tracing::info!(title = %payload.title, attempt, "attempting to create note");
            match self.store.create_note(&payload).await {
                Ok(()) => {
                    tracing::info!(title = %payload.title, "note created");
                    tokio::time::sleep(self.pacing).await;
                    return Ok(PublishOutcome::Created);
                }
                Err(err) => match classify_failure(attempt, err, &self.policy) {
                    RetryStep::Skip => {
                        tracing::warn!(title = %payload.title, "unable to parse, skipping");
                        return Ok(PublishOutcome::SkippedUnparseable);
                    }
                    RetryStep::Abort(err) => {
                        return Err(anyhow!(err)).context("unrecoverable note store failure");
                    }
                    RetryStep::GiveUp { mandated_wait } => {
                        if let Some(wait) = mandated_wait {
                            back_off(wait, true).await;
                        }
                        break;
                    }
                    RetryStep::BackOff { wait, rate_limited } => {
                        back_off(wait, rate_limited).await;
                    }
                },
            }
        }

        tracing::error!(
            title = %note.title,
            attempts = self.policy.max_attempts,
            "retries exhausted, note not created"
        );
        Ok(PublishOutcome::FailedExhausted)
    }
}

/// Session establishment follows the same policy as note creation; running
/// out of attempts here is fatal for the whole run.
async fn list_notebooks_with_retry<S: NoteStore>(
    store: &S,
    policy: &RetryPolicy,
) -> Result<Vec<Notebook>> {
    for attempt in 1..=policy.max_attempts {
        tracing::info!(attempt, "retrieving notebook list");
        match store.list_notebooks().await {
            Ok(list) => return Ok(list),
            Err(err) => match classify_failure(attempt, err, policy) {
                RetryStep::Skip => bail!("note store rejected the notebook listing call"),
                RetryStep::Abort(err) => {
                    return Err(anyhow!(err)).context("unrecoverable failure during connect");
                }
                RetryStep::GiveUp { mandated_wait } => {
                    if let Some(wait) = mandated_wait {
                        back_off(wait, true).await;
                    }
                    break;
                }
                RetryStep::BackOff { wait, rate_limited } => back_off(wait, rate_limited).await,
            },
        }
    }
    bail!(
        "could not retrieve notebook list after {} attempts",
        policy.max_attempts
    )
}
