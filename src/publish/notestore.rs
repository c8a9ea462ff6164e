// src/publish/notestore.rs
// Note store API surface: the trait the retry machine drives, the HTTP
// implementation, and the typed failures that pick the recovery path.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A notebook as reported by the note store's listing call.
#[derive(Debug, Clone, Deserialize)]
pub struct Notebook {
    pub name: String,
    pub guid: String,
}

/// A rendered note ready for submission.
#[derive(Debug, Clone, Serialize)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    #[serde(rename = "notebookGuid", skip_serializing_if = "Option::is_none")]
    pub notebook_guid: Option<String>,
}

/// Typed note store failure, detailed enough to drive the retry machine.
#[derive(Debug)]
pub enum RemoteFailure {
    /// The service capped call frequency; `wait_secs` is its suggested pause.
    RateLimited { wait_secs: u64 },
    /// The service could not parse the note content. Not retryable.
    ContentRejected(String),
    /// Connection-level failure, worth retrying after a pause.
    Transport(String),
    /// Unclassified service error. Not assumed safe to retry.
    System(String),
}

impl fmt::Display for RemoteFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteFailure::RateLimited { wait_secs } => {
                write!(f, "rate limit reached, suggested wait {wait_secs}s")
            }
            RemoteFailure::ContentRejected(detail) => {
                write!(f, "note content rejected: {detail}")
            }
            RemoteFailure::Transport(detail) => write!(f, "transport failure: {detail}"),
            RemoteFailure::System(detail) => write!(f, "note store system error: {detail}"),
        }
    }
}

impl std::error::Error for RemoteFailure {}

/// The two calls this tool consumes. A trait seam so the retry machine and
/// the batch runner can be exercised against scripted stores in tests.
#[async_trait]
pub trait NoteStore {
    async fn list_notebooks(&self) -> Result<Vec<Notebook>, RemoteFailure>;
    async fn create_note(&self, note: &NewNote) -> Result<(), RemoteFailure>;
}

/// reqwest-backed note store client. Bearer token auth, JSON bodies.
pub struct HttpNoteStore {
    base_url: String,
    token: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpNoteStore {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            client: reqwest::Client::new(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Maps a non-success HTTP status onto the failure taxonomy. 429 carries
    /// the server's Retry-After; absent or unreadable, fall back to 60s.
    fn classify_status(
        status: reqwest::StatusCode,
        retry_after: Option<u64>,
        detail: String,
    ) -> RemoteFailure {
        use reqwest::StatusCode;
        match status {
            StatusCode::TOO_MANY_REQUESTS => RemoteFailure::RateLimited {
                wait_secs: retry_after.unwrap_or(60),
            },
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                RemoteFailure::ContentRejected(detail)
            }
            _ => RemoteFailure::System(format!("{status}: {detail}")),
        }
    }

    async fn check(resp: reqwest::Response) -> Result<reqwest::Response, RemoteFailure> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let retry_after = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let body = resp.text().await.unwrap_or_default();
        Err(Self::classify_status(status, retry_after, error_detail(body)))
    }
}

/// Error bodies are JSON `{"message": ...}` when the service is healthy and
/// arbitrary text when it is not; keep whatever we got.
fn error_detail(body: String) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }
    match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => parsed.message,
        Err(_) => body,
    }
}

fn transport(e: reqwest::Error) -> RemoteFailure {
    RemoteFailure::Transport(e.to_string())
}

#[async_trait]
impl NoteStore for HttpNoteStore {
    async fn list_notebooks(&self) -> Result<Vec<Notebook>, RemoteFailure> {
        let resp = self
            .client
            .get(format!("{}/notebooks", self.base_url))
            .bearer_auth(&self.token)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(transport)?;
        let resp = Self::check(resp).await?;
        resp.json::<Vec<Notebook>>()
            .await
            .map_err(|e| RemoteFailure::System(format!("decoding notebook list: {e}")))
    }

    async fn create_note(&self, note: &NewNote) -> Result<(), RemoteFailure> {
        let resp = self
            .client
            .post(format!("{}/notes", self.base_url))
            .bearer_auth(&self.token)
            .timeout(self.timeout)
            .json(note)
            .send()
            .await
            .map_err(transport)?;
        Self::check(resp).await.map(|_| ())
    }
}
