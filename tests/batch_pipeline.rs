// tests/batch_pipeline.rs
// End-to-end: fixture document in, ordered create calls out.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use whispernote::extract::extract_highlights;
use whispernote::note::BatchId;
use whispernote::publish::notestore::{NewNote, NoteStore, Notebook, RemoteFailure};
use whispernote::publish::{Publisher, RetryPolicy};
use whispernote::runner::{run_batch_paced, BatchStats};

const FIXTURE: &str = include_str!("fixtures/myhighlights.html");

enum Script {
    Ok,
    Rejected,
    Transport,
}

struct Inner {
    script: Mutex<VecDeque<Script>>,
    creates: Mutex<Vec<NewNote>>,
}

#[derive(Clone)]
struct StubStore {
    inner: Arc<Inner>,
}

impl StubStore {
    fn new(script: Vec<Script>) -> Self {
        Self {
            inner: Arc::new(Inner {
                script: Mutex::new(script.into()),
                creates: Mutex::new(Vec::new()),
            }),
        }
    }

    fn creates(&self) -> Vec<NewNote> {
        self.inner.creates.lock().unwrap().clone()
    }
}

#[async_trait]
impl NoteStore for StubStore {
    async fn list_notebooks(&self) -> Result<Vec<Notebook>, RemoteFailure> {
        Ok(Vec::new())
    }

    async fn create_note(&self, note: &NewNote) -> Result<(), RemoteFailure> {
        self.inner.creates.lock().unwrap().push(note.clone());
        match self.inner.script.lock().unwrap().pop_front() {
            None | Some(Script::Ok) => Ok(()),
            Some(Script::Rejected) => {
                Err(RemoteFailure::ContentRejected("bad ENML".to_string()))
            }
            Some(Script::Transport) => {
                Err(RemoteFailure::Transport("connection reset".to_string()))
            }
        }
    }
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        rate_limit_margin: Duration::from_millis(10),
        transient_backoff: Duration::from_millis(5),
    }
}

async fn run(store: StubStore) -> BatchStats {
    let publisher = Publisher::connect_with(store, None, fast_policy(), Duration::ZERO)
        .await
        .unwrap();
    let records = extract_highlights(FIXTURE).unwrap();
    let batch = BatchId::now();
    run_batch_paced(&publisher, &records, &batch, Duration::ZERO)
        .await
        .unwrap()
}

#[tokio::test]
async fn all_records_published_in_document_order() {
    let store = StubStore::new(Vec::new());
    let stats = run(store.clone()).await;

    assert_eq!(
        stats,
        BatchStats {
            created: 3,
            skipped: 0,
            exhausted: 0
        }
    );

    let creates = store.creates();
    assert_eq!(creates.len(), 3);
    assert_eq!(
        creates[0].title,
        "We who cut mere stones must always be envisioning cathedrals in"
    );
    assert_eq!(creates[1].title, "Care about your craft daily");
    assert_eq!(creates[2].title, "The only thing that makes a thing true is belief");
}

#[tokio::test]
async fn bodies_share_one_batch_id_and_carry_highlight_ids() {
    let store = StubStore::new(Vec::new());
    run(store.clone()).await;

    let creates = store.creates();
    assert!(creates[0].content.contains("Highlight ID: <tt>B003GCTQAE1234</tt>"));
    assert!(creates[2].content.contains("Highlight ID: <tt>B000FC1I3Y409</tt>"));

    let batch_of = |n: &NewNote| {
        let start = n.content.find("Batch ID: <tt>").unwrap() + "Batch ID: <tt>".len();
        n.content[start..start + "batch".len() + 14].to_string()
    };
    assert_eq!(batch_of(&creates[0]), batch_of(&creates[1]));
    assert_eq!(batch_of(&creates[1]), batch_of(&creates[2]));
}

#[tokio::test]
async fn one_bad_record_does_not_abort_the_batch() {
    // Record 1 succeeds, record 2 is rejected outright, record 3 burns all
    // three attempts on transport failures.
    let store = StubStore::new(vec![
        Script::Ok,
        Script::Rejected,
        Script::Transport,
        Script::Transport,
        Script::Transport,
    ]);
    let stats = run(store.clone()).await;

    assert_eq!(
        stats,
        BatchStats {
            created: 1,
            skipped: 1,
            exhausted: 1
        }
    );
    // 1 + 1 + 3 attempts, still strictly in record order.
    let titles: Vec<_> = store.creates().iter().map(|n| n.title.clone()).collect();
    assert_eq!(titles.len(), 5);
    assert_eq!(titles[1], "Care about your craft daily");
    assert!(titles[2..].iter().all(|t| t == &titles[2]));
}
