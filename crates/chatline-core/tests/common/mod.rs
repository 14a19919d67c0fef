#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chatline_core::records::{message_to_row, participant_to_row};
use chatline_core::{ChatService, Tables};
use chatline_db::{MemoryStore, Page, Query, Result, Row, Store, StoreError};
use chatline_types::models::{Message, ParticipantRow};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

type FailWhen = Box<dyn Fn(&Query) -> bool + Send + Sync>;

/// Wraps a `MemoryStore` with per-query latency jitter and failure
/// injection, and remembers every query it was asked.
pub struct ScriptedStore {
    inner: MemoryStore,
    rng: Mutex<StdRng>,
    max_delay_ms: u64,
    fail_when: Option<FailWhen>,
    queries: Mutex<Vec<Query>>,
}

impl ScriptedStore {
    pub fn new(page_size: usize) -> Self {
        Self {
            inner: MemoryStore::new(Tables::default().schemas(), page_size),
            rng: Mutex::new(StdRng::seed_from_u64(0)),
            max_delay_ms: 0,
            fail_when: None,
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Delay every query by a random 0..=max_delay_ms, seeded for repeatability.
    pub fn with_jitter(mut self, max_delay_ms: u64, seed: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// Fail any query matching `pred` (after its delay).
    pub fn fail_if(mut self, pred: impl Fn(&Query) -> bool + Send + Sync + 'static) -> Self {
        self.fail_when = Some(Box::new(pred));
        self
    }

    pub fn queries(&self) -> Vec<Query> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Store for ScriptedStore {
    async fn query(&self, query: &Query) -> Result<Page> {
        self.queries.lock().unwrap().push(query.clone());

        let delay = if self.max_delay_ms == 0 {
            0
        } else {
            self.rng.lock().unwrap().random_range(0..=self.max_delay_ms)
        };
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        } else {
            tokio::task::yield_now().await;
        }

        if self.fail_when.as_ref().is_some_and(|f| f(query)) {
            return Err(StoreError::Unavailable(format!(
                "injected failure on {} [{}]",
                query.table, query.key.value
            )));
        }
        self.inner.query(query).await
    }

    async fn put_item(&self, table: &str, row: Row) -> Result<()> {
        self.inner.put_item(table, row).await
    }

    async fn batch_put_items(&self, table: &str, rows: Vec<Row>) -> Result<()> {
        self.inner.batch_put_items(table, rows).await
    }
}

pub fn participant_row(conversation_id: &str, username: &str) -> Row {
    participant_to_row(&ParticipantRow {
        conversation_id: conversation_id.to_string(),
        username: username.to_string(),
    })
}

pub fn message_row(conversation_id: &str, time: i64, sender: &str, body: &str) -> Row {
    let message = Message {
        sender: sender.to_string(),
        time,
        message: body.to_string(),
    };
    message_to_row(conversation_id, &message)
}

/// alice is in c1 (with bob, two messages) and c2 (alone, no messages).
pub async fn seed_alice(store: &dyn Store) {
    let tables = Tables::default();
    store
        .batch_put_items(
            &tables.conversations,
            vec![
                participant_row("c1", "alice"),
                participant_row("c1", "bob"),
                participant_row("c2", "alice"),
            ],
        )
        .await
        .unwrap();
    store
        .put_item(&tables.messages, message_row("c1", 100, "alice", "hi bob"))
        .await
        .unwrap();
    store
        .put_item(&tables.messages, message_row("c1", 200, "bob", "hi alice"))
        .await
        .unwrap();
}

pub fn service(store: Arc<dyn Store>) -> ChatService {
    ChatService::new(store, Tables::default())
}
