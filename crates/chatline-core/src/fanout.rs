use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, PoisonError};

use chatline_db::{Result, StoreError};
use chatline_types::models::ConversationSummary;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::readers::Readers;

type Completion = Box<dyn FnOnce(Result<Vec<ConversationSummary>>) + Send>;

/// Loads participants and last activity for many conversations at once and
/// reports a single combined result.
///
/// Every identifier gets a pre-assigned slot; each of its two sub-fetches
/// writes only into that slot. A count of incomplete slots decides when the
/// whole batch is done, so the completion fires exactly once no matter how
/// the sub-fetches interleave. The first failure wins and later results
/// are discarded.
#[derive(Clone)]
pub struct FanOutAggregator {
    readers: Readers,
}

impl FanOutAggregator {
    pub fn new(readers: Readers) -> Self {
        Self { readers }
    }

    /// Start the fan-out and call `on_done` once with the outcome.
    ///
    /// With no identifiers `on_done` runs before this returns. Otherwise the
    /// sub-fetches are spawned onto the current tokio runtime; they are not
    /// cancelled if another one fails.
    pub fn start<F>(&self, ids: Vec<String>, on_done: F)
    where
        F: FnOnce(Result<Vec<ConversationSummary>>) + Send + 'static,
    {
        if ids.is_empty() {
            on_done(Ok(Vec::new()));
            return;
        }

        debug!("Fanning out detail fetches for {} conversations", ids.len());
        let barrier = Arc::new(Barrier::new(&ids, Box::new(on_done)));

        for (index, id) in ids.into_iter().enumerate() {
            let readers = self.readers.clone();
            let slot_barrier = barrier.clone();
            let conversation_id = id.clone();
            tokio::spawn(async move {
                match readers.last_activity(&conversation_id).await {
                    Ok(last) => slot_barrier.record(index, Fetched::LastActivity(last)),
                    Err(e) => slot_barrier.fail(e),
                }
            });

            let readers = self.readers.clone();
            let slot_barrier = barrier.clone();
            tokio::spawn(async move {
                match readers.participants(&id).await {
                    Ok(participants) => slot_barrier.record(index, Fetched::Participants(participants)),
                    Err(e) => slot_barrier.fail(e),
                }
            });
        }
    }

    /// Awaitable form of [`start`](Self::start). Results come back in the
    /// order of `ids`.
    pub async fn aggregate(&self, ids: Vec<String>) -> Result<Vec<ConversationSummary>> {
        let (tx, rx) = oneshot::channel();
        self.start(ids, move |result| {
            let _ = tx.send(result);
        });

        // The sender is only dropped unsent if every sub-fetch task died.
        rx.await
            .map_err(|_| StoreError::Task("fan-out ended without a result".into()))?
    }
}

/// Outcome of one sub-fetch.
enum Fetched {
    Participants(BTreeSet<String>),
    LastActivity(Option<i64>),
}

struct Slot {
    id: String,
    participants: BTreeSet<String>,
    participants_loaded: bool,
    /// `None` is a legitimate loaded value: the thread is empty.
    last: Option<i64>,
    last_loaded: bool,
}

impl Slot {
    fn is_complete(&self) -> bool {
        self.participants_loaded && self.last_loaded
    }

    fn into_summary(self) -> ConversationSummary {
        ConversationSummary {
            id: self.id,
            participants: self.participants,
            last: self.last,
        }
    }
}

struct BarrierState {
    slots: Vec<Slot>,
    /// Slots not yet complete.
    remaining: usize,
    /// Taken exactly once, by whichever of success or failure gets there first.
    completion: Option<Completion>,
}

struct Barrier {
    state: Mutex<BarrierState>,
}

impl Barrier {
    fn new(ids: &[String], completion: Completion) -> Self {
        let slots = ids
            .iter()
            .map(|id| Slot {
                id: id.clone(),
                participants: BTreeSet::new(),
                participants_loaded: false,
                last: None,
                last_loaded: false,
            })
            .collect();

        Self {
            state: Mutex::new(BarrierState {
                slots,
                remaining: ids.len(),
                completion: Some(completion),
            }),
        }
    }

    fn record(&self, index: usize, fetched: Fetched) {
        let finished = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.completion.is_none() {
                // Already aborted by an earlier failure.
                return;
            }

            let slot = &mut state.slots[index];
            let was_complete = slot.is_complete();
            match fetched {
                Fetched::Participants(participants) => {
                    slot.participants = participants;
                    slot.participants_loaded = true;
                }
                Fetched::LastActivity(last) => {
                    slot.last = last;
                    slot.last_loaded = true;
                }
            }
            if was_complete || !slot.is_complete() {
                return;
            }

            state.remaining -= 1;
            if state.remaining > 0 {
                return;
            }

            let summaries: Vec<_> = std::mem::take(&mut state.slots)
                .into_iter()
                .map(Slot::into_summary)
                .collect();
            state.completion.take().map(|done| (done, summaries))
        };

        if let Some((done, summaries)) = finished {
            debug!("Fan-out complete: {} conversations", summaries.len());
            done(Ok(summaries));
        }
    }

    fn fail(&self, err: StoreError) {
        let completion = self
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .completion
            .take();

        match completion {
            Some(done) => {
                warn!("Fan-out aborted: {}", err);
                done(Err(err));
            }
            None => debug!("Ignoring sub-fetch failure after fan-out finished: {}", err),
        }
    }
}
