mod common;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chatline_core::tables::TIMESTAMP;
use chatline_core::{FanOutAggregator, Readers, StoreError, Tables};
use chatline_db::{AttributeValue, Store};
use chatline_types::models::ConversationSummary;
use common::{ScriptedStore, message_row, participant_row, seed_alice, service};
use tokio::sync::mpsc;

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn lists_alice_conversations() {
    let store = Arc::new(ScriptedStore::new(100));
    seed_alice(store.as_ref()).await;

    let mut listed = service(store).list_conversations("alice").await.unwrap();
    listed.sort_by(|a, b| a.id.cmp(&b.id));

    assert_eq!(
        listed,
        vec![
            ConversationSummary { id: "c1".into(), participants: set(&["alice", "bob"]), last: Some(200) },
            ConversationSummary { id: "c2".into(), participants: set(&["alice"]), last: None },
        ]
    );
}

#[tokio::test]
async fn unknown_user_has_no_conversations() {
    let store = Arc::new(ScriptedStore::new(100));
    seed_alice(store.as_ref()).await;
    assert!(service(store).list_conversations("mallory").await.unwrap().is_empty());
}

#[tokio::test]
async fn listing_twice_yields_same_set() {
    let store = Arc::new(ScriptedStore::new(2).with_jitter(3, 11));
    seed_alice(store.as_ref()).await;
    let tables = Tables::default();
    for i in 0..7 {
        store
            .put_item(&tables.conversations, participant_row(&format!("g{}", i), "alice"))
            .await
            .unwrap();
    }

    let svc = service(store);
    let ids = |list: Vec<ConversationSummary>| list.into_iter().map(|c| c.id).collect::<BTreeSet<_>>();
    let first = ids(svc.list_conversations("alice").await.unwrap());
    let second = ids(svc.list_conversations("alice").await.unwrap());
    assert_eq!(first.len(), 9);
    assert_eq!(first, second);
}

/// Seeds `n` conversations: conversation i has i % 3 messages and one or
/// two participants.
async fn seed_many(store: &dyn Store, n: usize) -> Vec<String> {
    let tables = Tables::default();
    let mut ids = Vec::new();
    for i in 0..n {
        let id = format!("conv-{}", i);
        store.put_item(&tables.conversations, participant_row(&id, "alice")).await.unwrap();
        if i % 2 == 0 {
            store.put_item(&tables.conversations, participant_row(&id, "bob")).await.unwrap();
        }
        for m in 0..(i % 3) {
            let row = message_row(&id, 1000 + m as i64, "alice", "m");
            store.put_item(&tables.messages, row).await.unwrap();
        }
        ids.push(id);
    }
    ids
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn completion_fires_once_in_input_order() {
    for n in [0usize, 1, 5] {
        for seed in 0..8u64 {
            // Jitter of 0..=2ms makes out-of-order completion and ties common.
            let store = Arc::new(ScriptedStore::new(100).with_jitter(2, seed));
            let mut ids = seed_many(store.as_ref(), n).await;
            ids.reverse();

            let fanout = FanOutAggregator::new(Readers::new(store, Tables::default()));
            let calls = Arc::new(AtomicUsize::new(0));
            let (tx, mut rx) = mpsc::unbounded_channel();

            let counter = calls.clone();
            fanout.start(ids.clone(), move |result| {
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = tx.send(result);
            });

            let result = rx.recv().await.expect("completion callback").unwrap();
            // Give any straggling sub-fetch a chance to signal a second time.
            tokio::time::sleep(Duration::from_millis(10)).await;
            assert_eq!(calls.load(Ordering::SeqCst), 1, "n={} seed={}", n, seed);

            let got: Vec<_> = result.iter().map(|c| c.id.clone()).collect();
            assert_eq!(got, ids, "n={} seed={}", n, seed);
            for summary in &result {
                let i: usize = summary.id.trim_start_matches("conv-").parse().unwrap();
                assert!(summary.participants.contains("alice"));
                assert_eq!(summary.participants.contains("bob"), i % 2 == 0);
                let expected_last = match i % 3 {
                    0 => None,
                    k => Some(1000 + k as i64 - 1),
                };
                assert_eq!(summary.last, expected_last, "conversation {}", summary.id);
            }
        }
    }
}

#[tokio::test]
async fn conversation_without_participants_still_completes() {
    let store = Arc::new(ScriptedStore::new(100));
    let tables = Tables::default();
    store
        .put_item(&tables.messages, message_row("ghost", 42, "nobody", "echo"))
        .await
        .unwrap();
    store.put_item(&tables.conversations, participant_row("real", "alice")).await.unwrap();

    let fanout = FanOutAggregator::new(Readers::new(store, tables));
    let result = fanout
        .aggregate(vec!["ghost".into(), "real".into()])
        .await
        .unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(result[0].id, "ghost");
    assert!(result[0].participants.is_empty());
    assert_eq!(result[0].last, Some(42));
    assert_eq!(result[1].participants, set(&["alice"]));
    assert_eq!(result[1].last, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_failures_are_reported_once() {
    // Every participant lookup fails; last-activity lookups succeed.
    let conversations = Tables::default().conversations;
    let store = ScriptedStore::new(100)
        .with_jitter(2, 3)
        .fail_if(move |q| q.table == conversations && q.index.is_none());
    let store = Arc::new(store);
    let ids = seed_many(store.as_ref(), 5).await;

    let fanout = FanOutAggregator::new(Readers::new(store, Tables::default()));
    let calls = Arc::new(AtomicUsize::new(0));
    let (tx, mut rx) = mpsc::unbounded_channel();
    let counter = calls.clone();
    fanout.start(ids, move |result| {
        counter.fetch_add(1, Ordering::SeqCst);
        let _ = tx.send(result);
    });

    let result = rx.recv().await.expect("completion callback");
    assert!(matches!(result, Err(StoreError::Unavailable(_))));

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn one_failing_conversation_fails_the_listing() {
    let store = ScriptedStore::new(100).fail_if(|q| {
        q.key.value == AttributeValue::from("c2") && q.projection.as_deref() == Some(&[TIMESTAMP.to_string()][..])
    });
    let store = Arc::new(store);
    seed_alice(store.as_ref()).await;

    let err = service(store).list_conversations("alice").await.unwrap_err();
    match err {
        StoreError::Unavailable(msg) => assert!(msg.contains("c2"), "{}", msg),
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn index_failure_fails_before_fan_out() {
    let store = Arc::new(ScriptedStore::new(100).fail_if(|q| q.index.is_some()));
    seed_alice(store.as_ref()).await;

    assert!(service(store.clone()).list_conversations("alice").await.is_err());
    assert_eq!(store.queries().len(), 1);
}
