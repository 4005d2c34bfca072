use bigdecimal::BigDecimal;
use futures::future::join_all;
use payment_service::{MemoryPaymentStore, PaymentCoordinator, PaymentFilter, PaymentStore};
use shared::PaymentRequest;
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

fn request(bill_id: i32) -> PaymentRequest {
    PaymentRequest {
        bill_id,
        amount: BigDecimal::from_str("19.99").unwrap(),
        method: "card".to_string(),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_identical_requests_store_one_row() {
    let store = Arc::new(MemoryPaymentStore::new());
    let coordinator = PaymentCoordinator::new(store.clone());
    let key = Uuid::new_v4().to_string();

    let tasks = (0..64).map(|_| {
        let coordinator = coordinator.clone();
        let key = key.clone();
        tokio::spawn(async move { coordinator.create(request(42), &key).await })
    });

    let outcomes: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    assert_eq!(outcomes.len(), 64);
    assert_eq!(outcomes.iter().filter(|o| o.is_created()).count(), 1);

    let first = outcomes[0].payment();
    assert!(outcomes.iter().all(|o| o.payment() == first));
    assert_eq!(store.count_by_reference(&key).await, 1);
    assert_eq!(store.len().await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_distinct_keys_never_collide() {
    let store = Arc::new(MemoryPaymentStore::new());
    let coordinator = PaymentCoordinator::new(store.clone());

    // 16 keys, each submitted 4 times.
    let keys: Vec<String> = (0..16).map(|i| format!("key-{}", i)).collect();
    let tasks = keys.iter().cycle().take(64).cloned().map(|key| {
        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            let outcome = coordinator.create(request(7), &key).await.unwrap();
            (key, outcome)
        })
    });

    let results: Vec<_> = join_all(tasks).await.into_iter().map(|r| r.unwrap()).collect();

    for key in &keys {
        let ids: HashSet<_> = results
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, o)| o.payment().payment_id)
            .collect();
        assert_eq!(ids.len(), 1, "key {} mapped to {:?}", key, ids);
    }

    let rows = store
        .list(PaymentFilter { limit: 1000, ..Default::default() })
        .await
        .unwrap();
    assert_eq!(rows.len(), keys.len());
    let references: HashSet<_> = rows.iter().map(|p| p.reference.as_str()).collect();
    assert_eq!(references.len(), rows.len());
}

#[tokio::test]
async fn sequential_retries_converge() {
    let store = Arc::new(MemoryPaymentStore::new());
    let coordinator = PaymentCoordinator::new(store.clone());

    let mut ids = HashSet::new();
    for _ in 0..10 {
        let outcome = coordinator.create(request(1), "retry-me").await.unwrap();
        ids.insert(outcome.payment().payment_id);
    }
    assert_eq!(ids.len(), 1);
    assert_eq!(store.len().await, 1);
}
