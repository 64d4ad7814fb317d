mod common;

use common::{eventually, fast_settings, MemoryStore};
use rasmus_core::{DeliveryScheme, KeySpace, Response};
use rasmus_worker::{Publisher, Transport};
use std::time::Duration;

#[tokio::test]
async fn test_full_queue_blocks_instead_of_dropping() {
    let store = MemoryStore::new();
    let (publisher, queue) = Publisher::new(
        Transport::new("output", store.connector(), fast_settings()),
        KeySpace::new(None),
        DeliveryScheme::Hash,
        Duration::from_secs(600),
        1,
    );

    queue.push(Response::for_request("r1").finalize()).await;
    assert_eq!(queue.available(), 0);

    let blocked = {
        let queue = queue.clone();
        tokio::spawn(async move { queue.push(Response::for_request("r2").finalize()).await })
    };

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!blocked.is_finished(), "push into a full queue should wait");

    // Draining the queue releases the waiting producer
    tokio::spawn(publisher.run());
    tokio::time::timeout(Duration::from_secs(5), blocked)
        .await
        .unwrap()
        .unwrap();

    eventually("both responses delivered", || {
        store.hash_field("rasmus-resp", "r1").is_some() && store.hash_field("rasmus-resp", "r2").is_some()
    })
    .await;
}

#[tokio::test]
async fn test_outage_backs_up_into_producers() {
    let store = MemoryStore::new();
    store.refuse_next_connects(20);
    let (publisher, queue) = Publisher::new(
        Transport::new("output", store.connector(), fast_settings()),
        KeySpace::new(None),
        DeliveryScheme::Namespaced,
        Duration::from_secs(600),
        2,
    );
    tokio::spawn(publisher.run());

    let producers: Vec<_> = (0..6)
        .map(|i| {
            let queue = queue.clone();
            tokio::spawn(async move { queue.push(Response::for_request(format!("p{}", i)).finalize()).await })
        })
        .collect();

    for producer in producers {
        tokio::time::timeout(Duration::from_secs(5), producer)
            .await
            .unwrap()
            .unwrap();
    }

    eventually("all six responses delivered", || {
        (0..6).all(|i| store.list(&format!("rasmus:resp:p{}", i)).len() == 1)
    })
    .await;
}
