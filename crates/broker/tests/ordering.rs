//! Per-key ordering under concurrent publishers.

use std::collections::HashMap;
use std::time::Duration;

use beacon_broker::{Broker, MemoryBroker};
use beacon_core::Topic;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn each_key_is_read_in_publish_order() {
    const NODES: usize = 6;
    const PER_NODE: u32 = 200;

    let broker = MemoryBroker::new(4);
    let mut sub = broker.subscribe(Topic::Log, "log-consumer").await.unwrap();

    let publishers: Vec<_> = (0..NODES)
        .map(|n| {
            let broker = broker.clone();
            tokio::spawn(async move {
                let key = format!("node-{n}");
                for seq in 0..PER_NODE {
                    broker
                        .publish(Topic::Log, &key, seq.to_be_bytes().to_vec())
                        .await
                        .unwrap();
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();
    for p in publishers {
        p.await.unwrap();
    }

    let mut last: HashMap<String, u32> = HashMap::new();
    let mut total = 0;
    while let Some(message) = sub.fetch(Duration::from_millis(100)).await.unwrap() {
        let seq = u32::from_be_bytes(message.payload.as_slice().try_into().unwrap());
        if let Some(prev) = last.insert(message.key.clone(), seq) {
            assert!(seq > prev, "{}: {seq} after {prev}", message.key);
        }
        total += 1;
    }

    assert_eq!(total, NODES * PER_NODE as usize);
    assert_eq!(broker.lag(Topic::Log, "log-consumer"), 0);
}

#[tokio::test]
async fn late_group_starts_from_earliest() {
    let broker = MemoryBroker::new(2);
    for i in 0..5u8 {
        broker.publish(Topic::Registration, "n", vec![i]).await.unwrap();
    }
    let mut sub = broker
        .subscribe(Topic::Registration, "registration-consumer")
        .await
        .unwrap();
    let first = sub.fetch(Duration::from_millis(10)).await.unwrap().unwrap();
    assert_eq!(first.offset, 0);
    assert_eq!(first.payload, vec![0]);
}
