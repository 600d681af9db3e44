mod common;

use chrono::{TimeDelta, Utc};
use common::{sqlite_client, sqlite_store};
use sessionstore::client::StoreClient;
use sessionstore::record::SessionRecord;
use sessionstore::sweeper;
use std::time::Duration;

fn record(id: &str, expires_in: TimeDelta) -> SessionRecord {
    let now = Utc::now();
    SessionRecord {
        id: id.to_string(),
        data: "opaque".to_string(),
        created_on: now,
        modified_on: now,
        expires_on: now + expires_in,
    }
}

#[tokio::test]
async fn test_sweeper_deletes_expired_record_within_two_intervals() {
    let (client, _tmp) = sqlite_client().await;
    client
        .upsert("stale", record("stale", TimeDelta::seconds(-30)))
        .await
        .unwrap();
    client
        .upsert("fresh", record("fresh", TimeDelta::hours(1)))
        .await
        .unwrap();

    let interval = Duration::from_millis(100);
    let handle = sweeper::start(client.clone(), interval);
    tokio::time::sleep(interval * 2 + Duration::from_millis(50)).await;

    assert!(client.fetch_by_id("stale").await.unwrap().is_none());
    assert!(client.fetch_by_id("fresh").await.unwrap().is_some());
    handle.stop().await;
}

#[tokio::test]
async fn test_store_owned_cleanup() {
    let (store, client, _tmp) = sqlite_store().await;
    client
        .upsert("stale", record("stale", TimeDelta::seconds(-1)))
        .await
        .unwrap();

    store.start_cleanup(Duration::from_millis(50)).await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(client.fetch_by_id("stale").await.unwrap().is_none());

    store.close().await;
    assert!(!store.is_cleanup_running().await);

    // Nothing sweeps once the store is closed.
    client
        .upsert("stale-again", record("stale-again", TimeDelta::seconds(-1)))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(client.fetch_by_id("stale-again").await.unwrap().is_some());
}

#[tokio::test]
async fn test_manual_sweep_reports_count() {
    let (client, _tmp) = sqlite_client().await;
    for i in 0..3 {
        let id = format!("old-{}", i);
        client
            .upsert(&id, record(&id, TimeDelta::minutes(-5)))
            .await
            .unwrap();
    }
    assert_eq!(sweeper::sweep_expired(client.as_ref()).await.unwrap(), 3);
    assert_eq!(sweeper::sweep_expired(client.as_ref()).await.unwrap(), 0);
}
