use super::*;
use gpulock_adapters::FakeLockStore;
use gpulock_core::FakeClock;
use std::time::Duration;

fn channel() -> (NotificationChannel<FakeLockStore<FakeClock>, FakeClock>, FakeLockStore<FakeClock>) {
    let clock = FakeClock::new();
    let store = FakeLockStore::new(clock.clone());
    (
        NotificationChannel::new(store.clone(), KeySpace::new("ns"), clock),
        store,
    )
}

#[tokio::test]
async fn publish_encodes_release_message() {
    let (notify, store) = channel();
    notify.publish_release("gpu:0", "host:1:a", "normal").await;

    let published = store.published("ns:gpu:0");
    assert_eq!(published.len(), 1);
    let message: ReleaseMessage = serde_json::from_str(&published[0]).unwrap();
    assert_eq!(message.owner, "host:1:a");
    assert_eq!(message.reason, "normal");
    assert_eq!(message.released_at_ms, FakeClock::EPOCH_ORIGIN_MS);
}

#[tokio::test]
async fn publish_failure_is_swallowed() {
    let (notify, store) = channel();
    store.set_unavailable(true);
    notify.publish_release("gpu:0", "a", "normal").await;
    store.set_unavailable(false);
    assert!(store.published("ns:gpu:0").is_empty());
}

#[tokio::test]
async fn watch_receives_release() {
    let (notify, _) = channel();
    let mut watch = notify.watch("gpu:0").await.unwrap();

    notify.publish_release("gpu:0", "a", "forced:soft").await;
    let message = watch.notified().await.unwrap();
    assert_eq!(message.reason, "forced:soft");
}

#[tokio::test]
async fn garbage_payload_still_wakes() {
    let (notify, store) = channel();
    let mut watch = notify.watch("gpu:0").await.unwrap();

    store.publish("ns:gpu:0", "not json").await.unwrap();
    assert_eq!(watch.notified().await, None);
}

#[tokio::test]
async fn watch_is_none_when_subscribe_fails() {
    let (notify, store) = channel();
    store.set_unavailable(true);
    assert!(notify.watch("gpu:0").await.is_none());
}

#[tokio::test(start_paused = true)]
async fn closed_subscription_never_resolves() {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    drop(tx);
    let mut watch = ReleaseWatch { rx };

    let result = tokio::time::timeout(Duration::from_secs(60), watch.notified()).await;
    assert!(result.is_err(), "closed watch must leave the sleep to win");
}
