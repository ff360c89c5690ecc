// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::store::FakeLockStore;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a test with captured tracing output
fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::default();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs.clone())
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

const TTL: Duration = Duration::from_secs(30);

#[tokio::test]
async fn traced_store_delegates() {
    let fake = FakeLockStore::default();
    let traced = TracedLockStore::new(fake.clone());

    assert!(traced.try_acquire("ns:gpu:0", "a", TTL).await.unwrap());
    assert_eq!(fake.value("ns:gpu:0").as_deref(), Some("a"));
    assert!(traced.compare_and_delete("ns:gpu:0", "a").await.unwrap());
    assert_eq!(traced.inner().value("ns:gpu:0"), None);
}

#[test]
fn try_acquire_logs_span_and_outcome() {
    let (logs, result) = with_tracing(|| async {
        let traced = TracedLockStore::new(FakeLockStore::default());
        traced.try_acquire("ns:gpu:0", "owner-a", TTL).await
    });

    assert!(result.unwrap());
    assert!(logs.contains("store.try_acquire"), "Logs:\n{}", logs);
    assert!(logs.contains("owner-a"), "Logs:\n{}", logs);
    assert!(logs.contains("acquired"), "Logs:\n{}", logs);
    assert!(logs.contains("elapsed_ms"), "Logs:\n{}", logs);
}

#[test]
fn contention_is_logged() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeLockStore::default();
        fake.insert("ns:gpu:0", "someone", Some(TTL));
        TracedLockStore::new(fake)
            .try_acquire("ns:gpu:0", "owner-b", TTL)
            .await
    });

    assert!(!result.unwrap());
    assert!(logs.contains("held by another owner"), "Logs:\n{}", logs);
}

#[test]
fn unreachable_backend_logs_warning() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeLockStore::default();
        fake.set_unavailable(true);
        TracedLockStore::new(fake).ping().await
    });

    assert!(result.is_err());
    assert!(logs.contains("WARN"), "Logs:\n{}", logs);
    assert!(logs.contains("backend unreachable"), "Logs:\n{}", logs);
}

#[test]
fn script_failure_logs_error() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeLockStore::default();
        fake.fail_scripts(true);
        TracedLockStore::new(fake)
            .compare_and_delete("ns:gpu:0", "a")
            .await
    });

    assert!(result.is_err());
    assert!(logs.contains("ERROR"), "Logs:\n{}", logs);
    assert!(logs.contains("script failed"), "Logs:\n{}", logs);
}

#[test]
fn scan_logs_key_count() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeLockStore::default();
        fake.insert("ns:gpu:0", "a", Some(TTL));
        fake.insert("ns:gpu:1", "b", Some(TTL));
        TracedLockStore::new(fake).scan("ns:*").await
    });

    assert_eq!(result.unwrap().len(), 2);
    assert!(logs.contains("count=2"), "Logs:\n{}", logs);
}
