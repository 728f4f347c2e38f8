//! Host logger forwarding through the blocking entry points.

#![cfg(feature = "desktop-shims")]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bridge_desktop::InMemorySecureStore;
use bridge_traits::error::Result as SinkResult;
use bridge_traits::{
    BackendIdentifier, ContextHandle, EnvironmentHandle, FixedContextProvider, LogEntry, LogLevel,
    LoggerSink,
};
use core_runtime::config::BridgeConfig;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_service::environment::ProcessEnvironment;
use core_service::ffi::BlockingBridge;
use core_service::SecureStorageBridge;

#[derive(Default)]
struct RecordingSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl RecordingSink {
    fn messages(&self) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|entry| entry.message.clone())
            .collect()
    }
}

#[async_trait]
impl LoggerSink for RecordingSink {
    async fn log(&self, entry: LogEntry) -> SinkResult<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Debug
    }
}

// One global subscriber per test binary.
#[test]
fn test_last_events_reach_host_sink_when_blocking_call_returns() {
    let sink = Arc::new(RecordingSink::default());
    init_logging(
        LoggingConfig::default()
            .with_format(LogFormat::Compact)
            .with_level(LogLevel::Debug)
            .with_logger_sink(sink.clone()),
    )
    .unwrap();

    let environment = Arc::new(ProcessEnvironment::new());
    environment.set(EnvironmentHandle::detached()).unwrap();
    let config = BridgeConfig::builder()
        .backend(BackendIdentifier::host("memory-host"))
        .host_backend("memory-host", Arc::new(InMemorySecureStore::new()))
        .context_provider(Arc::new(FixedContextProvider::new(ContextHandle::new(
            "app",
            (),
        ))))
        .build()
        .unwrap();
    let blocking =
        BlockingBridge::new(SecureStorageBridge::new(config).with_environment(environment))
            .unwrap();

    assert_eq!(blocking.write("apple", "hello world"), 1);
    let messages = sink.messages();
    assert_eq!(messages.last().map(String::as_str), Some("Secret written"));

    let json = blocking.read("apple");
    assert!(json.contains(r#""success":"1""#));
    let messages = sink.messages();
    assert_eq!(messages.last().map(String::as_str), Some("Secret read"));

    // Values never reach the host log
    let entries = sink.entries.lock().unwrap();
    assert!(entries
        .iter()
        .flat_map(|entry| entry.fields.values())
        .all(|field| !field.contains("hello world")));
}
