// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! Injectable diagnostic sink.
//!
//! Region handles never log through global state. Each handle carries a
//! `LogSink` passed in at construction; the default discards everything.

use std::sync::Arc;

use tracing::Level;

/// Receiver for region diagnostics. Never required for correctness.
pub trait LogSink: Send + Sync {
    fn log(&self, level: Level, message: &str);
}

/// Sink that drops every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn log(&self, _level: Level, _message: &str) {}
}

/// Sink that forwards to `tracing` under the `shmlink` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, level: Level, message: &str) {
        match level {
            Level::ERROR => tracing::error!(target: "shmlink", "{}", message),
            Level::WARN => tracing::warn!(target: "shmlink", "{}", message),
            Level::INFO => tracing::info!(target: "shmlink", "{}", message),
            Level::DEBUG => tracing::debug!(target: "shmlink", "{}", message),
            _ => tracing::trace!(target: "shmlink", "{}", message),
        }
    }
}

/// Shared handle to a sink.
pub type SharedSink = Arc<dyn LogSink>;

pub(crate) fn noop() -> SharedSink {
    Arc::new(NoopSink)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Sink that records messages for assertions.
    #[derive(Default)]
    pub struct MemorySink {
        pub entries: Mutex<Vec<(Level, String)>>,
    }

    impl LogSink for MemorySink {
        fn log(&self, level: Level, message: &str) {
            if let Ok(mut entries) = self.entries.lock() {
                entries.push((level, message.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::MemorySink;
    use super::*;

    #[test]
    fn test_noop_sink_accepts_everything() {
        let sink = NoopSink;
        sink.log(Level::ERROR, "ignored");
        sink.log(Level::TRACE, "ignored");
    }

    #[test]
    fn test_memory_sink_records() {
        let sink = MemorySink::default();
        sink.log(Level::WARN, "first");
        sink.log(Level::DEBUG, "second");
        let entries = sink.entries.lock().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], (Level::WARN, "first".to_string()));
    }
}
