//! Internal status log
//!
//! The logging system cannot report its own failures through itself, so
//! appender and configuration errors are written to a `StatusLogger`
//! instead. Entries are kept in a bounded buffer for inspection and echoed
//! to stderr as `[LOGGER <LEVEL>] <message>`.

use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Default number of entries retained in memory
pub const DEFAULT_STATUS_CAPACITY: usize = 200;

/// Callback invoked for every status entry
pub type StatusListener = Arc<dyn Fn(&StatusEntry) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for StatusEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[LOGGER {}] {}", self.level, self.message)
    }
}

struct StatusInner {
    entries: Mutex<VecDeque<StatusEntry>>,
    capacity: usize,
    echo_level: Option<LogLevel>,
    listeners: RwLock<Vec<StatusListener>>,
}

/// Cloneable handle to a status log
///
/// # Example
///
/// ```
/// use kafka_log_appender::StatusLogger;
///
/// let status = StatusLogger::silent();
/// status.error("No topic provided for KafkaAppender");
///
/// assert_eq!(status.errors().len(), 1);
/// ```
#[derive(Clone)]
pub struct StatusLogger {
    inner: Arc<StatusInner>,
}

impl StatusLogger {
    /// Status logger that echoes warnings and errors to stderr
    pub fn new() -> Self {
        Self::with_config(DEFAULT_STATUS_CAPACITY, Some(LogLevel::Warn))
    }

    /// Status logger that only records entries in memory
    pub fn silent() -> Self {
        Self::with_config(DEFAULT_STATUS_CAPACITY, None)
    }

    pub fn with_config(capacity: usize, echo_level: Option<LogLevel>) -> Self {
        Self {
            inner: Arc::new(StatusInner {
                entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
                capacity: capacity.max(1),
                echo_level,
                listeners: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Process-wide status logger
    pub fn global() -> &'static StatusLogger {
        static GLOBAL: OnceLock<StatusLogger> = OnceLock::new();
        GLOBAL.get_or_init(StatusLogger::new)
    }

    pub fn add_listener(&self, listener: StatusListener) {
        self.inner.listeners.write().push(listener);
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        let entry = StatusEntry {
            level,
            message: message.into(),
            timestamp: Utc::now(),
        };

        if self.inner.echo_level.is_some_and(|threshold| level >= threshold) {
            eprintln!("{}", entry);
        }

        // Listeners may log or register listeners themselves
        let listeners = self.inner.listeners.read().clone();
        for listener in &listeners {
            listener(&entry);
        }

        let mut entries = self.inner.entries.lock();
        if entries.len() == self.inner.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    /// Snapshot of retained entries, oldest first
    pub fn entries(&self) -> Vec<StatusEntry> {
        self.inner.entries.lock().iter().cloned().collect()
    }

    /// Retained entries at Error level or above
    pub fn errors(&self) -> Vec<StatusEntry> {
        self.inner
            .entries
            .lock()
            .iter()
            .filter(|e| e.level >= LogLevel::Error)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.inner.entries.lock().clear();
    }
}

impl Default for StatusLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StatusLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatusLogger")
            .field("capacity", &self.inner.capacity)
            .field("echo_level", &self.inner.echo_level)
            .finish()
    }
}
