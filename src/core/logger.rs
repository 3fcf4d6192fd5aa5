//! Logger that dispatches events to appenders on the calling thread

use super::{
    appender::Appender,
    error::{AppenderError, Result},
    log_event::LogEvent,
    log_level::LogLevel,
    status::StatusLogger,
};
use parking_lot::RwLock;
use std::sync::Arc;

pub struct Logger {
    name: Option<String>,
    min_level: RwLock<LogLevel>,
    appenders: RwLock<Vec<Arc<dyn Appender>>>,
    status: StatusLogger,
}

impl Logger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: None,
            min_level: RwLock::new(LogLevel::Info),
            appenders: RwLock::new(Vec::new()),
            status: StatusLogger::global().clone(),
        }
    }

    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn add_appender(&self, appender: Arc<dyn Appender>) {
        self.appenders.write().push(appender);
    }

    pub fn set_min_level(&self, level: LogLevel) {
        *self.min_level.write() = level;
    }

    pub fn min_level(&self) -> LogLevel {
        *self.min_level.read()
    }

    #[inline]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level >= *self.min_level.read()
    }

    /// Build an event carrying this logger's name
    pub fn event(&self, level: LogLevel, message: impl Into<String>) -> LogEvent {
        let event = LogEvent::new(level, message);
        match self.name {
            Some(ref name) => event.with_logger(name.clone()),
            None => event,
        }
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if !self.is_enabled(level) {
            return;
        }
        let event = self.event(level, message);
        self.log_event(&event);
    }

    /// Dispatch an event, reporting appender errors on the status log.
    ///
    /// Never panics and never returns an error to the caller.
    pub fn log_event(&self, event: &LogEvent) {
        if let Err(err) = self.try_log_event(event) {
            self.status
                .error(format!("An exception occurred processing an appender: {}", err));
        }
    }

    /// Dispatch an event, returning the first error raised by an appender
    /// that does not ignore exceptions.
    ///
    /// Every appender still receives the event when an earlier one fails.
    pub fn try_log_event(&self, event: &LogEvent) -> Result<()> {
        if !self.is_enabled(event.level) {
            return Ok(());
        }

        let appenders = self.appenders.read().clone();
        let mut first_error = None;

        for appender in appenders.iter() {
            if !appender.is_started() {
                self.status.error(format!(
                    "Attempted to append to non-started appender {}",
                    appender.name()
                ));
                continue;
            }
            if appender.is_filtered(event) {
                continue;
            }

            // Per-appender panic isolation
            let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                appender.append(event)
            }));

            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    if appender.ignore_exceptions() {
                        self.status.error(format!(
                            "Appender {} failed: {}",
                            appender.name(),
                            err
                        ));
                    } else if first_error.is_none() {
                        first_error = Some(err);
                    }
                }
                Err(panic_info) => {
                    let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                        s.to_string()
                    } else if let Some(s) = panic_info.downcast_ref::<String>() {
                        s.clone()
                    } else {
                        "Unknown panic".to_string()
                    };
                    self.status.error(format!(
                        "Appender {} panicked: {}. Other appenders continue to function.",
                        appender.name(),
                        panic_msg
                    ));
                    if !appender.ignore_exceptions() && first_error.is_none() {
                        first_error = Some(AppenderError::other(format!(
                            "appender {} panicked: {}",
                            appender.name(),
                            panic_msg
                        )));
                    }
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    pub fn try_log(&self, level: LogLevel, message: impl Into<String>) -> Result<()> {
        if !self.is_enabled(level) {
            return Ok(());
        }
        let event = self.event(level, message);
        self.try_log_event(&event)
    }

    #[inline]
    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    #[inline]
    pub fn fatal(&self, message: impl Into<String>) {
        self.log(LogLevel::Fatal, message);
    }

    /// Stop every appender, draining whatever they still hold.
    ///
    /// Appenders shared with other loggers are stopped as well.
    pub fn stop(&self) {
        let appenders = std::mem::take(&mut *self.appenders.write());
        for appender in appenders {
            let name = appender.name().to_string();
            let outcome =
                std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| appender.stop()));
            if outcome.is_err() {
                self.status
                    .error(format!("Appender {} panicked during stop", name));
            }
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use kafka_log_appender::prelude::*;
///
/// let logger = Logger::builder()
///     .name("app")
///     .min_level(LogLevel::Debug)
///     .status_logger(StatusLogger::silent())
///     .build();
/// assert_eq!(logger.name(), Some("app"));
/// ```
pub struct LoggerBuilder {
    name: Option<String>,
    min_level: LogLevel,
    appenders: Vec<Arc<dyn Appender>>,
    status: Option<StatusLogger>,
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self {
            name: None,
            min_level: LogLevel::Info,
            appenders: Vec::new(),
            status: None,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn appender<A: Appender + 'static>(mut self, appender: A) -> Self {
        self.appenders.push(Arc::new(appender));
        self
    }

    /// Add an appender that is also held elsewhere
    #[must_use = "builder methods return a new value"]
    pub fn shared_appender(mut self, appender: Arc<dyn Appender>) -> Self {
        self.appenders.push(appender);
        self
    }

    /// Status log receiving dispatch errors; defaults to the global one
    #[must_use = "builder methods return a new value"]
    pub fn status_logger(mut self, status: StatusLogger) -> Self {
        self.status = Some(status);
        self
    }

    pub fn build(self) -> Logger {
        Logger {
            name: self.name,
            min_level: RwLock::new(self.min_level),
            appenders: RwLock::new(self.appenders),
            status: self
                .status
                .unwrap_or_else(|| StatusLogger::global().clone()),
        }
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
