//! Appender trait for log output destinations

use super::{error::Result, log_event::LogEvent};

/// An output sink invoked by the [`Logger`](super::Logger) on the calling
/// thread.
///
/// `append` takes `&self` because many application threads may log through
/// the same appender concurrently.
pub trait Appender: Send + Sync {
    fn name(&self) -> &str;

    fn append(&self, event: &LogEvent) -> Result<()>;

    /// Release resources. Calls after the first are no-ops.
    fn stop(&self);

    fn is_started(&self) -> bool;

    /// When false, errors from `append` are returned to the logging caller
    fn ignore_exceptions(&self) -> bool {
        true
    }

    /// Whether this appender's filter rejects the event
    fn is_filtered(&self, _event: &LogEvent) -> bool {
        false
    }
}
