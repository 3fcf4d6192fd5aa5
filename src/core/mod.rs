//! Core logging types and traits

pub mod appender;
pub mod error;
pub mod filter;
pub mod layout;
pub mod lifecycle;
pub mod log_event;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod status;
pub mod timestamp;

pub use appender::Appender;
pub use error::{AppenderError, Result};
pub use filter::{Filter, FilterConfig, FilterResult, ThresholdFilter};
pub use layout::{JsonLayout, Layout, LayoutConfig, PatternLayout, DEFAULT_CONVERSION_PATTERN};
pub use lifecycle::{LifeCycle, LifeCycleState};
pub use log_event::LogEvent;
pub use log_level::LogLevel;
pub use logger::{Logger, LoggerBuilder};
pub use metrics::AppenderMetrics;
pub use status::{StatusEntry, StatusListener, StatusLogger};
pub use timestamp::TimestampFormat;
