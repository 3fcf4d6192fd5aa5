//! Event filters attached to appenders

use super::error::Result;
use super::log_event::LogEvent;
use super::log_level::LogLevel;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FilterResult {
    Accept,
    #[default]
    Neutral,
    Deny,
}

pub trait Filter: Send + Sync {
    fn filter(&self, event: &LogEvent) -> FilterResult;
}

/// Matches events at or above a level
#[derive(Debug, Clone)]
pub struct ThresholdFilter {
    level: LogLevel,
    on_match: FilterResult,
    on_mismatch: FilterResult,
}

impl ThresholdFilter {
    /// Neutral on match, Deny on mismatch
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            on_match: FilterResult::Neutral,
            on_mismatch: FilterResult::Deny,
        }
    }

    #[must_use]
    pub fn on_match(mut self, result: FilterResult) -> Self {
        self.on_match = result;
        self
    }

    #[must_use]
    pub fn on_mismatch(mut self, result: FilterResult) -> Self {
        self.on_mismatch = result;
        self
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }
}

impl Filter for ThresholdFilter {
    fn filter(&self, event: &LogEvent) -> FilterResult {
        if event.level.is_at_least(self.level) {
            self.on_match
        } else {
            self.on_mismatch
        }
    }
}

/// Filter section of an appender configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum FilterConfig {
    ThresholdFilter {
        level: LogLevel,
        #[serde(default)]
        on_match: Option<FilterResult>,
        #[serde(default)]
        on_mismatch: Option<FilterResult>,
    },
}

impl FilterConfig {
    pub fn build(&self) -> Result<Arc<dyn Filter>> {
        match self {
            FilterConfig::ThresholdFilter {
                level,
                on_match,
                on_mismatch,
            } => {
                let mut filter = ThresholdFilter::new(*level);
                if let Some(result) = on_match {
                    filter = filter.on_match(*result);
                }
                if let Some(result) = on_mismatch {
                    filter = filter.on_mismatch(*result);
                }
                Ok(Arc::new(filter))
            }
        }
    }
}
