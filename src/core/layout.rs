//! Layouts turn a [`LogEvent`] into the bytes an appender publishes.
//!
//! - [`PatternLayout`]: conversion-pattern text (`%d [%t] %-5p %c - %m%n`)
//! - [`JsonLayout`]: one JSON object per line

use super::error::{AppenderError, Result};
use super::log_event::LogEvent;
use super::timestamp::TimestampFormat;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Arc;

/// Pattern used when an appender is configured without a layout
pub const DEFAULT_CONVERSION_PATTERN: &str = "%m%n";

/// Date format for a bare `%d`
const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

pub trait Layout: Send + Sync {
    fn to_bytes(&self, event: &LogEvent) -> Result<Vec<u8>>;

    fn content_type(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Converter {
    Date(TimestampFormat),
    Level,
    Message,
    Newline,
    Thread,
    Logger,
    Context(Option<String>),
    File,
    Line,
    Module,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternToken {
    Literal(String),
    Conversion {
        converter: Converter,
        min_width: usize,
        left_align: bool,
    },
}

/// Text layout driven by a conversion pattern
///
/// Supported conversions: `%d` / `%d{strftime}` / `%d{ISO8601}`, `%p`,
/// `%m`, `%n`, `%t`, `%c`, `%X` / `%X{key}`, `%F`, `%L`, `%M` and `%%`.
/// A width such as `%-5p` or `%10c` pads the converted text.
///
/// # Example
///
/// ```
/// use kafka_log_appender::{Layout, LogEvent, LogLevel, PatternLayout};
///
/// let layout = PatternLayout::new("%-5p %m%n").unwrap();
/// let bytes = layout.to_bytes(&LogEvent::new(LogLevel::Info, "ready")).unwrap();
/// assert_eq!(bytes, b"INFO  ready\n");
/// ```
#[derive(Debug, Clone)]
pub struct PatternLayout {
    pattern: String,
    tokens: Vec<PatternToken>,
}

impl PatternLayout {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: pattern.to_string(),
            tokens: parse_pattern(pattern)?,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Format an event as a string
    pub fn format(&self, event: &LogEvent) -> String {
        let mut out = String::with_capacity(event.message.len() + 32);
        for token in &self.tokens {
            match token {
                PatternToken::Literal(text) => out.push_str(text),
                PatternToken::Conversion {
                    converter,
                    min_width,
                    left_align,
                } => {
                    let start = out.len();
                    convert(converter, event, &mut out);
                    pad(&mut out, start, *min_width, *left_align);
                }
            }
        }
        out
    }
}

impl Default for PatternLayout {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_CONVERSION_PATTERN.to_string(),
            tokens: vec![
                PatternToken::Conversion {
                    converter: Converter::Message,
                    min_width: 0,
                    left_align: false,
                },
                PatternToken::Conversion {
                    converter: Converter::Newline,
                    min_width: 0,
                    left_align: false,
                },
            ],
        }
    }
}

impl Layout for PatternLayout {
    fn to_bytes(&self, event: &LogEvent) -> Result<Vec<u8>> {
        Ok(self.format(event).into_bytes())
    }

    fn content_type(&self) -> &str {
        "text/plain; charset=UTF-8"
    }
}

fn convert(converter: &Converter, event: &LogEvent, out: &mut String) {
    match converter {
        Converter::Date(format) => out.push_str(&format.format(&event.timestamp)),
        Converter::Level => out.push_str(event.level.to_str()),
        Converter::Message => out.push_str(&event.message),
        Converter::Newline => out.push('\n'),
        Converter::Thread => out.push_str(event.thread_label()),
        Converter::Logger => out.push_str(event.logger_name.as_deref().unwrap_or_default()),
        Converter::Context(Some(key)) => {
            if let Some(value) = event.context.get(key) {
                out.push_str(value);
            }
        }
        Converter::Context(None) => {
            out.push('{');
            for (i, (key, value)) in event.context.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                let _ = write!(out, "{}={}", key, value);
            }
            out.push('}');
        }
        Converter::File => out.push_str(event.file.as_deref().unwrap_or("?")),
        Converter::Line => match event.line {
            Some(line) => {
                let _ = write!(out, "{}", line);
            }
            None => out.push('?'),
        },
        Converter::Module => out.push_str(event.module_path.as_deref().unwrap_or("?")),
    }
}

fn pad(out: &mut String, start: usize, min_width: usize, left_align: bool) {
    let written = out[start..].chars().count();
    if written >= min_width {
        return;
    }
    let padding = " ".repeat(min_width - written);
    if left_align {
        out.push_str(&padding);
    } else {
        out.insert_str(start, &padding);
    }
}

fn parse_pattern(pattern: &str) -> Result<Vec<PatternToken>> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            literal.push(c);
            continue;
        }
        if chars.peek() == Some(&'%') {
            chars.next();
            literal.push('%');
            continue;
        }

        let left_align = chars.next_if_eq(&'-').is_some();
        let mut width = String::new();
        while let Some(d) = chars.next_if(|ch| ch.is_ascii_digit()) {
            width.push(d);
        }
        let mut name = String::new();
        while let Some(ch) = chars.next_if(|ch| ch.is_ascii_alphabetic()) {
            name.push(ch);
        }
        let option = if chars.next_if_eq(&'{').is_some() {
            let mut option = String::new();
            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(ch) => option.push(ch),
                    None => {
                        return Err(AppenderError::config(
                            "PatternLayout",
                            format!("unterminated option after %{} in '{}'", name, pattern),
                        ))
                    }
                }
            }
            Some(option)
        } else {
            None
        };

        let converter = converter_for(&name, option, pattern)?;
        if !literal.is_empty() {
            tokens.push(PatternToken::Literal(std::mem::take(&mut literal)));
        }
        tokens.push(PatternToken::Conversion {
            converter,
            min_width: width.parse().unwrap_or(0),
            left_align,
        });
    }

    if !literal.is_empty() {
        tokens.push(PatternToken::Literal(literal));
    }
    Ok(tokens)
}

fn converter_for(name: &str, option: Option<String>, pattern: &str) -> Result<Converter> {
    let converter = match name {
        "d" | "date" => Converter::Date(date_format(option.as_deref())?),
        "p" | "level" => Converter::Level,
        "m" | "msg" | "message" => Converter::Message,
        "n" => Converter::Newline,
        "t" | "thread" => Converter::Thread,
        "c" | "logger" => Converter::Logger,
        "X" | "mdc" => Converter::Context(option.filter(|key| !key.is_empty())),
        "F" | "file" => Converter::File,
        "L" | "line" => Converter::Line,
        "M" | "module" => Converter::Module,
        "" => {
            return Err(AppenderError::config(
                "PatternLayout",
                format!("dangling '%' in '{}'", pattern),
            ))
        }
        other => {
            return Err(AppenderError::config(
                "PatternLayout",
                format!("unknown conversion '%{}' in '{}'", other, pattern),
            ))
        }
    };
    Ok(converter)
}

fn date_format(option: Option<&str>) -> Result<TimestampFormat> {
    match option {
        None | Some("") | Some("DEFAULT") => Ok(TimestampFormat::Custom(DEFAULT_DATE_FORMAT.into())),
        Some("ISO8601") => Ok(TimestampFormat::Iso8601),
        Some("ISO8601_MICROS") => Ok(TimestampFormat::Iso8601Micros),
        Some("RFC3339") => Ok(TimestampFormat::Rfc3339),
        Some("UNIX") => Ok(TimestampFormat::Unix),
        Some("UNIX_MILLIS") => Ok(TimestampFormat::UnixMillis),
        Some(custom) => TimestampFormat::custom(custom),
    }
}

/// Single-line JSON layout
///
/// Writes one object per event followed by a newline, compatible with
/// log aggregation tools reading JSONL topics.
#[derive(Debug, Clone, Default)]
pub struct JsonLayout {
    timestamp_format: TimestampFormat,
}

impl JsonLayout {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    fn to_value(&self, event: &LogEvent) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        object.insert(
            "timestamp".to_string(),
            self.timestamp_format.to_json_value(&event.timestamp),
        );
        object.insert("level".to_string(), event.level.to_str().into());
        if let Some(ref logger) = event.logger_name {
            object.insert("logger".to_string(), logger.as_str().into());
        }
        object.insert("message".to_string(), event.message.as_str().into());
        object.insert("thread_id".to_string(), event.thread_id.as_str().into());
        if let Some(ref name) = event.thread_name {
            object.insert("thread_name".to_string(), name.as_str().into());
        }
        if let Some(ref file) = event.file {
            object.insert("file".to_string(), file.as_str().into());
        }
        if let Some(line) = event.line {
            object.insert("line".to_string(), line.into());
        }
        if let Some(ref module_path) = event.module_path {
            object.insert("module_path".to_string(), module_path.as_str().into());
        }
        if !event.context.is_empty() {
            let context = event
                .context
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect();
            object.insert("context".to_string(), serde_json::Value::Object(context));
        }
        serde_json::Value::Object(object)
    }
}

impl Layout for JsonLayout {
    fn to_bytes(&self, event: &LogEvent) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec(&self.to_value(event))?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    fn content_type(&self) -> &str {
        "application/json; charset=UTF-8"
    }
}

/// Layout section of an appender configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum LayoutConfig {
    PatternLayout {
        #[serde(default)]
        pattern: Option<String>,
    },
    JsonLayout {
        #[serde(default)]
        timestamp_format: TimestampFormat,
    },
}

impl LayoutConfig {
    pub fn pattern(pattern: impl Into<String>) -> Self {
        LayoutConfig::PatternLayout {
            pattern: Some(pattern.into()),
        }
    }

    pub fn json() -> Self {
        LayoutConfig::JsonLayout {
            timestamp_format: TimestampFormat::default(),
        }
    }

    pub fn build(&self) -> Result<Arc<dyn Layout>> {
        match self {
            LayoutConfig::PatternLayout { pattern: None } => Ok(Arc::new(PatternLayout::default())),
            LayoutConfig::PatternLayout {
                pattern: Some(pattern),
            } => Ok(Arc::new(PatternLayout::new(pattern)?)),
            LayoutConfig::JsonLayout { timestamp_format } => Ok(Arc::new(
                JsonLayout::new().with_timestamp_format(timestamp_format.clone()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;
    use chrono::TimeZone;

    fn sample_event() -> LogEvent {
        let mut event = LogEvent::new(LogLevel::Warn, "cache miss")
            .with_logger("app.cache")
            .with_location("src/cache.rs", 87, "app::cache")
            .with_context_field("request_id", "r-17");
        event.timestamp = chrono::Utc
            .with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime");
        event.thread_name = Some("main".to_string());
        event
    }

    #[test]
    fn test_default_layout_is_message_newline() {
        let layout = PatternLayout::default();
        assert_eq!(layout.pattern(), DEFAULT_CONVERSION_PATTERN);
        assert_eq!(layout.format(&sample_event()), "cache miss\n");
        assert_eq!(
            PatternLayout::new(DEFAULT_CONVERSION_PATTERN).unwrap().tokens,
            layout.tokens
        );
    }

    #[test]
    fn test_full_pattern() {
        let layout = PatternLayout::new("%d [%t] %-5p %c - %m (%F:%L) %X{request_id}%n").unwrap();
        assert_eq!(
            layout.format(&sample_event()),
            "2025-01-08 10:30:45.000 [main] WARN  app.cache - cache miss (src/cache.rs:87) r-17\n"
        );
    }

    #[test]
    fn test_right_aligned_padding_and_escape() {
        let layout = PatternLayout::new("%6p|100%%").unwrap();
        assert_eq!(layout.format(&sample_event()), "  WARN|100%");
    }

    #[test]
    fn test_date_options() {
        let layout = PatternLayout::new("%d{ISO8601} %d{UNIX} %d{%H:%M}").unwrap();
        assert_eq!(
            layout.format(&sample_event()),
            "2025-01-08T10:30:45.000Z 1736332245 10:30"
        );
    }

    #[test]
    fn test_whole_context_map() {
        let event = sample_event().with_context_field("user", "ada");
        let layout = PatternLayout::new("%X").unwrap();
        assert_eq!(layout.format(&event), "{request_id=r-17, user=ada}");
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(PatternLayout::new("%q").is_err());
        assert!(PatternLayout::new("trailing %").is_err());
        assert!(PatternLayout::new("%d{%Y").is_err());
    }

    #[test]
    fn test_json_layout() {
        let layout = JsonLayout::new().with_timestamp_format(TimestampFormat::UnixMillis);
        let bytes = layout.to_bytes(&sample_event()).unwrap();
        assert_eq!(bytes.last(), Some(&b'\n'));

        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["level"], "WARN");
        assert_eq!(value["message"], "cache miss");
        assert_eq!(value["logger"], "app.cache");
        assert_eq!(value["timestamp"], 1736332245000_i64);
        assert_eq!(value["context"]["request_id"], "r-17");
    }

    #[test]
    fn test_layout_config_from_json() {
        let config: LayoutConfig =
            serde_json::from_str(r#"{"type": "PatternLayout", "pattern": "%p %m"}"#).unwrap();
        assert_eq!(config, LayoutConfig::pattern("%p %m"));

        let config: LayoutConfig =
            serde_json::from_str(r#"{"type": "JsonLayout", "timestampFormat": "Unix"}"#).unwrap();
        let layout = config.build().unwrap();
        assert_eq!(layout.content_type(), "application/json; charset=UTF-8");

        let config: LayoutConfig = serde_json::from_str(r#"{"type": "PatternLayout"}"#).unwrap();
        let bytes = config.build().unwrap().to_bytes(&sample_event()).unwrap();
        assert_eq!(bytes, b"cache miss\n");
    }
}
