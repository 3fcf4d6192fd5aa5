//! Error types for the Kafka appender

pub type Result<T> = std::result::Result<T, AppenderError>;

#[derive(Debug, thiserror::Error)]
pub enum AppenderError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Required configuration attribute is absent
    #[error("No {attribute} provided for {component}")]
    MissingAttribute {
        component: String,
        attribute: String,
    },

    /// No bootstrap address among the producer properties
    #[error("No bootstrap servers configured for {component}")]
    MissingBootstrapServers { component: String },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Layout error with layout type
    #[error("Layout error ({layout}): {message}")]
    LayoutError { layout: String, message: String },

    /// Producer could not be constructed
    #[error("Failed to create producer: {0}")]
    ProducerCreation(String),

    /// Record was not accepted by the producer queue
    #[error("Failed to enqueue record for topic '{topic}': {message}")]
    EnqueueError { topic: String, message: String },

    /// Flush did not complete cleanly
    #[error("Producer flush failed: {0}")]
    FlushError(String),

    /// Appender already stopped
    #[error("Attempted to append to stopped appender {0}")]
    AppenderStopped(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl AppenderError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        AppenderError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a missing attribute error
    pub fn missing(component: impl Into<String>, attribute: impl Into<String>) -> Self {
        AppenderError::MissingAttribute {
            component: component.into(),
            attribute: attribute.into(),
        }
    }

    pub fn no_bootstrap_servers(component: impl Into<String>) -> Self {
        AppenderError::MissingBootstrapServers {
            component: component.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        AppenderError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a layout error
    pub fn layout(layout: impl Into<String>, message: impl Into<String>) -> Self {
        AppenderError::LayoutError {
            layout: layout.into(),
            message: message.into(),
        }
    }

    pub fn producer<S: Into<String>>(msg: S) -> Self {
        AppenderError::ProducerCreation(msg.into())
    }

    /// Create an enqueue error for a topic
    pub fn enqueue(topic: impl Into<String>, message: impl Into<String>) -> Self {
        AppenderError::EnqueueError {
            topic: topic.into(),
            message: message.into(),
        }
    }

    pub fn flush<S: Into<String>>(msg: S) -> Self {
        AppenderError::FlushError(msg.into())
    }

    pub fn stopped<S: Into<String>>(appender: S) -> Self {
        AppenderError::AppenderStopped(appender.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        AppenderError::Other(msg.into())
    }
}
