//! Error taxonomy for tag migration runs.
//!
//! Every error carries an [`ErrorCategory`] so the controller can decide
//! whether a failure is isolated to one resource or aborts the run.

use thiserror::Error;

/// Error category for structured logging and behavior mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Credentials, tag mapping or run configuration missing or malformed
    ConfigurationError,
    /// A requests node looked like a query but matched no extraction rule
    UnsupportedQueryShape,
    /// Non-2xx response or failed HTTP exchange
    TransportError,
    /// Resource JSON did not have the shape the walker expects
    StructuralError,
}

impl ErrorCategory {
    /// Machine-readable code for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigurationError => "CONFIGURATION_ERROR",
            Self::UnsupportedQueryShape => "UNSUPPORTED_QUERY_SHAPE",
            Self::TransportError => "TRANSPORT_ERROR",
            Self::StructuralError => "STRUCTURAL_ERROR",
        }
    }

    /// Whether a failure of this kind can be contained to a single resource.
    ///
    /// Configuration problems apply to the whole run and are never isolated.
    pub fn resource_scoped(&self) -> bool {
        !matches!(self, Self::ConfigurationError)
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum RetagError {
    #[error("configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("unsupported query shape: {message}")]
    UnsupportedQueryShape { message: String },

    #[error("transport error: {method} {path} returned {status}: {body}")]
    Http {
        method: &'static str,
        path: String,
        status: u16,
        body: String,
    },

    #[error("transport error: {message}")]
    Transport {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("structural error: {message}")]
    Structural { message: String },
}

impl RetagError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration { .. } => ErrorCategory::ConfigurationError,
            Self::UnsupportedQueryShape { .. } => ErrorCategory::UnsupportedQueryShape,
            Self::Http { .. } | Self::Transport { .. } => ErrorCategory::TransportError,
            Self::Structural { .. } => ErrorCategory::StructuralError,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    pub fn config_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Configuration {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn unsupported_query(message: impl Into<String>) -> Self {
        Self::UnsupportedQueryShape {
            message: message.into(),
        }
    }

    pub fn transport_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn structural(message: impl Into<String>) -> Self {
        Self::Structural {
            message: message.into(),
        }
    }

    /// Prefixes shape errors with the location they were raised at.
    pub fn at(self, location: impl std::fmt::Display) -> Self {
        match self {
            Self::UnsupportedQueryShape { message } => Self::UnsupportedQueryShape {
                message: format!("{location}.{message}"),
            },
            Self::Structural { message } => Self::Structural {
                message: format!("{location}: {message}"),
            },
            other => other,
        }
    }

    /// Prefixes shape errors with the resource they were raised for.
    pub fn in_resource(self, label: impl std::fmt::Display) -> Self {
        match self {
            Self::UnsupportedQueryShape { message } => Self::UnsupportedQueryShape {
                message: format!("{label}: {message}"),
            },
            Self::Structural { message } => Self::Structural {
                message: format!("{label}: {message}"),
            },
            other => other,
        }
    }
}

/// Result type for retag operations
pub type Result<T> = std::result::Result<T, RetagError>;
