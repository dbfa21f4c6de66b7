use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::cancel::CancelReason;

/// A single error entry from a GraphQL `errors` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphQlError {
    pub message: String,
    pub code: Option<String>,
    pub path: Option<String>,
}

impl std::fmt::Display for GraphQlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "[{code}] {}", self.message)?,
            None => write!(f, "{}", self.message)?,
        }
        if let Some(path) = &self.path {
            write!(f, " (at {path})")?;
        }
        Ok(())
    }
}

fn format_graphql_errors(errors: &[GraphQlError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Error, Debug)]
pub enum RickdashError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {message}")]
    Api {
        status: Option<u16>,
        retry_after: Option<u64>,
        message: String,
    },

    #[error("GraphQL error: {}", format_graphql_errors(.errors))]
    GraphQlErrors {
        errors: Vec<GraphQlError>,
        partial_data: bool,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("request {0}")]
    Cancelled(CancelReason),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Shared(Arc<RickdashError>),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, RickdashError>;

/// Coarse classification used by presentation layers to pick a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// HTTP 429 or a message mentioning rate limiting.
    RateLimited,
    /// The request was aborted. Never surfaced in the read model.
    Cancelled,
    /// Transport failure (connect, timeout, body decode).
    Network,
    /// Server rejected the request or returned GraphQL errors.
    Api,
    NotFound,
    Config,
    Other,
}

impl RickdashError {
    pub fn api(message: impl Into<String>) -> Self {
        RickdashError::Api {
            status: None,
            retry_after: None,
            message: message.into(),
        }
    }

    pub fn with_status(message: impl Into<String>, status: u16) -> Self {
        RickdashError::Api {
            status: Some(status),
            retry_after: None,
            message: message.into(),
        }
    }

    /// HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            RickdashError::Http(e) => e.status().map(|s| s.as_u16()),
            RickdashError::Api { status, .. } => *status,
            RickdashError::Shared(inner) => inner.status(),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RickdashError::Shared(inner) => return inner.kind(),
            RickdashError::Cancelled(_) => return ErrorKind::Cancelled,
            _ => {}
        }

        if self.status() == Some(429) || self.mentions_rate() {
            return ErrorKind::RateLimited;
        }

        match self {
            RickdashError::Http(e) if e.is_decode() => ErrorKind::Api,
            RickdashError::Http(_) | RickdashError::Io(_) => ErrorKind::Network,
            RickdashError::Api { .. }
            | RickdashError::GraphQlErrors { .. }
            | RickdashError::Json(_) => ErrorKind::Api,
            RickdashError::NotFound(_) => ErrorKind::NotFound,
            RickdashError::Config(_) | RickdashError::YamlParse(_) => ErrorKind::Config,
            _ => ErrorKind::Other,
        }
    }

    /// Server-provided messages only; transport errors embed the URL.
    fn mentions_rate(&self) -> bool {
        let mentions = |message: &str| message.to_lowercase().contains("rate");
        match self {
            RickdashError::Api { message, .. } | RickdashError::Other(message) => mentions(message),
            RickdashError::GraphQlErrors { errors, .. } => {
                errors.iter().any(|e| mentions(&e.message))
            }
            _ => false,
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        self.kind() == ErrorKind::RateLimited
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind() == ErrorKind::Cancelled
    }

    /// How long the server asked us to wait before retrying.
    ///
    /// Defaults to 60 seconds for rate-limited errors without a hint.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            RickdashError::Shared(inner) => inner.retry_after(),
            RickdashError::Api {
                retry_after: Some(seconds),
                ..
            } => Some(Duration::from_secs(*seconds)),
            _ if self.is_rate_limited() => Some(Duration::from_secs(60)),
            _ => None,
        }
    }
}

impl From<Arc<RickdashError>> for RickdashError {
    fn from(error: Arc<RickdashError>) -> Self {
        RickdashError::Shared(error)
    }
}
