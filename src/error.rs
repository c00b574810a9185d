use std::{fmt, io};

use http::status::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc::error::SendError as TokioSendError;
use url::ParseError as UrlParseError;

use serde_json::Error as JsonError;

use crate::event::TocUpdate;
use crate::toc::TocInput;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum TocError {
    /// Failure fetching a node's children from the content service. Recoverable
    /// locally: the message is user-displayable and retry re-issues the load
    /// for this node only.
    #[error("Could not load children of '{parent_id}': {message}")]
    ChildLoad { parent_id: String, message: String },
    #[error("Invalid content id: {0}")]
    InvalidId(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
    #[error("Content service error: {0}")]
    Service(String),
    #[error("Controller has shut down")]
    Shutdown,
}

impl TocError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            TocError::ChildLoad { .. } => StatusCode::BAD_GATEWAY,
            TocError::InvalidId(_) => StatusCode::BAD_REQUEST,
            TocError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            TocError::NotFound(_) => StatusCode::NOT_FOUND,
            TocError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            TocError::Service(_) => StatusCode::BAD_GATEWAY,
            TocError::Shutdown => StatusCode::GONE,
        }
    }

    /// The message shown inline at the failing node. Child-load failures keep
    /// only the backend's message, everything else renders the full error.
    pub fn display_message(&self) -> String {
        match self {
            TocError::ChildLoad { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<toml::de::Error> for TocError {
    fn from(src: toml::de::Error) -> TocError {
        TocError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for TocError {
    fn from(src: toml::ser::Error) -> TocError {
        TocError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<JsonError> for TocError {
    fn from(src: JsonError) -> TocError {
        TocError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<UrlParseError> for TocError {
    fn from(src: UrlParseError) -> TocError {
        TocError::Serialization(format!("Invalid URL: {src}"))
    }
}

impl From<io::Error> for TocError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => TocError::NotFound(format!("{x}")),
            _ => TocError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

impl From<fmt::Error> for TocError {
    fn from(x: fmt::Error) -> Self {
        TocError::Serialization(format!("{x}"))
    }
}

impl From<TokioSendError<TocInput>> for TocError {
    fn from(x: TokioSendError<TocInput>) -> Self {
        TocError::Io(format!(
            "Channel send error, could not transmit controller input {:?}",
            x.0
        ))
    }
}

impl From<TokioSendError<TocUpdate>> for TocError {
    fn from(x: TokioSendError<TocUpdate>) -> Self {
        TocError::Io(format!(
            "Channel send error, could not transmit tree update event {:?}",
            x.0
        ))
    }
}
