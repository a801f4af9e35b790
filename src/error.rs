//! Error types shared by every stage.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// One entry of the `errors` list in a GraphQL response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorEntry {
    pub message: String,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<serde_json::Value>,
}

/// Errors produced anywhere in the collect / analyze / render / deploy stages.
#[derive(Debug, Error)]
pub enum Error {
    /// The provider could not be reached or answered without a usable body.
    #[error("request to GitHub failed: {context}")]
    Transport {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The provider was reached but rejected the query.
    #[error("GitHub API errors: {}", join_messages(.0))]
    Api(Vec<ApiErrorEntry>),

    /// The provider answered without the fields a query asked for.
    #[error("malformed GitHub response: {0}")]
    MalformedResponse(String),

    /// A snapshot file parsed but holds records that break the record rules.
    #[error("invalid snapshot {}: {reason}", .path.display())]
    InvalidSnapshot { path: PathBuf, reason: String },

    #[error("no snapshot data found in {0}")]
    NoData(String),

    #[error("missing or invalid setting: {0}")]
    Configuration(String),

    #[error("failed to parse config {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("command `{command}` failed with code {code}: {stderr}")]
    Command {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("failed to draw chart: {0}")]
    Chart(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wrap any lower-level failure as a transport error.
    pub fn transport<E>(context: impl Into<String>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Error::Transport {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport { .. })
    }

    pub fn is_api(&self) -> bool {
        matches!(self, Error::Api(_))
    }
}

fn join_messages(errors: &[ApiErrorEntry]) -> String {
    errors
        .iter()
        .map(|entry| entry.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, Error>;
