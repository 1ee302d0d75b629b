//! Errors surfaced by pipeline runs.

use argdown_model::ModelError;
use argdown_parser::{Position, SyntaxError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Any error a run can produce.
///
/// Errors are serializable so that they can be carried in
/// [`Response::exceptions`](crate::Response::exceptions) and exported.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ArgdownError {
    #[error("syntax error at {position}: {message}")]
    Syntax { message: String, position: Position },

    #[error("model error: {message}")]
    Model { message: String },

    #[error("plugin {plugin} requires response field `{field}`, which is missing")]
    MissingDependency { plugin: String, field: String },

    #[error("plugin {plugin} failed ({code}): {message}")]
    Plugin {
        plugin: String,
        code: String,
        message: String,
    },

    #[error("unknown process `{name}`")]
    UnknownProcess { name: String },

    #[error("no plugins registered for stage `{name}`")]
    UnknownStage { name: String },

    #[error("run cancelled before stage `{stage}`")]
    Cancelled { stage: String },

    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
}

impl ArgdownError {
    /// Stage-local failure with a short error code.
    pub fn plugin(
        plugin: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Plugin {
            plugin: plugin.into(),
            code: code.into(),
            message: message.into(),
        }
    }

    /// Short machine-readable code.
    pub fn code(&self) -> &str {
        match self {
            ArgdownError::Syntax { .. } => "syntax",
            ArgdownError::Model { .. } => "model",
            ArgdownError::MissingDependency { .. } => "missing-dependency",
            ArgdownError::Plugin { code, .. } => code,
            ArgdownError::UnknownProcess { .. } => "unknown-process",
            ArgdownError::UnknownStage { .. } => "unknown-stage",
            ArgdownError::Cancelled { .. } => "cancelled",
            ArgdownError::InvalidConfig { .. } => "invalid-config",
        }
    }
}

impl From<SyntaxError> for ArgdownError {
    fn from(e: SyntaxError) -> Self {
        ArgdownError::Syntax {
            message: e.message,
            position: e.position,
        }
    }
}

impl From<ModelError> for ArgdownError {
    fn from(e: ModelError) -> Self {
        ArgdownError::Model {
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for ArgdownError {
    fn from(e: serde_json::Error) -> Self {
        ArgdownError::InvalidConfig {
            message: e.to_string(),
        }
    }
}

impl From<toml::de::Error> for ArgdownError {
    fn from(e: toml::de::Error) -> Self {
        ArgdownError::InvalidConfig {
            message: e.to_string(),
        }
    }
}
