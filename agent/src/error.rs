use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Document(#[from] interro::Error),

    #[error("cannot read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unknown tool `{0}`, expected one of: render, parse, critique, improve")]
    UnknownTool(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("text generation failed: {0}")]
    Generation(String),

    #[error("cannot serialize tool output: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<interro::ParseError> for AgentError {
    fn from(error: interro::ParseError) -> Self {
        AgentError::Document(error.into())
    }
}

impl AgentError {
    /// The structural error behind this failure, if parsing is what failed.
    pub fn parse_error(&self) -> Option<&interro::ParseError> {
        match self {
            AgentError::Document(interro::Error::Malformed(error)) => Some(error),
            _ => None,
        }
    }
}
