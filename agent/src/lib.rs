pub mod config;
pub mod error;
pub mod generator;
pub mod tools;

use std::path::Path;

use interro::{Document, ParseOptions};

pub use config::{AgentConfig, ConfigError};
pub use error::AgentError;
pub use generator::{Agent, EchoGenerator, TextGenerator};
pub use tools::{Tool, ToolOutput};

/// Read a document from disk and parse it. With no options, the marker
/// dialect is detected from the text.
pub fn load_document(path: &Path, options: Option<ParseOptions>) -> Result<Document, AgentError> {
    let text = std::fs::read_to_string(path).map_err(|source| AgentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let options = options.unwrap_or_else(|| ParseOptions::detect(&text));
    log::debug!("parsing {} as {} syntax", path.display(), options.syntax);
    Ok(Document::parse_with(text, options)?)
}
