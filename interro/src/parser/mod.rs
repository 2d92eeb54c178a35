pub mod error;
pub mod prompt;
mod structural;

pub use error::{ParseError, ParseErrorKind};

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::parser::prompt::EscapeRule;
use crate::syntax::Syntax;

/// Knobs that change what counts as markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseOptions {
    pub syntax: Syntax,
    #[serde(rename = "escape")]
    pub escape_rule: EscapeRule,
}

impl ParseOptions {
    /// Default options with the dialect detected from `source`.
    pub fn detect(source: &str) -> Self {
        ParseOptions {
            syntax: Syntax::detect(source),
            ..ParseOptions::default()
        }
    }
}

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
    options: ParseOptions,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser {
            source,
            file_id,
            options: ParseOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Parse the source into a complete Document. Fails on the first
    /// structural error; no partial forest is returned.
    pub fn parse(self) -> Result<Document, ParseError> {
        let blocks = structural::parse_blocks(&self.source, self.file_id, self.options)?;
        Ok(Document::from_parts(self.source, blocks, self.options))
    }
}
