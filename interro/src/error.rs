use thiserror::Error;

use crate::parser::ParseError;

/// Every way a document operation can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The text is not a well-formed document; nothing was built.
    #[error("malformed document: {0}")]
    Malformed(#[from] ParseError),

    #[error("block not found, expected to find block with name: {name}")]
    NotFound { name: String },

    #[error("block: {name} is ro and can not be changed")]
    WritePermission { name: String },
}
