use std::ops::Range;

use serde::Serialize;

use crate::access::Access;
use crate::error::Error;
use crate::instruction::Instruction;

/// An annotated region of a document.
///
/// ```text
/// !interro [block-name] [access: ro | rw | w] "[block-prompt]"
/// [content]
/// !end [block-name]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Block {
    /// The block name, not necessarily unique within a document.
    pub name: String,
    pub access: Access,
    /// The quoted instruction, quotes included.
    pub prompt: String,
    /// Raw text between header and footer, nested markup included verbatim.
    pub content: String,
    /// Blocks parsed from `content`, in document order.
    pub children: Vec<Block>,
    /// Slot for a generated result. The parser never fills it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    /// Byte span of header through footer in the parsed source.
    #[serde(skip)]
    pub span: Range<usize>,
}

impl Block {
    /// This block plus all of its descendants.
    pub fn block_count(&self) -> usize {
        1 + self.children.iter().map(Block::block_count).sum::<usize>()
    }

    /// Format the critique instruction. Allowed on every access level.
    pub fn critique(&self) -> String {
        Instruction::Critique.format(self)
    }

    /// Format the improve instruction; read-only blocks refuse.
    pub fn improve(&self) -> Result<String, Error> {
        if !self.access.is_writable() {
            return Err(Error::WritePermission {
                name: self.name.clone(),
            });
        }
        Ok(Instruction::Improve.format(self))
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }
}
