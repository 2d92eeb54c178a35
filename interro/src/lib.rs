//! Annotated-block documents: parsing, rendering, and instruction formatting.
//!
//! A block is a span of text wrapped in a header and footer:
//!
//! ```text
//! !interro summary rw "keep it under fifty words"
//! The parser walks the text once ...
//! !end summary
//! ```
//!
//! Blocks nest. [`Document`] parses the whole forest eagerly and exposes
//! lookup, counting, rendering, and the critique/improve instructions.

pub mod access;
pub mod block;
pub mod document;
pub mod error;
pub mod instruction;
pub mod parser;
pub mod render;
pub mod syntax;

pub use access::Access;
pub use block::Block;
pub use document::Document;
pub use error::Error;
pub use instruction::Instruction;
pub use parser::prompt::EscapeRule;
pub use parser::{ParseError, ParseErrorKind, ParseOptions, Parser};
pub use syntax::Syntax;
