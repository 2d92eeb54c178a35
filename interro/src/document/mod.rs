mod walk;

pub use walk::Walk;

use std::str::FromStr;

use crate::block::Block;
use crate::error::Error;
use crate::parser::{ParseError, ParseOptions, Parser};
use crate::render;

/// A parsed text and its forest of top-level blocks.
///
/// The forest is built once, inside construction, and never changes; parse
/// the new text to reflect an edit.
#[derive(Debug, Clone)]
pub struct Document {
    text: String,
    blocks: Vec<Block>,
    options: ParseOptions,
}

impl Document {
    pub(crate) fn from_parts(text: String, blocks: Vec<Block>, options: ParseOptions) -> Self {
        Document {
            text,
            blocks,
            options,
        }
    }

    /// Parse with the default `!interro` markers and counting escapes.
    pub fn parse(text: impl Into<String>) -> Result<Self, ParseError> {
        Self::parse_with(text, ParseOptions::default())
    }

    pub fn parse_with(text: impl Into<String>, options: ParseOptions) -> Result<Self, ParseError> {
        Parser::new(text.into(), 0).with_options(options).parse()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// The top-level blocks, in document order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn options(&self) -> ParseOptions {
        self.options
    }

    /// The text with all block headers and footers removed.
    pub fn render(&self) -> String {
        render::render(&self.text, &self.options)
    }

    /// Number of blocks in the forest, nested ones included.
    pub fn block_count(&self) -> usize {
        self.blocks.iter().map(Block::block_count).sum()
    }

    /// Every block, parents before children, siblings in document order.
    pub fn walk(&self) -> Walk<'_> {
        Walk::new(&self.blocks)
    }

    /// The first block named `name` in [`walk`](Self::walk) order.
    pub fn get_block(&self, name: &str) -> Option<&Block> {
        self.walk().find(|block| block.name == name)
    }

    /// All block names in [`walk`](Self::walk) order, duplicates kept.
    pub fn block_names(&self) -> Vec<&str> {
        self.walk().map(|block| block.name.as_str()).collect()
    }

    fn require_block(&self, name: &str) -> Result<&Block, Error> {
        self.get_block(name).ok_or_else(|| Error::NotFound {
            name: name.to_string(),
        })
    }

    pub fn criticise_block(&self, name: &str) -> Result<String, Error> {
        Ok(self.require_block(name)?.critique())
    }

    pub fn improve_block(&self, name: &str) -> Result<String, Error> {
        self.require_block(name)?.improve()
    }
}

impl FromStr for Document {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Document::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FOREST: &str = "!interro root ro \"p\"
!interro first ro \"p\"
!interro deep ro \"p\" x !end deep
!end first
!interro second ro \"p\" y !end second
!end root
!interro sibling rw \"p\" z !end sibling";

    #[test]
    fn walk_is_pre_order() {
        let doc = Document::parse(FOREST).unwrap();
        assert_eq!(
            doc.block_names(),
            ["root", "first", "deep", "second", "sibling"]
        );
        assert_eq!(doc.block_count(), 5);
    }

    #[test]
    fn lookup_prefers_the_first_pre_order_match() {
        let source = "!interro a ro \"p\" !interro dup rw \"p\" x !end dup !end a !interro dup ro \"p\" y !end dup";
        let doc = Document::parse(source).unwrap();
        let found = doc.get_block("dup").unwrap();
        assert_eq!(found.content, " x ");
        assert_eq!(doc.block_names(), ["a", "dup", "dup"]);
    }

    #[test]
    fn from_str_uses_defaults() {
        let doc: Document = "text !interro a w \"p\" b !end a".parse().unwrap();
        assert_eq!(doc.blocks().len(), 1);
        assert_eq!(doc.options(), ParseOptions::default());
        assert_eq!(doc.text(), "text !interro a w \"p\" b !end a");
    }
}
