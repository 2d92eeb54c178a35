use crate::block::Block;

/// Pre-order depth-first iterator over a forest: every block is yielded
/// before its children, and siblings in document order.
pub struct Walk<'a> {
    stack: Vec<&'a Block>,
}

impl<'a> Walk<'a> {
    pub(crate) fn new(roots: &'a [Block]) -> Self {
        Walk {
            stack: roots.iter().rev().collect(),
        }
    }
}

impl<'a> Iterator for Walk<'a> {
    type Item = &'a Block;

    fn next(&mut self) -> Option<Self::Item> {
        let block = self.stack.pop()?;
        self.stack.extend(block.children.iter().rev());
        Some(block)
    }
}
