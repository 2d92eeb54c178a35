use std::fmt;

use crate::block::Block;

const PREAMBLE: &str =
    "Please read the full text by using `render` tool to gain a full context of the document.";

/// The requests this crate can format for an external text generator.
/// Formatting never calls a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Critique,
    Improve,
}

impl Instruction {
    pub fn format(self, block: &Block) -> String {
        let closing = match self {
            Instruction::Critique => {
                "Respond concisely with only the criticism of the block content, judging the content with respect to the block prompt."
            }
            Instruction::Improve => {
                "Respond with only an improved version of the block content that satisfies the given prompt. Keep the meaning of the content and leave any nested block markup in place."
            }
        };
        format!(
            "{}\nThen analyse the following content and respond with respect to {}:\n{}\n\n{}",
            PREAMBLE, block.prompt, block.content, closing
        )
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Critique => f.write_str("critique"),
            Instruction::Improve => f.write_str("improve"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::Access;

    #[test]
    fn templates_differ_but_share_the_block_context() {
        let block = Block {
            name: "risk".into(),
            access: Access::Write,
            prompt: "\"this must highlight this is a risk\"".into(),
            content: " building a parser is difficult ".into(),
            children: vec![],
            response: None,
            span: 0..0,
        };
        let critique = Instruction::Critique.format(&block);
        let improve = Instruction::Improve.format(&block);
        assert_ne!(critique, improve);
        for text in [&critique, &improve] {
            assert!(text.starts_with(PREAMBLE));
            assert!(text.contains("with respect to \"this must highlight this is a risk\":"));
            assert!(text.contains(" building a parser is difficult "));
        }
        assert!(critique.contains("criticism"));
        assert!(improve.contains("improved version"));
    }
}
