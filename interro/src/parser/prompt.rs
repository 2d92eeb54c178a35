//! Delimiting the quoted prompt that follows a block's access token.

use serde::{Deserialize, Serialize};

pub const ESCAPE: char = '\\';
pub const QUOTE: char = '"';

/// How backslashes inside a prompt are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EscapeRule {
    /// A quote adds one to a counter, a backslash subtracts one, and the prompt
    /// ends the moment the counter reaches two. Compatible with existing documents.
    #[default]
    Counting,
    /// A backslash hides the character after it; the prompt ends on the
    /// second unescaped quote.
    TwoState,
}

/// Character-at-a-time prompt scanner. The extractor feeds it a whole string,
/// the renderer feeds it word by word; both stop on the same character.
#[derive(Debug, Clone)]
pub struct PromptScanner {
    rule: EscapeRule,
    quotes: i32,
    escaped: bool,
}

impl PromptScanner {
    pub fn new(rule: EscapeRule) -> Self {
        PromptScanner {
            rule,
            quotes: 0,
            escaped: false,
        }
    }

    /// Consume one character. Returns `true` once the prompt is complete.
    pub fn feed(&mut self, c: char) -> bool {
        match self.rule {
            EscapeRule::Counting => {
                if c == ESCAPE {
                    self.quotes -= 1;
                } else if c == QUOTE {
                    self.quotes += 1;
                }
            }
            EscapeRule::TwoState => {
                if self.escaped {
                    self.escaped = false;
                } else if c == ESCAPE {
                    self.escaped = true;
                } else if c == QUOTE {
                    self.quotes += 1;
                }
            }
        }
        self.is_closed()
    }

    pub fn is_closed(&self) -> bool {
        self.quotes == 2
    }

    /// Feed characters from `input` until the prompt closes; returns the byte
    /// length consumed, or `None` if `input` ran out first.
    pub fn feed_str(&mut self, input: &str) -> Option<usize> {
        for (i, c) in input.char_indices() {
            if self.feed(c) {
                return Some(i + c.len_utf8());
            }
        }
        None
    }
}

/// Byte length of the prompt at the start of `input`, both quotes included.
pub fn scan(input: &str, rule: EscapeRule) -> Option<usize> {
    PromptScanner::new(rule).feed_str(input)
}

/// The prompt lengths two escape rules produce for the same input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Divergence {
    pub counting: Option<usize>,
    pub two_state: Option<usize>,
}

/// Reports inputs where the two-state scanner would delimit a different
/// prompt than the counting rule. `None` means both agree.
pub fn divergence(input: &str) -> Option<Divergence> {
    let counting = scan(input, EscapeRule::Counting);
    let two_state = scan(input, EscapeRule::TwoState);
    if counting == two_state {
        None
    } else {
        Some(Divergence {
            counting,
            two_state,
        })
    }
}
