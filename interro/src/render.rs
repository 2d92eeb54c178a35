//! Flattening a document to plain text.
//!
//! The renderer re-scans the raw text word by word instead of walking the
//! parsed forest. Words are separated by single spaces; a newline inside a
//! word splits it, and the part after the newline goes back to the front of
//! the queue. Every word that is not markup is written out followed by the
//! separator that ended it in the source. One separator directly after a
//! header or footer belongs to the markup, so marker lines vanish entirely.

use std::collections::VecDeque;

use log::trace;

use crate::parser::ParseOptions;
use crate::parser::prompt::PromptScanner;
use crate::syntax::{BANG_END, BANG_START, QUERY_END, QUERY_MARK, Syntax};

struct Words<'a> {
    queue: VecDeque<&'a str>,
}

impl<'a> Words<'a> {
    fn new(text: &'a str) -> Self {
        Words {
            queue: text.split(' ').collect(),
        }
    }

    fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// The next space-separated word, untouched.
    fn pop_raw(&mut self) -> Option<&'a str> {
        self.queue.pop_front()
    }

    /// The next word cut at its first newline. The flag says whether a
    /// newline ended it; the rest of the word is queued again, even when
    /// empty, so the space that followed the word is not lost.
    fn pop_line_word(&mut self) -> Option<(&'a str, bool)> {
        let word = self.queue.pop_front()?;
        match word.split_once('\n') {
            Some((head, tail)) => {
                self.queue.push_front(tail);
                Some((head, true))
            }
            None => Some((word, false)),
        }
    }

    /// Drop words until the header prompt closes. Whatever follows the
    /// closing character in the same word is queued again, minus one line break.
    fn skip_prompt(&mut self, mut scanner: PromptScanner) {
        while let Some(word) = self.pop_raw() {
            if let Some(used) = scanner.feed_str(word) {
                let rest = &word[used..];
                if !rest.is_empty() {
                    let rest = rest
                        .strip_prefix("\r\n")
                        .or_else(|| rest.strip_prefix('\n'))
                        .unwrap_or(rest);
                    self.queue.push_front(rest);
                }
                return;
            }
        }
    }
}

/// The text of `source` with every block header and footer removed.
pub fn render(source: &str, options: &ParseOptions) -> String {
    let mut words = Words::new(source);
    let mut rendered = String::with_capacity(source.len());

    while let Some((word, newline)) = words.pop_line_word() {
        // A marker needs a following space, so a word ended by a newline is text.
        if !newline && is_markup(word, options, &mut words) {
            continue;
        }

        let separator = if newline {
            "\n"
        } else if words.is_empty() {
            ""
        } else {
            " "
        };
        rendered.push_str(word);
        rendered.push_str(separator);
    }

    rendered
}

/// If `word` starts a header or footer, consume the rest of it from `words`.
fn is_markup(word: &str, options: &ParseOptions, words: &mut Words<'_>) -> bool {
    let scanner = PromptScanner::new(options.escape_rule);
    match options.syntax {
        Syntax::Bang if word == BANG_START => {
            let name = words.pop_raw();
            words.pop_raw(); // access
            trace!("render: skipping header of {:?}", name);
            words.skip_prompt(scanner);
            true
        }
        Syntax::Bang if word == BANG_END => {
            let name = words.pop_line_word();
            trace!("render: skipping footer of {:?}", name.map(|(n, _)| n));
            true
        }
        Syntax::Query if word == QUERY_MARK => {
            let name = words.pop_raw();
            match words.pop_line_word() {
                Some((word, newline)) if line_word(word, newline) == QUERY_END => {
                    trace!("render: skipping footer of {:?}", name);
                }
                _ => {
                    trace!("render: skipping header of {:?}", name);
                    words.skip_prompt(scanner);
                }
            }
            true
        }
        _ => false,
    }
}

/// A word cut at a newline, without the `\r` of a CRLF line end.
fn line_word(word: &str, newline: bool) -> &str {
    match word.strip_suffix('\r') {
        Some(stripped) if newline => stripped,
        _ => word,
    }
}
