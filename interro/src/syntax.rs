use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const BANG_START: &str = "!interro";
pub const BANG_END: &str = "!end";
pub const QUERY_MARK: &str = "?!";
pub const QUERY_END: &str = "end";

/// The marker pair a document uses to delimit its blocks.
///
/// Both dialects carry the same header fields:
///
/// ```text
/// !interro name access "prompt"      ?! name access "prompt"
/// content                            content
/// !end name                          ?! name end
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Syntax {
    #[default]
    Bang,
    Query,
}

impl Syntax {
    /// Picks `Query` when the text uses `?!` headers and no `!interro` header.
    pub fn detect(text: &str) -> Syntax {
        let has_bang = find_marker(text, &Syntax::Bang.opening()).is_some();
        let has_query = find_marker(text, &Syntax::Query.opening()).is_some();
        if has_query && !has_bang {
            Syntax::Query
        } else {
            Syntax::Bang
        }
    }

    /// The token that starts a header.
    pub fn start_token(self) -> &'static str {
        match self {
            Syntax::Bang => BANG_START,
            Syntax::Query => QUERY_MARK,
        }
    }

    /// The header prefix searched for, including its mandatory space.
    pub fn opening(self) -> String {
        format!("{} ", self.start_token())
    }

    /// The header prefix of a block with the given name.
    pub fn opening_named(self, name: &str) -> String {
        format!("{} {} ", self.start_token(), name)
    }

    /// The footer closing the block with the given name.
    pub fn closing(self, name: &str) -> String {
        match self {
            Syntax::Bang => format!("{} {}", BANG_END, name),
            Syntax::Query => format!("{} {} {}", QUERY_MARK, name, QUERY_END),
        }
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Syntax::Bang => f.write_str("bang"),
            Syntax::Query => f.write_str("query"),
        }
    }
}

impl FromStr for Syntax {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bang" => Ok(Syntax::Bang),
            "query" => Ok(Syntax::Query),
            other => Err(format!("unknown syntax `{}`, expected `bang` or `query`", other)),
        }
    }
}

/// True when `at` starts a word the renderer would see: start of text, or
/// right after a space or a newline.
fn at_word_start(haystack: &str, at: usize) -> bool {
    matches!(haystack[..at].chars().next_back(), None | Some(' ' | '\n'))
}

fn find_from(haystack: &str, needle: &str, accept: impl Fn(usize) -> bool) -> Option<usize> {
    let step = needle.chars().next().map_or(1, char::len_utf8);
    let mut from = 0;
    while let Some(found) = haystack[from..].find(needle) {
        let at = from + found;
        if accept(at) {
            return Some(at);
        }
        from = at + step;
    }
    None
}

/// Byte offset of the first `needle` that starts a word.
pub(crate) fn find_marker(haystack: &str, needle: &str) -> Option<usize> {
    find_from(haystack, needle, |at| at_word_start(haystack, at))
}

/// True when `after` begins where the renderer would end a word: a space,
/// a line break (`\n` or `\r\n`), or the end of the text.
fn at_word_end(after: &str) -> bool {
    after.is_empty() || after.starts_with([' ', '\n']) || after.starts_with("\r\n")
}

/// Like [`find_marker`], but the match must also end a word, so that
/// `!end one` does not match inside `!end one-two`.
pub(crate) fn find_footer(haystack: &str, footer: &str) -> Option<usize> {
    find_from(haystack, footer, |at| {
        at_word_start(haystack, at) && at_word_end(&haystack[at + footer.len()..])
    })
}

/// Whether the query-dialect marker whose name starts at `at` is a footer
/// (`?! name end`) rather than a header.
pub(crate) fn is_query_footer(text: &str, at: usize) -> bool {
    let rest = &text[at..];
    let Some(space) = rest.find(' ') else {
        return false;
    };
    rest[space + 1..]
        .strip_prefix(QUERY_END)
        .is_some_and(at_word_end)
}
