use std::ops::Range;

use log::debug;

use crate::access::Access;
use crate::block::Block;
use crate::parser::error::{ParseError, ParseErrorKind};
use crate::parser::prompt;
use crate::parser::ParseOptions;
use crate::syntax::{self, Syntax};

/// Extract the top-level blocks of `source`, each with its nested children.
pub(crate) fn parse_blocks(
    source: &str,
    file_id: usize,
    options: ParseOptions,
) -> Result<Vec<Block>, ParseError> {
    Extractor { file_id, options }.extract(source, 0)
}

struct Extractor {
    file_id: usize,
    options: ParseOptions,
}

impl Extractor {
    fn syntax(&self) -> Syntax {
        self.options.syntax
    }

    fn error(&self, kind: ParseErrorKind, span: Range<usize>) -> ParseError {
        ParseError::new(kind, span, self.file_id)
    }

    /// Sibling blocks found in `content`, which starts at byte `base` of the
    /// original source. Text between blocks is not kept in the tree.
    fn extract(&self, content: &str, base: usize) -> Result<Vec<Block>, ParseError> {
        let opening = self.syntax().opening();
        let mut blocks = Vec::new();
        let mut offset = 0;

        while let Some(found) = syntax::find_marker(&content[offset..], &opening) {
            let start = offset + found;
            let header = start + opening.len();
            // A footer with no open block is text, as `!end name` is in the bang dialect.
            if self.syntax() == Syntax::Query && syntax::is_query_footer(content, header) {
                debug!("ignoring unmatched footer at {}", base + start);
                offset = header;
                continue;
            }
            let block = self.extract_one(content, base, start, header)?;
            offset = block.span.end - base;
            blocks.push(block);
        }

        Ok(blocks)
    }

    /// Parse the block whose header begins at `start`; `header` is the offset
    /// just past the opening marker and its space.
    fn extract_one(
        &self,
        content: &str,
        base: usize,
        start: usize,
        header: usize,
    ) -> Result<Block, ParseError> {
        let (name, after_name) = next_word(content, header);
        if name.is_empty() {
            return Err(self.error(ParseErrorKind::MissingName, base + start..base + header));
        }

        let (token, prompt_start) = next_word(content, after_name);
        let access: Access = token.parse().map_err(|_| {
            self.error(
                ParseErrorKind::InvalidAccess {
                    name: name.to_string(),
                    token: token.to_string(),
                },
                base + after_name..base + after_name + token.len(),
            )
        })?;

        let footer = self.syntax().closing(name);
        let Some(prompt_len) = prompt::scan(&content[prompt_start..], self.options.escape_rule)
        else {
            let kind = if syntax::find_footer(&content[prompt_start..], &footer).is_some() {
                ParseErrorKind::UnterminatedPrompt {
                    name: name.to_string(),
                }
            } else {
                ParseErrorKind::MissingEnd {
                    name: name.to_string(),
                    expected: footer,
                }
            };
            return Err(self.error(kind, base + start..base + prompt_start));
        };

        let body_start = prompt_start + prompt_len;
        let Some(found_end) = syntax::find_footer(&content[body_start..], &footer) else {
            return Err(self
                .error(
                    ParseErrorKind::MissingEnd {
                        name: name.to_string(),
                        expected: footer.clone(),
                    },
                    base + start..base + body_start,
                )
                .with_note(format!("add `{}` after the block content", footer)));
        };
        let body_end = body_start + found_end;
        let body = &content[body_start..body_end];

        // The footer found first belongs to an inner block when the name repeats.
        if let Some(inner) = syntax::find_marker(body, &self.syntax().opening_named(name)) {
            let inner = base + body_start + inner;
            return Err(self
                .error(
                    ParseErrorKind::DuplicateName {
                        name: name.to_string(),
                    },
                    inner..inner + self.syntax().opening_named(name).len(),
                )
                .with_note(format!(
                    "the outer `{}` block starts at byte {}; rename one of them",
                    name,
                    base + start
                )));
        }

        let children = self.extract(body, base + body_start)?;
        let end = body_end + footer.len();

        debug!(
            "parsed block `{}` ({}) with {} child block(s) at {}..{}",
            name,
            access,
            children.len(),
            base + start,
            base + end
        );

        Ok(Block {
            name: name.to_string(),
            access,
            prompt: content[prompt_start..body_start].to_string(),
            content: body.to_string(),
            children,
            response: None,
            span: base + start..base + end,
        })
    }
}

/// The text from `at` to the next space, and the offset just past that space.
fn next_word(text: &str, at: usize) -> (&str, usize) {
    let rest = &text[at..];
    match rest.find(' ') {
        Some(end) => (&rest[..end], at + end + 1),
        None => (rest, text.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::prompt::EscapeRule;

    fn parse(source: &str) -> Result<Vec<Block>, ParseError> {
        parse_blocks(source, 0, ParseOptions::default())
    }

    #[test]
    fn no_markers_is_empty() {
        assert!(parse("NO BLOCKS").unwrap().is_empty());
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn captures_header_fields_and_content() {
        let blocks = parse("intro !interro one rw \"be brief\"\nbody\n!end one tail").unwrap();
        assert_eq!(blocks.len(), 1);
        let block = &blocks[0];
        assert_eq!(block.name, "one");
        assert_eq!(block.access, Access::ReadWrite);
        assert_eq!(block.prompt, "\"be brief\"");
        assert_eq!(block.content, "\nbody\n");
        assert!(block.children.is_empty());
        assert_eq!(block.response, None);
        assert_eq!(block.span, 6..46);
    }

    #[test]
    fn spans_of_nested_blocks_point_into_the_source() {
        let source = "!interro outer ro \"p\" a !interro inner w \"q\" b !end inner !end outer";
        let blocks = parse(source).unwrap();
        let inner = &blocks[0].children[0];
        assert_eq!(&source[inner.span.clone()], "!interro inner w \"q\" b !end inner");
        assert_eq!(&source[blocks[0].span.clone()], source);
    }

    #[test]
    fn siblings_keep_document_order() {
        let source = "!interro a ro \"p\" x !end a mid !interro b ro \"p\" y !end b";
        let names: Vec<_> = parse(source).unwrap().into_iter().map(|b| b.name).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn sibling_blocks_may_share_a_name() {
        let source = "!interro a ro \"p\" x !end a !interro a rw \"q\" y !end a";
        let blocks = parse(source).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].access, Access::ReadWrite);
    }

    #[test]
    fn header_without_footer_is_missing_end() {
        let err = parse("!interro one ro").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::MissingEnd {
                name: "one".into(),
                expected: "!end one".into(),
            }
        );
        assert_eq!(err.block_name(), Some("one"));
    }

    #[test]
    fn footer_for_a_longer_name_does_not_close() {
        let err = parse("!interro one ro \"p\" x !end one-two").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::MissingEnd { .. }));
    }

    #[test]
    fn unknown_access_names_token_and_block() {
        let err = parse("!interro one rx \"p\" x !end one").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::InvalidAccess {
                name: "one".into(),
                token: "rx".into(),
            }
        );
        assert_eq!(err.span, 13..15);
    }

    #[test]
    fn unclosed_prompt_before_a_footer() {
        let err = parse("!interro one ro \"never closed !end one").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::UnterminatedPrompt { name: "one".into() }
        );
    }

    #[test]
    fn nested_block_with_the_same_name_is_rejected() {
        let source = "!interro a ro \"p\" !interro a ro \"q\" x !end a !end a";
        let err = parse(source).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::DuplicateName { name: "a".into() });
        assert_eq!(err.span.start, 18);
    }

    #[test]
    fn unterminated_later_sibling_fails_the_whole_parse() {
        let err = parse("!interro a ro \"p\" x !end a !interro b ro \"q\" y").unwrap_err();
        assert_eq!(err.block_name(), Some("b"));
    }

    #[test]
    fn missing_name_is_reported() {
        let err = parse("!interro  ro \"p\" !end ").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::MissingName);
    }

    #[test]
    fn query_dialect() {
        let options = ParseOptions {
            syntax: Syntax::Query,
            escape_rule: EscapeRule::Counting,
        };
        let source = "?! one ro \"p\"\n?! two w \"q\" x ?! two end\n?! one end";
        let blocks = parse_blocks(source, 0, options).unwrap();
        assert_eq!(blocks[0].name, "one");
        assert_eq!(blocks[0].children[0].name, "two");
        assert_eq!(blocks[0].children[0].content, " x ");
    }

    #[test]
    fn unmatched_query_footer_is_not_a_header() {
        let options = ParseOptions {
            syntax: Syntax::Query,
            escape_rule: EscapeRule::Counting,
        };
        let source = "x ?! zz end y ?! a ro \"p\" z ?! a end";
        let blocks = parse_blocks(source, 0, options).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].name, "a");
        assert_eq!(blocks[0].content, " z ");
    }

    #[test]
    fn crlf_line_ends_close_footers() {
        let source = "!interro a ro \"p\"\r\nbody\r\n!end a\r\nafter";
        let blocks = parse(source).unwrap();
        assert_eq!(blocks[0].content, "\r\nbody\r\n");
    }

    #[test]
    fn footer_followed_by_a_tab_does_not_close() {
        let err = parse("!interro a ro \"p\" x !end a\tmore text").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::MissingEnd { .. }));
    }

    #[test]
    fn two_state_rule_changes_where_the_prompt_ends() {
        let source = r#"!interro a rw "C:\dir" body !end a"#;
        let err = parse(source).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnterminatedPrompt { name: "a".into() });

        let options = ParseOptions {
            syntax: Syntax::Bang,
            escape_rule: EscapeRule::TwoState,
        };
        let two_state = parse_blocks(source, 0, options).unwrap();
        assert_eq!(two_state[0].prompt, r#""C:\dir""#);
        assert_eq!(two_state[0].content, " body ");
    }
}
