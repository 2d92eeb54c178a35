use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use thiserror::Error;

/// What made a document structurally invalid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("block: {name} is missing an end section, expected `{expected}` before EOF")]
    MissingEnd { name: String, expected: String },

    #[error("block: {name} has access `{token}`, expected one of `ro`, `rw`, `w`")]
    InvalidAccess { name: String, token: String },

    #[error("block header has no name")]
    MissingName,

    #[error("block: {name} has a prompt that is never closed")]
    UnterminatedPrompt { name: String },

    #[error("block: {name} is opened again before its end section")]
    DuplicateName { name: String },
}

/// A structural parse error with source location information.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Range<usize>,
    pub file_id: usize,
    pub notes: Vec<String>,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Range<usize>, file_id: usize) -> Self {
        ParseError {
            kind,
            span,
            file_id,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// The block the error is about, if the header got far enough to name one.
    pub fn block_name(&self) -> Option<&str> {
        match &self.kind {
            ParseErrorKind::MissingEnd { name, .. }
            | ParseErrorKind::InvalidAccess { name, .. }
            | ParseErrorKind::UnterminatedPrompt { name }
            | ParseErrorKind::DuplicateName { name } => Some(name),
            ParseErrorKind::MissingName => None,
        }
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let label = match &self.kind {
            ParseErrorKind::MissingEnd { .. } => "block opened here",
            ParseErrorKind::InvalidAccess { .. } => "unrecognized access",
            ParseErrorKind::MissingName => "header starts here",
            ParseErrorKind::UnterminatedPrompt { .. } => "prompt starts here",
            ParseErrorKind::DuplicateName { .. } => "same name opened again here",
        };
        Diagnostic::new(Severity::Error)
            .with_message(self.kind.to_string())
            .with_labels(vec![
                Label::primary(self.file_id, self.span.clone()).with_message(label),
            ])
            .with_notes(self.notes.clone())
    }
}
