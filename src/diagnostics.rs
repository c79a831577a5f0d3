//! Ordered error accumulation shared by all parser drivers.
//!
//! Reports never abort a session by themselves; they pile up here and the
//! session's `accepted` flag is false exactly when the list is non-empty.
//! Message shapes are fixed: lexical reports carry the offending lexeme and
//! its one-based column, syntax reports additionally carry the expected
//! token set of the moment.

use itertools::Itertools;

use crate::lexer::{Token, INVALID_CHAR, INVALID_ID, INVALID_NUM};
use crate::symbol::Symbol;

use std::collections::BTreeSet;

#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<String>,
    end_reported: bool,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<String> {
        self.errors
    }

    /// `'a' or 'b' or 'c'` without the outer quotes; epsilon is never part
    /// of an expected set.
    fn join_expected(expected: &BTreeSet<Symbol>) -> String {
        expected
            .iter()
            .filter(|s| !s.is_epsilon())
            .join("' or '")
    }

    fn detail_for(kind: &str) -> Option<&'static str> {
        match kind {
            INVALID_CHAR => Some("Illegal character."),
            INVALID_NUM => Some("Invalid number format."),
            INVALID_ID => Some("Invalid identifier."),
            _ => None,
        }
    }

    /// A token the lexer flagged, or whose kind is no terminal of the
    /// grammar at hand.
    pub fn lexical(&mut self, token: &Token) {
        let text = token.display_text();
        let column = token.column;
        let message = match Self::detail_for(&token.kind) {
            Some(detail) => format!(
                "Lexical Error: Invalid token '<{text}>': {detail} Column number: [{column}]"
            ),
            None => {
                format!("Lexical Error: Invalid token '<{text}>'. Column number: [{column}]")
            }
        };
        self.errors.push(message);
    }

    /// Unexpected token (or end of input) with the expected set of the
    /// current parse position. Unexpected end of input is reported once per
    /// session.
    pub fn unexpected(&mut self, token: &Token, expected: &BTreeSet<Symbol>) {
        let list = Self::join_expected(expected);
        let column = token.column;
        if token.is_end() {
            if !self.end_reported {
                self.end_reported = true;
                self.errors.push(format!(
                    "Syntax Error: Unexpected end of input. Expected one of: '{list}'. Column number: [{column}]"
                ));
            }
        } else {
            let text = token.display_text();
            self.errors.push(format!(
                "Syntax Error: Unexpected token '{text}'. Expected one of: '{list}'. Column number: [{column}]"
            ));
        }
    }

    /// Unexpected end of input with no expected set available.
    pub fn unexpected_end(&mut self, column: usize) {
        if !self.end_reported {
            self.end_reported = true;
            self.errors.push(format!(
                "Syntax Error: Unexpected end of input. Column number: [{column}]"
            ));
        }
    }

    /// A symbol the parser had to give up on: `missing X before Y`.
    pub fn missing(&mut self, expected: &str, token: &Token) {
        let column = token.column;
        if token.is_end() {
            self.errors.push(format!(
                "Syntax Error: Missing '{expected}' before end of input. Column number: [{column}]"
            ));
        } else {
            let text = token.display_text();
            self.errors.push(format!(
                "Syntax Error: Missing '{expected}' before '{text}'. Column number: [{column}]"
            ));
        }
    }

    /// Input remains although the parse is complete.
    pub fn expected_end(&mut self, token: &Token) {
        let text = token.display_text();
        let column = token.column;
        self.errors.push(format!(
            "Syntax Error: Expected end of input, but found '{text}'. Column number: [{column}]"
        ));
    }

    /// LR error cell in a row whose only non-error action is accept.
    pub fn unexpected_expecting_end(&mut self, token: &Token) {
        let text = token.display_text();
        let column = token.column;
        self.errors.push(format!(
            "Syntax Error: Unexpected token '{text}'. Expected end of input. Column number: [{column}]"
        ));
    }

    /// Trailing token after a completed recursive descent.
    pub fn trailing(&mut self, token: &Token) {
        let text = token.display_text();
        let column = token.column;
        self.errors.push(format!(
            "Syntax Error: Unexpected token '{text}'. Column number: [{column}]"
        ));
    }

    /// Joined expected list for callers that embed it in an action string.
    pub fn expected_list(expected: &BTreeSet<Symbol>) -> String {
        Self::join_expected(expected)
    }
}
