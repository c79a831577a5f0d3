//! Lexical analysis for parser input strings.
//!
//! The scanner works on ASCII bytes with a position cursor and hands out one
//! token per call. Invalid input never raises an error here: malformed
//! lexemes come back as tokens of an `invalid-*` kind and the parser drivers
//! decide how to report and recover.
//!
//! Every accepted token is deduplicated into the session's [`SymbolTable`],
//! keywords and operators by kind, identifiers and numbers by lexeme.

use crate::symbol::END_MARKER;

/// Reserved words recognized by the scanner. The token kind of a keyword is
/// the keyword itself.
pub const KEYWORDS: [&str; 9] = [
    "if", "else", "true", "false", "and", "or", "not", "int", "float",
];

/// Token kind of an unrecognized character.
pub const INVALID_CHAR: &str = "invalid-char";
/// Token kind of a malformed numeric literal.
pub const INVALID_NUM: &str = "invalid-num";
/// Token kind of a numeric literal with an identifier tail.
pub const INVALID_ID: &str = "invalid-id";

/// A lexical token.
///
/// `kind` is the terminal name the parsers match against. Keywords and
/// single-character operators carry no `text`; identifiers and numbers carry
/// their lexeme. `column` is the one-based column of the lexeme's first
/// character; the end-of-input token reports the input length (the column
/// of the last character, zero for empty input).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: String,
    pub text: String,
    pub column: usize,
}

impl Token {
    pub fn new(kind: impl Into<String>, text: impl Into<String>, column: usize) -> Self {
        Self {
            kind: kind.into(),
            text: text.into(),
            column,
        }
    }

    fn end(column: usize) -> Self {
        Token::new(END_MARKER, "", column)
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.kind == END_MARKER
    }

    /// The text shown in reports: the lexeme when present, the kind for
    /// keywords, operators and the end marker.
    pub fn display_text(&self) -> &str {
        if self.text.is_empty() {
            &self.kind
        } else {
            &self.text
        }
    }
}

/// Returns an owned token stream guaranteed to end with the end-of-input
/// token, appending one if the caller's slice lacks it.
pub(crate) fn ensure_end_terminated(tokens: &[Token]) -> Vec<Token> {
    let mut tokens = tokens.to_vec();
    match tokens.last() {
        Some(last) if last.is_end() => {}
        Some(last) => {
            // as if the input ended right after the last lexeme
            let column = last.column + last.display_text().len() - 1;
            tokens.push(Token::end(column));
        }
        None => tokens.push(Token::end(0)),
    }
    tokens
}

/// Per-session cache of accepted tokens.
#[derive(Debug, Default)]
pub struct SymbolTable {
    entries: Vec<Token>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_by_kind(&self, kind: &str) -> Option<&Token> {
        self.entries.iter().find(|t| t.kind == kind)
    }

    pub fn find_by_text(&self, text: &str) -> Option<&Token> {
        self.entries.iter().find(|t| t.text == text && !text.is_empty())
    }

    pub fn insert(&mut self, token: Token) {
        self.entries.push(token);
    }

    pub fn entries(&self) -> &[Token] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The scanner. Owns its symbol table; a new lexer (and table) is created
/// per parse session.
#[derive(Debug)]
pub struct Lexer {
    input: Vec<u8>,
    pos: usize,
    table: SymbolTable,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let mut table = SymbolTable::new();
        for keyword in KEYWORDS {
            table.insert(Token::new(keyword, "", 0));
        }
        Self {
            input: input.as_bytes().to_vec(),
            pos: 0,
            table,
        }
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        &self.table
    }

    pub fn into_symbol_table(self) -> SymbolTable {
        self.table
    }

    /// Scans the whole input, returning the token stream terminated by the
    /// end-of-input token together with the session symbol table.
    pub fn tokenize(input: &str) -> (Vec<Token>, SymbolTable) {
        let mut lexer = Lexer::new(input);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let done = token.is_end();
            tokens.push(token);
            if done {
                break;
            }
        }
        (tokens, lexer.table)
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    /// Returns the next token and advances the cursor. At end of buffer the
    /// end-of-input token is returned (repeatedly, if called again).
    pub fn next_token(&mut self) -> Token {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }

        let start = self.pos;
        let column = start + 1;
        let current = match self.peek() {
            Some(b) => b,
            None => return Token::end(self.input.len()),
        };

        if current.is_ascii_alphabetic() || current == b'_' {
            self.scan_identifier(start, column)
        } else if current.is_ascii_digit() {
            self.scan_number(start, column)
        } else if matches!(current, b'+' | b'-' | b'*' | b'/' | b'(' | b')' | b'=') {
            self.pos += 1;
            let op = (current as char).to_string();
            if self.table.find_by_kind(&op).is_none() {
                self.table.insert(Token::new(op.clone(), "", column));
            }
            Token::new(op, "", column)
        } else {
            self.pos += 1;
            Token::new(INVALID_CHAR, (current as char).to_string(), column)
        }
    }

    fn lexeme(&self, start: usize) -> String {
        String::from_utf8_lossy(&self.input[start..self.pos]).into_owned()
    }

    fn scan_identifier(&mut self, start: usize, column: usize) -> Token {
        self.pos += 1;
        while self
            .peek()
            .is_some_and(|b| b.is_ascii_alphanumeric() || b == b'_')
        {
            self.pos += 1;
        }
        let lexeme = self.lexeme(start);

        if KEYWORDS.contains(&lexeme.as_str()) {
            return Token::new(lexeme, "", column);
        }
        let token = Token::new("id", lexeme.clone(), column);
        if self.table.find_by_text(&lexeme).is_none() {
            self.table.insert(token.clone());
        }
        token
    }

    fn scan_number(&mut self, start: usize, column: usize) -> Token {
        let mut is_float = false;
        self.pos += 1;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }

        if self.peek() == Some(b'.') {
            is_float = true;
            self.pos += 1;
            if self.peek().is_some_and(|b| b.is_ascii_digit()) {
                while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                    self.pos += 1;
                }
            } else {
                return Token::new(INVALID_NUM, self.lexeme(start), column);
            }
        }

        if matches!(self.peek(), Some(b'E') | Some(b'e')) {
            self.pos += 1;
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                self.pos += 1;
            }
            if self.peek().is_some_and(|b| b.is_ascii_digit()) {
                while self.peek().is_some_and(|b| b.is_ascii_digit()) {
                    self.pos += 1;
                }
            } else if !self.peek().is_some_and(|b| b.is_ascii_alphabetic()) {
                return Token::new(INVALID_NUM, self.lexeme(start), column);
            }
            // a letter after the exponent falls through to the tail check
        }

        if self
            .peek()
            .is_some_and(|b| b.is_ascii_alphabetic() || b == b'_')
        {
            self.pos += 1;
            while self.peek().is_some_and(|b| b.is_ascii_alphanumeric()) {
                self.pos += 1;
            }
            return Token::new(INVALID_ID, self.lexeme(start), column);
        }

        let kind = if is_float { "floatNum" } else { "intNum" };
        let lexeme = self.lexeme(start);
        let token = Token::new(kind, lexeme.clone(), column);
        if self.table.find_by_text(&lexeme).is_none() {
            self.table.insert(token.clone());
        }
        token
    }
}
