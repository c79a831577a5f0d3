//! Context-free grammar representation and the textual grammar loader.
//!
//! Grammar files carry one rule per line, `LHS -> RHS1 | RHS2 | ... | RHSk`,
//! with symbols separated by spaces and the literal `e` denoting the empty
//! alternative. Line order is significant: the left-hand side of the first
//! rule is the start symbol.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::{GrammarError, Result};
use crate::lexer::Token;
use crate::symbol::{render_sequence, Symbol, END_MARKER, EPSILON};

/// Longest accepted grammar line.
pub const MAX_LINE_LENGTH: usize = 99;

/// A production rule `lhs -> rhs`.
///
/// The right-hand side is a sequence of symbols; the empty sequence is the
/// epsilon production (the textual `e` never survives loading).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
    pub lhs: Symbol,
    pub rhs: Vec<Symbol>,
}

impl Production {
    pub fn new(lhs: Symbol, rhs: Vec<Symbol>) -> Self {
        Self { lhs, rhs }
    }

    #[inline]
    pub fn is_epsilon(&self) -> bool {
        self.rhs.is_empty()
    }

    pub fn rhs_display(&self) -> String {
        render_sequence(&self.rhs)
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.lhs, self.rhs_display())
    }
}

/// An ordered list of productions plus the derived symbol sets.
///
/// Non-terminals are exactly the left-hand sides; every other right-hand
/// side symbol is a terminal. The end marker `$` is a terminal; epsilon is
/// not part of either alphabet.
#[derive(Debug, Clone)]
pub struct Grammar {
    pub(crate) productions: Vec<Production>,
    pub(crate) non_terminals: BTreeSet<Symbol>,
    pub(crate) terminals: BTreeSet<Symbol>,
    pub(crate) start: Symbol,
}

impl Grammar {
    /// Loads a grammar from its textual form.
    pub fn parse(text: &str) -> Result<Self> {
        let mut productions = Vec::new();
        for (number, raw) in text.lines().enumerate() {
            let line = raw.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            if line.len() > MAX_LINE_LENGTH {
                return Err(GrammarError::LineTooLong {
                    line: number + 1,
                    max: MAX_LINE_LENGTH,
                });
            }
            parse_rule_line(line, &mut productions)?;
        }
        Self::from_productions(productions)
    }

    /// Loads a grammar and augments it for LR construction: a fresh start
    /// non-terminal `S'` with the single production `S' -> S` is prepended.
    pub fn parse_augmented(text: &str) -> Result<Self> {
        let mut grammar = Self::parse(text)?;
        grammar.augment();
        Ok(grammar)
    }

    /// Builds a grammar from an explicit production list, deriving the
    /// terminal and non-terminal sets.
    pub fn from_productions(productions: Vec<Production>) -> Result<Self> {
        if productions.is_empty() {
            return Err(GrammarError::EmptyGrammar);
        }

        let non_terminals: BTreeSet<Symbol> =
            productions.iter().map(|p| p.lhs.clone()).collect();

        let mut terminals: BTreeSet<Symbol> = BTreeSet::new();
        for production in &productions {
            for symbol in &production.rhs {
                if !non_terminals.contains(symbol) {
                    terminals.insert(symbol.clone());
                }
            }
        }
        terminals.insert(Symbol::end_marker());

        let start = productions[0].lhs.clone();
        Ok(Self {
            productions,
            non_terminals,
            terminals,
            start,
        })
    }

    /// Prepends the augmentation production `S' -> S`, making `S'` the new
    /// start symbol. The fresh name is guaranteed not to collide.
    pub fn augment(&mut self) {
        let fresh = self.fresh_non_terminal(self.start.as_str(), '\'');
        self.productions
            .insert(0, Production::new(fresh.clone(), vec![self.start.clone()]));
        self.non_terminals.insert(fresh.clone());
        self.start = fresh;
    }

    pub fn productions(&self) -> &[Production] {
        &self.productions
    }

    pub fn non_terminals(&self) -> &BTreeSet<Symbol> {
        &self.non_terminals
    }

    pub fn terminals(&self) -> &BTreeSet<Symbol> {
        &self.terminals
    }

    pub fn start(&self) -> &Symbol {
        &self.start
    }

    #[inline]
    pub fn is_non_terminal(&self, symbol: &Symbol) -> bool {
        self.non_terminals.contains(symbol)
    }

    #[inline]
    pub fn is_terminal(&self, symbol: &Symbol) -> bool {
        self.terminals.contains(symbol)
    }

    /// The terminal a token stands for in this grammar: the token kind when
    /// the grammar uses it, otherwise the lexeme when the grammar names that
    /// directly (toy grammars over literal letters), otherwise the kind
    /// unchanged, which the drivers then report as a lexical error.
    pub fn terminal_of(&self, token: &Token) -> Symbol {
        if self.terminals.contains(token.kind.as_str()) {
            Symbol::new(token.kind.clone())
        } else if !token.text.is_empty() && self.terminals.contains(token.text.as_str()) {
            Symbol::new(token.text.clone())
        } else {
            Symbol::new(token.kind.clone())
        }
    }

    /// Productions of one non-terminal, in list order, with their indices.
    pub fn productions_of<'a>(
        &'a self,
        lhs: &'a Symbol,
    ) -> impl Iterator<Item = (usize, &'a Production)> + 'a {
        self.productions
            .iter()
            .enumerate()
            .filter(move |(_, p)| p.lhs == *lhs)
    }

    /// Index of the first production equal to `(lhs, rhs)`. With duplicate
    /// productions the first occurrence wins; LR reduce entries rely on
    /// this.
    pub fn production_index(&self, lhs: &Symbol, rhs: &[Symbol]) -> Option<usize> {
        self.productions
            .iter()
            .position(|p| p.lhs == *lhs && p.rhs == rhs)
    }

    /// Non-terminals in order of first appearance as a left-hand side.
    pub fn non_terminals_in_order(&self) -> Vec<Symbol> {
        let mut seen = BTreeSet::new();
        let mut order = Vec::new();
        for production in &self.productions {
            if seen.insert(production.lhs.clone()) {
                order.push(production.lhs.clone());
            }
        }
        order
    }

    /// A non-terminal name built from `base` by appending `suffix` until it
    /// no longer collides with an existing non-terminal.
    pub(crate) fn fresh_non_terminal(&self, base: &str, suffix: char) -> Symbol {
        let mut name = format!("{base}{suffix}");
        while self.non_terminals.contains(name.as_str()) {
            name.push(suffix);
        }
        Symbol::new(name)
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for production in &self.productions {
            writeln!(f, "{production}")?;
        }
        Ok(())
    }
}

fn parse_rule_line(line: &str, productions: &mut Vec<Production>) -> Result<()> {
    let (lhs_part, rhs_part) = line
        .split_once("->")
        .ok_or_else(|| GrammarError::InvalidProduction(line.to_string()))?;

    let lhs_str = lhs_part.trim();
    if lhs_str.is_empty() || lhs_str.split_whitespace().count() != 1 {
        return Err(GrammarError::InvalidProduction(line.to_string()));
    }
    if lhs_str == EPSILON {
        return Err(GrammarError::MisplacedEpsilon(line.to_string()));
    }
    if lhs_str == END_MARKER {
        return Err(GrammarError::ReservedEndMarker(line.to_string()));
    }
    let lhs = Symbol::new(lhs_str);

    for alternative in rhs_part.split('|') {
        let names: Vec<&str> = alternative.split_whitespace().collect();
        if names.is_empty() {
            return Err(GrammarError::InvalidProduction(line.to_string()));
        }
        let rhs = if names == [EPSILON] {
            Vec::new()
        } else {
            if names.contains(&EPSILON) {
                return Err(GrammarError::MisplacedEpsilon(line.to_string()));
            }
            if names.contains(&END_MARKER) {
                return Err(GrammarError::ReservedEndMarker(line.to_string()));
            }
            names.into_iter().map(Symbol::new).collect()
        };
        productions.push(Production::new(lhs.clone(), rhs));
    }
    Ok(())
}
