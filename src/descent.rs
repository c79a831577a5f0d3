//! Recursive-descent parser.
//!
//! Productions of each non-terminal are attempted in list order without
//! backtracking: once a production has consumed a token it is committed,
//! and a later mismatch is a syntax error. The first-match policy is only
//! sound for LL(1) grammars, so the builder normalizes the grammar and
//! rejects anything that fails the LL(1) property before parsing starts.

use log::debug;

use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::first_follow::{
    compute_first_sets, compute_follow_sets, FirstSets, FollowSets,
};
use crate::grammar::Grammar;
use crate::lexer::{ensure_end_terminated, Lexer, Token};
use crate::ll1::check_ll1;
use crate::symbol::{Symbol, EPSILON};
use crate::trace::{remaining_input, ParseOutcome, TopDownStep};
use crate::transform;

/// Recursive-descent parser over a normalized LL(1) grammar.
#[derive(Debug)]
pub struct RecursiveDescentParser {
    grammar: Grammar,
    first_sets: FirstSets,
    follow_sets: FollowSets,
}

impl RecursiveDescentParser {
    pub fn from_text(grammar_text: &str) -> Result<Self> {
        Self::from_grammar(Grammar::parse(grammar_text)?)
    }

    pub fn from_grammar(mut grammar: Grammar) -> Result<Self> {
        transform::eliminate_left_recursion(&mut grammar);
        transform::left_factor(&mut grammar);
        let first_sets = compute_first_sets(&grammar);
        let follow_sets = compute_follow_sets(&grammar, &first_sets);
        check_ll1(&grammar, &first_sets, &follow_sets)?;
        debug!(
            "recursive descent ready: {} productions",
            grammar.productions().len()
        );
        Ok(Self {
            grammar,
            first_sets,
            follow_sets,
        })
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn first_sets(&self) -> &FirstSets {
        &self.first_sets
    }

    pub fn follow_sets(&self) -> &FollowSets {
        &self.follow_sets
    }

    pub fn parse(&self, input: &str) -> ParseOutcome<TopDownStep> {
        let (tokens, _symbols) = Lexer::tokenize(input);
        self.parse_tokens(&tokens)
    }

    pub fn parse_tokens(&self, tokens: &[Token]) -> ParseOutcome<TopDownStep> {
        let tokens = ensure_end_terminated(tokens);
        let kinds: Vec<Symbol> = tokens
            .iter()
            .map(|t| self.grammar.terminal_of(t))
            .collect();
        let mut state = DescentState::new(&tokens, kinds);
        state.skip_invalid(&self.grammar);

        let matched = self.parse_non_terminal(self.grammar.start(), &mut state);

        if matched && !state.failed && !state.current().is_end() {
            let token = state.current().clone();
            state.diagnostics.trailing(&token);
        }

        if !state.diagnostics.has_errors() {
            state.record("accept".to_string());
        }

        ParseOutcome {
            accepted: !state.diagnostics.has_errors(),
            errors: state.diagnostics.into_errors(),
            steps: state.steps,
        }
    }

    fn parse_non_terminal(&self, non_terminal: &Symbol, state: &mut DescentState) -> bool {
        if state.failed {
            return false;
        }
        state.path.push(non_terminal.clone());

        let mut matched = false;
        for (_, production) in self.grammar.productions_of(non_terminal) {
            if production.is_epsilon() {
                continue;
            }
            let start_index = state.index;
            state.record(format!("check {production}"));

            let mut ok = true;
            for symbol in &production.rhs {
                if self.grammar.is_non_terminal(symbol) {
                    if !self.parse_non_terminal(symbol, state) {
                        ok = false;
                        break;
                    }
                } else if state.current_kind() == symbol {
                    state.match_terminal(&self.grammar, symbol);
                } else {
                    ok = false;
                    break;
                }
            }

            if ok {
                matched = true;
                break;
            }
            if state.failed {
                break;
            }
            if state.index != start_index {
                // tokens were consumed: committed, no backtracking
                let expected = self
                    .first_sets
                    .get(non_terminal)
                    .cloned()
                    .unwrap_or_default();
                let token = state.current().clone();
                state.diagnostics.unexpected(&token, &expected);
                state.failed = true;
                break;
            }
        }

        if !matched && !state.failed {
            let first = self.first_sets.get(non_terminal);
            if first.is_some_and(|f| f.contains(EPSILON)) {
                matched = true;
            } else {
                let expected = first.cloned().unwrap_or_default();
                let token = state.current().clone();
                state.diagnostics.unexpected(&token, &expected);
                state.failed = true;
            }
        }

        state.path.pop();
        matched
    }
}

/// Mutable walk state threaded through the recursion.
struct DescentState<'a> {
    tokens: &'a [Token],
    kinds: Vec<Symbol>,
    index: usize,
    matched: Vec<String>,
    path: Vec<Symbol>,
    steps: Vec<TopDownStep>,
    diagnostics: Diagnostics,
    failed: bool,
}

impl<'a> DescentState<'a> {
    fn new(tokens: &'a [Token], kinds: Vec<Symbol>) -> Self {
        Self {
            tokens,
            kinds,
            index: 0,
            matched: Vec::new(),
            path: Vec::new(),
            steps: Vec::new(),
            diagnostics: Diagnostics::new(),
            failed: false,
        }
    }

    fn current(&self) -> &Token {
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    fn current_kind(&self) -> &Symbol {
        &self.kinds[self.index.min(self.kinds.len() - 1)]
    }

    fn record(&mut self, action: String) {
        self.steps.push(TopDownStep {
            matched: self.matched.join(" "),
            stack: self
                .path
                .iter()
                .rev()
                .map(Symbol::as_str)
                .collect::<Vec<_>>()
                .join(" "),
            input: remaining_input(&self.kinds, self.index),
            action,
        });
    }

    fn match_terminal(&mut self, grammar: &Grammar, symbol: &Symbol) {
        self.matched.push(symbol.to_string());
        self.record(format!("match {symbol}"));
        self.index += 1;
        self.skip_invalid(grammar);
    }

    /// Reports and skips tokens whose kind is no terminal of the grammar;
    /// lexical errors never abort the walk.
    fn skip_invalid(&mut self, grammar: &Grammar) {
        loop {
            if self.current().is_end() || grammar.is_terminal(self.current_kind()) {
                break;
            }
            let token = self.current().clone();
            self.record(format!("error, skip '{}'.", token.kind));
            self.diagnostics.lexical(&token);
            self.index += 1;
        }
    }
}
