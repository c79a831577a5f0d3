//! LL(1) analysis: the property check, the predictive parsing table with
//! synchronization entries, and the table-driven parser with panic-mode
//! recovery.

use std::collections::HashMap;

use log::debug;

use crate::diagnostics::Diagnostics;
use crate::error::{GrammarError, Result};
use crate::first_follow::{
    compute_first_sets, compute_follow_sets, first_of_sequence, FirstSets, FollowSets,
};
use crate::grammar::{Grammar, Production};
use crate::lexer::{ensure_end_terminated, Lexer, Token};
use crate::symbol::{Symbol, EPSILON};
use crate::trace::{remaining_input, ParseOutcome, TopDownStep};
use crate::transform;

/// A filled cell of the predictive table. Absent cells are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ll1Cell {
    /// Expand by the production with this index.
    Production(usize),
    /// Panic-mode synchronization point.
    Synch,
}

/// The predictive parsing table `M[non-terminal, terminal]`.
#[derive(Debug, Clone, Default)]
pub struct Ll1Table {
    cells: HashMap<(Symbol, Symbol), Ll1Cell>,
}

impl Ll1Table {
    /// Fills the table: production entries over FIRST of each right-hand
    /// side (FOLLOW of the left-hand side for nullable ones), then
    /// synchronization markers on the remaining FOLLOW cells.
    pub fn build(grammar: &Grammar, first_sets: &FirstSets, follow_sets: &FollowSets) -> Self {
        let mut cells = HashMap::new();

        for (index, production) in grammar.productions().iter().enumerate() {
            let first_alpha = first_of_sequence(first_sets, &production.rhs);
            for symbol in first_alpha.iter().filter(|s| !s.is_epsilon()) {
                cells.insert(
                    (production.lhs.clone(), symbol.clone()),
                    Ll1Cell::Production(index),
                );
            }
            if first_alpha.contains(EPSILON) {
                if let Some(follow) = follow_sets.get(&production.lhs) {
                    for symbol in follow {
                        cells.insert(
                            (production.lhs.clone(), symbol.clone()),
                            Ll1Cell::Production(index),
                        );
                    }
                }
            }
        }

        for non_terminal in grammar.non_terminals() {
            if let Some(follow) = follow_sets.get(non_terminal) {
                for symbol in follow {
                    cells
                        .entry((non_terminal.clone(), symbol.clone()))
                        .or_insert(Ll1Cell::Synch);
                }
            }
        }

        Self { cells }
    }

    pub fn get(&self, non_terminal: &Symbol, terminal: &Symbol) -> Option<&Ll1Cell> {
        self.cells.get(&(non_terminal.clone(), terminal.clone()))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Verifies the LL(1) property: for every pair of alternatives of one
/// non-terminal the FIRST sets are disjoint, and a nullable alternative's
/// sibling keeps FIRST disjoint from FOLLOW of the left-hand side.
pub fn check_ll1(
    grammar: &Grammar,
    first_sets: &FirstSets,
    follow_sets: &FollowSets,
) -> Result<()> {
    let productions = grammar.productions();
    let conflict = |a: &Production, b: &Production| GrammarError::Ll1Conflict {
        prod1: a.to_string(),
        prod2: b.to_string(),
    };

    for i in 0..productions.len() {
        for j in i + 1..productions.len() {
            if productions[i].lhs != productions[j].lhs
                || productions[i].rhs == productions[j].rhs
            {
                continue;
            }
            let first_i = first_of_sequence(first_sets, &productions[i].rhs);
            let first_j = first_of_sequence(first_sets, &productions[j].rhs);
            if first_i.intersection(&first_j).next().is_some() {
                return Err(conflict(&productions[i], &productions[j]));
            }
            if let Some(follow) = follow_sets.get(&productions[i].lhs) {
                if first_i.contains(EPSILON) && first_j.intersection(follow).next().is_some() {
                    return Err(conflict(&productions[i], &productions[j]));
                }
                if first_j.contains(EPSILON) && first_i.intersection(follow).next().is_some() {
                    return Err(conflict(&productions[i], &productions[j]));
                }
            }
        }
    }
    Ok(())
}

/// Table-driven LL(1) predictive parser.
#[derive(Debug)]
pub struct Ll1Parser {
    grammar: Grammar,
    first_sets: FirstSets,
    follow_sets: FollowSets,
    table: Ll1Table,
}

impl Ll1Parser {
    /// Loads the grammar text, normalizes it (left-recursion elimination
    /// followed by left factoring), checks the LL(1) property, and builds
    /// the table. A grammar that is not LL(1) after normalization is
    /// rejected here, before any input is parsed.
    pub fn from_text(grammar_text: &str) -> Result<Self> {
        Self::from_grammar(Grammar::parse(grammar_text)?)
    }

    pub fn from_grammar(mut grammar: Grammar) -> Result<Self> {
        transform::eliminate_left_recursion(&mut grammar);
        transform::left_factor(&mut grammar);
        let first_sets = compute_first_sets(&grammar);
        let follow_sets = compute_follow_sets(&grammar, &first_sets);
        check_ll1(&grammar, &first_sets, &follow_sets)?;
        let table = Ll1Table::build(&grammar, &first_sets, &follow_sets);
        debug!(
            "LL(1) table built: {} productions, {} cells",
            grammar.productions().len(),
            table.len()
        );
        Ok(Self {
            grammar,
            first_sets,
            follow_sets,
            table,
        })
    }

    /// The normalized grammar the table was built from.
    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn first_sets(&self) -> &FirstSets {
        &self.first_sets
    }

    pub fn follow_sets(&self) -> &FollowSets {
        &self.follow_sets
    }

    pub fn table(&self) -> &Ll1Table {
        &self.table
    }

    /// Lexes the input and runs the table driver over the token stream.
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
        let last = tokens.len() - 1;

        let mut diagnostics = Diagnostics::new();
        let mut steps: Vec<TopDownStep> = Vec::new();
        let mut stack: Vec<Symbol> = vec![Symbol::end_marker(), self.grammar.start().clone()];
        let mut matched: Vec<String> = Vec::new();
        let mut index = 0usize;

        loop {
            let token = &tokens[index.min(last)];
            let lookahead = kinds[index.min(last)].clone();
            let top = stack.last().cloned().unwrap_or_else(Symbol::end_marker);

            if top.is_end_marker() && lookahead.is_end_marker() {
                steps.push(TopDownStep {
                    matched: matched.join(" "),
                    stack: render_stack(&stack),
                    input: remaining_input(&kinds, index),
                    action: if diagnostics.has_errors() {
                        String::new()
                    } else {
                        "accept".to_string()
                    },
                });
                break;
            }

            let mut step = TopDownStep {
                matched: matched.join(" "),
                stack: render_stack(&stack),
                input: remaining_input(&kinds, index),
                action: String::new(),
            };

            // lexical errors never stop the parse; the token is skipped
            if !self.grammar.is_terminal(&lookahead) {
                step.action = format!("error, skip '{}'.", token.kind);
                diagnostics.lexical(token);
                steps.push(step);
                index += 1;
                continue;
            }

            if top == lookahead {
                step.action = format!("match {top}");
                matched.push(top.to_string());
                stack.pop();
                steps.push(step);
                index += 1;
                continue;
            }

            if !self.grammar.is_non_terminal(&top) {
                if top.is_end_marker() {
                    // the stack is exhausted but input remains
                    step.action = "error".to_string();
                    diagnostics.expected_end(token);
                    steps.push(step);
                    break;
                }
                step.action = format!("error, '{top}' has been popped.");
                stack.pop();
                if token.is_end() {
                    diagnostics.unexpected_end(token.column);
                } else {
                    diagnostics.expected_end(token);
                }
                steps.push(step);
                continue;
            }

            match self.table.get(&top, &lookahead) {
                Some(Ll1Cell::Production(i)) => {
                    let production = &self.grammar.productions()[*i];
                    step.action = format!("output {production}");
                    stack.pop();
                    for symbol in production.rhs.iter().rev() {
                        stack.push(symbol.clone());
                    }
                    steps.push(step);
                }
                Some(Ll1Cell::Synch) => {
                    let first_top = self.first_sets.get(&top).cloned().unwrap_or_default();
                    stack.pop();
                    let at_bottom = stack.last().map_or(true, Symbol::is_end_marker);
                    if at_bottom {
                        // restore and skip input until FIRST(top) reappears
                        stack.push(top.clone());
                        diagnostics.unexpected(token, &first_top);
                        let mut skipped = Vec::new();
                        while index < last && !first_top.contains(kinds[index].as_str()) {
                            skipped.push(format!("'{}'", kinds[index]));
                            index += 1;
                        }
                        let landed = &kinds[index.min(last)];
                        let recovered = first_top.contains(landed.as_str());
                        step.action = format!(
                            "error, skip {}. '{landed}' is in FIRST({top})",
                            skipped.join(", ")
                        );
                        steps.push(step);
                        if !recovered {
                            // ran off the end while skipping
                            break;
                        }
                    } else {
                        step.action = format!(
                            "error, M[{top},{lookahead}] = synch. '{top}' has been popped."
                        );
                        diagnostics.missing(&Diagnostics::expected_list(&first_top), token);
                        steps.push(step);
                    }
                }
                None => {
                    let first_top = self.first_sets.get(&top).cloned().unwrap_or_default();
                    diagnostics.unexpected(token, &first_top);
                    if token.is_end() {
                        step.action = "error".to_string();
                        steps.push(step);
                        break;
                    }
                    step.action = format!("error, skip '{lookahead}'.");
                    steps.push(step);
                    index += 1;
                }
            }
        }

        ParseOutcome {
            accepted: !diagnostics.has_errors(),
            errors: diagnostics.into_errors(),
            steps,
        }
    }
}

fn render_stack(stack: &[Symbol]) -> String {
    stack
        .iter()
        .rev()
        .map(Symbol::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}
