//! Canonical LR(1) construction and the shift-reduce driver.
//!
//! The automaton is built over an augmented grammar (`S' -> S` prepended by
//! the loader): closure expands items through FIRST-of-the-tail lookaheads,
//! GOTO advances the dot, and a worklist grows the canonical collection,
//! assigning each new state the next integer id. The ACTION/GOTO table and
//! the driver are shared with the LALR(1) parser, which only swaps in a
//! merged automaton.

use std::collections::{BTreeSet, HashMap, VecDeque};

use indexmap::IndexMap;
use itertools::Itertools;
use log::debug;

use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::first_follow::{compute_first_sets, first_of_sequence, FirstSets};
use crate::grammar::Grammar;
use crate::lexer::{ensure_end_terminated, Lexer, Token};
use crate::symbol::{Symbol, EPSILON};
use crate::trace::{remaining_input, BottomUpStep, ParseOutcome};

pub type StateId = usize;

/// An LR(1) item: a production, a dot position, and a lookahead set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LrItem {
    pub production: usize,
    pub dot: usize,
    pub lookaheads: BTreeSet<Symbol>,
}

impl LrItem {
    /// The item's core: production and dot, lookaheads ignored. Two states
    /// whose items agree core-for-core merge under LALR(1).
    #[inline]
    pub fn core(&self) -> (usize, usize) {
        (self.production, self.dot)
    }

    /// The symbol right after the dot, if the item is not complete.
    pub fn next_symbol<'g>(&self, grammar: &'g Grammar) -> Option<&'g Symbol> {
        grammar.productions()[self.production].rhs.get(self.dot)
    }

    /// Whether the dot has reached the end (a reduce item).
    pub fn is_complete(&self, grammar: &Grammar) -> bool {
        self.dot >= grammar.productions()[self.production].rhs.len()
    }

    /// `[A -> a . b, x / y]`
    pub fn display(&self, grammar: &Grammar) -> String {
        let production = &grammar.productions()[self.production];
        let mut parts: Vec<String> = production
            .rhs
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();
        parts.insert(self.dot.min(parts.len()), ".".to_string());
        format!(
            "[{} -> {}, {}]",
            production.lhs,
            parts.join(" "),
            self.lookaheads.iter().join(" / ")
        )
    }
}

/// A state of the automaton: a closed item set with an integer id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LrState {
    pub id: StateId,
    pub items: Vec<LrItem>,
}

impl LrState {
    /// Reduce items of the state, in item order.
    pub fn reduce_items<'a>(
        &'a self,
        grammar: &'a Grammar,
    ) -> impl Iterator<Item = &'a LrItem> + 'a {
        self.items.iter().filter(|item| item.is_complete(grammar))
    }

    /// The state's core as a sorted list of (production, dot) pairs.
    pub fn core(&self) -> Vec<(usize, usize)> {
        self.items.iter().map(LrItem::core).collect()
    }
}

/// The canonical collection and its transition map.
#[derive(Debug, Clone)]
pub struct LrAutomaton {
    pub states: Vec<LrState>,
    pub goto_map: IndexMap<(StateId, Symbol), StateId>,
}

impl LrAutomaton {
    /// Builds the canonical LR(1) collection from the augmented grammar.
    pub fn build(grammar: &Grammar, first_sets: &FirstSets) -> Self {
        let start_item = LrItem {
            production: 0,
            dot: 0,
            lookaheads: BTreeSet::from([Symbol::end_marker()]),
        };
        let start = closure(grammar, first_sets, vec![start_item]);

        let mut states = vec![LrState {
            id: 0,
            items: start,
        }];
        let mut goto_map: IndexMap<(StateId, Symbol), StateId> = IndexMap::new();
        let mut queue: VecDeque<StateId> = VecDeque::from([0]);

        let symbols: BTreeSet<Symbol> = grammar
            .non_terminals()
            .iter()
            .chain(grammar.terminals().iter())
            .filter(|s| !s.is_end_marker())
            .cloned()
            .collect();

        while let Some(id) = queue.pop_front() {
            for symbol in &symbols {
                let moved = goto_items(grammar, first_sets, &states[id].items, symbol);
                if moved.is_empty() {
                    continue;
                }
                if let Some(existing) = states.iter().position(|s| s.items == moved) {
                    goto_map.insert((id, symbol.clone()), existing);
                } else {
                    let next = states.len();
                    states.push(LrState {
                        id: next,
                        items: moved,
                    });
                    goto_map.insert((id, symbol.clone()), next);
                    queue.push_back(next);
                }
            }
        }

        debug!(
            "canonical LR(1) collection: {} states, {} transitions",
            states.len(),
            goto_map.len()
        );
        Self { states, goto_map }
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }
}

/// Merges an item into the set: lookaheads union onto an existing core,
/// otherwise the item is appended. Returns true when anything changed.
fn merge_item(
    items: &mut Vec<LrItem>,
    production: usize,
    dot: usize,
    lookaheads: &BTreeSet<Symbol>,
) -> bool {
    for item in items.iter_mut() {
        if item.production == production && item.dot == dot {
            let before = item.lookaheads.len();
            item.lookaheads.extend(lookaheads.iter().cloned());
            return item.lookaheads.len() != before;
        }
    }
    items.push(LrItem {
        production,
        dot,
        lookaheads: lookaheads.clone(),
    });
    true
}

/// Closure of a kernel: for every `A -> a . B b, la` and production
/// `B -> g`, the item `B -> . g` joins the set with lookaheads
/// FIRST(b la), repeating until the set is stable.
fn closure(grammar: &Grammar, first_sets: &FirstSets, kernel: Vec<LrItem>) -> Vec<LrItem> {
    let mut items: Vec<LrItem> = Vec::new();
    for item in kernel {
        merge_item(&mut items, item.production, item.dot, &item.lookaheads);
    }

    let mut changed = true;
    while changed {
        changed = false;
        let mut index = 0;
        while index < items.len() {
            let item = items[index].clone();
            index += 1;

            let Some(next) = item.next_symbol(grammar) else {
                continue;
            };
            if !grammar.is_non_terminal(next) {
                continue;
            }
            let next = next.clone();

            let beta = &grammar.productions()[item.production].rhs[item.dot + 1..];
            let first_beta = first_of_sequence(first_sets, beta);
            let mut lookaheads: BTreeSet<Symbol> = first_beta
                .iter()
                .filter(|s| !s.is_epsilon())
                .cloned()
                .collect();
            if first_beta.contains(EPSILON) {
                lookaheads.extend(item.lookaheads.iter().cloned());
            }

            for (production, _) in grammar.productions_of(&next) {
                if merge_item(&mut items, production, 0, &lookaheads) {
                    changed = true;
                }
            }
        }
    }

    items.sort_by_key(LrItem::core);
    items
}

/// GOTO: the closure of every item of `items` whose dot sits before
/// `symbol`, with the dot advanced.
fn goto_items(
    grammar: &Grammar,
    first_sets: &FirstSets,
    items: &[LrItem],
    symbol: &Symbol,
) -> Vec<LrItem> {
    let kernel: Vec<LrItem> = items
        .iter()
        .filter(|item| item.next_symbol(grammar) == Some(symbol))
        .map(|item| LrItem {
            production: item.production,
            dot: item.dot + 1,
            lookaheads: item.lookaheads.clone(),
        })
        .collect();
    if kernel.is_empty() {
        return Vec::new();
    }
    closure(grammar, first_sets, kernel)
}

/// One ACTION cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Shift(StateId),
    Reduce(usize),
    Accept,
}

impl Action {
    fn describe(&self, grammar: &Grammar) -> String {
        match self {
            Action::Shift(state) => format!("shift {state}"),
            Action::Reduce(production) => {
                format!("reduce {}", grammar.productions()[*production])
            }
            Action::Accept => "accept".to_string(),
        }
    }
}

/// ACTION/GOTO table. Absent cells are errors. Conflicting writes are
/// recorded rather than masked: the table keeps the last write (shifts are
/// written after reduces, so a shift wins a shift-reduce cell), and every
/// overwrite of a different action lands in `conflicts`.
#[derive(Debug, Clone, Default)]
pub struct LrTable {
    pub actions: HashMap<(StateId, Symbol), Action>,
    pub gotos: HashMap<(StateId, Symbol), StateId>,
    pub conflicts: Vec<String>,
}

impl LrTable {
    pub fn build(grammar: &Grammar, automaton: &LrAutomaton) -> Self {
        let mut table = Self::default();

        for state in &automaton.states {
            for item in state.reduce_items(grammar) {
                let production = &grammar.productions()[item.production];
                if production.lhs == *grammar.start() {
                    table.set_action(grammar, state.id, Symbol::end_marker(), Action::Accept);
                } else {
                    // with duplicate productions the first occurrence wins
                    let index = grammar
                        .production_index(&production.lhs, &production.rhs)
                        .unwrap_or(item.production);
                    for lookahead in &item.lookaheads {
                        table.set_action(
                            grammar,
                            state.id,
                            lookahead.clone(),
                            Action::Reduce(index),
                        );
                    }
                }
            }
        }

        for ((state, symbol), target) in &automaton.goto_map {
            if grammar.is_terminal(symbol) {
                table.set_action(grammar, *state, symbol.clone(), Action::Shift(*target));
            } else if symbol != grammar.start() {
                table.gotos.insert((*state, symbol.clone()), *target);
            }
        }

        if !table.conflicts.is_empty() {
            debug!("LR table built with {} conflicts", table.conflicts.len());
        }
        table
    }

    fn set_action(&mut self, grammar: &Grammar, state: StateId, symbol: Symbol, action: Action) {
        if let Some(existing) = self.actions.get(&(state, symbol.clone())) {
            if *existing != action {
                self.conflicts.push(format!(
                    "conflict in state {state} on '{symbol}': {} vs {}",
                    existing.describe(grammar),
                    action.describe(grammar)
                ));
            }
        }
        self.actions.insert((state, symbol), action);
    }

    /// Terminals with a non-error cell in the given row, in sorted order.
    pub fn expected_in(&self, state: StateId) -> BTreeSet<Symbol> {
        self.actions
            .keys()
            .filter(|(s, _)| *s == state)
            .map(|(_, symbol)| symbol.clone())
            .collect()
    }
}

/// Shift-reduce driver shared by the canonical LR(1) and LALR(1) parsers.
pub(crate) fn run_lr(
    grammar: &Grammar,
    table: &LrTable,
    tokens: &[Token],
) -> ParseOutcome<BottomUpStep> {
    let tokens = ensure_end_terminated(tokens);
    let kinds: Vec<Symbol> = tokens.iter().map(|t| grammar.terminal_of(t)).collect();
    let last = tokens.len() - 1;

    let mut diagnostics = Diagnostics::new();
    let mut steps: Vec<BottomUpStep> = Vec::new();
    let mut state_stack: Vec<StateId> = vec![0];
    let mut symbol_stack: Vec<Symbol> = Vec::new();
    let mut index = 0usize;
    let mut reached_accept = false;

    loop {
        let token = &tokens[index.min(last)];
        let lookahead = kinds[index.min(last)].clone();
        let state = state_stack.last().copied().unwrap_or(0);

        let mut step = BottomUpStep {
            states: state_stack.iter().map(|s| s.to_string()).join(" "),
            symbols: symbol_stack.iter().map(Symbol::as_str).join(" "),
            input: remaining_input(&kinds, index),
            action: String::new(),
        };

        if !grammar.is_terminal(&lookahead) {
            step.action = format!("error, skip '{}'.", token.kind);
            diagnostics.lexical(token);
            steps.push(step);
            index += 1;
            continue;
        }

        match table.actions.get(&(state, lookahead.clone())) {
            Some(Action::Accept) => {
                step.action = "accept".to_string();
                steps.push(step);
                reached_accept = true;
                break;
            }
            Some(Action::Shift(target)) => {
                step.action = "shift".to_string();
                state_stack.push(*target);
                symbol_stack.push(lookahead);
                steps.push(step);
                index += 1;
            }
            Some(Action::Reduce(production)) => {
                let production = &grammar.productions()[*production];
                step.action = format!("reduce by {production}");
                for _ in 0..production.rhs.len() {
                    state_stack.pop();
                    symbol_stack.pop();
                }
                let uncovered = state_stack.last().copied().unwrap_or(0);
                match table.gotos.get(&(uncovered, production.lhs.clone())) {
                    Some(target) => {
                        state_stack.push(*target);
                        symbol_stack.push(production.lhs.clone());
                        steps.push(step);
                    }
                    None => {
                        // a conflicted table can strand a reduction
                        step.action = "error".to_string();
                        report_error(&mut diagnostics, table, uncovered, token);
                        steps.push(step);
                        break;
                    }
                }
            }
            None => {
                step.action = "error".to_string();
                report_error(&mut diagnostics, table, state, token);
                steps.push(step);
                break;
            }
        }
    }

    ParseOutcome {
        accepted: reached_accept && !diagnostics.has_errors(),
        errors: diagnostics.into_errors(),
        steps,
    }
}

fn report_error(diagnostics: &mut Diagnostics, table: &LrTable, state: StateId, token: &Token) {
    let expected = table.expected_in(state);
    if expected.is_empty() {
        if token.is_end() {
            diagnostics.unexpected_end(token.column);
        } else {
            diagnostics.unexpected_expecting_end(token);
        }
    } else {
        diagnostics.unexpected(token, &expected);
    }
}

/// Canonical LR(1) parser.
#[derive(Debug)]
pub struct Lr1Parser {
    grammar: Grammar,
    first_sets: FirstSets,
    automaton: LrAutomaton,
    table: LrTable,
}

impl Lr1Parser {
    /// Loads and augments the grammar, builds the canonical collection and
    /// the ACTION/GOTO table. FIRST sets are computed by fixed point, so
    /// left-recursive grammars need no rewriting here.
    pub fn from_text(grammar_text: &str) -> Result<Self> {
        Self::from_grammar(Grammar::parse_augmented(grammar_text)?)
    }

    /// Expects an already augmented grammar.
    pub fn from_grammar(grammar: Grammar) -> Result<Self> {
        let first_sets = compute_first_sets(&grammar);
        let automaton = LrAutomaton::build(&grammar, &first_sets);
        let table = LrTable::build(&grammar, &automaton);
        for conflict in &table.conflicts {
            log::warn!("LR(1) {conflict}");
        }
        Ok(Self {
            grammar,
            first_sets,
            automaton,
            table,
        })
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn first_sets(&self) -> &FirstSets {
        &self.first_sets
    }

    pub fn automaton(&self) -> &LrAutomaton {
        &self.automaton
    }

    pub fn table(&self) -> &LrTable {
        &self.table
    }

    pub fn parse(&self, input: &str) -> ParseOutcome<BottomUpStep> {
        let (tokens, _symbols) = Lexer::tokenize(input);
        self.parse_tokens(&tokens)
    }

    pub fn parse_tokens(&self, tokens: &[Token]) -> ParseOutcome<BottomUpStep> {
        run_lr(&self.grammar, &self.table, tokens)
    }
}
