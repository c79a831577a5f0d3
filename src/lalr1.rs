//! LALR(1): canonical LR(1) states with equal cores merged.
//!
//! Merging unions the lookaheads kernel-by-kernel and rewrites the
//! transition map onto the merged ids. Shift and goto transitions are
//! always preserved; what merging can introduce are reduce-reduce
//! conflicts, which the table records without masking (the emitted table
//! resolves them last-write-wins).

use log::debug;

use crate::error::Result;
use crate::first_follow::{compute_first_sets, FirstSets};
use crate::grammar::Grammar;
use crate::lexer::{Lexer, Token};
use crate::lr1::{run_lr, LrAutomaton, LrState, LrTable, StateId};
use crate::trace::{BottomUpStep, ParseOutcome};

use indexmap::IndexMap;

/// Partitions the canonical collection by item core and merges each
/// partition into one state, in order of first appearance.
pub fn merge_states(automaton: &LrAutomaton) -> LrAutomaton {
    let mut core_ids: IndexMap<Vec<(usize, usize)>, StateId> = IndexMap::new();
    let mut merged: Vec<LrState> = Vec::new();
    let mut remap: Vec<StateId> = Vec::with_capacity(automaton.states.len());

    for state in &automaton.states {
        match core_ids.entry(state.core()) {
            indexmap::map::Entry::Occupied(entry) => {
                let id = *entry.get();
                // same core, same item order: union lookaheads pairwise
                for (target, source) in merged[id].items.iter_mut().zip(&state.items) {
                    target.lookaheads.extend(source.lookaheads.iter().cloned());
                }
                remap.push(id);
            }
            indexmap::map::Entry::Vacant(entry) => {
                let id = merged.len();
                entry.insert(id);
                merged.push(LrState {
                    id,
                    items: state.items.clone(),
                });
                remap.push(id);
            }
        }
    }

    let mut goto_map = IndexMap::new();
    for ((state, symbol), target) in &automaton.goto_map {
        goto_map.insert((remap[*state], symbol.clone()), remap[*target]);
    }

    debug!(
        "LALR(1) merge: {} states down to {}",
        automaton.states.len(),
        merged.len()
    );
    LrAutomaton {
        states: merged,
        goto_map,
    }
}

/// LALR(1) parser: the canonical collection merged by core, driven by the
/// same shift-reduce loop as the canonical parser.
#[derive(Debug)]
pub struct Lalr1Parser {
    grammar: Grammar,
    first_sets: FirstSets,
    canonical: LrAutomaton,
    automaton: LrAutomaton,
    table: LrTable,
}

impl Lalr1Parser {
    pub fn from_text(grammar_text: &str) -> Result<Self> {
        Self::from_grammar(Grammar::parse_augmented(grammar_text)?)
    }

    /// Expects an already augmented grammar.
    pub fn from_grammar(grammar: Grammar) -> Result<Self> {
        let first_sets = compute_first_sets(&grammar);
        let canonical = LrAutomaton::build(&grammar, &first_sets);
        let automaton = merge_states(&canonical);
        let table = LrTable::build(&grammar, &automaton);
        for conflict in &table.conflicts {
            log::warn!("LALR(1) {conflict}");
        }
        Ok(Self {
            grammar,
            first_sets,
            canonical,
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

    /// The unmerged canonical LR(1) collection.
    pub fn canonical(&self) -> &LrAutomaton {
        &self.canonical
    }

    /// The merged collection the table is built over.
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
