//! FIRST and FOLLOW set computation.
//!
//! Both sets are computed by fixed-point iteration over the production
//! list. FIRST and FOLLOW depend cyclically on themselves for mutually
//! recursive non-terminals, so the sweeps repeat until nothing changes; a
//! single recursive pass would under-approximate.

use std::collections::{BTreeSet, HashMap};

use crate::grammar::Grammar;
use crate::symbol::{Symbol, EPSILON};

/// A sorted set of symbols. Sorted iteration keeps reports and table
/// layouts deterministic.
pub type SymbolSet = BTreeSet<Symbol>;

/// FIRST sets keyed by symbol. Terminals map to themselves; a non-terminal
/// maps to the terminals that can begin one of its derivations, plus
/// epsilon when it is nullable.
pub type FirstSets = HashMap<Symbol, SymbolSet>;

/// FOLLOW sets keyed by non-terminal.
pub type FollowSets = HashMap<Symbol, SymbolSet>;

/// Computes FIRST for every symbol of the grammar.
pub fn compute_first_sets(grammar: &Grammar) -> FirstSets {
    let mut first_sets: FirstSets = HashMap::new();

    for terminal in grammar.terminals() {
        first_sets.insert(terminal.clone(), BTreeSet::from([terminal.clone()]));
    }
    first_sets.insert(Symbol::epsilon(), BTreeSet::from([Symbol::epsilon()]));
    for non_terminal in grammar.non_terminals() {
        first_sets.entry(non_terminal.clone()).or_default();
    }

    let mut changed = true;
    while changed {
        changed = false;
        for production in grammar.productions() {
            let rhs_first = first_of_sequence(&first_sets, &production.rhs);
            let entry = first_sets.entry(production.lhs.clone()).or_default();
            let before = entry.len();
            entry.extend(rhs_first);
            if entry.len() != before {
                changed = true;
            }
        }
    }

    first_sets
}

/// FIRST of a symbol sequence: FIRST of the head without epsilon, extended
/// through every nullable prefix; epsilon belongs to the result only when
/// all symbols are nullable (vacuously for the empty sequence).
pub fn first_of_sequence(first_sets: &FirstSets, symbols: &[Symbol]) -> SymbolSet {
    let mut result = BTreeSet::new();
    let mut nullable = true;

    for symbol in symbols {
        let first = first_sets.get(symbol).cloned().unwrap_or_default();
        nullable = first.contains(EPSILON);
        result.extend(first.into_iter().filter(|s| !s.is_epsilon()));
        if !nullable {
            break;
        }
    }

    if nullable {
        result.insert(Symbol::epsilon());
    }
    result
}

/// Computes FOLLOW for every non-terminal. FOLLOW of the start symbol is
/// seeded with the end marker.
pub fn compute_follow_sets(grammar: &Grammar, first_sets: &FirstSets) -> FollowSets {
    let mut follow_sets: FollowSets = HashMap::new();
    for non_terminal in grammar.non_terminals() {
        follow_sets.insert(non_terminal.clone(), BTreeSet::new());
    }
    follow_sets
        .entry(grammar.start().clone())
        .or_default()
        .insert(Symbol::end_marker());

    let mut changed = true;
    while changed {
        changed = false;
        for production in grammar.productions() {
            for (i, symbol) in production.rhs.iter().enumerate() {
                if !grammar.is_non_terminal(symbol) {
                    continue;
                }

                let beta = &production.rhs[i + 1..];
                let first_beta = first_of_sequence(first_sets, beta);
                let mut additions: SymbolSet = first_beta
                    .iter()
                    .filter(|s| !s.is_epsilon())
                    .cloned()
                    .collect();
                if first_beta.contains(EPSILON) {
                    if let Some(follow_lhs) = follow_sets.get(&production.lhs) {
                        additions.extend(follow_lhs.iter().cloned());
                    }
                }

                let entry = follow_sets.entry(symbol.clone()).or_default();
                let before = entry.len();
                entry.extend(additions);
                if entry.len() != before {
                    changed = true;
                }
            }
        }
    }

    follow_sets
}
