//! Per-step parse trace records and the published session outcome.
//!
//! Every driver appends one record per step until the session terminates;
//! the trace is never read or mutated mid-parse. The `input` column of each
//! record is recomputed from the unconsumed token suffix, so no two records
//! share state.

use crate::symbol::Symbol;

/// One step of a top-down parse (recursive descent or table-driven LL(1)):
/// the matched prefix, the prediction stack (top first), the remaining
/// input, and the action taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopDownStep {
    pub matched: String,
    pub stack: String,
    pub input: String,
    pub action: String,
}

/// One step of a bottom-up (LR) parse: the state stack and symbol stack
/// (bottom first), the remaining input, and the action taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BottomUpStep {
    pub states: String,
    pub symbols: String,
    pub input: String,
    pub action: String,
}

/// The published result of one parse session.
#[derive(Debug, Clone)]
pub struct ParseOutcome<S> {
    pub accepted: bool,
    pub errors: Vec<String>,
    pub steps: Vec<S>,
}

/// Renders the unconsumed token suffix starting at `index`, end marker
/// included. `kinds` are the tokens' effective terminal names.
pub(crate) fn remaining_input(kinds: &[Symbol], index: usize) -> String {
    kinds[index.min(kinds.len())..]
        .iter()
        .map(Symbol::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}
