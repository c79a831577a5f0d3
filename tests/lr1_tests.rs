//! Unit tests for canonical LR(1) construction and the shift-reduce driver

use parselab::lr1::{Action, Lr1Parser};
use parselab::symbol::Symbol;

const EXPR: &str = "E -> E + T | T\nT -> T * F | F\nF -> ( E ) | id";

#[test]
fn test_grammar_is_augmented() {
    let parser = Lr1Parser::from_text(EXPR).unwrap();
    assert_eq!(parser.grammar().start().as_str(), "E'");
    assert_eq!(parser.grammar().productions()[0].to_string(), "E' -> E");
}

#[test]
fn test_start_state_contains_all_reachable_items() {
    let parser = Lr1Parser::from_text("S -> C C\nC -> c C | d").unwrap();
    let start = &parser.automaton().states[0];
    // S' -> . S, S -> . C C, C -> . c C, C -> . d
    assert_eq!(start.items.len(), 4);
    assert_eq!(start.items[0].display(parser.grammar()), "[S' -> . S, $]");
    // the C items carry FIRST(C) lookaheads from the closure
    assert_eq!(start.items[2].display(parser.grammar()), "[C -> . c C, c / d]");
}

#[test]
fn test_dragon_book_canonical_collection_has_ten_states() {
    let parser = Lr1Parser::from_text("S -> C C\nC -> c C | d").unwrap();
    assert_eq!(parser.automaton().state_count(), 10);
    assert!(parser.table().conflicts.is_empty());
}

#[test]
fn test_goto_map_covers_start_state_transitions() {
    let parser = Lr1Parser::from_text("S -> C C\nC -> c C | d").unwrap();
    let goto_map = &parser.automaton().goto_map;
    for symbol in ["S", "C", "c", "d"] {
        assert!(
            goto_map.contains_key(&(0, Symbol::new(symbol))),
            "missing transition from state 0 over {symbol}"
        );
    }
    assert!(!goto_map.contains_key(&(0, Symbol::end_marker())));
}

#[test]
fn test_accept_cell_sits_on_the_augmented_item() {
    let parser = Lr1Parser::from_text("S -> C C\nC -> c C | d").unwrap();
    let accept_state = parser.automaton().goto_map[&(0, Symbol::new("S"))];
    assert_eq!(
        parser.table().actions.get(&(accept_state, Symbol::end_marker())),
        Some(&Action::Accept)
    );
}

#[test]
fn test_reduce_cells_follow_item_lookaheads() {
    let parser = Lr1Parser::from_text("S -> C C\nC -> c C | d").unwrap();
    let grammar = parser.grammar();
    let d_state = parser.automaton().goto_map[&(0, Symbol::new("d"))];
    let reduce_index = grammar
        .production_index(&Symbol::new("C"), &[Symbol::new("d")])
        .unwrap();
    // in the first d-state the lookaheads are c and d, not $
    assert_eq!(
        parser.table().actions.get(&(d_state, Symbol::new("c"))),
        Some(&Action::Reduce(reduce_index))
    );
    assert_eq!(
        parser.table().actions.get(&(d_state, Symbol::new("d"))),
        Some(&Action::Reduce(reduce_index))
    );
    assert_eq!(
        parser.table().actions.get(&(d_state, Symbol::end_marker())),
        None
    );
}

#[test]
fn test_expression_inputs() {
    let parser = Lr1Parser::from_text(EXPR).unwrap();
    for input in ["id", "id + id * id", "( id )", "( id + id ) * id"] {
        let outcome = parser.parse(input);
        assert!(outcome.accepted, "should accept {input:?}: {:?}", outcome.errors);
    }
    for input in ["", "id +", "+ id", "id id", "( id"] {
        assert!(!parser.parse(input).accepted, "should reject {input:?}");
    }
}

#[test]
fn test_error_reports_expected_set_from_table_row() {
    let parser = Lr1Parser::from_text(EXPR).unwrap();
    let outcome = parser.parse("id +");
    assert!(!outcome.accepted);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(
        outcome.errors[0],
        "Syntax Error: Unexpected end of input. Expected one of: '(' or 'id'. Column number: [4]"
    );
    assert_eq!(outcome.steps.last().map(|s| s.action.as_str()), Some("error"));
}

#[test]
fn test_trace_records_shift_reduce_accept() {
    let parser = Lr1Parser::from_text("S -> C C\nC -> c C | d").unwrap();
    let outcome = parser.parse("d d");
    assert!(outcome.accepted);
    let actions: Vec<&str> = outcome.steps.iter().map(|s| s.action.as_str()).collect();
    assert_eq!(
        actions,
        vec![
            "shift",
            "reduce by C -> d",
            "shift",
            "reduce by C -> d",
            "reduce by S -> C C",
            "accept",
        ]
    );
    assert_eq!(outcome.steps[0].states, "0");
    assert_eq!(outcome.steps[0].input, "d d $");
}

#[test]
fn test_lexical_errors_skip_and_abort_later() {
    let parser = Lr1Parser::from_text(EXPR).unwrap();
    let outcome = parser.parse("id + 1abc id");
    assert!(!outcome.accepted);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(
        outcome.errors[0],
        "Lexical Error: Invalid token '<1abc>': Invalid identifier. Column number: [6]"
    );
}

#[test]
fn test_duplicate_productions_reduce_to_first_index() {
    let parser = Lr1Parser::from_text("S -> a\nS -> a").unwrap();
    // both duplicates resolve to the same reduce index, so no conflict
    assert!(parser.table().conflicts.is_empty());
    assert!(parser.parse("a").accepted);
    let reduce_cells: Vec<Action> = parser
        .table()
        .actions
        .values()
        .filter(|a| matches!(a, Action::Reduce(_)))
        .copied()
        .collect();
    assert!(reduce_cells.iter().all(|a| *a == Action::Reduce(1)));
}

#[test]
fn test_non_lr1_grammar_reports_conflicts() {
    // ambiguous: both alternatives derive the same sentence
    let parser = Lr1Parser::from_text("S -> A | B\nA -> x\nB -> x").unwrap();
    assert!(!parser.table().conflicts.is_empty());
}
