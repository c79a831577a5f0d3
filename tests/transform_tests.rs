//! Unit tests for left-recursion elimination and left factoring

use parselab::grammar::Grammar;
use parselab::transform::{eliminate_left_recursion, left_factor};

fn rules(grammar: &Grammar) -> Vec<String> {
    grammar.productions().iter().map(|p| p.to_string()).collect()
}

#[test]
fn test_direct_left_recursion() {
    let mut grammar = Grammar::parse("A -> A a | b").unwrap();
    eliminate_left_recursion(&mut grammar);
    assert_eq!(rules(&grammar), vec!["A -> b A'", "A' -> a A'", "A' -> e"]);
}

#[test]
fn test_expression_grammar_transformation() {
    let mut grammar =
        Grammar::parse("E -> E + T | T\nT -> T * F | F\nF -> ( E ) | id").unwrap();
    eliminate_left_recursion(&mut grammar);
    left_factor(&mut grammar);
    assert_eq!(
        rules(&grammar),
        vec![
            "E -> T E'",
            "E' -> + T E'",
            "E' -> e",
            "T -> F T'",
            "T' -> * F T'",
            "T' -> e",
            "F -> ( E )",
            "F -> id",
        ]
    );
}

#[test]
fn test_indirect_left_recursion() {
    let mut grammar = Grammar::parse("S -> A a | b\nA -> S d").unwrap();
    eliminate_left_recursion(&mut grammar);
    assert_eq!(
        rules(&grammar),
        vec![
            "S -> A a",
            "S -> b",
            "A -> b d A'",
            "A' -> a d A'",
            "A' -> e",
        ]
    );
}

#[test]
fn test_no_left_recursive_production_remains() {
    let mut grammar = Grammar::parse("S -> S a | A b\nA -> A c | S d | x").unwrap();
    eliminate_left_recursion(&mut grammar);
    for production in grammar.productions() {
        assert_ne!(
            production.rhs.first(),
            Some(&production.lhs),
            "left-recursive production survived: {production}"
        );
    }
}

#[test]
fn test_left_recursion_elimination_is_idempotent() {
    let mut grammar =
        Grammar::parse("E -> E + T | T\nT -> T * F | F\nF -> ( E ) | id").unwrap();
    eliminate_left_recursion(&mut grammar);
    let once = rules(&grammar);
    eliminate_left_recursion(&mut grammar);
    assert_eq!(rules(&grammar), once);
}

#[test]
fn test_left_factoring_multiple_groups() {
    let mut grammar = Grammar::parse("A -> a b | a c | d x | d y").unwrap();
    left_factor(&mut grammar);
    assert_eq!(
        rules(&grammar),
        vec![
            "A -> a A^",
            "A -> d A^^",
            "A^ -> b",
            "A^ -> c",
            "A^^ -> x",
            "A^^ -> y",
        ]
    );
}

#[test]
fn test_left_factoring_epsilon_suffix() {
    let mut grammar = Grammar::parse("S -> i E t S | i E t S x S | a\nE -> b").unwrap();
    left_factor(&mut grammar);
    assert_eq!(
        rules(&grammar),
        vec![
            "S -> i E t S S^",
            "S -> a",
            "E -> b",
            "S^ -> e",
            "S^ -> x S",
        ]
    );
}

#[test]
fn test_left_factoring_is_idempotent() {
    let mut grammar = Grammar::parse("A -> a b c | a b d | a x").unwrap();
    left_factor(&mut grammar);
    let once = rules(&grammar);
    left_factor(&mut grammar);
    assert_eq!(rules(&grammar), once);
}

#[test]
fn test_no_common_prefix_remains_after_factoring() {
    let mut grammar = Grammar::parse("A -> a b c | a b d | a x | a").unwrap();
    left_factor(&mut grammar);
    for non_terminal in grammar.non_terminals() {
        let firsts: Vec<_> = grammar
            .productions()
            .iter()
            .filter(|p| p.lhs == *non_terminal)
            .filter_map(|p| p.rhs.first())
            .collect();
        let mut deduped = firsts.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(firsts.len(), deduped.len(), "shared prefix under {non_terminal}");
    }
}
