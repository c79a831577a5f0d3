//! End-to-end scenarios across all four parsers

use parselab::first_follow::{compute_first_sets, compute_follow_sets};
use parselab::grammar::Grammar;
use parselab::ll1::check_ll1;
use parselab::{Lalr1Parser, Ll1Parser, Lr1Parser, RecursiveDescentParser};

const EXPR: &str = "E -> E + T | T\nT -> T * F | F\nF -> ( E ) | id";
const PARENS: &str = "S -> ( S ) S | e";
const DRAGON: &str = "S -> C C\nC -> c C | d";

fn accepts_everywhere(grammar: &str, input: &str) -> bool {
    RecursiveDescentParser::from_text(grammar).unwrap().parse(input).accepted
        && Ll1Parser::from_text(grammar).unwrap().parse(input).accepted
        && Lr1Parser::from_text(grammar).unwrap().parse(input).accepted
        && Lalr1Parser::from_text(grammar).unwrap().parse(input).accepted
}

#[test]
fn test_expression_grammar_accepted_by_all_four_parsers() {
    assert!(accepts_everywhere(EXPR, "id + id * id"));
}

#[test]
fn test_ll1_parser_works_on_the_transformed_grammar() {
    let parser = Ll1Parser::from_text(EXPR).unwrap();
    let rules: Vec<String> = parser
        .grammar()
        .productions()
        .iter()
        .map(|p| p.to_string())
        .collect();
    assert_eq!(
        rules,
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
fn test_truncated_input_yields_one_end_of_input_error() {
    let ll1 = Ll1Parser::from_text(EXPR).unwrap().parse("id +");
    assert!(!ll1.accepted);
    assert_eq!(ll1.errors.len(), 1);
    assert!(ll1.errors[0].contains("end of input"));
    assert!(ll1.errors[0].ends_with("Column number: [4]"));

    let rd = RecursiveDescentParser::from_text(EXPR).unwrap().parse("id +");
    assert!(!rd.accepted);
    assert_eq!(rd.errors.len(), 1);
    assert!(rd.errors[0].contains("Unexpected end of input"));
    assert!(rd.errors[0].ends_with("Column number: [4]"));

    let lr1 = Lr1Parser::from_text(EXPR).unwrap().parse("id +");
    assert!(!lr1.accepted);
    assert_eq!(lr1.errors.len(), 1);
    assert!(lr1.errors[0].contains("Unexpected end of input"));
    assert!(lr1.errors[0].ends_with("Column number: [4]"));
}

#[test]
fn test_balanced_parentheses_scenario() {
    assert!(accepts_everywhere(PARENS, "( ( ) ( ) )"));
    assert!(accepts_everywhere(PARENS, ""));

    let lr1 = Lr1Parser::from_text(PARENS).unwrap();
    let lalr1 = Lalr1Parser::from_text(PARENS).unwrap();
    assert!(lr1.table().conflicts.is_empty());
    assert!(lalr1.table().conflicts.is_empty());
}

#[test]
fn test_dragon_book_scenario() {
    assert!(accepts_everywhere(DRAGON, "c c d d"));

    let lr1 = Lr1Parser::from_text(DRAGON).unwrap();
    let lalr1 = Lalr1Parser::from_text(DRAGON).unwrap();
    assert_eq!(lr1.automaton().state_count(), 10);
    assert_eq!(lalr1.automaton().state_count(), 7);
    assert!(lr1.table().conflicts.is_empty());
    assert!(lalr1.table().conflicts.is_empty());
}

#[test]
fn test_left_recursive_toy_grammar_scenario() {
    // the raw grammar fails the LL(1) property
    let raw = Grammar::parse("A -> A a | b").unwrap();
    let first_sets = compute_first_sets(&raw);
    let follow_sets = compute_follow_sets(&raw, &first_sets);
    assert!(check_ll1(&raw, &first_sets, &follow_sets).is_err());

    // the builders transform it and accept b a a
    let rd = RecursiveDescentParser::from_text("A -> A a | b").unwrap();
    let rules: Vec<String> = rd
        .grammar()
        .productions()
        .iter()
        .map(|p| p.to_string())
        .collect();
    assert_eq!(rules, vec!["A -> b A'", "A' -> a A'", "A' -> e"]);
    assert!(rd.parse("b a a").accepted);
    assert!(Ll1Parser::from_text("A -> A a | b").unwrap().parse("b a a").accepted);
}

#[test]
fn test_invalid_identifier_scenario() {
    let parser = Ll1Parser::from_text(EXPR).unwrap();
    let outcome = parser.parse("1abc + id");
    assert!(!outcome.accepted);
    assert_eq!(
        outcome.errors[0],
        "Lexical Error: Invalid token '<1abc>': Invalid identifier. Column number: [1]"
    );
    // parsing continued past the bad lexeme and found the next problem
    assert!(outcome.errors.len() > 1);
    assert!(outcome.errors[1].starts_with("Syntax Error:"));
}

#[test]
fn test_lexical_error_alone_still_rejects() {
    let parser = Ll1Parser::from_text(EXPR).unwrap();
    let outcome = parser.parse("id + 1abc");
    assert!(!outcome.accepted);
    assert_eq!(outcome.errors.len(), 2);
    assert!(outcome.errors[0].starts_with("Lexical Error:"));
    assert!(outcome.errors[1].contains("end of input"));
}

#[test]
fn test_parsers_are_deterministic() {
    let ll1 = Ll1Parser::from_text(EXPR).unwrap();
    let a = ll1.parse("id + ( id * id )");
    let b = ll1.parse("id + ( id * id )");
    assert_eq!(a.accepted, b.accepted);
    assert_eq!(a.errors, b.errors);
    assert_eq!(a.steps, b.steps);

    let lalr1 = Lalr1Parser::from_text(EXPR).unwrap();
    let a = lalr1.parse("id + ( id * id )");
    let b = lalr1.parse("id + ( id * id )");
    assert_eq!(a.accepted, b.accepted);
    assert_eq!(a.errors, b.errors);
    assert_eq!(a.steps, b.steps);
}

#[test]
fn test_sessions_are_independent() {
    let parser = Ll1Parser::from_text(EXPR).unwrap();
    let failing = parser.parse("id +");
    let passing = parser.parse("id");
    assert!(!failing.accepted);
    assert!(passing.accepted);
    assert!(passing.errors.is_empty());
}

#[test]
fn test_grammar_file_loading() {
    use std::io::Write;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, "{EXPR}").unwrap();
    let text = std::fs::read_to_string(file.path()).unwrap();
    let parser = Lr1Parser::from_text(&text).unwrap();
    assert!(parser.parse("id + id").accepted);
}
