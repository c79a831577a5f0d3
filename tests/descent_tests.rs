//! Unit tests for the recursive-descent parser

use parselab::RecursiveDescentParser;

const EXPR: &str = "E -> E + T | T\nT -> T * F | F\nF -> ( E ) | id";

#[test]
fn test_builder_normalizes_left_recursion() {
    let parser = RecursiveDescentParser::from_text("A -> A a | b").unwrap();
    let rules: Vec<String> = parser
        .grammar()
        .productions()
        .iter()
        .map(|p| p.to_string())
        .collect();
    assert_eq!(rules, vec!["A -> b A'", "A' -> a A'", "A' -> e"]);
    assert!(parser.parse("b a a").accepted);
    assert!(parser.parse("b").accepted);
    assert!(!parser.parse("a b").accepted);
}

#[test]
fn test_non_ll1_grammar_is_reported_before_parsing() {
    assert!(RecursiveDescentParser::from_text("S -> A | B\nA -> id\nB -> id").is_err());
}

#[test]
fn test_expression_inputs() {
    let parser = RecursiveDescentParser::from_text(EXPR).unwrap();
    for input in ["id", "id + id * id", "( id )", "( id + id ) * id"] {
        let outcome = parser.parse(input);
        assert!(outcome.accepted, "should accept {input:?}: {:?}", outcome.errors);
    }
    for input in ["", "id +", "+ id", "( id"] {
        assert!(!parser.parse(input).accepted, "should reject {input:?}");
    }
}

#[test]
fn test_error_cites_first_set() {
    let parser = RecursiveDescentParser::from_text(EXPR).unwrap();
    let outcome = parser.parse("+ id");
    assert!(!outcome.accepted);
    assert_eq!(
        outcome.errors[0],
        "Syntax Error: Unexpected token '+'. Expected one of: '(' or 'id'. Column number: [1]"
    );
}

#[test]
fn test_unexpected_end_cites_first_set() {
    let parser = RecursiveDescentParser::from_text(EXPR).unwrap();
    let outcome = parser.parse("id +");
    assert!(!outcome.accepted);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(
        outcome.errors[0],
        "Syntax Error: Unexpected end of input. Expected one of: '(' or 'id'. Column number: [4]"
    );
}

#[test]
fn test_trailing_input_is_reported() {
    let parser = RecursiveDescentParser::from_text("S -> id").unwrap();
    let outcome = parser.parse("x y");
    assert!(!outcome.accepted);
    assert_eq!(
        outcome.errors[0],
        "Syntax Error: Unexpected token 'y'. Column number: [3]"
    );
}

#[test]
fn test_lexical_error_skips_and_continues() {
    let parser = RecursiveDescentParser::from_text(EXPR).unwrap();
    let outcome = parser.parse("1abc id + id");
    assert!(!outcome.accepted);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(
        outcome.errors[0],
        "Lexical Error: Invalid token '<1abc>': Invalid identifier. Column number: [1]"
    );
    // the parse itself went through after the skip
    assert!(outcome.steps.iter().any(|s| s.action == "match +"));
}

#[test]
fn test_trace_shows_checked_productions() {
    let parser = RecursiveDescentParser::from_text("S -> ( S ) S | e").unwrap();
    let outcome = parser.parse("( )");
    assert!(outcome.accepted);
    let actions: Vec<&str> = outcome.steps.iter().map(|s| s.action.as_str()).collect();
    assert!(actions.contains(&"check S -> ( S ) S"));
    assert!(actions.contains(&"match ("));
    assert!(actions.contains(&"match )"));
    assert_eq!(actions.last(), Some(&"accept"));
}

#[test]
fn test_nested_parentheses() {
    let parser = RecursiveDescentParser::from_text("S -> ( S ) S | e").unwrap();
    assert!(parser.parse("( ( ) ( ) )").accepted);
    assert!(parser.parse("").accepted);
    assert!(!parser.parse("( ( )").accepted);
    assert!(!parser.parse(") (").accepted);
}
