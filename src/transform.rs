//! Grammar normalization: left-recursion elimination and left factoring.
//!
//! Both passes are idempotent; the top-down parsers run them before any
//! analysis so that `A -> A a | b` style grammars become parseable.

use indexmap::IndexMap;
use log::debug;

use crate::grammar::{Grammar, Production};
use crate::symbol::Symbol;

/// Removes direct and indirect left recursion.
///
/// Non-terminals are processed in order of first appearance. For each `Ai`,
/// every production `Ai -> Aj y` with `Aj` earlier in the order is expanded
/// with `Aj`'s alternatives; direct recursion on `Ai` is then rewritten
/// through a fresh `Ai'` non-terminal.
pub fn eliminate_left_recursion(grammar: &mut Grammar) {
    let order = grammar.non_terminals_in_order();
    for i in 0..order.len() {
        for j in 0..i {
            substitute_leading(grammar, &order[i], &order[j]);
        }
        eliminate_direct(grammar, &order[i]);
    }
    debug!(
        "left recursion eliminated: {} productions",
        grammar.productions().len()
    );
}

/// Replaces every `a -> b y` with `a -> d y` for each alternative `b -> d`.
fn substitute_leading(grammar: &mut Grammar, a: &Symbol, b: &Symbol) {
    let needed = grammar
        .productions
        .iter()
        .any(|p| p.lhs == *a && p.rhs.first() == Some(b));
    if !needed {
        return;
    }

    let bodies: Vec<Vec<Symbol>> = grammar
        .productions
        .iter()
        .filter(|p| p.lhs == *b)
        .map(|p| p.rhs.clone())
        .collect();

    let mut rebuilt = Vec::with_capacity(grammar.productions.len());
    for production in grammar.productions.drain(..) {
        if production.lhs == *a && production.rhs.first() == Some(b) {
            let tail = &production.rhs[1..];
            for body in &bodies {
                let mut rhs = body.clone();
                rhs.extend_from_slice(tail);
                rebuilt.push(Production::new(a.clone(), rhs));
            }
        } else {
            rebuilt.push(production);
        }
    }
    grammar.productions = rebuilt;
}

fn eliminate_direct(grammar: &mut Grammar, a: &Symbol) {
    // A -> A alone is an unproductive cycle; nothing useful can come of it
    grammar
        .productions
        .retain(|p| !(p.lhs == *a && p.rhs.len() == 1 && p.rhs[0] == *a));

    let recursive = grammar
        .productions
        .iter()
        .any(|p| p.lhs == *a && p.rhs.first() == Some(a));
    if !recursive {
        return;
    }

    let fresh = grammar.fresh_non_terminal(a.as_str(), '\'');
    let mut rebuilt = Vec::with_capacity(grammar.productions.len() + 1);
    let mut tails: Vec<Vec<Symbol>> = Vec::new();
    let mut last_base = None;

    for production in grammar.productions.drain(..) {
        if production.lhs != *a {
            rebuilt.push(production);
        } else if production.rhs.first() == Some(a) {
            // Ai -> Ai x  becomes  Ai' -> x Ai'
            let mut tail = production.rhs[1..].to_vec();
            tail.push(fresh.clone());
            tails.push(tail);
        } else {
            // Ai -> b  becomes  Ai -> b Ai'
            let mut rhs = production.rhs;
            rhs.push(fresh.clone());
            rebuilt.push(Production::new(a.clone(), rhs));
            last_base = Some(rebuilt.len() - 1);
        }
    }

    let insert_at = last_base.map(|i| i + 1).unwrap_or(rebuilt.len());
    let mut fresh_rules: Vec<Production> = tails
        .into_iter()
        .map(|tail| Production::new(fresh.clone(), tail))
        .collect();
    fresh_rules.push(Production::new(fresh.clone(), Vec::new()));
    rebuilt.splice(insert_at..insert_at, fresh_rules);

    grammar.productions = rebuilt;
    grammar.non_terminals.insert(fresh);
}

/// Left-factors the grammar to a fixed point.
///
/// Alternatives of one non-terminal are grouped by their leading symbol and
/// each group of two or more is factored on its greatest common symbol-level
/// prefix through a fresh `A^` non-terminal. The pass repeats until no group
/// remains, so nested common prefixes factor through `A^`, `A^^`, and so on.
pub fn left_factor(grammar: &mut Grammar) {
    loop {
        let mut changed = false;
        for a in grammar.non_terminals_in_order() {
            while factor_once(grammar, &a) {
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    debug!("left factored: {} productions", grammar.productions().len());
}

fn factor_once(grammar: &mut Grammar, a: &Symbol) -> bool {
    let mut groups: IndexMap<Symbol, Vec<usize>> = IndexMap::new();
    for (index, production) in grammar.productions.iter().enumerate() {
        if production.lhs == *a {
            if let Some(first) = production.rhs.first() {
                groups.entry(first.clone()).or_default().push(index);
            }
        }
    }
    let Some((_, members)) = groups.into_iter().find(|(_, m)| m.len() >= 2) else {
        return false;
    };

    let mut prefix: Vec<Symbol> = grammar.productions[members[0]].rhs.clone();
    for &index in &members[1..] {
        let rhs = &grammar.productions[index].rhs;
        let common = prefix
            .iter()
            .zip(rhs.iter())
            .take_while(|(x, y)| x == y)
            .count();
        prefix.truncate(common);
    }

    let fresh = grammar.fresh_non_terminal(a.as_str(), '^');
    let suffixes: Vec<Vec<Symbol>> = members
        .iter()
        .map(|&i| grammar.productions[i].rhs[prefix.len()..].to_vec())
        .collect();

    // the first group member becomes A -> prefix A^, the rest disappear,
    // and the factored suffixes are appended as A^ alternatives
    let mut factored = prefix;
    factored.push(fresh.clone());
    grammar.productions[members[0]] = Production::new(a.clone(), factored);
    for &index in members.iter().skip(1).rev() {
        grammar.productions.remove(index);
    }
    for suffix in suffixes {
        grammar.productions.push(Production::new(fresh.clone(), suffix));
    }
    grammar.non_terminals.insert(fresh);
    true
}
