//! Command-line front end: load a grammar file, run one or all of the four
//! parsers over an input string, and print verdicts, errors, and optionally
//! the step trace.

use std::fs;
use std::path::PathBuf;

use clap::{Parser as ClapParser, ValueEnum};
use log::info;

use crate::descent::RecursiveDescentParser;
use crate::error::Result;
use crate::lalr1::Lalr1Parser;
use crate::ll1::Ll1Parser;
use crate::lr1::Lr1Parser;
use crate::trace::{BottomUpStep, ParseOutcome, TopDownStep};

#[derive(ClapParser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the grammar file (one rule per line, `LHS -> A | B`).
    #[arg(short, long)]
    pub grammar: PathBuf,

    /// Input string to parse.
    #[arg(short, long)]
    pub input: String,

    /// Which parser to run.
    #[arg(value_enum, short, long, default_value_t = ParserKind::All)]
    pub parser: ParserKind,

    /// Print the per-step trace of each parse.
    #[arg(long)]
    pub trace: bool,

    /// Log verbosity.
    #[arg(value_enum, short, long, default_value_t = LogLevel::Error)]
    pub verbosity: LogLevel,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParserKind {
    /// Recursive descent (top-down).
    Rd,
    /// Table-driven LL(1) (top-down).
    Ll1,
    /// Canonical LR(1) (bottom-up).
    Lr1,
    /// LALR(1) (bottom-up).
    Lalr1,
    /// All four in sequence.
    All,
}

impl ParserKind {
    fn selected(self) -> Vec<ParserKind> {
        match self {
            ParserKind::All => vec![
                ParserKind::Rd,
                ParserKind::Ll1,
                ParserKind::Lr1,
                ParserKind::Lalr1,
            ],
            kind => vec![kind],
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Default, Debug)]
pub enum LogLevel {
    #[default]
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

/// Runs the selected parsers. Returns whether every run accepted the input.
pub fn run(cli: &Cli) -> Result<bool> {
    let grammar_text = fs::read_to_string(&cli.grammar)?;
    let input = cli.input.as_str();
    let mut all_accepted = true;

    for kind in cli.parser.selected() {
        let accepted = match kind {
            ParserKind::Rd => match RecursiveDescentParser::from_text(&grammar_text) {
                Ok(parser) => {
                    print_grammar("recursive descent", parser.grammar());
                    report_top_down(&parser.parse(input), cli.trace)
                }
                Err(error) => report_build_failure("recursive descent", &error),
            },
            ParserKind::Ll1 => match Ll1Parser::from_text(&grammar_text) {
                Ok(parser) => {
                    print_grammar("LL(1)", parser.grammar());
                    report_top_down(&parser.parse(input), cli.trace)
                }
                Err(error) => report_build_failure("LL(1)", &error),
            },
            ParserKind::Lr1 => match Lr1Parser::from_text(&grammar_text) {
                Ok(parser) => {
                    print_grammar("LR(1)", parser.grammar());
                    info!("LR(1) states: {}", parser.automaton().state_count());
                    print_conflicts(&parser.table().conflicts);
                    report_bottom_up(&parser.parse(input), cli.trace)
                }
                Err(error) => report_build_failure("LR(1)", &error),
            },
            ParserKind::Lalr1 => match Lalr1Parser::from_text(&grammar_text) {
                Ok(parser) => {
                    print_grammar("LALR(1)", parser.grammar());
                    info!(
                        "LALR(1) states: {} (canonical: {})",
                        parser.automaton().state_count(),
                        parser.canonical().state_count()
                    );
                    print_conflicts(&parser.table().conflicts);
                    report_bottom_up(&parser.parse(input), cli.trace)
                }
                Err(error) => report_build_failure("LALR(1)", &error),
            },
            ParserKind::All => unreachable!("expanded by selected()"),
        };
        all_accepted &= accepted;
    }

    Ok(all_accepted)
}

fn print_grammar(name: &str, grammar: &crate::grammar::Grammar) {
    println!("[{name}]");
    for production in grammar.productions() {
        println!("  {production}");
    }
}

fn print_conflicts(conflicts: &[String]) {
    for conflict in conflicts {
        println!("  {conflict}");
    }
}

fn report_build_failure(name: &str, error: &crate::error::GrammarError) -> bool {
    println!("[{name}]");
    println!("  {error}");
    false
}

fn verdict(accepted: bool, errors: &[String]) {
    if accepted {
        println!("  input accepted");
    } else {
        println!("  input rejected");
        for (number, error) in errors.iter().enumerate() {
            println!("  [{}] {error}", number + 1);
        }
    }
}

fn report_top_down(outcome: &ParseOutcome<TopDownStep>, trace: bool) -> bool {
    verdict(outcome.accepted, &outcome.errors);
    if trace {
        println!("  {:<28} {:<28} {:<28} {}", "Matched", "Stack", "Input", "Action");
        for step in &outcome.steps {
            println!(
                "  {:<28} {:<28} {:<28} {}",
                step.matched, step.stack, step.input, step.action
            );
        }
    }
    outcome.accepted
}

fn report_bottom_up(outcome: &ParseOutcome<BottomUpStep>, trace: bool) -> bool {
    verdict(outcome.accepted, &outcome.errors);
    if trace {
        println!("  {:<28} {:<28} {:<28} {}", "Stack", "Symbols", "Input", "Action");
        for step in &outcome.steps {
            println!(
                "  {:<28} {:<28} {:<28} {}",
                step.states, step.symbols, step.input, step.action
            );
        }
    }
    outcome.accepted
}
