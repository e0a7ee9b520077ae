//! A complete calculator: vocabulary, ranked grammar, evaluation, and
//! error reporting.
//!
//! Run with: `cargo run --example calculator -- "1+2*(3-1)"`

use skald::{GrammarBuilder, Matcher, Param, Parser, RuleDecl, SyntaxError, VocabularyBuilder};

fn build_calculator() -> Result<Parser<f64>, skald::BuildError> {
    let mut vocabulary = VocabularyBuilder::new();
    let number = vocabulary.token("number", Matcher::pattern(r"[0-9]+(\.[0-9]+)?")?);
    let add = vocabulary.literals("+", &["+"]);
    let sub = vocabulary.literals("-", &["-"]);
    let mul = vocabulary.literals("*", &["*"]);
    let div = vocabulary.literals("/", &["/"]);
    let open = vocabulary.literals("(", &["("]);
    let close = vocabulary.literals(")", &[")"]);
    vocabulary.error("error");
    vocabulary.end_of_stream("end-of-input");
    let vocabulary = vocabulary.build()?;

    GrammarBuilder::new(vocabulary)
        .rule(
            RuleDecl::new("expr", move |mut r| {
                let lhs = r.value(0);
                let rhs = r.value(2);
                Ok(if r.kind(1) == add { lhs + rhs } else { lhs - rhs })
            })
            .rank(2)
            .param(Param::nonterminal("expr"))
            .param(Param::terminal(&[add, sub]))
            .param(Param::nonterminal("expr").max_rank(1)),
        )
        .rule(
            RuleDecl::new("expr", move |mut r| {
                let lhs = r.value(0);
                let rhs = r.value(2);
                if r.kind(1) == mul {
                    Ok(lhs * rhs)
                } else if rhs == 0.0 {
                    Err(SyntaxError::in_reduction("division by zero", r.location()))
                } else {
                    Ok(lhs / rhs)
                }
            })
            .rank(1)
            .param(Param::nonterminal("expr").max_rank(1))
            .param(Param::terminal(&[mul, div]))
            .param(Param::nonterminal("expr").max_rank(0)),
        )
        .rule(
            RuleDecl::new("expr", |mut r| {
                Ok(r.text(0).parse::<f64>().unwrap_or(f64::NAN))
            })
            .param(Param::terminal(&[number]).text()),
        )
        .rule(
            RuleDecl::new("expr", |mut r| Ok(r.value(1)))
                .param(Param::terminal(&[open]))
                .param(Param::nonterminal("expr"))
                .param(Param::terminal(&[close])),
        )
        .build("expr")
}

fn main() {
    let input = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "1+2*(3-1)".to_owned());

    let parser = match build_calculator() {
        Ok(parser) => parser,
        Err(error) => {
            eprintln!("failed to build the calculator: {error}");
            std::process::exit(1);
        }
    };

    println!("input: {input}");
    match parser.parse(&input) {
        Ok(value) => println!("value: {value}"),
        Err(error) => {
            let at = error.location.start;
            eprintln!("{error}");
            eprintln!("  at line {}, column {}", at.line, at.column);
            std::process::exit(1);
        }
    }
}
