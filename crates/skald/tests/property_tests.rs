//! Property tests: lexer stream invariants over arbitrary input and
//! parse round-trips over generated expressions.

use proptest::prelude::*;
use skald::{
    GrammarBuilder, Matcher, Param, Parser, RuleDecl, Vocabulary, VocabularyBuilder,
};

fn indented_vocabulary() -> Vocabulary {
    let mut builder = VocabularyBuilder::new();
    builder.token("identifier", Matcher::pattern("[a-z]+").unwrap());
    builder.token("number", Matcher::pattern("[0-9]+").unwrap());
    builder.literals(":", &[":"]);
    builder.comments(Matcher::pattern("#[^\n]*").unwrap());
    builder.error("error");
    builder.end_of_stream("end-of-script");
    builder.end_of_line("end-of-line");
    builder.indent("indent");
    builder.dedent("dedent");
    builder.build().unwrap()
}

fn arithmetic() -> Parser<i64> {
    let mut vocabulary = VocabularyBuilder::new();
    let number = vocabulary.token("number", Matcher::pattern("[0-9]+").unwrap());
    let add = vocabulary.literals("+", &["+"]);
    let sub = vocabulary.literals("-", &["-"]);
    let mul = vocabulary.literals("*", &["*"]);
    let open = vocabulary.literals("(", &["("]);
    let close = vocabulary.literals(")", &[")"]);
    vocabulary.error("error");
    vocabulary.end_of_stream("end-of-script");
    let vocabulary = vocabulary.build().unwrap();

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
            RuleDecl::new("expr", |mut r| Ok(r.value(0) * r.value(2)))
                .rank(1)
                .param(Param::nonterminal("expr").max_rank(1))
                .param(Param::terminal(&[mul]))
                .param(Param::nonterminal("expr").max_rank(0)),
        )
        .rule(
            RuleDecl::new("expr", |mut r| Ok(r.text(0).parse::<i64>().unwrap_or(0)))
                .param(Param::terminal(&[number]).text()),
        )
        .rule(
            RuleDecl::new("expr", |mut r| Ok(r.value(1)))
                .param(Param::terminal(&[open]))
                .param(Param::nonterminal("expr"))
                .param(Param::terminal(&[close])),
        )
        .build("expr")
        .unwrap()
}

#[derive(Debug, Clone)]
enum Expr {
    Num(u8),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
}

fn eval(expr: &Expr) -> i64 {
    match expr {
        Expr::Num(n) => i64::from(*n),
        Expr::Add(a, b) => eval(a) + eval(b),
        Expr::Sub(a, b) => eval(a) - eval(b),
        Expr::Mul(a, b) => eval(a) * eval(b),
    }
}

/// Fully parenthesized rendering; unambiguous under any precedence.
fn print(expr: &Expr, out: &mut String) {
    match expr {
        Expr::Num(n) => out.push_str(&n.to_string()),
        Expr::Add(a, b) => {
            out.push('(');
            print(a, out);
            out.push('+');
            print(b, out);
            out.push(')');
        }
        Expr::Sub(a, b) => {
            out.push('(');
            print(a, out);
            out.push('-');
            print(b, out);
            out.push(')');
        }
        Expr::Mul(a, b) => {
            out.push('(');
            print(a, out);
            out.push('*');
            print(b, out);
            out.push(')');
        }
    }
}

fn expr_strategy() -> impl Strategy<Value = Expr> {
    let leaf = (0u8..10).prop_map(Expr::Num);
    leaf.prop_recursive(3, 16, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| Expr::Add(Box::new(a), Box::new(b))),
            (inner.clone(), inner.clone())
                .prop_map(|(a, b)| Expr::Sub(Box::new(a), Box::new(b))),
            (inner.clone(), inner).prop_map(|(a, b)| Expr::Mul(Box::new(a), Box::new(b))),
        ]
    })
}

proptest! {
    #[test]
    fn prop_tokens_are_ordered_and_bounded(input in "[ -~\\n\\t]{0,60}") {
        let vocabulary = indented_vocabulary();
        let stream = vocabulary.scan(&input);

        let mut previous_end = 0u32;
        for token in stream.tokens() {
            prop_assert!(token.start >= previous_end);
            prop_assert!(token.end() as usize <= input.len());
            previous_end = token.end();
        }
    }

    #[test]
    fn prop_last_token_is_end_of_stream(input in "[a-z0-9: \\n#\"]{0,50}") {
        let vocabulary = indented_vocabulary();
        let stream = vocabulary.scan(&input);

        if let Some(last) = stream.tokens().last() {
            prop_assert_eq!(last.kind, vocabulary.end_of_stream_kind());
            prop_assert_eq!(last.length, 0);
        }
    }

    #[test]
    fn prop_newline_offsets_match_the_buffer(input in "[a-z \\n]{0,50}") {
        let vocabulary = indented_vocabulary();
        let stream = vocabulary.scan(&input);

        let expected: Vec<u32> = input
            .bytes()
            .enumerate()
            .filter(|(_, b)| *b == b'\n')
            .map(|(i, _)| i as u32)
            .collect();
        prop_assert_eq!(stream.newline_offsets(), expected.as_slice());
    }

    #[test]
    fn prop_parenthesized_round_trip(expr in expr_strategy()) {
        let parser = arithmetic();
        let mut text = String::new();
        print(&expr, &mut text);

        prop_assert_eq!(parser.parse(&text).unwrap(), eval(&expr));
    }

    #[test]
    fn prop_sum_chain_folds_left(values in prop::collection::vec(0u8..100, 1..12)) {
        let parser = arithmetic();
        let text = values
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join("+");
        let expected: i64 = values.iter().map(|&v| i64::from(v)).sum();

        prop_assert_eq!(parser.parse(&text).unwrap(), expected);
    }

    #[test]
    fn prop_mixed_chain_respects_precedence(
        a in 0u8..50,
        b in 0u8..50,
        c in 0u8..50,
    ) {
        let parser = arithmetic();
        let text = format!("{a}+{b}*{c}");
        prop_assert_eq!(
            parser.parse(&text).unwrap(),
            i64::from(a) + i64::from(b) * i64::from(c)
        );
    }
}
