//! Lexer tests: indentation structure, infix flags, escaped newlines,
//! comments, and the stream invariants.

use skald::{Access, Matcher, TokenStream, Vocabulary, VocabularyBuilder};

fn names(vocabulary: &Vocabulary, stream: &TokenStream) -> Vec<String> {
    stream
        .tokens()
        .iter()
        .map(|t| vocabulary.name(t.kind).to_owned())
        .collect()
}

/// A small indentation-sensitive vocabulary.
fn indented() -> Vocabulary {
    let mut builder = VocabularyBuilder::new();
    let ident = builder.token("identifier", Matcher::pattern("[a-z]+").unwrap());
    builder.refine("if", ident, Matcher::literals(&["if"]), Access::Public);
    builder.token("string", Matcher::pattern("\"[^\"]*\"").unwrap());
    builder.literals(":", &[":"]);
    builder.error("error");
    builder.end_of_stream("end-of-script");
    builder.end_of_line("end-of-line");
    builder.indent("indent");
    builder.dedent("dedent");
    builder.build().unwrap()
}

#[test]
fn test_indentation_structure() {
    let vocabulary = indented();
    let stream = vocabulary.scan("if cond:\n  print \"Hello\"\n");

    assert_eq!(
        names(&vocabulary, &stream),
        vec![
            "if",
            "identifier",
            ":",
            "end-of-line",
            "indent",
            "identifier",
            "string",
            "end-of-line",
            "dedent",
            "end-of-script",
        ]
    );
}

#[test]
fn test_dedent_per_level() {
    let vocabulary = indented();
    let stream = vocabulary.scan("a:\n  b:\n    c\nd\n");

    assert_eq!(
        names(&vocabulary, &stream),
        vec![
            "identifier",
            ":",
            "end-of-line",
            "indent",
            "identifier",
            ":",
            "end-of-line",
            "indent",
            "identifier",
            "end-of-line",
            "dedent",
            "dedent",
            "identifier",
            "end-of-line",
            "end-of-script",
        ]
    );
}

#[test]
fn test_tabs_count_double() {
    let vocabulary = indented();
    // one tab (width 2) matches two spaces, so no indentation change
    let stream = vocabulary.scan("a\n\tb\nc\n  d\n");
    let kinds = names(&vocabulary, &stream);
    let indents = kinds.iter().filter(|k| *k == "indent").count();
    let dedents = kinds.iter().filter(|k| *k == "dedent").count();
    assert_eq!(indents, 2);
    assert_eq!(dedents, 2);
}

#[test]
fn test_blank_lines_do_not_change_indentation() {
    let vocabulary = indented();
    let stream = vocabulary.scan("a\n\n   \nb\n");

    assert_eq!(
        names(&vocabulary, &stream),
        vec![
            "identifier",
            "end-of-line",
            "identifier",
            "end-of-line",
            "end-of-script",
        ]
    );
}

#[test]
fn test_trailing_dedents_are_drained() {
    let vocabulary = indented();
    let stream = vocabulary.scan("a:\n  b:\n    c");

    let kinds = names(&vocabulary, &stream);
    assert_eq!(
        &kinds[kinds.len() - 4..],
        &["end-of-line", "dedent", "dedent", "end-of-script"]
    );
}

fn operators() -> (Vocabulary, skald::TokenKind) {
    let mut builder = VocabularyBuilder::new();
    builder.token("identifier", Matcher::pattern("[a-z]+").unwrap());
    let star = builder.literals("*", &["*"]);
    builder.no_postfix(star);
    builder.error("error");
    builder.end_of_stream("end-of-script");
    builder.end_of_line("end-of-line");
    builder.indent("indent");
    builder.dedent("dedent");
    (builder.build().unwrap(), star)
}

#[test]
fn test_non_postfix_operator_suppresses_line_break() {
    let (vocabulary, _) = operators();
    let stream = vocabulary.scan("a *\n  b\n");

    assert_eq!(
        names(&vocabulary, &stream),
        vec![
            "identifier",
            "*",
            "identifier",
            "end-of-line",
            "end-of-script",
        ]
    );
}

#[test]
fn test_non_prefix_operator_suppresses_line_break() {
    let mut builder = VocabularyBuilder::new();
    builder.token("identifier", Matcher::pattern("[a-z]+").unwrap());
    let plus = builder.literals("+", &["+"]);
    builder.no_prefix(plus);
    builder.error("error");
    builder.end_of_stream("end-of-script");
    builder.end_of_line("end-of-line");
    builder.indent("indent");
    builder.dedent("dedent");
    let vocabulary = builder.build().unwrap();

    let stream = vocabulary.scan("a\n  + b\n");
    assert_eq!(
        names(&vocabulary, &stream),
        vec![
            "identifier",
            "+",
            "identifier",
            "end-of-line",
            "end-of-script",
        ]
    );
}

#[test]
fn test_escaped_newline() {
    let mut builder = VocabularyBuilder::new();
    builder.token("identifier", Matcher::pattern("[a-z]+").unwrap());
    builder.error("error");
    builder.end_of_stream("end-of-script");
    builder.end_of_line("end-of-line");
    builder.indent("indent");
    builder.dedent("dedent");
    builder.escape_newlines(true);
    let vocabulary = builder.build().unwrap();

    let stream = vocabulary.scan("a \\\n  b");
    assert_eq!(
        names(&vocabulary, &stream),
        vec![
            "identifier",
            "identifier",
            "end-of-line",
            "end-of-script",
        ]
    );
}

#[test]
fn test_backslash_before_non_newline_is_ordinary() {
    let mut builder = VocabularyBuilder::new();
    builder.token("identifier", Matcher::pattern("[a-z]+").unwrap());
    let lambda = builder.literals("\\", &["\\"]);
    builder.error("error");
    builder.end_of_stream("end-of-script");
    builder.escape_newlines(true);
    let vocabulary = builder.build().unwrap();

    let stream = vocabulary.scan("\\x");
    let kinds: Vec<_> = stream.tokens().iter().map(|t| t.kind).collect();
    assert_eq!(kinds[0], lambda);
    assert_eq!(vocabulary.name(kinds[1]), "identifier");
}

#[test]
fn test_comments_are_skipped() {
    let mut builder = VocabularyBuilder::new();
    builder.token("identifier", Matcher::pattern("[a-z]+").unwrap());
    builder.comments(Matcher::pattern("#[^\n]*").unwrap());
    builder.error("error");
    builder.end_of_stream("end-of-script");
    let vocabulary = builder.build().unwrap();

    let stream = vocabulary.scan("a # trailing words\nb");
    let kinds = names(&vocabulary, &stream);
    assert_eq!(kinds, vec!["identifier", "identifier", "end-of-script"]);
}

#[test]
fn test_comment_only_line_keeps_indentation() {
    let mut builder = VocabularyBuilder::new();
    builder.token("identifier", Matcher::pattern("[a-z]+").unwrap());
    builder.comments(Matcher::pattern("#[^\n]*").unwrap());
    builder.error("error");
    builder.end_of_stream("end-of-script");
    builder.end_of_line("end-of-line");
    builder.indent("indent");
    builder.dedent("dedent");
    let vocabulary = builder.build().unwrap();

    // the comment line does not dedent back to column zero
    let stream = vocabulary.scan("a:\n  b\n# note\n  c\n");
    let kinds = names(&vocabulary, &stream);
    let indents = kinds.iter().filter(|k| *k == "indent").count();
    let dedents = kinds.iter().filter(|k| *k == "dedent").count();
    assert_eq!(indents, 1);
    assert_eq!(dedents, 1);
}

#[test]
fn test_longest_match_wins() {
    let mut builder = VocabularyBuilder::new();
    let lt = builder.literals("<", &["<"]);
    let le = builder.literals("<=", &["<="]);
    builder.error("error");
    builder.end_of_stream("end-of-script");
    let vocabulary = builder.build().unwrap();

    let stream = vocabulary.scan("<=<");
    let kinds: Vec<_> = stream.tokens().iter().map(|t| t.kind).collect();
    assert_eq!(kinds[0], le);
    assert_eq!(kinds[1], lt);
}

#[test]
fn test_keyword_is_case_insensitive() {
    let mut builder = VocabularyBuilder::new();
    let while_kw = builder.keyword("while");
    builder.error("error");
    builder.end_of_stream("end-of-script");
    let vocabulary = builder.build().unwrap();

    let stream = vocabulary.scan("WHILE");
    assert_eq!(stream.tokens()[0].kind, while_kw);
    assert_eq!(stream.tokens()[0].length, 5);
}

#[test]
fn test_refinement_requires_exact_length() {
    let mut builder = VocabularyBuilder::new();
    let ident = builder.token("identifier", Matcher::pattern("[a-z]+").unwrap());
    let kw_if = builder.refine("if", ident, Matcher::literals(&["if"]), Access::Public);
    builder.error("error");
    builder.end_of_stream("end-of-script");
    let vocabulary = builder.build().unwrap();

    // "iffy" is an identifier, not the keyword plus residue
    let stream = vocabulary.scan("iffy if");
    assert_eq!(stream.tokens()[0].kind, ident);
    assert_eq!(stream.tokens()[0].length, 4);
    assert_eq!(stream.tokens()[1].kind, kw_if);
}

#[test]
fn test_error_token_for_unmatched_character() {
    let mut builder = VocabularyBuilder::new();
    builder.token("identifier", Matcher::pattern("[a-z]+").unwrap());
    builder.error("error");
    builder.end_of_stream("end-of-script");
    let vocabulary = builder.build().unwrap();

    let stream = vocabulary.scan("ab?cd");
    assert!(stream.has_errors());
    let error = stream.tokens()[1];
    assert_eq!(error.kind, vocabulary.error_kind());
    assert_eq!(error.start, 2);
    assert_eq!(error.length, 1);
    // scanning continues after the error
    assert_eq!(stream.tokens()[2].length, 2);
}

#[test]
fn test_tokens_are_ordered_and_bounded() {
    let vocabulary = indented();
    let input = "if a:\n  b \"x\"\n    c\nd";
    let stream = vocabulary.scan(input);

    let mut previous_end = 0;
    for token in stream.tokens() {
        assert!(token.start >= previous_end, "tokens overlap");
        assert!(token.end() as usize <= input.len());
        previous_end = token.end();
    }
}

#[test]
fn test_last_token_is_end_of_stream() {
    let vocabulary = indented();
    let stream = vocabulary.scan("a");
    let last = stream.tokens().last().unwrap();
    assert_eq!(last.kind, vocabulary.end_of_stream_kind());
    assert_eq!(last.length, 0);
}

#[test]
fn test_empty_input_emits_nothing() {
    let vocabulary = indented();
    let stream = vocabulary.scan("");
    assert!(stream.tokens().is_empty());
    assert!(!stream.has_errors());
}

#[test]
fn test_partial_scan_has_no_synthetic_tail() {
    let vocabulary = indented();
    let stream = vocabulary.scan_partial("if a:\n  b");
    assert!(stream.is_truncated());
    let last = stream.tokens().last().unwrap();
    assert_ne!(last.kind, vocabulary.end_of_stream_kind());
}

#[test]
fn test_newline_offsets_cover_the_buffer() {
    let vocabulary = indented();
    let input = "a\nb\n\nc";
    let stream = vocabulary.scan(input);
    let expected: Vec<u32> = input
        .bytes()
        .enumerate()
        .filter(|(_, b)| *b == b'\n')
        .map(|(i, _)| i as u32)
        .collect();
    assert_eq!(stream.newline_offsets(), expected.as_slice());
}

#[test]
fn test_trailing_whitespace_is_trimmed() {
    let vocabulary = indented();
    let stream = vocabulary.scan("a  \t\r");
    assert_eq!(
        names(&vocabulary, &stream),
        vec!["identifier", "end-of-line", "end-of-script"]
    );
}

#[test]
fn test_text_of_reads_the_buffer() {
    let vocabulary = indented();
    let stream = vocabulary.scan("hello world");
    assert_eq!(stream.text_of(&stream.tokens()[0]), "hello");
    assert_eq!(stream.text_of(&stream.tokens()[1]), "world");
}
