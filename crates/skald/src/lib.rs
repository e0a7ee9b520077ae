//! # Skald
//!
//! Tokenizers and SLR(1) parsers for small domain-specific languages.
//!
//! ## Overview
//!
//! A consumer declares a vocabulary of token kinds (literal sets or
//! regular expressions, with optional contextual refinements and
//! whitespace structure) and a set of ranked grammar rules (each a
//! reduction from terminals and non-terminals to a semantic value).
//! Skald compiles them into a deterministic pushdown automaton that
//! consumes source text and yields either a root semantic value or a
//! precise syntax error with the set of acceptable tokens.
//!
//! - **Lexing**: longest-match tokenization with sub-tokens, comments,
//!   indentation structure (end-of-line, indent, dedent), escaped
//!   newlines, and infix flags.
//! - **Parsing**: SLR(1) construction over a declarative rule set with
//!   optional parameters, repetition with separators or terminators,
//!   and rank-based operator precedence.
//!
//! ## Quick start
//!
//! ```rust
//! use skald::{GrammarBuilder, Matcher, Param, RuleDecl, VocabularyBuilder};
//!
//! // 1. Declare the token kinds.
//! let mut vocabulary = VocabularyBuilder::new();
//! let number = vocabulary.token("number", Matcher::pattern("[0-9]+")?);
//! let plus = vocabulary.literals("+", &["+"]);
//! let star = vocabulary.literals("*", &["*"]);
//! vocabulary.error("error");
//! vocabulary.end_of_stream("end-of-script");
//! let vocabulary = vocabulary.build()?;
//!
//! // 2. Declare ranked rules; higher ranks bind more loosely.
//! let parser = GrammarBuilder::new(vocabulary)
//!     .rule(
//!         RuleDecl::new("expr", |mut r| Ok(r.value(0) + r.value(2)))
//!             .rank(2)
//!             .param(Param::nonterminal("expr"))
//!             .param(Param::terminal(&[plus]))
//!             .param(Param::nonterminal("expr").max_rank(1)),
//!     )
//!     .rule(
//!         RuleDecl::new("expr", |mut r| Ok(r.value(0) * r.value(2)))
//!             .rank(1)
//!             .param(Param::nonterminal("expr").max_rank(1))
//!             .param(Param::terminal(&[star]))
//!             .param(Param::nonterminal("expr").max_rank(0)),
//!     )
//!     .rule(
//!         RuleDecl::new("expr", |mut r| {
//!             Ok(r.text(0).parse::<i64>().unwrap_or(0))
//!         })
//!         .param(Param::terminal(&[number]).text()),
//!     )
//!     .build("expr")?;
//!
//! // 3. Parse.
//! assert_eq!(parser.parse("1+2*3")?, 7);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Modules
//!
//! - [`lexer`] - Vocabulary declaration and tokenization
//! - [`grammar`] - Rule declaration and reduction packets
//! - [`parser`] - Table construction, the interpreter, and context
//!   evaluation
//! - [`error`] - Construction and syntax errors
//! - [`text`] - Source positions and spans
//! - [`token`] - Token kinds and token streams

pub mod error;
pub mod grammar;
pub mod lexer;
pub mod parser;
pub mod text;
pub mod token;

pub use error::{BuildError, SyntaxError, TokenNamer};
pub use grammar::{Arg, Capture, GrammarBuilder, Param, Reduction, RuleDecl};
pub use lexer::{Access, Matcher, Vocabulary, VocabularyBuilder};
pub use parser::{ContextEvaluation, Parser, ShiftableTerminal};
pub use text::{Position, Span};
pub use token::{Token, TokenKind, TokenStream};
