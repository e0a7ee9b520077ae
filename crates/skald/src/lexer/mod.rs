//! # Lexer
//!
//! Longest-match tokenization with sub-token refinement and
//! whitespace-sensitive structure.
//!
//! ## Overview
//!
//! A [`Vocabulary`] declares the closed set of token kinds:
//!
//! - **Matchers**: anchored regular expressions or ordered literal sets
//!   ([`Matcher`]), each with a fast-reject first-character filter and a
//!   known maximum length where one exists.
//! - **Refinements**: kinds matched only against text an ancestor
//!   already recognized (contextual keywords); public refinements are
//!   accepted by the parser wherever the ancestor is.
//! - **Structure**: optional end-of-line, indent, and dedent kinds turn
//!   line breaks and indentation changes into zero-length tokens.
//! - **Options**: a comment matcher, escaped newlines, and per-kind
//!   infix flags that suppress line breaks around operators.
//!
//! ## Usage
//!
//! ```rust
//! use skald::{Matcher, VocabularyBuilder};
//!
//! let mut builder = VocabularyBuilder::new();
//! let number = builder.token("number", Matcher::pattern("[0-9]+")?);
//! let plus = builder.literals("+", &["+"]);
//! builder.error("error");
//! builder.end_of_stream("end-of-script");
//! let vocabulary = builder.build()?;
//!
//! let stream = vocabulary.scan("1+2");
//! let kinds: Vec<_> = stream.tokens().iter().map(|t| t.kind).collect();
//! assert_eq!(
//!     kinds,
//!     vec![number, plus, number, vocabulary.end_of_stream_kind()]
//! );
//! # Ok::<(), skald::BuildError>(())
//! ```

pub mod matcher;
mod scanner;
pub mod vocabulary;

pub use matcher::Matcher;
pub use vocabulary::{Access, Vocabulary, VocabularyBuilder};
