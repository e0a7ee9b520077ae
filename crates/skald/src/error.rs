//! Error types for grammar construction and parsing.
//!
//! Two failure families are kept apart:
//!
//! - [`BuildError`]: programmer errors raised eagerly while a vocabulary
//!   is built or a grammar is compiled (bad patterns, unknown result
//!   types, oversized state machines).
//! - [`SyntaxError`]: the single runtime failure of a parse, carrying
//!   the offending token, the terminals that would have been accepted,
//!   and the source span.
//!
//! With the `diagnostics` feature enabled both types derive
//! [`miette::Diagnostic`] and label their spans.

use crate::text::Span;
use crate::token::TokenKind;
use compact_str::CompactString;
use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

/// Errors raised while building a vocabulary or compiling a grammar.
///
/// These indicate a broken declaration, never bad input text; they are
/// raised once, at construction time.
#[derive(Debug, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
#[non_exhaustive]
pub enum BuildError {
    #[error("invalid token pattern: {0}")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(skald::bad_pattern)))]
    Pattern(#[from] regex::Error),

    #[error("token kind `{name}` has no match definition")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(skald::missing_matcher)))]
    MissingMatcher { name: CompactString },

    #[error("role `{role}` must be declared exactly once")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(skald::missing_role)))]
    MissingRole { role: &'static str },

    #[error("role `{role}` was declared more than once")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(skald::duplicate_role)))]
    DuplicateRole { role: &'static str },

    #[error("indent and dedent kinds must be declared together")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(skald::indent_pair)))]
    IndentWithoutDedent,

    #[error("no rule produces result type `{name}`")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(skald::unknown_type)))]
    UnknownResultType { name: CompactString },

    #[error("list element type `{name}` is not a known result type")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(skald::unknown_element)))]
    UnknownElementType { name: CompactString },

    #[error("a rule for `{name}` expands to an empty variant; at least one parameter must be required")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(skald::empty_rule)))]
    EmptyRule { name: CompactString },

    #[error("a rule for `{name}` declares {count} optional parameters; at most 16 are supported")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(skald::optional_overflow)))]
    TooManyOptionalParameters { name: CompactString, count: usize },

    #[error("grammar too large: {entities} token kinds and rules exceed the action-table encoding")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(skald::entity_overflow)))]
    TooManyEntities { entities: usize },

    #[error("state machine too large: {states} states exceed the limit of 32767")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(skald::state_overflow)))]
    TooManyStates { states: usize },
}

/// A parse failure.
///
/// `expected` holds the display names of every terminal that would have
/// been accepted where `token` was found, in discovery order; it is
/// empty for lexical failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
#[cfg_attr(feature = "diagnostics", diagnostic(code(skald::syntax_error)))]
#[error("{}", render_message(.token, .expected))]
pub struct SyntaxError {
    pub token: String,
    pub expected: Vec<String>,
    #[cfg_attr(feature = "diagnostics", label("here"))]
    pub location: Span,
}

impl SyntaxError {
    /// An error raised from inside a reduction callback, reported at the
    /// span of the reduction.
    #[must_use]
    pub fn in_reduction(message: impl Into<String>, location: Span) -> Self {
        Self {
            token: message.into(),
            expected: Vec::new(),
            location,
        }
    }
}

fn render_message(token: &str, expected: &[String]) -> String {
    match expected {
        [] => format!("Syntax error, unexpected {token}."),
        [only] => format!("Syntax error, found {token} but expected {only}."),
        [head @ .., last] => {
            let head = head.join(", ");
            format!("Syntax error, found {token} but expected {head} or {last}.")
        }
    }
}

/// Maps token kinds to the display names used in syntax errors.
///
/// The default namer reports the name each kind was declared with; a
/// custom namer can also fold kinds that are dominated by another kind
/// in the expected set so they are omitted from the message.
pub trait TokenNamer {
    /// Human-readable name for a kind.
    fn display(&self, kind: TokenKind) -> CompactString;

    /// Whether `kind` is dominated by another member of `expected` and
    /// should be left out of the rendered list.
    fn is_folded(&self, kind: TokenKind, expected: &[TokenKind]) -> bool {
        let _ = (kind, expected);
        false
    }
}
