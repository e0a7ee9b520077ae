//! # Grammar
//!
//! Declarative grammar rules and the argument packets their reduction
//! callbacks receive.
//!
//! ## Overview
//!
//! A grammar is a list of [`RuleDecl`]s. Each rule names the semantic
//! type it produces, an optional rank (higher ranks are more
//! permissive, which expresses operator precedence without extra
//! non-terminal types), and an ordered list of [`Param`]s:
//!
//! - **Terminals** accept a set of token kinds and deliver the kind,
//!   the matched text, or the text with its span.
//! - **Non-terminals** accept any rule producing a semantic type, with
//!   an optional rank cap.
//! - **Lists** accept repetitions of a semantic type with an optional
//!   separator or terminator and a minimum count.
//!
//! Terminals and non-terminals may be optional; a rule with `k`
//! optional parameters behaves exactly like `2^k` rules each taking a
//! subset of them.
//!
//! ## Usage
//!
//! ```rust
//! use skald::{GrammarBuilder, Matcher, Param, RuleDecl, VocabularyBuilder};
//!
//! let mut builder = VocabularyBuilder::new();
//! let number = builder.token("number", Matcher::pattern("[0-9]+")?);
//! let plus = builder.literals("+", &["+"]);
//! builder.error("error");
//! builder.end_of_stream("end-of-script");
//! let vocabulary = builder.build()?;
//!
//! let parser = GrammarBuilder::new(vocabulary)
//!     .rule(
//!         RuleDecl::new("sum", |mut r| Ok(r.value(0) + r.value(2)))
//!             .rank(1)
//!             .param(Param::nonterminal("sum"))
//!             .param(Param::terminal(&[plus]))
//!             .param(Param::nonterminal("sum").max_rank(0)),
//!     )
//!     .rule(
//!         RuleDecl::new("sum", |mut r| {
//!             Ok(r.text(0).parse::<i64>().unwrap_or(0))
//!         })
//!         .param(Param::terminal(&[number]).text()),
//!     )
//!     .build("sum")?;
//!
//! assert_eq!(parser.parse("1+2+3")?, 6);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub(crate) mod ruleset;

use crate::error::{BuildError, SyntaxError, TokenNamer};
use crate::lexer::Vocabulary;
use crate::parser::table::ActionTable;
use crate::parser::Parser;
use crate::text::Span;
use crate::token::TokenKind;
use compact_str::CompactString;
use ruleset::RuleSet;
use smallvec::SmallVec;
use std::sync::Arc;

/// How a terminal parameter is delivered to the reduction callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// The token kind, as refined by the lexer.
    Kind,
    /// The matched substring.
    Text,
    /// The matched substring together with its span.
    Spanned,
}

/// One parameter of a declared rule.
#[derive(Debug, Clone)]
pub struct Param {
    pub(crate) shape: ParamShape,
    pub(crate) optional: bool,
    pub(crate) tag: Option<u32>,
}

#[derive(Debug, Clone)]
pub(crate) enum ParamShape {
    Terminal {
        kinds: SmallVec<[TokenKind; 4]>,
        capture: Capture,
    },
    NonTerminal {
        result: CompactString,
        max_rank: Option<u8>,
    },
    List {
        result: CompactString,
        min: u32,
        separator: Option<TokenKind>,
        terminator: Option<TokenKind>,
        max_rank: Option<u8>,
    },
}

impl Param {
    /// A terminal accepting any of `kinds` (and their public
    /// refinements), delivered as the token kind.
    #[must_use]
    pub fn terminal(kinds: &[TokenKind]) -> Self {
        Self {
            shape: ParamShape::Terminal {
                kinds: kinds.iter().copied().collect(),
                capture: Capture::Kind,
            },
            optional: false,
            tag: None,
        }
    }

    /// A non-terminal accepting any rule producing `result`.
    #[must_use]
    pub fn nonterminal(result: &str) -> Self {
        Self {
            shape: ParamShape::NonTerminal {
                result: CompactString::from(result),
                max_rank: None,
            },
            optional: false,
            tag: None,
        }
    }

    /// A repetition of rules producing `result`; by default at least
    /// one element and no separator.
    #[must_use]
    pub fn list(result: &str) -> Self {
        Self {
            shape: ParamShape::List {
                result: CompactString::from(result),
                min: 1,
                separator: None,
                terminator: None,
                max_rank: None,
            },
            optional: false,
            tag: None,
        }
    }

    /// Deliver a terminal as its matched text.
    #[must_use]
    pub fn text(mut self) -> Self {
        match &mut self.shape {
            ParamShape::Terminal { capture, .. } => *capture = Capture::Text,
            _ => panic!("`text()` applies to terminal parameters"),
        }
        self
    }

    /// Deliver a terminal as its matched text plus span.
    #[must_use]
    pub fn spanned(mut self) -> Self {
        match &mut self.shape {
            ParamShape::Terminal { capture, .. } => *capture = Capture::Spanned,
            _ => panic!("`spanned()` applies to terminal parameters"),
        }
        self
    }

    /// Make a terminal or non-terminal parameter optional. A list is
    /// made optional with `.min(0)` instead.
    #[must_use]
    pub fn optional(mut self) -> Self {
        match self.shape {
            ParamShape::List { .. } => panic!("make a list optional with `min(0)`"),
            _ => self.optional = true,
        }
        self
    }

    /// Cap the rank of the rules accepted by a non-terminal or list
    /// parameter.
    #[must_use]
    pub fn max_rank(mut self, rank: u8) -> Self {
        match &mut self.shape {
            ParamShape::NonTerminal { max_rank, .. } | ParamShape::List { max_rank, .. } => {
                *max_rank = Some(rank);
            }
            ParamShape::Terminal { .. } => panic!("`max_rank()` applies to non-terminal parameters"),
        }
        self
    }

    /// Minimum number of list elements; 0 makes the list optional.
    #[must_use]
    pub fn min(mut self, count: u32) -> Self {
        match &mut self.shape {
            ParamShape::List { min, .. } => *min = count,
            _ => panic!("`min()` applies to list parameters"),
        }
        self
    }

    /// Token expected between list elements.
    #[must_use]
    pub fn separator(mut self, kind: TokenKind) -> Self {
        match &mut self.shape {
            ParamShape::List { separator, .. } => *separator = Some(kind),
            _ => panic!("`separator()` applies to list parameters"),
        }
        self
    }

    /// Token expected after every list element.
    #[must_use]
    pub fn terminator(mut self, kind: TokenKind) -> Self {
        match &mut self.shape {
            ParamShape::List { terminator, .. } => *terminator = Some(kind),
            _ => panic!("`terminator()` applies to list parameters"),
        }
        self
    }

    /// Attach a context tag to this position, surfaced by the context
    /// evaluator.
    #[must_use]
    pub fn tag(mut self, tag: u32) -> Self {
        self.tag = Some(tag);
        self
    }
}

/// The callback invoked when a rule reduces.
pub type ReduceFn<V> = Arc<dyn Fn(Reduction<V>) -> Result<V, SyntaxError>>;

/// One declared grammar rule: a result type, a rank, and an ordered
/// parameter list bound to a reduction callback.
pub struct RuleDecl<V> {
    pub(crate) result: CompactString,
    pub(crate) rank: u8,
    pub(crate) context: Option<u32>,
    pub(crate) params: Vec<Param>,
    pub(crate) action: ReduceFn<V>,
}

impl<V> RuleDecl<V> {
    pub fn new(
        result: &str,
        action: impl Fn(Reduction<V>) -> Result<V, SyntaxError> + 'static,
    ) -> Self {
        Self {
            result: CompactString::from(result),
            rank: 0,
            context: None,
            params: Vec::new(),
            action: Arc::new(action),
        }
    }

    /// Rank of this rule; rank 0 is the most restrictive.
    #[must_use]
    pub fn rank(mut self, rank: u8) -> Self {
        self.rank = rank;
        self
    }

    /// Context tag for this rule, surfaced by the context evaluator.
    #[must_use]
    pub fn context(mut self, tag: u32) -> Self {
        self.context = Some(tag);
        self
    }

    #[must_use]
    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }
}

/// One bound argument of a reduction.
#[derive(Debug)]
pub enum Arg<V> {
    /// A provided non-terminal value.
    Value(V),
    /// The elements of a list parameter, in source order; empty when an
    /// optional list was not provided.
    List(Vec<V>),
    /// A terminal delivered as its kind.
    Kind(TokenKind),
    /// A terminal delivered as its matched text.
    Text(CompactString),
    /// A terminal delivered as its matched text plus span.
    Spanned(CompactString, Span),
    /// An optional parameter that was not provided.
    Absent,
}

/// The argument packet a reduction callback receives: one [`Arg`] per
/// declared parameter, plus the source span of the reduction.
pub struct Reduction<V> {
    pub(crate) args: SmallVec<[Arg<V>; 4]>,
    pub(crate) location: Span,
}

impl<V> Reduction<V> {
    /// The source span reported for this reduction.
    #[must_use]
    pub const fn location(&self) -> Span {
        self.location
    }

    /// Number of declared parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.args.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    /// Take the raw argument at `index`, leaving [`Arg::Absent`].
    pub fn arg(&mut self, index: usize) -> Arg<V> {
        std::mem::replace(&mut self.args[index], Arg::Absent)
    }

    /// Take a provided non-terminal value.
    ///
    /// # Panics
    ///
    /// Panics when the parameter is not a provided non-terminal.
    pub fn value(&mut self, index: usize) -> V {
        match self.arg(index) {
            Arg::Value(value) => value,
            _ => panic!("parameter {index} is not a provided non-terminal"),
        }
    }

    /// Take an optional non-terminal value.
    pub fn opt_value(&mut self, index: usize) -> Option<V> {
        match self.arg(index) {
            Arg::Value(value) => Some(value),
            Arg::Absent => None,
            _ => panic!("parameter {index} is not an optional non-terminal"),
        }
    }

    /// Take the elements of a list parameter, in source order.
    pub fn list(&mut self, index: usize) -> Vec<V> {
        match self.arg(index) {
            Arg::List(values) => values,
            _ => panic!("parameter {index} is not a list"),
        }
    }

    /// The kind of a terminal parameter.
    pub fn kind(&self, index: usize) -> TokenKind {
        match &self.args[index] {
            Arg::Kind(kind) => *kind,
            _ => panic!("parameter {index} is not a terminal kind"),
        }
    }

    /// The kind of an optional terminal parameter.
    pub fn opt_kind(&self, index: usize) -> Option<TokenKind> {
        match &self.args[index] {
            Arg::Kind(kind) => Some(*kind),
            Arg::Absent => None,
            _ => panic!("parameter {index} is not an optional terminal"),
        }
    }

    /// The matched text of a terminal parameter.
    pub fn text(&self, index: usize) -> &str {
        match &self.args[index] {
            Arg::Text(text) | Arg::Spanned(text, _) => text,
            _ => panic!("parameter {index} is not a terminal text"),
        }
    }

    /// The matched text of an optional terminal parameter.
    pub fn opt_text(&self, index: usize) -> Option<&str> {
        match &self.args[index] {
            Arg::Text(text) | Arg::Spanned(text, _) => Some(text),
            Arg::Absent => None,
            _ => panic!("parameter {index} is not an optional terminal"),
        }
    }

    /// The matched text and span of a terminal parameter.
    pub fn spanned(&self, index: usize) -> (&str, Span) {
        match &self.args[index] {
            Arg::Spanned(text, span) => (text, *span),
            _ => panic!("parameter {index} is not a spanned terminal"),
        }
    }
}

/// Collects rule declarations and compiles them into a [`Parser`].
pub struct GrammarBuilder<V> {
    vocabulary: Vocabulary,
    rules: Vec<RuleDecl<V>>,
    namer: Option<Box<dyn TokenNamer>>,
}

impl<V> GrammarBuilder<V> {
    #[must_use]
    pub fn new(vocabulary: Vocabulary) -> Self {
        Self {
            vocabulary,
            rules: Vec::new(),
            namer: None,
        }
    }

    #[must_use]
    pub fn rule(mut self, decl: RuleDecl<V>) -> Self {
        self.rules.push(decl);
        self
    }

    /// Replace the default token namer used in syntax errors.
    #[must_use]
    pub fn token_namer(mut self, namer: Box<dyn TokenNamer>) -> Self {
        self.namer = Some(namer);
        self
    }

    /// Elaborate the rule set, build the SLR(1) state machine, and
    /// produce the parser for the given root type.
    pub fn build(self, root: &str) -> Result<Parser<V>, BuildError> {
        let vocabulary = Arc::new(self.vocabulary);
        let rules = RuleSet::elaborate(&vocabulary, self.rules, root)?;
        let table = ActionTable::build(&rules)?;
        Ok(Parser::new(vocabulary, rules, table, self.namer))
    }
}
