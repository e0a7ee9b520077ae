//! # Parser
//!
//! SLR(1) state-machine construction and the shift/reduce interpreter.
//!
//! ## Overview
//!
//! The elaborated rule set is compiled once into a canonical LR(0)
//! automaton whose reductions are restricted by per-rule follow sets.
//! Conflicts resolve deterministically: a shift beats a reduce, and
//! between reduces the first-declared rule wins.
//!
//! The interpreter executes the resulting dense action table with
//! parallel stacks (states, start-token indices, one value stack per
//! semantic type, and in-progress list lengths), invoking the reduction
//! callbacks in source order. When no action applies it synthesizes the
//! set of acceptable terminals, following simulated reductions, and
//! reports a single structured [`SyntaxError`](crate::SyntaxError).
//!
//! [`Parser::evaluate_context`] additionally runs the machine without
//! reductions up to a byte offset, for completion tooling.

pub(crate) mod context;
pub(crate) mod driver;
pub(crate) mod table;

pub use context::{ContextEvaluation, ShiftableTerminal};
pub use driver::Parser;
