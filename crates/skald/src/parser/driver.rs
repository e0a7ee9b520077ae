//! The shift/reduce interpreter: executes the action table over a token
//! stream with parallel stacks and drives the reduction callbacks.

use crate::error::{SyntaxError, TokenNamer};
use crate::grammar::ruleset::{ParamBinding, RuleForm, RuleSet};
use crate::grammar::{Arg, Capture, Reduction};
use crate::lexer::Vocabulary;
use crate::parser::table::ActionTable;
use crate::text::Span;
use crate::token::{TokenKind, TokenStream};
use ahash::RandomState;
use compact_str::CompactString;
use hashbrown::HashSet;
use smallvec::SmallVec;
use std::sync::Arc;

/// A compiled parser: the vocabulary, the elaborated rule set, and the
/// SLR(1) action table, plus the reduction callbacks it dispatches.
///
/// The compiled tables are immutable; every [`Parser::parse`] call runs
/// on its own stacks.
pub struct Parser<V> {
    pub(crate) vocabulary: Arc<Vocabulary>,
    pub(crate) rules: RuleSet<V>,
    pub(crate) table: ActionTable,
    pub(crate) namer: Box<dyn TokenNamer>,
}

struct VocabularyNamer {
    vocabulary: Arc<Vocabulary>,
}

impl TokenNamer for VocabularyNamer {
    fn display(&self, kind: TokenKind) -> CompactString {
        CompactString::from(self.vocabulary.name(kind))
    }
}

impl<V> Parser<V> {
    pub(crate) fn new(
        vocabulary: Arc<Vocabulary>,
        rules: RuleSet<V>,
        table: ActionTable,
        namer: Option<Box<dyn TokenNamer>>,
    ) -> Self {
        let namer = namer.unwrap_or_else(|| {
            Box::new(VocabularyNamer {
                vocabulary: Arc::clone(&vocabulary),
            })
        });
        Self {
            vocabulary,
            rules,
            table,
            namer,
        }
    }

    #[must_use]
    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Number of states in the compiled automaton.
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.table.state_count()
    }

    /// Tokenize and parse `text`, producing the root semantic value.
    pub fn parse(&self, text: &str) -> Result<V, SyntaxError> {
        let stream = self.vocabulary.scan(text);
        self.parse_stream(&stream)
    }

    /// Parse an already-scanned stream.
    ///
    /// A stream containing error tokens fails up front, naming the
    /// first offending character.
    pub fn parse_stream(&self, stream: &TokenStream) -> Result<V, SyntaxError> {
        if stream.has_errors() {
            let error_kind = self.vocabulary.error_kind();
            if let Some(token) = stream.tokens().iter().find(|t| t.kind == error_kind) {
                return Err(SyntaxError {
                    token: stream.text_of(token).to_owned(),
                    expected: Vec::new(),
                    location: stream.span_of(token),
                });
            }
        }
        self.run(stream)
    }

    fn run(&self, stream: &TokenStream) -> Result<V, SyntaxError> {
        let eos = self.rules.end_of_stream;
        let base = self.rules.token_count;

        let mut state = ActionTable::INITIAL_STATE;
        let mut state_stack: Vec<u16> = Vec::new();
        let mut start_tokens: Vec<u32> = Vec::new();
        let mut values: Vec<Vec<V>> = (0..self.rules.value_type_count)
            .map(|_| Vec::new())
            .collect();
        let mut list_lengths: Vec<u32> = Vec::new();
        let mut pos = 0usize;

        loop {
            let kind = kind_at(stream, pos, eos);
            let action = self.table.action(state, entity(kind));

            if action > 0 {
                start_tokens.push(u32::try_from(pos).unwrap_or(u32::MAX));
                state_stack.push(state);
                state = u16::try_from(action).unwrap_or(ActionTable::INITIAL_STATE);
                pos += 1;
                continue;
            }
            if action == 0 {
                return Err(self.syntax_error(stream, pos, state, &state_stack));
            }

            let rule_index = (-action) as usize - base;
            let rule = &self.rules.rules[rule_index];
            let step_count = rule.steps.len();

            match &rule.form {
                RuleForm::ListEnd => {
                    list_lengths.push(1);
                    for _ in 0..rule.terminal_step_count() {
                        start_tokens.pop();
                    }
                }
                RuleForm::ListLoop => {
                    let added = u32::try_from(rule.nonterminal_step_count() - 1).unwrap_or(0);
                    if let Some(top) = list_lengths.last_mut() {
                        *top += added;
                    }
                    for _ in 0..rule.terminal_step_count() {
                        start_tokens.pop();
                    }
                }
                RuleForm::Method {
                    action,
                    params,
                    provided,
                    result,
                } => {
                    let value = self.reduce_method(
                        stream,
                        pos,
                        action.as_ref(),
                        params.as_ref(),
                        provided,
                        &mut start_tokens,
                        &mut values,
                        &mut list_lengths,
                    )?;
                    values[*result].push(value);
                    if self.rules.is_initial(rule_index)
                        && kind == eos
                        && state_stack.len() == step_count
                    {
                        // the whole input reduced to the root
                        break;
                    }
                }
            }

            for _ in 0..step_count.saturating_sub(1) {
                state_stack.pop();
            }
            state = state_stack
                .last()
                .copied()
                .unwrap_or(ActionTable::INITIAL_STATE);
            let goto = self.table.action(state, entity_of_rule(base, rule_index));
            if goto <= 0 {
                return Err(self.syntax_error(stream, pos, state, &state_stack));
            }
            state = u16::try_from(goto).unwrap_or(ActionTable::INITIAL_STATE);
        }

        Ok(values[self.rules.root_type]
            .pop()
            .expect("the accepting reduction pushed the root value"))
    }

    /// Bind the callback arguments right to left and invoke it.
    #[allow(clippy::too_many_arguments)]
    fn reduce_method(
        &self,
        stream: &TokenStream,
        pos: usize,
        action: &dyn Fn(Reduction<V>) -> Result<V, SyntaxError>,
        params: &[ParamBinding],
        provided: &[bool],
        start_tokens: &mut Vec<u32>,
        values: &mut [Vec<V>],
        list_lengths: &mut Vec<u32>,
    ) -> Result<V, SyntaxError> {
        let location = reduction_span(stream, start_tokens, pos);
        let first_provided = provided.iter().position(|&p| p).unwrap_or(0);

        let mut args: SmallVec<[Arg<V>; 4]> = params
            .iter()
            .map(|param| match param {
                ParamBinding::List { .. } => Arg::List(Vec::new()),
                _ => Arg::Absent,
            })
            .collect();

        for index in (0..params.len()).rev() {
            if !provided[index] {
                continue;
            }
            let entries;
            match &params[index] {
                ParamBinding::NonTerminal { value_type } => {
                    let value = values[*value_type]
                        .pop()
                        .expect("a provided non-terminal left a value on its stack");
                    args[index] = Arg::Value(value);
                    entries = 1;
                }
                ParamBinding::Terminal { capture } => {
                    let token_index = start_tokens.last().map_or(0, |&t| t as usize);
                    let token_index = token_index.min(stream.tokens().len().saturating_sub(1));
                    let token = &stream.tokens()[token_index];
                    args[index] = match capture {
                        Capture::Kind => Arg::Kind(token.kind),
                        Capture::Text => Arg::Text(CompactString::from(stream.text_of(token))),
                        Capture::Spanned => Arg::Spanned(
                            CompactString::from(stream.text_of(token)),
                            stream.span_of(token),
                        ),
                    };
                    entries = 1;
                }
                ParamBinding::List { value_type } => {
                    let count = list_lengths.pop().unwrap_or(0) as usize;
                    let mut elements: Vec<V> = Vec::with_capacity(count);
                    for _ in 0..count {
                        elements.push(
                            values[*value_type]
                                .pop()
                                .expect("every list element left a value on its stack"),
                        );
                    }
                    // popped newest-first; restore source order
                    elements.reverse();
                    args[index] = Arg::List(elements);
                    entries = count;
                }
            }
            // the leftmost provided parameter keeps its first entry as
            // the start token of the reduced non-terminal
            let pops = if index == first_provided {
                entries.saturating_sub(1)
            } else {
                entries
            };
            for _ in 0..pops {
                start_tokens.pop();
            }
        }

        action(Reduction { args, location })
    }

    fn syntax_error(
        &self,
        stream: &TokenStream,
        pos: usize,
        state: u16,
        state_stack: &[u16],
    ) -> SyntaxError {
        let mut expected_kinds: Vec<TokenKind> = Vec::new();
        let mut visited: HashSet<u16, RandomState> = HashSet::default();
        let mut combined: Vec<u16> = state_stack.to_vec();
        combined.push(state);
        self.acceptable(&combined, &mut visited, &mut expected_kinds);

        let mut expected: Vec<String> = Vec::new();
        for &kind in &expected_kinds {
            if self.namer.is_folded(kind, &expected_kinds) {
                continue;
            }
            let name = self.namer.display(kind).to_string();
            if !expected.contains(&name) {
                expected.push(name);
            }
        }

        let (token, location) = match stream.tokens().get(pos) {
            Some(token) => {
                let text = if token.length == 0 {
                    self.namer.display(token.kind).to_string()
                } else {
                    stream.text_of(token).to_owned()
                };
                let span = stream.span_of(token);
                let span = if span.length == 0 {
                    span.with_length(1)
                } else {
                    span
                };
                (text, span)
            }
            None => {
                let end = u32::try_from(stream.buffer().len()).unwrap_or(u32::MAX);
                (
                    self.namer.display(self.rules.end_of_stream).to_string(),
                    Span::new(stream.position_at(end), 1),
                )
            }
        };

        SyntaxError {
            token,
            expected,
            location,
        }
    }

    /// Collect every terminal acceptable from the state on top of
    /// `stack`, following simulated reductions; `visited` bounds the
    /// recursion.
    fn acceptable(
        &self,
        stack: &[u16],
        visited: &mut HashSet<u16, RandomState>,
        out: &mut Vec<TokenKind>,
    ) {
        let Some(&state) = stack.last() else {
            return;
        };
        let base = self.rules.token_count;
        for index in 0..base {
            let kind = TokenKind::from_index(index);
            let action = self.table.action(state, entity(kind));
            if action > 0 {
                if !out.contains(&kind) {
                    out.push(kind);
                }
            } else if action < 0 {
                let rule_index = (-action) as usize - base;
                let steps = self.rules.rules[rule_index].steps.len();
                if steps >= stack.len() {
                    continue;
                }
                let mut popped = stack[..stack.len() - steps].to_vec();
                let top = popped.last().copied().unwrap_or(ActionTable::INITIAL_STATE);
                let goto = self.table.action(top, entity_of_rule(base, rule_index));
                if goto > 0 {
                    let target = u16::try_from(goto).unwrap_or(ActionTable::INITIAL_STATE);
                    if visited.insert(target) {
                        popped.push(target);
                        self.acceptable(&popped, visited, out);
                    }
                }
            }
        }
    }
}

pub(crate) fn kind_at(stream: &TokenStream, pos: usize, eos: TokenKind) -> TokenKind {
    stream.tokens().get(pos).map_or(eos, |t| t.kind)
}

pub(crate) fn entity(kind: TokenKind) -> u32 {
    u32::try_from(kind.index()).unwrap_or(u32::MAX)
}

pub(crate) fn entity_of_rule(base: usize, rule_index: usize) -> u32 {
    u32::try_from(base + rule_index).unwrap_or(u32::MAX)
}

/// The span a reduction reports: from the symbol on top of the
/// start-token stack through the token just before the cursor.
fn reduction_span(stream: &TokenStream, start_tokens: &[u32], pos: usize) -> Span {
    let tokens = stream.tokens();
    let Some(&top) = start_tokens.last() else {
        return Span::default();
    };
    let Some(first) = tokens.get(top as usize) else {
        return Span::default();
    };
    let last_index = pos.saturating_sub(1).min(tokens.len().saturating_sub(1));
    let Some(last) = tokens.get(last_index) else {
        return Span::default();
    };
    Span::new(
        stream.position_at(first.start),
        last.end().saturating_sub(first.start),
    )
}
