//! Context evaluation for editor tooling: runs the machine without
//! reductions up to a byte offset and reports what the parser would
//! accept there.

use crate::parser::driver::{entity, entity_of_rule, Parser};
use crate::parser::table::ActionTable;
use crate::token::{Token, TokenKind};

/// A terminal the parser would shift in the reached state, with the
/// context tags of the state the shift leads to.
#[derive(Debug, Clone)]
pub struct ShiftableTerminal {
    pub kind: TokenKind,
    pub context: Vec<u32>,
}

/// What the parser knows at a cursor position.
#[derive(Debug, Clone)]
pub struct ContextEvaluation {
    /// Context tags of the states below and at the cursor, in stack
    /// order with consecutive duplicates collapsed.
    pub context_stack: Vec<u32>,
    /// Context tags of the state the evaluation stopped in.
    pub state_context: Vec<u32>,
    /// Terminals shiftable in the stopped state.
    pub shiftable: Vec<ShiftableTerminal>,
    /// The last token the evaluation processed, if any.
    pub last_token: Option<Token>,
    /// True when the stop was a syntax error rather than the offset
    /// limit.
    pub hit_error: bool,
}

impl<V> Parser<V> {
    /// Run the machine in no-reduction mode over the prefix of `text`
    /// ending at `offset`.
    ///
    /// Reductions still drive the state stack but no callback runs and
    /// no semantic values are produced.
    #[must_use]
    pub fn evaluate_context(&self, text: &str, offset: usize) -> ContextEvaluation {
        let stream = self.vocabulary.scan_partial(text);
        let base = self.rules.token_count;

        let mut state = ActionTable::INITIAL_STATE;
        let mut state_stack: Vec<u16> = Vec::new();
        let mut last_token: Option<Token> = None;
        let mut hit_error = false;
        let mut pos = 0usize;

        while let Some(token) = stream.tokens().get(pos).copied() {
            if token.end() as usize > offset {
                break;
            }
            let action = self.table.action(state, entity(token.kind));
            if action > 0 {
                state_stack.push(state);
                state = u16::try_from(action).unwrap_or(ActionTable::INITIAL_STATE);
                last_token = Some(token);
                pos += 1;
                continue;
            }
            if action == 0 {
                hit_error = true;
                break;
            }
            let rule_index = (-action) as usize - base;
            let step_count = self.rules.rules[rule_index].steps.len();
            for _ in 0..step_count.saturating_sub(1) {
                state_stack.pop();
            }
            state = state_stack
                .last()
                .copied()
                .unwrap_or(ActionTable::INITIAL_STATE);
            let goto = self.table.action(state, entity_of_rule(base, rule_index));
            if goto <= 0 {
                hit_error = !self.rules.is_initial(rule_index);
                break;
            }
            state = u16::try_from(goto).unwrap_or(ActionTable::INITIAL_STATE);
        }

        let mut context_stack: Vec<u32> = Vec::new();
        for &frame in state_stack.iter().chain(std::iter::once(&state)) {
            for &tag in self.table.tags(frame) {
                if context_stack.last() != Some(&tag) {
                    context_stack.push(tag);
                }
            }
        }

        let shiftable = (0..base)
            .filter_map(|index| {
                let kind = TokenKind::from_index(index);
                let action = self.table.action(state, entity(kind));
                if action > 0 {
                    let target = u16::try_from(action).unwrap_or(ActionTable::INITIAL_STATE);
                    Some(ShiftableTerminal {
                        kind,
                        context: self.table.tags(target).to_vec(),
                    })
                } else {
                    None
                }
            })
            .collect();

        ContextEvaluation {
            context_stack,
            state_context: self.table.tags(state).to_vec(),
            shiftable,
            last_token,
            hit_error,
        }
    }
}
