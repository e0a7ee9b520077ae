//! SLR(1) state-machine construction: canonical LR(0) item sets with
//! reductions restricted by the per-rule follow sets.
//!
//! The result is a dense `i16` action matrix indexed by
//! `(state - 1) * entity_count + entity`: positive values shift (or, for
//! rule entities, goto), negative values reduce by the rule entity
//! `-value`, and zero is an error. State 0 is reserved; real states are
//! numbered from 1.

use crate::error::BuildError;
use crate::grammar::ruleset::{EntityId, RuleSet};
use ahash::RandomState;
use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

pub(crate) const MAX_STATES: usize = 32_767;

/// An LR(0) item: a rule index and a dot position.
type Item = (u32, u16);

pub(crate) struct ActionTable {
    actions: Vec<i16>,
    entity_count: usize,
    state_count: usize,
    /// Context tags per state, in item order, deduplicated.
    state_tags: Vec<SmallVec<[u32; 2]>>,
}

impl ActionTable {
    pub(crate) const INITIAL_STATE: u16 = 1;

    pub(crate) fn action(&self, state: u16, entity: EntityId) -> i16 {
        self.actions[(state as usize - 1) * self.entity_count + entity as usize]
    }

    pub(crate) fn tags(&self, state: u16) -> &[u32] {
        &self.state_tags[state as usize - 1]
    }

    pub(crate) const fn state_count(&self) -> usize {
        self.state_count
    }

    pub(crate) fn build<V>(ruleset: &RuleSet<V>) -> Result<Self, BuildError> {
        Builder {
            ruleset,
            states: Vec::new(),
            index: HashMap::default(),
            actions: Vec::new(),
        }
        .build()
    }
}

struct Builder<'a, V> {
    ruleset: &'a RuleSet<V>,
    /// Canonical item lists; position = state - 1.
    states: Vec<Box<[Item]>>,
    index: HashMap<Box<[Item]>, u16, RandomState>,
    actions: Vec<i16>,
}

impl<V> Builder<'_, V> {
    fn build(mut self) -> Result<ActionTable, BuildError> {
        let entity_count = self.ruleset.entity_count();
        let token_count = self.ruleset.token_count;

        let initial: Vec<Item> = self
            .ruleset
            .initial_rules
            .iter()
            .map(|&rule| (rule, 0))
            .collect();
        self.intern(self.close(initial))?;

        // states are appended while earlier ones are processed, so a
        // plain index walk doubles as the worklist
        let mut state = 0;
        while state < self.states.len() {
            let items = self.states[state].clone();

            let mut transitions: Vec<(EntityId, Vec<Item>)> = Vec::new();
            let mut by_entity: HashMap<EntityId, usize, RandomState> = HashMap::default();
            for &(rule, dot) in items.iter() {
                let steps = &self.ruleset.rules[rule as usize].steps;
                let Some(step) = steps.get(dot as usize) else {
                    continue;
                };
                for &source in &step.sources {
                    let slot = *by_entity.entry(source).or_insert_with(|| {
                        transitions.push((source, Vec::new()));
                        transitions.len() - 1
                    });
                    transitions[slot].1.push((rule, dot + 1));
                }
            }
            // ascending entity order keeps state numbering and conflict
            // resolution deterministic
            transitions.sort_by_key(|(entity, _)| *entity);

            for (entity, goto_items) in transitions {
                let target = self.intern(self.close(goto_items))?;
                self.actions[state * entity_count + entity as usize] =
                    i16::try_from(target).unwrap_or(0);
            }
            state += 1;
        }

        self.insert_reductions(entity_count, token_count);
        let state_tags = self.collect_tags();

        Ok(ActionTable {
            actions: self.actions,
            entity_count,
            state_count: self.states.len(),
            state_tags,
        })
    }

    /// Close an item list: every non-terminal position pulls in the
    /// fresh items of its source rules. Returns the canonical sorted,
    /// deduplicated list.
    fn close(&self, mut items: Vec<Item>) -> Box<[Item]> {
        let base = self.ruleset.token_count;
        let mut seen: HashSet<Item, RandomState> = items.iter().copied().collect();
        let mut cursor = 0;
        while cursor < items.len() {
            let (rule, dot) = items[cursor];
            cursor += 1;
            let steps = &self.ruleset.rules[rule as usize].steps;
            let Some(step) = steps.get(dot as usize) else {
                continue;
            };
            if step.is_terminal {
                continue;
            }
            for &source in &step.sources {
                let item = (source - base as u32, 0);
                if seen.insert(item) {
                    items.push(item);
                }
            }
        }
        items.sort_unstable();
        items.dedup();
        items.into_boxed_slice()
    }

    /// Intern a closed item list, allocating a new state (and a zeroed
    /// action row) the first time it is seen.
    fn intern(&mut self, items: Box<[Item]>) -> Result<u16, BuildError> {
        if let Some(&state) = self.index.get(&items) {
            return Ok(state);
        }
        if self.states.len() >= MAX_STATES {
            return Err(BuildError::TooManyStates {
                states: self.states.len() + 1,
            });
        }
        self.states.push(items.clone());
        self.actions
            .extend(std::iter::repeat(0).take(self.ruleset.entity_count()));
        let state = u16::try_from(self.states.len()).unwrap_or(u16::MAX);
        self.index.insert(items, state);
        Ok(state)
    }

    /// Reduction actions for every completed item. A shift already in
    /// place wins; between different reduces the first assignment wins.
    fn insert_reductions(&mut self, entity_count: usize, token_count: usize) {
        for (state, items) in self.states.iter().enumerate() {
            for &(rule, dot) in items.iter() {
                let r = &self.ruleset.rules[rule as usize];
                if (dot as usize) < r.steps.len() {
                    continue;
                }
                let reduce =
                    -(i16::try_from(token_count + rule as usize).unwrap_or(i16::MAX));
                for &token in &r.reducing_tokens {
                    let slot = &mut self.actions[state * entity_count + token.index()];
                    if *slot == 0 {
                        *slot = reduce;
                    }
                }
            }
        }
    }

    /// Per-state context tags: the step tag at the item's position when
    /// one is set, otherwise the rule's own tag.
    fn collect_tags(&self) -> Vec<SmallVec<[u32; 2]>> {
        self.states
            .iter()
            .map(|items| {
                let mut tags: SmallVec<[u32; 2]> = SmallVec::new();
                for &(rule, dot) in items.iter() {
                    let r = &self.ruleset.rules[rule as usize];
                    let tag = r
                        .steps
                        .get(dot as usize)
                        .and_then(|step| step.tag)
                        .or(r.context);
                    if let Some(tag) = tag {
                        if !tags.contains(&tag) {
                            tags.push(tag);
                        }
                    }
                }
                tags
            })
            .collect()
    }
}
