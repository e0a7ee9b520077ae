//! Rule-set elaboration: expands declared rules into the flat, immutable
//! rule set the state-machine builder consumes.
//!
//! Three passes over the declarations:
//!
//! 1. assign a stable id to every `(result type, rank)` pair and record
//!    which rules produce it;
//! 2. expand every subset of optional parameters into its own rule,
//!    lower list parameters into cached end/loop auxiliary rules, and
//!    widen terminal steps with their public refinements;
//! 3. fill the per-rule first and follow token sets to a fixed point.

use crate::error::BuildError;
use crate::grammar::{Capture, Param, ParamShape, ReduceFn, RuleDecl};
use crate::lexer::Vocabulary;
use crate::token::TokenKind;
use ahash::RandomState;
use hashbrown::{HashMap, HashSet};
use lasso::{Key, Rodeo, Spur};
use smallvec::{smallvec, SmallVec};
use std::sync::Arc;

/// Entities are token kinds (`id < K`) and rules (`id >= K`), sharing
/// one id space so the action table can index both.
pub(crate) type EntityId = u32;

pub(crate) type TokenSet = HashSet<TokenKind, RandomState>;

/// The largest id the `i16` action-table encoding can carry.
pub(crate) const MAX_ENTITIES: usize = i16::MAX as usize;

/// One position of an elaborated rule: the entities acceptable there.
#[derive(Debug)]
pub(crate) struct RuleStep {
    pub(crate) sources: SmallVec<[EntityId; 4]>,
    pub(crate) is_terminal: bool,
    pub(crate) tag: Option<u32>,
}

/// What the interpreter needs to bind one declared parameter.
#[derive(Debug)]
pub(crate) enum ParamBinding {
    Terminal { capture: Capture },
    NonTerminal { value_type: usize },
    List { value_type: usize },
}

pub(crate) enum RuleForm<V> {
    /// A rule produced from a declaration; reduces through the callback.
    Method {
        action: ReduceFn<V>,
        params: Arc<[ParamBinding]>,
        provided: SmallVec<[bool; 8]>,
        result: usize,
    },
    /// The final element of a repetition.
    ListEnd,
    /// A repetition continuation (or an unrolled list head).
    ListLoop,
}

pub(crate) struct Rule<V> {
    pub(crate) form: RuleForm<V>,
    pub(crate) steps: SmallVec<[RuleStep; 4]>,
    pub(crate) context: Option<u32>,
    pub(crate) starting_tokens: TokenSet,
    pub(crate) reducing_tokens: TokenSet,
}

impl<V> Rule<V> {
    pub(crate) fn terminal_step_count(&self) -> usize {
        self.steps.iter().filter(|s| s.is_terminal).count()
    }

    pub(crate) fn nonterminal_step_count(&self) -> usize {
        self.steps.len() - self.terminal_step_count()
    }
}

/// The elaborated, immutable rule set.
pub(crate) struct RuleSet<V> {
    pub(crate) rules: Vec<Rule<V>>,
    pub(crate) token_count: usize,
    pub(crate) value_type_count: usize,
    pub(crate) root_type: usize,
    /// Rules producing the root type at any rank, sorted ascending.
    pub(crate) initial_rules: Vec<u32>,
    pub(crate) end_of_stream: TokenKind,
}

impl<V> RuleSet<V> {
    pub(crate) fn entity_count(&self) -> usize {
        self.token_count + self.rules.len()
    }

    pub(crate) fn is_initial(&self, rule_index: usize) -> bool {
        self.initial_rules
            .binary_search(&u32::try_from(rule_index).unwrap_or(u32::MAX))
            .is_ok()
    }

    pub(crate) fn elaborate(
        vocabulary: &Vocabulary,
        decls: Vec<RuleDecl<V>>,
        root: &str,
    ) -> Result<Self, BuildError> {
        let mut elaborator = Elaborator {
            vocabulary,
            types: Rodeo::default(),
            producers: HashMap::default(),
            max_rank: HashMap::default(),
            list_cache: HashMap::default(),
            proto: Vec::new(),
        };
        for decl in decls {
            elaborator.expand_decl(decl)?;
        }
        elaborator.finish(root)
    }
}

/// A rule before non-terminal references are resolved to rule ids.
enum ProtoStep {
    Terminal {
        kinds: SmallVec<[TokenKind; 4]>,
        tag: Option<u32>,
    },
    NonTerminal {
        ty: Spur,
        max_rank: Option<u8>,
        element: bool,
        tag: Option<u32>,
    },
    Rules {
        indices: SmallVec<[u32; 2]>,
        tag: Option<u32>,
    },
}

struct ProtoRule<V> {
    form: RuleForm<V>,
    steps: Vec<ProtoStep>,
    context: Option<u32>,
}

type ListKey = (Spur, Option<u8>, Option<TokenKind>, Option<TokenKind>);

struct Elaborator<'a, V> {
    vocabulary: &'a Vocabulary,
    types: Rodeo,
    producers: HashMap<(Spur, u8), Vec<u32>, RandomState>,
    max_rank: HashMap<Spur, u8, RandomState>,
    list_cache: HashMap<ListKey, (u32, u32), RandomState>,
    proto: Vec<ProtoRule<V>>,
}

impl<V> Elaborator<'_, V> {
    fn expand_decl(&mut self, decl: RuleDecl<V>) -> Result<(), BuildError> {
        let ty = self.types.get_or_intern(&decl.result);
        self.max_rank
            .entry(ty)
            .and_modify(|r| *r = (*r).max(decl.rank))
            .or_insert(decl.rank);

        let bindings: Vec<ParamBinding> = decl
            .params
            .iter()
            .map(|param| match &param.shape {
                ParamShape::Terminal { capture, .. } => ParamBinding::Terminal { capture: *capture },
                ParamShape::NonTerminal { result, .. } => ParamBinding::NonTerminal {
                    value_type: self.types.get_or_intern(result).into_usize(),
                },
                ParamShape::List { result, .. } => ParamBinding::List {
                    value_type: self.types.get_or_intern(result).into_usize(),
                },
            })
            .collect();
        let bindings: Arc<[ParamBinding]> = bindings.into();

        let optional: Vec<usize> = decl
            .params
            .iter()
            .enumerate()
            .filter(|(_, p)| is_optional(p))
            .map(|(i, _)| i)
            .collect();
        if optional.len() > 16 {
            return Err(BuildError::TooManyOptionalParameters {
                name: decl.result.clone(),
                count: optional.len(),
            });
        }

        // enumerate subsets fullest-first so the most complete variant
        // is the first-declared one for conflict resolution
        for mask in (0..(1u32 << optional.len())).rev() {
            let provided: SmallVec<[bool; 8]> = decl
                .params
                .iter()
                .enumerate()
                .map(|(i, _)| match optional.iter().position(|&o| o == i) {
                    Some(bit) => mask & (1 << bit) != 0,
                    None => true,
                })
                .collect();

            let mut steps = Vec::new();
            for (param, &is_provided) in decl.params.iter().zip(&provided) {
                if !is_provided {
                    continue;
                }
                steps.push(self.param_step(param));
            }
            if steps.is_empty() {
                return Err(BuildError::EmptyRule {
                    name: decl.result.clone(),
                });
            }

            let id = self.next_id();
            self.proto.push(ProtoRule {
                form: RuleForm::Method {
                    action: decl.action.clone(),
                    params: bindings.clone(),
                    provided,
                    result: ty.into_usize(),
                },
                steps,
                context: decl.context,
            });
            self.producers.entry((ty, decl.rank)).or_default().push(id);
        }
        Ok(())
    }

    fn param_step(&mut self, param: &Param) -> ProtoStep {
        match &param.shape {
            ParamShape::Terminal { kinds, .. } => ProtoStep::Terminal {
                kinds: self.expand_public(kinds),
                tag: param.tag,
            },
            ParamShape::NonTerminal { result, max_rank } => ProtoStep::NonTerminal {
                ty: self.types.get_or_intern(result),
                max_rank: *max_rank,
                element: false,
                tag: param.tag,
            },
            ParamShape::List {
                result,
                min,
                separator,
                terminator,
                max_rank,
            } => {
                let ty = self.types.get_or_intern(result);
                // a provided optional list holds at least one element
                let min = (*min).max(1);
                ProtoStep::Rules {
                    indices: self.list_sources(ty, *max_rank, *separator, *terminator, min),
                    tag: param.tag,
                }
            }
        }
    }

    /// The rules a list reference expands to, synthesizing the cached
    /// end/loop pair (and, above two, a dedicated head rule).
    fn list_sources(
        &mut self,
        element: Spur,
        max_rank: Option<u8>,
        separator: Option<TokenKind>,
        terminator: Option<TokenKind>,
        min: u32,
    ) -> SmallVec<[u32; 2]> {
        let (end_id, loop_id) = self.list_pair(element, max_rank, separator, terminator);
        match min {
            0 | 1 => smallvec![end_id, loop_id],
            // the loop rule already requires two elements
            2 => smallvec![loop_id],
            min => {
                let mut steps = Vec::new();
                for _ in 0..(min - 1) {
                    steps.push(ProtoStep::NonTerminal {
                        ty: element,
                        max_rank,
                        element: true,
                        tag: None,
                    });
                    if let Some(kind) = terminator.or(separator) {
                        steps.push(ProtoStep::Terminal {
                            kinds: self.expand_public(&[kind]),
                            tag: None,
                        });
                    }
                }
                steps.push(ProtoStep::Rules {
                    indices: smallvec![end_id, loop_id],
                    tag: None,
                });
                let id = self.next_id();
                self.proto.push(ProtoRule {
                    form: RuleForm::ListLoop,
                    steps,
                    context: None,
                });
                smallvec![id]
            }
        }
    }

    fn list_pair(
        &mut self,
        element: Spur,
        max_rank: Option<u8>,
        separator: Option<TokenKind>,
        terminator: Option<TokenKind>,
    ) -> (u32, u32) {
        let key = (element, max_rank, separator, terminator);
        if let Some(&pair) = self.list_cache.get(&key) {
            return pair;
        }

        let end_id = self.next_id();
        let loop_id = end_id + 1;

        // end: the last element, with its terminator when one is set
        let mut end_steps = vec![ProtoStep::NonTerminal {
            ty: element,
            max_rank,
            element: true,
            tag: None,
        }];
        if let Some(kind) = terminator {
            end_steps.push(ProtoStep::Terminal {
                kinds: self.expand_public(&[kind]),
                tag: None,
            });
        }
        self.proto.push(ProtoRule {
            form: RuleForm::ListEnd,
            steps: end_steps,
            context: None,
        });

        // loop: one element, the separator or terminator, then the rest
        let mut loop_steps = vec![ProtoStep::NonTerminal {
            ty: element,
            max_rank,
            element: true,
            tag: None,
        }];
        if let Some(kind) = terminator.or(separator) {
            loop_steps.push(ProtoStep::Terminal {
                kinds: self.expand_public(&[kind]),
                tag: None,
            });
        }
        loop_steps.push(ProtoStep::Rules {
            indices: smallvec![end_id, loop_id],
            tag: None,
        });
        self.proto.push(ProtoRule {
            form: RuleForm::ListLoop,
            steps: loop_steps,
            context: None,
        });

        self.list_cache.insert(key, (end_id, loop_id));
        (end_id, loop_id)
    }

    /// A terminal source set widened with the public refinements of
    /// every listed kind.
    fn expand_public(&self, kinds: &[TokenKind]) -> SmallVec<[TokenKind; 4]> {
        let mut expanded: SmallVec<[TokenKind; 4]> = SmallVec::new();
        for &kind in kinds {
            if !expanded.contains(&kind) {
                expanded.push(kind);
            }
            for &child in self.vocabulary.public_descendants(kind) {
                if !expanded.contains(&child) {
                    expanded.push(child);
                }
            }
        }
        expanded
    }

    fn next_id(&self) -> u32 {
        u32::try_from(self.proto.len()).unwrap_or(u32::MAX)
    }

    fn finish(self, root: &str) -> Result<RuleSet<V>, BuildError> {
        let token_count = self.vocabulary.len();
        if token_count + self.proto.len() > MAX_ENTITIES {
            return Err(BuildError::TooManyEntities {
                entities: token_count + self.proto.len(),
            });
        }

        let Elaborator {
            vocabulary,
            types,
            producers,
            max_rank,
            proto,
            ..
        } = self;

        let resolve_sources = |ty: Spur,
                               cap: Option<u8>,
                               element: bool|
         -> Result<SmallVec<[EntityId; 4]>, BuildError> {
            let name = || types.resolve(&ty).into();
            let Some(&top) = max_rank.get(&ty) else {
                return Err(if element {
                    BuildError::UnknownElementType { name: name() }
                } else {
                    BuildError::UnknownResultType { name: name() }
                });
            };
            let cap = cap.map_or(top, |c| c.min(top));
            let mut sources: SmallVec<[EntityId; 4]> = SmallVec::new();
            for rank in 0..=cap {
                if let Some(ids) = producers.get(&(ty, rank)) {
                    sources.extend(
                        ids.iter()
                            .map(|&id| id + u32::try_from(token_count).unwrap_or(u32::MAX)),
                    );
                }
            }
            sources.sort_unstable();
            if sources.is_empty() {
                return Err(if element {
                    BuildError::UnknownElementType { name: name() }
                } else {
                    BuildError::UnknownResultType { name: name() }
                });
            }
            Ok(sources)
        };

        let base = u32::try_from(token_count).unwrap_or(u32::MAX);
        let mut rules: Vec<Rule<V>> = Vec::with_capacity(proto.len());
        for proto_rule in proto {
            let mut steps: SmallVec<[RuleStep; 4]> = SmallVec::new();
            for step in proto_rule.steps {
                steps.push(match step {
                    ProtoStep::Terminal { kinds, tag } => RuleStep {
                        sources: kinds
                            .iter()
                            .map(|k| EntityId::try_from(k.index()).unwrap_or(u32::MAX))
                            .collect(),
                        is_terminal: true,
                        tag,
                    },
                    ProtoStep::NonTerminal {
                        ty,
                        max_rank,
                        element,
                        tag,
                    } => RuleStep {
                        sources: resolve_sources(ty, max_rank, element)?,
                        is_terminal: false,
                        tag,
                    },
                    ProtoStep::Rules { indices, tag } => RuleStep {
                        sources: indices.iter().map(|&id| id + base).collect(),
                        is_terminal: false,
                        tag,
                    },
                });
            }
            rules.push(Rule {
                form: proto_rule.form,
                steps,
                context: proto_rule.context,
                starting_tokens: TokenSet::default(),
                reducing_tokens: TokenSet::default(),
            });
        }

        let Some(root_spur) = types.get(root) else {
            return Err(BuildError::UnknownResultType { name: root.into() });
        };
        let Some(&root_max) = max_rank.get(&root_spur) else {
            return Err(BuildError::UnknownResultType { name: root.into() });
        };
        let mut initial_rules: Vec<u32> = Vec::new();
        for rank in 0..=root_max {
            if let Some(ids) = producers.get(&(root_spur, rank)) {
                initial_rules.extend_from_slice(ids);
            }
        }
        initial_rules.sort_unstable();

        let mut set = RuleSet {
            rules,
            token_count,
            value_type_count: types.len(),
            root_type: root_spur.into_usize(),
            initial_rules,
            end_of_stream: vocabulary.end_of_stream_kind(),
        };
        set.fill_starting_tokens();
        set.fill_reducing_tokens();
        Ok(set)
    }
}

fn is_optional(param: &Param) -> bool {
    match &param.shape {
        ParamShape::List { min, .. } => *min == 0,
        _ => param.optional,
    }
}

impl<V> RuleSet<V> {
    fn fill_starting_tokens(&mut self) {
        let base = self.token_count;
        for rule in &mut self.rules {
            if let Some(first) = rule.steps.first() {
                if first.is_terminal {
                    rule.starting_tokens = first
                        .sources
                        .iter()
                        .map(|&e| TokenKind::from_index(e as usize))
                        .collect();
                }
            }
        }
        loop {
            let mut changed = false;
            for i in 0..self.rules.len() {
                let Some(first) = self.rules[i].steps.first() else {
                    continue;
                };
                if first.is_terminal {
                    continue;
                }
                let additions: Vec<TokenKind> = first
                    .sources
                    .iter()
                    .flat_map(|&e| {
                        self.rules[e as usize - base]
                            .starting_tokens
                            .iter()
                            .copied()
                            .collect::<Vec<_>>()
                    })
                    .collect();
                for token in additions {
                    if self.rules[i].starting_tokens.insert(token) {
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }
    }

    fn fill_reducing_tokens(&mut self) {
        let base = self.token_count;
        let end_of_stream = self.end_of_stream;
        for rule in &mut self.rules {
            rule.reducing_tokens.insert(end_of_stream);
        }
        loop {
            let mut changed = false;
            let mut additions: Vec<(usize, Vec<TokenKind>)> = Vec::new();
            for rule in &self.rules {
                let steps = &rule.steps;
                for j in 0..steps.len().saturating_sub(1) {
                    if steps[j].is_terminal {
                        continue;
                    }
                    let next = &steps[j + 1];
                    let tokens: Vec<TokenKind> = if next.is_terminal {
                        next.sources
                            .iter()
                            .map(|&e| TokenKind::from_index(e as usize))
                            .collect()
                    } else {
                        next.sources
                            .iter()
                            .flat_map(|&e| {
                                self.rules[e as usize - base]
                                    .starting_tokens
                                    .iter()
                                    .copied()
                                    .collect::<Vec<_>>()
                            })
                            .collect()
                    };
                    for &source in &steps[j].sources {
                        additions.push((source as usize - base, tokens.clone()));
                    }
                }
                if let Some(last) = steps.last() {
                    if !last.is_terminal {
                        let follow: Vec<TokenKind> = rule.reducing_tokens.iter().copied().collect();
                        for &source in &last.sources {
                            additions.push((source as usize - base, follow.clone()));
                        }
                    }
                }
            }
            for (target, tokens) in additions {
                for token in tokens {
                    if self.rules[target].reducing_tokens.insert(token) {
                        changed = true;
                    }
                }
            }
            if !changed {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::Param;
    use crate::lexer::{Matcher, VocabularyBuilder};

    struct Fixture {
        vocabulary: Vocabulary,
        number: TokenKind,
        comma: TokenKind,
        plus: TokenKind,
    }

    fn fixture() -> Fixture {
        let mut builder = VocabularyBuilder::new();
        let number = builder.token("number", Matcher::pattern("[0-9]+").unwrap());
        let comma = builder.literals(",", &[","]);
        let plus = builder.literals("+", &["+"]);
        builder.error("error");
        builder.end_of_stream("end-of-script");
        Fixture {
            vocabulary: builder.build().unwrap(),
            number,
            comma,
            plus,
        }
    }

    fn kinds(set: &TokenSet) -> Vec<TokenKind> {
        let mut kinds: Vec<TokenKind> = set.iter().copied().collect();
        kinds.sort_unstable();
        kinds
    }

    #[test]
    fn test_optional_parameter_expands_to_two_variants() {
        let f = fixture();
        let decls = vec![RuleDecl::<i64>::new("item", |_| Ok(0))
            .param(Param::terminal(&[f.number]))
            .param(Param::terminal(&[f.plus]).optional())];
        let set = RuleSet::elaborate(&f.vocabulary, decls, "item").unwrap();

        assert_eq!(set.rules.len(), 2);
        // fullest variant first
        assert_eq!(set.rules[0].steps.len(), 2);
        assert_eq!(set.rules[1].steps.len(), 1);
        match &set.rules[0].form {
            RuleForm::Method { provided, .. } => assert_eq!(provided.as_slice(), &[true, true]),
            _ => panic!("expected a method rule"),
        }
        match &set.rules[1].form {
            RuleForm::Method { provided, .. } => assert_eq!(provided.as_slice(), &[true, false]),
            _ => panic!("expected a method rule"),
        }
    }

    #[test]
    fn test_list_lowering_synthesizes_end_and_loop() {
        let f = fixture();
        let decls = vec![
            RuleDecl::<i64>::new("item", |_| Ok(0)).param(Param::terminal(&[f.number])),
            RuleDecl::<i64>::new("seq", |_| Ok(0))
                .param(Param::list("item").separator(f.comma)),
        ];
        let set = RuleSet::elaborate(&f.vocabulary, decls, "seq").unwrap();

        // item, seq, plus the end/loop pair
        assert_eq!(set.rules.len(), 4);
        let ends = set
            .rules
            .iter()
            .filter(|r| matches!(r.form, RuleForm::ListEnd))
            .count();
        let loops = set
            .rules
            .iter()
            .filter(|r| matches!(r.form, RuleForm::ListLoop))
            .count();
        assert_eq!(ends, 1);
        assert_eq!(loops, 1);
    }

    #[test]
    fn test_list_pair_is_cached_across_rules() {
        let f = fixture();
        let decls = vec![
            RuleDecl::<i64>::new("item", |_| Ok(0)).param(Param::terminal(&[f.number])),
            RuleDecl::<i64>::new("seq", |_| Ok(0))
                .param(Param::list("item").separator(f.comma)),
            RuleDecl::<i64>::new("seq", |_| Ok(0))
                .param(Param::terminal(&[f.plus]))
                .param(Param::list("item").separator(f.comma)),
        ];
        let set = RuleSet::elaborate(&f.vocabulary, decls, "seq").unwrap();

        // the second list reference reuses the cached pair
        assert_eq!(set.rules.len(), 5);
    }

    #[test]
    fn test_list_min_three_unrolls_a_head_rule() {
        let f = fixture();
        let decls = vec![
            RuleDecl::<i64>::new("item", |_| Ok(0)).param(Param::terminal(&[f.number])),
            RuleDecl::<i64>::new("seq", |_| Ok(0))
                .param(Param::list("item").separator(f.comma).min(3)),
        ];
        let set = RuleSet::elaborate(&f.vocabulary, decls, "seq").unwrap();

        // item, seq, end, loop, head
        assert_eq!(set.rules.len(), 5);
        let head = set
            .rules
            .iter()
            .find(|r| matches!(r.form, RuleForm::ListLoop) && r.steps.len() == 5)
            .expect("head rule unrolling two leading elements");
        assert!(!head.steps[0].is_terminal);
        assert!(head.steps[1].is_terminal);
    }

    #[test]
    fn test_unknown_result_type() {
        let f = fixture();
        let decls = vec![RuleDecl::<i64>::new("item", |_| Ok(0))
            .param(Param::nonterminal("missing"))];
        assert!(matches!(
            RuleSet::elaborate(&f.vocabulary, decls, "item"),
            Err(BuildError::UnknownResultType { .. })
        ));
    }

    #[test]
    fn test_unknown_root_type() {
        let f = fixture();
        let decls =
            vec![RuleDecl::<i64>::new("item", |_| Ok(0)).param(Param::terminal(&[f.number]))];
        assert!(matches!(
            RuleSet::elaborate(&f.vocabulary, decls, "missing"),
            Err(BuildError::UnknownResultType { .. })
        ));
    }

    #[test]
    fn test_fully_optional_rule_is_rejected() {
        let f = fixture();
        let decls = vec![RuleDecl::<i64>::new("item", |_| Ok(0))
            .param(Param::terminal(&[f.number]).optional())];
        assert!(matches!(
            RuleSet::elaborate(&f.vocabulary, decls, "item"),
            Err(BuildError::EmptyRule { .. })
        ));
    }

    #[test]
    fn test_starting_tokens_propagate_through_nonterminals() {
        let f = fixture();
        let decls = vec![
            RuleDecl::<i64>::new("atom", |_| Ok(0)).param(Param::terminal(&[f.number])),
            RuleDecl::<i64>::new("sum", |_| Ok(0))
                .param(Param::nonterminal("atom"))
                .param(Param::terminal(&[f.plus]))
                .param(Param::nonterminal("atom")),
        ];
        let set = RuleSet::elaborate(&f.vocabulary, decls, "sum").unwrap();

        assert_eq!(kinds(&set.rules[0].starting_tokens), vec![f.number]);
        assert_eq!(kinds(&set.rules[1].starting_tokens), vec![f.number]);
    }

    #[test]
    fn test_reducing_tokens_include_followers_and_end_of_stream() {
        let f = fixture();
        let decls = vec![
            RuleDecl::<i64>::new("atom", |_| Ok(0)).param(Param::terminal(&[f.number])),
            RuleDecl::<i64>::new("sum", |_| Ok(0))
                .param(Param::nonterminal("atom"))
                .param(Param::terminal(&[f.plus]))
                .param(Param::nonterminal("atom")),
        ];
        let set = RuleSet::elaborate(&f.vocabulary, decls, "sum").unwrap();

        let eos = f.vocabulary.end_of_stream_kind();
        // atom is followed by `+` in the middle of sum, and inherits the
        // follow set of sum at its end
        assert_eq!(kinds(&set.rules[0].reducing_tokens), vec![f.plus, eos]);
        assert_eq!(kinds(&set.rules[1].reducing_tokens), vec![eos]);
    }

    #[test]
    fn test_terminal_steps_expand_public_refinements() {
        let mut builder = VocabularyBuilder::new();
        let ident = builder.token("identifier", Matcher::pattern("[a-z]+").unwrap());
        let kw = builder.refine("if", ident, Matcher::literals(&["if"]), crate::lexer::Access::Public);
        let hidden = builder.refine(
            "secret",
            ident,
            Matcher::literals(&["secret"]),
            crate::lexer::Access::Private,
        );
        builder.error("error");
        builder.end_of_stream("end-of-script");
        let vocabulary = builder.build().unwrap();

        let decls =
            vec![RuleDecl::<i64>::new("stmt", |_| Ok(0)).param(Param::terminal(&[ident]))];
        let set = RuleSet::elaborate(&vocabulary, decls, "stmt").unwrap();

        let sources = &set.rules[0].steps[0].sources;
        assert!(sources.contains(&(ident.index() as u32)));
        assert!(sources.contains(&(kw.index() as u32)));
        assert!(!sources.contains(&(hidden.index() as u32)));
    }
}
