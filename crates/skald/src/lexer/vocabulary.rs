use crate::error::BuildError;
use crate::lexer::matcher::Matcher;
use crate::lexer::scanner;
use crate::token::{TokenKind, TokenStream};
use compact_str::CompactString;
use smallvec::SmallVec;

/// Visibility of a refinement.
///
/// A public child is accepted by the parser wherever its ancestor is; a
/// private child is a reserved refinement the parser treats as its own
/// kind only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Role {
    Plain,
    Error,
    EndOfStream,
    EndOfLine,
    Indent,
    Dedent,
}

#[derive(Debug)]
pub(crate) struct KindInfo {
    pub(crate) name: CompactString,
    pub(crate) matcher: Option<Matcher>,
    pub(crate) role: Role,
    pub(crate) can_be_prefix: bool,
    pub(crate) can_be_postfix: bool,
    pub(crate) parent: Option<TokenKind>,
    pub(crate) public: bool,
    pub(crate) children: SmallVec<[TokenKind; 2]>,
}

/// Declares the closed set of token kinds a lexer recognizes.
///
/// Kinds are numbered in declaration order. Exactly one error kind and
/// one end-of-stream kind must be declared; end-of-line, indent, and
/// dedent are optional (indent and dedent come as a pair).
pub struct VocabularyBuilder {
    kinds: Vec<KindInfo>,
    comments: Option<Matcher>,
    escape_newlines: bool,
}

impl Default for VocabularyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl VocabularyBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            kinds: Vec::new(),
            comments: None,
            escape_newlines: false,
        }
    }

    fn push(&mut self, info: KindInfo) -> TokenKind {
        let kind = TokenKind::from_index(self.kinds.len());
        self.kinds.push(info);
        kind
    }

    fn plain(&mut self, name: &str, matcher: Option<Matcher>, role: Role) -> TokenKind {
        self.push(KindInfo {
            name: CompactString::from(name),
            matcher,
            role,
            can_be_prefix: true,
            can_be_postfix: true,
            parent: None,
            public: false,
            children: SmallVec::new(),
        })
    }

    /// Declare a kind matched by `matcher`.
    pub fn token(&mut self, name: &str, matcher: Matcher) -> TokenKind {
        self.plain(name, Some(matcher), Role::Plain)
    }

    /// Declare a kind matched by a case-sensitive literal set.
    pub fn literals(&mut self, name: &str, alternatives: &[&str]) -> TokenKind {
        self.token(name, Matcher::literals(alternatives))
    }

    /// Declare a kind matched by its own name, case-insensitively.
    pub fn keyword(&mut self, name: &str) -> TokenKind {
        self.token(name, Matcher::literals_ci(&[name]))
    }

    /// Declare a refinement of `parent`: a kind matched only against
    /// text the parent already recognized, for the same length.
    pub fn refine(
        &mut self,
        name: &str,
        parent: TokenKind,
        matcher: Matcher,
        access: Access,
    ) -> TokenKind {
        self.push(KindInfo {
            name: CompactString::from(name),
            matcher: Some(matcher),
            role: Role::Plain,
            can_be_prefix: true,
            can_be_postfix: true,
            parent: Some(parent),
            public: access == Access::Public,
            children: SmallVec::new(),
        })
    }

    /// Declare the kind emitted for unmatched characters.
    pub fn error(&mut self, name: &str) -> TokenKind {
        self.plain(name, None, Role::Error)
    }

    /// Declare the kind emitted once at the end of the stream.
    pub fn end_of_stream(&mut self, name: &str) -> TokenKind {
        self.plain(name, None, Role::EndOfStream)
    }

    /// Declare the zero-length kind emitted at line breaks.
    pub fn end_of_line(&mut self, name: &str) -> TokenKind {
        self.plain(name, None, Role::EndOfLine)
    }

    /// Declare the zero-length kind emitted when indentation deepens.
    pub fn indent(&mut self, name: &str) -> TokenKind {
        self.plain(name, None, Role::Indent)
    }

    /// Declare the zero-length kind emitted when indentation returns.
    pub fn dedent(&mut self, name: &str) -> TokenKind {
        self.plain(name, None, Role::Dedent)
    }

    /// Set the comment matcher; matched comments are skipped.
    pub fn comments(&mut self, matcher: Matcher) {
        self.comments = Some(matcher);
    }

    /// When set, a backslash immediately before a newline consumes it.
    pub fn escape_newlines(&mut self, enabled: bool) {
        self.escape_newlines = enabled;
    }

    /// Mark `kind` as unable to start an expression; a line break just
    /// before it is suppressed.
    pub fn no_prefix(&mut self, kind: TokenKind) {
        self.kinds[kind.index()].can_be_prefix = false;
    }

    /// Mark `kind` as unable to end an expression; a line break just
    /// after it is suppressed.
    pub fn no_postfix(&mut self, kind: TokenKind) {
        self.kinds[kind.index()].can_be_postfix = false;
    }

    pub fn build(mut self) -> Result<Vocabulary, BuildError> {
        let error = self.unique_role(Role::Error, "error")?;
        let end_of_stream = self.unique_role(Role::EndOfStream, "end-of-stream")?;
        let end_of_line = self.optional_role(Role::EndOfLine, "end-of-line")?;
        let indent = self.optional_role(Role::Indent, "indent")?;
        let dedent = self.optional_role(Role::Dedent, "dedent")?;
        if indent.is_some() != dedent.is_some() {
            return Err(BuildError::IndentWithoutDedent);
        }

        for info in &self.kinds {
            if info.role == Role::Plain && info.matcher.is_none() {
                return Err(BuildError::MissingMatcher {
                    name: info.name.clone(),
                });
            }
        }

        // parents are declared before their children, so the refinement
        // forest is acyclic by construction
        let mut roots = Vec::new();
        for index in 0..self.kinds.len() {
            let kind = TokenKind::from_index(index);
            let parent = self.kinds[index].parent;
            if let Some(parent) = parent {
                self.kinds[parent.index()].children.push(kind);
            } else if self.kinds[index].role == Role::Plain {
                roots.push(kind);
            }
        }

        let public_descendants = compute_public_descendants(&self.kinds);

        Ok(Vocabulary {
            kinds: self.kinds,
            roots,
            comments: self.comments,
            escape_newlines: self.escape_newlines,
            error,
            end_of_stream,
            end_of_line,
            indent,
            dedent,
            public_descendants,
        })
    }

    fn unique_role(&self, role: Role, name: &'static str) -> Result<TokenKind, BuildError> {
        self.optional_role(role, name)?
            .ok_or(BuildError::MissingRole { role: name })
    }

    fn optional_role(&self, role: Role, name: &'static str) -> Result<Option<TokenKind>, BuildError> {
        let mut found = None;
        for (index, info) in self.kinds.iter().enumerate() {
            if info.role == role {
                if found.is_some() {
                    return Err(BuildError::DuplicateRole { role: name });
                }
                found = Some(TokenKind::from_index(index));
            }
        }
        Ok(found)
    }
}

fn compute_public_descendants(kinds: &[KindInfo]) -> Vec<SmallVec<[TokenKind; 4]>> {
    let mut result: Vec<SmallVec<[TokenKind; 4]>> = vec![SmallVec::new(); kinds.len()];
    for start in 0..kinds.len() {
        let mut pending: Vec<TokenKind> = kinds[start]
            .children
            .iter()
            .copied()
            .filter(|c| kinds[c.index()].public)
            .collect();
        while let Some(kind) = pending.pop() {
            result[start].push(kind);
            for &child in &kinds[kind.index()].children {
                if kinds[child.index()].public {
                    pending.push(child);
                }
            }
        }
        result[start].sort_unstable();
    }
    result
}

/// A compiled, immutable set of token kinds plus the lexer options that
/// drive scanning. Built once by [`VocabularyBuilder::build`].
pub struct Vocabulary {
    kinds: Vec<KindInfo>,
    roots: Vec<TokenKind>,
    comments: Option<Matcher>,
    escape_newlines: bool,
    error: TokenKind,
    end_of_stream: TokenKind,
    end_of_line: Option<TokenKind>,
    indent: Option<TokenKind>,
    dedent: Option<TokenKind>,
    public_descendants: Vec<SmallVec<[TokenKind; 4]>>,
}

impl Vocabulary {
    /// Number of declared kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// The name a kind was declared with.
    #[must_use]
    pub fn name(&self, kind: TokenKind) -> &str {
        &self.kinds[kind.index()].name
    }

    #[must_use]
    pub const fn error_kind(&self) -> TokenKind {
        self.error
    }

    #[must_use]
    pub const fn end_of_stream_kind(&self) -> TokenKind {
        self.end_of_stream
    }

    #[must_use]
    pub const fn end_of_line_kind(&self) -> Option<TokenKind> {
        self.end_of_line
    }

    #[must_use]
    pub const fn indent_kind(&self) -> Option<TokenKind> {
        self.indent
    }

    #[must_use]
    pub const fn dedent_kind(&self) -> Option<TokenKind> {
        self.dedent
    }

    /// Transitive descendants of `kind` reachable through an unbroken
    /// chain of public refinements.
    #[must_use]
    pub fn public_descendants(&self, kind: TokenKind) -> &[TokenKind] {
        &self.public_descendants[kind.index()]
    }

    pub(crate) fn info(&self, kind: TokenKind) -> &KindInfo {
        &self.kinds[kind.index()]
    }

    pub(crate) fn roots(&self) -> &[TokenKind] {
        &self.roots
    }

    pub(crate) const fn comments(&self) -> Option<&Matcher> {
        self.comments.as_ref()
    }

    pub(crate) const fn escapes_newlines(&self) -> bool {
        self.escape_newlines
    }

    pub(crate) const fn tracks_indentation(&self) -> bool {
        self.indent.is_some()
    }

    /// Tokenize `text` completely, ending with the end-of-stream token.
    #[must_use]
    pub fn scan(&self, text: &str) -> TokenStream {
        scanner::scan(self, text, false)
    }

    /// Tokenize a truncated prefix: no synthetic trailing end-of-line,
    /// dedent, or end-of-stream tokens are emitted.
    #[must_use]
    pub fn scan_partial(&self, text: &str) -> TokenStream {
        scanner::scan(self, text, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> VocabularyBuilder {
        let mut builder = VocabularyBuilder::new();
        builder.error("error");
        builder.end_of_stream("end-of-script");
        builder
    }

    #[test]
    fn test_missing_error_role() {
        let mut builder = VocabularyBuilder::new();
        builder.end_of_stream("eos");
        assert!(matches!(
            builder.build(),
            Err(BuildError::MissingRole { role: "error" })
        ));
    }

    #[test]
    fn test_duplicate_role() {
        let mut builder = base();
        builder.error("error2");
        assert!(matches!(
            builder.build(),
            Err(BuildError::DuplicateRole { role: "error" })
        ));
    }

    #[test]
    fn test_indent_requires_dedent() {
        let mut builder = base();
        builder.end_of_line("eol");
        builder.indent("indent");
        assert!(matches!(
            builder.build(),
            Err(BuildError::IndentWithoutDedent)
        ));
    }

    #[test]
    fn test_public_descendants() {
        let mut builder = base();
        let ident = builder.token("identifier", Matcher::pattern("[a-z]+").unwrap());
        let kw_if = builder.refine("if", ident, Matcher::literals(&["if"]), Access::Public);
        let kw_else = builder.refine("else", ident, Matcher::literals(&["else"]), Access::Public);
        let hidden = builder.refine("secret", ident, Matcher::literals(&["secret"]), Access::Private);
        let nested = builder.refine("elseif", kw_else, Matcher::literals(&["elseif"]), Access::Public);
        let vocabulary = builder.build().unwrap();

        let mut expanded = vocabulary.public_descendants(ident).to_vec();
        expanded.sort_unstable();
        assert_eq!(expanded, vec![kw_if, kw_else, nested]);
        assert!(!vocabulary.public_descendants(ident).contains(&hidden));
        assert!(vocabulary.public_descendants(kw_if).is_empty());
    }

    #[test]
    fn test_private_chain_blocks_public_grandchild() {
        let mut builder = base();
        let ident = builder.token("identifier", Matcher::pattern("[a-z]+").unwrap());
        let private = builder.refine("private", ident, Matcher::literals(&["p"]), Access::Private);
        let public_leaf = builder.refine("leaf", private, Matcher::literals(&["pq"]), Access::Public);
        let vocabulary = builder.build().unwrap();

        // the chain through a private edge is broken
        assert!(vocabulary.public_descendants(ident).is_empty());
        assert_eq!(vocabulary.public_descendants(private), &[public_leaf]);
    }

    #[test]
    fn test_names_and_roles() {
        let mut builder = base();
        let number = builder.token("number", Matcher::pattern("[0-9]+").unwrap());
        let vocabulary = builder.build().unwrap();
        assert_eq!(vocabulary.name(number), "number");
        assert_eq!(vocabulary.name(vocabulary.error_kind()), "error");
        assert_eq!(vocabulary.len(), 3);
    }
}
