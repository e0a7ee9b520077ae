use crate::error::BuildError;
use compact_str::CompactString;
use smallvec::SmallVec;

/// A compiled token matcher: a regular expression or an ordered set of
/// literal alternatives, always anchored at the scan cursor.
#[derive(Debug, Clone)]
pub struct Matcher {
    engine: Engine,
    max_length: Option<u32>,
    first_chars: Option<SmallVec<[char; 4]>>,
}

#[derive(Debug, Clone)]
enum Engine {
    Pattern(regex::Regex),
    Literals {
        alternatives: SmallVec<[CompactString; 4]>,
        case_insensitive: bool,
    },
}

impl Matcher {
    /// Compile a case-sensitive anchored regular expression.
    pub fn pattern(pattern: &str) -> Result<Self, BuildError> {
        Self::pattern_with(pattern, true, None)
    }

    /// Compile an anchored regular expression.
    ///
    /// `first_chars` is an optional fast-reject set naming every
    /// character a match can start with; without it the pattern is tried
    /// at every cursor position.
    pub fn pattern_with(
        pattern: &str,
        case_sensitive: bool,
        first_chars: Option<&str>,
    ) -> Result<Self, BuildError> {
        let regex = regex::RegexBuilder::new(&format!(r"\A(?:{pattern})"))
            .case_insensitive(!case_sensitive)
            .build()?;
        Ok(Self {
            engine: Engine::Pattern(regex),
            max_length: None,
            first_chars: first_chars.map(|chars| chars.chars().collect()),
        })
    }

    /// A case-sensitive literal set.
    #[must_use]
    pub fn literals(alternatives: &[&str]) -> Self {
        Self::literal_set(alternatives, false)
    }

    /// A case-insensitive (ASCII) literal set.
    #[must_use]
    pub fn literals_ci(alternatives: &[&str]) -> Self {
        Self::literal_set(alternatives, true)
    }

    fn literal_set(alternatives: &[&str], case_insensitive: bool) -> Self {
        let mut alts: SmallVec<[CompactString; 4]> =
            alternatives.iter().map(|a| CompactString::from(*a)).collect();
        // longest first, so the scan reports the longest literal
        alts.sort_by(|a, b| b.len().cmp(&a.len()));

        let max_length = alts
            .first()
            .map(|a| u32::try_from(a.len()).unwrap_or(u32::MAX));

        let mut first_chars: SmallVec<[char; 4]> = SmallVec::new();
        for alt in &alts {
            if let Some(c) = alt.chars().next() {
                if case_insensitive {
                    push_unique(&mut first_chars, c.to_ascii_lowercase());
                    push_unique(&mut first_chars, c.to_ascii_uppercase());
                } else {
                    push_unique(&mut first_chars, c);
                }
            }
        }

        Self {
            engine: Engine::Literals {
                alternatives: alts,
                case_insensitive,
            },
            max_length,
            first_chars: Some(first_chars),
        }
    }

    /// Length in bytes of the match anchored at `start`, or 0.
    #[must_use]
    pub fn match_length(&self, text: &str, start: usize) -> usize {
        match &self.engine {
            Engine::Pattern(regex) => regex.find(&text[start..]).map_or(0, |m| m.end()),
            Engine::Literals {
                alternatives,
                case_insensitive,
            } => {
                let rest = text.as_bytes().get(start..).unwrap_or(&[]);
                for alt in alternatives {
                    if prefix_matches(alt.as_bytes(), rest, *case_insensitive) {
                        return alt.len();
                    }
                }
                0
            }
        }
    }

    /// Upper bound on the match length, when one is known.
    #[must_use]
    pub const fn max_length(&self) -> Option<u32> {
        self.max_length
    }

    /// Fast-reject filter: whether a match could start with `c`.
    #[must_use]
    pub fn starts_with(&self, c: char) -> bool {
        match &self.first_chars {
            Some(chars) => chars.contains(&c),
            None => true,
        }
    }
}

fn push_unique(chars: &mut SmallVec<[char; 4]>, c: char) {
    if !chars.contains(&c) {
        chars.push(c);
    }
}

fn prefix_matches(alt: &[u8], rest: &[u8], case_insensitive: bool) -> bool {
    if alt.len() > rest.len() {
        return false;
    }
    if case_insensitive {
        alt.iter()
            .zip(rest)
            .all(|(a, b)| a.eq_ignore_ascii_case(b))
    } else {
        &rest[..alt.len()] == alt
    }
}
