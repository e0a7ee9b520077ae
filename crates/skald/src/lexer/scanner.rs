//! The lexer runtime: a longest-match scan over the root rules with
//! sub-token refinement, comment skipping, escaped newlines, and
//! indentation tracking.

use crate::lexer::vocabulary::Vocabulary;
use crate::token::{Token, TokenKind, TokenStream};

pub(crate) fn scan(vocabulary: &Vocabulary, text: &str, truncated: bool) -> TokenStream {
    Scanner::new(vocabulary, text, truncated).run()
}

const fn is_skippable(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r')
}

fn offset32(offset: usize) -> u32 {
    u32::try_from(offset).unwrap_or(u32::MAX)
}

struct Scanner<'a> {
    vocabulary: &'a Vocabulary,
    /// The buffer with trailing skippable characters trimmed off; all
    /// matching happens against this view.
    text: &'a str,
    full: &'a str,
    truncated: bool,
    tokens: Vec<Token>,
    /// Present iff indentation is tracked; the baseline 0 is never
    /// popped.
    indents: Option<Vec<u32>>,
    last_cannot_be_postfix: bool,
    backslash_pos: Option<usize>,
    has_errors: bool,
}

impl<'a> Scanner<'a> {
    fn new(vocabulary: &'a Vocabulary, full: &'a str, truncated: bool) -> Self {
        let bytes = full.as_bytes();
        let mut len = bytes.len();
        while len > 0 && is_skippable(bytes[len - 1]) {
            len -= 1;
        }
        Self {
            vocabulary,
            text: &full[..len],
            full,
            truncated,
            tokens: Vec::new(),
            indents: vocabulary.tracks_indentation().then(|| vec![0]),
            last_cannot_be_postfix: false,
            backslash_pos: None,
            has_errors: false,
        }
    }

    fn run(mut self) -> TokenStream {
        let bytes = self.text.as_bytes();
        let mut start = 0;
        while start < self.text.len() {
            let byte = bytes[start];
            if is_skippable(byte) {
                start += 1;
                continue;
            }
            if byte == b'\n' {
                if self.backslash_pos.take().is_some() {
                    // the newline is consumed as the escape
                    start += 1;
                    continue;
                }
                start = self.handle_newline(start);
                if self.last_cannot_be_postfix {
                    self.strip_line_break();
                }
                continue;
            }
            if let Some(comment) = self.vocabulary.comments() {
                let length = comment.match_length(self.text, start);
                if length > 0 {
                    start += length;
                    continue;
                }
            }
            if let Some(pos) = self.backslash_pos.take() {
                // something other than a newline followed the backslash;
                // rewind and match it as an ordinary character
                start = pos;
            } else if byte == b'\\' && self.vocabulary.escapes_newlines() {
                self.backslash_pos = Some(start);
                start += 1;
                continue;
            }
            start = self.scan_token(start);
        }
        if let Some(pos) = self.backslash_pos.take() {
            // a latched backslash at the very end of the input is still
            // an ordinary character
            self.scan_token(pos);
        }
        self.finish()
    }

    /// Match one token at `start` and return the new cursor position.
    fn scan_token(&mut self, start: usize) -> usize {
        match self.best_root_match(start) {
            None => {
                let first = self.text[start..].chars().next().map_or(1, char::len_utf8);
                self.tokens.push(Token {
                    kind: self.vocabulary.error_kind(),
                    start: offset32(start),
                    length: offset32(first),
                });
                self.has_errors = true;
                self.last_cannot_be_postfix = false;
                start + first
            }
            Some((root, length)) => {
                let kind = self.refine(root, start, length);
                let info = self.vocabulary.info(kind);
                if !info.can_be_prefix {
                    self.strip_line_break();
                }
                self.last_cannot_be_postfix = !info.can_be_postfix;
                self.tokens.push(Token {
                    kind,
                    start: offset32(start),
                    length: offset32(length),
                });
                start + length
            }
        }
    }

    /// The root rule with the longest match at `start`; ties go to the
    /// first-declared rule.
    fn best_root_match(&self, start: usize) -> Option<(TokenKind, usize)> {
        let first = self.text[start..].chars().next()?;
        let mut best: Option<(TokenKind, usize)> = None;
        for &root in self.vocabulary.roots() {
            let Some(matcher) = self.vocabulary.info(root).matcher.as_ref() else {
                continue;
            };
            if !matcher.starts_with(first) {
                continue;
            }
            let length = matcher.match_length(self.text, start);
            if length > best.map_or(0, |(_, len)| len) {
                best = Some((root, length));
            }
        }
        best
    }

    /// Walk the refinement tree below `root`, descending into the child
    /// whose definition matches exactly the matched text.
    fn refine(&self, root: TokenKind, start: usize, length: usize) -> TokenKind {
        let mut kind = root;
        'descend: loop {
            for &child in &self.vocabulary.info(kind).children {
                let Some(matcher) = self.vocabulary.info(child).matcher.as_ref() else {
                    continue;
                };
                if let Some(max) = matcher.max_length() {
                    if (max as usize) < length {
                        continue;
                    }
                }
                if matcher.match_length(self.text, start) == length {
                    kind = child;
                    continue 'descend;
                }
            }
            return kind;
        }
    }

    /// Emit the end-of-line token, skip the newline, and track the
    /// indentation of the next non-blank, non-comment line. Returns the
    /// new cursor position.
    fn handle_newline(&mut self, start: usize) -> usize {
        if let Some(eol) = self.vocabulary.end_of_line_kind() {
            let emit = self.tokens.last().is_some_and(|last| {
                Some(last.kind) != self.vocabulary.indent_kind()
                    && Some(last.kind) != self.vocabulary.dedent_kind()
            });
            if emit {
                self.tokens.push(Token {
                    kind: eol,
                    start: offset32(start),
                    length: 0,
                });
            }
        }
        let mut pos = start + 1;
        if self.indents.is_none() {
            return pos;
        }

        let bytes = self.text.as_bytes();
        let mut width: u32 = 0;
        while pos < self.text.len() {
            match bytes[pos] {
                b' ' => {
                    width += 1;
                    pos += 1;
                }
                b'\t' => {
                    width += 2;
                    pos += 1;
                }
                b'\r' => pos += 1,
                b'\n' => {
                    // blank line: start over on the next one
                    width = 0;
                    pos += 1;
                }
                _ => {
                    if let Some(comment) = self.vocabulary.comments() {
                        let length = comment.match_length(self.text, pos);
                        if length > 0 {
                            pos += length;
                            continue;
                        }
                    }
                    break;
                }
            }
        }
        if pos >= self.text.len() {
            // nothing but blank space remains; indentation changes are
            // settled by the end-of-input drain instead
            return pos;
        }

        let (indent, dedent) = match (self.vocabulary.indent_kind(), self.vocabulary.dedent_kind()) {
            (Some(indent), Some(dedent)) => (indent, dedent),
            _ => return pos,
        };
        if let Some(indents) = &mut self.indents {
            let top = indents.last().copied().unwrap_or(0);
            if top > width {
                while indents.last().copied().unwrap_or(0) > width {
                    indents.pop();
                    self.tokens.push(Token {
                        kind: dedent,
                        start: offset32(pos),
                        length: 0,
                    });
                }
            } else if top < width {
                indents.push(width);
                self.tokens.push(Token {
                    kind: indent,
                    start: offset32(pos),
                    length: 0,
                });
            }
        }
        pos
    }

    /// Remove a trailing (end-of-line, indent) pair, un-pushing the
    /// indent it recorded.
    fn strip_line_break(&mut self) {
        let (Some(eol), Some(indent)) = (
            self.vocabulary.end_of_line_kind(),
            self.vocabulary.indent_kind(),
        ) else {
            return;
        };
        let n = self.tokens.len();
        if n >= 2 && self.tokens[n - 1].kind == indent && self.tokens[n - 2].kind == eol {
            self.tokens.truncate(n - 2);
            if let Some(indents) = &mut self.indents {
                if indents.len() > 1 {
                    indents.pop();
                }
            }
        }
    }

    fn finish(mut self) -> TokenStream {
        if !self.truncated && !self.tokens.is_empty() {
            let end = offset32(self.text.len());
            if let Some(eol) = self.vocabulary.end_of_line_kind() {
                let last = self.tokens.last().map(|t| t.kind);
                if last != Some(eol) && last != self.vocabulary.dedent_kind() {
                    self.tokens.push(Token {
                        kind: eol,
                        start: end,
                        length: 0,
                    });
                }
            }
            if let (Some(dedent), Some(indents)) =
                (self.vocabulary.dedent_kind(), self.indents.as_mut())
            {
                while indents.len() > 1 {
                    indents.pop();
                    self.tokens.push(Token {
                        kind: dedent,
                        start: end,
                        length: 0,
                    });
                }
            }
            self.tokens.push(Token {
                kind: self.vocabulary.end_of_stream_kind(),
                start: end,
                length: 0,
            });
        }
        TokenStream::new(
            self.full.to_owned(),
            self.tokens,
            self.has_errors,
            self.truncated,
        )
    }
}
