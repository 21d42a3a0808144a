//! Word-wise `%` pattern substitution
//!
//! Shared by substitution references (`$(VAR:PATTERN=REPLACEMENT)`) and the
//! `patsubst` function. Text is split into words on whitespace, each word is
//! matched independently, and the results are rejoined with single spaces.

use std::borrow::Cow;

/// A pattern split around its `%` wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    /// Literal text before the wildcard, or the whole text without one
    prefix: String,

    /// Literal text after the wildcard, `None` if there is no wildcard
    suffix: Option<String>,
}

impl Pattern {
    /// Split `text` at its first unescaped `%`.
    ///
    /// Backslashes in front of a `%` quote it: `\%` is a literal percent and
    /// `\\%` is a literal backslash followed by the wildcard. Text after the
    /// wildcard is taken verbatim.
    pub fn parse(text: &str) -> Self {
        let mut prefix = String::with_capacity(text.len());
        let mut backslashes = 0usize;

        for (i, c) in text.char_indices() {
            match c {
                '\\' => backslashes += 1,
                '%' => {
                    prefix.extend(std::iter::repeat('\\').take(backslashes / 2));
                    if backslashes % 2 == 1 {
                        prefix.push('%');
                        backslashes = 0;
                        continue;
                    }
                    return Self {
                        prefix,
                        suffix: Some(text[i + 1..].to_string()),
                    };
                }
                _ => {
                    prefix.extend(std::iter::repeat('\\').take(backslashes));
                    backslashes = 0;
                    prefix.push(c);
                }
            }
        }
        prefix.extend(std::iter::repeat('\\').take(backslashes));

        Self {
            prefix,
            suffix: None,
        }
    }

    /// A pattern matching any word ending in `suffix` (`%suffix`).
    pub fn suffix(suffix: impl Into<String>) -> Self {
        Self {
            prefix: String::new(),
            suffix: Some(suffix.into()),
        }
    }

    /// Whether the pattern contains a wildcard.
    pub fn has_wildcard(&self) -> bool {
        self.suffix.is_some()
    }

    /// Match a word, returning the text the wildcard covered.
    ///
    /// Without a wildcard the word must equal the pattern and the stem is
    /// empty.
    pub fn match_stem<'w>(&self, word: &'w str) -> Option<&'w str> {
        match &self.suffix {
            None => (word == self.prefix).then_some(""),
            Some(suffix) => {
                let fits = word.len() >= self.prefix.len() + suffix.len();
                if fits && word.starts_with(&self.prefix) && word.ends_with(suffix.as_str()) {
                    Some(&word[self.prefix.len()..word.len() - suffix.len()])
                } else {
                    None
                }
            }
        }
    }

    /// Build replacement text, putting `stem` where the wildcard is.
    pub fn instantiate(&self, stem: &str) -> String {
        match &self.suffix {
            None => self.prefix.clone(),
            Some(suffix) => {
                let mut out = String::with_capacity(self.prefix.len() + stem.len() + suffix.len());
                out.push_str(&self.prefix);
                out.push_str(stem);
                out.push_str(suffix);
                out
            }
        }
    }
}

/// Substitute every whitespace-separated word of `text`.
///
/// Words that do not match `pattern` pass through unchanged.
pub fn substitute_words(text: &str, pattern: &Pattern, replacement: &Pattern) -> String {
    text.split_ascii_whitespace()
        .map(|word| match pattern.match_stem(word) {
            Some(stem) => Cow::Owned(replacement.instantiate(stem)),
            None => Cow::Borrowed(word),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Apply a substitution reference `$(VAR:PATTERN=REPLACEMENT)` to `text`.
///
/// A pattern without `%` is a suffix: it behaves as `%PATTERN=%REPLACEMENT`,
/// and any `%` in the replacement is then literal.
pub fn substitution_reference(text: &str, pattern: &str, replacement: &str) -> String {
    let pattern = Pattern::parse(pattern);
    if pattern.has_wildcard() {
        substitute_words(text, &pattern, &Pattern::parse(replacement))
    } else {
        substitute_words(
            text,
            &Pattern::suffix(pattern.prefix),
            &Pattern::suffix(replacement),
        )
    }
}

/// `$(patsubst PATTERN,REPLACEMENT,TEXT)`.
///
/// A pattern without `%` only matches words equal to it.
pub fn patsubst(pattern: &str, replacement: &str, text: &str) -> String {
    substitute_words(text, &Pattern::parse(pattern), &Pattern::parse(replacement))
}

/// `$(subst FROM,TO,TEXT)`: literal replacement of every occurrence.
///
/// An empty `FROM` matches once, at the end of the text.
pub fn subst(from: &str, to: &str, text: &str) -> String {
    if from.is_empty() {
        let mut out = String::with_capacity(text.len() + to.len());
        out.push_str(text);
        out.push_str(to);
        out
    } else {
        text.replace(from, to)
    }
}
