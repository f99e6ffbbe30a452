//! Flexible pattern compilation for literal code snippets.
//!
//! Instruction generators (LLMs in particular) reproduce code snippets that
//! are semantically identical to the source but drift in incidental spacing:
//! a double space after a keyword, tabs flattened to spaces, CRLF vs LF.
//! This module compiles a literal snippet into a [`regex::Regex`] that is
//! exact on each line's leading indentation, flexible on whitespace runs
//! between tokens, and tolerant of either newline style.
//!
//! Indentation is matched verbatim because shifting the matched indentation
//! level can corrupt block structure in indentation-sensitive languages.
//! Inter-token whitespace is relaxed because it carries no meaning in most
//! languages. Every literal token is escaped, so `find` snippets containing
//! regex metacharacters stay inert.

use regex::{Regex, RegexBuilder};
use thiserror::Error;

/// Errors during pattern compilation.
///
/// The synthesized pattern contains only escaped literals joined by `\s+`
/// and `\r?\n`, so rejection happens only at the engine's limits (e.g. a
/// snippet large enough to exceed the compiled-program size cap), never by
/// construction.
#[derive(Error, Debug)]
pub enum PatternError {
    #[error("regex engine rejected synthesized pattern: {0}")]
    Regex(#[from] regex::Error),
}

/// A matcher compiled from a literal snippet.
///
/// Ephemeral by design: compiled per instruction application and discarded.
/// Never reuse one across files or batches.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    regex: Regex,
}

impl CompiledPattern {
    /// Number of non-overlapping matches in `content`.
    pub fn count_matches(&self, content: &str) -> usize {
        self.regex.find_iter(content).count()
    }

    /// Replace every non-overlapping match with `replacement`, inserted
    /// literally (no `$` capture expansion). Returns the new content and the
    /// number of substitutions made.
    pub fn replace_all(&self, content: &str, replacement: &str) -> (String, usize) {
        let count = self.count_matches(content);
        if count == 0 {
            return (content.to_string(), 0);
        }
        let replaced = self
            .regex
            .replace_all(content, regex::NoExpand(replacement))
            .into_owned();
        (replaced, count)
    }

    /// Byte offset just past the end of the first match, if any.
    pub fn first_match_end(&self, content: &str) -> Option<usize> {
        self.regex.find(content).map(|m| m.end())
    }

    /// The underlying regex (mainly for diagnostics).
    pub fn as_regex(&self) -> &Regex {
        &self.regex
    }
}

/// Compile a literal snippet into a [`CompiledPattern`].
///
/// Pure function: text in, matcher out, no hidden state. Multi-line and
/// dot-matches-newline semantics are enabled so a snippet spanning many
/// lines behaves predictably as one pattern.
pub fn compile(snippet: &str) -> Result<CompiledPattern, PatternError> {
    let source = flexible_pattern(snippet);
    let regex = RegexBuilder::new(&source)
        .multi_line(true)
        .dot_matches_new_line(true)
        .build()?;
    Ok(CompiledPattern { regex })
}

/// Build the regex source for a snippet.
///
/// Per line: the leading whitespace is escaped and matched verbatim; the
/// remainder is split on whitespace runs and the escaped tokens are rejoined
/// with `\s+`. A line that is blank apart from indentation matches just the
/// indentation. Lines are joined with `\r?\n` so the snippet matches content
/// regardless of newline style.
fn flexible_pattern(snippet: &str) -> String {
    let mut pattern_lines = Vec::new();

    for line in snippet.lines() {
        let content = line.trim_start();
        let indent = &line[..line.len() - content.len()];

        let mut pattern_line = regex::escape(indent);
        for (i, token) in content.split_whitespace().enumerate() {
            if i > 0 {
                pattern_line.push_str(r"\s+");
            }
            pattern_line.push_str(&regex::escape(token));
        }

        pattern_lines.push(pattern_line);
    }

    pattern_lines.join(r"\r?\n")
}
