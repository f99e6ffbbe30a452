//! Instruction interpretation: one edit applied to one content buffer.
//!
//! [`apply`] is a pure fold step - content in, content out - and never
//! fails. A pattern that matches nowhere degrades to returning the content
//! unchanged with a warning; an instruction missing a required field is a
//! benign no-op with no warning. The scheduler folds this function over each
//! file's instruction group.

use crate::instruction::Instruction;
use crate::pattern;
use tracing::{error, warn};

/// Outcome of applying a single instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Applied should be checked for no-match/inert outcomes"]
pub enum Applied {
    /// Update rewrote this many occurrences.
    Updated { substitutions: usize },
    /// Insert spliced the text after the first match.
    Inserted,
    /// Delete removed this many occurrences.
    Deleted { removals: usize },
    /// The pattern matched nowhere; content is unchanged.
    NoMatch,
    /// The instruction was missing a required field; content is unchanged.
    Inert,
}

impl Applied {
    /// Whether the instruction changed the content.
    pub fn changed(&self) -> bool {
        matches!(
            self,
            Applied::Updated { .. } | Applied::Inserted | Applied::Deleted { .. }
        )
    }
}

/// Apply `instruction` to `content`, returning the new content and outcome.
///
/// Update and Delete rewrite every non-overlapping match; Insert uses only
/// the first match and splices `write` after it, preceded by a single
/// newline. Replacement and inserted text go in literally.
pub fn apply(instruction: &Instruction, content: &str) -> (String, Applied) {
    if !instruction.is_actionable() {
        return (content.to_string(), Applied::Inert);
    }

    let pattern = match pattern::compile(instruction.find()) {
        Ok(pattern) => pattern,
        Err(e) => {
            // Only reachable at regex engine limits; degrade like a no-match
            // so the rest of the file group still applies.
            error!(
                kind = instruction.kind(),
                file = instruction.filename(),
                "pattern compilation failed: {e}"
            );
            return (content.to_string(), Applied::NoMatch);
        }
    };

    match instruction {
        Instruction::Update { replace, .. } => {
            let (updated, substitutions) = pattern.replace_all(content, replace);
            if substitutions == 0 {
                warn_no_match(instruction);
                return (updated, Applied::NoMatch);
            }
            (updated, Applied::Updated { substitutions })
        }
        Instruction::Insert { write, .. } => match pattern.first_match_end(content) {
            Some(pos) => {
                let mut inserted = String::with_capacity(content.len() + write.len() + 1);
                inserted.push_str(&content[..pos]);
                inserted.push('\n');
                inserted.push_str(write);
                inserted.push_str(&content[pos..]);
                (inserted, Applied::Inserted)
            }
            None => {
                warn_no_match(instruction);
                (content.to_string(), Applied::NoMatch)
            }
        },
        Instruction::Delete { .. } => {
            let (updated, removals) = pattern.replace_all(content, "");
            if removals == 0 {
                warn_no_match(instruction);
                return (updated, Applied::NoMatch);
            }
            (updated, Applied::Deleted { removals })
        }
    }
}

fn warn_no_match(instruction: &Instruction) {
    warn!(
        kind = instruction.kind(),
        file = instruction.filename(),
        find = %snippet_head(instruction.find()),
        "no flexible match found for instruction"
    );
}

/// First line of a snippet, shortened for log output.
fn snippet_head(find: &str) -> String {
    const MAX: usize = 80;
    let first_line = find.lines().next().unwrap_or("");
    if first_line.len() > MAX {
        let cut = first_line
            .char_indices()
            .take_while(|(i, _)| *i < MAX)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(first_line.len());
        format!("{}...", &first_line[..cut])
    } else {
        first_line.to_string()
    }
}
