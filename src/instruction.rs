//! Edit instructions and the batches that carry them.
//!
//! Instructions are produced by an external generator (typically an LLM call
//! returning structured output) and consumed exactly once by the scheduler.
//! Each kind carries exactly the fields that are meaningful for it, so a
//! delete with a `replace` field or an update without one cannot be built
//! in-process. At the JSON boundary the fields default to empty strings:
//! an instruction missing a required field deserializes fine and is simply
//! *inert* - applied as a silent no-op rather than an error. That tolerance
//! favors forward progress over strictness when the upstream output is
//! imperfect.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One requested textual edit against a named file.
///
/// Matching semantics are deliberately asymmetric and preserved from the
/// original behavior: `Update` and `Delete` rewrite **every** non-overlapping
/// match of `find`, while `Insert` splices `write` after the **first** match
/// only. Downstream consumers may depend on either policy, so neither is
/// "fixed" to mirror the other.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Instruction {
    /// Replace every match of `find` with `replace`.
    Update {
        #[serde(default)]
        filename: String,
        #[serde(default)]
        find: String,
        #[serde(default)]
        replace: String,
    },
    /// Insert `write` on a new line immediately after the first match of `find`.
    Insert {
        #[serde(default)]
        filename: String,
        #[serde(default)]
        find: String,
        #[serde(default)]
        write: String,
    },
    /// Remove every match of `find`.
    Delete {
        #[serde(default)]
        filename: String,
        #[serde(default)]
        find: String,
    },
}

impl Instruction {
    /// Create an update instruction.
    pub fn update(
        filename: impl Into<String>,
        find: impl Into<String>,
        replace: impl Into<String>,
    ) -> Self {
        Instruction::Update {
            filename: filename.into(),
            find: find.into(),
            replace: replace.into(),
        }
    }

    /// Create an insert instruction.
    pub fn insert(
        filename: impl Into<String>,
        find: impl Into<String>,
        write: impl Into<String>,
    ) -> Self {
        Instruction::Insert {
            filename: filename.into(),
            find: find.into(),
            write: write.into(),
        }
    }

    /// Create a delete instruction.
    pub fn delete(filename: impl Into<String>, find: impl Into<String>) -> Self {
        Instruction::Delete {
            filename: filename.into(),
            find: find.into(),
        }
    }

    /// Target file path as given by the generator (relative or absolute).
    pub fn filename(&self) -> &str {
        match self {
            Instruction::Update { filename, .. }
            | Instruction::Insert { filename, .. }
            | Instruction::Delete { filename, .. } => filename,
        }
    }

    /// The literal snippet locating the edit.
    pub fn find(&self) -> &str {
        match self {
            Instruction::Update { find, .. }
            | Instruction::Insert { find, .. }
            | Instruction::Delete { find, .. } => find,
        }
    }

    /// Whether all fields required for this kind are present.
    ///
    /// An instruction that is not actionable applies as a no-op with no
    /// warning (`filename` is checked separately at grouping time).
    pub fn is_actionable(&self) -> bool {
        match self {
            Instruction::Update { find, replace, .. } => !find.is_empty() && !replace.is_empty(),
            Instruction::Insert { find, write, .. } => !find.is_empty() && !write.is_empty(),
            Instruction::Delete { find, .. } => !find.is_empty(),
        }
    }

    /// Kind name for logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Instruction::Update { .. } => "update",
            Instruction::Insert { .. } => "insert",
            Instruction::Delete { .. } => "delete",
        }
    }
}

/// An ordered sequence of instructions processed together.
///
/// Order is significant within a file (later instructions see earlier ones'
/// effects); instructions targeting different files are independent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InstructionBatch {
    #[serde(default)]
    pub instructions: Vec<Instruction>,
}

/// Errors loading an instruction batch.
#[derive(Error, Debug)]
pub enum BatchError {
    #[error("failed to read instruction batch from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse instruction batch JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl InstructionBatch {
    /// Build a batch from instructions already in memory.
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    /// Parse a batch from the generator's JSON output:
    /// `{"instructions": [{"type": "update", ...}, ...]}`.
    pub fn from_json_str(input: &str) -> Result<Self, BatchError> {
        Ok(serde_json::from_str(input)?)
    }

    /// Load a batch from a JSON file on disk.
    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self, BatchError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| BatchError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_batch() {
        let json = r##"{
            "instructions": [
                {"type": "update", "filename": "a.py", "find": "x = 1", "replace": "x = 2"},
                {"type": "insert", "filename": "a.py", "find": "# marker", "write": "added()"},
                {"type": "delete", "filename": "b.py", "find": "TODO"}
            ]
        }"##;
        let batch = InstructionBatch::from_json_str(json).unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.instructions[0].kind(), "update");
        assert_eq!(batch.instructions[2].filename(), "b.py");
        assert!(batch.iter().all(Instruction::is_actionable));
    }

    #[test]
    fn test_missing_fields_deserialize_as_inert() {
        // Upstream generators sometimes omit fields; that must parse and
        // yield an instruction that applies as a no-op.
        let json = r#"{"instructions": [{"type": "update", "filename": "a.py", "find": "x"}]}"#;
        let batch = InstructionBatch::from_json_str(json).unwrap();
        assert_eq!(batch.len(), 1);
        assert!(!batch.instructions[0].is_actionable());
    }

    #[test]
    fn test_extraneous_fields_are_ignored() {
        // The original generator schema carried every field on every kind.
        let json = r#"{"instructions": [
            {"type": "delete", "filename": "a.py", "find": "TODO", "replace": "", "write": "", "delete": "TODO"}
        ]}"#;
        let batch = InstructionBatch::from_json_str(json).unwrap();
        assert!(batch.instructions[0].is_actionable());
    }

    #[test]
    fn test_unknown_kind_is_a_parse_error() {
        let json = r#"{"instructions": [{"type": "rename", "filename": "a.py"}]}"#;
        assert!(matches!(
            InstructionBatch::from_json_str(json),
            Err(BatchError::Json(_))
        ));
    }

    #[test]
    fn test_empty_find_is_inert() {
        let instr = Instruction::delete("a.py", "");
        assert!(!instr.is_actionable());
    }
}
