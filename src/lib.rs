//! Flexpatch: whitespace-tolerant structured code patching
//!
//! Applies declarative edit instructions - each naming a target file, a
//! literal snippet to locate, and an update/insert/delete action - to source
//! files on disk. Instructions typically come from an LLM returning
//! structured output, so the engine tolerates what such generators get
//! wrong: incidental whitespace drift in snippets, missing fields, and
//! targets that no longer exist.
//!
//! # Architecture
//!
//! Three layers, leaf to root:
//!
//! - [`pattern`]: compiles a literal snippet into a matcher that is exact on
//!   leading indentation, flexible on inter-token whitespace, and tolerant
//!   of `\n` vs `\r\n`.
//! - [`interpret`]: a pure fold step applying one [`Instruction`] to one
//!   content buffer; never fails, degrades to a logged no-op.
//! - [`scheduler`]: groups a batch by target file, folds each group in
//!   batch order against a single buffer, and persists results atomically
//!   with per-file failure isolation.
//!
//! # Safety
//!
//! - No match means no edit; content comes back byte-for-byte unchanged
//! - Atomic file writes (tempfile + fsync + rename)
//! - One file group's failure never aborts the rest of the batch
//! - No rollback across files: partial application is accepted behavior
//!
//! # Example
//!
//! ```no_run
//! use flexpatch::{apply_batch, Instruction, InstructionBatch};
//! use std::path::Path;
//!
//! let batch = InstructionBatch::new(vec![Instruction::update(
//!     "src/lib.py",
//!     "def foo():\n    return 1",
//!     "def foo():\n    return 2",
//! )]);
//!
//! for report in apply_batch(&batch, Path::new(".")) {
//!     println!("{report}");
//! }
//! ```

pub mod instruction;
pub mod interpret;
pub mod pattern;
pub mod scheduler;

// Re-exports
pub use instruction::{BatchError, Instruction, InstructionBatch};
pub use interpret::{apply, Applied};
pub use pattern::{compile, CompiledPattern, PatternError};
pub use scheduler::{apply_batch, preview_batch, FilePreview, FileReport};
