//! Mimic: example-driven refactoring for Python codebases
//!
//! Given a single worked example (a "before" fragment, its "after" rewrite,
//! and a description of each), mimic locates structurally similar fragments
//! across a target codebase, asks a text-completion oracle to rewrite each
//! one analogously, and stages the results as reviewable unified-diff
//! patches.
//!
//! # Architecture
//!
//! The core is a straight pipeline: [`locate`] extracts fragments with
//! enough positional metadata to reinsert a rewritten version, [`index`]
//! deduplicates identical fragments across files, [`pipeline`] fans the
//! distinct texts out to the oracle under bounded concurrency, and
//! [`patch`] recontextualizes each occurrence, synthesizes unified diffs,
//! and persists them. A later `review` invocation walks the stored patches
//! through an accept/reject/skip state machine.
//!
//! # Guarantees
//!
//! - Exactly one oracle call per distinct fragment text
//! - Deterministic patch paths keyed by target file and line
//! - All-or-nothing completion batches (no partial mappings)
//! - Review side effects commit at patch boundaries only

pub mod cache;
pub mod exemplar;
pub mod files;
pub mod index;
pub mod locate;
pub mod oracle;
pub mod patch;
pub mod pipeline;
pub mod prompt;
pub mod review;

// Re-exports
pub use exemplar::{Exemplar, ExemplarError, TransformKind};
pub use index::{index_files, FragmentBatch, IndexError, MAX_FRAGMENT_LEN};
pub use locate::{Fragment, LocateError, PythonParser};
pub use oracle::{CompletionOracle, OpenAiOracle, OracleError};
pub use patch::{
    synthesize_file, ApplyError, GitApplier, Patch, PatchApplier, PatchStore, SynthError,
};
pub use review::{review_patches, Resolution, ReviewError, ReviewSummary};
