//! Patch synthesis, storage, and application.

pub mod apply;
pub mod store;
pub mod synth;

pub use apply::{ApplyError, GitApplier, PatchApplier};
pub use store::PatchStore;
pub use synth::{synthesize_file, unified_diff, Patch, SynthError};
