//! Unified-diff synthesis from recontextualized fragments.
//!
//! For every occurrence the target file is re-read and two line sequences
//! are built: the lines preceding the fragment plus the fragment itself
//! (indentation restored), and the same prefix plus the replacement. The
//! line-based unified diff between the two is the patch body.

use crate::locate::Fragment;
use similar::TextDiff;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SynthError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no replacement generated for fragment at {path}:{start_line}")]
    MissingReplacement { path: PathBuf, start_line: usize },
}

/// A unified diff for one fragment occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub target: PathBuf,
    pub start_line: usize,
    pub diff: String,
}

/// Compute a line-based unified diff with `a/`-style labels.
///
/// Whitespace-only diff lines are emitted as fully empty lines; downstream
/// patch-apply tooling is sensitive to trailing whitespace on context lines.
/// Identical inputs yield an empty string.
pub fn unified_diff(before: &str, after: &str, a_label: &str, b_label: &str) -> String {
    if before == after {
        return String::new();
    }

    let raw = TextDiff::from_lines(before, after)
        .unified_diff()
        .context_radius(3)
        .missing_newline_hint(false)
        .header(a_label, b_label)
        .to_string();

    let mut normalized = String::with_capacity(raw.len());
    for line in raw.lines() {
        if line.trim().is_empty() {
            normalized.push('\n');
        } else {
            normalized.push_str(line);
            normalized.push('\n');
        }
    }
    normalized
}

/// Synthesize patches for every fragment occurrence in one target file.
///
/// The file is re-read here so line numbers still align with the source the
/// fragments were extracted from. Occurrences whose replacement
/// recontextualizes to byte-identical lines produce no patch.
pub fn synthesize_file(
    target: &Path,
    fragments: &[Fragment],
    replacements: &HashMap<String, String>,
) -> Result<Vec<Patch>, SynthError> {
    let source = fs::read_to_string(target).map_err(|source| SynthError::Io {
        path: target.to_path_buf(),
        source,
    })?;

    let mut patches = Vec::new();
    for fragment in fragments {
        let replacement =
            replacements
                .get(&fragment.text)
                .ok_or_else(|| SynthError::MissingReplacement {
                    path: target.to_path_buf(),
                    start_line: fragment.start_line,
                })?;

        let before = join(fragment.recontextualize(&fragment.text, &source));
        let after = join(fragment.recontextualize(replacement, &source));

        let diff = unified_diff(
            &before,
            &after,
            &format!("a/{}", target.display()),
            &format!("b/{}", target.display()),
        );
        if diff.is_empty() {
            continue;
        }

        patches.push(Patch {
            target: target.to_path_buf(),
            start_line: fragment.start_line,
            diff,
        });
    }

    Ok(patches)
}

// Trailing newline keeps the diff free of no-newline markers, which the
// apply probe rejects when the real file continues past the fragment.
fn join(lines: Vec<String>) -> String {
    let mut text = lines.join("\n");
    text.push('\n');
    text
}
