//! Fragment indexing across target files.
//!
//! Reads every target once, extracts its fragments, and splits the results
//! two ways: per-file occurrence lists (kept in source order, duplicates and
//! all, for later patch reconstruction) and the set of distinct fragment
//! texts (which drives exactly one oracle call per distinct text).

use crate::exemplar::TransformKind;
use crate::locate::{self, Fragment, LocateError};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Fragments longer than this are never sent to the oracle and never
/// patched.
pub const MAX_FRAGMENT_LEN: usize = 1600;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to extract fragments from {path}: {source}")]
    Locate {
        path: PathBuf,
        #[source]
        source: LocateError,
    },
}

/// The indexed view of a set of target files.
#[derive(Debug, Default)]
pub struct FragmentBatch {
    /// Accepted fragments per file, in source order.
    pub by_file: Vec<(PathBuf, Vec<Fragment>)>,
    /// Distinct fragment texts awaiting completion.
    pub distinct: HashSet<String>,
    /// Fragments excluded for exceeding [`MAX_FRAGMENT_LEN`].
    pub oversized: usize,
}

/// Index every target file for fragments of the given kind.
///
/// Oversized fragments are reported and excluded without aborting the batch.
/// Occurrences are never dropped for duplicating another file's fragment;
/// only the oracle call is deduplicated.
pub fn index_files(
    targets: &[PathBuf],
    kind: TransformKind,
) -> Result<FragmentBatch, IndexError> {
    let mut batch = FragmentBatch::default();

    for target in targets {
        let source = read_target(target)?;
        let fragments = locate::fragments(&source, kind).map_err(|source| IndexError::Locate {
            path: target.clone(),
            source,
        })?;

        let mut accepted = Vec::new();
        for fragment in fragments {
            if fragment.text.len() > MAX_FRAGMENT_LEN {
                warn!(
                    "fragment at {}:{} is too long ({} > {}); skipping",
                    target.display(),
                    fragment.start_line,
                    fragment.text.len(),
                    MAX_FRAGMENT_LEN
                );
                batch.oversized += 1;
                continue;
            }
            batch.distinct.insert(fragment.text.clone());
            accepted.push(fragment);
        }

        batch.by_file.push((target.clone(), accepted));
    }

    Ok(batch)
}

fn read_target(path: &Path) -> Result<String, IndexError> {
    fs::read_to_string(path).map_err(|source| IndexError::Io {
        path: path.to_path_buf(),
        source,
    })
}
