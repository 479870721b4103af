//! Target file collection.
//!
//! Every CLI file argument is treated as a glob pattern; matched directories
//! are walked recursively. Only Python sources are kept, deduplicated and
//! sorted so runs are deterministic.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

fn is_python_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("py") | Some("pyi")
    )
}

/// Expand a set of glob patterns into the sorted list of Python files they
/// cover. Patterns that match nothing contribute nothing; the caller decides
/// whether an empty result is an error.
pub fn collect_python_files(patterns: &[String]) -> Vec<PathBuf> {
    let mut collected = BTreeSet::new();

    for pattern in patterns {
        let Ok(paths) = glob::glob(pattern) else {
            continue;
        };
        for path in paths.filter_map(Result::ok) {
            if path.is_dir() {
                for entry in WalkDir::new(&path).into_iter().filter_map(Result::ok) {
                    if entry.file_type().is_file() && is_python_file(entry.path()) {
                        collected.insert(entry.path().to_path_buf());
                    }
                }
            } else if path.is_file() && is_python_file(&path) {
                collected.insert(path);
            }
        }
    }

    collected.into_iter().collect()
}
