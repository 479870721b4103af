//! On-disk patch storage.
//!
//! Each patch lands at a deterministic path keyed by target file and
//! fragment line, so reruns overwrite rather than accumulate.

use crate::patch::synth::Patch;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const DEFAULT_PATCH_DIR: &str = ".mimic_patches";

pub struct PatchStore {
    root: PathBuf,
}

impl PatchStore {
    /// Create a store rooted at an explicit directory, threaded in from
    /// configuration.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The stable path for a (target, start_line) pair:
    /// `<root>/<target-without-extension>-<start_line>.patch`.
    ///
    /// Absolute targets are re-rooted under the store so patches never land
    /// outside it.
    pub fn path_for(&self, target: &Path, start_line: usize) -> PathBuf {
        let stem = target.with_extension("");
        let relative = stem.strip_prefix("/").unwrap_or(&stem);
        let mut name = relative.as_os_str().to_os_string();
        name.push(format!("-{start_line}.patch"));
        self.root.join(name)
    }

    /// Persist a patch, overwriting any previous run's output for the same
    /// target and line.
    pub fn save(&self, patch: &Patch) -> io::Result<PathBuf> {
        let path = self.path_for(&patch.target, patch.start_line);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &patch.diff)?;
        Ok(path)
    }

    /// Enumerate every stored patch file, recursively, in sorted order.
    pub fn list(&self) -> Vec<PathBuf> {
        let mut patches: Vec<PathBuf> = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| {
                entry.file_type().is_file()
                    && entry.path().extension().and_then(|s| s.to_str()) == Some("patch")
            })
            .map(|entry| entry.path().to_path_buf())
            .collect();
        patches.sort();
        patches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn patch(target: &str, start_line: usize) -> Patch {
        Patch {
            target: PathBuf::from(target),
            start_line,
            diff: "--- a/x\n+++ b/x\n@@ -1 +1 @@\n-a\n+b\n".to_string(),
        }
    }

    #[test]
    fn path_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let store = PatchStore::new(dir.path());

        let first = store.path_for(Path::new("src/app.py"), 12);
        let second = store.path_for(Path::new("src/app.py"), 12);

        assert_eq!(first, second);
        assert_eq!(first, dir.path().join("src/app-12.patch"));
    }

    #[test]
    fn save_is_an_idempotent_overwrite() {
        let dir = TempDir::new().unwrap();
        let store = PatchStore::new(dir.path());

        let first = store.save(&patch("pkg/mod.py", 3)).unwrap();
        let second = store.save(&patch("pkg/mod.py", 3)).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.list().len(), 1);
    }

    #[test]
    fn distinct_lines_get_distinct_paths() {
        let dir = TempDir::new().unwrap();
        let store = PatchStore::new(dir.path());

        store.save(&patch("app.py", 3)).unwrap();
        store.save(&patch("app.py", 9)).unwrap();

        assert_eq!(store.list().len(), 2);
    }

    #[test]
    fn list_ignores_foreign_files() {
        let dir = TempDir::new().unwrap();
        let store = PatchStore::new(dir.path());

        store.save(&patch("app.py", 1)).unwrap();
        fs::write(dir.path().join("notes.txt"), "not a patch").unwrap();

        let listed = store.list();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].ends_with("app-1.patch"));
    }

    #[test]
    fn empty_or_missing_root_lists_nothing() {
        let dir = TempDir::new().unwrap();
        let store = PatchStore::new(dir.path().join("never-created"));
        assert!(store.list().is_empty());
    }

    #[test]
    fn absolute_target_stays_under_the_root() {
        let dir = TempDir::new().unwrap();
        let store = PatchStore::new(dir.path());

        let path = store.path_for(Path::new("/tmp/project/app.py"), 5);
        assert!(path.starts_with(dir.path()));
    }
}
