//! Worked-example loading.
//!
//! An exemplar directory contains `before.py`, `after.py`, and an
//! `exemplar.toml` describing the transform. The pair anchors the oracle's
//! rewriting style; the metadata determines which definitions to search for.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const BEFORE_FILENAME: &str = "before.py";
pub const AFTER_FILENAME: &str = "after.py";
pub const METADATA_FILENAME: &str = "exemplar.toml";

/// The kind of definition a transform rewrites.
///
/// Each variant carries both its human-readable noun (used in prompts) and
/// the set of tree-sitter node kinds it matches, so no component branches on
/// kind identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum TransformKind {
    Class,
    Function,
}

impl TransformKind {
    /// The noun used in prompt text ("class" / "function").
    pub fn noun(self) -> &'static str {
        match self {
            TransformKind::Class => "class",
            TransformKind::Function => "function",
        }
    }

    /// Tree-sitter node kinds matched by this transform.
    pub fn node_kinds(self) -> &'static [&'static str] {
        match self {
            TransformKind::Class => &["class_definition"],
            TransformKind::Function => &["function_definition"],
        }
    }
}

#[derive(Error, Debug)]
pub enum ExemplarError {
    #[error("directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("unable to find file: {0}")]
    MissingFile(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid metadata in {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: toml_edit::de::Error,
    },
}

#[derive(Debug, Deserialize)]
struct Metadata {
    before_description: String,
    after_description: String,
    transform_type: TransformKind,
}

/// A worked before/after example plus its descriptions. Immutable once
/// loaded.
#[derive(Debug, Clone)]
pub struct Exemplar {
    pub title: String,
    pub before_text: String,
    pub after_text: String,
    pub before_description: String,
    pub after_description: String,
    pub kind: TransformKind,
}

impl Exemplar {
    /// Load an exemplar from a directory.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ExemplarError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(ExemplarError::DirectoryNotFound(dir.to_path_buf()));
        }

        let title = dir
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());

        let before_text = read_required(&dir.join(BEFORE_FILENAME))?;
        let after_text = read_required(&dir.join(AFTER_FILENAME))?;

        let metadata_path = dir.join(METADATA_FILENAME);
        let raw = read_required(&metadata_path)?;
        let metadata: Metadata =
            toml_edit::de::from_str(&raw).map_err(|source| ExemplarError::Metadata {
                path: metadata_path,
                source,
            })?;

        Ok(Self {
            title,
            before_text,
            after_text,
            before_description: metadata.before_description,
            after_description: metadata.after_description,
            kind: metadata.transform_type,
        })
    }

    /// Render the before/after pair as a unified diff for display.
    pub fn diff(&self) -> String {
        crate::patch::unified_diff(
            &self.before_text,
            &self.after_text,
            &format!("a/{}/{}", self.title, BEFORE_FILENAME),
            &format!("b/{}/{}", self.title, AFTER_FILENAME),
        )
    }
}

fn read_required(path: &Path) -> Result<String, ExemplarError> {
    if !path.is_file() {
        return Err(ExemplarError::MissingFile(path.to_path_buf()));
    }
    fs::read_to_string(path).map_err(|source| ExemplarError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_exemplar(dir: &Path, transform_type: &str) {
        fs::write(dir.join(BEFORE_FILENAME), "class C(Base, object):\n    pass\n").unwrap();
        fs::write(dir.join(AFTER_FILENAME), "class C(Base):\n    pass\n").unwrap();
        fs::write(
            dir.join(METADATA_FILENAME),
            format!(
                "before_description = \"that inherits from object\"\n\
                 after_description = \"that no longer inherits from object\"\n\
                 transform_type = \"{transform_type}\"\n"
            ),
        )
        .unwrap();
    }

    #[test]
    fn load_complete_exemplar() {
        let dir = TempDir::new().unwrap();
        write_exemplar(dir.path(), "Class");

        let exemplar = Exemplar::load(dir.path()).unwrap();
        assert_eq!(exemplar.kind, TransformKind::Class);
        assert_eq!(exemplar.before_description, "that inherits from object");
        assert!(exemplar.before_text.contains("class C(Base, object):"));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let err = Exemplar::load("/nonexistent/exemplar").unwrap_err();
        assert!(matches!(err, ExemplarError::DirectoryNotFound(_)));
    }

    #[test]
    fn missing_after_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        write_exemplar(dir.path(), "Class");
        fs::remove_file(dir.path().join(AFTER_FILENAME)).unwrap();

        let err = Exemplar::load(dir.path()).unwrap_err();
        assert!(matches!(err, ExemplarError::MissingFile(_)));
    }

    #[test]
    fn unrecognized_transform_type_is_an_error() {
        let dir = TempDir::new().unwrap();
        write_exemplar(dir.path(), "Module");

        let err = Exemplar::load(dir.path()).unwrap_err();
        assert!(matches!(err, ExemplarError::Metadata { .. }));
    }

    #[test]
    fn transform_kind_nouns_and_node_kinds() {
        assert_eq!(TransformKind::Class.noun(), "class");
        assert_eq!(TransformKind::Function.noun(), "function");
        assert_eq!(TransformKind::Class.node_kinds(), &["class_definition"]);
        assert_eq!(
            TransformKind::Function.node_kinds(),
            &["function_definition"]
        );
    }
}
