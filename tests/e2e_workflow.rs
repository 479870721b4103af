//! End-to-end workflow test: index -> pipeline -> synthesis -> store ->
//! review, with a deterministic in-process oracle and an in-memory applier.

use mimic::exemplar::{Exemplar, TransformKind};
use mimic::oracle::{CompletionOracle, OracleError};
use mimic::patch::{synthesize_file, ApplyError, PatchApplier, PatchStore};
use mimic::prompt::Prompt;
use mimic::review::{review_patches, Resolution};
use mimic::{index, pipeline};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Oracle that rewrites analogously to the worked example by stripping
/// `(object)` inheritance from the fragment embedded in the prompt.
struct ObjectStripper {
    calls: AtomicUsize,
}

impl ObjectStripper {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }

    fn fragment_of(prompt: &Prompt) -> &str {
        let header = "### Python class that inherits from object\n";
        let start = prompt.text.rfind(header).unwrap() + header.len();
        let end = prompt.text.rfind("\n### End of class").unwrap();
        &prompt.text[start..end]
    }
}

impl CompletionOracle for ObjectStripper {
    fn complete(&self, prompt: &Prompt) -> Result<String, OracleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::fragment_of(prompt).replace("(object)", ""))
    }
}

/// Applier that never touches the filesystem and accepts everything.
struct AcceptingApplier;

impl PatchApplier for AcceptingApplier {
    fn can_apply(&self, _patch_file: &Path) -> bool {
        true
    }

    fn apply(&self, _patch_file: &Path) -> Result<(), ApplyError> {
        Ok(())
    }
}

fn write_exemplar(dir: &Path) -> Exemplar {
    fs::write(
        dir.join("before.py"),
        "class C(Base, object):\n    pass\n",
    )
    .unwrap();
    fs::write(dir.join("after.py"), "class C(Base):\n    pass\n").unwrap();
    fs::write(
        dir.join("exemplar.toml"),
        "before_description = \"that inherits from object\"\n\
         after_description = \"that no longer inherits from object\"\n\
         transform_type = \"Class\"\n",
    )
    .unwrap();
    Exemplar::load(dir).unwrap()
}

#[test]
fn worked_example_drives_patches_through_review() {
    let workspace = TempDir::new().unwrap();
    let exemplar_dir = workspace.path().join("exemplar");
    fs::create_dir(&exemplar_dir).unwrap();
    let exemplar = write_exemplar(&exemplar_dir);
    assert_eq!(exemplar.kind, TransformKind::Class);

    // Two files share a byte-identical fragment; a third class is already
    // clean and must round-trip to no patch.
    let duplicated = "class CreateTaskResponse(object):\n    task_id: str\n";
    let first = workspace.path().join("api.py");
    let second = workspace.path().join("models.py");
    fs::write(&first, format!("import attrs\n\n\n{duplicated}")).unwrap();
    fs::write(
        &second,
        format!("{duplicated}\n\nclass Clean:\n    pass\n"),
    )
    .unwrap();

    // Index: duplicate texts collapse, occurrences survive per file.
    let batch = index::index_files(
        &[first.clone(), second.clone()],
        exemplar.kind,
    )
    .unwrap();
    assert_eq!(batch.distinct.len(), 2);
    assert_eq!(batch.by_file[0].1.len(), 1);
    assert_eq!(batch.by_file[1].1.len(), 2);

    // Pipeline: exactly one oracle call per distinct text.
    let oracle = ObjectStripper::new();
    let replacements = pipeline::run(&batch.distinct, &exemplar, &oracle, 4).unwrap();
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 2);
    assert_eq!(replacements.len(), 2);

    // Synthesis: both occurrences of the shared fragment yield a patch from
    // the single result; the clean class yields none.
    let store = PatchStore::new(workspace.path().join(".patches"));
    let mut saved: Vec<PathBuf> = Vec::new();
    for (target, fragments) in &batch.by_file {
        for patch in synthesize_file(target, fragments, &replacements).unwrap() {
            assert!(patch.diff.contains("-class CreateTaskResponse(object):"));
            assert!(patch.diff.contains("+class CreateTaskResponse:"));
            saved.push(store.save(&patch).unwrap());
        }
    }
    assert_eq!(saved.len(), 2);

    // Rerun is idempotent: same fragments map to the same patch paths.
    for (target, fragments) in &batch.by_file {
        for patch in synthesize_file(target, fragments, &replacements).unwrap() {
            let path = store.save(&patch).unwrap();
            assert!(saved.contains(&path));
        }
    }
    assert_eq!(store.list().len(), 2);

    // Review: accept everything; accepted patch files are consumed.
    let summary = review_patches(&store.list(), &AcceptingApplier, |_, contents, _, _| {
        assert!(contents.starts_with("--- a/"));
        Some(Resolution::Accept)
    })
    .unwrap();
    assert_eq!(summary.accepted.len(), 2);
    assert_eq!(summary.stale, 0);
    assert!(store.list().is_empty());
}

#[test]
fn oversized_fragments_never_reach_the_oracle_or_the_store() {
    let workspace = TempDir::new().unwrap();
    let exemplar_dir = workspace.path().join("exemplar");
    fs::create_dir(&exemplar_dir).unwrap();
    let exemplar = write_exemplar(&exemplar_dir);

    let body = "    field: str\n".repeat(200);
    let target = workspace.path().join("big.py");
    fs::write(
        &target,
        format!("class Big(object):\n{body}\n\nclass Small(object):\n    pass\n"),
    )
    .unwrap();

    let batch = index::index_files(&[target.clone()], exemplar.kind).unwrap();
    assert_eq!(batch.oversized, 1);
    assert_eq!(batch.distinct.len(), 1);

    let oracle = ObjectStripper::new();
    let replacements = pipeline::run(&batch.distinct, &exemplar, &oracle, 2).unwrap();
    assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);

    let store = PatchStore::new(workspace.path().join(".patches"));
    let (path, fragments) = &batch.by_file[0];
    assert_eq!(fragments.len(), 1);
    for patch in synthesize_file(path, fragments, &replacements).unwrap() {
        store.save(&patch).unwrap();
    }

    let listed = store.list();
    assert_eq!(listed.len(), 1);
    let expected = format!("big-{}.patch", fragments[0].start_line);
    assert!(listed[0].to_string_lossy().ends_with(&expected));
}
