//! Interactive patch review.
//!
//! Discovered patches are probed with the [`PatchApplier`] capability;
//! patches that fail the probe are excluded from the session (and reported
//! as stale at the end). Applicable patches block for a single
//! accept/reject/skip decision each. The decision source is injected so the
//! state machine is testable without a terminal; the CLI wires in a raw-mode
//! single-key reader.

use crate::patch::{ApplyError, PatchApplier, PatchStore};
use colored::Colorize;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("failed to read patch {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to apply {path}: {source}")]
    Apply {
        path: PathBuf,
        #[source]
        source: ApplyError,
    },
}

/// The human decision for one reviewed patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Accept,
    Reject,
    Skip,
}

impl Resolution {
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'a' => Some(Resolution::Accept),
            'r' => Some(Resolution::Reject),
            's' => Some(Resolution::Skip),
            _ => None,
        }
    }
}

/// Outcome of a review session.
#[derive(Debug, Default)]
pub struct ReviewSummary {
    pub accepted: Vec<PathBuf>,
    pub rejected: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    /// Discovered patches excluded because the apply probe failed.
    pub stale: usize,
    /// Whether the session ended on an interrupt rather than exhaustion.
    pub interrupted: bool,
}

impl ReviewSummary {
    pub fn reviewed(&self) -> usize {
        self.accepted.len() + self.rejected.len() + self.skipped.len()
    }
}

/// Drive the review state machine over a set of discovered patch files.
///
/// `decide` receives the patch path, its contents, and the 1-based position
/// within the discovered set; returning `None` interrupts the session
/// immediately, with no further side effects beyond what has already been
/// committed. Accepted and rejected patch files are deleted; skipped ones
/// stay on disk. An apply failure after a successful probe is fatal.
pub fn review_patches<D>(
    patches: &[PathBuf],
    applier: &dyn PatchApplier,
    mut decide: D,
) -> Result<ReviewSummary, ReviewError>
where
    D: FnMut(&Path, &str, usize, usize) -> Option<Resolution>,
{
    let total = patches.len();
    let mut summary = ReviewSummary::default();

    for (index, patch_file) in patches.iter().enumerate() {
        if !applier.can_apply(patch_file) {
            summary.stale += 1;
            continue;
        }

        let contents = fs::read_to_string(patch_file).map_err(|source| ReviewError::Io {
            path: patch_file.clone(),
            source,
        })?;

        let Some(resolution) = decide(patch_file, &contents, index + 1, total) else {
            summary.interrupted = true;
            break;
        };

        match resolution {
            Resolution::Accept => {
                applier
                    .apply(patch_file)
                    .map_err(|source| ReviewError::Apply {
                        path: patch_file.clone(),
                        source,
                    })?;
                remove(patch_file)?;
                summary.accepted.push(patch_file.clone());
            }
            Resolution::Reject => {
                remove(patch_file)?;
                summary.rejected.push(patch_file.clone());
            }
            Resolution::Skip => {
                summary.skipped.push(patch_file.clone());
            }
        }
    }

    Ok(summary)
}

fn remove(path: &Path) -> Result<(), ReviewError> {
    fs::remove_file(path).map_err(|source| ReviewError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Run an interactive review session over every patch in the store.
pub fn run_review(
    store: &PatchStore,
    applier: &dyn PatchApplier,
) -> Result<ReviewSummary, ReviewError> {
    let patches = store.list();

    let summary = review_patches(&patches, applier, |patch_file, contents, index, total| {
        present(patch_file, contents, index, total);
        read_resolution()
    })?;

    if !summary.interrupted {
        report(&summary, store, patches.len());
    }

    Ok(summary)
}

fn present(patch_file: &Path, contents: &str, index: usize, total: usize) {
    println!();
    println!("{}", format!("Reviewing [{index}/{total}]").bold());
    let name = patch_file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| patch_file.display().to_string());
    println!("Patch file: {}", name.cyan());
    println!();

    for line in contents.lines() {
        let line = if line.trim().is_empty() { "" } else { line };
        if line.starts_with('-') {
            println!("{}", line.red());
        } else if line.starts_with('+') {
            println!("{}", line.green());
        } else {
            println!("{line}");
        }
    }

    println!();
    println!("  {} accept  {}", "a".green().bold(), "apply the patch".dimmed());
    println!("  {} reject  {}", "r".red().bold(), "discard the patch".dimmed());
    println!("  {} skip    {}", "s".yellow().bold(), "decide later".dimmed());
}

/// Block for a single resolution keypress. Ctrl-C and Esc interrupt.
fn read_resolution() -> Option<Resolution> {
    let _ = terminal::enable_raw_mode();
    let resolution = loop {
        match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break None,
                KeyCode::Esc => break None,
                KeyCode::Char(c) => {
                    if let Some(resolution) = Resolution::from_key(c) {
                        break Some(resolution);
                    }
                }
                _ => {}
            },
            Ok(_) => {}
            Err(_) => break None,
        }
    };
    let _ = terminal::disable_raw_mode();
    resolution
}

fn report(summary: &ReviewSummary, store: &PatchStore, discovered: usize) {
    println!();
    if discovered == 0 {
        println!("{} No patches to review.", "Done!".bold());
        return;
    }

    let reviewed = summary.reviewed();
    if reviewed == 1 {
        println!("{} Reviewed {reviewed} patch.", "Done!".bold());
    } else {
        println!("{} Reviewed {reviewed} patches.", "Done!".bold());
    }

    let groups = [
        ("Accepted:", &summary.accepted, "green"),
        ("Rejected:", &summary.rejected, "red"),
        ("Skipped:", &summary.skipped, "yellow"),
    ];
    for (label, paths, color) in groups {
        if paths.is_empty() {
            continue;
        }
        println!("{}", label.color(color));
        for path in paths {
            let shown = path.strip_prefix(store.root()).unwrap_or(path);
            println!("  {}", shown.display());
        }
    }

    if summary.stale > 0 {
        println!(
            "{}",
            format!(
                "{} stale {} excluded (failed the apply probe)",
                summary.stale,
                if summary.stale == 1 { "patch" } else { "patches" }
            )
            .dimmed()
        );
    }
}
