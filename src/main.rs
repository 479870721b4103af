use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use mimic::cache::DEFAULT_CACHE_DIR;
use mimic::exemplar::Exemplar;
use mimic::oracle::{OpenAiOracle, DEFAULT_MODEL};
use mimic::patch::store::DEFAULT_PATCH_DIR;
use mimic::patch::{synthesize_file, GitApplier, PatchStore};
use mimic::pipeline::DEFAULT_CONCURRENCY;
use mimic::{files, index, pipeline, review};
use std::env;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mimic")]
#[command(about = "Example-driven refactoring for Python codebases", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite fragments similar to a worked example and stage patches
    Run {
        /// Path to the exemplar directory (before.py, after.py, exemplar.toml)
        exemplar: PathBuf,

        /// Files, directories, or glob patterns to refactor
        #[arg(required = true)]
        files: Vec<String>,

        /// Completion model to request
        #[arg(long, default_value = DEFAULT_MODEL)]
        model: String,

        /// Number of completion requests in flight at once
        #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,

        /// Directory where patches are staged
        #[arg(long, default_value = DEFAULT_PATCH_DIR)]
        patch_root: PathBuf,

        /// Directory for the oracle response cache
        #[arg(long, default_value = DEFAULT_CACHE_DIR)]
        cache_root: PathBuf,

        /// Show verbose output
        #[arg(long)]
        verbose: bool,
    },

    /// Review staged patches interactively
    Review {
        /// Directory where patches were staged
        #[arg(long, default_value = DEFAULT_PATCH_DIR)]
        patch_root: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            exemplar,
            files,
            model,
            concurrency,
            patch_root,
            cache_root,
            verbose,
        } => cmd_run(
            exemplar,
            files,
            model,
            concurrency,
            patch_root,
            cache_root,
            verbose,
        ),

        Commands::Review { patch_root } => cmd_review(patch_root),
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Print a short diagnostic for a configuration or input error and exit
/// non-zero before any pipeline work begins.
fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{}  {message}", "error".red().bold());
    std::process::exit(1);
}

fn cmd_run(
    exemplar_dir: PathBuf,
    file_patterns: Vec<String>,
    model: String,
    concurrency: usize,
    patch_root: PathBuf,
    cache_root: PathBuf,
    verbose: bool,
) -> Result<()> {
    init_tracing(verbose);

    let exemplar = match Exemplar::load(&exemplar_dir) {
        Ok(exemplar) => exemplar,
        Err(error) => fail(error),
    };

    let targets = files::collect_python_files(&file_patterns);
    if targets.is_empty() {
        fail("No Python files found");
    }

    let api_key = match env::var("OPENAI_API_KEY") {
        Ok(key) => key,
        Err(_) => fail("OPENAI_API_KEY is not set"),
    };

    let banner = format!("Running {} based on the worked example", exemplar.title);
    println!(
        "{} {} {}",
        "Running".bold(),
        exemplar.title.cyan().bold(),
        "based on the worked example".bold()
    );
    println!("{}", "-".repeat(banner.len()));
    print_colored_diff(&exemplar.diff());
    println!("{}", "-".repeat(banner.len()));
    println!();

    println!("{}", "1. Extracting fragments...".bold());
    let batch = index::index_files(&targets, exemplar.kind)?;
    if batch.oversized > 0 {
        println!(
            "{}",
            format!("  {} oversized fragments excluded", batch.oversized).dimmed()
        );
    }

    println!("{}", "2. Generating completions...".bold());
    let oracle = OpenAiOracle::new(api_key, model, cache_root);
    let replacements = pipeline::run(&batch.distinct, &exemplar, &oracle, concurrency)?;

    println!("{}", "3. Constructing patches...".bold());
    let store = PatchStore::new(patch_root);
    let mut count = 0usize;
    for (target, fragments) in &batch.by_file {
        for patch in synthesize_file(target, fragments, &replacements)? {
            store.save(&patch)?;
            count += 1;
        }
    }

    println!();
    match count {
        0 => println!("{}", "Done! No suggestions found.".bold()),
        1 => println!("{}", "Done! Generated 1 patch.".bold()),
        n => println!("{}", format!("Done! Generated {n} patches.").bold()),
    }

    Ok(())
}

fn cmd_review(patch_root: PathBuf) -> Result<()> {
    let store = PatchStore::new(patch_root);
    // Exit 0 on completion and on interrupt; committed side effects stand.
    review::run_review(&store, &GitApplier)?;
    Ok(())
}

fn print_colored_diff(diff: &str) {
    for line in diff.lines() {
        if line.starts_with('-') {
            println!("{}", line.red());
        } else if line.starts_with('+') {
            println!("{}", line.green());
        } else {
            println!("{line}");
        }
    }
}
