//! Command-line interface for classcheck.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use crate::analysis::{AnalysisContext, AnalysisOptions};
use crate::detect::{Runner, WarningKind};
use crate::loader::{self, DirRepository, Repository};
use crate::report;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_WARNINGS: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Bytecode bug-pattern detector for decompiled JVM classes.
///
/// Classcheck runs a value-flow analysis over decompiled method trees
/// and reports bug patterns: wasteful boxing, overwritten parameters,
/// loops that cannot terminate, and similar mistakes that survive
/// compilation.
#[derive(Parser)]
#[command(name = "classcheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a directory of class dumps
    #[command(visible_alias = "check")]
    Analyze(AnalyzeArgs),
    /// List the available detectors
    List,
}

/// Arguments for the analyze command.
#[derive(Parser)]
pub struct AnalyzeArgs {
    /// Directory containing decompiled class dumps (*.json)
    pub path: PathBuf,

    /// Path to options YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Override the loop fixpoint iteration cap
    #[arg(long)]
    pub max_loop_iterations: Option<u32>,

    /// Show engine counters in pretty output
    #[arg(long)]
    pub stats: bool,

    /// Hide the progress bar
    #[arg(short, long)]
    pub quiet: bool,
}

/// Run the analyze command.
pub fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<i32> {
    if args.format != "pretty" && args.format != "json" {
        eprintln!(
            "Error: invalid format {:?}, must be 'pretty' or 'json'",
            args.format
        );
        return Ok(EXIT_ERROR);
    }

    let mut options = match &args.config {
        Some(path) => match AnalysisOptions::load(path) {
            Ok(o) => o,
            Err(e) => {
                eprintln!("Error reading options: {}", e);
                return Ok(EXIT_ERROR);
            }
        },
        None => AnalysisOptions::discover(".")?,
    };
    if let Some(cap) = args.max_loop_iterations {
        options.max_loop_iterations = cap;
    }

    if !args.path.is_dir() {
        eprintln!("Error: {:?} is not a directory", args.path);
        return Ok(EXIT_ERROR);
    }

    let repository = DirRepository::new(&args.path);
    let files = repository.class_files();
    if files.is_empty() {
        eprintln!("Warning: no class dumps found under {:?}", args.path);
        return Ok(EXIT_SUCCESS);
    }

    // JSON output goes to stdout, so the bar stays off there too.
    let progress = if args.quiet || args.format == "json" {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(files.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("  {bar:30.cyan} {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar
    };

    let ctx = AnalysisContext::new(options);
    let mut classes = Vec::new();
    for file in &files {
        progress.set_message(
            file.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        );
        match loader::load_class(file) {
            Ok(class) => classes.push(class),
            Err(e) => ctx.add_error(file.to_string_lossy(), e.to_string()),
        }
        progress.inc(1);
    }
    progress.finish_and_clear();

    let runner = Runner::with_default_detectors();
    ctx.analyze_all(&runner, classes);

    let path_str = args.path.to_string_lossy().to_string();
    match args.format.as_str() {
        "json" => report::write_json(&path_str, &ctx)?,
        _ => report::write_pretty(&path_str, &ctx, args.stats),
    }

    if ctx.error_count() > 0 {
        Ok(EXIT_ERROR)
    } else if ctx.warning_count() > 0 {
        Ok(EXIT_WARNINGS)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the list command.
pub fn run_list() -> anyhow::Result<i32> {
    let runner = Runner::with_default_detectors();
    println!("Detectors:");
    for name in runner.detector_names() {
        println!("  {}", name);
    }
    println!();
    println!("Warning kinds:");
    for kind in WarningKind::all() {
        println!(
            "  {:<24} {:<16} max score {}",
            kind.as_str(),
            kind.category(),
            kind.max_score()
        );
    }
    Ok(EXIT_SUCCESS)
}
