//! Output formatting for classcheck results.
//!
//! Two formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption

use colored::*;
use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisContext;
use crate::detect::Warning;

// =============================================================================
// JSON Format
// =============================================================================

/// Top-level JSON report structure.
#[derive(Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub path: String,
    pub classes_analyzed: usize,
    pub warnings: Vec<JsonWarning>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<JsonError>,
    pub stats: Vec<JsonStat>,
}

#[derive(Serialize, Deserialize)]
pub struct JsonWarning {
    pub kind: String,
    pub category: String,
    pub class: String,
    pub method: String,
    pub score: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

#[derive(Serialize, Deserialize)]
pub struct JsonError {
    pub class: String,
    pub message: String,
}

#[derive(Serialize, Deserialize)]
pub struct JsonStat {
    pub name: String,
    pub value: u64,
}

/// Write results in JSON format.
pub fn write_json(path: &str, ctx: &AnalysisContext) -> anyhow::Result<()> {
    let warnings: Vec<JsonWarning> = ctx.warnings_sorted().iter().map(warning_to_json).collect();

    let errors: Vec<JsonError> = ctx
        .errors()
        .into_iter()
        .map(|e| JsonError {
            class: e.class,
            message: e.message,
        })
        .collect();

    let stats: Vec<JsonStat> = ctx
        .counter_snapshot()
        .into_iter()
        .map(|(name, value)| JsonStat { name, value })
        .collect();

    let report = JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        path: path.to_string(),
        classes_analyzed: ctx.classes_analyzed(),
        warnings,
        errors,
        stats,
    };

    let json = serde_json::to_string_pretty(&report)?;
    println!("{}", json);
    Ok(())
}

fn warning_to_json(w: &Warning) -> JsonWarning {
    JsonWarning {
        kind: w.kind.as_str().to_string(),
        category: w.kind.category().to_string(),
        class: w.class.clone(),
        method: w.method.clone(),
        score: w.score,
        notes: w.notes.clone(),
    }
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write results in pretty (human-readable) format.
pub fn write_pretty(path: &str, ctx: &AnalysisContext, show_stats: bool) {
    // Header
    println!();
    print!("  ");
    print!("{}", "classcheck".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Analyzing: ".dimmed());
    println!("{}", path);
    println!();

    let warnings = ctx.warnings_sorted();
    if warnings.is_empty() {
        println!("  {}", "✓ No warnings".green());
    } else {
        write_warnings(&warnings);
    }
    println!();

    let errors = ctx.errors();
    if !errors.is_empty() {
        println!("  {} ({}):", "Errors".red().bold(), errors.len());
        for e in &errors {
            println!("    {}  {}", e.class.blue(), e.message);
        }
        println!();
    }

    if show_stats {
        write_stats(ctx);
        println!();
    }

    println!(
        "  {}",
        format!(
            "{} classes, {} warnings, {} errors",
            ctx.classes_analyzed(),
            warnings.len(),
            errors.len()
        )
        .dimmed()
    );
    println!();
}

fn write_warnings(warnings: &[Warning]) {
    println!("  {} ({}):", "Warnings".bold(), warnings.len());
    println!();

    for w in warnings {
        print!("    ");
        write_colored_score(w.score);
        print!("  {:<22}", w.kind.as_str().dimmed());
        println!("{}{}{}", w.class.blue(), ".".dimmed(), w.method);
        for note in &w.notes {
            println!("          {}", note.dimmed());
        }
    }
}

fn write_colored_score(score: u32) {
    let tag = format!("[{:>3}]", score);
    match score {
        s if s >= 60 => print!("{}", tag.red().bold()),
        s if s >= 40 => print!("{}", tag.yellow()),
        _ => print!("{}", tag.green()),
    }
}

fn write_stats(ctx: &AnalysisContext) {
    let stats = ctx.counter_snapshot();
    if stats.is_empty() {
        return;
    }
    println!("  {}", "Stats:".bold());
    for (name, value) in stats {
        println!("    {:<24} {:>8}", name, value);
    }
}
