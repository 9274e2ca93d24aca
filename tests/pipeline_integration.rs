//! Integration tests for the full pipeline: load dumps from disk, run
//! the flow engine and every detector, inspect the collected warnings.

use std::path::PathBuf;

use classcheck::analysis::{AnalysisContext, AnalysisOptions};
use classcheck::detect::{Runner, WarningKind};
use classcheck::loader::{self, DirRepository, Repository};

fn testdata_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata")
}

fn run_analysis() -> AnalysisContext {
    let repo = DirRepository::new(testdata_path());
    let ctx = AnalysisContext::new(AnalysisOptions::default());
    let mut classes = Vec::new();
    for file in repo.class_files() {
        match loader::load_class(&file) {
            Ok(class) => classes.push(class),
            Err(e) => ctx.add_error(file.to_string_lossy(), e.to_string()),
        }
    }
    let runner = Runner::with_default_detectors();
    ctx.analyze_all(&runner, classes);
    ctx
}

#[test]
fn test_repository_discovers_fixtures() {
    let repo = DirRepository::new(testdata_path());
    let names: Vec<_> = repo
        .class_files()
        .into_iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["Spinner.json", "Widget.json"]);
}

#[test]
fn test_pipeline_reports_expected_warnings() {
    let ctx = run_analysis();
    assert_eq!(ctx.classes_analyzed(), 2);
    assert_eq!(ctx.error_count(), 0);

    let warnings = ctx.warnings_sorted();
    let kinds: Vec<_> = warnings.iter().map(|w| (w.kind, w.class.as_str())).collect();

    // Widget.makeBox boxes a cached-range constant.
    assert!(kinds.contains(&(WarningKind::NumberConstructor, "com.example.Widget")));
    // Widget.describe calls getClass() on a fresh allocation.
    assert!(kinds.contains(&(WarningKind::NewForGetClass, "com.example.Widget")));
    // Spinner.await loops forever and clobbers its parameter.
    assert!(kinds.contains(&(WarningKind::InfiniteLoop, "com.example.Spinner")));
    assert!(kinds.contains(&(WarningKind::ParameterOverwritten, "com.example.Spinner")));
}

#[test]
fn test_boxing_warning_carries_the_constant() {
    let ctx = run_analysis();
    let warnings = ctx.warnings_sorted();
    let boxing = warnings
        .iter()
        .find(|w| w.kind == WarningKind::NumberConstructor)
        .expect("boxing warning present");
    assert_eq!(boxing.method, "makeBox");
    assert_eq!(boxing.score, 45);
    assert!(boxing.notes.contains(&"NUMBER: 42".to_string()));
}

#[test]
fn test_warnings_sorted_by_score_descending() {
    let ctx = run_analysis();
    let warnings = ctx.warnings_sorted();
    assert!(warnings.windows(2).all(|w| w[0].score >= w[1].score));
}

#[test]
fn test_flow_counters_are_published() {
    let ctx = run_analysis();
    // Three methods across the two fixtures, all analyzable.
    assert_eq!(ctx.counter("flow.total"), 3);
    assert_eq!(ctx.counter("flow.success"), 3);
    assert_eq!(ctx.counter("loop.total"), 1);
    assert_eq!(ctx.counter("loop.diverged"), 0);
}
