//! Shared state for one analysis run.
//!
//! The context owns everything multiple worker threads touch: the
//! counter map (increment-only, commutative) and the append-only
//! warning and error collections. Per-method flow state is never
//! shared; classes can be analyzed fully in parallel.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use crate::analysis::AnalysisOptions;
use crate::detect::{Runner, Warning};
use crate::flow;
use crate::loader::ClassData;

/// Injected counter sink for engine telemetry.
///
/// Counter names are dotted strings (`flow.total`, `loop.diverged`);
/// increments are commutative, so any thread may report at any time.
pub trait StatsSink: Sync {
    fn increment(&self, name: &str);
}

/// Sink that discards all counters.
pub struct NullStats;

impl StatsSink for NullStats {
    fn increment(&self, _name: &str) {}
}

/// A per-class failure recorded during loading or analysis.
///
/// Errors never stop the run; the remaining classes are analyzed and
/// the failures reported at the end.
#[derive(Debug, Clone)]
pub struct AnalysisError {
    pub class: String,
    pub message: String,
}

/// Shared state for one analysis run.
pub struct AnalysisContext {
    options: AnalysisOptions,
    counters: RwLock<HashMap<String, u64>>,
    warnings: Mutex<Vec<Warning>>,
    errors: Mutex<Vec<AnalysisError>>,
    classes_analyzed: Mutex<usize>,
}

impl StatsSink for AnalysisContext {
    fn increment(&self, name: &str) {
        let mut counters = self.counters.write().unwrap();
        *counters.entry(name.to_string()).or_insert(0) += 1;
    }
}

impl AnalysisContext {
    pub fn new(options: AnalysisOptions) -> Self {
        Self {
            options,
            counters: RwLock::new(HashMap::new()),
            warnings: Mutex::new(Vec::new()),
            errors: Mutex::new(Vec::new()),
            classes_analyzed: Mutex::new(0),
        }
    }

    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    pub fn report(&self, warning: Warning) {
        self.warnings.lock().unwrap().push(warning);
    }

    pub fn add_error<C: Into<String>, M: Into<String>>(&self, class: C, message: M) {
        self.errors.lock().unwrap().push(AnalysisError {
            class: class.into(),
            message: message.into(),
        });
    }

    /// Run the flow engine and every detector over one class.
    pub fn analyze_class(&self, runner: &Runner, mut class: ClassData) {
        for method in &mut class.methods {
            let flow = flow::annotate(&self.options, method, self);
            let warnings = runner.run_method(&class.name, method, flow.as_ref(), &class.types);
            for warning in warnings {
                self.report(warning);
            }
        }
        *self.classes_analyzed.lock().unwrap() += 1;
    }

    /// Analyze a batch of classes in parallel.
    pub fn analyze_all(&self, runner: &Runner, classes: Vec<ClassData>) {
        use rayon::prelude::*;

        classes
            .into_par_iter()
            .for_each(|class| self.analyze_class(runner, class));
    }

    pub fn classes_analyzed(&self) -> usize {
        *self.classes_analyzed.lock().unwrap()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.lock().unwrap().len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.lock().unwrap().len()
    }

    /// Warnings sorted by score descending, then kind name, then class.
    pub fn warnings_sorted(&self) -> Vec<Warning> {
        let mut warnings = self.warnings.lock().unwrap().clone();
        warnings.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.kind.as_str().cmp(b.kind.as_str()))
                .then_with(|| a.class.cmp(&b.class))
        });
        warnings
    }

    pub fn errors(&self) -> Vec<AnalysisError> {
        self.errors.lock().unwrap().clone()
    }

    /// Counter snapshot sorted by name.
    pub fn counter_snapshot(&self) -> Vec<(String, u64)> {
        let counters = self.counters.read().unwrap();
        let mut entries: Vec<_> = counters.iter().map(|(k, v)| (k.clone(), *v)).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn counter(&self, name: &str) -> u64 {
        self.counters.read().unwrap().get(name).copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let ctx = AnalysisContext::new(AnalysisOptions::default());
        ctx.increment("flow.total");
        ctx.increment("flow.total");
        ctx.increment("loop.diverged");

        assert_eq!(ctx.counter("flow.total"), 2);
        assert_eq!(ctx.counter("loop.diverged"), 1);
        assert_eq!(ctx.counter("missing"), 0);

        let snapshot = ctx.counter_snapshot();
        assert_eq!(
            snapshot,
            vec![("flow.total".to_string(), 2), ("loop.diverged".to_string(), 1)]
        );
    }

    #[test]
    fn test_errors_accumulate() {
        let ctx = AnalysisContext::new(AnalysisOptions::default());
        ctx.add_error("com.example.Foo", "malformed dump");
        assert_eq!(ctx.error_count(), 1);
        assert_eq!(ctx.errors()[0].class, "com.example.Foo");
    }
}
