//! Analysis orchestration: options, counters, and the per-run context.
//!
//! The flow engine itself lives in `crate::flow`; this module owns the
//! shared state one analysis run needs around it - the configured
//! options, the concurrent counter sink, and the append-only warning
//! and error collections that detectors and the loader feed.

mod context;
mod options;

pub use context::{AnalysisContext, AnalysisError, NullStats, StatsSink};
pub use options::AnalysisOptions;
