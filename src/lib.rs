//! Classcheck - bug pattern detector for compiled JVM bytecode.
//!
//! Classcheck consumes decompiled class dumps and reports bug patterns
//! that survive compilation: wasteful boxing, parameters clobbered
//! before use, `getClass()` on freshly allocated objects, loops with
//! no exit.
//!
//! # Architecture
//!
//! The codebase is built around a per-method value-flow engine:
//!
//! - `ast`: the decompiled method tree, its expression arena, and the
//!   class type hierarchy
//! - `flow`: the value-flow pass - frames, the fixpoint walker over
//!   structured control flow, and the query layer detectors use
//! - `detect`: bug-pattern detectors that consume flow annotations
//! - `analysis`: run-wide context - options, counters, parallel driver
//! - `loader`: class dump discovery and deserialization
//! - `report`: output formatting (pretty, JSON)
//!
//! # Adding a New Detector
//!
//! Implement the `Detector` trait in `src/detect/` and register it in
//! `Runner::with_default_detectors`.

pub mod analysis;
pub mod ast;
pub mod cli;
pub mod detect;
pub mod flow;
pub mod loader;
pub mod report;

pub use analysis::{AnalysisContext, AnalysisOptions, NullStats, StatsSink};
pub use ast::{MethodBody, TypeHierarchy};
pub use detect::{Detector, Runner, Warning, WarningKind};
pub use flow::{annotate, MethodFlow, SourceRef};
pub use loader::{load_class, ClassData, DirRepository, Repository};
