//! Detection module for bug patterns in decompiled methods.

use crate::ast::{MethodBody, TypeHierarchy};
use crate::flow::MethodFlow;

mod infinite_loop;
mod new_get_class;
mod number_constructor;
mod parameter_overwritten;
mod runner;
mod types;

pub use infinite_loop::InfiniteLoop;
pub use new_get_class::NewGetClass;
pub use number_constructor::NumberConstructor;
pub use parameter_overwritten::ParameterOverwritten;
pub use runner::Runner;
pub use types::{Warning, WarningKind};

/// Everything a detector may inspect while visiting one method, plus
/// the sink its warnings go to.
///
/// `flow` is `None` when the value-flow pass gave up on the method;
/// detectors degrade to syntactic checks or stay silent in that case.
pub struct MethodContext<'a> {
    pub class: &'a str,
    pub body: &'a MethodBody,
    pub flow: Option<&'a MethodFlow>,
    pub types: &'a TypeHierarchy,
    warnings: Vec<Warning>,
}

impl<'a> MethodContext<'a> {
    pub fn new(
        class: &'a str,
        body: &'a MethodBody,
        flow: Option<&'a MethodFlow>,
        types: &'a TypeHierarchy,
    ) -> Self {
        Self {
            class,
            body,
            flow,
            types,
            warnings: Vec::new(),
        }
    }

    /// Record a warning. `adjustment` is subtracted from the kind's
    /// maximum score; weaker evidence reports larger adjustments.
    pub fn report<S: Into<String>>(&mut self, kind: WarningKind, adjustment: u32, notes: Vec<S>) {
        let score = kind.max_score().saturating_sub(adjustment);
        self.warnings.push(Warning {
            kind,
            class: self.class.to_string(),
            method: self.body.name.clone(),
            score,
            notes: notes.into_iter().map(Into::into).collect(),
        });
    }

    fn into_warnings(self) -> Vec<Warning> {
        self.warnings
    }
}

/// A single bug-pattern check run once per method.
pub trait Detector: Sync + Send {
    /// Stable name used in reports and `classcheck list`.
    fn name(&self) -> &'static str;

    /// Warning kinds this detector can produce.
    fn kinds(&self) -> &'static [WarningKind];

    fn check(&self, cx: &mut MethodContext<'_>);
}
