//! Detection runner that orchestrates all checks for one method.

use crate::ast::{MethodBody, TypeHierarchy};
use crate::flow::MethodFlow;

use super::{
    Detector, InfiniteLoop, MethodContext, NewGetClass, NumberConstructor, ParameterOverwritten,
    Warning,
};

/// Executes every registered detector against analyzed methods.
pub struct Runner {
    detectors: Vec<Box<dyn Detector>>,
}

impl Runner {
    pub fn new(detectors: Vec<Box<dyn Detector>>) -> Self {
        Self { detectors }
    }

    /// All built-in detectors.
    pub fn with_default_detectors() -> Self {
        Self::new(vec![
            Box::new(NumberConstructor),
            Box::new(NewGetClass),
            Box::new(ParameterOverwritten),
            Box::new(InfiniteLoop),
        ])
    }

    /// Detector names, for `classcheck list`.
    pub fn detector_names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Run every detector over one method and collect their warnings.
    pub fn run_method(
        &self,
        class: &str,
        body: &MethodBody,
        flow: Option<&MethodFlow>,
        types: &TypeHierarchy,
    ) -> Vec<Warning> {
        let mut warnings = Vec::new();
        for detector in &self.detectors {
            let mut cx = MethodContext::new(class, body, flow, types);
            detector.check(&mut cx);
            warnings.extend(cx.into_warnings());
        }
        warnings
    }
}
