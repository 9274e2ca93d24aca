//! Core types for detection results.

use serde::{Deserialize, Serialize};

/// Every warning the built-in detectors can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningKind {
    #[serde(rename = "number_constructor")]
    NumberConstructor,
    #[serde(rename = "boolean_constructor")]
    BooleanConstructor,
    #[serde(rename = "new_for_get_class")]
    NewForGetClass,
    #[serde(rename = "parameter_overwritten")]
    ParameterOverwritten,
    #[serde(rename = "infinite_loop")]
    InfiniteLoop,
}

impl WarningKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningKind::NumberConstructor => "number_constructor",
            WarningKind::BooleanConstructor => "boolean_constructor",
            WarningKind::NewForGetClass => "new_for_get_class",
            WarningKind::ParameterOverwritten => "parameter_overwritten",
            WarningKind::InfiniteLoop => "infinite_loop",
        }
    }

    pub fn category(&self) -> &'static str {
        match self {
            WarningKind::NumberConstructor
            | WarningKind::BooleanConstructor
            | WarningKind::NewForGetClass => "performance",
            WarningKind::ParameterOverwritten => "correctness",
            WarningKind::InfiniteLoop => "multithreading",
        }
    }

    /// Score reported when the evidence is as strong as it gets.
    pub fn max_score(&self) -> u32 {
        match self {
            WarningKind::NumberConstructor => 45,
            WarningKind::BooleanConstructor => 55,
            WarningKind::NewForGetClass => 50,
            WarningKind::ParameterOverwritten => 55,
            WarningKind::InfiniteLoop => 70,
        }
    }

    pub fn all() -> &'static [WarningKind] {
        &[
            WarningKind::NumberConstructor,
            WarningKind::BooleanConstructor,
            WarningKind::NewForGetClass,
            WarningKind::ParameterOverwritten,
            WarningKind::InfiniteLoop,
        ]
    }
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single detected issue, attributed to one method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub class: String,
    pub method: String,
    /// 0..=100; higher means more confident and more severe.
    pub score: u32,
    /// Free-form annotations, e.g. the suggested replacement call.
    #[serde(default)]
    pub notes: Vec<String>,
}
