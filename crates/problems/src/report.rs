//! Verification outcomes.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const FIRST_INDEX_LABEL: &str = "First index where output differs from expected";
pub const ACTUAL_WINDOW_LABEL: &str = "Actual values at first detected difference";
pub const EXPECTED_WINDOW_LABEL: &str = "Expected values at first detected difference";
pub const MAX_DIFF_LABEL: &str = "Maximum difference of any two corresponding elements";

/// Minimal diagnostic for a rejected candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mismatch {
    /// Flattened index of the first offending element.
    pub first_index: usize,
    /// Up to three candidate values starting at `first_index`, 7 decimals.
    pub actual_window: Vec<String>,
    /// The matching reference values.
    pub expected_window: Vec<String>,
    /// Largest absolute elementwise difference over the whole tensor.
    pub max_abs_diff: f64,
}

/// Outcome of comparing a candidate to the reference.
///
/// Diagnostics are present exactly when the candidate was rejected.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationReport {
    is_correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostics: Option<Mismatch>,
}

impl VerificationReport {
    pub fn passed() -> Self {
        Self {
            is_correct: true,
            diagnostics: None,
        }
    }

    pub fn failed(mismatch: Mismatch) -> Self {
        Self {
            is_correct: false,
            diagnostics: Some(mismatch),
        }
    }

    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    pub fn diagnostics(&self) -> Option<&Mismatch> {
        self.diagnostics.as_ref()
    }

    pub fn into_diagnostics(self) -> Option<Mismatch> {
        self.diagnostics
    }

    /// Human-readable description → value mapping; empty when correct.
    pub fn diagnostics_map(&self) -> BTreeMap<&'static str, Value> {
        let mut map = BTreeMap::new();
        if let Some(mismatch) = &self.diagnostics {
            map.insert(FIRST_INDEX_LABEL, Value::from(mismatch.first_index));
            map.insert(ACTUAL_WINDOW_LABEL, Value::from(mismatch.actual_window.clone()));
            map.insert(
                EXPECTED_WINDOW_LABEL,
                Value::from(mismatch.expected_window.clone()),
            );
            map.insert(MAX_DIFF_LABEL, Value::from(mismatch.max_abs_diff));
        }
        map
    }
}
