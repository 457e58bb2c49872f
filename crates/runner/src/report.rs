//! Evaluation reports.

use kernelbench_problems::Mismatch;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Outcome of one test case for one candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseResult {
    pub case: String,
    pub dims: Vec<usize>,
    pub kernel: String,
    /// Mean wall time per timed launch.
    pub latency_ms: f64,
    pub flops: u64,
    pub gflops: f64,
    pub correct: bool,
    /// Present only when verification rejected the candidate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<Mismatch>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub problem: String,
    pub kernel: String,
    pub generated_at_unix_ms: u128,
    pub cases: Vec<CaseResult>,
    /// Test cases not run because they exceeded the element cap.
    #[serde(default)]
    pub skipped: Vec<String>,
}

impl EvaluationReport {
    /// True when every evaluated case passed verification.
    pub fn all_correct(&self) -> bool {
        self.cases.iter().all(|case| case.correct)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CaseResult> {
        self.cases.iter().filter(|case| !case.correct)
    }

    pub fn as_map(&self) -> BTreeMap<&str, &CaseResult> {
        self.cases
            .iter()
            .map(|case| (case.case.as_str(), case))
            .collect()
    }

    /// Save report to JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load report from JSON file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let report = serde_json::from_str(&json)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(name: &str, correct: bool) -> CaseResult {
        CaseResult {
            case: name.into(),
            dims: vec![4],
            kernel: "serial".into(),
            latency_ms: 0.5,
            flops: 4,
            gflops: 8.0e-6,
            correct,
            diagnostics: None,
        }
    }

    #[test]
    fn failures_are_counted() {
        let report = EvaluationReport {
            problem: "vector-addition".into(),
            kernel: "serial".into(),
            generated_at_unix_ms: 0,
            cases: vec![case("a", true), case("b", false)],
            skipped: Vec::new(),
        };
        assert!(!report.all_correct());
        assert_eq!(report.failures().count(), 1);
        assert!(report.as_map().contains_key("b"));
    }

    #[test]
    fn passing_case_omits_diagnostics() {
        let json = serde_json::to_string(&case("a", true)).unwrap();
        assert!(!json.contains("diagnostics"));
        assert!(json.contains(r#""kernel":"serial""#));
    }
}
