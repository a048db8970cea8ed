use crate::models::{Finding, RiskLevel};

const BASELINE: f64 = 100.0;

/// 100 minus the per-severity deductions, floored at 0 and rounded to one decimal.
pub fn score_findings(findings: &[Finding]) -> f64 {
    let deducted: f64 = findings.iter().map(|f| f.severity.deduction()).sum();
    round1((BASELINE - deducted).max(0.0))
}

/// Score and risk classification in one step.
pub fn assess(findings: &[Finding]) -> (f64, RiskLevel) {
    let score = score_findings(findings);
    (score, RiskLevel::from_score(score))
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
