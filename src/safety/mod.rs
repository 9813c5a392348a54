//! Safety analysis of AI-generated Python
//!
//! Pure, deterministic risk triage over an untrusted source string. The
//! analyzer never executes anything and never fails: arbitrary input
//! (including non-Python garbage) produces a well-formed [`SafetyReport`].
//!
//! The verdict policy is the contract:
//! - any critical finding or import violation blocks in both modes
//! - a high-risk aggregate blocks under strict mode and is allowed (with
//!   recommendations) under permissive mode
//! - medium and low findings never block

mod imports;
mod patterns;
mod report;

pub use report::{ImportViolation, OpCategory, OperationMatch, RiskLevel, SafetyReport};

pub(crate) use imports::{ALLOWED_MODULES, RESTRICTED_MODULES};

use crate::config::SafetyMode;

/// Pattern-based risk classifier for untrusted code
pub struct SafetyAnalyzer;

impl SafetyAnalyzer {
    /// Analyze a code string under the given mode
    ///
    /// Total and idempotent: the same `(code, mode)` always yields a
    /// structurally identical report, with findings in scan order.
    pub fn analyze(code: &str, mode: SafetyMode) -> SafetyReport {
        let findings = patterns::scan(code);
        let import_violations = imports::scan(code, mode);

        let risk_level = findings
            .iter()
            .map(|f| f.severity)
            .chain(import_violations.iter().map(|v| v.severity))
            .max()
            .unwrap_or(RiskLevel::Low);

        let is_safe = match risk_level {
            RiskLevel::Critical => false,
            RiskLevel::High => mode == SafetyMode::Permissive,
            RiskLevel::Medium | RiskLevel::Low => true,
        };

        let recommendations = recommend(&findings, &import_violations);

        SafetyReport {
            is_safe,
            risk_level,
            findings,
            import_violations,
            recommendations,
        }
    }
}

/// Derive advisory text from which categories produced findings
fn recommend(findings: &[OperationMatch], violations: &[ImportViolation]) -> Vec<String> {
    let mut recommendations = Vec::new();
    let has = |category| findings.iter().any(|f| f.category == category);

    if has(OpCategory::FileOp) {
        recommendations
            .push("Consider using Blender's data API instead of file operations".to_string());
    }
    if has(OpCategory::DestructiveOp) {
        recommendations
            .push("Review destructive operations carefully - consider a backup first".to_string());
    }
    if has(OpCategory::SystemOp) {
        recommendations.push("System operations are not allowed in sandbox mode".to_string());
    }
    if has(OpCategory::NetworkOp) {
        recommendations.push("Network access is not available to generated code".to_string());
    }
    if has(OpCategory::DynamicEval) {
        recommendations
            .push("Dynamic code evaluation is never allowed in generated code".to_string());
    }
    if violations
        .iter()
        .any(|v| v.severity == RiskLevel::Critical)
    {
        recommendations.push("Remove imports of restricted modules".to_string());
    }

    recommendations
}
