//! Human-readable result formatting
//!
//! Presentation only: callers display these strings directly in the chat
//! panel. Content is the contract here, not exact layout.

use crate::safety::SafetyReport;
use crate::sandbox::{ExecutionResult, Outcome};

/// Findings previewed in a successful-execution summary
const WARNING_PREVIEW: usize = 3;

/// Findings previewed in a blocked-code report
const BLOCKED_PREVIEW: usize = 5;

/// Default line cap for displayed output
const MAX_RESULT_LINES: usize = 50;

/// Format the outcome of one execution call together with its safety report
pub fn format_execution_output(result: &ExecutionResult, report: &SafetyReport) -> String {
    let mut parts: Vec<String> = Vec::new();

    match result.outcome {
        Outcome::Blocked => {
            // The block report is the whole message.
            return result
                .detail
                .clone()
                .unwrap_or_else(|| format_blocked_report(report));
        }
        Outcome::Completed => {
            parts.push(format!("Execution completed in {:.3}s", result.wall_seconds));
        }
        Outcome::TimedOut => {
            parts.push(format!(
                "Execution Timeout: {}",
                result.detail.as_deref().unwrap_or("time limit exceeded")
            ));
        }
        Outcome::PermissionDenied => {
            parts.push(format!(
                "Permission Denied: {}",
                result.detail.as_deref().unwrap_or("operation blocked")
            ));
            parts.push("Operation blocked by sandbox security.".to_string());
        }
        Outcome::RuntimeFault => {
            parts.push(format!("Execution Error after {:.3}s", result.wall_seconds));
            if let Some(detail) = &result.detail {
                parts.push(detail.trim_end().to_string());
            }
        }
    }

    parts.push(format!("Risk Level: {}", report.risk_level));
    if !report.findings.is_empty() {
        parts.push(format!("Warnings: {}", report.findings.len()));
    }
    parts.push("-".repeat(40));

    if !result.stdout.trim().is_empty() {
        parts.push("Output:".to_string());
        parts.push(truncate_lines(result.stdout.trim_end(), MAX_RESULT_LINES));
    }

    if !result.stderr.trim().is_empty() {
        parts.push("Errors/Warnings:".to_string());
        parts.push(truncate_lines(result.stderr.trim_end(), MAX_RESULT_LINES));
    }

    if !report.findings.is_empty() {
        parts.push("Safety Warnings:".to_string());
        for finding in report.findings.iter().take(WARNING_PREVIEW) {
            parts.push(format!("  Line {}: {}", finding.line, finding.description));
        }
        if report.findings.len() > WARNING_PREVIEW {
            parts.push(format!(
                "  ... and {} more warnings",
                report.findings.len() - WARNING_PREVIEW
            ));
        }
    }

    if result.outcome == Outcome::Completed
        && result.stdout.trim().is_empty()
        && result.stderr.trim().is_empty()
    {
        parts.push("Code executed successfully (no output)".to_string());
    }

    parts.join("\n")
}

/// Format the report shown when the gate refuses to run code
pub fn format_blocked_report(report: &SafetyReport) -> String {
    let mut parts: Vec<String> = Vec::new();

    parts.push("Code execution blocked due to safety concerns:".to_string());
    parts.push(format!(
        "Risk Level: {}",
        report.risk_level.to_string().to_uppercase()
    ));

    let critical_imports: Vec<_> = report
        .import_violations
        .iter()
        .filter(|v| v.severity == crate::safety::RiskLevel::Critical)
        .collect();
    if !critical_imports.is_empty() {
        parts.push(String::new());
        parts.push("Critical Issues:".to_string());
        for violation in critical_imports {
            parts.push(format!(
                "  Line {}: {}",
                violation.line, violation.description
            ));
        }
    }

    if !report.findings.is_empty() {
        parts.push(String::new());
        parts.push("Warnings:".to_string());
        for finding in report.findings.iter().take(BLOCKED_PREVIEW) {
            parts.push(format!("  Line {}: {}", finding.line, finding.description));
        }
        if report.findings.len() > BLOCKED_PREVIEW {
            parts.push(format!(
                "  ... and {} more warnings",
                report.findings.len() - BLOCKED_PREVIEW
            ));
        }
    }

    if !report.recommendations.is_empty() {
        parts.push(String::new());
        parts.push("Recommendations:".to_string());
        for recommendation in &report.recommendations {
            parts.push(format!("  - {}", recommendation));
        }
    }

    parts.join("\n")
}

/// Cap displayed text at `max_lines`, noting how much was dropped
pub fn truncate_lines(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= max_lines {
        return text.to_string();
    }
    let mut truncated = lines[..max_lines].join("\n");
    truncated.push_str(&format!(
        "\n... ({} more lines truncated)",
        lines.len() - max_lines
    ));
    truncated
}
