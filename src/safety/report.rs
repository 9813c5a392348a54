//! Safety report types
//!
//! Structured results of a safety analysis pass. A report is produced and
//! owned entirely within one `analyze` call; nothing here is cached or
//! shared between calls.

use serde::{Deserialize, Serialize};

/// Ordered risk severity attached to a finding or an aggregated report
///
/// Aggregation is monotonic: the report level is the maximum severity
/// observed and is never downgraded once an issue is found.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl std::str::FromStr for RiskLevel {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            "critical" => Ok(RiskLevel::Critical),
            _ => Err(crate::error::Error::InvalidInput(format!(
                "Invalid risk level: {}. Valid: low, medium, high, critical",
                s
            ))),
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
            RiskLevel::Critical => write!(f, "critical"),
        }
    }
}

/// Category of a matched operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpCategory {
    /// File system reads/writes
    FileOp,
    /// Network or socket access
    NetworkOp,
    /// OS, process, or interpreter-level access
    SystemOp,
    /// Removes, deletes, or clears scene data
    DestructiveOp,
    /// Host scene-API call (benign ops are recorded, not penalized)
    BlenderOp,
    /// Dynamic code evaluation or dynamic imports
    DynamicEval,
}

impl std::fmt::Display for OpCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OpCategory::FileOp => write!(f, "file"),
            OpCategory::NetworkOp => write!(f, "network"),
            OpCategory::SystemOp => write!(f, "system"),
            OpCategory::DestructiveOp => write!(f, "destructive"),
            OpCategory::BlenderOp => write!(f, "blender"),
            OpCategory::DynamicEval => write!(f, "dynamic_eval"),
        }
    }
}

/// One finding from the pattern scan, immutable once produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationMatch {
    /// What kind of operation matched
    pub category: OpCategory,
    /// Human-readable description of the matched operation
    pub description: String,
    /// 1-based line number of the match start
    pub line: usize,
    /// The exact source text that matched
    pub matched_text: String,
    /// Severity of this finding
    pub severity: RiskLevel,
}

/// One import-statement violation, separate from pattern findings
/// because it comes from the anchored import scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportViolation {
    /// Root module name (before the first dot)
    pub module_name: String,
    /// 1-based line number of the import statement
    pub line: usize,
    /// Severity of the violation
    pub severity: RiskLevel,
    /// Human-readable description
    pub description: String,
}

/// Aggregate result of one safety analysis pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyReport {
    /// Final pass/fail verdict under the active mode
    pub is_safe: bool,
    /// Maximum severity observed, independent of `is_safe`
    pub risk_level: RiskLevel,
    /// Pattern findings in scan order (catalog order, then match order)
    pub findings: Vec<OperationMatch>,
    /// Import-statement violations in line order
    pub import_violations: Vec<ImportViolation>,
    /// Advisory text derived from the findings; never affects `is_safe`
    pub recommendations: Vec<String>,
}

impl SafetyReport {
    /// Findings in a given category
    pub fn findings_in(&self, category: OpCategory) -> impl Iterator<Item = &OperationMatch> {
        self.findings.iter().filter(move |f| f.category == category)
    }

    /// Whether any finding or violation is critical
    pub fn has_critical(&self) -> bool {
        self.findings.iter().any(|f| f.severity == RiskLevel::Critical)
            || self
                .import_violations
                .iter()
                .any(|v| v.severity == RiskLevel::Critical)
    }

    /// Total number of findings and violations
    pub fn issue_count(&self) -> usize {
        self.findings.len() + self.import_violations.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
    }

    #[test]
    fn test_risk_level_parsing() {
        assert_eq!("critical".parse::<RiskLevel>().unwrap(), RiskLevel::Critical);
        assert_eq!("LOW".parse::<RiskLevel>().unwrap(), RiskLevel::Low);
        assert!("severe".parse::<RiskLevel>().is_err());
    }

    #[test]
    fn test_risk_level_roundtrip() {
        for level in [
            RiskLevel::Low,
            RiskLevel::Medium,
            RiskLevel::High,
            RiskLevel::Critical,
        ] {
            assert_eq!(level.to_string().parse::<RiskLevel>().unwrap(), level);
        }
    }
}
