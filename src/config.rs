//! Gate configuration types
//!
//! Configuration for safety analysis and gated execution. The surrounding
//! application owns these values (typically sourced from user preferences)
//! and passes them in; nothing here reads global state.

use serde::{Deserialize, Serialize};

/// Safety mode controlling how strictly generated code is gated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SafetyMode {
    /// Block critical findings only; high-risk code runs with warnings
    Permissive,
    /// Block critical and high-risk findings; unknown imports are flagged
    #[default]
    Strict,
}

impl std::str::FromStr for SafetyMode {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" | "sandbox" => Ok(SafetyMode::Strict),
            "permissive" | "relaxed" => Ok(SafetyMode::Permissive),
            _ => Err(crate::error::Error::Config(format!(
                "Invalid safety mode: {}. Valid: strict, permissive",
                s
            ))),
        }
    }
}

impl std::fmt::Display for SafetyMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SafetyMode::Permissive => write!(f, "permissive"),
            SafetyMode::Strict => write!(f, "strict"),
        }
    }
}

/// Resource budgets for one execution call
///
/// Instantiated fresh per call; budgets never carry over between runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLimits {
    /// Maximum number of traced operations (statement-level granularity)
    #[serde(default = "default_max_operations")]
    pub max_operations: u64,
    /// Maximum wall-clock time in seconds (cooperative, with a hard backstop)
    #[serde(default = "default_max_wall_seconds")]
    pub max_wall_seconds: f64,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        ExecutionLimits {
            max_operations: default_max_operations(),
            max_wall_seconds: default_max_wall_seconds(),
        }
    }
}

fn default_max_operations() -> u64 {
    10_000
}

fn default_max_wall_seconds() -> f64 {
    30.0
}

/// Gate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Safety mode for analysis and the runtime import guard
    #[serde(default)]
    pub mode: SafetyMode,
    /// Default resource budgets
    #[serde(default)]
    pub limits: ExecutionLimits,
    /// Interpreter binary to execute gated code with
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    /// Host scene-API modules pre-imported into the restricted namespace
    /// (best effort; missing modules are skipped)
    #[serde(default = "default_host_modules")]
    pub host_modules: Vec<String>,
    /// Maximum captured output size in bytes (stdout and stderr each)
    #[serde(default = "default_max_output")]
    pub max_output_bytes: usize,
}

impl Default for GateConfig {
    fn default() -> Self {
        GateConfig {
            mode: SafetyMode::default(),
            limits: ExecutionLimits::default(),
            interpreter: default_interpreter(),
            host_modules: default_host_modules(),
            max_output_bytes: default_max_output(),
        }
    }
}

fn default_interpreter() -> String {
    "python3".to_string()
}

fn default_host_modules() -> Vec<String> {
    ["bpy", "bmesh", "mathutils", "bpy_extras"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_max_output() -> usize {
    1024 * 1024 // 1MB
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safety_mode_parsing() {
        assert_eq!("strict".parse::<SafetyMode>().unwrap(), SafetyMode::Strict);
        assert_eq!(
            "sandbox".parse::<SafetyMode>().unwrap(),
            SafetyMode::Strict
        );
        assert_eq!(
            "permissive".parse::<SafetyMode>().unwrap(),
            SafetyMode::Permissive
        );
        assert!("yolo".parse::<SafetyMode>().is_err());
    }

    #[test]
    fn test_limits_default() {
        let limits = ExecutionLimits::default();
        assert_eq!(limits.max_operations, 10_000);
        assert_eq!(limits.max_wall_seconds, 30.0);
    }

    #[test]
    fn test_gate_config_default() {
        let config = GateConfig::default();
        assert_eq!(config.mode, SafetyMode::Strict);
        assert_eq!(config.interpreter, "python3");
        assert!(config.host_modules.contains(&"bpy".to_string()));
    }

    #[test]
    fn test_gate_config_from_json() {
        let config: GateConfig =
            serde_json::from_str(r#"{"mode": "permissive", "limits": {"max_operations": 500}}"#)
                .unwrap();
        assert_eq!(config.mode, SafetyMode::Permissive);
        assert_eq!(config.limits.max_operations, 500);
        assert_eq!(config.limits.max_wall_seconds, 30.0);
    }
}
