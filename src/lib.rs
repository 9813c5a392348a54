//! # Scenegate
//!
//! Safety analysis and gated execution of AI-generated Python for 3D scene hosts.
//!
//! ## Features
//!
//! - **Risk Triage:** Regex pattern catalog classifying file, network, system,
//!   destructive and dynamic-eval operations into ordered risk levels
//! - **Import Policy:** Allow-list / deny-list classification of every import
//!   statement, with strict and permissive modes
//! - **Gated Execution:** Analyze-then-gate-then-run; blocked code never
//!   executes and produces zero side effects
//! - **Restricted Namespace:** Curated builtins, scoped import guard, and
//!   cooperative operation/wall-clock budgets inside a dedicated interpreter
//!   process

pub mod config;
pub mod error;
pub mod safety;
pub mod sandbox;

pub use config::{ExecutionLimits, GateConfig, SafetyMode};
pub use error::{Error, Result};
pub use safety::{
    ImportViolation, OpCategory, OperationMatch, RiskLevel, SafetyAnalyzer, SafetyReport,
};
pub use sandbox::{
    format_blocked_report, format_execution_output, ExecutionResult, GatedExecutor, Outcome,
};

/// Library version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
