//! Gated execution of AI-generated Python
//!
//! The control flow is analyze-then-gate-then-run, never run-then-check:
//! every `execute` call analyzes the code first, returns `Blocked` without
//! executing anything when the verdict is unsafe, and otherwise runs the
//! code inside a restricted interpreter harness in a dedicated subprocess.
//!
//! Each call owns a fresh namespace, budget, and interpreter process, so
//! concurrent calls never share interpreter state. The wall-clock budget is
//! enforced cooperatively by the harness's trace hook; the subprocess
//! boundary additionally allows a hard kill after the budget plus a grace
//! period when the hook never gets a chance to fire.

mod format;
mod harness;

pub use format::{format_blocked_report, format_execution_output, truncate_lines};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::{ExecutionLimits, GateConfig, SafetyMode};
use crate::error::{Error, Result};
use crate::safety::{SafetyAnalyzer, SafetyReport};

/// Extra wall time granted before the interpreter process is killed,
/// leaving room for the cooperative limit to fire and report first
const HARD_KILL_GRACE: Duration = Duration::from_secs(2);

/// Terminal classification of one execution call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Code ran to completion
    Completed,
    /// Policy refusal: the safety gate rejected the code, nothing ran
    Blocked,
    /// Wall-clock budget exceeded
    TimedOut,
    /// A restricted builtin or import was invoked at runtime
    PermissionDenied,
    /// Uncaught exception or operation budget breach in gated code
    RuntimeFault,
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Completed => write!(f, "completed"),
            Outcome::Blocked => write!(f, "blocked"),
            Outcome::TimedOut => write!(f, "timed_out"),
            Outcome::PermissionDenied => write!(f, "permission_denied"),
            Outcome::RuntimeFault => write!(f, "runtime_fault"),
        }
    }
}

/// Result of one execution call, consumed by the formatter and discarded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Captured standard output of the gated code
    pub stdout: String,
    /// Captured standard error of the gated code
    pub stderr: String,
    /// Wall time spent executing
    pub wall_seconds: f64,
    /// Terminal classification
    pub outcome: Outcome,
    /// Human-readable message (denied builtin, traceback text, block report)
    pub detail: Option<String>,
}

impl ExecutionResult {
    /// Whether the code ran to completion
    pub fn success(&self) -> bool {
        self.outcome == Outcome::Completed
    }

    fn blocked(detail: String) -> Self {
        ExecutionResult {
            stdout: String::new(),
            stderr: String::new(),
            wall_seconds: 0.0,
            outcome: Outcome::Blocked,
            detail: Some(detail),
        }
    }

    fn hard_timeout(limits: &ExecutionLimits) -> Self {
        ExecutionResult {
            stdout: String::new(),
            stderr: String::new(),
            wall_seconds: limits.max_wall_seconds,
            outcome: Outcome::TimedOut,
            detail: Some(format!(
                "wall clock budget of {:.1}s exceeded (interpreter killed)",
                limits.max_wall_seconds
            )),
        }
    }
}

/// Executor that gates untrusted code behind safety analysis
pub struct GatedExecutor {
    config: GateConfig,
    interpreter: PathBuf,
}

impl GatedExecutor {
    /// Create an executor, resolving the interpreter binary on PATH
    pub fn new(config: GateConfig) -> Result<Self> {
        let interpreter = which::which(&config.interpreter)
            .map_err(|_| Error::InterpreterNotFound(config.interpreter.clone()))?;
        debug!("using interpreter at {}", interpreter.display());
        Ok(GatedExecutor {
            config,
            interpreter,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Execute with the configured mode and limits
    pub async fn execute(&self, code: &str) -> Result<(ExecutionResult, SafetyReport)> {
        self.execute_with(code, self.config.mode, self.config.limits.clone())
            .await
    }

    /// Analyze, gate, and (if the verdict allows) execute `code`
    ///
    /// `limits` is owned by this one call; budgets never carry over.
    /// A `Blocked` result guarantees nothing was executed.
    pub async fn execute_with(
        &self,
        code: &str,
        mode: SafetyMode,
        limits: ExecutionLimits,
    ) -> Result<(ExecutionResult, SafetyReport)> {
        if code.trim().is_empty() {
            return Err(Error::InvalidInput("no code to execute".to_string()));
        }

        let report = SafetyAnalyzer::analyze(code, mode);
        if !report.is_safe {
            warn!(
                risk = %report.risk_level,
                issues = report.issue_count(),
                "blocking generated code"
            );
            let result = ExecutionResult::blocked(format_blocked_report(&report));
            return Ok((result, report));
        }

        debug!(
            risk = %report.risk_level,
            mode = %mode,
            "executing gated code"
        );

        let result = self.run_harness(code, mode, &limits).await?;
        Ok((result, report))
    }

    /// Spawn the interpreter, feed it the rendered harness, and classify
    /// whatever comes back
    async fn run_harness(
        &self,
        code: &str,
        mode: SafetyMode,
        limits: &ExecutionLimits,
    ) -> Result<ExecutionResult> {
        let program = harness::render(code, mode, limits, &self.config.host_modules)?;

        let mut child = Command::new(&self.interpreter)
            .arg("-I") // isolated: no site packages, no env hooks
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Sandbox(format!("failed to spawn interpreter: {}", e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(program.as_bytes()).await?;
            // Dropping stdin closes it so the interpreter starts.
        }

        let hard_limit = Duration::try_from_secs_f64(limits.max_wall_seconds)
            .unwrap_or(Duration::ZERO)
            + HARD_KILL_GRACE;

        let output = match tokio::time::timeout(hard_limit, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(Error::Sandbox(format!("interpreter process error: {}", e)))
            }
            Err(_) => {
                // Cooperative checkpoint never fired (e.g. a blocking C
                // call); the subprocess boundary lets us kill outright.
                warn!(
                    "interpreter exceeded hard wall limit of {:?}, killing",
                    hard_limit
                );
                return Ok(ExecutionResult::hard_timeout(limits));
            }
        };

        let raw_stdout = String::from_utf8_lossy(&output.stdout);
        let report: harness::HarnessReport = serde_json::from_str(raw_stdout.trim()).map_err(
            |e| {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Error::Internal(format!(
                    "harness produced no report ({}): {}",
                    e,
                    stderr.trim()
                ))
            },
        )?;

        Ok(ExecutionResult {
            stdout: self.cap_output(report.stdout),
            stderr: self.cap_output(report.stderr),
            wall_seconds: report.wall_seconds,
            outcome: report.outcome,
            detail: report.detail,
        })
    }

    /// Truncate captured output to the configured byte budget, on a char
    /// boundary
    fn cap_output(&self, mut text: String) -> String {
        let max = self.config.max_output_bytes;
        if text.len() > max {
            let mut cut = max;
            while cut > 0 && !text.is_char_boundary(cut) {
                cut -= 1;
            }
            text.truncate(cut);
            text.push_str("\n... (output truncated)");
        }
        text
    }
}
