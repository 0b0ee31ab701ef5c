//! Result shapes produced by the executor and the pipelines.
//!
//! These types are the stable contract between the engine and its callers.
//! Serialized field names follow the wire format served over HTTP
//! (`return_code`, `code_outputs`, artifact `language`).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Exit code reported when a stage was killed for exceeding its timeout.
pub const TIMEOUT_EXIT_CODE: i32 = 124;
/// Exit code reported for spawn failures, malformed input and internal errors.
pub const FAILURE_EXIT_CODE: i32 = 1;
/// Stderr text reported when a stage was killed for exceeding its timeout.
pub const TIMEOUT_MESSAGE: &str = "Execution timed out";

/// Outcome of exactly one child-process invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessResult {
    stdout: String,
    stderr: String,
    exit_code: i32,
}

impl ProcessResult {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
        }
    }

    /// Result of a stage that produced `stdout` and exited cleanly.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self::new(stdout, "", 0)
    }

    pub fn timed_out() -> Self {
        Self::new("", TIMEOUT_MESSAGE, TIMEOUT_EXIT_CODE)
    }

    /// Result of a process that could not be launched at all.
    pub fn spawn_failure(program: &str, err: &dyn fmt::Display) -> Self {
        Self::new(
            "",
            format!("Failed to execute {program}: {err}"),
            FAILURE_EXIT_CODE,
        )
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn is_timeout(&self) -> bool {
        self.exit_code == TIMEOUT_EXIT_CODE && self.stderr == TIMEOUT_MESSAGE
    }

    pub fn into_stdout(self) -> String {
        self.stdout
    }
}

/// A labeled side output (disassembly, hex dump, bytecode, debug trace).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub content: String,
    #[serde(rename = "language", default)]
    pub label: Option<String>,
}

impl Artifact {
    pub fn labeled(label: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            label: Some(label.into()),
        }
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// Terminal value of one pipeline invocation.
///
/// When a build or introspection stage fails, `stdout` is empty, `stderr`
/// carries that stage's diagnostic, `exit_code` is that stage's code and
/// `artifacts` is empty. See [`ExecutionResult::stage_failure`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub stdout: String,
    pub stderr: String,
    #[serde(rename = "return_code")]
    pub exit_code: i32,
    #[serde(rename = "code_outputs", default)]
    pub artifacts: Vec<Artifact>,
}

impl ExecutionResult {
    /// Result of the terminal run stage, with the artifacts gathered around it.
    pub fn from_run(run: ProcessResult, artifacts: Vec<Artifact>) -> Self {
        Self {
            stdout: run.stdout,
            stderr: run.stderr,
            exit_code: run.exit_code,
            artifacts,
        }
    }

    /// Result of a failed non-terminal stage.
    ///
    /// Some tools (`tsc`, `javac` warnings) print diagnostics on stdout; that
    /// text is moved after stderr so the diagnostic survives the empty stdout.
    pub fn stage_failure(stage: ProcessResult) -> Self {
        let ProcessResult {
            stdout,
            mut stderr,
            exit_code,
        } = stage;
        if !stdout.trim().is_empty() {
            if !stderr.is_empty() && !stderr.ends_with('\n') {
                stderr.push('\n');
            }
            stderr.push_str(&stdout);
        }
        Self {
            stdout: String::new(),
            stderr,
            exit_code,
            artifacts: Vec::new(),
        }
    }

    /// Input rejected before any process was spawned.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: message.into(),
            exit_code: FAILURE_EXIT_CODE,
            artifacts: Vec::new(),
        }
    }

    /// Filesystem or other internal failure caught at the runner boundary.
    pub fn infrastructure(err: &anyhow::Error) -> Self {
        Self::malformed(format!("Failed to execute: {err:#}"))
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn labels(&self) -> Vec<&str> {
        self.artifacts
            .iter()
            .map(|artifact| artifact.label().unwrap_or_default())
            .collect()
    }
}

impl From<ProcessResult> for ExecutionResult {
    fn from(run: ProcessResult) -> Self {
        Self::from_run(run, Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_failure_clears_stdout_and_keeps_diagnostic() {
        let stage = ProcessResult::new("", "main.c:1: error: expected ';'", 1);
        let result = ExecutionResult::stage_failure(stage);
        assert_eq!(result.stdout, "");
        assert_eq!(result.stderr, "main.c:1: error: expected ';'");
        assert_eq!(result.exit_code, 1);
        assert!(result.artifacts.is_empty());
    }

    #[test]
    fn stage_failure_moves_stdout_diagnostics_into_stderr() {
        let stage = ProcessResult::new("main.ts(1,7): error TS2322\n", "", 2);
        let result = ExecutionResult::stage_failure(stage);
        assert_eq!(result.stdout, "");
        assert_eq!(result.stderr, "main.ts(1,7): error TS2322\n");
        assert_eq!(result.exit_code, 2);

        let stage = ProcessResult::new("details", "summary", 2);
        let result = ExecutionResult::stage_failure(stage);
        assert_eq!(result.stderr, "summary\ndetails");
    }

    #[test]
    fn timeout_result_uses_reserved_code() {
        let result = ProcessResult::timed_out();
        assert_eq!(result.exit_code(), TIMEOUT_EXIT_CODE);
        assert_eq!(result.stderr(), "Execution timed out");
        assert!(result.is_timeout());
        assert!(!result.success());
    }

    #[test]
    fn spawn_failure_names_the_program() {
        let result = ProcessResult::spawn_failure("nasm", &"No such file or directory");
        assert_eq!(result.exit_code(), 1);
        assert_eq!(
            result.stderr(),
            "Failed to execute nasm: No such file or directory"
        );
    }

    #[test]
    fn serializes_with_wire_field_names() {
        let result = ExecutionResult::from_run(
            ProcessResult::ok("hi\n"),
            vec![Artifact::labeled("hexdump", "00000000  68 69")],
        );
        let value = serde_json::to_value(&result).expect("serialize");
        assert_eq!(value["stdout"], "hi\n");
        assert_eq!(value["return_code"], 0);
        assert_eq!(value["code_outputs"][0]["language"], "hexdump");
        assert_eq!(value["code_outputs"][0]["content"], "00000000  68 69");
    }
}
