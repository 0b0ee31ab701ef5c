//! Rules for folding stage outcomes into one [`ExecutionResult`].
//!
//! Stages are evaluated in pipeline order. The first failing build or
//! introspection stage wins outright; otherwise the run stage decides the
//! exit status and introspection outputs become artifacts in the order the
//! pipeline lists them. A failed run stage reports no artifacts.

use crate::core::types::{Artifact, ExecutionResult, ProcessResult};

/// Output of one introspection stage: an artifact, or the failed stage itself.
pub type Introspection = Result<Artifact, ProcessResult>;

/// Pass a successful non-terminal stage through, or turn its failure into
/// the terminal result.
pub fn require(stage: ProcessResult) -> Result<ProcessResult, ExecutionResult> {
    if stage.success() {
        Ok(stage)
    } else {
        Err(ExecutionResult::stage_failure(stage))
    }
}

/// Turn an introspection stage's stdout into an artifact.
///
/// `render` post-processes the text (path redaction, headers) and only runs
/// when the stage succeeded.
pub fn introspect<F>(label: impl Into<String>, stage: ProcessResult, render: F) -> Introspection
where
    F: FnOnce(String) -> String,
{
    if stage.success() {
        Ok(Artifact::labeled(label, render(stage.into_stdout())))
    } else {
        Err(stage)
    }
}

/// Combine the run stage with introspection outputs.
pub fn merge(run: ProcessResult, introspection: Vec<Introspection>) -> ExecutionResult {
    let mut artifacts = Vec::with_capacity(introspection.len());
    for stage in introspection {
        match stage {
            Ok(artifact) => artifacts.push(artifact),
            Err(failed) => return ExecutionResult::stage_failure(failed),
        }
    }
    if !run.success() {
        return ExecutionResult::from(run);
    }
    ExecutionResult::from_run(run, artifacts)
}

/// Attach a debug trace to a failed run.
///
/// Trace pipelines gather their artifact only because the run failed, so
/// the trace is the one artifact that survives a run failure.
pub fn with_trace(run: ProcessResult, trace: Option<Artifact>) -> ExecutionResult {
    let artifacts = trace
        .filter(|artifact| !artifact.content.trim().is_empty())
        .into_iter()
        .collect();
    ExecutionResult::from_run(run, artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asm() -> Introspection {
        Ok(Artifact::labeled("asm-x86_64", "main:\n  ret"))
    }

    fn hexdump() -> Introspection {
        Ok(Artifact::labeled("hexdump", "00000000  c3"))
    }

    #[test]
    fn require_passes_success_through() {
        let stage = require(ProcessResult::ok("built")).expect("success");
        assert_eq!(stage.stdout(), "built");
    }

    #[test]
    fn require_converts_failure_into_terminal_result() {
        let result = require(ProcessResult::new("partial", "boom", 4)).unwrap_err();
        assert_eq!(result.exit_code, 4);
        assert_eq!(result.stdout, "");
        assert!(result.stderr.starts_with("boom"));
    }

    #[test]
    fn earliest_failed_introspection_wins() {
        let result = merge(
            ProcessResult::ok(""),
            vec![
                asm(),
                Err(ProcessResult::new("", "objdump failed", 1)),
                Err(ProcessResult::timed_out()),
            ],
        );
        assert_eq!(result.exit_code, 1);
        assert_eq!(result.stderr, "objdump failed");
    }

    #[test]
    fn merge_keeps_artifact_order_on_success() {
        let result = merge(ProcessResult::ok("Hello\n"), vec![asm(), hexdump()]);
        assert_eq!(result.exit_code, 0);
        assert_eq!(result.stdout, "Hello\n");
        assert_eq!(result.labels(), vec!["asm-x86_64", "hexdump"]);
    }

    #[test]
    fn failed_introspection_overrides_successful_run() {
        let result = merge(
            ProcessResult::ok("Hello\n"),
            vec![asm(), Err(ProcessResult::new("", "objdump: bad file", 2))],
        );
        assert_eq!(result.exit_code, 2);
        assert_eq!(result.stdout, "");
        assert_eq!(result.stderr, "objdump: bad file");
        assert!(result.artifacts.is_empty());
    }

    #[test]
    fn failed_run_suppresses_artifacts() {
        let result = merge(
            ProcessResult::new("partial\n", "Segmentation fault", 139),
            vec![asm(), hexdump()],
        );
        assert_eq!(result.exit_code, 139);
        assert_eq!(result.stdout, "partial\n");
        assert!(result.artifacts.is_empty());
    }

    #[test]
    fn introspect_renders_only_on_success() {
        let artifact = introspect("asm-intel", ProcessResult::ok("mov eax, 0"), |text| {
            format!("; header\n{text}")
        })
        .expect("artifact");
        assert_eq!(artifact.content, "; header\nmov eax, 0");

        let failed = introspect("asm-intel", ProcessResult::new("", "bad", 1), |_| {
            unreachable!("render must not run for failed stages")
        });
        assert!(failed.is_err());
    }

    #[test]
    fn with_trace_drops_empty_traces() {
        let run = ProcessResult::new("", "error", 1);
        let result = with_trace(run.clone(), Some(Artifact::labeled("lua-debug", "  \n")));
        assert!(result.artifacts.is_empty());

        let result = with_trace(run, Some(Artifact::labeled("lua-debug", "traceback")));
        assert_eq!(result.labels(), vec!["lua-debug"]);
    }
}
