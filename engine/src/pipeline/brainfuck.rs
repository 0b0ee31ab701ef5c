//! Brainfuck runs on the in-process machine; no child process is involved.

use crate::core::brainfuck::Machine;
use crate::core::merge::with_trace;
use crate::core::types::{
    Artifact, ExecutionResult, ProcessResult, TIMEOUT_EXIT_CODE, TIMEOUT_MESSAGE,
};
use crate::pipeline::stage::Outcome;

const LABEL: &str = "brainfuck-debug";

/// Exhausting the step budget is reported like a timeout, keeping the
/// output produced so far and the step trace.
pub fn run(source: &str) -> Outcome {
    let execution = match Machine::new(source).run() {
        Ok(execution) => execution,
        Err(err) => return Ok(ExecutionResult::malformed(err.to_string())),
    };

    let trace = Some(Artifact::labeled(LABEL, execution.trace));
    let run = if execution.exhausted {
        ProcessResult::new(execution.output, TIMEOUT_MESSAGE, TIMEOUT_EXIT_CODE)
    } else {
        ProcessResult::ok(execution.output)
    };
    Ok(with_trace(run, trace))
}
