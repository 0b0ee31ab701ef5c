//! Single-stage interpreters that take the source as an argument.

use crate::core::types::ExecutionResult;
use crate::io::process::ProcessExecutor;
use crate::pipeline::stage::{Context, Outcome};

/// `<tool> -c|-e <source>`; no workspace, no build stage.
pub async fn run<E: ProcessExecutor>(cx: &Context<'_, E>, tool: &str, source: &str) -> Outcome {
    let flag = if tool == "node" { "-e" } else { "-c" };
    let run = cx.exec(cx.interpret(tool).arg(flag).arg(source)).await;
    Ok(ExecutionResult::from(run))
}
