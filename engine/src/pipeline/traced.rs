//! Interpreters that re-run a failed program with tracing enabled.
//!
//! The trace is the diagnostic for the failure, so unlike the other
//! pipelines these attach their artifact only when the run fails.

use crate::core::merge::{require, with_trace};
use crate::core::types::{Artifact, ExecutionResult, ProcessResult};
use crate::io::process::ProcessExecutor;
use crate::io::workspace::ScratchWorkspace;
use crate::pipeline::stage::{Context, Outcome};

/// A run that should be followed by a trace: failed, but not killed.
fn wants_trace(run: &ProcessResult) -> bool {
    !run.success() && !run.is_timeout()
}

fn trace_artifact(label: &str, trace: ProcessResult, workspace: &ScratchWorkspace) -> Artifact {
    Artifact::labeled(label, workspace.redact(trace.stderr()))
}

/// `ruby -wc` syntax check, `ruby -w` run, `ruby -w -d` trace on failure.
pub async fn ruby<E: ProcessExecutor>(cx: &Context<'_, E>, source: &str) -> Outcome {
    let workspace = cx.workspace()?;
    workspace.write("main.rb", source).await?;

    let check = cx.exec(cx.tool_in("ruby", &workspace).args(["-wc", "main.rb"])).await;
    require(check)?;

    let run = cx.exec(cx.tool_in("ruby", &workspace).args(["-w", "main.rb"])).await;
    if !wants_trace(&run) {
        return Ok(ExecutionResult::from(run));
    }
    let trace = cx
        .exec(cx.tool_in("ruby", &workspace).args(["-w", "-d", "main.rb"]))
        .await;
    Ok(with_trace(run, Some(trace_artifact("ruby-debug", trace, &workspace))))
}

/// Wrap a Lua chunk so an error prints a full `debug.traceback`.
fn lua_traceback_wrapper(source: &str) -> String {
    format!(
        "local ok, err = xpcall(function()\n{source}\nend, debug.traceback)\n\
         if not ok then\n  io.stderr:write(tostring(err), \"\\n\")\n  os.exit(1)\nend\n"
    )
}

/// Compiles `main.lua` without running it; prints the parse error and exits 1.
const LUA_SYNTAX_CHECK: &str = "local ok, err = loadfile('main.lua') \
     if not ok then io.stderr:write(err, '\\n') os.exit(1) end";

/// `loadfile` parse check, `lua -W` run, traceback wrapper on failure.
///
/// The check runs in `lua` itself since `luac` is often packaged separately.
pub async fn lua<E: ProcessExecutor>(cx: &Context<'_, E>, source: &str) -> Outcome {
    let workspace = cx.workspace()?;
    workspace.write("main.lua", source).await?;

    let check = cx
        .exec(cx.tool_in("lua", &workspace).args(["-e", LUA_SYNTAX_CHECK]))
        .await;
    require(check)?;

    let run = cx.exec(cx.tool_in("lua", &workspace).args(["-W", "main.lua"])).await;
    if !wants_trace(&run) {
        return Ok(ExecutionResult::from(run));
    }
    workspace
        .write("debug.lua", lua_traceback_wrapper(source))
        .await?;
    let trace = cx.exec(cx.tool_in("lua", &workspace).arg("debug.lua")).await;
    Ok(with_trace(run, Some(trace_artifact("lua-debug", trace, &workspace))))
}

/// `swipl` run with `halt` as the toplevel, re-run under `trace` on failure.
pub async fn prolog<E: ProcessExecutor>(cx: &Context<'_, E>, source: &str) -> Outcome {
    let workspace = cx.workspace()?;
    workspace.write("main.pl", source).await?;

    let swipl = |toplevel: &str| {
        cx.tool_in("swipl", &workspace)
            .args(["-q", "-O", "-s", "main.pl", "-t", toplevel])
    };
    let run = cx.exec(swipl("halt")).await;
    if !wants_trace(&run) {
        return Ok(ExecutionResult::from(run));
    }
    let trace = cx.exec(swipl("trace")).await;
    Ok(with_trace(run, Some(trace_artifact("prolog-trace", trace, &workspace))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineConfig;
    use crate::pipeline::{Language, evaluate_with};
    use crate::test_support::{ScriptedCall, ScriptedExecutor};

    #[tokio::test]
    async fn ruby_success_has_no_trace() {
        let exec = ScriptedExecutor::new()
            .with(ScriptedCall::new("ruby", ProcessResult::ok("Syntax OK\n")).when_arg("-wc"))
            .on("ruby", ProcessResult::ok("hi\n"));
        let result =
            evaluate_with(Language::Ruby, "puts 'hi'", &EngineConfig::default(), &exec).await;
        assert_eq!(result.stdout, "hi\n");
        assert!(result.artifacts.is_empty());
        assert_eq!(exec.programs(), ["ruby", "ruby"]);
    }

    #[tokio::test]
    async fn ruby_syntax_error_stops_before_run() {
        let exec = ScriptedExecutor::new().with(
            ScriptedCall::new("ruby", ProcessResult::new("", "main.rb:1: syntax error", 1))
                .when_arg("-wc"),
        );
        let result = evaluate_with(Language::Ruby, "puts(", &EngineConfig::default(), &exec).await;
        assert_eq!(result.exit_code, 1);
        assert_eq!(result.stdout, "");
        assert!(result.stderr.contains("syntax error"));
        assert_eq!(exec.calls().len(), 1);
    }

    #[tokio::test]
    async fn ruby_failure_attaches_debug_trace() {
        let exec = ScriptedExecutor::new()
            .with(ScriptedCall::new("ruby", ProcessResult::ok("Syntax OK\n")).when_arg("-wc"))
            .with(
                ScriptedCall::new("ruby", ProcessResult::new("", "Exception `RuntimeError'", 1))
                    .when_arg("-d"),
            )
            .on("ruby", ProcessResult::new("", "main.rb:1: boom (RuntimeError)", 1));
        let result =
            evaluate_with(Language::Ruby, "raise 'boom'", &EngineConfig::default(), &exec).await;
        assert_eq!(result.exit_code, 1);
        assert_eq!(result.stderr, "main.rb:1: boom (RuntimeError)");
        assert_eq!(result.labels(), ["ruby-debug"]);
        assert_eq!(result.artifacts[0].content, "Exception `RuntimeError'");
    }

    #[tokio::test]
    async fn lua_failure_reruns_wrapped_chunk() {
        let exec = ScriptedExecutor::new()
            .with(ScriptedCall::new("lua", ProcessResult::ok("")).when_arg("-e"))
            .with(
                ScriptedCall::new("lua", ProcessResult::new("", "stack traceback:\n\t[C]: in ?", 1))
                    .when_arg("debug.lua"),
            )
            .on("lua", ProcessResult::new("", "lua: main.lua:1: boom", 1));
        let result =
            evaluate_with(Language::Lua, "error('boom')", &EngineConfig::default(), &exec).await;
        assert_eq!(result.stderr, "lua: main.lua:1: boom");
        assert_eq!(result.labels(), ["lua-debug"]);
        assert!(result.artifacts[0].content.starts_with("stack traceback"));
        assert_eq!(exec.programs(), ["lua", "lua", "lua"]);
    }

    #[tokio::test]
    async fn timeout_skips_the_trace() {
        let exec = ScriptedExecutor::new()
            .with(ScriptedCall::new("lua", ProcessResult::ok("")).when_arg("-e"))
            .on("lua", ProcessResult::timed_out());
        let result = evaluate_with(
            Language::Lua,
            "while true do end",
            &EngineConfig::default(),
            &exec,
        )
        .await;
        assert_eq!(result.exit_code, 124);
        assert!(result.artifacts.is_empty());
        assert_eq!(exec.programs(), ["lua", "lua"]);
    }

    #[tokio::test]
    async fn lua_syntax_check_needs_only_the_interpreter() {
        let exec = ScriptedExecutor::new().with(
            ScriptedCall::new("lua", ProcessResult::new("", "main.lua:1: unexpected symbol", 1))
                .when_arg("-e"),
        );
        let result = evaluate_with(Language::Lua, "x = = 1", &EngineConfig::default(), &exec).await;

        assert_eq!(result.exit_code, 1);
        assert_eq!(result.stderr, "main.lua:1: unexpected symbol");
        assert!(result.artifacts.is_empty());
        let check = exec.call_to("lua").expect("lua");
        assert_eq!(check.arguments()[0], "-e");
        assert!(check.arguments()[1].contains("loadfile('main.lua')"));
        assert_eq!(exec.programs(), ["lua"]);
    }

    #[tokio::test]
    async fn prolog_failure_attaches_trace() {
        let exec = ScriptedExecutor::new()
            .with(
                ScriptedCall::new("swipl", ProcessResult::new("", "Call: (10) main", 1))
                    .when_arg("trace"),
            )
            .on("swipl", ProcessResult::new("", "Warning: goal (directive) failed", 1));
        let result = evaluate_with(
            Language::Prolog,
            ":- initialization(main).",
            &EngineConfig::default(),
            &exec,
        )
        .await;
        assert_eq!(result.exit_code, 1);
        assert_eq!(result.labels(), ["prolog-trace"]);
        let first = exec.calls().remove(0);
        assert_eq!(first.arguments(), ["-q", "-O", "-s", "main.pl", "-t", "halt"]);
    }

    #[test]
    fn lua_wrapper_embeds_source() {
        let wrapped = lua_traceback_wrapper("print(1)");
        assert!(wrapped.starts_with("local ok, err = xpcall(function()\nprint(1)\nend"));
        assert!(wrapped.contains("os.exit(1)"));
    }
}
