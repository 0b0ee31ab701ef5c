//! Go: `go build`, then disassembly, hex dump and run of the binary.

use crate::core::arch::objdump_arch;
use crate::core::merge::{introspect, merge};
use crate::core::source::ensure_package_clause;
use crate::io::process::ProcessExecutor;
use crate::pipeline::stage::{Context, Outcome};

const BINARY: &str = "program";

pub async fn run<E: ProcessExecutor>(cx: &Context<'_, E>, source: &str) -> Outcome {
    let source = ensure_package_clause(source, "main");
    let workspace = cx.workspace()?;
    workspace.write("main.go", source.as_bytes()).await?;

    let build = cx
        .build("go", &workspace)
        .args(["build", "-o", BINARY, "main.go"]);
    cx.stage(build).await?;
    let hexdump = cx.hexdump(&workspace, BINARY).await?;

    let objdump = cx.tool_in("objdump", &workspace).args(["-d", BINARY]);
    let (objdump, run) = tokio::join!(cx.exec(objdump), cx.exec(cx.binary(&workspace, BINARY)));

    let label = format!("asm-{}", objdump_arch(objdump.stdout()));
    let objdump = introspect(label, objdump, |text| workspace.redact(&text));
    Ok(merge(run, vec![objdump, Ok(hexdump)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EngineConfig;
    use crate::core::types::ProcessResult;
    use crate::pipeline::{Language, evaluate_with};
    use crate::test_support::{ScriptedCall, ScriptedExecutor};

    fn executor(source_seen: std::sync::Arc<std::sync::Mutex<String>>) -> ScriptedExecutor {
        ScriptedExecutor::new()
            .with(
                ScriptedCall::new("go", ProcessResult::ok(""))
                    .with_effect(move |invocation| {
                        let dir = invocation.working_dir().expect("cwd");
                        let text = std::fs::read_to_string(dir.join("main.go")).expect("main.go");
                        *source_seen.lock().expect("lock") = text;
                    })
                    .writes_output(b"\x7fELF"),
            )
            .on(
                "objdump",
                ProcessResult::ok("program:     file format elf64-x86-64\n"),
            )
            .on("program", ProcessResult::ok("Hello, Go!\n"))
    }

    #[tokio::test]
    async fn injects_package_and_collects_artifacts() {
        let seen = std::sync::Arc::default();
        let exec = executor(std::sync::Arc::clone(&seen));
        let source = "// snippet\nimport \"fmt\"\n\nfunc main() { fmt.Println(\"Hello, Go!\") }\n";
        let result = evaluate_with(Language::Go, source, &EngineConfig::default(), &exec).await;

        assert_eq!(result.stdout, "Hello, Go!\n");
        assert_eq!(result.labels(), ["asm-x86_64", "hexdump"]);
        assert!(
            seen.lock()
                .expect("lock")
                .starts_with("// snippet\npackage main\n\nimport \"fmt\"")
        );
        let build = exec.call_to("go").expect("go");
        assert_eq!(build.arguments(), ["build", "-o", "program", "main.go"]);
    }

    #[tokio::test]
    async fn build_failure_skips_run() {
        let exec = ScriptedExecutor::new().on(
            "go",
            ProcessResult::new("", "./main.go:3:2: undefined: fmt", 1),
        );
        let result = evaluate_with(
            Language::Go,
            "package main\nfunc main(){fmt.Println()}",
            &EngineConfig::default(),
            &exec,
        )
        .await;
        assert_eq!(result.exit_code, 1);
        assert!(result.stderr.contains("undefined: fmt"));
        assert_eq!(exec.programs(), ["go"]);
    }
}
