//! Native compile-then-run pipelines: C, C++, Rust and the C inspection
//! variants that add assembly listings, disassembly and hex dumps.

use crate::core::arch::{host_arch, host_is_x86, objdump_arch};
use crate::core::directive::compiler_flags;
use crate::core::merge::{Introspection, introspect, merge};
use crate::core::types::{ExecutionResult, ProcessResult};
use crate::io::process::{Invocation, ProcessExecutor};
use crate::io::workspace::ScratchWorkspace;
use crate::pipeline::stage::{Context, Outcome};

const BINARY: &str = "program";
const OBJECT: &str = "main.o";

/// `gcc main.c -o program`, then run.
pub async fn c<E: ProcessExecutor>(cx: &Context<'_, E>, source: &str) -> Outcome {
    let workspace = cx.workspace()?;
    workspace.write("main.c", source).await?;
    let build = cx
        .build("gcc", &workspace)
        .args(["main.c", "-o", BINARY]);
    let run = cx.build_then_run(build, &workspace, BINARY).await?;
    Ok(ExecutionResult::from(run))
}

/// `rustc main.rs -o program`, then run.
pub async fn rust<E: ProcessExecutor>(cx: &Context<'_, E>, source: &str) -> Outcome {
    let workspace = cx.workspace()?;
    workspace.write("main.rs", source).await?;
    let build = cx
        .build("rustc", &workspace)
        .args(["--edition", "2021", "main.rs", "-o", BINARY]);
    let run = cx.build_then_run(build, &workspace, BINARY).await?;
    Ok(ExecutionResult::from(run))
}

/// Label for compiler-emitted assembly: `asm-intel` where Intel syntax was
/// requested, otherwise the host architecture.
fn assembly_label() -> String {
    if host_is_x86() {
        "asm-intel".to_string()
    } else {
        format!("asm-{}", host_arch())
    }
}

/// Assembly listing of `file` written to stdout.
fn assembly_listing<E: ProcessExecutor>(
    cx: &Context<'_, E>,
    compiler: &str,
    workspace: &ScratchWorkspace,
    flags: &[String],
    file: &str,
) -> Invocation {
    let mut invocation = cx.build(compiler, workspace).arg("-S");
    if host_is_x86() {
        invocation = invocation.arg("-masm=intel");
    }
    invocation
        .args(flags.iter().cloned())
        .args([file, "-o", "-"])
}

/// First line of a C listing. The syntax is only named when `-masm=intel` was
/// passed; other targets list in their native syntax.
fn listing_header(arch: &str, intel: bool) -> String {
    if intel {
        format!("// arch: {arch} syntax: intel\n\n")
    } else {
        format!("// arch: {arch}\n\n")
    }
}

fn disassembly(stage: ProcessResult, workspace: &ScratchWorkspace) -> Introspection {
    let label = format!("asm-{}", objdump_arch(stage.stdout()));
    introspect(label, stage, |text| workspace.redact(&text))
}

/// Flag directive; C++ object; then listing, disassembly and link+run together.
pub async fn cpp<E: ProcessExecutor>(cx: &Context<'_, E>, source: &str) -> Outcome {
    let flags = compiler_flags(source);
    let workspace = cx.workspace()?;
    workspace.write("main.cpp", source).await?;

    let object = cx
        .build("g++", &workspace)
        .args(flags.iter().cloned())
        .args(["-c", "main.cpp", "-o", OBJECT]);
    cx.stage(object).await?;
    let hexdump = cx.hexdump(&workspace, OBJECT).await?;

    let listing = assembly_listing(cx, "g++", &workspace, &flags, "main.cpp");
    let objdump = cx.tool_in("objdump", &workspace).args(["-d", OBJECT]);
    let link = cx
        .build("g++", &workspace)
        .args(flags.iter().cloned())
        .args([OBJECT, "-o", BINARY]);
    let (listing, objdump, run) = tokio::join!(
        cx.exec(listing),
        cx.exec(objdump),
        cx.build_then_run(link, &workspace, BINARY),
    );
    let run = run?;

    let listing = introspect(assembly_label(), listing, |text| workspace.redact(&text));
    let objdump = disassembly(objdump, &workspace);
    Ok(merge(run, vec![listing, objdump, Ok(hexdump)]))
}

/// Flag directive; assembly listing alongside compile+run.
pub async fn c_to_asm<E: ProcessExecutor>(cx: &Context<'_, E>, source: &str) -> Outcome {
    let flags = compiler_flags(source);
    let workspace = cx.workspace()?;
    workspace.write("main.c", source).await?;

    let listing = assembly_listing(cx, "gcc", &workspace, &flags, "main.c");
    let build = cx
        .build("gcc", &workspace)
        .args(flags.iter().cloned())
        .args(["main.c", "-o", BINARY]);
    let (listing, run) = tokio::join!(
        cx.exec(listing),
        cx.build_then_run(build, &workspace, BINARY),
    );
    let run = run?;

    let header = listing_header(host_arch(), host_is_x86());
    let listing = introspect(assembly_label(), listing, |text| {
        header + &workspace.redact(&text)
    });
    Ok(merge(run, vec![listing]))
}

/// Flag directive; object file; then disassembly alongside link+run.
pub async fn c_to_objdump<E: ProcessExecutor>(cx: &Context<'_, E>, source: &str) -> Outcome {
    let flags = compiler_flags(source);
    let workspace = cx.workspace()?;
    workspace.write("main.c", source).await?;

    let object = cx
        .build("gcc", &workspace)
        .args(flags.iter().cloned())
        .args(["-c", "main.c", "-o", OBJECT]);
    cx.stage(object).await?;
    let hexdump = cx.hexdump(&workspace, OBJECT).await?;

    let objdump = cx.tool_in("objdump", &workspace).args(["-d", OBJECT]);
    let link = cx
        .build("gcc", &workspace)
        .args(flags.iter().cloned())
        .args([OBJECT, "-o", BINARY]);
    let (objdump, run) = tokio::join!(
        cx.exec(objdump),
        cx.build_then_run(link, &workspace, BINARY),
    );
    let run = run?;

    Ok(merge(run, vec![disassembly(objdump, &workspace), Ok(hexdump)]))
}
