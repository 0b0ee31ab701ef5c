//! Assembly: directive-selected assembler, `ld`, then hex dump and run.

use crate::core::directive::{Arch, AsmDirective, Syntax, parse_asm_directive};
use crate::core::merge::merge;
use crate::core::types::ExecutionResult;
use crate::io::process::ProcessExecutor;
use crate::pipeline::stage::{Context, Outcome};

const SOURCE: &str = "code.asm";
const OBJECT: &str = "code.o";
const BINARY: &str = "program";
const MACOS_SDK: &str = "/Library/Developer/CommandLineTools/SDKs/MacOSX.sdk";

/// Assembler and linker command lines for one directive on one host OS.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Plan {
    assembler: &'static str,
    assemble: Vec<String>,
    link: Vec<String>,
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|arg| (*arg).to_string()).collect()
}

fn plan(directive: AsmDirective, target_os: &str) -> Plan {
    let macos = target_os == "macos";
    let (assembler, mut assemble) = match (directive.arch, directive.syntax) {
        (Arch::X86_64, Syntax::Intel) => {
            let format = if macos { "macho64" } else { "elf64" };
            ("nasm", strings(&["-f", format]))
        }
        (Arch::X86, Syntax::Intel) => {
            let format = if macos { "macho" } else { "elf32" };
            ("nasm", strings(&["-f", format]))
        }
        (Arch::X86_64, Syntax::Att) => ("as", strings(&["--64"])),
        (Arch::X86, Syntax::Att) => ("as", strings(&["--32"])),
        (Arch::Arm64, _) if macos => ("as", strings(&["-arch", "arm64"])),
        (Arch::Arm64, _) => ("as", Vec::new()),
    };
    assemble.extend(strings(&[SOURCE, "-o", OBJECT]));

    let mut link = Vec::new();
    if directive.arch == Arch::X86 && !macos {
        link.extend(strings(&["-m", "elf_i386"]));
    }
    link.extend(strings(&[OBJECT, "-o", BINARY]));
    if macos {
        link.extend(strings(&["-lSystem", "-syslibroot", MACOS_SDK, "-e", "_start"]));
    }

    Plan {
        assembler,
        assemble,
        link,
    }
}

pub async fn run<E: ProcessExecutor>(cx: &Context<'_, E>, source: &str) -> Outcome {
    let (directive, body) = match parse_asm_directive(source) {
        Ok(parsed) => parsed,
        Err(err) => return Ok(ExecutionResult::malformed(err.to_string())),
    };
    let plan = plan(directive, std::env::consts::OS);

    let workspace = cx.workspace()?;
    // Keep the directive's line so assembler diagnostics match the submission.
    workspace.write(SOURCE, format!("\n{body}")).await?;

    cx.stage(cx.build(plan.assembler, &workspace).args(plan.assemble))
        .await?;
    cx.stage(cx.build("ld", &workspace).args(plan.link)).await?;
    let hexdump = cx.hexdump(&workspace, OBJECT).await?;

    let run = cx.exec(cx.binary(&workspace, BINARY)).await;
    Ok(merge(run, vec![Ok(hexdump)]))
}
