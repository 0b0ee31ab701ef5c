//! Haskell: GHC Core dump alongside an optimised build, then run.

use crate::core::merge::{Introspection, merge};
use crate::core::types::{Artifact, ProcessResult};
use crate::io::process::ProcessExecutor;
use crate::io::workspace::ScratchWorkspace;
use crate::pipeline::stage::{Context, Outcome};

const BINARY: &str = "program";

/// GHC prints `-ddump-simpl` output on stdout, older releases on stderr.
fn core_dump(stage: ProcessResult, workspace: &ScratchWorkspace) -> Introspection {
    if !stage.success() {
        return Err(stage);
    }
    let text = if stage.stdout().trim().is_empty() {
        stage.stderr()
    } else {
        stage.stdout()
    };
    Ok(Artifact::labeled("haskell-core", workspace.redact(text)))
}

pub async fn run<E: ProcessExecutor>(cx: &Context<'_, E>, source: &str) -> Outcome {
    let workspace = cx.workspace()?;
    workspace.write("Main.hs", source).await?;

    // Separate output dirs keep the two concurrent GHC runs apart.
    let dump = cx.build("ghc", &workspace).args([
        "-ddump-simpl",
        "-dsuppress-all",
        "-fforce-recomp",
        "-c",
        "-outputdir",
        "core",
        "Main.hs",
    ]);
    let build = cx.build("ghc", &workspace).args([
        "-O2",
        "-outputdir",
        "build",
        "Main.hs",
        "-o",
        BINARY,
    ]);
    let (dump, run) = tokio::join!(
        cx.exec(dump),
        cx.build_then_run(build, &workspace, BINARY),
    );
    let run = run?;

    Ok(merge(run, vec![core_dump(dump, &workspace)]))
}
