//! TypeScript: `tsc` into `dist/`, then run the emitted JavaScript on node.

use anyhow::Context as _;
use serde_json::json;

use crate::core::merge::merge;
use crate::core::types::{Artifact, ExecutionResult};
use crate::io::process::ProcessExecutor;
use crate::pipeline::stage::{Context, Outcome};

const EMITTED: &str = "dist/main.js";

fn tsconfig() -> serde_json::Value {
    json!({
        "compilerOptions": {
            "target": "ES2020",
            "module": "commonjs",
            "strict": true,
            "esModuleInterop": true,
            "skipLibCheck": true,
            "forceConsistentCasingInFileNames": true,
            "outDir": "dist"
        },
        "files": ["main.ts"]
    })
}

pub async fn run<E: ProcessExecutor>(cx: &Context<'_, E>, source: &str) -> Outcome {
    let workspace = cx.workspace()?;
    let config = serde_json::to_string_pretty(&tsconfig()).context("serialize tsconfig")?;
    workspace.write("tsconfig.json", config).await?;
    workspace.write("main.ts", source).await?;

    cx.stage(cx.build("tsc", &workspace).args(["--project", "."]))
        .await?;

    if !workspace.join(EMITTED).is_file() {
        return Ok(ExecutionResult::malformed(
            "TypeScript compilation failed: no output file generated",
        ));
    }
    let javascript = workspace.read_to_string(EMITTED).await?;

    let run = cx.exec(cx.tool_in("node", &workspace).arg(EMITTED)).await;
    Ok(merge(run, vec![Ok(Artifact::labeled("javascript", javascript))]))
}
