//! Java: the file is named after the public class, compiled into `classes/`.

use crate::core::merge::{introspect, merge};
use crate::core::source::public_class_name;
use crate::core::types::ExecutionResult;
use crate::io::process::ProcessExecutor;
use crate::pipeline::stage::{Context, Outcome};

const CLASSES: &str = "classes";

pub async fn run<E: ProcessExecutor>(cx: &Context<'_, E>, source: &str) -> Outcome {
    let class = match public_class_name(source) {
        Ok(class) => class,
        Err(err) => return Ok(ExecutionResult::malformed(err.to_string())),
    };
    let file = format!("{class}.java");
    let workspace = cx.workspace()?;
    workspace.write(&file, source).await?;

    let compile = cx
        .build("javac", &workspace)
        .args(["-d", CLASSES])
        .arg(file);
    cx.stage(compile).await?;
    let hexdump = cx
        .hexdump(&workspace, &format!("{CLASSES}/{class}.class"))
        .await?;

    let javap = cx
        .tool_in("javap", &workspace)
        .args(["-c", "-p", "-cp", CLASSES, class]);
    let java = cx.tool_in("java", &workspace).args(["-cp", CLASSES, class]);
    let (bytecode, run) = tokio::join!(cx.exec(javap), cx.exec(java));

    let bytecode = introspect("java-bytecode", bytecode, |text| workspace.redact(&text));
    Ok(merge(run, vec![bytecode, Ok(hexdump)]))
}
