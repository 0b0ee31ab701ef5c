//! Plumbing shared by the language runners.
//!
//! A runner returns an [`Outcome`]. `?` short-circuits on a failed stage
//! ([`Halt::Result`]) as well as on an I/O error ([`Halt::Error`]); both are
//! folded into an [`ExecutionResult`] by [`settle`] at the runner boundary.

use anyhow::Result;
use tracing::{debug, error};

use crate::core::hexdump::format_hexdump_limited;
use crate::core::merge::require;
use crate::core::types::{Artifact, ExecutionResult, ProcessResult};
use crate::io::config::EngineConfig;
use crate::io::process::{Invocation, ProcessExecutor};
use crate::io::workspace::ScratchWorkspace;

/// Why a runner stopped before producing its own result.
#[derive(Debug)]
pub enum Halt {
    /// A stage failed or the input was rejected; this is the final result.
    Result(ExecutionResult),
    /// Filesystem or other internal failure.
    Error(anyhow::Error),
}

impl From<ExecutionResult> for Halt {
    fn from(result: ExecutionResult) -> Self {
        Halt::Result(result)
    }
}

impl From<anyhow::Error> for Halt {
    fn from(err: anyhow::Error) -> Self {
        Halt::Error(err)
    }
}

pub type Outcome = std::result::Result<ExecutionResult, Halt>;

/// Fold a runner outcome into the caller-facing result.
pub fn settle(outcome: Outcome) -> ExecutionResult {
    match outcome {
        Ok(result) | Err(Halt::Result(result)) => result,
        Err(Halt::Error(err)) => {
            error!(err = %format!("{err:#}"), "pipeline failed");
            ExecutionResult::infrastructure(&err)
        }
    }
}

/// Configuration and executor handed to every runner.
pub struct Context<'a, E> {
    config: &'a EngineConfig,
    executor: &'a E,
}

impl<'a, E: ProcessExecutor> Context<'a, E> {
    pub fn new(config: &'a EngineConfig, executor: &'a E) -> Self {
        Self { config, executor }
    }

    pub fn workspace(&self) -> Result<ScratchWorkspace> {
        ScratchWorkspace::create_in(self.config.scratch_dir.as_deref())
    }

    /// Compile, assemble or link step run inside the workspace.
    pub fn build(&self, tool: &str, workspace: &ScratchWorkspace) -> Invocation {
        Invocation::new(self.config.tool(tool), self.config.build_timeout())
            .current_dir(workspace.path())
    }

    /// Interpreter or introspection tool run inside the workspace.
    pub fn tool_in(&self, tool: &str, workspace: &ScratchWorkspace) -> Invocation {
        self.interpret(tool).current_dir(workspace.path())
    }

    /// Interpreter run without a workspace.
    pub fn interpret(&self, tool: &str) -> Invocation {
        Invocation::new(self.config.tool(tool), self.config.run_timeout())
    }

    /// A program the pipeline built into the workspace.
    pub fn binary(&self, workspace: &ScratchWorkspace, name: &str) -> Invocation {
        Invocation::new(
            workspace.join(name).to_string_lossy(),
            self.config.run_timeout(),
        )
        .current_dir(workspace.path())
    }

    pub async fn exec(&self, invocation: Invocation) -> ProcessResult {
        debug!(command = %invocation.command_line(), "stage");
        self.executor.execute(&invocation).await
    }

    /// Run a non-terminal stage; its failure ends the pipeline.
    pub async fn stage(&self, invocation: Invocation) -> std::result::Result<ProcessResult, Halt> {
        Ok(require(self.exec(invocation).await)?)
    }

    /// Run a build step, then the program it produced.
    pub async fn build_then_run(
        &self,
        build: Invocation,
        workspace: &ScratchWorkspace,
        binary: &str,
    ) -> std::result::Result<ProcessResult, Halt> {
        self.stage(build).await?;
        Ok(self.exec(self.binary(workspace, binary)).await)
    }

    /// `hexdump` artifact of a file in the workspace.
    pub async fn hexdump(&self, workspace: &ScratchWorkspace, name: &str) -> Result<Artifact> {
        let bytes = workspace.read_bytes(name).await?;
        Ok(Artifact::labeled(
            "hexdump",
            format_hexdump_limited(&bytes, self.config.hexdump_limit_bytes),
        ))
    }
}
