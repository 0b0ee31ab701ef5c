//! Language registry and the per-language runners.
//!
//! Every runner follows the same shape: prepare a scratch workspace, run the
//! build stages in order, run introspection stages alongside the program,
//! then merge. Any stage failure short-circuits the rest.

mod assembly;
mod brainfuck;
mod go;
mod haskell;
mod interpreted;
mod java;
mod native;
pub mod stage;
mod traced;
mod typescript;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use crate::core::types::ExecutionResult;
use crate::io::config::EngineConfig;
use crate::io::process::{ProcessExecutor, SystemExecutor};
use crate::pipeline::stage::{Context, settle};

/// Supported languages. Serialized names are the wire tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Python,
    Javascript,
    Ruby,
    Lua,
    Prolog,
    Brainfuck,
    Typescript,
    C,
    Cpp,
    CToAsm,
    CToObjdump,
    Rust,
    Go,
    Java,
    Haskell,
    Assembly,
}

impl Language {
    pub const ALL: [Language; 16] = [
        Language::Python,
        Language::Javascript,
        Language::Ruby,
        Language::Lua,
        Language::Prolog,
        Language::Brainfuck,
        Language::Typescript,
        Language::C,
        Language::Cpp,
        Language::CToAsm,
        Language::CToObjdump,
        Language::Rust,
        Language::Go,
        Language::Java,
        Language::Haskell,
        Language::Assembly,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Javascript => "javascript",
            Language::Ruby => "ruby",
            Language::Lua => "lua",
            Language::Prolog => "prolog",
            Language::Brainfuck => "brainfuck",
            Language::Typescript => "typescript",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CToAsm => "c_to_asm",
            Language::CToObjdump => "c_to_objdump",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::Java => "java",
            Language::Haskell => "haskell",
            Language::Assembly => "assembly",
        }
    }

    /// Human-readable name for menus and banners.
    pub fn display_name(self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::Javascript => "JavaScript",
            Language::Ruby => "Ruby",
            Language::Lua => "Lua",
            Language::Prolog => "Prolog",
            Language::Brainfuck => "Brainfuck",
            Language::Typescript => "TypeScript",
            Language::C => "C",
            Language::Cpp => "C++",
            Language::CToAsm => "C to Assembly",
            Language::CToObjdump => "C to Objdump",
            Language::Rust => "Rust",
            Language::Go => "Go",
            Language::Java => "Java",
            Language::Haskell => "Haskell",
            Language::Assembly => "Assembly",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported language: {0}")]
pub struct UnknownLanguage(pub String);

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|language| language.as_str() == tag)
            .ok_or_else(|| UnknownLanguage(tag.to_string()))
    }
}

/// Run `source` with the default configuration and real processes.
pub async fn evaluate(language: Language, source: &str) -> ExecutionResult {
    let config = EngineConfig::default();
    let executor = SystemExecutor::new(config.output_limit_bytes);
    evaluate_with(language, source, &config, &executor).await
}

/// Run `source` through the pipeline for `language`.
///
/// Infallible: stage failures, malformed input and internal errors all come
/// back as an [`ExecutionResult`].
#[instrument(skip_all, fields(language = %language, source_bytes = source.len()))]
pub async fn evaluate_with<E: ProcessExecutor>(
    language: Language,
    source: &str,
    config: &EngineConfig,
    executor: &E,
) -> ExecutionResult {
    let cx = Context::new(config, executor);
    let outcome = match language {
        Language::Python => interpreted::run(&cx, "python", source).await,
        Language::Javascript => interpreted::run(&cx, "node", source).await,
        Language::Ruby => traced::ruby(&cx, source).await,
        Language::Lua => traced::lua(&cx, source).await,
        Language::Prolog => traced::prolog(&cx, source).await,
        Language::Brainfuck => brainfuck::run(source),
        Language::Typescript => typescript::run(&cx, source).await,
        Language::C => native::c(&cx, source).await,
        Language::Cpp => native::cpp(&cx, source).await,
        Language::CToAsm => native::c_to_asm(&cx, source).await,
        Language::CToObjdump => native::c_to_objdump(&cx, source).await,
        Language::Rust => native::rust(&cx, source).await,
        Language::Go => go::run(&cx, source).await,
        Language::Java => java::run(&cx, source).await,
        Language::Haskell => haskell::run(&cx, source).await,
        Language::Assembly => assembly::run(&cx, source).await,
    };
    let result = settle(outcome);
    info!(
        exit_code = result.exit_code,
        artifacts = result.artifacts.len(),
        "evaluation finished"
    );
    result
}
