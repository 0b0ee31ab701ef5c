//! Test-only executor that returns scripted results without spawning processes.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use crate::core::types::ProcessResult;
use crate::io::process::{Invocation, ProcessExecutor};

type Effect = Arc<dyn Fn(&Invocation) + Send + Sync>;
type Respond = Arc<dyn Fn(&Invocation) -> ProcessResult + Send + Sync>;

/// One scripted response, matched by program file name and optional argument.
#[derive(Clone)]
pub struct ScriptedCall {
    program: String,
    arg: Option<String>,
    respond: Respond,
    effects: Vec<Effect>,
}

impl ScriptedCall {
    pub fn new(program: &str, result: ProcessResult) -> Self {
        Self::responding(program, move |_| result.clone())
    }

    /// Build the result from the invocation, e.g. to echo its working dir.
    pub fn responding<F>(program: &str, respond: F) -> Self
    where
        F: Fn(&Invocation) -> ProcessResult + Send + Sync + 'static,
    {
        Self {
            program: program.to_string(),
            arg: None,
            respond: Arc::new(respond),
            effects: Vec::new(),
        }
    }

    /// Only match invocations that carry `arg` verbatim.
    pub fn when_arg(mut self, arg: &str) -> Self {
        self.arg = Some(arg.to_string());
        self
    }

    /// Write `contents` to the path following `-o`, as a compiler would.
    pub fn writes_output(self, contents: &[u8]) -> Self {
        let contents = contents.to_vec();
        self.with_effect(move |invocation| {
            let args = invocation.arguments();
            let target = args
                .iter()
                .position(|arg| arg == "-o")
                .and_then(|index| args.get(index + 1))
                .filter(|target| target.as_str() != "-");
            if let Some(target) = target {
                write_relative(invocation, target, &contents);
            }
        })
    }

    /// Write `contents` to `path` relative to the invocation's working dir.
    pub fn writes_file(self, path: &str, contents: &[u8]) -> Self {
        let path = path.to_string();
        let contents = contents.to_vec();
        self.with_effect(move |invocation| write_relative(invocation, &path, &contents))
    }

    pub fn with_effect<F>(mut self, effect: F) -> Self
    where
        F: Fn(&Invocation) + Send + Sync + 'static,
    {
        self.effects.push(Arc::new(effect));
        self
    }

    fn matches(&self, invocation: &Invocation) -> bool {
        program_name(invocation.program()) == self.program
            && self
                .arg
                .as_ref()
                .is_none_or(|arg| invocation.arguments().contains(arg))
    }
}

fn write_relative(invocation: &Invocation, path: &str, contents: &[u8]) {
    let base = invocation.working_dir().unwrap_or_else(|| Path::new("."));
    let path = base.join(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create scripted output dir");
    }
    std::fs::write(&path, contents).expect("write scripted output");
}

fn program_name(program: &str) -> &str {
    Path::new(program)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(program)
}

/// Executor driven by [`ScriptedCall`]s; the first matching call wins.
///
/// Unscripted invocations fail like a missing binary would.
#[derive(Default)]
pub struct ScriptedExecutor {
    script: Vec<ScriptedCall>,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, program: &str, result: ProcessResult) -> Self {
        self.with(ScriptedCall::new(program, result))
    }

    pub fn with(mut self, call: ScriptedCall) -> Self {
        self.script.push(call);
        self
    }

    /// Invocations received so far, in call order.
    pub fn calls(&self) -> Vec<Invocation> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// File names of the programs invoked so far, in call order.
    pub fn programs(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|call| program_name(call.program()).to_string())
            .collect()
    }

    /// The first recorded invocation of `program`.
    pub fn call_to(&self, program: &str) -> Option<Invocation> {
        self.calls()
            .into_iter()
            .find(|call| program_name(call.program()) == program)
    }
}

impl ProcessExecutor for ScriptedExecutor {
    async fn execute(&self, invocation: &Invocation) -> ProcessResult {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(invocation.clone());
        let Some(call) = self.script.iter().find(|call| call.matches(invocation)) else {
            return ProcessResult::spawn_failure(invocation.program(), &"no scripted result");
        };
        for effect in &call.effects {
            effect(invocation);
        }
        (call.respond)(invocation)
    }
}
