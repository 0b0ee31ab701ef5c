//! In-process Brainfuck interpreter.
//!
//! Brainfuck needs no toolchain, so the pipeline runs it directly. The
//! machine is bounded by a step budget instead of a wall-clock timeout.

use thiserror::Error;

pub const TAPE_LEN: usize = 30_000;
pub const MAX_STEPS: u64 = 1_000_000;
/// A `Step …` line is recorded every this many steps.
pub const TRACE_INTERVAL: u64 = 1_000;

const STEP_LIMIT_NOTE: &str = "Program exceeded maximum step count (possible infinite loop)";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BracketError {
    #[error("Unmatched closing bracket at position {0}")]
    UnmatchedClose(usize),
    #[error("Unmatched opening bracket at position {0}")]
    UnmatchedOpen(usize),
}

/// Result of running a program to completion or to the step budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub output: String,
    pub trace: String,
    pub steps: u64,
    pub exhausted: bool,
}

/// Strip everything that is not one of the eight commands.
pub fn filter_commands(source: &str) -> Vec<u8> {
    source
        .bytes()
        .filter(|byte| b"[]<>+-.,".contains(byte))
        .collect()
}

/// Jump table mapping each bracket to its partner.
fn match_brackets(code: &[u8]) -> Result<Vec<usize>, BracketError> {
    let mut jumps = vec![0; code.len()];
    let mut open = Vec::new();
    for (pos, &op) in code.iter().enumerate() {
        match op {
            b'[' => open.push(pos),
            b']' => {
                let start = open.pop().ok_or(BracketError::UnmatchedClose(pos))?;
                jumps[start] = pos;
                jumps[pos] = start;
            }
            _ => {}
        }
    }
    match open.first() {
        Some(&pos) => Err(BracketError::UnmatchedOpen(pos)),
        None => Ok(jumps),
    }
}

pub struct Machine<'a> {
    code: Vec<u8>,
    input: &'a [u8],
    max_steps: u64,
}

impl<'a> Machine<'a> {
    pub fn new(source: &str) -> Self {
        Self {
            code: filter_commands(source),
            input: &[],
            max_steps: MAX_STEPS,
        }
    }

    /// Bytes consumed by `,`; reads past the end yield 0.
    pub fn with_input(mut self, input: &'a [u8]) -> Self {
        self.input = input;
        self
    }

    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn run(&self) -> Result<Execution, BracketError> {
        let jumps = match_brackets(&self.code)?;
        let mut tape = vec![0u8; TAPE_LEN];
        let mut ptr = 0usize;
        let mut pc = 0usize;
        let mut input = self.input.iter();
        let mut output = String::new();
        let mut trace = Vec::new();
        let mut steps = 0u64;

        while pc < self.code.len() && steps < self.max_steps {
            steps += 1;
            if steps % TRACE_INTERVAL == 0 {
                trace.push(format!("Step {steps}: ptr={ptr} val={}", tape[ptr]));
            }
            match self.code[pc] {
                b'>' => ptr = (ptr + 1) % TAPE_LEN,
                b'<' => ptr = (ptr + TAPE_LEN - 1) % TAPE_LEN,
                b'+' => tape[ptr] = tape[ptr].wrapping_add(1),
                b'-' => tape[ptr] = tape[ptr].wrapping_sub(1),
                b'.' => output.push(char::from(tape[ptr])),
                b',' => tape[ptr] = input.next().copied().unwrap_or(0),
                b'[' if tape[ptr] == 0 => pc = jumps[pc],
                b']' if tape[ptr] != 0 => {
                    pc = jumps[pc];
                    continue;
                }
                _ => {}
            }
            pc += 1;
        }

        let exhausted = pc < self.code.len();
        if exhausted {
            trace.push(STEP_LIMIT_NOTE.to_string());
        }
        Ok(Execution {
            output,
            trace: trace.join("\n"),
            steps,
            exhausted,
        })
    }
}
