//! Running child processes under a timeout with bounded output.
//!
//! Every child is started as the leader of its own process group. On
//! timeout the whole group is killed, so shells and build tools cannot leave
//! orphaned grandchildren behind. A spawn failure is never an error here: it
//! becomes an ordinary [`ProcessResult`] with exit code 1.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, error, instrument, warn};

use crate::core::types::{FAILURE_EXIT_CODE, ProcessResult};

/// One child-process invocation: program, arguments, input and limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    stdin: Option<String>,
    timeout: Duration,
    current_dir: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            timeout,
            current_dir: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Text written to the child's stdin, which is then closed.
    pub fn stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn input(&self) -> Option<&str> {
        self.stdin.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.current_dir.as_deref()
    }

    /// Program and arguments joined by spaces, for logs and test assertions.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Abstraction over process execution.
///
/// Pipelines only talk to this trait. Tests drive them with a scripted
/// executor that returns canned results without spawning anything.
pub trait ProcessExecutor: Send + Sync {
    fn execute(&self, invocation: &Invocation) -> impl Future<Output = ProcessResult> + Send;
}

/// Executor that spawns real child processes.
#[derive(Debug, Clone, Copy)]
pub struct SystemExecutor {
    output_limit_bytes: usize,
}

impl SystemExecutor {
    pub fn new(output_limit_bytes: usize) -> Self {
        Self { output_limit_bytes }
    }
}

impl ProcessExecutor for SystemExecutor {
    async fn execute(&self, invocation: &Invocation) -> ProcessResult {
        run_process(invocation, self.output_limit_bytes).await
    }
}

/// Run one invocation to completion or to its timeout.
///
/// Stdout and stderr are read concurrently with the wait so a chatty child
/// cannot deadlock on a full pipe. At most `output_limit_bytes` per stream is
/// kept; the rest is drained and a truncation notice appended.
#[instrument(
    skip_all,
    fields(
        program = %invocation.program,
        timeout_ms = invocation.timeout.as_millis() as u64,
    )
)]
pub async fn run_process(invocation: &Invocation, output_limit_bytes: usize) -> ProcessResult {
    let mut cmd = Command::new(&invocation.program);
    cmd.args(&invocation.args)
        .stdin(if invocation.stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    if let Some(dir) = &invocation.current_dir {
        cmd.current_dir(dir);
    }
    #[cfg(unix)]
    cmd.process_group(0);

    debug!(command = %invocation.command_line(), "spawning child process");
    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(err) => {
            error!(err = %err, "failed to spawn command");
            return ProcessResult::spawn_failure(&invocation.program, &err);
        }
    };
    // The id is gone once the child is reaped, so capture the group now.
    let mut guard = GroupGuard::new(child.id());

    let outcome = timeout(
        invocation.timeout,
        collect(&mut child, invocation.stdin.clone(), output_limit_bytes),
    )
    .await;

    match outcome {
        Ok(Ok(captured)) => {
            guard.disarm();
            let result = captured.into_result();
            debug!(exit_code = result.exit_code(), "command finished");
            result
        }
        Ok(Err(err)) => {
            error!(err = %err, "failed to collect command output");
            ProcessResult::spawn_failure(&invocation.program, &err)
        }
        Err(_) => {
            warn!(
                timeout_ms = invocation.timeout.as_millis() as u64,
                "command timed out, killing process group"
            );
            guard.kill();
            if let Err(err) = child.start_kill() {
                debug!(err = %err, "child already gone");
            }
            if let Err(err) = child.wait().await {
                warn!(err = %err, "failed to reap timed out child");
            }
            ProcessResult::timed_out()
        }
    }
}

struct Captured {
    status: ExitStatus,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    stdout_truncated: usize,
    stderr_truncated: usize,
}

impl Captured {
    fn into_result(self) -> ProcessResult {
        if self.stdout_truncated > 0 || self.stderr_truncated > 0 {
            warn!(
                stdout_truncated = self.stdout_truncated,
                stderr_truncated = self.stderr_truncated,
                "output truncated"
            );
        }
        let mut stdout = String::from_utf8_lossy(&self.stdout).into_owned();
        stdout.push_str(&truncated_notice("stdout", self.stdout_truncated));
        let mut stderr = String::from_utf8_lossy(&self.stderr).into_owned();
        stderr.push_str(&truncated_notice("stderr", self.stderr_truncated));
        ProcessResult::new(stdout, stderr, exit_code(self.status))
    }
}

fn truncated_notice(stream: &str, truncated: usize) -> String {
    if truncated > 0 {
        format!("\n[{stream} truncated {truncated} bytes]\n")
    } else {
        String::new()
    }
}

async fn collect(
    child: &mut Child,
    input: Option<String>,
    limit: usize,
) -> std::io::Result<Captured> {
    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let feed = async move {
        if let (Some(mut pipe), Some(text)) = (stdin, input) {
            // A child that exits without reading its input closes the pipe early.
            if let Err(err) = pipe.write_all(text.as_bytes()).await {
                debug!(err = %err, "stdin closed before input was written");
            }
        }
    };

    let (status, stdout, stderr, ()) = tokio::join!(
        child.wait(),
        read_limited(stdout, limit),
        read_limited(stderr, limit),
        feed
    );
    let (stdout, stdout_truncated) = stdout?;
    let (stderr, stderr_truncated) = stderr?;
    Ok(Captured {
        status: status?,
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
    })
}

async fn read_limited<R>(reader: Option<R>, limit: usize) -> std::io::Result<(Vec<u8>, usize)>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    let mut truncated = 0usize;
    let Some(mut reader) = reader else {
        return Ok((buf, truncated));
    };
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        let remaining = limit.saturating_sub(buf.len());
        if remaining > 0 {
            let keep = n.min(remaining);
            buf.extend_from_slice(&chunk[..keep]);
            truncated += n.saturating_sub(keep);
        } else {
            truncated += n;
        }
    }

    Ok((buf, truncated))
}

/// Exit code of a finished child; death by signal maps to `128 + signal`.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    FAILURE_EXIT_CODE
}

/// Kills the child's process group when dropped while armed.
///
/// Dropping the pipeline future mid-stage (caller cancellation) therefore
/// takes the whole tree down, not just the direct child.
struct GroupGuard {
    pgid: Option<u32>,
}

impl GroupGuard {
    fn new(pgid: Option<u32>) -> Self {
        Self { pgid }
    }

    fn disarm(&mut self) {
        self.pgid = None;
    }

    fn kill(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            kill_process_tree(pgid);
        }
    }
}

impl Drop for GroupGuard {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Send `SIGKILL` to every process in the group led by `pgid`.
#[cfg(unix)]
pub fn kill_process_tree(pgid: u32) {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Ok(raw) = i32::try_from(pgid) else {
        warn!(pgid, "process group id out of range");
        return;
    };
    match killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(err) => warn!(pgid, err = %err, "failed to kill process group"),
    }
}

/// Without process groups only the direct child is killed, via `kill_on_drop`.
#[cfg(not(unix))]
pub fn kill_process_tree(_pgid: u32) {}
