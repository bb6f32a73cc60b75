//! Process adapter
//!
//! Implements the `StageRunner` port with `tokio::process`. Each invocation
//! is driven to completion on a private current-thread runtime, so callers
//! stay synchronous and stages still run one at a time.

use std::process::{ExitStatus, Stdio};
use std::time::Instant;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::runtime::{Builder, Runtime};

use crate::core::models::{ExecutionResult, Termination};
use crate::core::ports::{Invocation, StageRunner};

/// Runs stage processes with captured output and a wall-clock limit
#[derive(Debug)]
pub struct ProcessRunner {
    runtime: Runtime,
}

impl ProcessRunner {
    /// Create a runner
    ///
    /// # Errors
    ///
    /// Returns an error if the async runtime cannot be built.
    pub fn new() -> anyhow::Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to build process runtime")?;
        Ok(Self { runtime })
    }
}

impl StageRunner for ProcessRunner {
    fn execute(&self, invocation: &Invocation) -> anyhow::Result<ExecutionResult> {
        self.runtime.block_on(run(invocation))
    }
}

async fn run(invocation: &Invocation) -> anyhow::Result<ExecutionResult> {
    if invocation.command.trim().is_empty() {
        anyhow::bail!("stage {} has an empty command", invocation.stage_id);
    }

    let start = Instant::now();
    log::debug!(
        "spawning {} {} (limit {:?})",
        invocation.command,
        invocation.args.join(" "),
        invocation.timeout
    );

    let mut child = Command::new(&invocation.command)
        .args(&invocation.args)
        .current_dir(&invocation.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .with_context(|| format!("failed to spawn '{}'", invocation.command))?;

    // Output is collected as it arrives so a timeout still reports it.
    let mut stdout_pipe = child.stdout.take();
    let mut stderr_pipe = child.stderr.take();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let waited = tokio::time::timeout(invocation.timeout, async {
        let (out, err) = tokio::join!(
            drain(stdout_pipe.as_mut(), &mut stdout),
            drain(stderr_pipe.as_mut(), &mut stderr)
        );
        out?;
        err?;
        child.wait().await
    })
    .await;

    let limit_ms = u64::try_from(invocation.timeout.as_millis()).unwrap_or(u64::MAX);
    let Ok(status) = waited else {
        log::warn!("{} timed out after {limit_ms}ms", invocation.stage_id);
        if let Err(e) = child.kill().await {
            log::debug!("could not kill {}: {e}", invocation.stage_id);
        }
        let mut stderr = String::from_utf8_lossy(&stderr).into_owned();
        if !stderr.is_empty() && !stderr.ends_with('\n') {
            stderr.push('\n');
        }
        stderr.push_str(&format!("killed after {limit_ms}ms"));
        return Ok(ExecutionResult {
            stage_id: invocation.stage_id.clone(),
            exit_code: -1,
            termination: Termination::TimedOut { limit_ms },
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr,
            duration_ms: elapsed_ms(start),
        });
    };
    let status = status.with_context(|| format!("failed waiting for '{}'", invocation.command))?;

    Ok(ExecutionResult {
        stage_id: invocation.stage_id.clone(),
        exit_code: status.code().unwrap_or(-1),
        termination: termination(status),
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        duration_ms: elapsed_ms(start),
    })
}

/// Read a pipe to its end, appending each chunk as soon as it arrives
async fn drain<R>(pipe: Option<&mut R>, buf: &mut Vec<u8>) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
{
    let Some(pipe) = pipe else { return Ok(()) };
    let mut chunk = [0u8; 8192];
    loop {
        let n = pipe.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

fn termination(status: ExitStatus) -> Termination {
    match status.code() {
        Some(code) => Termination::Exited { code },
        None => Termination::Signaled {
            signal: signal_of(status),
        },
    }
}

#[cfg(unix)]
fn signal_of(status: ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
const fn signal_of(_status: ExitStatus) -> Option<i32> {
    None
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
