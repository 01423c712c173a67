//! Cancellable subprocess execution for the external tools

use std::io;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Debug)]
pub(crate) enum ProcessOutcome {
    Exited { status: ExitStatus, stderr: String },
    Cancelled,
}

/// Spawn `cmd`, feed each stdout line to `on_line`, and wait for exit.
///
/// If `cancel` fires first the child is killed and reaped before returning,
/// so nothing is still writing into the work directories afterwards.
pub(crate) async fn run_cancellable<F>(
    cmd: &mut Command,
    cancel: &CancellationToken,
    mut on_line: F,
) -> io::Result<ProcessOutcome>
where
    F: FnMut(&str),
{
    if cancel.is_cancelled() {
        return Ok(ProcessOutcome::Cancelled);
    }

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let stderr_pipe = child.stderr.take();
    let stderr_reader = tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = stderr_pipe {
            let _ = pipe.read_to_end(&mut buf).await;
        }
        String::from_utf8_lossy(&buf).into_owned()
    });

    if let Some(stdout) = child.stdout.take() {
        let mut lines = BufReader::new(stdout).lines();
        loop {
            tokio::select! {
                line = lines.next_line() => match line? {
                    Some(line) => on_line(&line),
                    None => break,
                },
                _ = cancel.cancelled() => {
                    let _ = child.kill().await;
                    stderr_reader.abort();
                    debug!("Child process killed on cancellation");
                    return Ok(ProcessOutcome::Cancelled);
                }
            }
        }
    }

    let status = tokio::select! {
        status = child.wait() => status?,
        _ = cancel.cancelled() => {
            let _ = child.kill().await;
            stderr_reader.abort();
            debug!("Child process killed on cancellation");
            return Ok(ProcessOutcome::Cancelled);
        }
    };

    let stderr = stderr_reader.await.unwrap_or_default();
    Ok(ProcessOutcome::Exited { status, stderr })
}
