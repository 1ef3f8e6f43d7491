use crate::error::PipelineError;
use anyhow::{Context, Result, bail};
use log::{debug, warn};
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const STDERR_TAIL_LINES: usize = 20;

#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs `command` to completion, killing it as soon as `shutdown_signal` is set.
///
/// A non-zero exit is an error carrying the tail of stderr. A kill caused by the
/// signal surfaces as [`PipelineError::Cancelled`] inside the returned error.
pub fn run_command(mut command: Command, shutdown_signal: &AtomicBool) -> Result<CommandOutput> {
    let program = command.get_program().to_string_lossy().into_owned();
    debug!("Running {command:?}");

    if shutdown_signal.load(Ordering::SeqCst) {
        return Err(PipelineError::Cancelled.into());
    }

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("cannot start {program}"))?;

    let stdout_reader = drain(child.stdout.take());
    let stderr_reader = drain(child.stderr.take());

    let status = loop {
        if shutdown_signal.load(Ordering::SeqCst) {
            warn!("Interrupt received, killing {program} [{}]", child.id());
            terminate(&mut child);
            let _ = stdout_reader.join();
            let _ = stderr_reader.join();
            return Err(PipelineError::Cancelled.into());
        }

        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                terminate(&mut child);
                return Err(e).with_context(|| format!("cannot wait for {program}"));
            }
        }
    };

    let output = CommandOutput {
        stdout: stdout_reader.join().unwrap_or_default(),
        stderr: stderr_reader.join().unwrap_or_default(),
    };

    if !status.success() {
        bail!(
            "{program} exited with {status}: {}",
            stderr_tail(&output.stderr)
        );
    }

    Ok(output)
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buffer);
        }
        String::from_utf8_lossy(&buffer).into_owned()
    })
}

fn terminate(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.trim().lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
