//! Bounded external process execution.
//!
//! Every child started by the recovery layer is owned by a [`ProcessGuard`].
//! The guard kills and reaps the child when dropped, so an editor or
//! extractor never outlives the file it was started for, whichever way the
//! caller exits.

use crate::constants::PROCESS_POLL_INTERVAL_MS;
use crate::error::{CapacityError, Result};
use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Captured result of a finished child process
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

/// Owns a running child and guarantees it is terminated
#[derive(Debug)]
pub struct ProcessGuard {
    name: String,
    child: Option<Child>,
}

impl ProcessGuard {
    /// Spawn `command` with piped output
    pub fn spawn(name: impl Into<String>, command: &mut Command) -> Result<Self> {
        let name = name.into();
        let child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| CapacityError::ToolFailed {
                tool: name.clone(),
                reason: format!("failed to start: {}", e),
            })?;

        debug!("Started {} (pid {})", name, child.id());
        Ok(Self {
            name,
            child: Some(child),
        })
    }

    /// Wait for the child to exit, killing it once `timeout` has elapsed
    pub fn wait_with_timeout(mut self, timeout: Duration) -> Result<ToolOutput> {
        let Some(child) = self.child.as_mut() else {
            return Err(CapacityError::ToolFailed {
                tool: self.name.clone(),
                reason: "process already reaped".to_string(),
            });
        };

        let stdout_reader = child.stdout.take().map(drain);
        let stderr_reader = child.stderr.take().map(drain);

        let deadline = Instant::now() + timeout;
        let status = loop {
            match child.try_wait()? {
                Some(status) => break status,
                None if Instant::now() >= deadline => {
                    warn!("{} exceeded {:?}, terminating", self.name, timeout);
                    self.terminate();
                    return Err(CapacityError::ToolFailed {
                        tool: self.name.clone(),
                        reason: format!("timed out after {:?}", timeout),
                    });
                }
                None => thread::sleep(Duration::from_millis(PROCESS_POLL_INTERVAL_MS)),
            }
        };
        self.child = None;

        Ok(ToolOutput {
            status,
            stdout: join_reader(stdout_reader),
            stderr: join_reader(stderr_reader),
        })
    }

    fn terminate(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                debug!("Kill of {} failed: {}", self.name, e);
            }
            if let Err(e) = child.wait() {
                debug!("Reaping {} failed: {}", self.name, e);
            }
            debug!("Released {}", self.name);
        }
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Run a command to completion within `timeout`, requiring a zero exit status
pub fn run_bounded(name: &str, command: &mut Command, timeout: Duration) -> Result<ToolOutput> {
    let output = ProcessGuard::spawn(name, command)?.wait_with_timeout(timeout)?;

    if !output.status.success() {
        return Err(CapacityError::ToolFailed {
            tool: name.to_string(),
            reason: format!(
                "exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        });
    }

    Ok(output)
}

// Pipes are drained on their own threads so a chatty child cannot block on
// a full pipe while we poll for its exit.
fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buffer = Vec::new();
        let _ = pipe.read_to_end(&mut buffer);
        buffer
    })
}

fn join_reader(reader: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}
