// Process handoff between the prompt instance and a reminder instance
//
// Relaunch handshake: the old process spawns a reminder instance with
// `--handoff-ready <file>`, the new instance writes its PID to that file once
// its window is up, and the old process waits for that before exiting.
//
// Instance replacement: the reminder on screen records its PID so a newer
// reminder can retire it.

use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::task_store::atomic_write;

/// How long the old process waits for the new one to confirm
pub const READY_TIMEOUT: Duration = Duration::from_secs(10);

const INITIAL_DELAY_MS: u64 = 50;
const MAX_DELAY_MS: u64 = 1_000;

#[derive(Debug, thiserror::Error)]
pub enum HandoffError {
    #[error("failed to locate current executable: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("failed to spawn reminder instance: {0}")]
    Spawn(#[source] std::io::Error),
    #[error(transparent)]
    NotReady(#[from] WaitError),
}

/// Error returned when waiting for the ready file times out.
#[derive(Debug)]
pub struct WaitError {
    path: PathBuf,
    attempts: u32,
    waited: Duration,
    last_error: Option<String>,
}

impl fmt::Display for WaitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Timed out after {} attempts over {:?} waiting for {}. Last error: {}",
            self.attempts,
            self.waited,
            self.path.display(),
            self.last_error
                .as_deref()
                .unwrap_or("file not created or unreadable")
        )
    }
}

impl std::error::Error for WaitError {}

fn parse_pid(content: &str) -> Option<u32> {
    content.trim().parse().ok().filter(|pid| *pid != 0)
}

/// Poll `path` until it holds a PID, backing off exponentially up to 1s.
pub fn wait_for_ready(path: &Path, timeout: Duration) -> Result<u32, WaitError> {
    let start = Instant::now();
    let mut delay = Duration::from_millis(INITIAL_DELAY_MS);
    let mut attempts = 0;
    let mut last_error: Option<String> = None;

    loop {
        attempts += 1;
        match fs::read_to_string(path) {
            Ok(content) => {
                if let Some(pid) = parse_pid(&content) {
                    return Ok(pid);
                }
            }
            Err(err) => {
                if err.kind() != ErrorKind::NotFound {
                    last_error = Some(err.to_string());
                }
            }
        }

        let remaining = timeout.saturating_sub(start.elapsed());
        if remaining.is_zero() {
            break;
        }

        thread::sleep(delay.min(remaining));
        delay = (delay * 2).min(Duration::from_millis(MAX_DELAY_MS));
    }

    Err(WaitError {
        path: path.to_path_buf(),
        attempts,
        waited: start.elapsed(),
        last_error,
    })
}

/// Called by the new instance once its reminder is showing
pub fn confirm_ready(path: &Path) -> anyhow::Result<()> {
    atomic_write(path, &std::process::id().to_string())?;
    tracing::info!(path = %path.display(), "Confirmed handoff");
    Ok(())
}

/// Spawn a reminder instance of this executable and wait for it to confirm.
///
/// Returns the PID of the new instance. The ready file lives in `data_dir`
/// and is removed afterwards whatever the outcome.
pub fn relaunch_into_reminder(data_dir: &Path, timeout: Duration) -> Result<u32, HandoffError> {
    let exe = std::env::current_exe().map_err(HandoffError::CurrentExe)?;
    let ready_file = data_dir.join(format!("handoff-{}.ready", std::process::id()));
    let _ = fs::remove_file(&ready_file);

    let child = Command::new(&exe)
        .arg("--handoff-ready")
        .arg(&ready_file)
        .stdin(Stdio::null())
        .spawn()
        .map_err(HandoffError::Spawn)?;
    tracing::info!(pid = child.id(), exe = %exe.display(), "Spawned reminder instance");

    let result = wait_for_ready(&ready_file, timeout);
    let _ = fs::remove_file(&ready_file);
    Ok(result?)
}

/// Tracks which process currently shows the reminder
#[derive(Debug, Clone)]
pub struct InstanceFile {
    path: PathBuf,
}

impl InstanceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn read_pid(&self) -> Option<u32> {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|s| parse_pid(&s))
    }

    /// Retire any other running reminder, then record this process
    pub fn claim(&self) -> anyhow::Result<()> {
        let own = std::process::id();
        if let Some(previous) = self.read_pid().filter(|pid| *pid != own) {
            if process_is_running(previous) {
                tracing::info!(pid = previous, "Terminating previous reminder instance");
                terminate(previous);
            }
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        atomic_write(&self.path, &own.to_string())?;
        Ok(())
    }

    /// Remove the PID file if it still belongs to this process
    pub fn release(&self) {
        if self.read_pid() == Some(std::process::id()) {
            if let Err(e) = fs::remove_file(&self.path) {
                tracing::warn!(error = %e, "Failed to remove reminder PID file");
            }
        }
    }
}

#[cfg(unix)]
fn process_is_running(pid: u32) -> bool {
    unsafe { libc::kill(pid as i32, 0) == 0 }
}

#[cfg(not(unix))]
fn process_is_running(_pid: u32) -> bool {
    false
}

#[cfg(unix)]
fn terminate(pid: u32) {
    unsafe {
        libc::kill(pid as i32, libc::SIGTERM);
    }
}

#[cfg(not(unix))]
fn terminate(_pid: u32) {}
