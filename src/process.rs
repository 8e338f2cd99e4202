//! External process capability (git, formatter).
//!
//! Gates receive a `&dyn CommandRunner` so tests can script collaborator
//! results without spawning anything.

use std::io::{self, Read};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Timeout for git operations (branch detection)
pub const GIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout for formatter/linter operations
pub const FORMAT_TIMEOUT: Duration = Duration::from_secs(10);

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code, `None` if terminated by a signal
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.status == Some(0)
    }
}

/// Failure to obtain a process result at all.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("not found")]
    NotFound,
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
    #[error("{0}")]
    Io(#[from] io::Error),
}

/// Runs an external program to completion (or timeout).
pub trait CommandRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<ProcessOutput, ProcessError>;
}

/// Spawns real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<ProcessOutput, ProcessError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => ProcessError::NotFound,
                _ => ProcessError::Io(e),
            })?;

        // Drain pipes off-thread so a chatty child can't fill the pipe and stall
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let deadline = Instant::now() + timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ProcessError::TimedOut(timeout));
            }
            thread::sleep(POLL_INTERVAL);
        };

        Ok(ProcessOutput {
            status: status.code(),
            stdout: stdout.join().unwrap_or_default(),
            stderr: stderr.join().unwrap_or_default(),
        })
    }
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_not_found() {
        let result = SystemRunner.run(
            "dld-hooks-definitely-not-a-real-binary",
            &[],
            Duration::from_secs(1),
        );
        assert!(matches!(result, Err(ProcessError::NotFound)));
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_stdout_and_status() {
        let out = SystemRunner
            .run("sh", &["-c", "echo hello; exit 3"], Duration::from_secs(5))
            .unwrap();
        assert_eq!(out.status, Some(3));
        assert_eq!(out.stdout.trim(), "hello");
        assert!(!out.success());
    }

    #[cfg(unix)]
    #[test]
    fn test_times_out() {
        let result = SystemRunner.run("sleep", &["5"], Duration::from_millis(100));
        assert!(matches!(result, Err(ProcessError::TimedOut(_))));
    }
}
