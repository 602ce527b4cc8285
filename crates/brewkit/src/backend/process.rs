//! Runner that executes real `brew` processes.

use crate::backend::Runner;
use crate::command::Invocation;
use crate::error::{Error, Result};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Runner that spawns the invocation and waits for it.
///
/// stdin, stdout and stderr are inherited so brew output shows in real time.
#[derive(Debug, Default, Clone)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    /// Create a runner without a timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill invocations that run longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Configured timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn spawn(invocation: &Invocation) -> Result<Child> {
        Command::new(invocation.program())
            .args(invocation.args())
            .current_dir(invocation.working_dir())
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| Error::Spawn {
                invocation: invocation.to_string(),
                source,
            })
    }

    fn wait(&self, child: &mut Child, invocation: &Invocation) -> Result<ExitStatus> {
        let Some(limit) = self.timeout else {
            return Ok(child.wait()?);
        };

        let started = Instant::now();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if started.elapsed() >= limit {
                log::warn!("{invocation} exceeded {}s, killing it", limit.as_secs());
                child.kill()?;
                child.wait()?;
                return Err(Error::TimedOut {
                    invocation: invocation.to_string(),
                    after: limit,
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Runner for ProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        log::debug!(
            "Running {} {:?} in {}",
            invocation.program().display(),
            invocation.args(),
            invocation.working_dir().display()
        );

        let mut child = Self::spawn(invocation)?;
        let status = self.wait(&mut child, invocation)?;

        if !status.success() {
            return Err(Error::ExitStatus {
                invocation: invocation.to_string(),
                code: status.code(),
            });
        }

        Ok(())
    }
}
