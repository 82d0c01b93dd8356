//! Subprocess execution for the solver
//!
//! `ProcessRunner` is the seam between the adapter and the operating system.
//! The production runner is `TokioRunner`; tests substitute fakes that write
//! plan files and return canned outcomes.

use async_trait::async_trait;
use std::io::Write;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::command::CommandLine;
use crate::error::FmapError;

/// Caller-supplied sink receiving solver output as it is produced
///
/// Writes happen on the task supervising the solver, so a sink that blocks
/// also delays the deadline. Pass something that buffers or drains quickly;
/// a sink that returns an error is dropped and output is only captured.
pub type OutputSink<'a> = &'a mut (dyn Write + Send);

/// What the solver process did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    /// The deadline passed before the process finished
    pub timed_out: bool,

    /// Captured standard output
    pub stdout: String,

    /// Captured standard error
    pub stderr: String,

    /// Exit code; `None` when killed by a signal or still running
    pub exit_code: Option<i32>,
}

impl ExecOutcome {
    pub fn exited(code: i32) -> Self {
        Self {
            exit_code: Some(code),
            ..Self::default()
        }
    }

    pub fn timed_out() -> Self {
        Self {
            timed_out: true,
            ..Self::default()
        }
    }

    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    pub fn with_stderr(mut self, stderr: impl Into<String>) -> Self {
        self.stderr = stderr.into();
        self
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Launches one command and supervises it until exit or timeout
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run `command` in `cwd`
    ///
    /// Without a sink all output is buffered. With a sink, stdout and stderr
    /// chunks are forwarded to it as they arrive and also captured; the same
    /// timeout applies either way. Launch
    /// failures are errors; everything the process itself does is reported
    /// through the outcome.
    async fn run(
        &self,
        command: &CommandLine,
        cwd: &Path,
        timeout: Option<Duration>,
        sink: Option<OutputSink<'_>>,
    ) -> Result<ExecOutcome, FmapError>;
}

/// Runs the solver as a tokio child process
#[derive(Debug, Clone)]
pub struct TokioRunner {
    /// Terminate the child once the timeout fires
    pub kill_on_timeout: bool,

    /// Time between SIGTERM and SIGKILL
    pub kill_grace: Duration,
}

impl Default for TokioRunner {
    fn default() -> Self {
        Self {
            kill_on_timeout: true,
            kill_grace: Duration::from_millis(2000),
        }
    }
}

impl TokioRunner {
    pub fn new(kill_on_timeout: bool, kill_grace: Duration) -> Self {
        Self {
            kill_on_timeout,
            kill_grace,
        }
    }

    fn spawn(&self, command: &CommandLine, cwd: &Path) -> Result<Child, FmapError> {
        debug!(%command, cwd = %cwd.display(), "TokioRunner::spawn: called");
        Command::new(&command.program)
            .args(&command.args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| FmapError::Spawn {
                program: command.program.clone(),
                source,
            })
    }

    /// Stop a child that outlived its deadline
    async fn terminate(&self, child: &mut Child) -> Option<ExitStatus> {
        if !self.kill_on_timeout {
            warn!(pid = ?child.id(), "Solver timed out, leaving it running");
            return None;
        }

        #[cfg(unix)]
        {
            use nix::sys::signal::{Signal, kill};
            use nix::unistd::Pid;

            if let Some(pid) = child.id() {
                debug!(pid, "TokioRunner::terminate: sending SIGTERM");
                if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_ok() {
                    if let Ok(Ok(status)) = tokio::time::timeout(self.kill_grace, child.wait()).await {
                        debug!(pid, ?status, "TokioRunner::terminate: exited after SIGTERM");
                        return Some(status);
                    }
                }
            }
        }

        warn!(pid = ?child.id(), "Solver did not stop gracefully, killing it");
        if let Err(e) = child.kill().await {
            warn!(error = %e, "Failed to kill solver");
            return None;
        }
        child.wait().await.ok()
    }
}

#[async_trait]
impl ProcessRunner for TokioRunner {
    async fn run(
        &self,
        command: &CommandLine,
        cwd: &Path,
        timeout: Option<Duration>,
        mut sink: Option<OutputSink<'_>>,
    ) -> Result<ExecOutcome, FmapError> {
        debug!(?timeout, streaming = sink.is_some(), "TokioRunner::run: called");
        let mut child = self.spawn(command, cwd)?;
        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();

        let deadline = timeout.map(|t| Instant::now() + t);
        let expired = async move {
            match deadline {
                Some(d) => tokio::time::sleep_until(d).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(expired);

        let mut out = Vec::new();
        let mut err = Vec::new();
        let mut out_buf = [0u8; 4096];
        let mut err_buf = [0u8; 4096];
        let mut status: Option<ExitStatus> = None;
        let mut timed_out = false;

        // Read both pipes and reap the child until all three are done or the
        // deadline passes, whichever comes first
        while stdout.is_some() || stderr.is_some() || status.is_none() {
            tokio::select! {
                n = read_chunk(&mut stdout, &mut out_buf), if stdout.is_some() => match n {
                    Ok(0) | Err(_) => stdout = None,
                    Ok(n) => {
                        forward(&mut sink, &out_buf[..n]);
                        out.extend_from_slice(&out_buf[..n]);
                    }
                },
                n = read_chunk(&mut stderr, &mut err_buf), if stderr.is_some() => match n {
                    Ok(0) | Err(_) => stderr = None,
                    Ok(n) => {
                        forward(&mut sink, &err_buf[..n]);
                        err.extend_from_slice(&err_buf[..n]);
                    }
                },
                res = child.wait(), if status.is_none() => {
                    let exited = res?;
                    debug!(?exited, "TokioRunner::run: child exited");
                    status = Some(exited);
                }
                _ = &mut expired => {
                    info!(?timeout, "Solver timed out");
                    timed_out = true;
                    break;
                }
            }
        }

        if timed_out && status.is_none() {
            status = self.terminate(&mut child).await;
        }

        let outcome = ExecOutcome {
            timed_out,
            stdout: String::from_utf8_lossy(&out).into_owned(),
            stderr: String::from_utf8_lossy(&err).into_owned(),
            exit_code: status.and_then(|s| s.code()),
        };
        debug!(
            timed_out,
            exit_code = ?outcome.exit_code,
            stdout_len = outcome.stdout.len(),
            stderr_len = outcome.stderr.len(),
            "TokioRunner::run: done"
        );
        Ok(outcome)
    }
}

async fn read_chunk<R: AsyncRead + Unpin>(pipe: &mut Option<R>, buf: &mut [u8]) -> std::io::Result<usize> {
    match pipe {
        Some(p) => p.read(buf).await,
        None => std::future::pending().await,
    }
}

fn forward(sink: &mut Option<OutputSink<'_>>, chunk: &[u8]) {
    if let Some(s) = sink.as_mut() {
        let res = s.write_all(chunk).and_then(|_| s.flush());
        if let Err(e) = res {
            warn!(error = %e, "Output sink failed, no longer streaming");
            *sink = None;
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sh(script: &str) -> CommandLine {
        CommandLine::new("sh").arg("-c").arg(script)
    }

    #[tokio::test]
    async fn test_run_captures_output_and_exit_code() {
        let temp = tempdir().unwrap();
        let outcome = TokioRunner::default()
            .run(&sh("echo planning; echo oops >&2; exit 3"), temp.path(), None, None)
            .await
            .unwrap();

        assert!(!outcome.timed_out);
        assert_eq!(outcome.exit_code, Some(3));
        assert_eq!(outcome.stdout, "planning\n");
        assert_eq!(outcome.stderr, "oops\n");
    }

    #[tokio::test]
    async fn test_run_uses_working_directory() {
        let temp = tempdir().unwrap();
        let outcome = TokioRunner::default()
            .run(&sh("echo done > plan.txt"), temp.path(), Some(Duration::from_secs(10)), None)
            .await
            .unwrap();

        assert!(outcome.succeeded());
        assert!(temp.path().join("plan.txt").is_file());
    }

    #[tokio::test]
    async fn test_run_streams_to_sink() {
        let temp = tempdir().unwrap();
        let mut sink: Vec<u8> = Vec::new();
        let outcome = TokioRunner::default()
            .run(
                &sh("echo one; echo two >&2; echo three"),
                temp.path(),
                Some(Duration::from_secs(10)),
                Some(&mut sink),
            )
            .await
            .unwrap();

        let streamed = String::from_utf8(sink).unwrap();
        assert!(streamed.contains("one"));
        assert!(streamed.contains("two"));
        assert!(streamed.contains("three"));
        assert_eq!(outcome.stdout, "one\nthree\n");
        assert_eq!(outcome.stderr, "two\n");
    }

    #[tokio::test]
    async fn test_run_times_out_and_kills() {
        let temp = tempdir().unwrap();
        let runner = TokioRunner::new(true, Duration::from_millis(200));
        let started = std::time::Instant::now();

        let outcome = runner
            .run(&CommandLine::new("sleep").arg("30"), temp.path(), Some(Duration::from_millis(100)), None)
            .await
            .unwrap();

        assert!(outcome.timed_out);
        assert_ne!(outcome.exit_code, Some(0));
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_run_streams_then_times_out() {
        let temp = tempdir().unwrap();
        let mut sink: Vec<u8> = Vec::new();
        let started = std::time::Instant::now();

        let outcome = TokioRunner::new(true, Duration::from_millis(200))
            .run(
                &sh("echo started; exec sleep 30"),
                temp.path(),
                Some(Duration::from_millis(300)),
                Some(&mut sink),
            )
            .await
            .unwrap();

        assert!(outcome.timed_out);
        assert_eq!(outcome.stdout, "started\n");
        assert_eq!(String::from_utf8(sink).unwrap(), "started\n");
        assert!(started.elapsed() < Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_run_times_out_without_kill_leaves_child_running() {
        use crate::engine::result::PlanGenerationStatus;
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        let temp = tempdir().unwrap();
        let runner = TokioRunner::new(false, Duration::from_millis(100));

        let outcome = runner
            .run(
                &sh("echo $$ > pid; exec sleep 5"),
                temp.path(),
                Some(Duration::from_millis(300)),
                None,
            )
            .await
            .unwrap();

        let pid: i32 = std::fs::read_to_string(temp.path().join("pid"))
            .unwrap()
            .trim()
            .parse()
            .unwrap();
        let pid = Pid::from_raw(pid);
        let alive = kill(pid, None::<Signal>).is_ok();
        let _ = kill(pid, Signal::SIGKILL);

        assert!(outcome.timed_out);
        assert_eq!(outcome.exit_code, None);
        assert_eq!(PlanGenerationStatus::classify(&outcome, false), PlanGenerationStatus::Timeout);
        assert!(alive);
    }

    /// Sink that rejects every write
    struct ClosedSink;

    impl Write for ClosedSink {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_run_keeps_capturing_after_sink_fails() {
        let temp = tempdir().unwrap();
        let mut sink = ClosedSink;

        let outcome = TokioRunner::default()
            .run(
                &sh("echo one; echo two"),
                temp.path(),
                Some(Duration::from_secs(10)),
                Some(&mut sink),
            )
            .await
            .unwrap();

        assert!(outcome.succeeded());
        assert_eq!(outcome.stdout, "one\ntwo\n");
    }

    #[tokio::test]
    async fn test_run_missing_program_is_spawn_error() {
        let temp = tempdir().unwrap();
        let err = TokioRunner::default()
            .run(&CommandLine::new("fmap-no-such-binary"), temp.path(), None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, FmapError::Spawn { ref program, .. } if program == "fmap-no-such-binary"));
    }
}
