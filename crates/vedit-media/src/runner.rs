//! Transcoder process runner.
//!
//! Runs the external transcoder binary with a wall-clock timeout, draining
//! stdout and stderr on their own tasks so a full OS pipe buffer on either
//! stream can never stall the process.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// Default transcode timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Captured output of a completed transcoder run.
#[derive(Debug, Clone, Default)]
pub struct TranscodeOutput {
    /// Captured standard output
    pub stdout: String,
    /// Captured diagnostic output
    pub stderr: String,
}

/// Seam for executing transcoder commands, so orchestration code can be
/// tested without a real FFmpeg binary.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Run the transcoder with the given argument vector.
    async fn execute(&self, args: &[String]) -> MediaResult<TranscodeOutput>;
}

/// Runner for transcoder commands with timeout enforcement.
#[derive(Debug, Clone)]
pub struct TranscodeRunner {
    /// Transcoder binary to launch
    binary: PathBuf,
    /// Wall-clock timeout per run
    timeout: Duration,
}

impl Default for TranscodeRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TranscodeRunner {
    /// Create a runner for the `ffmpeg` binary on PATH.
    pub fn new() -> Self {
        Self {
            binary: PathBuf::from("ffmpeg"),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Use a different binary.
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Set the wall-clock timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve the configured binary, verifying it exists and is
    /// executable. Bare names are searched on PATH.
    pub fn locate_binary(&self) -> MediaResult<PathBuf> {
        which::which(&self.binary).map_err(|_| MediaError::FfmpegNotFound)
    }

    async fn run(&self, args: &[String]) -> MediaResult<TranscodeOutput> {
        let binary = self.locate_binary()?;
        debug!("Running transcoder: {} {}", binary.display(), args.join(" "));

        // kill_on_drop guarantees the child is reaped even if the calling
        // task is cancelled while we are waiting on it.
        let mut child = Command::new(&binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| MediaError::LaunchFailed { source })?;

        let stdout_task = drain_stream(child.stdout.take());
        let stderr_task = drain_stream(child.stderr.take());

        let status = match tokio::time::timeout(self.timeout, child.wait()).await {
            Ok(status) => status?,
            Err(_) => {
                warn!(
                    "Transcoder timed out after {:?}, killing process",
                    self.timeout
                );
                stdout_task.abort();
                stderr_task.abort();
                // kill() sends SIGKILL and waits, so the child is reaped here.
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill timed-out transcoder: {}", e);
                }
                metrics::counter!("vedit_transcode_runs_total", "result" => "timeout")
                    .increment(1);
                return Err(MediaError::Timeout(self.timeout.as_secs()));
            }
        };

        let stdout = stdout_task.await.unwrap_or_default();
        let stderr = stderr_task.await.unwrap_or_default();

        if status.success() {
            metrics::counter!("vedit_transcode_runs_total", "result" => "ok").increment(1);
            Ok(TranscodeOutput { stdout, stderr })
        } else {
            metrics::counter!("vedit_transcode_runs_total", "result" => "failed").increment(1);
            Err(MediaError::transcode_failed(
                status.code(),
                stderr.trim().to_string(),
            ))
        }
    }
}

#[async_trait]
impl Transcoder for TranscodeRunner {
    async fn execute(&self, args: &[String]) -> MediaResult<TranscodeOutput> {
        self.run(args).await
    }
}

/// Drain a child stream to a string on its own task.
fn drain_stream<R>(stream: Option<R>) -> JoinHandle<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut captured = String::new();
        if let Some(stream) = stream {
            let mut lines = BufReader::new(stream).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                captured.push_str(&line);
                captured.push('\n');
            }
        }
        captured
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(timeout: Duration) -> TranscodeRunner {
        TranscodeRunner::new().with_binary("sh").with_timeout(timeout)
    }

    fn args(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    #[tokio::test]
    async fn test_success_captures_both_streams() {
        let runner = sh(Duration::from_secs(5));
        let out = runner
            .execute(&args("echo report; echo diagnostics >&2"))
            .await
            .unwrap();
        assert!(out.stdout.contains("report"));
        assert!(out.stderr.contains("diagnostics"));
    }

    #[tokio::test]
    async fn test_nonzero_exit_reports_code_and_stderr() {
        let runner = sh(Duration::from_secs(5));
        let err = runner
            .execute(&args("echo boom >&2; exit 3"))
            .await
            .unwrap_err();
        match err {
            MediaError::TranscodeFailed { exit_code, stderr } => {
                assert_eq!(exit_code, Some(3));
                assert!(stderr.contains("boom"));
            }
            other => panic!("expected TranscodeFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout_kills_child() {
        let runner = TranscodeRunner::new()
            .with_binary("sleep")
            .with_timeout(Duration::from_millis(200));

        let started = std::time::Instant::now();
        let err = runner.execute(&["30".to_string()]).await.unwrap_err();
        assert!(matches!(err, MediaError::Timeout(_)));
        // The child was killed, not waited out.
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_missing_binary_rejected_before_spawn() {
        let runner = TranscodeRunner::new()
            .with_binary("definitely-not-a-real-transcoder")
            .with_timeout(Duration::from_secs(1));
        let err = runner.execute(&[]).await.unwrap_err();
        assert!(matches!(err, MediaError::FfmpegNotFound));
    }

    #[test]
    fn test_locate_binary_resolves_from_path() {
        let resolved = TranscodeRunner::new().with_binary("sh").locate_binary();
        assert!(resolved.unwrap().is_absolute());
    }

    #[tokio::test]
    async fn test_large_stream_does_not_stall() {
        // Fill well past a pipe buffer on stderr while stdout is also active.
        let runner = sh(Duration::from_secs(10));
        let out = runner
            .execute(&args(
                "i=0; while [ $i -lt 20000 ]; do echo line-$i >&2; i=$((i+1)); done; echo done",
            ))
            .await
            .unwrap();
        assert!(out.stdout.contains("done"));
        assert!(out.stderr.contains("line-19999"));
    }
}
