//! Stream-copy conversion engine.
//!
//! Launches FFmpeg with copy codecs for both tracks (container repackaging
//! only, no re-encoding), drains its diagnostic stream line by line through
//! the progress parser, and joins the exit status only once the stream has
//! been read to end-of-file.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::binaries::BinaryLocation;
use crate::error::EngineError;
use crate::probe::MediaMetadata;
use crate::process::quiet_command;
use crate::progress::{ProgressParser, ProgressSample};

/// Trailing diagnostic lines retained for failure reports.
const STDERR_TAIL_LINES: usize = 40;

/// Builder for the remux invocation.
#[derive(Debug, Clone)]
pub struct RemuxCommand {
    input: String,
    output: PathBuf,
    overwrite: bool,
}

impl RemuxCommand {
    pub fn new(input: impl Into<String>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.into(),
            output: output.as_ref().to_path_buf(),
            overwrite: true,
        }
    }

    /// Build the argument list. Both tracks are stream-copied; the
    /// destination is overwritten when present.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = vec![
            "-i".to_string(),
            self.input.clone(),
            "-c:v".to_string(),
            "copy".to_string(),
            "-c:a".to_string(),
            "copy".to_string(),
        ];
        if self.overwrite {
            args.push("-y".to_string());
        }
        args.push(self.output.to_string_lossy().to_string());
        args
    }
}

/// Outcome of waiting on the child, before the stream has been drained.
enum WaitOutcome {
    Exited(ExitStatus),
    Cancelled,
    TimedOut(u64),
}

/// Drives one FFmpeg subprocess with progress relaying and optional
/// cancellation/timeout.
pub struct ConversionEngine {
    cancel_rx: Option<watch::Receiver<bool>>,
    timeout_secs: Option<u64>,
}

impl Default for ConversionEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionEngine {
    pub fn new() -> Self {
        Self {
            cancel_rx: None,
            timeout_secs: None,
        }
    }

    /// Set cancellation signal; a `true` observation kills the child.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    /// Set a wall-clock timeout for the whole transcode.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Run the remux to completion.
    ///
    /// `on_progress` receives strictly ascending samples during the run and
    /// a final 100% sample after a clean exit. On non-zero exit the error
    /// carries the captured tail of the diagnostic stream.
    pub async fn run<F>(
        &self,
        cmd: &RemuxCommand,
        binaries: &BinaryLocation,
        metadata: &MediaMetadata,
        on_progress: F,
    ) -> Result<(), EngineError>
    where
        F: Fn(ProgressSample) + Send + Sync + 'static,
    {
        let args = cmd.build_args();
        debug!("running ffmpeg {}", args.join(" "));

        let mut child = quiet_command(&binaries.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(EngineError::Spawn)?;

        let stderr = child.stderr.take().expect("stderr not captured");
        let on_progress = Arc::new(on_progress);

        let reader = tokio::spawn(drain_stderr(
            stderr,
            metadata.duration,
            Arc::clone(&on_progress),
        ));

        let outcome = self.wait_for_exit(&mut child).await?;

        // The diagnostic stream is drained to EOF before the exit status is
        // acted on; a kill above closes the pipe and ends the drain.
        let tail = reader.await.unwrap_or_default();

        let status = match outcome {
            WaitOutcome::Exited(status) => status,
            WaitOutcome::Cancelled => return Err(EngineError::Cancelled),
            WaitOutcome::TimedOut(secs) => return Err(EngineError::Timeout(secs)),
        };

        if status.success() {
            on_progress(ProgressSample {
                percent: 100.0,
                elapsed: metadata.duration,
            });
            Ok(())
        } else {
            Err(EngineError::Transcode {
                stderr: tail.join("\n"),
                exit_code: status.code(),
            })
        }
    }

    async fn wait_for_exit(&self, child: &mut Child) -> Result<WaitOutcome, EngineError> {
        let mut cancel_rx = self.cancel_rx.clone();
        let timeout = self.timeout_secs.map(Duration::from_secs);

        let outcome = {
            let wait = child.wait();
            tokio::pin!(wait);
            tokio::select! {
                status = &mut wait => WaitOutcome::Exited(status?),
                _ = cancelled(&mut cancel_rx) => WaitOutcome::Cancelled,
                _ = tokio::time::sleep(timeout.unwrap_or_default()), if timeout.is_some() => {
                    WaitOutcome::TimedOut(self.timeout_secs.unwrap_or_default())
                }
            }
        };

        match &outcome {
            WaitOutcome::Cancelled => {
                warn!("transcode cancelled, killing ffmpeg");
                let _ = child.kill().await;
            }
            WaitOutcome::TimedOut(secs) => {
                warn!("ffmpeg timed out after {} seconds, killing process", secs);
                let _ = child.kill().await;
            }
            WaitOutcome::Exited(_) => {}
        }

        Ok(outcome)
    }
}

/// Resolves when cancellation is requested; pends forever otherwise.
async fn cancelled(rx: &mut Option<watch::Receiver<bool>>) {
    match rx {
        Some(rx) => {
            if *rx.borrow() {
                return;
            }
            while rx.changed().await.is_ok() {
                if *rx.borrow() {
                    return;
                }
            }
            // Sender dropped without cancelling.
            std::future::pending::<()>().await
        }
        None => std::future::pending::<()>().await,
    }
}

/// Read the diagnostic stream to EOF, feeding each line to the parser.
///
/// FFmpeg stats lines are `\r`-separated; reads are byte-wise with lossy
/// UTF-8 decoding so malformed bytes can never abort the job. Returns the
/// retained tail of lines for failure reporting.
async fn drain_stderr<F>(
    stderr: ChildStderr,
    duration: f64,
    on_progress: Arc<F>,
) -> Vec<String>
where
    F: Fn(ProgressSample) + Send + Sync + 'static,
{
    let mut parser = ProgressParser::new(duration);
    let mut reader = BufReader::new(stderr);
    let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);
    let mut buf = Vec::new();

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }

        let text = String::from_utf8_lossy(&buf);
        for piece in text.split('\r') {
            let line = piece.trim();
            if line.is_empty() {
                continue;
            }
            if let Some(sample) = parser.feed(line) {
                on_progress(sample);
            }
            if tail.len() == STDERR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line.to_string());
        }
    }

    tail.into()
}
