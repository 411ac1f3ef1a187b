//! Conversion job state machine.
//!
//! A job moves strictly forward through
//! `Idle → Validating → Probing → Transcoding → {Succeeded, Failed}` on a
//! dedicated worker task, reporting to the caller through a bounded event
//! channel: zero or more progress/status events, then exactly one terminal
//! event — even on the earliest possible failure.

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

use hlsmux_media::{fs_utils, probe, BinaryResolver, ConversionEngine, RemuxCommand};
use hlsmux_models::{
    ConversionRequest, ConversionResult, JobEvent, JobId, JobState, SourceReference,
};

use crate::config::WorkerConfig;
use crate::error::{JobError, JobResult};
use crate::logging::JobLogger;

/// Handle to a running conversion job.
pub struct JobHandle {
    pub id: JobId,
    events: mpsc::Receiver<JobEvent>,
    cancel_tx: watch::Sender<bool>,
    join: JoinHandle<JobState>,
}

impl JobHandle {
    /// Receive the next event. Returns `None` once the channel is drained
    /// after the terminal event.
    pub async fn recv(&mut self) -> Option<JobEvent> {
        self.events.recv().await
    }

    /// Request teardown of the in-flight transcode.
    pub fn cancel(&self) {
        let _ = self.cancel_tx.send(true);
    }

    /// Wait for the worker task to finish; returns the terminal state.
    pub async fn join(self) -> JobState {
        self.join.await.unwrap_or(JobState::Failed)
    }
}

/// A single conversion job.
///
/// One instance processes exactly one request: `submit` consumes the job,
/// so overlapping submissions on the same instance cannot be expressed.
/// Retrying means building a fresh job with a fresh request.
pub struct ConversionJob {
    id: JobId,
    config: WorkerConfig,
    state: JobState,
}

impl ConversionJob {
    pub fn new(config: WorkerConfig) -> Self {
        Self {
            id: JobId::new(),
            config,
            state: JobState::Idle,
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    /// Accept the request and run it on a dedicated worker task.
    pub fn submit(self, request: ConversionRequest) -> JobHandle {
        let (events_tx, events_rx) = mpsc::channel(self.config.event_buffer);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let id = self.id.clone();

        let join = tokio::spawn(self.run(request, events_tx, cancel_rx));

        JobHandle {
            id,
            events: events_rx,
            cancel_tx,
            join,
        }
    }

    async fn run(
        mut self,
        request: ConversionRequest,
        events: mpsc::Sender<JobEvent>,
        cancel_rx: watch::Receiver<bool>,
    ) -> JobState {
        let logger = JobLogger::new(&self.id);
        logger.log_start(&format!(
            "{} -> {}",
            request.source,
            request.destination.display()
        ));

        let result = match self.drive(&request, &events, &logger, cancel_rx).await {
            Ok(message) => {
                logger.log_complete(&message);
                ConversionResult::ok(message)
            }
            Err(e) => {
                logger.log_failure(&e.to_string());
                ConversionResult::failed(e.to_string())
            }
        };

        self.state = if result.success {
            JobState::Succeeded
        } else {
            JobState::Failed
        };

        // Exactly one terminal notification, in every path.
        let _ = events.send(JobEvent::completed(&result)).await;
        self.state
    }

    async fn drive(
        &mut self,
        request: &ConversionRequest,
        events: &mpsc::Sender<JobEvent>,
        logger: &JobLogger,
        cancel_rx: watch::Receiver<bool>,
    ) -> JobResult<String> {
        self.transition(JobState::Validating, "validating request", events)
            .await;
        validate(request).await?;

        let binaries = BinaryResolver::new(self.config.resolve_mode.clone())
            .resolve()
            .await?;

        self.transition(JobState::Probing, "probing source metadata", events)
            .await;
        let metadata = probe(&request.source, &binaries).await?;
        if metadata.duration <= 0.0 {
            logger.log_warning("source duration unknown, progress reporting disabled");
            let _ = events
                .send(JobEvent::status("duration unknown, progress unavailable"))
                .await;
        }

        self.transition(JobState::Transcoding, "transcode started", events)
            .await;
        let cmd = RemuxCommand::new(request.source.as_input_arg(), &request.destination);
        let mut engine = ConversionEngine::new().with_cancel(cancel_rx);
        if let Some(timeout) = self.config.transcode_timeout {
            engine = engine.with_timeout(timeout.as_secs());
        }

        let progress_tx = events.clone();
        let progress_logger = logger.clone();
        engine
            .run(&cmd, &binaries, &metadata, move |sample| {
                progress_logger.log_progress(sample.percent);
                // A full buffer drops the sample; later samples supersede it.
                if let Err(e) = progress_tx.try_send(JobEvent::Progress {
                    percent: sample.percent,
                }) {
                    debug!("progress event dropped: {}", e);
                }
            })
            .await?;

        Ok(format!(
            "converted {} to {}",
            request.source,
            request.destination.display()
        ))
    }

    async fn transition(
        &mut self,
        next: JobState,
        message: &str,
        events: &mpsc::Sender<JobEvent>,
    ) {
        debug!(job_id = %self.id, from = %self.state, to = %next, "state transition");
        self.state = next;
        let _ = events.send(JobEvent::status(message)).await;
    }
}

/// Check the request before any subprocess is spawned.
async fn validate(request: &ConversionRequest) -> JobResult<()> {
    if let SourceReference::Path(path) = &request.source {
        if !path.exists() {
            return Err(JobError::SourceNotFound(path.clone()));
        }
    }

    fs_utils::ensure_parent_dir(&request.destination)
        .await
        .map_err(|e| JobError::Destination {
            path: request.destination.clone(),
            source: e,
        })?;

    Ok(())
}
