//! Structured job logging utilities.

use tracing::{debug, error, info, warn};

use hlsmux_models::JobId;

/// Job logger for consistent, job-scoped log lines.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
}

impl JobLogger {
    pub fn new(job_id: &JobId) -> Self {
        Self {
            job_id: job_id.to_string(),
        }
    }

    /// Log the start of a conversion.
    pub fn log_start(&self, message: &str) {
        info!(job_id = %self.job_id, "Job started: {}", message);
    }

    /// Log a progress observation.
    pub fn log_progress(&self, percent: f64) {
        debug!(job_id = %self.job_id, "Job progress: {:.1}%", percent);
    }

    /// Log a non-fatal condition.
    pub fn log_warning(&self, message: &str) {
        warn!(job_id = %self.job_id, "Job warning: {}", message);
    }

    /// Log successful completion.
    pub fn log_complete(&self, message: &str) {
        info!(job_id = %self.job_id, "Job completed: {}", message);
    }

    /// Log terminal failure.
    pub fn log_failure(&self, message: &str) {
        error!(job_id = %self.job_id, "Job failed: {}", message);
    }
}
