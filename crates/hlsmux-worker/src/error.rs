//! Worker error types.

use std::path::PathBuf;
use thiserror::Error;

use hlsmux_media::{EngineError, ProbeError, ResolveError};

pub type JobResult<T> = Result<T, JobError>;

/// Fatal job errors. Each one terminates the job with a single failing
/// terminal notification carrying its message.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("source not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("destination unavailable: {path}: {source}")]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("binary resolution failed: {0}")]
    Resolution(#[from] ResolveError),

    #[error("probe failed: {0}")]
    Probe(#[from] ProbeError),

    #[error("transcode failed: {0}")]
    Engine(#[from] EngineError),
}
