//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from binary resolution/provisioning.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("ffmpeg not found on PATH and no bundled copy available")]
    FfmpegNotFound,

    #[error("ffprobe not found on PATH and no bundled copy available")]
    FfprobeNotFound,

    #[error("bundled resource missing: {0}")]
    ResourceMissing(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from metadata probing.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to launch ffprobe: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("ffprobe failed: {stderr}")]
    Failed {
        stderr: String,
        exit_code: Option<i32>,
    },

    #[error("unparsable ffprobe output: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("no video stream found in source")]
    NoVideoStream,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the conversion engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to launch ffmpeg: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("ffmpeg exited with non-zero status: {stderr}")]
    Transcode {
        stderr: String,
        exit_code: Option<i32>,
    },

    #[error("transcode cancelled")]
    Cancelled,

    #[error("transcode timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
