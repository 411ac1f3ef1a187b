//! Conversion request and terminal result.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::source::SourceReference;

/// A request to convert one playlist source into one output container.
///
/// Immutable once submitted. Progress and status delivery is handled by the
/// job's event channel, not by the request itself.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConversionRequest {
    /// Playlist URL or local manifest path
    pub source: SourceReference,
    /// Output container path. The parent directory must exist or be
    /// creatable before the job starts.
    pub destination: PathBuf,
}

impl ConversionRequest {
    pub fn new(source: SourceReference, destination: impl Into<PathBuf>) -> Self {
        Self {
            source,
            destination: destination.into(),
        }
    }
}

/// Terminal outcome of a conversion job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ConversionResult {
    /// Whether the conversion completed successfully
    pub success: bool,
    /// Human-readable outcome. On failure this carries the captured
    /// diagnostic text from the subprocess.
    pub message: String,
}

impl ConversionResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
