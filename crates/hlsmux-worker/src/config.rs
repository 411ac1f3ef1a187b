//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use hlsmux_media::ResolveMode;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// How FFmpeg/FFprobe binaries are located
    pub resolve_mode: ResolveMode,
    /// Optional wall-clock limit for one transcode
    pub transcode_timeout: Option<Duration>,
    /// Capacity of the job event channel
    pub event_buffer: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            resolve_mode: ResolveMode::development(PathBuf::from(".")),
            transcode_timeout: None,
            event_buffer: 64,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    ///
    /// `HLSMUX_RESOURCE_DIR` selects packaged mode; otherwise development
    /// mode rooted at `HLSMUX_WORK_DIR` (default: the current directory).
    pub fn from_env() -> Self {
        let resolve_mode = match std::env::var("HLSMUX_RESOURCE_DIR") {
            Ok(dir) => ResolveMode::packaged(PathBuf::from(dir)),
            Err(_) => {
                let work_dir =
                    std::env::var("HLSMUX_WORK_DIR").unwrap_or_else(|_| ".".to_string());
                ResolveMode::development(PathBuf::from(work_dir))
            }
        };

        Self {
            resolve_mode,
            transcode_timeout: std::env::var("HLSMUX_TRANSCODE_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs),
            event_buffer: std::env::var("HLSMUX_EVENT_BUFFER")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(64),
        }
    }
}
