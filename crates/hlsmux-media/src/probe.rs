//! FFprobe source metadata.

use serde::{Deserialize, Serialize};
use std::process::Stdio;

use hlsmux_models::SourceReference;

use crate::binaries::BinaryLocation;
use crate::error::ProbeError;
use crate::process::quiet_command;

/// Source metadata extracted before transcoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaMetadata {
    /// Total duration in seconds. 0 means unknown; progress reporting is
    /// disabled for the job but the conversion still runs.
    pub duration: f64,
    /// The selected video stream
    pub video: VideoStream,
}

/// Descriptor of the first video stream in the source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoStream {
    /// Video codec identifier
    pub codec: String,
    /// Width in pixels, when reported
    pub width: Option<u32>,
    /// Height in pixels, when reported
    pub height: Option<u32>,
    /// Frame rate (fps), when reported
    pub frame_rate: Option<f64>,
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    avg_frame_rate: Option<String>,
}

/// Probe a playlist source for duration and stream layout.
///
/// The source may be a remote URL; FFprobe fetches it itself. A missing
/// video stream is a hard failure, an unknown duration is not.
pub async fn probe(
    source: &SourceReference,
    binaries: &BinaryLocation,
) -> Result<MediaMetadata, ProbeError> {
    let output = quiet_command(&binaries.ffprobe)
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(source.as_input_arg())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(ProbeError::Spawn)?;

    if !output.status.success() {
        return Err(ProbeError::Failed {
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
        });
    }

    parse_probe_output(&output.stdout)
}

/// Decode the FFprobe JSON document into [`MediaMetadata`].
fn parse_probe_output(stdout: &[u8]) -> Result<MediaMetadata, ProbeError> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;

    let video_stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type == "video")
        .ok_or(ProbeError::NoVideoStream)?;

    // Absent or unparsable duration degrades to 0 rather than failing.
    let duration = probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|d| d.parse::<f64>().ok())
        .unwrap_or(0.0);

    let frame_rate = video_stream
        .avg_frame_rate
        .as_ref()
        .or(video_stream.r_frame_rate.as_ref())
        .and_then(|r| parse_frame_rate(r));

    Ok(MediaMetadata {
        duration,
        video: VideoStream {
            codec: video_stream.codec_name.clone().unwrap_or_default(),
            width: video_stream.width,
            height: video_stream.height,
            frame_rate,
        },
    })
}

/// Parse a frame rate string (e.g., "30/1" or "29.97").
fn parse_frame_rate(s: &str) -> Option<f64> {
    if let Some((num, den)) = s.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den > 0.0 {
            return Some(num / den);
        }
    }
    s.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"{
        "format": {"duration": "734.567000", "format_name": "hls"},
        "streams": [
            {"codec_type": "audio", "codec_name": "aac"},
            {"codec_type": "video", "codec_name": "h264", "width": 1920,
             "height": 1080, "avg_frame_rate": "30000/1001"}
        ]
    }"#;

    #[test]
    fn test_parse_probe_output() {
        let meta = parse_probe_output(FIXTURE.as_bytes()).unwrap();
        assert!((meta.duration - 734.567).abs() < 0.001);
        assert_eq!(meta.video.codec, "h264");
        assert_eq!(meta.video.width, Some(1920));
        assert!((meta.video.frame_rate.unwrap() - 29.97).abs() < 0.01);
    }

    #[test]
    fn test_missing_duration_degrades_to_zero() {
        let json = r#"{"format": {}, "streams": [{"codec_type": "video"}]}"#;
        let meta = parse_probe_output(json.as_bytes()).unwrap();
        assert_eq!(meta.duration, 0.0);
    }

    #[test]
    fn test_unparsable_duration_degrades_to_zero() {
        let json = r#"{"format": {"duration": "N/A"}, "streams": [{"codec_type": "video"}]}"#;
        let meta = parse_probe_output(json.as_bytes()).unwrap();
        assert_eq!(meta.duration, 0.0);
    }

    #[test]
    fn test_no_video_stream_fails() {
        let json = r#"{"format": {"duration": "10.0"}, "streams": [{"codec_type": "audio"}]}"#;
        let err = parse_probe_output(json.as_bytes()).unwrap_err();
        assert!(matches!(err, ProbeError::NoVideoStream));
    }

    #[test]
    fn test_invalid_json_fails() {
        let err = parse_probe_output(b"not json").unwrap_err();
        assert!(matches!(err, ProbeError::Parse(_)));
    }

    #[test]
    fn test_parse_frame_rate() {
        assert!((parse_frame_rate("30/1").unwrap() - 30.0).abs() < 0.01);
        assert!((parse_frame_rate("30000/1001").unwrap() - 29.97).abs() < 0.01);
        assert!((parse_frame_rate("29.97").unwrap() - 29.97).abs() < 0.01);
        assert!(parse_frame_rate("0/0").is_none());
    }
}
