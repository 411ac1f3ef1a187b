//! End-to-end conversion job tests against stub ffmpeg/ffprobe scripts.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::time::Duration;

use hlsmux_media::ResolveMode;
use hlsmux_models::{ConversionRequest, JobEvent, JobState, SourceReference};
use hlsmux_worker::{ConversionJob, WorkerConfig};

const PROBE_JSON: &str = r#"{"format": {"duration": "10.000000"}, "streams": [{"codec_type": "video", "codec_name": "h264", "width": 1280, "height": 720}]}"#;

const PROBE_JSON_NO_DURATION: &str =
    r#"{"format": {}, "streams": [{"codec_type": "video", "codec_name": "h264"}]}"#;

const PROBE_JSON_AUDIO_ONLY: &str =
    r#"{"format": {"duration": "10.0"}, "streams": [{"codec_type": "audio", "codec_name": "aac"}]}"#;

const FFMPEG_OK: &str = concat!(
    "#!/bin/sh\n",
    "printf 'frame=1 time=00:00:02.50 speed=5x\\n' >&2\n",
    "printf 'frame=2 time=00:00:05.00 speed=5x\\n' >&2\n",
    "printf 'frame=3 time=00:00:09.00 speed=5x\\n' >&2\n",
    "exit 0\n",
);

const FFMPEG_FAIL: &str = concat!(
    "#!/bin/sh\n",
    "printf 'frame=1 time=00:00:02.50 speed=5x\\n' >&2\n",
    "printf 'Invalid data found when processing input\\n' >&2\n",
    "exit 1\n",
);

fn write_script(dir: &Path, name: &str, body: &str) {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
}

/// Lay out a development-mode working directory with stub binaries and a
/// dummy playlist, returning (config, request).
fn stub_environment(
    work_dir: &Path,
    probe_json: &str,
    ffmpeg_body: &str,
) -> (WorkerConfig, ConversionRequest) {
    let bin_dir = work_dir.join("ffmpeg");
    std::fs::create_dir_all(&bin_dir).unwrap();
    write_script(
        &bin_dir,
        "ffprobe",
        &format!("#!/bin/sh\ncat <<'JSON'\n{}\nJSON\n", probe_json),
    );
    write_script(&bin_dir, "ffmpeg", ffmpeg_body);

    let playlist = work_dir.join("show.m3u8");
    std::fs::write(&playlist, "#EXTM3U\n").unwrap();

    let config = WorkerConfig {
        resolve_mode: ResolveMode::development(work_dir.to_path_buf()),
        transcode_timeout: Some(Duration::from_secs(30)),
        event_buffer: 64,
    };
    let request = ConversionRequest::new(
        SourceReference::parse(playlist.to_str().unwrap()),
        work_dir.join("out/show.mp4"),
    );
    (config, request)
}

async fn run_to_completion(
    config: WorkerConfig,
    request: ConversionRequest,
) -> (Vec<JobEvent>, JobState) {
    let mut handle = ConversionJob::new(config).submit(request);
    let mut events = Vec::new();
    while let Some(event) = handle.recv().await {
        events.push(event);
    }
    let state = handle.join().await;
    (events, state)
}

fn percents(events: &[JobEvent]) -> Vec<f64> {
    events
        .iter()
        .filter_map(|e| match e {
            JobEvent::Progress { percent } => Some(*percent),
            _ => None,
        })
        .collect()
}

fn terminal(events: &[JobEvent]) -> (bool, String) {
    let terminals: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            JobEvent::Completed { success, message } => Some((*success, message.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(terminals.len(), 1, "exactly one terminal event expected");
    terminals[0].clone()
}

#[tokio::test]
async fn successful_job_reports_ascending_progress() {
    let dir = tempfile::tempdir().unwrap();
    let (config, request) = stub_environment(dir.path(), PROBE_JSON, FFMPEG_OK);

    let (events, state) = run_to_completion(config, request).await;

    let (success, _) = terminal(&events);
    assert!(success);
    assert_eq!(state, JobState::Succeeded);
    assert!(events.last().unwrap().is_terminal());

    let percents = percents(&events);
    assert_eq!(percents.len(), 4);
    assert!(percents.windows(2).all(|w| w[0] < w[1]));
    assert!(percents[..percents.len() - 1].iter().all(|p| *p <= 99.9));
    assert_eq!(*percents.last().unwrap(), 100.0);

    // Destination parent was created during validation.
    assert!(dir.path().join("out").is_dir());
}

#[tokio::test]
async fn failing_transcode_reports_diagnostics() {
    let dir = tempfile::tempdir().unwrap();
    let (config, request) = stub_environment(dir.path(), PROBE_JSON, FFMPEG_FAIL);

    let (events, state) = run_to_completion(config, request).await;

    let (success, message) = terminal(&events);
    assert!(!success);
    assert!(message.contains("Invalid data found"));
    assert_eq!(state, JobState::Failed);

    // No 100% sample on the failure path.
    assert!(percents(&events).iter().all(|p| *p < 100.0));
}

#[tokio::test]
async fn unknown_duration_completes_with_progress_suppressed() {
    let dir = tempfile::tempdir().unwrap();
    let (config, request) = stub_environment(dir.path(), PROBE_JSON_NO_DURATION, FFMPEG_OK);

    let (events, state) = run_to_completion(config, request).await;

    let (success, _) = terminal(&events);
    assert!(success);
    assert_eq!(state, JobState::Succeeded);

    // Only the final 100% sample after the clean exit; parser samples are
    // suppressed without a known duration.
    assert_eq!(percents(&events), vec![100.0]);
    assert!(events.iter().any(|e| matches!(
        e,
        JobEvent::Status { message, .. } if message.contains("duration unknown")
    )));
}

#[tokio::test]
async fn audio_only_source_fails_probe() {
    let dir = tempfile::tempdir().unwrap();
    let (config, request) = stub_environment(dir.path(), PROBE_JSON_AUDIO_ONLY, FFMPEG_OK);

    let (events, state) = run_to_completion(config, request).await;

    let (success, message) = terminal(&events);
    assert!(!success);
    assert!(message.contains("no video stream"));
    assert_eq!(state, JobState::Failed);
    assert!(percents(&events).is_empty());
}

#[tokio::test]
async fn missing_binaries_fail_before_probing() {
    let dir = tempfile::tempdir().unwrap();
    let playlist = dir.path().join("show.m3u8");
    std::fs::write(&playlist, "#EXTM3U\n").unwrap();

    // Packaged mode with an empty resource directory: nothing to extract.
    let config = WorkerConfig {
        resolve_mode: ResolveMode::Packaged {
            resource_dir: dir.path().join("resources"),
            scratch_dir: dir.path().join("scratch"),
        },
        transcode_timeout: None,
        event_buffer: 64,
    };
    let request = ConversionRequest::new(
        SourceReference::parse(playlist.to_str().unwrap()),
        dir.path().join("out.mp4"),
    );

    let (events, state) = run_to_completion(config, request).await;

    let (success, message) = terminal(&events);
    assert!(!success);
    assert!(message.contains("binary resolution failed"));
    assert_eq!(state, JobState::Failed);

    // The job never reached the probing state.
    assert!(!events.iter().any(|e| matches!(
        e,
        JobEvent::Status { message, .. } if message.contains("probing")
    )));
}

#[tokio::test]
async fn cancel_terminates_with_single_failure() {
    let dir = tempfile::tempdir().unwrap();
    let (config, request) = stub_environment(
        dir.path(),
        PROBE_JSON,
        "#!/bin/sh\nsleep 30\n",
    );

    let mut handle = ConversionJob::new(config).submit(request);

    let mut events = Vec::new();
    while let Some(event) = handle.recv().await {
        // Cancel once the transcode is underway.
        if matches!(&event, JobEvent::Status { message, .. } if message.contains("transcode started"))
        {
            handle.cancel();
        }
        events.push(event);
    }

    let (success, message) = terminal(&events);
    assert!(!success);
    assert!(message.contains("cancelled"));
    assert_eq!(handle.join().await, JobState::Failed);
}
