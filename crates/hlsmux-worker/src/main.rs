//! Playlist conversion CLI.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hlsmux_models::{ConversionRequest, JobEvent, SourceReference};
use hlsmux_worker::{ConversionJob, WorkerConfig};

const BAR_WIDTH: usize = 50;

/// One turn of the event loop: a job event or an interrupt.
enum Next {
    Event(Option<JobEvent>),
    Interrupt,
}

#[derive(Parser)]
#[command(
    name = "hlsmux",
    version,
    about = "Convert M3U8 playlists to MP4 without re-encoding"
)]
struct Cli {
    /// Playlist URL or local manifest path
    input: String,

    /// Output MP4 path
    output: PathBuf,

    /// Abort the transcode after this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Suppress the progress bar
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    let cli = Cli::parse();

    let mut config = WorkerConfig::from_env();
    if let Some(secs) = cli.timeout {
        config.transcode_timeout = Some(Duration::from_secs(secs));
    }

    let source = SourceReference::parse(&cli.input);
    info!("converting {} to {}", source, cli.output.display());

    let request = ConversionRequest::new(source, cli.output.clone());
    let mut handle = ConversionJob::new(config).submit(request);

    let exit_code = loop {
        let next = tokio::select! {
            event = handle.recv() => Next::Event(event),
            _ = tokio::signal::ctrl_c() => Next::Interrupt,
        };

        match next {
            Next::Interrupt => {
                info!("received interrupt, cancelling conversion");
                handle.cancel();
            }
            Next::Event(Some(JobEvent::Progress { percent })) => {
                if !cli.quiet {
                    render_bar(percent);
                }
            }
            Next::Event(Some(JobEvent::Status { message, .. })) => {
                info!("{}", message);
            }
            Next::Event(Some(JobEvent::Completed { success, message })) => {
                if !cli.quiet {
                    println!();
                }
                if success {
                    info!("{}", message);
                    println!("output file: {}", cli.output.display());
                    break 0;
                }
                error!("{}", message);
                break 1;
            }
            // Channel closed without a terminal event: worker task died.
            Next::Event(None) => break 1,
        }
    };

    std::process::exit(exit_code);
}

/// Initialize tracing on stderr: colored output for dev, JSON when
/// `LOG_FORMAT=json`. Stdout stays clean for the progress bar.
fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::from_default_env()
        .add_directive("hlsmux=info".parse().expect("valid directive"))
        .add_directive("hlsmux_worker=info".parse().expect("valid directive"))
        .add_directive("hlsmux_media=info".parse().expect("valid directive"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }
}

fn render_bar(percent: f64) {
    let filled = ((percent / 100.0) * BAR_WIDTH as f64) as usize;
    let filled = filled.min(BAR_WIDTH);
    print!(
        "\r[{}{}] {:>5.1}%",
        "=".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percent
    );
    let _ = std::io::stdout().flush();
}
