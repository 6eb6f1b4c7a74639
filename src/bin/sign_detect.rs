//! sign_detect - classify the signs in one video
//!
//! Reads a video file (or a `stub://` synthetic payload), runs the detection
//! pipeline and prints the JSON response body on stdout. Exit status is 0 on
//! success, 1 for client-side outcomes (unreadable video, no confident sign)
//! and 2 for dependency or internal failures.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;

use sign_detect::{
    ui, DetectError, DetectionResponse, DetectorConfig, ErrorCategory, ErrorResponse,
    PayloadDecoder, SignDetector,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Detect sign-language gestures in a video")]
struct Args {
    /// Video file, or a synthetic payload such as `stub://gesture?frames=60`.
    #[arg(long)]
    video: String,

    /// Config file (JSON, or TOML by extension).
    #[arg(long, env = "SIGN_DETECT_CONFIG")]
    config: Option<PathBuf>,

    /// Classifier backend name.
    #[arg(long)]
    backend: Option<String>,

    /// ONNX model for the tract backend.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Label table (JSON array or one label per line).
    #[arg(long)]
    labels: Option<PathBuf>,

    /// Progress display: auto, plain, pretty or quiet.
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let code = match run(&args) {
        Ok(response) => print_json(&response),
        Err(err) => {
            log::error!("request failed: {}", err);
            print_json(&ErrorResponse::from(&err));
            match err.category() {
                ErrorCategory::ClientInput | ErrorCategory::NoResult => 1,
                ErrorCategory::Dependency | ErrorCategory::Internal => 2,
            }
        }
    };
    std::process::exit(code);
}

fn run(args: &Args) -> Result<DetectionResponse, DetectError> {
    let mode = args
        .ui
        .parse::<ui::UiMode>()
        .map_err(|e| DetectError::Config(format!("{:#}", e)))?;
    let ui = ui::Ui::new(mode, std::io::stderr().is_terminal());

    let config = {
        let _stage = ui.stage("Load configuration");
        load_config(args).map_err(|e| DetectError::Config(format!("{:#}", e)))?
    };
    let detector = {
        let _stage = ui.stage("Load classifier");
        SignDetector::from_config(&config)?
    };
    let payload = {
        let _stage = ui.stage("Read video");
        read_payload(&args.video).map_err(|e| DetectError::Decode(format!("{:#}", e)))?
    };
    let report = {
        let _stage = ui.stage("Detect signs");
        detector.detect_video(&PayloadDecoder::new(), &payload)?
    };
    log::info!(
        "{} frames, {} segments{}",
        report.stats.frames_read,
        report.stats.segments_found,
        if report.stats.fallback {
            " (whole-video fallback)"
        } else {
            ""
        }
    );
    Ok(DetectionResponse::from(report))
}

fn load_config(args: &Args) -> Result<DetectorConfig> {
    let mut config = DetectorConfig::load_from(args.config.as_deref())?;
    if let Some(backend) = &args.backend {
        config.classifier.backend = backend.clone();
    }
    if let Some(model) = &args.model {
        config.classifier.model_path = Some(model.clone());
    }
    if let Some(labels) = &args.labels {
        config.labels_path = Some(labels.clone());
    }
    config.validate()?;
    Ok(config)
}

fn read_payload(video: &str) -> Result<Vec<u8>> {
    if video.starts_with("stub://") {
        return Ok(video.as_bytes().to_vec());
    }
    std::fs::read(video).with_context(|| format!("failed to read video {}", video))
}

fn print_json<T: serde::Serialize>(body: &T) -> i32 {
    match serde_json::to_string_pretty(body) {
        Ok(json) => {
            println!("{json}");
            0
        }
        Err(e) => {
            log::error!("failed to encode response: {}", e);
            2
        }
    }
}
