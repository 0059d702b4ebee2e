//! Single-shot ILD grade prediction from a JSON record.
//!
//! # Usage
//!
//! ```bash
//! predict_json [input.json] [--artifact-dir <dir>]
//! echo '{"ro52_titer": 1.5, ...}' | predict_json
//! ```
//!
//! Prints `{"label": "class_1", "probability": 0.8123}` on success.
//!
//! Exit codes: 1 usage/IO, 2 artifacts not loaded, 3 invalid input,
//! 4 inference error.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ildrisk::adapters::sanitize::SanitizingMakeWriter;
use ildrisk::application::PredictionService;
use ildrisk::config::AppConfig;
use ildrisk::{ClinicalInput, IldRiskError};

const EXIT_USAGE: u8 = 1;
const EXIT_ARTIFACTS: u8 = 2;
const EXIT_VALIDATION: u8 = 3;
const EXIT_INFERENCE: u8 = 4;

struct Args {
    input: Option<PathBuf>,
    artifact_dir: Option<PathBuf>,
}

fn usage() -> anyhow::Error {
    anyhow!("Usage: predict_json [input.json] [--artifact-dir <dir>]")
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut input = None;
    let mut artifact_dir = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--artifact-dir" => {
                let v = args.next().ok_or_else(usage)?;
                artifact_dir = Some(PathBuf::from(v));
            }
            "-h" | "--help" => return Err(usage()),
            "-" if input.is_none() => {}
            _ => {
                if input.is_none() {
                    input = Some(PathBuf::from(arg));
                } else {
                    return Err(usage());
                }
            }
        }
    }

    Ok(Args {
        input,
        artifact_dir,
    })
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(p) => std::fs::read_to_string(p).with_context(|| format!("Failed to read {p:?}")),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            Ok(buf)
        }
    }
}

/// Range checks the terminal form enforces on entry.
fn check_entry_ranges(input: &ClinicalInput) -> Option<String> {
    if !(0.0..=3.0).contains(&input.ro52_titer) {
        return Some("Anti-RO52 titer must be between 0 and 3".to_string());
    }
    if input.antisynthetase_positive > 1 {
        return Some("Antisynthetase antibody must be 0 or 1".to_string());
    }
    None
}

fn exit_code(err: &IldRiskError) -> u8 {
    match err {
        IldRiskError::ArtifactLoad(_) | IldRiskError::ModelNotLoaded(_) => EXIT_ARTIFACTS,
        IldRiskError::Validation(_) | IldRiskError::Serialization(_) => EXIT_VALIDATION,
        IldRiskError::Inference(_) => EXIT_INFERENCE,
        IldRiskError::Io(_) => EXIT_USAGE,
    }
}

fn init_logging() -> tracing_appender::non_blocking::WorkerGuard {
    // stdout carries the result; logs go to stderr.
    let (writer, guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();
    guard
}

fn run() -> std::result::Result<String, (u8, String)> {
    let args = parse_args().map_err(|e| (EXIT_USAGE, e.to_string()))?;
    let raw = read_input(args.input.as_ref()).map_err(|e| (EXIT_USAGE, format!("{e:#}")))?;

    let input: ClinicalInput = serde_json::from_str(&raw).map_err(|e| {
        let err = IldRiskError::from(e);
        (exit_code(&err), err.user_message())
    })?;
    if let Some(message) = check_entry_ranges(&input) {
        return Err((EXIT_VALIDATION, message));
    }

    let mut config = AppConfig::from_env();
    if let Some(dir) = args.artifact_dir {
        config.artifact_dir = dir;
    }

    let mut service = PredictionService::new();
    if let Err(e) = service.initialize(&config.artifact_source()) {
        tracing::debug!("Artifact load failed: {}", e);
    }

    let result = service
        .predict(&input)
        .map_err(|e| (exit_code(&e), e.user_message()))?;

    let output = serde_json::json!({
        "label": result.label,
        "probability": result.probability,
    });
    Ok(output.to_string())
}

fn main() -> ExitCode {
    let _guard = init_logging();

    match run() {
        Ok(line) => {
            println!("{line}");
            ExitCode::SUCCESS
        }
        Err((code, message)) => {
            eprintln!("{message}");
            ExitCode::from(code)
        }
    }
}
