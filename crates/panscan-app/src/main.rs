// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pan-ocr: PAN extraction from a photographed identity document.
//
// Entry point. Initialises logging (stderr only; stdout carries exactly one
// JSON line), checks the arguments, and runs the extraction pipeline.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use panscan_core::{ExtractionOutcome, PreprocessConfig};
use panscan_document::{OcrEngine, extract_with};

/// Extract a PAN from an identity document image and print the result as JSON.
///
/// The image file is overwritten with its preprocessed (thresholded,
/// denoised) version.
#[derive(Debug, Parser)]
#[command(name = "pan-ocr", version)]
struct Cli {
    /// Path to the image to scan.
    #[arg(value_parser = clap::builder::OsStringValueParser::new(), allow_hyphen_values = true)]
    image: OsString,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            // --help / --version are not extraction runs; print clap's text as-is.
            let _ = err.print();
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            tracing::debug!(error = %err, "Rejected arguments");
            return report(&ExtractionOutcome::usage_error(), ExitCode::FAILURE);
        }
    };

    let path = PathBuf::from(cli.image);
    tracing::info!(path = %path.display(), "pan-ocr starting");

    let outcome = extract_with(&path, &PreprocessConfig::default(), OcrEngine::with_defaults);
    report(&outcome, ExitCode::SUCCESS)
}

/// Print `outcome` as a single JSON line and hand back `code`.
fn report(outcome: &ExtractionOutcome, code: ExitCode) -> ExitCode {
    match outcome.to_json_line() {
        Ok(line) => println!("{line}"),
        Err(err) => {
            // Serializing a bool and two strings does not fail in practice;
            // keep the one-line contract even if it somehow does.
            tracing::error!(error = %err, "Could not serialize result");
            println!(r#"{{"success":false,"error":"internal serialization error"}}"#);
        }
    }
    code
}
