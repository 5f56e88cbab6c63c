// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end extraction: preprocess -> recognize -> match.
//
// Every fallible step returns `PanscanError`; the public entry points flatten
// whatever went wrong into an `ExtractionOutcome`, so callers never see a
// `Result` and never crash on a bad image.

use std::path::Path;

use panscan_core::config::PreprocessConfig;
use panscan_core::error::{PanscanError, Result};
use panscan_core::{ExtractionOutcome, PanNumber};
use tracing::{debug, info, instrument, warn};

use crate::extract::PanExtractor;
use crate::scan::preprocess::preprocess_in_place;
use crate::scan::recognize::TextRecognizer;

/// Run the pipeline on `path` with an already-constructed recognizer.
///
/// The image file is overwritten with its preprocessed version.
pub fn extract_pan_number<R>(path: &Path, recognizer: &R, config: &PreprocessConfig) -> ExtractionOutcome
where
    R: TextRecognizer + ?Sized,
{
    let outcome = ExtractionOutcome::from(try_extract(path, recognizer, config));
    log_outcome(&outcome);
    outcome
}

/// Build the recognizer with `load`, then run the pipeline.
///
/// Loading happens first: if it fails (missing models, say) the image file is
/// left as it was.
pub fn extract_with<R, F>(path: &Path, config: &PreprocessConfig, load: F) -> ExtractionOutcome
where
    R: TextRecognizer,
    F: FnOnce() -> Result<R>,
{
    let result = load().and_then(|recognizer| try_extract(path, &recognizer, config));
    let outcome = ExtractionOutcome::from(result);
    log_outcome(&outcome);
    outcome
}

/// The pipeline with errors intact.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn try_extract<R>(path: &Path, recognizer: &R, config: &PreprocessConfig) -> Result<PanNumber>
where
    R: TextRecognizer + ?Sized,
{
    let report = preprocess_in_place(path, config)?;
    debug!(width = report.width, height = report.height, "Preprocessing done");

    let regions = recognizer.recognize(path)?;
    let text = PanExtractor::join(&regions);
    debug!(regions = regions.len(), chars = text.len(), "Text recognized");

    let pan = PanExtractor::first_match(&text).ok_or(PanscanError::PanNotFound)?;
    if tracing::enabled!(tracing::Level::DEBUG) {
        let candidates = PanExtractor::all_matches(&text);
        if candidates.len() > 1 {
            debug!(count = candidates.len(), "Several PAN-shaped tokens; keeping the first");
        }
    }

    info!(holder_type = ?pan.holder_type(), "PAN found");
    Ok(pan)
}

fn log_outcome(outcome: &ExtractionOutcome) {
    if let Some(error) = outcome.error() {
        warn!(error, "Extraction failed");
    }
}
