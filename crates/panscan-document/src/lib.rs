// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// panscan-document: Image side of the PAN extractor.
//
// Provides the preprocessing pipeline (grayscale, adaptive thresholding,
// denoising, in-place overwrite), the text recognition seam with an optional
// `ocrs`-backed engine, PAN extraction from recognized text, and the
// orchestration that ties them into a single result.

pub mod extract;
pub mod integrity;
pub mod pipeline;
pub mod scan;

// Re-export the primary items so callers can use `panscan_document::Preprocessor` etc.
pub use extract::PanExtractor;
pub use pipeline::{extract_pan_number, extract_with, try_extract};
pub use scan::preprocess::{PreprocessReport, Preprocessor, preprocess_in_place};
pub use scan::recognize::{Region, TextRecognizer, TextRegion};

#[cfg(feature = "ocr")]
pub use scan::ocr::{OcrConfig, OcrEngine};
