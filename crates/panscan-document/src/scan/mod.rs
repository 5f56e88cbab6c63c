// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanning pipeline: grayscale, adaptive thresholding, denoising, and
// optical character recognition (OCR).

pub mod denoise;
pub mod preprocess;
pub mod recognize;

#[cfg(feature = "ocr")]
pub mod ocr;

pub use preprocess::Preprocessor;
pub use recognize::TextRecognizer;

#[cfg(feature = "ocr")]
pub use ocr::OcrEngine;
