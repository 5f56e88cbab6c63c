// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR (Optical Character Recognition) engine for panscan.
//
// Recognizes text in preprocessed document images using the `ocrs` crate, a
// pure-Rust OCR engine backed by neural network models executed via `rten`.
// The published models cover the Latin alphabet, which is all a PAN card
// needs.
//
// # Feature Gate
//
// This module is only available when the `ocr` feature is enabled:
//
// ```toml
// panscan-document = { path = "crates/panscan-document", features = ["ocr"] }
// ```
//
// # Model Setup
//
// The engine requires two model files:
//
// - **Detection model** (`text-detection.rten`): locates text regions in the image.
// - **Recognition model** (`text-recognition.rten`): decodes characters from detected regions.
//
// They are looked up in, in order:
//
// 1. `$PANSCAN_MODEL_DIR`
// 2. `$XDG_CACHE_HOME/ocrs`
// 3. `~/.cache/ocrs`
//
// Running `ocrs-cli` once on any image downloads both into `~/.cache/ocrs`:
//   ```sh
//   cargo install ocrs-cli
//   ocrs some-image.png
//   ```

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams, TextItem};
use panscan_core::error::PanscanError;
use rten::Model;
use tracing::{debug, info, instrument};

use crate::scan::preprocess::Preprocessor;
use crate::scan::recognize::{Region, TextRecognizer, TextRegion};

/// Environment variable overriding the model directory.
pub const MODEL_DIR_ENV: &str = "PANSCAN_MODEL_DIR";

/// Well-known filenames for the detection and recognition models.
const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// Directory the models are loaded from when no explicit path is given.
pub fn default_model_dir() -> PathBuf {
    resolve_model_dir(
        std::env::var_os(MODEL_DIR_ENV),
        std::env::var_os("XDG_CACHE_HOME"),
        std::env::var_os("HOME"),
    )
}

fn resolve_model_dir(
    explicit: Option<OsString>,
    xdg_cache: Option<OsString>,
    home: Option<OsString>,
) -> PathBuf {
    let non_empty = |v: Option<OsString>| v.filter(|s| !s.is_empty());
    if let Some(dir) = non_empty(explicit) {
        PathBuf::from(dir)
    } else if let Some(xdg) = non_empty(xdg_cache) {
        PathBuf::from(xdg).join("ocrs")
    } else if let Some(home) = non_empty(home) {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Configuration for constructing an [`OcrEngine`].
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Path to the text-detection model file (`.rten`).
    pub detection_model_path: PathBuf,
    /// Path to the text-recognition model file (`.rten`).
    pub recognition_model_path: PathBuf,
}

impl Default for OcrConfig {
    /// Points at [`default_model_dir`].
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl OcrConfig {
    /// Expects `dir` to contain `text-detection.rten` and `text-recognition.rten`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection_model_path: dir.join(DETECTION_MODEL_FILENAME),
            recognition_model_path: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    pub fn from_paths(
        detection_model: impl Into<PathBuf>,
        recognition_model: impl Into<PathBuf>,
    ) -> Self {
        Self {
            detection_model_path: detection_model.into(),
            recognition_model_path: recognition_model.into(),
        }
    }

    /// Verify that both model files exist.
    pub fn validate(&self) -> Result<(), PanscanError> {
        for (kind, path) in [
            ("detection", &self.detection_model_path),
            ("recognition", &self.recognition_model_path),
        ] {
            if !path.exists() {
                return Err(PanscanError::Ocr(format!(
                    "{kind} model not found at {}; set {MODEL_DIR_ENV} or run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// Text recognizer backed by `ocrs`.
///
/// Model loading is the expensive step; the pipeline builds one engine per
/// run before the image is touched.
pub struct OcrEngine {
    engine: OcrsEngine,
}

impl OcrEngine {
    /// Load models from the paths given in `config`.
    ///
    /// # Errors
    ///
    /// Returns [`PanscanError::Ocr`] if model files are missing or corrupt.
    #[instrument(skip_all, fields(
        detection = %config.detection_model_path.display(),
        recognition = %config.recognition_model_path.display(),
    ))]
    pub fn new(config: OcrConfig) -> Result<Self, PanscanError> {
        config.validate()?;

        let detection_model = load_model(&config.detection_model_path, "detection")?;
        let recognition_model = load_model(&config.recognition_model_path, "recognition")?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| PanscanError::Ocr(format!("failed to initialise OCR engine: {}", err)))?;

        info!("OCR engine initialised");
        Ok(Self { engine })
    }

    /// Equivalent to `OcrEngine::new(OcrConfig::default())`.
    pub fn with_defaults() -> Result<Self, PanscanError> {
        Self::new(OcrConfig::default())
    }

    /// Recognize every text line in `image`.
    ///
    /// Lines come back in the engine's reading order; blank lines are dropped.
    /// `ocrs` does not score its output, so `confidence` is always `None`.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn recognize_image(&self, image: &DynamicImage) -> Result<Vec<TextRegion>, PanscanError> {
        // ocrs takes RGB8.
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            PanscanError::Ocr(format!(
                "failed to create image source ({}x{}): {}",
                width, height, err
            ))
        })?;

        let input = self
            .engine
            .prepare_input(source)
            .map_err(|err| PanscanError::Ocr(format!("OCR preprocessing failed: {}", err)))?;

        let word_rects = self
            .engine
            .detect_words(&input)
            .map_err(|err| PanscanError::Ocr(format!("word detection failed: {}", err)))?;
        debug!(word_count = word_rects.len(), "Words detected");

        let line_rects = self.engine.find_text_lines(&input, &word_rects);

        let line_texts = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|err| PanscanError::Ocr(format!("line recognition failed: {}", err)))?;

        let regions: Vec<TextRegion> = line_texts
            .iter()
            .flatten()
            .filter_map(|line| {
                let text = line.to_string();
                if text.trim().is_empty() {
                    return None;
                }
                let rect = line.bounding_rect();
                Some(TextRegion {
                    region: Some(Region {
                        left: rect.left() as f32,
                        top: rect.top() as f32,
                        right: rect.right() as f32,
                        bottom: rect.bottom() as f32,
                    }),
                    text,
                    confidence: None,
                })
            })
            .collect();

        info!(recognized_lines = regions.len(), "OCR complete");
        Ok(regions)
    }
}

impl TextRecognizer for OcrEngine {
    /// Decodes with the preprocessor's loader, which reads the format from
    /// the file contents, so whatever [`preprocess_in_place`] wrote back opens
    /// here regardless of the file's extension.
    ///
    /// [`preprocess_in_place`]: crate::scan::preprocess::preprocess_in_place
    fn recognize(&self, path: &Path) -> Result<Vec<TextRegion>, PanscanError> {
        let image = Preprocessor::open(path)?.into_dynamic();
        self.recognize_image(&image)
    }
}

fn load_model(path: &Path, kind: &str) -> Result<Model, PanscanError> {
    info!(kind, "Loading OCR model");
    Model::load_file(path).map_err(|err| {
        PanscanError::Ocr(format!(
            "failed to load {kind} model from {}: {}",
            path.display(),
            err
        ))
    })
}
