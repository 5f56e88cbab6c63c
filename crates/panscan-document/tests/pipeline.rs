// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end pipeline tests using scripted recognizers in place of the
// neural OCR engine.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GrayImage, ImageFormat, Luma, Rgb, RgbImage};
use panscan_core::config::PreprocessConfig;
use panscan_core::error::PanscanError;
use panscan_core::ExtractionOutcome;
use panscan_document::{TextRecognizer, TextRegion, extract_pan_number, extract_with};

/// Returns the same lines for every image and records what it was shown.
struct ScriptedRecognizer {
    lines: Vec<String>,
    seen: RefCell<Vec<DynamicImage>>,
}

impl ScriptedRecognizer {
    fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines.iter().map(|l| l.to_string()).collect(),
            seen: RefCell::new(Vec::new()),
        }
    }
}

impl TextRecognizer for ScriptedRecognizer {
    fn recognize(&self, path: &Path) -> Result<Vec<TextRegion>, PanscanError> {
        let image = image::open(path)
            .map_err(|err| PanscanError::Image(format!("scripted open failed: {err}")))?;
        self.seen.borrow_mut().push(image);
        Ok(self.lines.iter().cloned().map(TextRegion::text).collect())
    }
}

struct FailingRecognizer;

impl TextRecognizer for FailingRecognizer {
    fn recognize(&self, _path: &Path) -> Result<Vec<TextRegion>, PanscanError> {
        Err(PanscanError::Ocr("engine crashed".into()))
    }
}

/// A card-ish photo: warm background with a couple of dark text bars.
fn write_card(dir: &Path, name: &str, format: ImageFormat) -> PathBuf {
    let img = RgbImage::from_fn(120, 80, |x, y| {
        let in_bar = (20..26).contains(&y) || (50..56).contains(&y);
        if in_bar && (10..110).contains(&x) {
            Rgb([25, 25, 40])
        } else {
            Rgb([235, 225, 205])
        }
    });
    let path = dir.join(name);
    DynamicImage::ImageRgb8(img)
        .save_with_format(&path, format)
        .unwrap();
    path
}

fn json(outcome: &ExtractionOutcome) -> serde_json::Value {
    let line = outcome.to_json_line().unwrap();
    assert!(!line.contains('\n'), "output must be a single line: {line}");
    serde_json::from_str(&line).unwrap()
}

#[test]
fn finds_pan_and_reports_success() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_card(dir.path(), "pan.png", ImageFormat::Png);
    let recognizer = ScriptedRecognizer::new(&[
        "INCOME TAX DEPARTMENT",
        "Permanent Account Number",
        "ABCDE1234F",
    ]);

    let outcome = extract_pan_number(&path, &recognizer, &PreprocessConfig::default());

    assert_eq!(
        json(&outcome),
        serde_json::json!({ "success": true, "panNumber": "ABCDE1234F" })
    );
}

#[test]
fn recognizer_sees_the_preprocessed_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_card(dir.path(), "pan.png", ImageFormat::Png);
    let recognizer = ScriptedRecognizer::new(&["ABCDE1234F"]);

    extract_pan_number(&path, &recognizer, &PreprocessConfig::default());

    let seen = recognizer.seen.borrow();
    assert_eq!(seen.len(), 1);
    let gray = seen[0].to_luma8();
    assert_eq!(gray.dimensions(), (120, 80));
    assert!(gray.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
    // A bar pixel went black, the background went white.
    assert_eq!(gray.get_pixel(60, 22).0[0], 0);
    assert_eq!(gray.get_pixel(60, 40).0[0], 255);
}

#[test]
fn jpeg_input_is_written_back_as_jpeg() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_card(dir.path(), "scan.jpg", ImageFormat::Jpeg);
    let recognizer = ScriptedRecognizer::new(&["ABCDE1234F"]);

    let outcome = extract_pan_number(&path, &recognizer, &PreprocessConfig::default());
    assert!(outcome.is_success());

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
}

#[test]
fn no_pan_reports_fixed_message() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_card(dir.path(), "blank.png", ImageFormat::Png);
    let recognizer = ScriptedRecognizer::new(&["GOVT. OF INDIA", "abcde1234f"]);

    let outcome = extract_pan_number(&path, &recognizer, &PreprocessConfig::default());

    assert_eq!(
        json(&outcome),
        serde_json::json!({
            "success": false,
            "error": "Could not find PAN number in the image"
        })
    );
}

#[test]
fn empty_recognition_reports_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_card(dir.path(), "empty.png", ImageFormat::Png);
    let outcome = extract_pan_number(&path, &ScriptedRecognizer::new(&[]), &PreprocessConfig::default());
    assert_eq!(outcome.error(), Some("Could not find PAN number in the image"));
}

#[test]
fn first_pan_in_scan_order_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_card(dir.path(), "two.png", ImageFormat::Png);
    let recognizer = ScriptedRecognizer::new(&["old: ZYXWV9876U", "new: ABCDE1234F"]);

    let outcome = extract_pan_number(&path, &recognizer, &PreprocessConfig::default());

    assert_eq!(outcome.pan_number().unwrap().as_str(), "ZYXWV9876U");
}

#[test]
fn nonexistent_file_reports_error_without_panicking() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.png");

    let outcome = extract_pan_number(
        &path,
        &ScriptedRecognizer::new(&["ABCDE1234F"]),
        &PreprocessConfig::default(),
    );

    let value = json(&outcome);
    assert_eq!(value["success"], false);
    assert!(value["error"].as_str().is_some_and(|e| !e.is_empty()));
    assert!(value.get("panNumber").is_none());
}

#[test]
fn undecodable_file_reports_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.png");
    std::fs::write(&path, b"this is text, not pixels").unwrap();

    let outcome = extract_pan_number(
        &path,
        &ScriptedRecognizer::new(&["ABCDE1234F"]),
        &PreprocessConfig::default(),
    );
    assert!(!outcome.is_success());
    assert!(outcome.error().unwrap().starts_with("image processing failed"));
}

#[test]
fn recognizer_failure_is_reported_in_band() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_card(dir.path(), "pan.png", ImageFormat::Png);

    let outcome = extract_pan_number(&path, &FailingRecognizer, &PreprocessConfig::default());

    assert_eq!(outcome.error(), Some("OCR failed: engine crashed"));
}

#[test]
fn loader_runs_before_the_file_is_touched() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_card(dir.path(), "pan.png", ImageFormat::Png);
    let before = std::fs::read(&path).unwrap();

    let outcome = extract_with(&path, &PreprocessConfig::default(), || {
        Err::<ScriptedRecognizer, _>(PanscanError::Ocr("detection model not found".into()))
    });

    assert!(!outcome.is_success());
    assert_eq!(std::fs::read(&path).unwrap(), before);
}

#[test]
fn loader_success_runs_full_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_card(dir.path(), "pan.png", ImageFormat::Png);

    let outcome = extract_with(&path, &PreprocessConfig::default(), || {
        Ok(ScriptedRecognizer::new(&["PAN ABCPE1234F"]))
    });

    assert_eq!(outcome.pan_number().unwrap().as_str(), "ABCPE1234F");
}

#[test]
fn median_denoise_config_also_works() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_card(dir.path(), "pan.png", ImageFormat::Png);
    let config = PreprocessConfig {
        denoise: panscan_core::DenoiseMethod::Median { radius: 1 },
        ..Default::default()
    };

    let outcome = extract_pan_number(&path, &ScriptedRecognizer::new(&["ABCDE1234F"]), &config);
    assert!(outcome.is_success());

    let written = image::open(&path).unwrap().to_luma8();
    assert!(written.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
}

#[test]
fn grayscale_source_stays_same_size() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gray.png");
    DynamicImage::ImageLuma8(GrayImage::from_pixel(33, 21, Luma([180u8])))
        .save(&path)
        .unwrap();

    extract_pan_number(&path, &ScriptedRecognizer::new(&[]), &PreprocessConfig::default());

    let written = image::open(&path).unwrap();
    assert_eq!((written.width(), written.height()), (33, 21));
}
