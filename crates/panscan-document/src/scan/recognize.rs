// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The text recognition seam. The pipeline only depends on this trait, so the
// neural engine in `ocr` (feature-gated) and scripted test doubles are
// interchangeable.

use std::path::Path;

use panscan_core::error::PanscanError;

/// Axis-aligned bounding box in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

/// One piece of recognized text.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRegion {
    /// Where the text was found, if the engine reports it.
    pub region: Option<Region>,
    pub text: String,
    /// Recognition confidence in `0.0..=1.0`, if the engine reports one.
    pub confidence: Option<f32>,
}

impl TextRegion {
    /// A region carrying only text.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            region: None,
            text: text.into(),
            confidence: None,
        }
    }
}

/// Anything that can turn an image file into recognized text.
///
/// Implementations return regions in whatever order the engine produces;
/// callers must not assume it follows the document layout. An image with no
/// text yields an empty vector, not an error.
pub trait TextRecognizer {
    fn recognize(&self, path: &Path) -> Result<Vec<TextRegion>, PanscanError>;
}
