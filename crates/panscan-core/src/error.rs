// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for panscan.

use thiserror::Error;

/// Message reported when recognition succeeds but no PAN-shaped token exists.
pub const PAN_NOT_FOUND_MESSAGE: &str = "Could not find PAN number in the image";

/// Top-level error type for all panscan operations.
///
/// Every variant's `Display` output is what ends up in the `error` field of
/// the JSON result, so messages are written for the caller, not for a log.
#[derive(Debug, Error)]
pub enum PanscanError {
    // -- Image / preprocessing --
    #[error("image processing failed: {0}")]
    Image(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    // -- Recognition --
    #[error("OCR failed: {0}")]
    Ocr(String),

    // -- Extraction --
    #[error("{}", PAN_NOT_FOUND_MESSAGE)]
    PanNotFound,

    #[error("not a valid PAN: {0:?}")]
    InvalidPan(String),

    // -- Plumbing --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, PanscanError>;
