// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preprocessing configuration.

use serde::{Deserialize, Serialize};

use crate::error::{PanscanError, Result};

/// Parameters for adaptive Gaussian thresholding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdParams {
    /// Side of the square neighbourhood used for the local mean. Odd, >= 3.
    pub block_size: u32,
    /// Constant subtracted from the local mean.
    pub c: i32,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            block_size: 11,
            c: 2,
        }
    }
}

impl ThresholdParams {
    pub fn validate(&self) -> Result<()> {
        if self.block_size < 3 || self.block_size % 2 == 0 {
            return Err(PanscanError::InvalidParameter(format!(
                "threshold block size must be odd and at least 3, got {}",
                self.block_size
            )));
        }
        Ok(())
    }

    /// Gaussian sigma derived from the block size, matching the usual
    /// `0.3 * ((ksize - 1) * 0.5 - 1) + 0.8` rule.
    pub fn sigma(&self) -> f32 {
        0.3 * ((self.block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
    }
}

/// Largest accepted non-local means window side.
pub const MAX_NLM_WINDOW: u32 = 255;

/// Denoising filter applied after thresholding.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DenoiseMethod {
    /// Non-local means. `h` is the filter strength; the windows are full
    /// side lengths and must be odd.
    NonLocalMeans {
        h: f32,
        template_window: u32,
        search_window: u32,
    },
    /// Median over a `(2 * radius + 1)` square.
    Median { radius: u32 },
    None,
}

impl Default for DenoiseMethod {
    fn default() -> Self {
        Self::NonLocalMeans {
            h: 3.0,
            template_window: 7,
            search_window: 21,
        }
    }
}

impl DenoiseMethod {
    pub fn validate(&self) -> Result<()> {
        if let Self::NonLocalMeans {
            h,
            template_window,
            search_window,
        } = *self
        {
            if !h.is_finite() || h <= 0.0 {
                return Err(PanscanError::InvalidParameter(format!(
                    "non-local means strength must be positive, got {h}"
                )));
            }
            for (name, size) in [("template", template_window), ("search", search_window)] {
                if size == 0 || size % 2 == 0 {
                    return Err(PanscanError::InvalidParameter(format!(
                        "non-local means {name} window must be odd, got {size}"
                    )));
                }
                if size > MAX_NLM_WINDOW {
                    return Err(PanscanError::InvalidParameter(format!(
                        "non-local means {name} window must be at most {MAX_NLM_WINDOW}, got {size}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Everything the preprocessor needs to know.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PreprocessConfig {
    pub threshold: ThresholdParams,
    pub denoise: DenoiseMethod,
}

impl PreprocessConfig {
    /// Check every parameter before any file is touched.
    pub fn validate(&self) -> Result<()> {
        self.threshold.validate()?;
        self.denoise.validate()
    }
}
