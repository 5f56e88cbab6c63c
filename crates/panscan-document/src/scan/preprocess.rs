// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Preprocessing for photographed identity documents: grayscale conversion,
// adaptive Gaussian thresholding, denoising, and the in-place overwrite of the
// source file that the recognizer then reads.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, GrayImage, ImageBuffer, ImageFormat, ImageReader, Luma};
use imageproc::filter::separable_filter_equal;
use panscan_core::config::{DenoiseMethod, PreprocessConfig, ThresholdParams};
use panscan_core::error::PanscanError;
use tracing::{debug, info, instrument, warn};

use crate::integrity::hash_bytes;
use crate::scan::denoise;

/// Preprocesses a document photo so that printed text stands out as solid
/// black on white.
///
/// Each step consumes `self` and returns the transformed image, so the
/// pipeline reads as a chain:
///
/// ```ignore
/// let bytes = Preprocessor::open("pan.jpg")?
///     .grayscale()
///     .adaptive_threshold(ThresholdParams::default())?
///     .denoise(DenoiseMethod::default())
///     .encode()?;
/// ```
pub struct Preprocessor {
    /// The working image.
    image: DynamicImage,
    /// Container format the image was decoded from; used when writing back.
    format: ImageFormat,
}

/// What happened to the file during [`preprocess_in_place`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessReport {
    pub width: u32,
    pub height: u32,
    pub format: ImageFormat,
    /// SHA-256 of the file before it was overwritten.
    pub original_sha256: String,
    /// SHA-256 of the bytes written back.
    pub processed_sha256: String,
}

impl Preprocessor {
    // -- Construction ---------------------------------------------------------

    /// Load an image from a file path.
    ///
    /// The format is sniffed from the file contents first and from the
    /// extension second, so uploads saved without an extension still decode.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PanscanError> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        Self::from_bytes(&data, ImageFormat::from_path(path).ok())
    }

    /// Decode an image from encoded bytes. `format_hint` is used only when
    /// the bytes themselves do not identify the format.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8], format_hint: Option<ImageFormat>) -> Result<Self, PanscanError> {
        let mut reader = ImageReader::new(Cursor::new(data)).with_guessed_format()?;
        if reader.format().is_none() {
            if let Some(hint) = format_hint {
                reader.set_format(hint);
            }
        }
        let format = reader.format().ok_or_else(|| {
            PanscanError::Image("unrecognised image format".to_owned())
        })?;

        let image = reader.decode().map_err(|err| {
            PanscanError::Image(format!("failed to decode {:?} image: {}", format, err))
        })?;
        info!(
            width = image.width(),
            height = image.height(),
            ?format,
            "Document image loaded"
        );
        Ok(Self { image, format })
    }

    /// Wrap an already-decoded image. `format` is used by [`encode`](Self::encode).
    pub fn from_dynamic(image: DynamicImage, format: ImageFormat) -> Self {
        Self { image, format }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Borrow the current working image.
    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.image
    }

    /// Consume the preprocessor and return the underlying image.
    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Pipeline steps -------------------------------------------------------

    /// Convert to 8-bit luminance.
    #[instrument(skip(self))]
    pub fn grayscale(self) -> Self {
        debug!("Converting to grayscale");
        Self {
            image: DynamicImage::ImageLuma8(self.image.to_luma8()),
            format: self.format,
        }
    }

    /// Binarize with a per-pixel threshold: the Gaussian-weighted mean of the
    /// `block_size` square around the pixel, minus `c`.
    ///
    /// Pixels brighter than their threshold become white (255), the rest
    /// black (0). Edges are handled by replicating the border pixels.
    #[instrument(skip(self))]
    pub fn adaptive_threshold(self, params: ThresholdParams) -> Result<Self, PanscanError> {
        params.validate()?;
        info!(
            block_size = params.block_size,
            c = params.c,
            "Applying adaptive Gaussian threshold"
        );

        let gray = self.image.to_luma8();
        let output = adaptive_gaussian_threshold(&gray, params);

        Ok(Self {
            image: DynamicImage::ImageLuma8(output),
            format: self.format,
        })
    }

    /// Remove speckle left over from thresholding.
    #[instrument(skip(self))]
    pub fn denoise(self, method: DenoiseMethod) -> Self {
        info!(?method, "Denoising");
        let gray = self.image.to_luma8();
        Self {
            image: DynamicImage::ImageLuma8(denoise::apply(&gray, method)),
            format: self.format,
        }
    }

    /// Run the full pipeline:
    ///
    /// 1. Convert to grayscale
    /// 2. Adaptive Gaussian threshold (default block 11, c 2)
    /// 3. Denoise (default non-local means)
    #[instrument(skip_all)]
    pub fn run(self, config: &PreprocessConfig) -> Result<Self, PanscanError> {
        config.validate()?;
        Ok(self
            .grayscale()
            .adaptive_threshold(config.threshold)?
            .denoise(config.denoise))
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image in the format it was loaded from.
    ///
    /// Some encoders (GIF, for one) cannot take single-channel input; for
    /// those the image is widened to RGBA and encoded again.
    pub fn encode(&self) -> Result<Vec<u8>, PanscanError> {
        match encode_to_format(&self.image, self.format) {
            Ok(bytes) => Ok(bytes),
            Err(err) => {
                warn!(format = ?self.format, error = %err, "Encoder rejected grayscale; retrying as RGBA");
                encode_to_format(&DynamicImage::ImageRgba8(self.image.to_rgba8()), self.format)
            }
        }
    }
}

/// Preprocess the image at `path` and overwrite it with the result.
///
/// The original contents are not kept anywhere. Parameters are validated
/// before the file is read, so a bad configuration never touches the file.
#[instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn preprocess_in_place(
    path: impl AsRef<Path>,
    config: &PreprocessConfig,
) -> Result<PreprocessReport, PanscanError> {
    let path = path.as_ref();
    config.validate()?;

    let original = std::fs::read(path)?;
    let original_sha256 = hash_bytes(&original);

    let processed = Preprocessor::from_bytes(&original, ImageFormat::from_path(path).ok())?
        .run(config)?;
    let encoded = processed.encode()?;
    std::fs::write(path, &encoded)?;

    let report = PreprocessReport {
        width: processed.width(),
        height: processed.height(),
        format: processed.format(),
        original_sha256,
        processed_sha256: hash_bytes(&encoded),
    };
    debug!(
        original = %report.original_sha256,
        processed = %report.processed_sha256,
        bytes = encoded.len(),
        "Preprocessed image written back"
    );
    Ok(report)
}

// -- Thresholding helpers -----------------------------------------------------

/// Normalised 1-D Gaussian kernel of odd length `size`.
fn gaussian_kernel(size: u32, sigma: f32) -> Vec<f32> {
    let half = (size / 2) as i32;
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f32> = (-half..=half)
        .map(|i| (-((i * i) as f32) / denom).exp())
        .collect();
    let sum: f32 = kernel.iter().sum();
    for k in &mut kernel {
        *k /= sum;
    }
    kernel
}

/// Separable Gaussian blur with replicated borders, rounded back to 8 bits.
///
/// The blur runs on an `f32` copy so the horizontal pass is not clamped to
/// `u8` before the vertical one.
fn gaussian_mean(gray: &GrayImage, kernel: &[f32]) -> GrayImage {
    let (width, height) = gray.dimensions();
    let float: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(width, height, |x, y| Luma([gray.get_pixel(x, y).0[0] as f32]));
    let blurred = separable_filter_equal(&float, kernel);
    GrayImage::from_fn(width, height, |x, y| {
        Luma([blurred.get_pixel(x, y).0[0].round().clamp(0.0, 255.0) as u8])
    })
}

fn adaptive_gaussian_threshold(gray: &GrayImage, params: ThresholdParams) -> GrayImage {
    let (width, height) = gray.dimensions();
    let kernel = gaussian_kernel(params.block_size, params.sigma());
    let mean = gaussian_mean(gray, &kernel);

    GrayImage::from_fn(width, height, |x, y| {
        let src = gray.get_pixel(x, y).0[0] as i32;
        // White when the pixel sits above its local threshold (mean - c).
        if src - mean.get_pixel(x, y).0[0] as i32 > -params.c {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, PanscanError> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), format)
        .map_err(|err| PanscanError::Image(format!("{:?} encoding failed: {}", format, err)))?;
    Ok(buffer)
}

// -- Tests --------------------------------------------------------------------
