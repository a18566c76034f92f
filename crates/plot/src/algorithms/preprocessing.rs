use image::{DynamicImage, GrayImage, Luma};
use imageproc::distance_transform::Norm;
use strum::Display;
use crate::{
    config::MAX_BLUR_KERNEL_SIZE,
    error::{PlotError, Result},
    traits::ImagePreprocessor,
};

/// Single-channel intensity: the brightest of the three colour channels.
///
/// Saturated fills (merchant areas drawn in red, blue, ...) therefore count as
/// bright, the same as white rooms.
pub fn intensity_image(image: &DynamicImage) -> GrayImage {
    let rgb = image.to_rgb8();
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        Luma([r.max(g).max(b)])
    })
}

/// Gaussian blur parameterised by kernel size
#[derive(Debug, Clone)]
pub struct GaussianBlurPreprocessor {
    pub kernel_size: f64,
}

impl GaussianBlurPreprocessor {
    /// Reject kernels above [`MAX_BLUR_KERNEL_SIZE`]; the Gaussian kernel grows
    /// linearly with the size and is allocated up front.
    pub fn check(&self) -> Result<()> {
        if self.kernel_size.is_finite() && self.kernel_size <= MAX_BLUR_KERNEL_SIZE {
            Ok(())
        } else {
            Err(PlotError::KernelTooLarge {
                kernel_size: self.kernel_size,
                max: MAX_BLUR_KERNEL_SIZE,
            })
        }
    }

    /// Sigma for an odd kernel size, the same relation OpenCV uses when sigma is 0.
    pub fn sigma(&self) -> Option<f32> {
        let mut k = self.kernel_size.round() as i64;
        if k % 2 == 0 {
            k += 1;
        }
        if k <= 1 {
            return None;
        }
        Some((0.3 * ((k - 1) as f64 * 0.5 - 1.0) + 0.8) as f32)
    }
}

impl ImagePreprocessor for GaussianBlurPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        self.check()?;
        match self.sigma() {
            Some(sigma) => Ok(imageproc::filter::gaussian_blur_f32(image, sigma)),
            None => Ok(image.clone()),
        }
    }
}

/// Threshold modes, by their numeric code: 0-4 fixed level, 8 Otsu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ThresholdType {
    Binary,
    BinaryInv,
    Trunc,
    ToZero,
    ToZeroInv,
    /// Binary with the level picked by Otsu's method
    Otsu,
}

impl TryFrom<i32> for ThresholdType {
    type Error = PlotError;

    fn try_from(value: i32) -> Result<Self> {
        match value {
            0 => Ok(Self::Binary),
            1 => Ok(Self::BinaryInv),
            2 => Ok(Self::Trunc),
            3 => Ok(Self::ToZero),
            4 => Ok(Self::ToZeroInv),
            8 => Ok(Self::Otsu),
            other => Err(PlotError::UnsupportedThresholdType(other)),
        }
    }
}

/// Fixed-level thresholding
#[derive(Debug, Clone)]
pub struct ThresholdPreprocessor {
    pub threshold: u8,
    pub kind: ThresholdType,
}

impl Default for ThresholdPreprocessor {
    fn default() -> Self {
        Self {
            threshold: 127,
            kind: ThresholdType::Binary,
        }
    }
}

impl ImagePreprocessor for ThresholdPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        let level = match self.kind {
            ThresholdType::Otsu => imageproc::contrast::otsu_level(image),
            _ => self.threshold,
        };

        let mut output = image.clone();
        for pixel in output.pixels_mut() {
            let value = pixel.0[0];
            let above = value > level;
            pixel.0[0] = match self.kind {
                ThresholdType::Binary | ThresholdType::Otsu => if above { 255 } else { 0 },
                ThresholdType::BinaryInv => if above { 0 } else { 255 },
                ThresholdType::Trunc => if above { level } else { value },
                ThresholdType::ToZero => if above { value } else { 0 },
                ThresholdType::ToZeroInv => if above { 0 } else { value },
            };
        }
        Ok(output)
    }
}

/// Canny edge detector; edges come out as 255 on 0
#[derive(Debug, Clone)]
pub struct CannyPreprocessor {
    pub low: f32,
    pub high: f32,
}

impl ImagePreprocessor for CannyPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        let (low, high) = if self.low <= self.high {
            (self.low, self.high)
        } else {
            (self.high, self.low)
        };
        Ok(imageproc::edges::canny(image, low, high))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphologyOp {
    /// Dilate then erode, bridging small gaps
    Close,
    /// Erode then dilate, removing specks
    Open,
}

/// Morphological closing/opening with a square structuring element
#[derive(Debug, Clone)]
pub struct MorphologyPreprocessor {
    pub kernel_size: i32,
    pub operations: Vec<MorphologyOp>,
}

impl MorphologyPreprocessor {
    /// Half the kernel size, capped at `u8::MAX`
    pub fn radius(&self) -> u8 {
        (self.kernel_size.max(0) / 2).min(u8::MAX as i32) as u8
    }
}

impl ImagePreprocessor for MorphologyPreprocessor {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage> {
        let radius = self.radius();
        if radius == 0 {
            return Ok(image.clone());
        }

        let mut output = image.clone();
        for op in &self.operations {
            output = match op {
                MorphologyOp::Close => imageproc::morphology::close(&output, Norm::LInf, radius),
                MorphologyOp::Open => imageproc::morphology::open(&output, Norm::LInf, radius),
            };
        }
        Ok(output)
    }
}
