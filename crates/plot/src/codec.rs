//! Raster codec adapter between wire [`Image`]s and in-memory pixel buffers.

use std::{io::Cursor, path::Path};

use image::DynamicImage;
use strum::{Display, EnumString, IntoStaticStr};

use crate::{
    error::{PlotError, Result},
    types::Image,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
#[strum(ascii_case_insensitive)]
pub enum ImageFormat {
    #[strum(serialize = "png")]
    Png,
    #[strum(to_string = "jpeg", serialize = "jpg")]
    Jpeg,
}

impl ImageFormat {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        extension
            .parse()
            .map_err(|_| PlotError::UnsupportedFormat(extension.to_string()))
    }

    fn codec(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

/// Decode encoded bytes into a pixel buffer.
///
/// An empty `format` sniffs the encoding from the bytes.
pub fn decode(data: &[u8], format: &str) -> Result<DynamicImage> {
    if data.is_empty() {
        return Err(PlotError::EmptyImage);
    }

    let format = format.trim();
    if format.is_empty() {
        return Ok(image::load_from_memory(data)?);
    }

    let format: ImageFormat = format
        .parse()
        .map_err(|_| PlotError::UnsupportedFormat(format.to_string()))?;
    Ok(image::load_from_memory_with_format(data, format.codec())?)
}

/// Encode a pixel buffer. PNG is lossless; JPEG drops any alpha channel.
pub fn encode(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut cursor = Cursor::new(&mut buffer);

    let written = match format {
        ImageFormat::Png => image.write_to(&mut cursor, format.codec()),
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8()).write_to(&mut cursor, format.codec()),
    };
    written.map_err(PlotError::Encode)?;

    Ok(buffer)
}

impl Image {
    /// Encode a pixel buffer into a wire image with its real dimensions.
    pub fn from_dynamic(image: &DynamicImage, format: ImageFormat, label: Option<String>) -> Result<Self> {
        Ok(Self {
            data: encode(image, format)?,
            format: format.to_string(),
            width: image.width(),
            height: image.height(),
            label,
        })
    }

    /// Read an encoded image file as-is, declaring the dimensions it decodes to.
    pub fn from_path<P: AsRef<Path>>(path: P, label: Option<String>) -> Result<Self> {
        let path = path.as_ref();
        let format = ImageFormat::from_path(path)?;
        let data = std::fs::read(path)?;
        let decoded = decode(&data, format.into())?;

        Ok(Self {
            data,
            format: format.to_string(),
            width: decoded.width(),
            height: decoded.height(),
            label,
        })
    }

    pub fn decode(&self) -> Result<DynamicImage> {
        decode(&self.data, &self.format)
    }

    /// Declared dimensions must match the decoded buffer. A declaration of
    /// 0x0 means the sender did not know them.
    pub fn check_dimensions(&self, decoded: &DynamicImage) -> Result<()> {
        if self.width == 0 && self.height == 0 {
            return Ok(());
        }
        if self.width != decoded.width() || self.height != decoded.height() {
            return Err(PlotError::DimensionMismatch {
                declared_width: self.width,
                declared_height: self.height,
                actual_width: decoded.width(),
                actual_height: decoded.height(),
            });
        }
        Ok(())
    }
}
