use thiserror::Error;

use crate::types::StatusCode;

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Failed to decode floor plan image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Failed to decode floor plan image: empty buffer")]
    EmptyImage,

    #[error("Failed to decode floor plan image: unsupported format '{0}'")]
    UnsupportedFormat(String),

    #[error("Failed to encode image: {0}")]
    Encode(image::ImageError),

    #[error("Image dimensions mismatch: declared {declared_width}x{declared_height}, decoded {actual_width}x{actual_height}")]
    DimensionMismatch {
        declared_width: u32,
        declared_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("Floor plan image is required")]
    MissingFloorPlan,

    #[error("Unsupported threshold type: {0}")]
    UnsupportedThresholdType(i32),

    #[error("Blur kernel size {kernel_size} exceeds the maximum of {max}")]
    KernelTooLarge { kernel_size: f64, max: f64 },

    #[error("Error during polygon extraction: {0}")]
    Internal(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
}

impl PlotError {
    /// Decode failures are recovered into the response body only.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Self::Decode(_) | Self::EmptyImage | Self::UnsupportedFormat(_)
        )
    }

    /// Transport-level status that accompanies this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Decode(_) | Self::EmptyImage | Self::UnsupportedFormat(_) => StatusCode::Ok,
            Self::DimensionMismatch { .. }
            | Self::MissingFloorPlan
            | Self::UnsupportedThresholdType(_)
            | Self::KernelTooLarge { .. } => StatusCode::InvalidArgument,
            _ => StatusCode::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, PlotError>;
