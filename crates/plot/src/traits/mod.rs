use image::GrayImage;
use crate::{error::Result, types::Polygon};

/// A traced boundary in contour order, as pixel coordinates
pub type Contour = Vec<[f64; 2]>;

/// Trait for image preprocessing stages (blur, threshold, edges, morphology)
pub trait ImagePreprocessor: Send + Sync {
    fn preprocess(&self, image: &GrayImage) -> Result<GrayImage>;
}

/// Trait for contour extraction algorithms
pub trait ContourExtractor: Send + Sync {
    /// Trace every closed boundary between foreground and background
    fn extract_contours(&self, binary_image: &GrayImage) -> Result<Vec<Contour>>;
}

/// Trait for turning a raw contour into a simplified polygon
pub trait PolygonApproximator: Send + Sync {
    /// `None` when the contour collapses below three vertices
    fn approximate(&self, contour: &Contour) -> Option<Polygon>;
}

/// Trait for dropping polygons after approximation
pub trait PolygonFilter: Send + Sync {
    fn keep(&self, polygon: &Polygon) -> bool;
}
