use image::GrayImage;
use crate::{error::Result, traits::{Contour, ContourExtractor}};

/// Imageproc-based contour extractor (border following, outer borders and holes)
#[derive(Debug, Clone, Default)]
pub struct ImageprocContourExtractor;

impl ContourExtractor for ImageprocContourExtractor {
    fn extract_contours(&self, binary_image: &GrayImage) -> Result<Vec<Contour>> {
        let contours = imageproc::contours::find_contours::<i32>(binary_image);

        let result = contours
            .into_iter()
            .map(|contour| {
                contour.points
                    .iter()
                    .map(|p| [p.x as f64, p.y as f64])
                    .collect()
            })
            .collect();

        Ok(result)
    }
}
