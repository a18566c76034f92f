pub mod builder;

use image::GrayImage;
use tracing::debug;
use crate::{
    error::Result,
    traits::{ImagePreprocessor, ContourExtractor, PolygonApproximator, PolygonFilter},
    types::Polygon,
};

/// Polygons kept by a pipeline run plus the counts reported in the stats
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub polygons: Vec<Polygon>,
    pub contours_found: u32,
    pub contours_filtered: u32,
}

/// Linear extraction pipeline: preprocess, trace, approximate, filter
pub struct Pipeline {
    preprocessors: Vec<Box<dyn ImagePreprocessor>>,
    contour_extractor: Box<dyn ContourExtractor>,
    approximator: Box<dyn PolygonApproximator>,
    filters: Vec<Box<dyn PolygonFilter>>,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    pub fn new(
        preprocessors: Vec<Box<dyn ImagePreprocessor>>,
        contour_extractor: Box<dyn ContourExtractor>,
        approximator: Box<dyn PolygonApproximator>,
        filters: Vec<Box<dyn PolygonFilter>>,
    ) -> Self {
        Self {
            preprocessors,
            contour_extractor,
            approximator,
            filters,
        }
    }

    /// Run a single-channel image through every stage
    pub fn process(&self, image: &GrayImage) -> Result<Extraction> {
        let mut processed_image = image.clone();
        for preprocessor in &self.preprocessors {
            processed_image = preprocessor.preprocess(&processed_image)?;
        }

        let contours = self.contour_extractor.extract_contours(&processed_image)?;
        let contours_found = contours.len() as u32;

        let polygons: Vec<Polygon> = contours
            .iter()
            .filter_map(|contour| self.approximator.approximate(contour))
            .filter(|polygon| self.filters.iter().all(|filter| filter.keep(polygon)))
            .collect();

        debug!(
            contours_found,
            polygons = polygons.len(),
            "pipeline finished"
        );

        Ok(Extraction {
            contours_filtered: polygons.len() as u32,
            polygons,
            contours_found,
        })
    }

    /// Get information about the pipeline configuration
    pub fn info(&self) -> String {
        format!(
            "Pipeline: {} preprocessors, 1 contour extractor, 1 approximator, {} filters",
            self.preprocessors.len(),
            self.filters.len()
        )
    }
}
