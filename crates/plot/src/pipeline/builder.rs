use tracing::debug;

use crate::{
    error::Result,
    pipeline::Pipeline,
    traits::{ImagePreprocessor, ContourExtractor, PolygonApproximator, PolygonFilter},
    types::ExtractionConfig,
    algorithms::{
        AreaFilter,
        CannyPreprocessor,
        DouglasPeuckerApproximator,
        GaussianBlurPreprocessor,
        ImageprocContourExtractor,
        MorphologyOp,
        MorphologyPreprocessor,
        ThresholdPreprocessor,
        ThresholdType,
    },
};

/// Builder for creating processing pipelines with a fluent API
pub struct PipelineBuilder {
    preprocessors: Vec<Box<dyn ImagePreprocessor>>,
    contour_extractor: Option<Box<dyn ContourExtractor>>,
    approximator: Option<Box<dyn PolygonApproximator>>,
    filters: Vec<Box<dyn PolygonFilter>>,
}

impl PipelineBuilder {
    /// Empty builder; `build` fills in the default extractor and approximator
    pub fn new() -> Self {
        Self {
            preprocessors: Vec::new(),
            contour_extractor: None,
            approximator: None,
            filters: Vec::new(),
        }
    }

    /// Add a preprocessor to the pipeline
    pub fn add_preprocessor<P>(mut self, preprocessor: P) -> Self
    where
        P: ImagePreprocessor + 'static,
    {
        self.preprocessors.push(Box::new(preprocessor));
        self
    }

    /// Set the contour extractor (replaces any existing one)
    pub fn set_contour_extractor<E>(mut self, extractor: E) -> Self
    where
        E: ContourExtractor + 'static,
    {
        self.contour_extractor = Some(Box::new(extractor));
        self
    }

    /// Set the polygon approximator (replaces any existing one)
    pub fn set_approximator<A>(mut self, approximator: A) -> Self
    where
        A: PolygonApproximator + 'static,
    {
        self.approximator = Some(Box::new(approximator));
        self
    }

    /// Add a polygon filter; a polygon must pass every filter
    pub fn add_filter<F>(mut self, filter: F) -> Self
    where
        F: PolygonFilter + 'static,
    {
        self.filters.push(Box::new(filter));
        self
    }

    /// Gaussian blur, sized like an OpenCV kernel
    pub fn with_blur(self, kernel_size: f64) -> Self {
        self.add_preprocessor(GaussianBlurPreprocessor { kernel_size })
    }

    /// Threshold at a fixed level, or Otsu's level for [`ThresholdType::Otsu`]
    pub fn with_threshold(self, threshold: u8, kind: ThresholdType) -> Self {
        self.add_preprocessor(ThresholdPreprocessor { threshold, kind })
    }

    /// Canny edge detection; an inverted pair is swapped
    pub fn with_canny(self, low: f32, high: f32) -> Self {
        self.add_preprocessor(CannyPreprocessor { low, high })
    }

    /// Closing and/or opening with a square element of `kernel_size`
    pub fn with_morphology(self, kernel_size: i32, operations: Vec<MorphologyOp>) -> Self {
        self.add_preprocessor(MorphologyPreprocessor { kernel_size, operations })
    }

    /// Keep polygons with `min_area <= area`, and `area <= max_area` when `max_area > 0`
    pub fn with_area_bounds(self, min_area: f64, max_area: f64) -> Self {
        self.add_filter(AreaFilter { min_area, max_area })
    }

    /// Build the pipeline with default components if not specified
    pub fn build(self) -> Pipeline {
        let contour_extractor = self.contour_extractor
            .unwrap_or_else(|| Box::new(ImageprocContourExtractor));

        let approximator = self.approximator
            .unwrap_or_else(|| Box::new(DouglasPeuckerApproximator::default()));

        Pipeline::new(
            self.preprocessors,
            contour_extractor,
            approximator,
            self.filters,
        )
    }

    /// Build the stage sequence an [`ExtractionConfig`] describes.
    ///
    /// The config is resolved first, so partial configs are accepted.
    pub fn from_config(config: &ExtractionConfig) -> Result<Pipeline> {
        let config = config.resolve();
        let blur = GaussianBlurPreprocessor { kernel_size: config.blur_kernel_size };
        blur.check()?;
        let mut builder = Self::new().add_preprocessor(blur);

        // Edges are one pixel wide, an opening would erase them
        let morphology_ops = if config.canny_enabled() {
            builder = builder.with_canny(config.canny_low as f32, config.canny_high as f32);
            vec![MorphologyOp::Close]
        } else {
            let kind = ThresholdType::try_from(config.threshold_type)?;
            let threshold = config.threshold_value.clamp(0, u8::MAX as i32) as u8;
            debug!(%kind, threshold, "threshold stage");
            builder = builder.with_threshold(threshold, kind);
            vec![MorphologyOp::Close, MorphologyOp::Open]
        };

        if config.morphology_enabled() {
            builder = builder.with_morphology(config.morph_kernel_size, morphology_ops);
        }

        Ok(builder
            .set_approximator(DouglasPeuckerApproximator {
                epsilon_factor: config.epsilon_factor,
            })
            .with_area_bounds(config.min_area, config.max_area)
            .build())
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    pub fn from_config(config: &ExtractionConfig) -> Result<Pipeline> {
        PipelineBuilder::from_config(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{algorithms::intensity_image, error::PlotError};
    use image::{DynamicImage, GrayImage, Rgb, RgbImage};

    /// Black canvas with a filled red rectangle from (25,25) to (75,75)
    fn red_square() -> GrayImage {
        let mut img = RgbImage::new(100, 100);
        for y in 25..=75 {
            for x in 25..=75 {
                img.put_pixel(x, y, Rgb([255, 0, 0]));
            }
        }
        intensity_image(&DynamicImage::ImageRgb8(img))
    }

    /// Several white blocks of growing size
    fn blocks() -> GrayImage {
        let mut img = RgbImage::new(200, 60);
        for (i, side) in [8u32, 14, 22, 30].into_iter().enumerate() {
            let x0 = 10 + i as u32 * 45;
            for y in 10..10 + side {
                for x in x0..x0 + side {
                    img.put_pixel(x, y, Rgb([255, 255, 255]));
                }
            }
        }
        intensity_image(&DynamicImage::ImageRgb8(img))
    }

    #[test]
    fn test_default_pipeline_finds_red_square() {
        let pipeline = Pipeline::from_config(&ExtractionConfig::default()).unwrap();
        let extraction = pipeline.process(&red_square()).unwrap();

        assert!(extraction.contours_found >= 1);
        assert!(extraction.contours_filtered >= 1);
        assert_eq!(extraction.contours_filtered as usize, extraction.polygons.len());

        let square = extraction
            .polygons
            .iter()
            .find(|p| (p.area - 2500.0).abs() < 150.0)
            .expect("a polygon close to 2500 px²");
        assert!((square.centroid.x - 50.0).abs() < 2.0);
        assert!((square.centroid.y - 50.0).abs() < 2.0);
        assert!(square.vertices.len() >= 3);
    }

    #[test]
    fn test_black_image_yields_nothing() {
        let pipeline = Pipeline::from_config(&ExtractionConfig::default()).unwrap();
        let extraction = pipeline.process(&GrayImage::new(50, 50)).unwrap();

        assert_eq!(extraction.contours_found, 0);
        assert_eq!(extraction.contours_filtered, 0);
        assert!(extraction.polygons.is_empty());
    }

    #[test]
    fn test_min_area_is_monotonic() {
        let image = blocks();
        let mut previous = u32::MAX;

        for min_area in [1.0, 50.0, 150.0, 300.0, 600.0, 1000.0] {
            let config = ExtractionConfig {
                min_area,
                ..Default::default()
            };
            let kept = Pipeline::from_config(&config)
                .unwrap()
                .process(&image)
                .unwrap()
                .contours_filtered;

            assert!(kept <= previous, "min_area {min_area} kept {kept} > {previous}");
            previous = kept;
        }
    }

    #[test]
    fn test_max_area_caps_polygons() {
        let config = ExtractionConfig {
            min_area: 1.0,
            max_area: 300.0,
            ..Default::default()
        };
        let extraction = Pipeline::from_config(&config).unwrap().process(&blocks()).unwrap();

        assert!(!extraction.polygons.is_empty());
        assert!(extraction.polygons.iter().all(|p| p.area <= 300.0));
    }

    #[test]
    fn test_inverted_threshold_on_black_image_is_one_region() {
        let config = ExtractionConfig {
            threshold_type: 1,
            ..Default::default()
        };
        let extraction = Pipeline::from_config(&config)
            .unwrap()
            .process(&GrayImage::new(50, 50))
            .unwrap();

        assert_eq!(extraction.contours_filtered, 1);
        assert!(extraction.polygons[0].area > 2000.0);
    }

    #[test]
    fn test_canny_path_traces_edges() {
        let config = ExtractionConfig {
            use_canny: Some(true),
            ..Default::default()
        };
        let extraction = Pipeline::from_config(&config).unwrap().process(&red_square()).unwrap();

        assert!(extraction.contours_found >= 1);
        assert!(extraction.polygons.iter().any(|p| p.area > 1500.0));
    }

    #[test]
    fn test_unknown_threshold_type_is_rejected() {
        let config = ExtractionConfig {
            threshold_type: 5,
            ..Default::default()
        };
        assert!(matches!(
            Pipeline::from_config(&config),
            Err(PlotError::UnsupportedThresholdType(5))
        ));
    }

    #[test]
    fn test_oversized_blur_kernel_fails_before_processing() {
        let config = ExtractionConfig {
            blur_kernel_size: 1.0e13,
            ..Default::default()
        };
        assert!(matches!(
            Pipeline::from_config(&config),
            Err(PlotError::KernelTooLarge { .. })
        ));
    }

    #[test]
    fn test_stage_count_follows_config() {
        let full = Pipeline::from_config(&ExtractionConfig::default()).unwrap();
        assert!(full.info().starts_with("Pipeline: 3 preprocessors"));

        let bare = Pipeline::from_config(&ExtractionConfig {
            apply_morphology: Some(false),
            ..Default::default()
        })
        .unwrap();
        assert!(bare.info().starts_with("Pipeline: 2 preprocessors"));
    }
}
