//! Single-image extraction: decode, run the configured pipeline, report stats.

use std::time::Instant;

use tracing::{debug, warn};

use crate::{
    algorithms::intensity_image,
    error::Result,
    pipeline::Pipeline,
    types::{ExtractPolygonsResponse, ExtractionConfig, Image, ProcessingStats},
};

/// Extract polygons from an encoded floor plan.
///
/// Errors keep their variant so callers can pick a transport status with
/// [`PlotError::status`](crate::PlotError::status).
pub fn try_extract(image: &Image, config: &ExtractionConfig) -> Result<ExtractPolygonsResponse> {
    let started = Instant::now();

    let decoded = image.decode()?;
    image.check_dimensions(&decoded)?;

    let pipeline = Pipeline::from_config(config)?;
    debug!("{}", pipeline.info());

    let extraction = pipeline.process(&intensity_image(&decoded))?;

    let stats = ProcessingStats {
        contours_found: extraction.contours_found,
        contours_filtered: extraction.contours_filtered,
        processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
        image_width: decoded.width(),
        image_height: decoded.height(),
    };

    Ok(ExtractPolygonsResponse::success(extraction.polygons, stats))
}

/// Like [`try_extract`] but folds every error into the response body.
pub fn extract(image: &Image, config: &ExtractionConfig) -> ExtractPolygonsResponse {
    match try_extract(image, config) {
        Ok(response) => response,
        Err(err) => {
            warn!(error = %err, "extraction failed");
            ExtractPolygonsResponse::failure(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{codec::ImageFormat, error::PlotError};
    use image::{DynamicImage, Rgb, RgbImage};

    fn red_square_png() -> Image {
        let mut img = RgbImage::new(100, 100);
        for y in 25..=75 {
            for x in 25..=75 {
                img.put_pixel(x, y, Rgb([255, 0, 0]));
            }
        }
        Image::from_dynamic(&DynamicImage::ImageRgb8(img), ImageFormat::Png, None).unwrap()
    }

    #[test]
    fn test_stats_echo_decoded_dimensions() {
        let response = extract(&red_square_png(), &ExtractionConfig::default());

        assert!(response.is_success(), "{}", response.error);
        assert_eq!(response.total_count as usize, response.polygons.len());
        assert_eq!(response.stats.image_width, 100);
        assert_eq!(response.stats.image_height, 100);
        assert_eq!(response.stats.contours_filtered, response.total_count);
        assert!(response.stats.processing_time_ms >= 0.0);
    }

    #[test]
    fn test_unknown_dimensions_are_accepted() {
        let mut image = red_square_png();
        image.width = 0;
        image.height = 0;

        let response = extract(&image, &ExtractionConfig::default());
        assert!(response.is_success());
        assert_eq!(response.stats.image_width, 100);
    }

    #[test]
    fn test_garbage_bytes_fold_into_body() {
        let image = Image {
            data: b"definitely not a png".to_vec(),
            format: "png".into(),
            ..Default::default()
        };

        assert!(try_extract(&image, &ExtractionConfig::default())
            .unwrap_err()
            .is_decode_error());

        let response = extract(&image, &ExtractionConfig::default());
        assert_eq!(response.total_count, 0);
        assert!(response.polygons.is_empty());
        assert!(response.error.starts_with("Failed to decode floor plan image"));
        assert_eq!(response.stats, ProcessingStats::default());
    }

    #[test]
    fn test_declared_dimensions_must_match() {
        let mut image = red_square_png();
        image.width = 64;

        let err = try_extract(&image, &ExtractionConfig::default()).unwrap_err();
        assert!(matches!(err, PlotError::DimensionMismatch { declared_width: 64, .. }));
    }
}
