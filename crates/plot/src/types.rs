use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};
use ts_rs::TS;

/// Encoded floor-plan raster as it travels on the wire
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
pub struct Image {
    #[serde(with = "base64_data")]
    #[schemars(with = "String", description = "Base64 encoded PNG or JPEG bytes")]
    #[ts(type = "string")]
    pub data: Vec<u8>,
    #[serde(default)]
    #[schemars(description = "Encoding of `data`: png, jpeg or jpg. Empty means detect from the bytes")]
    pub format: String,
    #[serde(default)]
    #[schemars(description = "Declared width in pixels, 0 if unknown")]
    pub width: u32,
    #[serde(default)]
    #[schemars(description = "Declared height in pixels, 0 if unknown")]
    pub height: u32,
    #[serde(default)]
    pub label: Option<String>,
}

/// Tuning parameters for polygon extraction.
///
/// Every numeric field left at zero (or negative) falls back to its default
/// when resolved; boolean fields are only defaulted when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
#[serde(default)]
#[ts(export)]
pub struct ExtractionConfig {
    #[schemars(description = "Gaussian blur kernel size in pixels (default 5)")]
    pub blur_kernel_size: f64,
    #[schemars(description = "Binary threshold level 0-255 (default 127)")]
    pub threshold_value: i32,
    #[schemars(description = "0 binary, 1 binary inverted, 2 truncate, 3 to zero, 4 to zero inverted, 8 otsu")]
    pub threshold_type: i32,
    #[schemars(description = "Minimum polygon area in square pixels (default 100)")]
    pub min_area: f64,
    #[schemars(description = "Maximum polygon area in square pixels, 0 for unbounded")]
    pub max_area: f64,
    #[schemars(description = "Approximation tolerance as a fraction of the contour perimeter (default 0.01)")]
    pub epsilon_factor: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Apply closing/opening to the binary image (default true)")]
    pub apply_morphology: Option<bool>,
    #[schemars(description = "Morphology kernel size in pixels (default 5)")]
    pub morph_kernel_size: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Use Canny edge detection instead of thresholding (default false)")]
    pub use_canny: Option<bool>,
    #[schemars(description = "Canny low threshold (default 50)")]
    pub canny_low: i32,
    #[schemars(description = "Canny high threshold (default 150)")]
    pub canny_high: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A labeled region (room, merchant boundary) found on a floor plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
pub struct Polygon {
    /// Vertices in contour order, not closed
    pub vertices: Vec<Point>,
    #[serde(default)]
    pub label: String,
    /// Area in square pixels
    pub area: f64,
    pub centroid: Point,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
pub struct ProcessingStats {
    pub contours_found: u32,
    pub contours_filtered: u32,
    pub processing_time_ms: f64,
    pub image_width: u32,
    pub image_height: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
pub struct ExtractPolygonsRequest {
    #[schemars(description = "Building or mall identifier")]
    pub entity_id: String,
    #[schemars(description = "Floor identifier, e.g. \"1\" or \"B1\"")]
    pub floor_id: String,
    pub floor_plan: Option<Image>,
    #[serde(default)]
    pub config: Option<ExtractionConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
pub struct ExtractPolygonsResponse {
    pub polygons: Vec<Polygon>,
    pub total_count: u32,
    /// Empty on success
    pub error: String,
    pub stats: ProcessingStats,
}

impl ExtractPolygonsResponse {
    pub fn success(polygons: Vec<Polygon>, stats: ProcessingStats) -> Self {
        Self {
            total_count: polygons.len() as u32,
            polygons,
            error: String::new(),
            stats,
        }
    }

    /// A failed extraction never carries polygons.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            polygons: Vec::new(),
            total_count: 0,
            error: error.into(),
            stats: ProcessingStats::default(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
pub struct FloorPlanInput {
    pub floor_id: String,
    pub floor_plan: Option<Image>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
pub struct BatchExtractRequest {
    pub entity_id: String,
    #[serde(default)]
    pub floor_plans: Vec<FloorPlanInput>,
    #[serde(default)]
    pub config: Option<ExtractionConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
pub struct FloorExtraction {
    pub floor_id: String,
    pub polygons: Vec<Polygon>,
    pub total_count: u32,
    pub error: String,
    pub stats: ProcessingStats,
}

impl FloorExtraction {
    pub fn new(floor_id: impl Into<String>, response: ExtractPolygonsResponse) -> Self {
        Self {
            floor_id: floor_id.into(),
            polygons: response.polygons,
            total_count: response.total_count,
            error: response.error,
            stats: response.stats,
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
pub struct BatchExtractResponse {
    pub extractions: Vec<FloorExtraction>,
    pub successful: u32,
    pub failed: u32,
}

impl FromIterator<FloorExtraction> for BatchExtractResponse {
    fn from_iter<I: IntoIterator<Item = FloorExtraction>>(iter: I) -> Self {
        let extractions: Vec<FloorExtraction> = iter.into_iter().collect();
        let successful = extractions.iter().filter(|e| e.is_success()).count() as u32;
        let failed = extractions.len() as u32 - successful;
        Self {
            extractions,
            successful,
            failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, TS)]
#[ts(export)]
pub struct HealthCheckResponse {
    pub healthy: bool,
    pub version: String,
    pub message: String,
}

/// Status carried next to a response body, independent of the transport
#[derive(
    Debug, Clone, Copy, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, IntoStaticStr,
    PartialEq, Eq
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StatusCode {
    #[default]
    Ok,
    InvalidArgument,
    Internal,
}

/// Response body plus the status the transport should report
#[derive(Debug, Clone, PartialEq)]
pub struct Reply<T> {
    pub status: StatusCode,
    pub body: T,
}

impl<T> Reply<T> {
    pub fn ok(body: T) -> Self {
        Self { status: StatusCode::Ok, body }
    }

    pub fn with_status(status: StatusCode, body: T) -> Self {
        Self { status, body }
    }

    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::Ok
    }
}

mod base64_data {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(data))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded.as_bytes()).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floor(floor_id: &str, error: &str) -> FloorExtraction {
        FloorExtraction {
            floor_id: floor_id.to_string(),
            error: error.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_image_data_is_base64_on_the_wire() {
        let image = Image {
            data: vec![0x89, b'P', b'N', b'G'],
            format: "png".to_string(),
            width: 1,
            height: 1,
            label: None,
        };

        let json = serde_json::to_value(&image).unwrap();
        assert_eq!(json["data"], "iVBORw==");

        let parsed: Image = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, image);
    }

    #[test]
    fn test_partial_config_deserializes_with_missing_fields() {
        let config: ExtractionConfig =
            serde_json::from_str(r#"{ "min_area": 250.0, "use_canny": true }"#).unwrap();

        assert_eq!(config.min_area, 250.0);
        assert_eq!(config.use_canny, Some(true));
        assert_eq!(config.apply_morphology, None);
        assert_eq!(config.threshold_value, 0);
    }

    #[test]
    fn test_failure_response_has_no_polygons() {
        let response = ExtractPolygonsResponse::failure("boom");
        assert!(!response.is_success());
        assert_eq!(response.total_count, 0);
        assert!(response.polygons.is_empty());
    }

    #[test]
    fn test_batch_counters_partition_by_error() {
        let batch: BatchExtractResponse =
            vec![floor("1", ""), floor("2", "bad"), floor("3", "")].into_iter().collect();

        assert_eq!(batch.successful, 2);
        assert_eq!(batch.failed, 1);
        assert_eq!(batch.extractions.len(), 3);
        assert_eq!(batch.extractions[1].floor_id, "2");
    }

    #[test]
    fn test_empty_batch_counters() {
        let batch: BatchExtractResponse = Vec::<FloorExtraction>::new().into_iter().collect();
        assert_eq!(batch.successful + batch.failed, 0);
    }

    #[test]
    fn test_status_code_names() {
        assert_eq!(StatusCode::InvalidArgument.to_string(), "invalid_argument");
        assert_eq!(
            serde_json::to_string(&StatusCode::Internal).unwrap(),
            "\"internal\""
        );
    }
}
