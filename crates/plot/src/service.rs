//! Transport-neutral service surface shared by the MCP server and the CLI.

use std::{
    any::Any,
    panic::{self, AssertUnwindSafe},
};

use tracing::{error, info, warn};

use crate::{
    error::{PlotError, Result},
    extractor::try_extract,
    types::{
        BatchExtractRequest, BatchExtractResponse, ExtractPolygonsRequest,
        ExtractPolygonsResponse, ExtractionConfig, FloorExtraction, FloorPlanInput,
        HealthCheckResponse, Reply, StatusCode,
    },
};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const HEALTH_MESSAGE: &str = "PlotService is running";

/// Polygon extraction operations, each answering with a [`Reply`].
pub trait PlotService: Send + Sync + 'static {
    fn extract_polygons(&self, request: &ExtractPolygonsRequest) -> Reply<ExtractPolygonsResponse>;

    /// Extract one floor of a batch. Never fails; the error lands in the body.
    fn extract_floor(&self, entity_id: &str, floor: &FloorPlanInput, config: Option<&ExtractionConfig>) -> FloorExtraction {
        let request = ExtractPolygonsRequest {
            entity_id: entity_id.to_string(),
            floor_id: floor.floor_id.clone(),
            floor_plan: floor.floor_plan.clone(),
            config: config.cloned(),
        };
        FloorExtraction::new(floor.floor_id.clone(), self.extract_polygons(&request).body)
    }

    /// Floors are processed one after another and independently.
    fn batch_extract(&self, request: &BatchExtractRequest) -> Reply<BatchExtractResponse> {
        info!(
            entity_id = %request.entity_id,
            floors = request.floor_plans.len(),
            "batch extraction"
        );
        let response: BatchExtractResponse = request
            .floor_plans
            .iter()
            .map(|floor| self.extract_floor(&request.entity_id, floor, request.config.as_ref()))
            .collect();
        Reply::ok(response)
    }

    fn health_check(&self) -> HealthCheckResponse;
}

/// Stateless [`PlotService`]; each call builds its pipeline from the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlotServer;

impl PlotServer {
    pub fn new() -> Self {
        Self
    }
}

impl PlotService for PlotServer {
    fn extract_polygons(&self, request: &ExtractPolygonsRequest) -> Reply<ExtractPolygonsResponse> {
        info!(
            entity_id = %request.entity_id,
            floor_id = %request.floor_id,
            "extracting polygons"
        );

        let Some(image) = request.floor_plan.as_ref() else {
            return failure_reply(PlotError::MissingFloorPlan);
        };
        let config = request.config.clone().unwrap_or_default();

        match guarded(|| try_extract(image, &config)) {
            Ok(response) => {
                info!(
                    floor_id = %request.floor_id,
                    polygons = response.total_count,
                    elapsed_ms = response.stats.processing_time_ms,
                    "extraction finished"
                );
                Reply::ok(response)
            }
            Err(err) => failure_reply(err),
        }
    }

    fn health_check(&self) -> HealthCheckResponse {
        HealthCheckResponse {
            healthy: true,
            version: VERSION.to_string(),
            message: HEALTH_MESSAGE.to_string(),
        }
    }
}

/// Mirror an error into both the status and the body
pub(crate) fn failure_reply(err: PlotError) -> Reply<ExtractPolygonsResponse> {
    let status = err.status();
    match status {
        StatusCode::Ok => warn!(error = %err, "floor plan could not be decoded"),
        StatusCode::InvalidArgument => warn!(error = %err, "rejected extraction request"),
        StatusCode::Internal => error!(error = %err, "extraction failed"),
    }
    Reply::with_status(status, ExtractPolygonsResponse::failure(err.to_string()))
}

/// Run an extraction, turning a panic into [`PlotError::Internal`]
pub(crate) fn guarded<F>(extraction: F) -> Result<ExtractPolygonsResponse>
where
    F: FnOnce() -> Result<ExtractPolygonsResponse>,
{
    panic::catch_unwind(AssertUnwindSafe(extraction))
        .unwrap_or_else(|payload| Err(PlotError::Internal(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unexpected panic".to_string()
    }
}
