use std::sync::Arc;

use crate::{
    error::Result as PlotResult,
    pool::WorkerPool,
    service::PlotServer,
    types::{BatchExtractRequest, ExtractPolygonsRequest, ExtractionConfig, HealthCheckResponse, Reply, StatusCode},
};
use rmcp::{
    handler::server::tool::IntoCallToolResult,
    model::{CallToolResult, Content, ErrorCode, ServerCapabilities, ServerInfo},
    tool, Error as McpError, ServerHandler,
};
use serde::{de::DeserializeOwned, Serialize};

fn to_json<T: Serialize>(body: &T) -> Result<String, McpError> {
    serde_json::to_string_pretty(body)
        .map_err(|e| McpError::new(ErrorCode::INTERNAL_ERROR, format!("Failed to serialize response: {}", e), None))
}

/// A non-Ok status flags the tool result as an error. The body comes first
/// and still carries the message in its own `error` field; the status name
/// follows as a second text item.
fn reply_to_result<T: Serialize>(reply: Reply<T>) -> Result<CallToolResult, McpError> {
    let mut content = vec![Content::text(to_json(&reply.body)?)];
    if reply.status == StatusCode::Ok {
        Ok(CallToolResult::success(content))
    } else {
        tracing::debug!(status = %reply.status, "tool call failed");
        content.push(Content::text(reply.status.to_string()));
        Ok(CallToolResult::error(content))
    }
}

fn texts(result: &CallToolResult) -> impl Iterator<Item = &str> {
    result
        .content
        .iter()
        .filter_map(|content| content.as_text())
        .map(|text| text.text.as_str())
}

/// Parse the first text item of a tool result as JSON
pub fn body_from_result<T: DeserializeOwned>(result: &CallToolResult) -> PlotResult<T> {
    Ok(serde_json::from_str(texts(result).next().unwrap_or_default())?)
}

/// Client side of [`reply_to_result`]. An error result without a readable
/// status name counts as `Internal`.
pub fn reply_from_result<T: DeserializeOwned>(result: &CallToolResult) -> PlotResult<Reply<T>> {
    let body = body_from_result(result)?;
    let status = match result.is_error {
        Some(true) => texts(result)
            .nth(1)
            .and_then(|name| name.parse().ok())
            .unwrap_or(StatusCode::Internal),
        _ => StatusCode::Ok,
    };
    Ok(Reply::with_status(status, body))
}

impl IntoCallToolResult for HealthCheckResponse {
    fn into_call_tool_result(self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(to_json(&self)?)]))
    }
}

impl IntoCallToolResult for ExtractionConfig {
    fn into_call_tool_result(self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(to_json(&self)?)]))
    }
}

/// MCP server exposing floor plan polygon extraction
#[derive(Clone, Debug)]
pub struct PlotMcpServer {
    pool: WorkerPool,
}

impl PlotMcpServer {
    pub fn new(pool: WorkerPool) -> Self {
        Self { pool }
    }

    pub fn with_max_workers(max_workers: usize) -> Self {
        Self::new(WorkerPool::new(Arc::new(PlotServer), max_workers))
    }
}

impl Default for PlotMcpServer {
    fn default() -> Self {
        Self::new(WorkerPool::default())
    }
}

#[tool(tool_box)]
impl PlotMcpServer {
    #[tool(description = "Extract room and merchant polygons from a base64 encoded floor plan image")]
    async fn extract_polygons(
        &self,
        #[tool(aggr)] request: ExtractPolygonsRequest,
    ) -> Result<CallToolResult, McpError> {
        reply_to_result(self.pool.extract_polygons(request).await)
    }

    #[tool(description = "Extract polygons from a floor plan and return them as a GeoJSON FeatureCollection")]
    async fn extract_polygons_geojson(
        &self,
        #[tool(aggr)] request: ExtractPolygonsRequest,
    ) -> Result<CallToolResult, McpError> {
        let reply = self.pool.extract_polygons(request).await;
        if !reply.is_ok() {
            return reply_to_result(reply);
        }

        let floor = reply.body.to_typed_geojson();
        if let Some(largest) = floor.largest_feature() {
            tracing::debug!(polygons = floor.len(), largest_area = largest.properties.area, "GeoJSON built");
        }

        match floor.to_geojson() {
            Ok(collection) => Ok(CallToolResult::success(vec![Content::text(to_json(&collection)?)])),
            Err(e) => Err(McpError::new(ErrorCode::INTERNAL_ERROR, e.to_string(), None)),
        }
    }

    #[tool(description = "Extract polygons from several floors of one building; floors fail independently")]
    async fn batch_extract(
        &self,
        #[tool(aggr)] request: BatchExtractRequest,
    ) -> Result<CallToolResult, McpError> {
        reply_to_result(self.pool.batch_extract(request).await)
    }

    #[tool(description = "Report service health and version")]
    fn health_check(&self) -> HealthCheckResponse {
        self.pool.health_check()
    }

    #[tool(description = "Show the extraction config that would be used after filling in defaults")]
    fn resolve_config(&self, #[tool(aggr)] config: ExtractionConfig) -> ExtractionConfig {
        config.resolve()
    }
}

#[tool(tool_box)]
impl ServerHandler for PlotMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some("Navign Plot Server - Extract room and merchant polygons from indoor floor plan images. Images are base64 encoded PNG or JPEG; omitted config fields use defaults (see resolve_config).".into()),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}
