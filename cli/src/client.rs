use plot::{
    mcp::{body_from_result, reply_from_result},
    BatchExtractRequest, BatchExtractResponse, ExtractPolygonsRequest, ExtractPolygonsResponse,
    HealthCheckResponse, Reply,
};
use rmcp::{
    model::{CallToolRequestParam, CallToolResult},
    service::RunningService,
    transport::SseTransport,
    RoleClient, ServiceExt,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::PlotCliError;

/// Path the plot server exposes its SSE stream on
pub const SSE_PATH: &str = "/sse";

/// `127.0.0.1:50052` becomes `http://127.0.0.1:50052/sse`; full URLs are kept
pub fn sse_url(server: &str) -> String {
    let base = if server.starts_with("http://") || server.starts_with("https://") {
        server.trim_end_matches('/').to_string()
    } else {
        format!("http://{}", server.trim_end_matches('/'))
    };

    if base.ends_with(SSE_PATH) {
        base
    } else {
        format!("{base}{SSE_PATH}")
    }
}

/// MCP client for a running `plot_server`
pub struct PlotClient {
    service: RunningService<RoleClient, ()>,
}

impl PlotClient {
    /// Open an SSE session with the server at `server` (`host:port` or URL)
    pub async fn connect(server: &str) -> Result<Self, PlotCliError> {
        let url = sse_url(server);
        let transport = SseTransport::start(url.as_str())
            .await
            .map_err(|e| PlotCliError::Connect(format!("{url}: {e}")))?;
        let service = ()
            .serve(transport)
            .await
            .map_err(|e| PlotCliError::Connect(format!("{url}: {e}")))?;

        info!("Connected to plot server at {}", url);
        Ok(Self { service })
    }

    async fn call<A: Serialize>(&self, tool: &'static str, arguments: &A) -> Result<CallToolResult, PlotCliError> {
        let arguments = match serde_json::to_value(arguments)? {
            serde_json::Value::Object(map) => Some(map),
            _ => None,
        };
        debug!(tool, "calling tool");

        Ok(self
            .service
            .call_tool(CallToolRequestParam {
                name: tool.into(),
                arguments,
            })
            .await?)
    }

    pub async fn health_check(&self) -> Result<HealthCheckResponse, PlotCliError> {
        let result = self.call("health_check", &serde_json::json!({})).await?;
        Ok(body_from_result(&result)?)
    }

    pub async fn extract_polygons(
        &self,
        request: &ExtractPolygonsRequest,
    ) -> Result<Reply<ExtractPolygonsResponse>, PlotCliError> {
        let result = self.call("extract_polygons", request).await?;
        Ok(reply_from_result(&result)?)
    }

    pub async fn batch_extract(
        &self,
        request: &BatchExtractRequest,
    ) -> Result<Reply<BatchExtractResponse>, PlotCliError> {
        let result = self.call("batch_extract", request).await?;
        Ok(reply_from_result(&result)?)
    }

    /// Close the session
    pub async fn close(self) -> Result<(), PlotCliError> {
        self.service
            .cancel()
            .await
            .map_err(|e| PlotCliError::Connect(e.to_string()))?;
        Ok(())
    }
}
