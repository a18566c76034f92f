//! Async front for a [`PlotService`]: bounded blocking workers.

use std::sync::Arc;

use tokio::{sync::Semaphore, task::JoinHandle};
use tracing::{error, info};

use crate::{
    config::DEFAULT_MAX_WORKERS,
    error::PlotError,
    service::{failure_reply, PlotServer, PlotService},
    types::{
        BatchExtractRequest, BatchExtractResponse, ExtractPolygonsRequest,
        ExtractPolygonsResponse, FloorExtraction,
        HealthCheckResponse, Reply,
    },
};

/// Runs extractions on tokio's blocking pool, at most `max_workers` at a time.
#[derive(Clone)]
pub struct WorkerPool {
    service: Arc<dyn PlotService>,
    permits: Arc<Semaphore>,
    max_workers: usize,
}

impl WorkerPool {
    pub fn new(service: Arc<dyn PlotService>, max_workers: usize) -> Self {
        let max_workers = max_workers.max(1);
        Self {
            service,
            permits: Arc::new(Semaphore::new(max_workers)),
            max_workers,
        }
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub async fn extract_polygons(&self, request: ExtractPolygonsRequest) -> Reply<ExtractPolygonsResponse> {
        let service = Arc::clone(&self.service);
        match self.run(move || service.extract_polygons(&request)).await {
            Ok(reply) => reply,
            Err(err) => failure_reply(err),
        }
    }

    /// Floors run concurrently; results keep the request order.
    pub async fn batch_extract(&self, request: BatchExtractRequest) -> Reply<BatchExtractResponse> {
        info!(
            entity_id = %request.entity_id,
            floors = request.floor_plans.len(),
            workers = self.max_workers,
            "parallel batch extraction"
        );

        let entity_id: Arc<str> = Arc::from(request.entity_id);
        let config = Arc::new(request.config);

        let handles: Vec<(String, JoinHandle<Result<FloorExtraction, PlotError>>)> = request
            .floor_plans
            .into_iter()
            .map(|floor| {
                let pool = self.clone();
                let entity_id = Arc::clone(&entity_id);
                let config = Arc::clone(&config);
                let floor_id = floor.floor_id.clone();
                let handle = tokio::spawn(async move {
                    let service = Arc::clone(&pool.service);
                    pool.run(move || service.extract_floor(&entity_id, &floor, (*config).as_ref()))
                        .await
                });
                (floor_id, handle)
            })
            .collect();

        let mut extractions = Vec::with_capacity(handles.len());
        for (floor_id, handle) in handles {
            let extraction = match handle.await {
                Ok(Ok(extraction)) => extraction,
                Ok(Err(err)) => FloorExtraction::new(floor_id, failure_reply(err).body),
                Err(join_err) => {
                    let err = PlotError::Internal(join_err.to_string());
                    FloorExtraction::new(floor_id, failure_reply(err).body)
                }
            };
            extractions.push(extraction);
        }

        Reply::ok(extractions.into_iter().collect())
    }

    pub fn health_check(&self) -> HealthCheckResponse {
        self.service.health_check()
    }

    /// Hold a permit for the whole blocking call
    async fn run<T, F>(&self, work: F) -> Result<T, PlotError>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|err| PlotError::Internal(err.to_string()))?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            work()
        })
        .await
        .map_err(|join_err| {
            error!(error = %join_err, "worker task failed");
            PlotError::Internal(join_err.to_string())
        })
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(Arc::new(PlotServer), DEFAULT_MAX_WORKERS)
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("max_workers", &self.max_workers)
            .field("available", &self.permits.available_permits())
            .finish()
    }
}
