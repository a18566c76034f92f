use clap::{Parser, Subcommand};
use color_eyre::eyre::{bail, Result};
use plot::{
    config::DEFAULT_MAX_WORKERS, BatchExtractRequest, BatchExtractResponse, ExtractPolygonsRequest,
    ExtractPolygonsResponse, ExtractionConfig, HealthCheckResponse, Image, PlotServer, Reply,
    WorkerPool,
};
use plot_cli::{client::PlotClient, load_config, BatchManifest, FloorEntry, PlotCliError};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(name = "navign-plot", author, version, about = "Extract room polygons from floor plan images", long_about = None)]
struct Cli {
    /// Maximum number of floors processed at the same time
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_WORKERS)]
    max_workers: usize,

    /// Send requests to a running plot_server (HOST:PORT or SSE URL) instead of
    /// extracting in-process
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract polygons from a single floor plan
    Extract {
        /// Path to the PNG or JPEG floor plan
        #[arg(short, long)]
        image: PathBuf,
        /// Building or mall identifier
        #[arg(short, long)]
        entity: String,
        /// Floor identifier
        #[arg(short, long)]
        floor: String,
        /// Extraction config (.toml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the JSON response here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Also write the polygons as a GeoJSON FeatureCollection
        #[arg(long)]
        geojson: Option<PathBuf>,
    },
    /// Extract polygons from every floor of a building
    Batch {
        /// Batch manifest (.toml or .json) listing the floors
        #[arg(short, long, conflicts_with_all = ["entity", "floors"])]
        manifest: Option<PathBuf>,
        /// Building or mall identifier
        #[arg(short, long)]
        entity: Option<String>,
        /// Floor as FLOOR_ID=PATH, repeatable
        #[arg(short, long = "floor")]
        floors: Vec<FloorEntry>,
        /// Extraction config (.toml or .json), overrides the manifest's
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Write the JSON response here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the default extraction config as TOML
    Defaults,
    /// Check that the service answers
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Commands::Defaults = cli.command {
        print!("{}", ExtractionConfig::defaults().to_toml()?);
        return Ok(());
    }

    let backend = match &cli.server {
        Some(server) => Backend::Remote(PlotClient::connect(server).await?),
        None => Backend::Local(WorkerPool::new(Arc::new(PlotServer::new()), cli.max_workers)),
    };

    let result = match cli.command {
        Commands::Extract { image, entity, floor, config, output, geojson } => {
            extract(&backend, &image, entity, floor, config.as_deref(), output.as_deref(), geojson.as_deref()).await
        }
        Commands::Batch { manifest, entity, floors, config, output } => {
            let manifest = match (manifest, entity) {
                (Some(path), _) => BatchManifest::from_file(path)?,
                (None, Some(entity_id)) if !floors.is_empty() => BatchManifest {
                    entity_id,
                    config: None,
                    floors,
                },
                _ => return Err(PlotCliError::MissingBatchInput.into()),
            };
            batch(&backend, manifest, config.as_deref(), output.as_deref()).await
        }
        Commands::Health => health(&backend).await,
        Commands::Defaults => Ok(()),
    };

    backend.close().await?;
    result
}

/// Where requests go: an in-process worker pool or a remote plot_server
enum Backend {
    Local(WorkerPool),
    Remote(PlotClient),
}

impl Backend {
    async fn extract_polygons(&self, request: ExtractPolygonsRequest) -> Result<Reply<ExtractPolygonsResponse>> {
        Ok(match self {
            Backend::Local(pool) => pool.extract_polygons(request).await,
            Backend::Remote(client) => client.extract_polygons(&request).await?,
        })
    }

    async fn batch_extract(&self, request: BatchExtractRequest) -> Result<Reply<BatchExtractResponse>> {
        Ok(match self {
            Backend::Local(pool) => pool.batch_extract(request).await,
            Backend::Remote(client) => client.batch_extract(&request).await?,
        })
    }

    async fn health_check(&self) -> Result<HealthCheckResponse> {
        Ok(match self {
            Backend::Local(pool) => pool.health_check(),
            Backend::Remote(client) => client.health_check().await?,
        })
    }

    async fn close(self) -> Result<()> {
        if let Backend::Remote(client) = self {
            client.close().await?;
        }
        Ok(())
    }
}

async fn extract(
    backend: &Backend,
    image_path: &Path,
    entity_id: String,
    floor_id: String,
    config_path: Option<&Path>,
    output: Option<&Path>,
    geojson: Option<&Path>,
) -> Result<()> {
    let config = config_path.map(load_config).transpose()?;
    let floor_plan = Image::from_path(image_path, Some(floor_id.clone()))?;
    info!("Extracting polygons for {}/{} from {:?}", entity_id, floor_id, image_path);

    let reply = backend
        .extract_polygons(ExtractPolygonsRequest {
            entity_id,
            floor_id,
            floor_plan: Some(floor_plan),
            config,
        })
        .await?;

    if let (Some(path), true) = (geojson, reply.body.is_success()) {
        reply.body.save_geojson(path)?;
        match reply.body.to_typed_geojson().largest_feature() {
            Some(largest) => info!(
                "GeoJSON saved to {:?}, largest polygon {:.0} px²",
                path, largest.properties.area
            ),
            None => info!("GeoJSON saved to {:?}", path),
        }
    }

    if reply.body.is_success() {
        info!(
            "Found {} polygons ({} contours) in {:.1} ms",
            reply.body.total_count, reply.body.stats.contours_found, reply.body.stats.processing_time_ms
        );
    } else {
        warn!("Extraction failed: {}", reply.body.error);
    }

    emit(reply, output)
}

async fn batch(
    backend: &Backend,
    mut manifest: BatchManifest,
    config_path: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    if let Some(path) = config_path {
        manifest.config = Some(load_config(path)?);
    }

    let requested = manifest.floors.len();
    let request = manifest.into_request();
    if request.floor_plans.len() < requested {
        warn!("{} of {} floors could not be read", requested - request.floor_plans.len(), requested);
    }

    let reply = backend.batch_extract(request).await?;
    for extraction in &reply.body.extractions {
        if extraction.is_success() {
            info!("Floor {}: {} polygons", extraction.floor_id, extraction.total_count);
        } else {
            warn!("Floor {}: {}", extraction.floor_id, extraction.error);
        }
    }
    info!("Batch finished: {} successful, {} failed", reply.body.successful, reply.body.failed);

    emit(reply, output)
}

async fn health(backend: &Backend) -> Result<()> {
    let health = backend.health_check().await?;
    println!("{}", serde_json::to_string_pretty(&health)?);
    Ok(())
}

/// Print or save the body, then fail the process on a non-Ok status
fn emit<T: Serialize>(reply: Reply<T>, output: Option<&Path>) -> Result<()> {
    let body = serde_json::to_string_pretty(&reply.body)?;
    match output {
        Some(path) => {
            std::fs::write(path, &body)?;
            info!("Response saved to {:?}", path);
        }
        None => println!("{}", body),
    }

    if !reply.is_ok() {
        bail!("request failed with status {}", reply.status);
    }
    Ok(())
}
