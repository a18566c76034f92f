//! # Navign Plot
//!
//! Turns indoor floor-plan rasters into labeled polygons (rooms, merchant
//! boundaries) with area and centroid, for the Navign admin tooling.
//!
//! ## Core Features
//!
//! - **Trait-based pipeline**: blur, threshold or edge detection, morphology,
//!   border following, Douglas-Peucker approximation and area filtering
//! - **Config resolution**: zero or absent fields fall back to defaults
//! - **Fault isolation**: errors and panics come back as response bodies,
//!   one failing floor never affects the rest of a batch
//! - **Transports**: an MCP tool server (stdio or SSE) and an in-process API
//! - **GeoJSON export** of extraction results
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use plot::{ExtractPolygonsRequest, Image, PlotServer, PlotService};
//!
//! let request = ExtractPolygonsRequest {
//!     entity_id: "mall-1".into(),
//!     floor_id: "B1".into(),
//!     floor_plan: Some(Image::from_path("floor_b1.png", None)?),
//!     config: None,
//! };
//!
//! let reply = PlotServer::new().extract_polygons(&request);
//! for polygon in &reply.body.polygons {
//!     println!("{:.0} px² at ({:.1}, {:.1})", polygon.area, polygon.centroid.x, polygon.centroid.y);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Custom Pipeline
//!
//! ```rust,no_run
//! use plot::{Pipeline, algorithms::*};
//!
//! let pipeline = Pipeline::builder()
//!     .with_blur(3.0)
//!     .with_threshold(200, ThresholdType::BinaryInv)
//!     .with_area_bounds(50.0, 0.0)
//!     .build();
//!
//! let image = image::open("plan.png")?;
//! let extraction = pipeline.process(&intensity_image(&image))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod types;
pub mod config;
pub mod codec;
pub mod traits;
pub mod algorithms;
pub mod pipeline;
pub mod extractor;
pub mod service;
pub mod pool;
pub mod io;
pub mod mcp;
pub mod typed_geojson;

pub use error::{PlotError, Result};
pub use types::*;
pub use config::{ServerConfig, Transport};
pub use codec::ImageFormat;
pub use traits::*;
pub use pipeline::{Extraction, Pipeline, builder::PipelineBuilder};
pub use extractor::{extract, try_extract};
pub use service::{PlotServer, PlotService, VERSION};
pub use pool::WorkerPool;
pub use mcp::PlotMcpServer;
pub use typed_geojson::{FloorCollection, FloorFeature, PolygonProperties};
