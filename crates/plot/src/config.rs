use std::{fs, path::Path};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantNames};

use crate::{error::Result, types::ExtractionConfig};

pub const DEFAULT_BLUR_KERNEL_SIZE: f64 = 5.0;
/// Largest accepted blur kernel; bigger sizes are rejected before the kernel is allocated
pub const MAX_BLUR_KERNEL_SIZE: f64 = 255.0;
pub const DEFAULT_THRESHOLD_VALUE: i32 = 127;
pub const DEFAULT_THRESHOLD_TYPE: i32 = 0;
pub const DEFAULT_MIN_AREA: f64 = 100.0;
/// Zero means no upper bound
pub const DEFAULT_MAX_AREA: f64 = 0.0;
pub const DEFAULT_EPSILON_FACTOR: f64 = 0.01;
pub const DEFAULT_APPLY_MORPHOLOGY: bool = true;
pub const DEFAULT_MORPH_KERNEL_SIZE: i32 = 5;
pub const DEFAULT_USE_CANNY: bool = false;
pub const DEFAULT_CANNY_LOW: i32 = 50;
pub const DEFAULT_CANNY_HIGH: i32 = 150;

fn positive_or<T: PartialOrd + Default>(value: T, default: T) -> T {
    if value > T::default() { value } else { default }
}

impl ExtractionConfig {
    /// Fill every unset field with its documented default.
    ///
    /// Numeric fields count as unset when they are zero or negative. Boolean
    /// fields count as unset only when absent; an explicit `false` is kept.
    pub fn resolve(&self) -> ExtractionConfig {
        ExtractionConfig {
            blur_kernel_size: positive_or(self.blur_kernel_size, DEFAULT_BLUR_KERNEL_SIZE),
            threshold_value: positive_or(self.threshold_value, DEFAULT_THRESHOLD_VALUE),
            threshold_type: positive_or(self.threshold_type, DEFAULT_THRESHOLD_TYPE),
            min_area: positive_or(self.min_area, DEFAULT_MIN_AREA),
            max_area: positive_or(self.max_area, DEFAULT_MAX_AREA),
            epsilon_factor: positive_or(self.epsilon_factor, DEFAULT_EPSILON_FACTOR),
            apply_morphology: Some(self.apply_morphology.unwrap_or(DEFAULT_APPLY_MORPHOLOGY)),
            morph_kernel_size: positive_or(self.morph_kernel_size, DEFAULT_MORPH_KERNEL_SIZE),
            use_canny: Some(self.use_canny.unwrap_or(DEFAULT_USE_CANNY)),
            canny_low: positive_or(self.canny_low, DEFAULT_CANNY_LOW),
            canny_high: positive_or(self.canny_high, DEFAULT_CANNY_HIGH),
        }
    }

    /// Fully resolved default configuration
    pub fn defaults() -> ExtractionConfig {
        ExtractionConfig::default().resolve()
    }

    /// Whether closing/opening runs, after defaulting
    pub fn morphology_enabled(&self) -> bool {
        self.apply_morphology.unwrap_or(DEFAULT_APPLY_MORPHOLOGY)
    }

    /// Whether edge detection replaces thresholding, after defaulting
    pub fn canny_enabled(&self) -> bool {
        self.use_canny.unwrap_or(DEFAULT_USE_CANNY)
    }

    /// Parse a partial config; missing fields stay unset
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serialize for `navign-plot defaults`
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[derive(
    Debug, Clone, Copy, Default,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, VariantNames,
    PartialEq, Eq
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Transport {
    /// MCP over stdin/stdout
    #[default]
    Stdio,
    /// MCP over HTTP server-sent events
    Sse,
}

pub const DEFAULT_BIND: &str = "127.0.0.1:50052";
pub const DEFAULT_MAX_WORKERS: usize = 10;

/// Settings for the `plot_server` binary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ServerConfig {
    pub transport: Transport,
    /// Listen address for the SSE transport
    pub bind: String,
    /// Upper bound on extractions running at the same time
    pub max_workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: Transport::default(),
            bind: DEFAULT_BIND.to_string(),
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }
}

impl ServerConfig {
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load the server settings file; absent keys keep their defaults
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}
