pub mod client;

use plot::{BatchExtractRequest, ExtractionConfig, FloorPlanInput, Image, PlotError};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug)]
pub enum PlotCliError {
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    TomlDeError(#[from] toml::de::Error),
    #[error(transparent)]
    TomlSerError(#[from] toml::ser::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    Plot(#[from] PlotError),
    #[error("Expected FLOOR_ID=PATH, got '{0}'")]
    InvalidFloorArg(String),
    #[error("Batch needs --manifest or --entity with at least one --floor")]
    MissingBatchInput,
    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,
    #[error("Could not reach plot server {0}")]
    Connect(String),
    #[error(transparent)]
    Service(#[from] rmcp::ServiceError),
}

enum FileFormat {
    Toml,
    Json,
}

impl FileFormat {
    fn of(path: &Path) -> Result<Self, PlotCliError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Ok(Self::Toml),
            Some("json") => Ok(Self::Json),
            _ => Err(PlotCliError::UnsupportedFileFormat),
        }
    }
}

/// Read a TOML or JSON document, picking the parser from the extension
fn load<T, P>(path: P) -> Result<T, PlotCliError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let format = FileFormat::of(path)?;
    let content = fs::read_to_string(path)?;
    Ok(match format {
        FileFormat::Toml => toml::from_str(&content)?,
        FileFormat::Json => serde_json::from_str(&content)?,
    })
}

/// Load an extraction config from a `.toml` or `.json` file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ExtractionConfig, PlotCliError> {
    load(path)
}

/// One floor image on disk
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct FloorEntry {
    pub floor_id: String,
    pub path: PathBuf,
}

impl FromStr for FloorEntry {
    type Err = PlotCliError;

    /// Parses `FLOOR_ID=PATH`
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.split_once('=') {
            Some((floor_id, path)) if !floor_id.trim().is_empty() && !path.trim().is_empty() => Ok(Self {
                floor_id: floor_id.trim().to_string(),
                path: PathBuf::from(path.trim()),
            }),
            _ => Err(PlotCliError::InvalidFloorArg(value.to_string())),
        }
    }
}

/// Every floor of one building, plus an optional shared config
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct BatchManifest {
    pub entity_id: String,
    #[serde(default)]
    pub config: Option<ExtractionConfig>,
    #[serde(default)]
    pub floors: Vec<FloorEntry>,
}

impl BatchManifest {
    pub fn from_toml(content: &str) -> Result<Self, PlotCliError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json(content: &str) -> Result<Self, PlotCliError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Auto-detect file format and load the manifest
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PlotCliError> {
        load(path)
    }

    pub fn to_toml(&self) -> Result<String, PlotCliError> {
        Ok(toml::to_string_pretty(&self)?)
    }

    pub fn to_json(&self) -> Result<String, PlotCliError> {
        Ok(serde_json::to_string_pretty(&self)?)
    }

    /// Read every floor image. Floors whose file cannot be read are skipped
    /// with a warning and left out of the request.
    pub fn into_request(self) -> BatchExtractRequest {
        let floor_plans = self
            .floors
            .into_iter()
            .filter_map(|floor| match Image::from_path(&floor.path, Some(floor.floor_id.clone())) {
                Ok(image) => Some(FloorPlanInput {
                    floor_id: floor.floor_id,
                    floor_plan: Some(image),
                }),
                Err(e) => {
                    warn!("Skipping floor '{}' ({}): {}", floor.floor_id, floor.path.display(), e);
                    None
                }
            })
            .collect();

        BatchExtractRequest {
            entity_id: self.entity_id,
            floor_plans,
            config: self.config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn write_png(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut img = RgbImage::new(40, 30);
        img.put_pixel(5, 5, Rgb([255, 255, 255]));
        img.save(&path).unwrap();
        path
    }

    #[test]
    fn test_floor_entry_parsing() {
        let entry: FloorEntry = "B1=plans/b1.png".parse().unwrap();
        assert_eq!(entry.floor_id, "B1");
        assert_eq!(entry.path, PathBuf::from("plans/b1.png"));

        assert!(matches!("B1".parse::<FloorEntry>(), Err(PlotCliError::InvalidFloorArg(_))));
        assert!("=a.png".parse::<FloorEntry>().is_err());
    }

    #[test]
    fn test_manifest_from_toml() {
        let manifest = BatchManifest::from_toml(
            r#"
entity_id = "mall-1"

[config]
min_area = 250.0
use_canny = true

[[floors]]
floor_id = "1"
path = "f1.png"

[[floors]]
floor_id = "2"
path = "f2.jpg"
"#,
        )
        .unwrap();

        assert_eq!(manifest.entity_id, "mall-1");
        assert_eq!(manifest.floors.len(), 2);
        let config = manifest.config.unwrap();
        assert_eq!(config.min_area, 250.0);
        assert_eq!(config.use_canny, Some(true));
        assert_eq!(config.apply_morphology, None);
    }

    #[test]
    fn test_manifest_file_formats() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = BatchManifest {
            entity_id: "mall-2".into(),
            config: None,
            floors: vec![FloorEntry { floor_id: "G".into(), path: "g.png".into() }],
        };

        let json_path = dir.path().join("batch.json");
        fs::write(&json_path, manifest.to_json().unwrap()).unwrap();
        assert_eq!(BatchManifest::from_file(&json_path).unwrap(), manifest);

        let toml_path = dir.path().join("batch.toml");
        fs::write(&toml_path, manifest.to_toml().unwrap()).unwrap();
        assert_eq!(BatchManifest::from_file(&toml_path).unwrap(), manifest);

        let yaml_path = dir.path().join("batch.yaml");
        fs::write(&yaml_path, "entity_id: x").unwrap();
        assert!(matches!(
            BatchManifest::from_file(&yaml_path),
            Err(PlotCliError::UnsupportedFileFormat)
        ));
    }

    #[test]
    fn test_load_config_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("extract.json");
        fs::write(&path, r#"{ "threshold_value": 200, "apply_morphology": false }"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.threshold_value, 200);
        assert!(!config.resolve().morphology_enabled());
    }

    #[test]
    fn test_unreadable_floors_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_png(dir.path(), "f1.png");

        let request = BatchManifest {
            entity_id: "mall-3".into(),
            config: None,
            floors: vec![
                FloorEntry { floor_id: "1".into(), path: good },
                FloorEntry { floor_id: "2".into(), path: dir.path().join("missing.png") },
            ],
        }
        .into_request();

        assert_eq!(request.entity_id, "mall-3");
        assert_eq!(request.floor_plans.len(), 1);
        let image = request.floor_plans[0].floor_plan.as_ref().unwrap();
        assert_eq!((image.width, image.height), (40, 30));
        assert_eq!(image.label.as_deref(), Some("1"));
    }
}
