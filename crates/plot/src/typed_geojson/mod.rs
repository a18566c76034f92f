use geojson::{feature::Id, Feature, FeatureCollection, Geometry, JsonObject};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Number;
use ts_rs::TS;

use crate::error::Result;

/// Properties attached to every extracted floor-plan polygon
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, TS, JsonSchema)]
#[ts(export)]
#[schemars(description = "Properties for extracted floor plan polygons")]
pub struct PolygonProperties {
    #[schemars(description = "Index of the polygon in the extraction result")]
    pub id: u32,
    #[schemars(description = "Room or merchant label, empty when unknown")]
    pub label: String,
    #[schemars(description = "Area of the polygon in square pixels")]
    pub area: f64,
    #[schemars(description = "Area-weighted centroid as [x, y]")]
    pub centroid: [f64; 2],
    #[schemars(description = "Number of distinct vertices")]
    pub vertex_count: usize,
}

/// One room or merchant boundary, geometry plus typed properties
#[derive(Debug, Clone, PartialEq)]
pub struct FloorFeature {
    pub geometry: Geometry,
    pub properties: PolygonProperties,
}

impl FloorFeature {
    fn to_feature(&self) -> Result<Feature> {
        let properties = match serde_json::to_value(&self.properties)? {
            serde_json::Value::Object(map) => Some(map),
            _ => None,
        };

        Ok(Feature {
            bbox: None,
            geometry: Some(self.geometry.clone()),
            id: Some(Id::Number(Number::from(self.properties.id))),
            properties,
            foreign_members: None,
        })
    }
}

/// Every polygon of one floor, with the source image size
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FloorCollection {
    pub features: Vec<FloorFeature>,
    pub image_width: u32,
    pub image_height: u32,
}

impl FloorCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn largest_feature(&self) -> Option<&FloorFeature> {
        self.features
            .iter()
            .max_by(|a, b| a.properties.area.total_cmp(&b.properties.area))
    }

    /// Image size and polygon count travel as foreign members
    fn foreign_members(&self) -> JsonObject {
        let mut members = JsonObject::new();
        members.insert("image_width".to_string(), Number::from(self.image_width).into());
        members.insert("image_height".to_string(), Number::from(self.image_height).into());
        members.insert("polygon_count".to_string(), Number::from(self.len()).into());
        members
    }

    pub fn to_geojson(&self) -> Result<FeatureCollection> {
        let features = self
            .features
            .iter()
            .map(FloorFeature::to_feature)
            .collect::<Result<Vec<_>>>()?;

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(self.foreign_members()),
        })
    }
}
