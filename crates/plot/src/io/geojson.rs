use std::path::Path;

use geojson::{FeatureCollection, Geometry, Value};
use crate::{
    error::Result,
    types::{ExtractPolygonsResponse, Polygon},
    typed_geojson::{FloorCollection, FloorFeature, PolygonProperties},
};

/// GeoJSON rings repeat their first position at the end
fn closed_ring(polygon: &Polygon) -> Vec<Vec<f64>> {
    let mut ring: Vec<Vec<f64>> = polygon.vertices.iter().map(|p| vec![p.x, p.y]).collect();
    if let Some(first) = ring.first().cloned() {
        ring.push(first);
    }
    ring
}

fn floor_feature(id: usize, polygon: &Polygon) -> FloorFeature {
    FloorFeature {
        geometry: Geometry::new(Value::Polygon(vec![closed_ring(polygon)])),
        properties: PolygonProperties {
            id: id as u32,
            label: polygon.label.clone(),
            area: polygon.area,
            centroid: [polygon.centroid.x, polygon.centroid.y],
            vertex_count: polygon.vertices.len(),
        },
    }
}

impl ExtractPolygonsResponse {
    /// One feature per polygon, in response order
    pub fn to_typed_geojson(&self) -> FloorCollection {
        FloorCollection {
            features: self
                .polygons
                .iter()
                .enumerate()
                .map(|(i, polygon)| floor_feature(i, polygon))
                .collect(),
            image_width: self.stats.image_width,
            image_height: self.stats.image_height,
        }
    }

    pub fn to_geojson(&self) -> Result<FeatureCollection> {
        self.to_typed_geojson().to_geojson()
    }

    pub fn to_geojson_string(&self) -> Result<String> {
        let geojson = self.to_geojson()?;
        Ok(serde_json::to_string_pretty(&geojson)?)
    }

    pub fn save_geojson<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_geojson_string()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Point, ProcessingStats};
    use geojson::GeoJson;

    fn response() -> ExtractPolygonsResponse {
        let square = Polygon {
            vertices: vec![
                Point::new(25.0, 25.0),
                Point::new(75.0, 25.0),
                Point::new(75.0, 75.0),
                Point::new(25.0, 75.0),
            ],
            label: "A-101".into(),
            area: 2500.0,
            centroid: Point::new(50.0, 50.0),
        };
        let triangle = Polygon {
            vertices: vec![Point::new(0.0, 0.0), Point::new(30.0, 0.0), Point::new(0.0, 20.0)],
            label: String::new(),
            area: 300.0,
            centroid: Point::new(10.0, 6.666),
        };
        ExtractPolygonsResponse::success(
            vec![square, triangle],
            ProcessingStats {
                image_width: 100,
                image_height: 80,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_geojson_rings_are_closed() {
        let collection = response().to_geojson().unwrap();

        assert_eq!(collection.features.len(), 2);
        let Some(Value::Polygon(rings)) = collection.features[0].geometry.as_ref().map(|g| g.value.clone()) else {
            panic!("expected a polygon geometry");
        };
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].len(), 5);
        assert_eq!(rings[0].first(), rings[0].last());
    }

    #[test]
    fn test_geojson_properties_and_metadata() {
        let collection = response().to_geojson().unwrap();

        let properties = collection.features[0].properties.as_ref().unwrap();
        assert_eq!(properties["label"], "A-101");
        assert_eq!(properties["area"], 2500.0);
        assert_eq!(properties["vertex_count"], 4);
        assert_eq!(properties["centroid"], serde_json::json!([50.0, 50.0]));

        let members = collection.foreign_members.as_ref().unwrap();
        assert_eq!(members["image_width"], 100);
        assert_eq!(members["image_height"], 80);
        assert_eq!(members["polygon_count"], 2);
    }

    #[test]
    fn test_geojson_string_parses_back() {
        let text = response().to_geojson_string().unwrap();
        let parsed: GeoJson = text.parse().unwrap();
        assert!(matches!(parsed, GeoJson::FeatureCollection(fc) if fc.features.len() == 2));
    }

    #[test]
    fn test_failed_response_is_empty_collection() {
        let collection = ExtractPolygonsResponse::failure("nope").to_geojson().unwrap();
        assert!(collection.features.is_empty());
        assert_eq!(collection.foreign_members.unwrap()["polygon_count"], 0);
    }

    #[test]
    fn test_typed_collection_carries_response() {
        let typed = response().to_typed_geojson();

        assert_eq!((typed.image_width, typed.image_height), (100, 80));
        assert_eq!(typed.len(), 2);

        let largest = &typed.largest_feature().unwrap().properties;
        assert_eq!(largest.id, 0);
        assert_eq!(largest.label, "A-101");
        assert_eq!(largest.vertex_count, 4);
    }

    #[test]
    fn test_save_geojson() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("floor.geojson");

        response().save_geojson(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"polygon_count\": 2"));
    }
}
