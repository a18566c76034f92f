use geo_types::{Coord, LineString};
use crate::{
    traits::{Contour, PolygonApproximator, PolygonFilter},
    types::{Point, Polygon},
};

/// Length of the contour including the closing segment
pub fn closed_perimeter(contour: &[[f64; 2]]) -> f64 {
    if contour.len() < 2 {
        return 0.0;
    }
    contour
        .iter()
        .zip(contour.iter().cycle().skip(1))
        .map(|(a, b)| ((b[0] - a[0]).powi(2) + (b[1] - a[1]).powi(2)).sqrt())
        .sum()
}

/// Builds a [`Polygon`] (area, centroid) from an open vertex ring.
pub fn polygon_from_ring(ring: &[[f64; 2]]) -> Option<Polygon> {
    use geo::{Area, Centroid};

    if ring.len() < 3 {
        return None;
    }

    let geo_polygon = geo_types::Polygon::new(to_line_string(ring), vec![]);
    let area = geo_polygon.unsigned_area();
    let centroid = geo_polygon
        .centroid()
        .map(|c| Point::new(c.x(), c.y()))
        .unwrap_or_else(|| vertex_mean(ring));

    Some(Polygon {
        vertices: ring.iter().map(|&[x, y]| Point::new(x, y)).collect(),
        label: String::new(),
        area,
        centroid,
    })
}

fn vertex_mean(ring: &[[f64; 2]]) -> Point {
    let n = ring.len() as f64;
    let (sx, sy) = ring.iter().fold((0.0, 0.0), |(sx, sy), &[x, y]| (sx + x, sy + y));
    Point::new(sx / n, sy / n)
}

fn to_line_string(points: &[[f64; 2]]) -> LineString<f64> {
    LineString::new(points.iter().map(|&[x, y]| Coord { x, y }).collect())
}

/// Douglas-Peucker approximation with a tolerance proportional to the
/// contour perimeter, using geo crate's implementation
#[derive(Debug, Clone)]
pub struct DouglasPeuckerApproximator {
    pub epsilon_factor: f64,
}

impl Default for DouglasPeuckerApproximator {
    fn default() -> Self {
        Self { epsilon_factor: 0.01 }
    }
}

impl PolygonApproximator for DouglasPeuckerApproximator {
    fn approximate(&self, contour: &Contour) -> Option<Polygon> {
        use geo::Simplify;

        if contour.len() < 3 {
            return None;
        }

        let epsilon = self.epsilon_factor * closed_perimeter(contour);

        // Simplify the closed ring so the seam between last and first point
        // is treated like any other vertex
        let mut closed = contour.clone();
        closed.push(contour[0]);
        let simplified = to_line_string(&closed).simplify(&epsilon);

        let mut ring: Vec<[f64; 2]> = simplified.coords().map(|c| [c.x, c.y]).collect();
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }

        polygon_from_ring(&ring)
    }
}

/// Keeps polygons whose area lies within `[min_area, max_area]`; a
/// `max_area` of zero leaves the upper end open
#[derive(Debug, Clone)]
pub struct AreaFilter {
    pub min_area: f64,
    pub max_area: f64,
}

impl Default for AreaFilter {
    fn default() -> Self {
        Self {
            min_area: 100.0,
            max_area: 0.0,
        }
    }
}

impl PolygonFilter for AreaFilter {
    fn keep(&self, polygon: &Polygon) -> bool {
        if polygon.area < self.min_area {
            return false;
        }
        !(self.max_area > 0.0 && polygon.area > self.max_area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pixel-by-pixel border of an axis-aligned square, like a traced contour
    fn square_contour(origin: f64, side: usize) -> Contour {
        let mut points = Vec::new();
        let s = side as f64;
        for i in 0..side {
            points.push([origin + i as f64, origin]);
        }
        for i in 0..side {
            points.push([origin + s, origin + i as f64]);
        }
        for i in 0..side {
            points.push([origin + s - i as f64, origin + s]);
        }
        for i in 0..side {
            points.push([origin, origin + s - i as f64]);
        }
        points
    }

    fn polygon(area: f64) -> Polygon {
        Polygon {
            vertices: vec![Point::new(0.0, 0.0); 3],
            label: String::new(),
            area,
            centroid: Point::default(),
        }
    }

    #[test]
    fn test_closed_perimeter_includes_seam() {
        let square = vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]];
        assert_eq!(closed_perimeter(&square), 40.0);
        assert_eq!(closed_perimeter(&[[1.0, 1.0]]), 0.0);
    }

    #[test]
    fn test_square_contour_reduces_to_corners() {
        let contour = square_contour(25.0, 50);
        let polygon = DouglasPeuckerApproximator::default()
            .approximate(&contour)
            .expect("square should survive approximation");

        assert_eq!(polygon.vertices.len(), 4);
        assert!((polygon.area - 2500.0).abs() < 1e-9);
        assert!((polygon.centroid.x - 50.0).abs() < 1e-9);
        assert!((polygon.centroid.y - 50.0).abs() < 1e-9);
        assert!(polygon.label.is_empty());
    }

    #[test]
    fn test_degenerate_contour_is_dropped() {
        let line = vec![[0.0, 0.0], [5.0, 0.0], [10.0, 0.0]];
        let approximator = DouglasPeuckerApproximator::default();

        assert!(approximator.approximate(&vec![[3.0, 3.0]]).is_none());
        assert!(approximator.approximate(&line).map_or(true, |p| p.area == 0.0));
    }

    #[test]
    fn test_triangle_centroid_is_area_weighted() {
        let polygon = polygon_from_ring(&[[0.0, 0.0], [6.0, 0.0], [0.0, 3.0]]).unwrap();
        assert!((polygon.area - 9.0).abs() < 1e-9);
        assert!((polygon.centroid.x - 2.0).abs() < 1e-9);
        assert!((polygon.centroid.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_area_filter_bounds() {
        let bounded = AreaFilter { min_area: 100.0, max_area: 1000.0 };
        assert!(!bounded.keep(&polygon(99.0)));
        assert!(bounded.keep(&polygon(100.0)));
        assert!(bounded.keep(&polygon(1000.0)));
        assert!(!bounded.keep(&polygon(1000.5)));

        let unbounded = AreaFilter::default();
        assert!(unbounded.keep(&polygon(1.0e9)));
    }
}
