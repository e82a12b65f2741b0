//! Axis-aligned box geometry used for relation inference.

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box `[x1, y1, x2, y2]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "[f64; 4]")]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Build from a detection box. Requires exactly four finite coordinates.
    pub fn from_coords(coords: &[f64]) -> Result<Self, String> {
        if coords.len() != 4 {
            return Err(format!("box has {} coordinates, expected 4", coords.len()));
        }
        if let Some(bad) = coords.iter().find(|c| !c.is_finite()) {
            return Err(format!("box has non-finite coordinate {}", bad));
        }
        Ok(Self::new(coords[0], coords[1], coords[2], coords[3]))
    }

    /// Bounding rectangle of an OCR polygon. Requires exactly four `[x, y]` points.
    pub fn from_polygon(points: &[Vec<f64>]) -> Result<Self, String> {
        if points.len() != 4 {
            return Err(format!("polygon has {} points, expected 4", points.len()));
        }

        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for (i, point) in points.iter().enumerate() {
            if point.len() != 2 {
                return Err(format!("polygon point {} has {} coordinates, expected 2", i, point.len()));
            }
            let (x, y) = (point[0], point[1]);
            if !x.is_finite() || !y.is_finite() {
                return Err(format!("polygon point {} has a non-finite coordinate", i));
            }
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        Ok(Self::new(min_x, min_y, max_x, max_y))
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Grow the box by `margin` on every side
    pub fn expand(&self, margin: f64) -> Self {
        Self::new(
            self.x1 - margin,
            self.y1 - margin,
            self.x2 + margin,
            self.y2 + margin,
        )
    }

    pub fn contains(&self, inner: &BoundingBox) -> bool {
        inner.x1 >= self.x1 && inner.y1 >= self.y1 && inner.x2 <= self.x2 && inner.y2 <= self.y2
    }

    /// Containment test with `tolerance` slack on the outer box
    pub fn contains_within(&self, inner: &BoundingBox, tolerance: f64) -> bool {
        self.expand(tolerance).contains(inner)
    }

    /// Euclidean distance between box centers
    pub fn center_distance(&self, other: &BoundingBox) -> f64 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        (ax - bx).hypot(ay - by)
    }
}

impl TryFrom<Vec<f64>> for BoundingBox {
    type Error = String;

    fn try_from(coords: Vec<f64>) -> Result<Self, Self::Error> {
        Self::from_coords(&coords)
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}
