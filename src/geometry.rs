//! Coordinate parsing for PAGE `points` attributes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An integer image coordinate, serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point(pub i64, pub i64);

impl Point {
    /// Horizontal pixel position.
    pub fn x(&self) -> i64 {
        self.0
    }

    /// Vertical pixel position.
    pub fn y(&self) -> i64 {
        self.1
    }
}

/// An ordered, closed polygon boundary.
///
/// Point order defines the winding and is kept exactly as read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polygon {
    points: Vec<Point>,
}

impl Polygon {
    /// Create an empty polygon.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a polygon from points.
    pub fn from_points(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// The points in input order.
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether no geometry was provided.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Serialize back to the PAGE `points` form (`"x1,y1 x2,y2"`).
    pub fn to_points_string(&self) -> String {
        self.points
            .iter()
            .map(|p| format!("{},{}", p.0, p.1))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_points_string())
    }
}

/// Parse a whitespace-separated list of `x,y` pairs.
///
/// Malformed input never fails: it yields an empty polygon, which callers
/// read as "no geometry".
pub fn parse_points(raw: &str) -> Polygon {
    let mut points = Vec::new();

    for pair in raw.split_whitespace() {
        match parse_pair(pair) {
            Some(point) => points.push(point),
            None => {
                log::warn!("Malformed coordinate pair [{}] in points [{}]", pair, raw);
                return Polygon::new();
            }
        }
    }

    Polygon::from_points(points)
}

/// Parse an optional `points` value; absent input is an empty polygon.
pub fn parse_optional_points(raw: Option<&str>) -> Polygon {
    raw.map(parse_points).unwrap_or_default()
}

fn parse_pair(pair: &str) -> Option<Point> {
    let (x, y) = pair.split_once(',')?;
    Some(Point(x.parse().ok()?, y.parse().ok()?))
}
