//! Station placer: spread a line's points along its polyline by arc length.

use serde::{Deserialize, Serialize};

use super::geometry::{Point, Polyline};
use crate::types::DataPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelSide {
    Above,
    Below,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedDataPoint {
    #[serde(flatten)]
    pub point: DataPoint,
    pub x: f64,
    pub y: f64,
    /// Parametric position along the line, `0..=1`.
    pub t: f64,
    pub label_side: LabelSide,
}

/// Parametric positions for `n` stations with `padding` reserved at both ends.
///
/// One station sits at the midpoint; otherwise the first is at `padding`,
/// the last at `1 - padding` and the rest are evenly spaced between.
pub fn parametric_positions(n: usize, padding: f64) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![0.5],
        _ => {
            let span = 1.0 - 2.0 * padding;
            (0..n)
                .map(|i| padding + i as f64 * span / (n - 1) as f64)
                .collect()
        }
    }
}

pub fn place(
    points: &[DataPoint],
    polyline: &Polyline,
    total_length: f64,
    padding: f64,
) -> Vec<PlacedDataPoint> {
    parametric_positions(points.len(), padding)
        .into_iter()
        .zip(points)
        .enumerate()
        .map(|(i, (t, point))| {
            let at = polyline
                .point_at_length(t * total_length)
                .unwrap_or(Point::ORIGIN);
            PlacedDataPoint {
                point: point.clone(),
                x: at.x,
                y: at.y,
                t,
                label_side: if i % 2 == 0 {
                    LabelSide::Above
                } else {
                    LabelSide::Below
                },
            }
        })
        .collect()
}
