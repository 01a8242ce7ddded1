//! Line router: one deterministic polyline per category.
//!
//! Lines get horizontal lanes, start in lane `i` and finish in the mirrored
//! lane `n - 1 - i`, so lines cross each other through a single diagonal jog.
//! Horizontal offset comes from a stable hash of the category id.

use std::hash::Hasher;

use fnv::FnvHasher;
use serde::{Deserialize, Serialize};

use super::geometry::{Point, Polyline, Segment};
use crate::config::LayoutConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutedLine {
    pub category_id: String,
    /// Render-ready path with rounded corners.
    pub path: String,
    pub polyline: Polyline,
    pub total_length: f64,
    pub segments: Vec<Segment>,
}

/// Stable fraction in `[0, 1)` derived from the category id.
pub fn stagger(category_id: &str) -> f64 {
    let mut hasher = FnvHasher::default();
    hasher.write(category_id.as_bytes());
    (hasher.finish() % 1000) as f64 / 1000.0
}

/// Length a line needs for `point_count` stations, within the canvas.
pub fn line_length(point_count: usize, config: &LayoutConfig) -> f64 {
    let wanted = ((point_count + 1) as f64 * config.station_spacing).max(config.min_line_length);
    wanted.min(config.usable_width())
}

fn lane_y(lane: usize, total: usize, config: &LayoutConfig) -> f64 {
    let gap = config.usable_height() / total as f64;
    config.margin + gap * (lane as f64 + 0.5)
}

pub fn route(
    category_id: &str,
    point_count: usize,
    category_index: usize,
    total_categories: usize,
    config: &LayoutConfig,
) -> RoutedLine {
    let total = total_categories.max(1);
    let index = category_index.min(total - 1);

    let y_start = lane_y(index, total, config);
    let y_end = lane_y(total - 1 - index, total, config);

    let length = line_length(point_count, config);
    let free = (config.usable_width() - length).max(0.0);
    let x0 = config.margin + free * stagger(category_id);
    let x1 = x0 + length;

    let dy = (y_end - y_start).abs();
    let vertices = if dy < 1.0 {
        vec![Point::new(x0, y_start), Point::new(x1, y_start)]
    } else {
        let diagonal_dx = dy.min(length * 0.6);
        let run = (length - diagonal_dx) / 2.0;
        vec![
            Point::new(x0, y_start),
            Point::new(x0 + run, y_start),
            Point::new(x0 + run + diagonal_dx, y_end),
            Point::new(x1, y_end),
        ]
    };

    let polyline = Polyline::new(vertices);
    let segments = polyline.segments();
    let total_length = polyline.total_length();
    RoutedLine {
        category_id: category_id.to_string(),
        path: polyline.path_description(config.corner_radius),
        polyline,
        total_length,
        segments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_is_deterministic() {
        let config = LayoutConfig::default();
        assert_eq!(
            route("contacts", 4, 1, 5, &config),
            route("contacts", 4, 1, 5, &config)
        );
    }

    #[test]
    fn test_middle_lane_is_straight() {
        let config = LayoutConfig::default();
        let line = route("services", 2, 2, 5, &config);
        assert_eq!(line.polyline.points.len(), 2);
        assert_eq!(line.segments.len(), 1);
        assert!((line.total_length - config.min_line_length).abs() < 1e-9);
    }

    #[test]
    fn test_mirrored_lanes_and_canvas_bounds() {
        let config = LayoutConfig::default();
        for count in [0, 1, 5, 40] {
            let line = route("identity", count, 0, 4, &config);
            let first = line.polyline.points[0];
            let last = *line.polyline.points.last().unwrap();
            assert!((first.y - lane_y(0, 4, &config)).abs() < 1e-9);
            assert!((last.y - lane_y(3, 4, &config)).abs() < 1e-9);
            for p in &line.polyline.points {
                assert!(p.x >= config.margin - 1e-9);
                assert!(p.x <= config.canvas_width - config.margin + 1e-9);
            }
        }
    }

    #[test]
    fn test_length_grows_with_points_until_capped() {
        let config = LayoutConfig::default();
        assert_eq!(line_length(0, &config), config.min_line_length);
        assert_eq!(line_length(5, &config), 420.0);
        assert_eq!(line_length(100, &config), config.usable_width());
    }

    #[test]
    fn test_stagger_is_stable_fraction() {
        let s = stagger("technology");
        assert!((0.0..1.0).contains(&s));
        assert_eq!(s, stagger("technology"));
    }
}
