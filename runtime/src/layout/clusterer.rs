//! Transfer clusterer: resolve a 2D position for every detected relationship.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::geometry::{segment_intersection, Point, Polyline};
use super::LayoutLine;
use crate::config::LayoutConfig;
use crate::types::Relationship;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedRelationship {
    #[serde(flatten)]
    pub relationship: Relationship,
    pub x: f64,
    pub y: f64,
}

struct LineView<'a> {
    line: &'a LayoutLine,
    polyline: Polyline,
}

impl LineView<'_> {
    fn station(&self, point_id: &str) -> Option<Point> {
        self.line
            .placed_data_points
            .iter()
            .find(|p| p.point.id == point_id)
            .map(|p| Point::new(p.x, p.y))
    }
}

/// Place every relationship; ids that could not be placed safely come back
/// in the second vector, in input order.
pub fn place_transfers(
    relationships: &[Relationship],
    lines: &[LayoutLine],
    config: &LayoutConfig,
) -> (Vec<PlacedRelationship>, Vec<String>) {
    let views: HashMap<&str, LineView<'_>> = lines
        .iter()
        .map(|line| {
            (
                line.category_id.as_str(),
                LineView {
                    line,
                    polyline: Polyline::from_segments(&line.segments),
                },
            )
        })
        .collect();

    let mut placed = Vec::with_capacity(relationships.len());
    let mut skipped = Vec::new();
    for rel in relationships {
        match resolve(rel, &views, config) {
            Some(at) => placed.push(PlacedRelationship {
                relationship: rel.clone(),
                x: at.x,
                y: at.y,
            }),
            None => skipped.push(rel.id.clone()),
        }
    }
    (placed, skipped)
}

fn resolve(
    rel: &Relationship,
    views: &HashMap<&str, LineView<'_>>,
    config: &LayoutConfig,
) -> Option<Point> {
    let a = views.get(rel.category_ids.0.as_str())?;
    let b = views.get(rel.category_ids.1.as_str())?;
    let station_a = a.station(&rel.data_point_ids.0)?;
    let station_b = b.station(&rel.data_point_ids.1)?;
    resolve_position(&a.polyline, station_a, &b.polyline, station_b, config)
}

/// Position for a transfer between `station_a` on `line_a` and `station_b`
/// on `line_b`, or `None` when no finite position within
/// `max_transfer_distance` of both stations exists.
pub fn resolve_position(
    line_a: &Polyline,
    station_a: Point,
    line_b: &Polyline,
    station_b: Point,
    config: &LayoutConfig,
) -> Option<Point> {
    if !station_a.is_finite() || !station_b.is_finite() {
        return None;
    }
    let max = config.max_transfer_distance;
    let within = |p: &Point| {
        p.is_finite() && p.distance(&station_a) <= max && p.distance(&station_b) <= max
    };

    let crossing = match (line_a.segments().first(), line_b.segments().first()) {
        (Some(sa), Some(sb)) => segment_intersection(sa, sb),
        _ => None,
    };
    let candidate = crossing.or_else(|| {
        let near_a = line_a.closest_sample(&station_b, config.sample_step)?;
        let near_b = line_b.closest_sample(&station_a, config.sample_step)?;
        Some(near_a.midpoint(&near_b))
    });

    if let Some(p) = candidate.filter(within) {
        return Some(p);
    }
    let fallback = station_a.midpoint(&station_b);
    within(&fallback).then_some(fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::placer::{LabelSide, PlacedDataPoint};
    use crate::types::DataPoint;

    fn line(category: &str, points: Vec<Point>, stations: &[(&str, Point)]) -> LayoutLine {
        let polyline = Polyline::new(points);
        LayoutLine {
            category_id: category.into(),
            path_description: polyline.path_description(0.0),
            segments: polyline.segments(),
            total_length: polyline.total_length(),
            placed_data_points: stations
                .iter()
                .map(|(id, at)| PlacedDataPoint {
                    point: DataPoint {
                        id: (*id).into(),
                        category_id: category.into(),
                        label: "L".into(),
                        value: (*id).into(),
                        confidence: 0.5,
                        evidence: Vec::new(),
                    },
                    x: at.x,
                    y: at.y,
                    t: 0.5,
                    label_side: LabelSide::Above,
                })
                .collect(),
        }
    }

    fn rel(id: &str, a: (&str, &str), b: (&str, &str)) -> Relationship {
        Relationship {
            id: id.into(),
            data_point_ids: (a.1.into(), b.1.into()),
            category_ids: (a.0.into(), b.0.into()),
            reason: "test".into(),
        }
    }

    #[test]
    fn test_crossing_first_segments_use_intersection() {
        let a = line(
            "a",
            vec![Point::new(0.0, 0.0), Point::new(100.0, 100.0)],
            &[("a1", Point::new(40.0, 40.0))],
        );
        let b = line(
            "b",
            vec![Point::new(0.0, 100.0), Point::new(100.0, 0.0)],
            &[("b1", Point::new(60.0, 40.0))],
        );
        let (placed, skipped) =
            place_transfers(&[rel("t1", ("a", "a1"), ("b", "b1"))], &[a, b], &LayoutConfig::default());
        assert!(skipped.is_empty());
        assert!((placed[0].x - 50.0).abs() < 1e-9);
        assert!((placed[0].y - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_parallel_lines_use_closest_point_midpoint() {
        let a = line(
            "a",
            vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)],
            &[("a1", Point::new(20.0, 0.0))],
        );
        let b = line(
            "b",
            vec![Point::new(0.0, 40.0), Point::new(100.0, 40.0)],
            &[("b1", Point::new(80.0, 40.0))],
        );
        let mut config = LayoutConfig::default();
        config.sample_step = 10.0;
        let (placed, _) = place_transfers(&[rel("t1", ("a", "a1"), ("b", "b1"))], &[a, b], &config);
        // Closest on a to b1 is (80, 0); closest on b to a1 is (20, 40).
        assert!((placed[0].x - 50.0).abs() < 1e-9);
        assert!((placed[0].y - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_far_candidate_falls_back_to_station_midpoint() {
        let a = line(
            "a",
            vec![Point::new(0.0, 0.0), Point::new(1000.0, 0.0)],
            &[("a1", Point::new(900.0, 0.0))],
        );
        // b1 sits off its own short line, far from where the lines come closest.
        let b = line(
            "b",
            vec![Point::new(0.0, 300.0), Point::new(100.0, 300.0)],
            &[("b1", Point::new(950.0, 50.0))],
        );
        let mut config = LayoutConfig::default();
        config.max_transfer_distance = 60.0;
        let at = resolve_position(
            &Polyline::from_segments(&a.segments),
            Point::new(900.0, 0.0),
            &Polyline::from_segments(&b.segments),
            Point::new(950.0, 50.0),
            &config,
        )
        .unwrap();
        assert_eq!(at, Point::new(925.0, 25.0));
    }

    #[test]
    fn test_unreachable_or_unknown_transfers_are_skipped() {
        let a = line(
            "a",
            vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)],
            &[("a1", Point::new(0.0, 0.0))],
        );
        let b = line(
            "b",
            vec![Point::new(0.0, 700.0), Point::new(100.0, 700.0)],
            &[("b1", Point::new(100.0, 700.0))],
        );
        let rels = [
            rel("far", ("a", "a1"), ("b", "b1")),
            rel("ghost", ("a", "a1"), ("c", "c1")),
        ];
        let (placed, skipped) = place_transfers(&rels, &[a, b], &LayoutConfig::default());
        assert!(placed.is_empty());
        assert_eq!(skipped, vec!["far".to_string(), "ghost".to_string()]);
    }

    #[test]
    fn test_non_finite_station_is_rejected() {
        let line = Polyline::new(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]);
        let at = resolve_position(
            &line,
            Point::new(f64::NAN, 0.0),
            &line,
            Point::new(5.0, 0.0),
            &LayoutConfig::default(),
        );
        assert_eq!(at, None);
    }
}
