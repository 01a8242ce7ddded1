//! 2D primitives for routing, placement and transfer resolution.

use serde::{Deserialize, Serialize};

const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn lerp(&self, other: &Point, t: f64) -> Point {
        Point::new(self.x + (other.x - self.x) * t, self.y + (other.y - self.y) * t)
    }

    pub fn midpoint(&self, other: &Point) -> Point {
        self.lerp(other, 0.5)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub from: Point,
    pub to: Point,
}

impl Segment {
    pub fn new(from: Point, to: Point) -> Self {
        Self { from, to }
    }

    pub fn length(&self) -> f64 {
        self.from.distance(&self.to)
    }
}

/// Proper intersection of two segments.
///
/// `None` when the segments are parallel (or degenerate) or when the
/// crossing lies outside `[0, 1]` on either segment.
pub fn segment_intersection(a: &Segment, b: &Segment) -> Option<Point> {
    let r = (a.to.x - a.from.x, a.to.y - a.from.y);
    let s = (b.to.x - b.from.x, b.to.y - b.from.y);
    let denom = r.0 * s.1 - r.1 * s.0;
    if denom.abs() < EPSILON || !denom.is_finite() {
        return None;
    }
    let qp = (b.from.x - a.from.x, b.from.y - a.from.y);
    let t = (qp.0 * s.1 - qp.1 * s.0) / denom;
    let u = (qp.0 * r.1 - qp.1 * r.0) / denom;
    if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&u) {
        return None;
    }
    let p = a.from.lerp(&a.to, t);
    p.is_finite().then_some(p)
}

pub fn closest_point_on_segment(p: &Point, seg: &Segment) -> Point {
    let d = (seg.to.x - seg.from.x, seg.to.y - seg.from.y);
    let len_sq = d.0 * d.0 + d.1 * d.1;
    if len_sq < EPSILON {
        return seg.from;
    }
    let t = (((p.x - seg.from.x) * d.0 + (p.y - seg.from.y) * d.1) / len_sq).clamp(0.0, 1.0);
    seg.from.lerp(&seg.to, t)
}

/// Ordered vertices of a routed line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub points: Vec<Point>,
}

impl Polyline {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    /// Rebuild the vertex list from consecutive segments.
    pub fn from_segments(segments: &[Segment]) -> Self {
        let mut points = Vec::with_capacity(segments.len() + 1);
        if let Some(first) = segments.first() {
            points.push(first.from);
        }
        points.extend(segments.iter().map(|s| s.to));
        Self { points }
    }

    pub fn segments(&self) -> Vec<Segment> {
        self.points
            .windows(2)
            .map(|w| Segment::new(w[0], w[1]))
            .collect()
    }

    pub fn total_length(&self) -> f64 {
        self.segments().iter().map(Segment::length).sum()
    }

    /// Point at arc length `target` from the start; past the end clamps to
    /// the last vertex, before the start to the first.
    pub fn point_at_length(&self, target: f64) -> Option<Point> {
        let first = *self.points.first()?;
        if !target.is_finite() || target <= 0.0 {
            return Some(first);
        }
        let mut walked = 0.0;
        for seg in self.segments() {
            let len = seg.length();
            if walked + len >= target {
                let t = if len < EPSILON { 0.0 } else { (target - walked) / len };
                return Some(seg.from.lerp(&seg.to, t));
            }
            walked += len;
        }
        self.points.last().copied()
    }

    /// Points every `step` units of arc length, always including both ends.
    pub fn sample(&self, step: f64) -> Vec<Point> {
        let total = self.total_length();
        let Some(first) = self.points.first().copied() else {
            return Vec::new();
        };
        if step.is_nan() || step <= 0.0 || !total.is_finite() || total < EPSILON {
            return vec![first];
        }
        let steps = (total / step).floor() as usize;
        let mut out: Vec<Point> = (0..=steps)
            .filter_map(|i| self.point_at_length(i as f64 * step))
            .collect();
        if let Some(last) = self.points.last() {
            if out.last() != Some(last) {
                out.push(*last);
            }
        }
        out
    }

    /// Nearest sampled point to `p`.
    pub fn closest_sample(&self, p: &Point, step: f64) -> Option<Point> {
        self.sample(step).into_iter().min_by(|a, b| {
            a.distance(p)
                .partial_cmp(&b.distance(p))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
    }

    /// Exact nearest point on the polyline.
    pub fn closest_point(&self, p: &Point) -> Option<Point> {
        if self.points.len() == 1 {
            return self.points.first().copied();
        }
        self.segments()
            .iter()
            .map(|s| closest_point_on_segment(p, s))
            .min_by(|a, b| {
                a.distance(p)
                    .partial_cmp(&b.distance(p))
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    }

    /// SVG-style path with interior corners rounded by quadratic curves.
    pub fn path_description(&self, corner_radius: f64) -> String {
        let pts = &self.points;
        let Some(first) = pts.first() else {
            return String::new();
        };
        let mut d = format!("M {:.2} {:.2}", first.x, first.y);
        for i in 1..pts.len() {
            let here = pts[i];
            let is_corner = i + 1 < pts.len();
            if !is_corner || corner_radius <= 0.0 {
                d.push_str(&format!(" L {:.2} {:.2}", here.x, here.y));
                continue;
            }
            let prev = pts[i - 1];
            let next = pts[i + 1];
            let len_in = prev.distance(&here);
            let len_out = here.distance(&next);
            let r = corner_radius.min(len_in / 2.0).min(len_out / 2.0);
            if r < EPSILON {
                d.push_str(&format!(" L {:.2} {:.2}", here.x, here.y));
                continue;
            }
            let before = here.lerp(&prev, r / len_in);
            let after = here.lerp(&next, r / len_out);
            d.push_str(&format!(
                " L {:.2} {:.2} Q {:.2} {:.2} {:.2} {:.2}",
                before.x, before.y, here.x, here.y, after.x, after.y
            ));
        }
        d
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(ax: f64, ay: f64, bx: f64, by: f64) -> Segment {
        Segment::new(Point::new(ax, ay), Point::new(bx, by))
    }

    #[test]
    fn test_intersection_of_crossing_segments() {
        let p = segment_intersection(&seg(0.0, 0.0, 10.0, 10.0), &seg(0.0, 10.0, 10.0, 0.0)).unwrap();
        assert!((p.x - 5.0).abs() < 1e-9 && (p.y - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_parallel_and_out_of_range_are_none() {
        assert_eq!(segment_intersection(&seg(0.0, 0.0, 10.0, 0.0), &seg(0.0, 1.0, 10.0, 1.0)), None);
        assert_eq!(segment_intersection(&seg(0.0, 0.0, 1.0, 1.0), &seg(5.0, 0.0, 4.0, 1.0)), None);
    }

    #[test]
    fn test_point_at_length_walks_and_clamps() {
        let line = Polyline::new(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 10.0)]);
        assert_eq!(line.total_length(), 20.0);
        assert_eq!(line.point_at_length(15.0), Some(Point::new(10.0, 5.0)));
        assert_eq!(line.point_at_length(500.0), Some(Point::new(10.0, 10.0)));
        assert_eq!(line.point_at_length(-1.0), Some(Point::new(0.0, 0.0)));
        assert_eq!(Polyline::default().point_at_length(1.0), None);
    }

    #[test]
    fn test_from_segments_round_trips_vertices() {
        let line = Polyline::new(vec![Point::new(0.0, 0.0), Point::new(3.0, 4.0), Point::new(6.0, 4.0)]);
        assert_eq!(Polyline::from_segments(&line.segments()), line);
    }

    #[test]
    fn test_sample_includes_both_ends() {
        let line = Polyline::new(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]);
        let samples = line.sample(4.0);
        assert_eq!(samples.first(), Some(&Point::new(0.0, 0.0)));
        assert_eq!(samples.last(), Some(&Point::new(10.0, 0.0)));
        assert_eq!(samples.len(), 4);
    }

    #[test]
    fn test_closest_point() {
        let line = Polyline::new(vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]);
        assert_eq!(line.closest_point(&Point::new(4.0, 3.0)), Some(Point::new(4.0, 0.0)));
        assert_eq!(line.closest_sample(&Point::new(4.5, 3.0), 1.0), Some(Point::new(4.0, 0.0)));
    }

    #[test]
    fn test_path_description_rounds_corners() {
        let line = Polyline::new(vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0), Point::new(100.0, 100.0)]);
        let d = line.path_description(10.0);
        assert_eq!(d, "M 0.00 0.00 L 90.00 0.00 Q 100.00 0.00 100.00 10.00 L 100.00 100.00");
        assert_eq!(line.path_description(0.0), "M 0.00 0.00 L 100.00 0.00 L 100.00 100.00");
    }
}
