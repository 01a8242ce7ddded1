//! Layout engine: Line Router → Station Placer → Transfer Clusterer.
//!
//! Layout is a pure function of a [`ScanResult`] and a [`LayoutConfig`].
//! Routing fans out per category; everything else is sequential.

pub mod cache;
pub mod clusterer;
pub mod geometry;
pub mod placer;
pub mod router;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::LayoutConfig;
use crate::types::{Category, ScanResult};

pub use cache::LayoutCache;
pub use clusterer::PlacedRelationship;
pub use geometry::{Point, Polyline, Segment};
pub use placer::{LabelSide, PlacedDataPoint};
pub use router::RoutedLine;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutLine {
    pub category_id: String,
    pub path_description: String,
    pub segments: Vec<Segment>,
    pub placed_data_points: Vec<PlacedDataPoint>,
    pub total_length: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutResult {
    pub width: f64,
    pub height: f64,
    pub lines: Vec<LayoutLine>,
    pub transfers: Vec<PlacedRelationship>,
    /// Relationship ids that had no safe position.
    pub skipped_transfers: Vec<String>,
}

impl LayoutResult {
    pub fn line(&self, category_id: &str) -> Option<&LayoutLine> {
        self.lines.iter().find(|l| l.category_id == category_id)
    }
}

pub struct LayoutEngine {
    config: LayoutConfig,
}

impl LayoutEngine {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config: config.validated(),
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Route and place every routable category. Lanes are assigned by the
    /// category's position among the routable ones.
    pub fn route_categories(&self, categories: &[Category]) -> Vec<LayoutLine> {
        let routable: Vec<&Category> = categories.iter().filter(|c| c.is_routable()).collect();
        let total = routable.len();
        routable
            .par_iter()
            .enumerate()
            .map(|(index, category)| self.route_category(category, index, total))
            .collect()
    }

    fn route_category(&self, category: &Category, index: usize, total: usize) -> LayoutLine {
        let routed = router::route(
            &category.id,
            category.data_points.len(),
            index,
            total,
            &self.config,
        );
        let placed_data_points = placer::place(
            &category.data_points,
            &routed.polyline,
            routed.total_length,
            self.config.end_padding,
        );
        LayoutLine {
            category_id: routed.category_id,
            path_description: routed.path,
            segments: routed.segments,
            placed_data_points,
            total_length: routed.total_length,
        }
    }

    pub fn layout(&self, scan: &ScanResult) -> LayoutResult {
        let lines = self.route_categories(&scan.categories);
        let (transfers, skipped_transfers) =
            clusterer::place_transfers(&scan.relationships, &lines, &self.config);
        LayoutResult {
            width: self.config.canvas_width,
            height: self.config.canvas_height,
            lines,
            transfers,
            skipped_transfers,
        }
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColorPair, DataPoint};
    use chrono::{TimeZone, Utc};

    fn category(id: &str, n: usize, visible: bool) -> Category {
        Category {
            id: id.into(),
            display_name: id.into(),
            color_pair: ColorPair::new("#000000", "#ffffff"),
            data_points: (0..n)
                .map(|i| DataPoint {
                    id: format!("{id}-{i}"),
                    category_id: id.into(),
                    label: "L".into(),
                    value: format!("value {i}"),
                    confidence: 0.5,
                    evidence: Vec::new(),
                })
                .collect(),
            visible,
        }
    }

    #[test]
    fn test_only_routable_categories_get_lines() {
        let engine = LayoutEngine::default();
        let lines = engine.route_categories(&[
            category("identity", 2, true),
            category("services", 0, true),
            category("pages", 3, false),
            category("schema", 1, true),
        ]);
        let ids: Vec<&str> = lines.iter().map(|l| l.category_id.as_str()).collect();
        assert_eq!(ids, vec!["identity", "schema"]);
        assert_eq!(lines[0].placed_data_points.len(), 2);
        assert_eq!(lines[1].placed_data_points[0].t, 0.5);
    }

    #[test]
    fn test_layout_is_deterministic_and_sized() {
        let scan = ScanResult {
            source_url: "https://acme.test/".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            title: "Acme".into(),
            categories: vec![category("identity", 3, true), category("contacts", 2, true)],
            relationships: Vec::new(),
        };
        let engine = LayoutEngine::default();
        let first = engine.layout(&scan);
        assert_eq!(first, engine.layout(&scan));
        assert_eq!(first.width, 1200.0);
        assert_eq!(first.lines.len(), 2);
        assert!(first.line("contacts").is_some());
    }
}
