//! End-to-end scan: markup in, [`ScanResult`] out.
//!
//! Stages run in a fixed order: parse, extract (fanned out per extractor),
//! dynamic categories, scoring, category assembly, routing, and transfer
//! detection. This is the only place degradations are logged.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::catalog::{self, CategoryDefinition};
use crate::config::{Config, ScanConfig};
use crate::dynamic;
use crate::extract;
use crate::layout::{LayoutCache, LayoutEngine, LayoutResult};
use crate::parser::{self, ParsedPage};
use crate::relationships::{RuleContext, TransferDetector};
use crate::scoring;
use crate::types::{Category, DataPoint, ScanResult};

/// Scan with the current time as the timestamp.
pub fn scan(markup: &str, source_url: &str, config: &Config) -> ScanResult {
    scan_at(markup, source_url, Utc::now(), config)
}

/// Scan with an injected timestamp; identical inputs give identical results.
pub fn scan_at(
    markup: &str,
    source_url: &str,
    timestamp: DateTime<Utc>,
    config: &Config,
) -> ScanResult {
    let page = parser::parse(markup, source_url);
    for w in &page.warnings {
        warn!(kind = ?w.kind, locator = %w.locator, "parse warning: {}", w.message);
    }

    let scan_config = config.scan.clone().validated();
    let points = extract_all(&page, &scan_config);
    debug!(count = points.len(), "extracted data points");

    let (definitions, mut points) = if scan_config.dynamic_categories {
        let definitions = dynamic::reduce(&[], &points, &scan_config);
        let assigned = dynamic::assign(&points, &definitions);
        (definitions, assigned)
    } else {
        (Vec::new(), points)
    };
    scoring::score_all(&mut points);

    let categories = build_categories(&definitions, points);

    let engine = LayoutEngine::new(config.layout.clone());
    let lines = engine.route_categories(&categories);
    let detector = TransferDetector::with_default_rules(engine.config().max_transfers_per_pair);
    let relationships = detector.detect(&RuleContext {
        categories: &categories,
        lines: &lines,
    });

    let result = ScanResult {
        source_url: source_url.to_string(),
        timestamp,
        title: page.title.clone(),
        categories,
        relationships,
    };
    info!(
        url = %result.source_url,
        categories = result.categories.len(),
        stations = result.station_count(),
        transfers = result.relationships.len(),
        "scan complete"
    );
    result
}

/// Run every fixed extractor in parallel and concatenate in extractor order.
pub fn extract_all(page: &ParsedPage, config: &ScanConfig) -> Vec<DataPoint> {
    let extractors = extract::default_extractors();
    extractors
        .par_iter()
        .map(|e| e.extract(page, config))
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

/// Proposed categories first (empty ones kept but hidden), then any fixed
/// category that still holds points, in catalog order.
pub fn build_categories(definitions: &[CategoryDefinition], points: Vec<DataPoint>) -> Vec<Category> {
    let mut ordered: Vec<CategoryDefinition> = definitions.to_vec();
    let mut seen: HashSet<String> = ordered.iter().map(|d| d.id.clone()).collect();
    for fixed in catalog::fixed_categories() {
        if !seen.contains(&fixed.id) && points.iter().any(|p| p.category_id == fixed.id) {
            seen.insert(fixed.id.clone());
            ordered.push(fixed);
        }
    }

    let mut categories: Vec<Category> = ordered
        .into_iter()
        .map(|d| Category {
            id: d.id,
            display_name: d.display_name,
            color_pair: d.color_pair,
            data_points: Vec::new(),
            visible: true,
        })
        .collect();

    for point in points {
        match categories.iter_mut().find(|c| c.id == point.category_id) {
            Some(category) => category.data_points.push(point),
            None => debug!(id = %point.id, category = %point.category_id, "point without a category dropped"),
        }
    }
    for category in &mut categories {
        category.visible = !category.data_points.is_empty();
    }
    categories
}

static LAYOUTS: LazyLock<LayoutCache> = LazyLock::new(LayoutCache::new);

/// Lay out a finished scan through the process-wide [`LayoutCache`], logging
/// transfers that could not be placed.
pub fn layout(scan: &ScanResult, config: &Config) -> LayoutResult {
    let engine = LayoutEngine::new(config.layout.clone());
    let result = LAYOUTS.get_or_compute(scan, &engine).as_ref().clone();
    for id in &result.skipped_transfers {
        warn!(transfer = %id, "transfer skipped: no safe position");
    }
    result
}
