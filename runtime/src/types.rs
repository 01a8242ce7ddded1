//! Scan data model: evidence, stations (data points), lines (categories),
//! transfers (relationships) and the scan result that ties them together.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a piece of evidence came from. Ordered roughly by reliability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EvidenceSource {
    /// JSON-LD blocks.
    StructuredData,
    /// Microdata scopes and other itemprop-annotated markup.
    SemanticMarkup,
    /// `<meta>` tags, `<title>`, `<html lang>`.
    Metadata,
    /// Script URLs and inline script fingerprints.
    ScriptSignature,
    /// Plain elements and attributes (links, headings, lists).
    Markup,
    /// Regex matches over free text.
    Heuristic,
}

impl EvidenceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            EvidenceSource::StructuredData => "StructuredData",
            EvidenceSource::SemanticMarkup => "SemanticMarkup",
            EvidenceSource::Metadata => "Metadata",
            EvidenceSource::ScriptSignature => "ScriptSignature",
            EvidenceSource::Markup => "Markup",
            EvidenceSource::Heuristic => "Heuristic",
        }
    }
}

/// A record of where and how a fact was observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub source: EvidenceSource,
    /// Location inside the document (element path, JSON pointer, meta key).
    pub locator: String,
    /// Snippet of the original matched content.
    pub raw: String,
}

impl Evidence {
    pub fn new(source: EvidenceSource, locator: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            source,
            locator: locator.into(),
            raw: raw.into(),
        }
    }
}

/// One extracted, evidence-backed fact ("station").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub id: String,
    pub category_id: String,
    /// Semantic type, e.g. "Phone", "Business Name", "Service".
    pub label: String,
    pub value: String,
    /// Always derived by [`crate::scoring::score`].
    pub confidence: f64,
    pub evidence: Vec<Evidence>,
}

impl DataPoint {
    /// Case-insensitive identity of the value within a category.
    pub fn dedup_key(&self) -> String {
        dedup_key(&self.value)
    }

    /// Append evidence entries that are not already present.
    pub fn merge_evidence(&mut self, evidence: &[Evidence]) {
        for e in evidence {
            if !self.evidence.contains(e) {
                self.evidence.push(e.clone());
            }
        }
    }
}

/// Normalized key used to decide whether two values are the same station.
pub fn dedup_key(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Two display colors: one for light themes, one for dark themes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPair {
    pub light: String,
    pub dark: String,
}

impl ColorPair {
    pub fn new(light: &str, dark: &str) -> Self {
        Self {
            light: light.to_string(),
            dark: dark.to_string(),
        }
    }
}

/// A thematic grouping of data points ("line").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub display_name: String,
    pub color_pair: ColorPair,
    pub data_points: Vec<DataPoint>,
    pub visible: bool,
}

impl Category {
    pub fn is_routable(&self) -> bool {
        self.visible && !self.data_points.is_empty()
    }
}

/// A detected link between two data points in different categories ("transfer").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    pub data_point_ids: (String, String),
    pub category_ids: (String, String),
    pub reason: String,
}

/// The complete, immutable output of one page scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    pub source_url: String,
    pub timestamp: DateTime<Utc>,
    pub title: String,
    pub categories: Vec<Category>,
    pub relationships: Vec<Relationship>,
}

impl ScanResult {
    /// Look up a data point anywhere in the result.
    pub fn data_point(&self, id: &str) -> Option<&DataPoint> {
        self.categories
            .iter()
            .flat_map(|c| c.data_points.iter())
            .find(|p| p.id == id)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Total number of stations across all lines.
    pub fn station_count(&self) -> usize {
        self.categories.iter().map(|c| c.data_points.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_key_collapses_case_and_whitespace() {
        assert_eq!(dedup_key("  Acme   Co "), "acme co");
        assert_eq!(dedup_key("ACME CO"), dedup_key("acme co"));
    }

    #[test]
    fn test_merge_evidence_skips_duplicates() {
        let e = Evidence::new(EvidenceSource::Markup, "html/body/p", "Acme");
        let mut point = DataPoint {
            id: "identity-1".to_string(),
            category_id: "identity".to_string(),
            label: "Business Name".to_string(),
            value: "Acme".to_string(),
            confidence: 0.0,
            evidence: vec![e.clone()],
        };
        point.merge_evidence(&[e.clone(), Evidence::new(EvidenceSource::Metadata, "title", "Acme")]);
        assert_eq!(point.evidence.len(), 2);
    }
}
