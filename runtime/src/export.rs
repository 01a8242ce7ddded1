//! Export projections of a finished scan: JSON document, flat CSV, and a
//! normalized business record.

use serde::{Deserialize, Serialize};

use crate::catalog;
use crate::error::Result;
use crate::types::{DataPoint, Relationship, ScanResult};

pub const CSV_HEADER: &str = "category,label,value,confidence,evidence_sources";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub url: String,
    pub scanned_at: String,
    pub title: String,
    pub categories: Vec<ExportCategory>,
    pub relationships: Vec<Relationship>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportCategory {
    pub id: String,
    pub name: String,
    pub data_points: Vec<DataPoint>,
}

impl ExportDocument {
    /// Visible categories only, in map order.
    pub fn from_scan(scan: &ScanResult) -> Self {
        Self {
            url: scan.source_url.clone(),
            scanned_at: scan.timestamp.to_rfc3339(),
            title: scan.title.clone(),
            categories: scan
                .categories
                .iter()
                .filter(|c| c.visible)
                .map(|c| ExportCategory {
                    id: c.id.clone(),
                    name: c.display_name.clone(),
                    data_points: c.data_points.clone(),
                })
                .collect(),
            relationships: scan.relationships.clone(),
        }
    }
}

pub fn to_json(scan: &ScanResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(&ExportDocument::from_scan(scan))?)
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Distinct evidence sources of a point, first-seen order.
fn evidence_sources(point: &DataPoint) -> String {
    let mut sources: Vec<&str> = Vec::new();
    for e in &point.evidence {
        let name = e.source.as_str();
        if !sources.contains(&name) {
            sources.push(name);
        }
    }
    sources.join(";")
}

/// One row per data point; confidence as a whole percentage.
pub fn to_csv(scan: &ScanResult) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for category in scan.categories.iter().filter(|c| c.visible) {
        for point in &category.data_points {
            let row = [
                csv_field(&category.display_name),
                csv_field(&point.label),
                csv_field(&point.value),
                format!("{}%", (point.confidence * 100.0).round() as i64),
                csv_field(&evidence_sources(point)),
            ];
            out.push_str(&row.join(","));
            out.push('\n');
        }
    }
    out
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub business_name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub hours: String,
    pub website: String,
    pub services: Vec<String>,
}

/// First value for `label`, preferring `category_id` and then any category
/// (dynamic themes may have taken the point).
fn lookup(scan: &ScanResult, category_id: &str, label: &str) -> Option<String> {
    let in_category = scan
        .category(category_id)
        .and_then(|c| c.data_points.iter().find(|p| p.label == label));
    in_category
        .or_else(|| {
            scan.categories
                .iter()
                .flat_map(|c| c.data_points.iter())
                .find(|p| p.label == label)
        })
        .map(|p| p.value.clone())
}

impl BusinessRecord {
    pub fn from_scan(scan: &ScanResult) -> Self {
        let get = |category: &str, label: &str| lookup(scan, category, label).unwrap_or_default();
        let website = lookup(scan, catalog::SCHEMA, "Canonical URL")
            .unwrap_or_else(|| scan.source_url.clone());
        Self {
            business_name: get(catalog::IDENTITY, "Business Name"),
            phone: get(catalog::CONTACTS, "Phone"),
            email: get(catalog::CONTACTS, "Email"),
            address: get(catalog::CONTACTS, "Address"),
            hours: get(catalog::CONTACTS, "Hours"),
            website,
            services: scan
                .categories
                .iter()
                .flat_map(|c| c.data_points.iter())
                .filter(|p| p.label == "Service")
                .map(|p| p.value.clone())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, ColorPair, Evidence, EvidenceSource};
    use assert_json_diff::assert_json_include;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn point(category: &str, label: &str, value: &str, sources: &[EvidenceSource]) -> DataPoint {
        DataPoint {
            id: format!("{category}-{label}"),
            category_id: category.into(),
            label: label.into(),
            value: value.into(),
            confidence: 0.95,
            evidence: sources
                .iter()
                .map(|s| Evidence::new(*s, "loc", value))
                .collect(),
        }
    }

    fn scan() -> ScanResult {
        let category = |id: &str, name: &str, points: Vec<DataPoint>| Category {
            id: id.into(),
            display_name: name.into(),
            color_pair: ColorPair::new("#000000", "#ffffff"),
            visible: !points.is_empty(),
            data_points: points,
        };
        ScanResult {
            source_url: "https://acme.test/".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            title: "Acme Co".into(),
            categories: vec![
                category(
                    "identity",
                    "Identity",
                    vec![point("identity", "Business Name", "Acme Co", &[EvidenceSource::StructuredData])],
                ),
                category(
                    "contacts",
                    "Contacts",
                    vec![point(
                        "contacts",
                        "Phone",
                        "(555) 123-4567",
                        &[
                            EvidenceSource::StructuredData,
                            EvidenceSource::Heuristic,
                            EvidenceSource::Heuristic,
                        ],
                    )],
                ),
                category(
                    "health",
                    "Health & Wellness",
                    vec![point("health", "Service", "Teeth cleaning, polishing", &[EvidenceSource::Markup])],
                ),
                category("services", "Services", Vec::new()),
            ],
            relationships: Vec::new(),
        }
    }

    #[test]
    fn test_json_document_shape() {
        let doc: serde_json::Value = serde_json::from_str(&to_json(&scan()).unwrap()).unwrap();
        assert_json_include!(
            actual: doc,
            expected: json!({
                "url": "https://acme.test/",
                "scanned_at": "2024-05-01T12:00:00+00:00",
                "categories": [
                    {"id": "identity", "data_points": [{"value": "Acme Co"}]},
                    {"id": "contacts"},
                    {"id": "health"}
                ]
            })
        );
    }

    #[test]
    fn test_csv_rows_quote_and_join_sources() {
        let csv = to_csv(&scan());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[2], "Contacts,Phone,(555) 123-4567,95%,StructuredData;Heuristic");
        assert_eq!(
            lines[3],
            "Health & Wellness,Service,\"Teeth cleaning, polishing\",95%,Markup"
        );
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_business_record_defaults_to_empty() {
        let record = BusinessRecord::from_scan(&scan());
        assert_eq!(record.business_name, "Acme Co");
        assert_eq!(record.phone, "(555) 123-4567");
        assert_eq!(record.email, "");
        assert_eq!(record.website, "https://acme.test/");
        assert_eq!(record.services, vec!["Teeth cleaning, polishing".to_string()]);
    }
}
