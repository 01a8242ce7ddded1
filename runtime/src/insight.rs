//! Optional insight collaborator.
//!
//! The engine only builds a compact text digest of a scan and parses replies.
//! Talking to an actual model is up to whoever implements [`InsightProvider`].

use serde::{Deserialize, Serialize};

use crate::error::{MetroError, Result};
use crate::types::{DataPoint, ScanResult};

/// Points per category included in a digest.
pub const DIGEST_POINTS_PER_CATEGORY: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Insights {
    pub summary: String,
    pub seo_notes: Vec<String>,
    pub tech_assessment: String,
    pub competitive_notes: Vec<String>,
    pub key_findings: Vec<String>,
}

/// Something that can answer questions about a digest.
pub trait InsightProvider: Send + Sync {
    /// Raw reply to a whole-scan digest; expected to contain an [`Insights`] JSON object.
    fn insights(&self, digest: &str) -> Result<String>;

    /// A short plain-text note about one station.
    fn station_note(&self, point: &DataPoint, context: &str) -> Result<String>;
}

fn top_points(points: &[DataPoint], n: usize) -> Vec<&DataPoint> {
    let mut sorted: Vec<&DataPoint> = points.iter().collect();
    sorted.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted.truncate(n);
    sorted
}

/// Text digest: scan header, then up to `per_category` top-confidence points
/// for each visible category.
pub fn digest(scan: &ScanResult, per_category: usize) -> String {
    let mut out = format!("Site: {}\nTitle: {}\n", scan.source_url, scan.title);
    for category in scan.categories.iter().filter(|c| c.visible) {
        out.push_str(&format!(
            "\n## {} ({} points)\n",
            category.display_name,
            category.data_points.len()
        ));
        for p in top_points(&category.data_points, per_category) {
            out.push_str(&format!(
                "- {}: {} ({:.0}%)\n",
                p.label,
                p.value,
                p.confidence * 100.0
            ));
        }
    }
    out
}

/// Outermost JSON object in a reply, tolerating code fences and chatter.
fn json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

pub fn parse_insights(reply: &str) -> Result<Insights> {
    let trimmed = reply
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```");
    let body = json_object(trimmed)
        .ok_or_else(|| MetroError::Insight("reply contains no JSON object".into()))?;
    serde_json::from_str(body).map_err(|e| MetroError::Insight(format!("malformed insights: {e}")))
}

/// Digest the scan, ask the provider and parse its reply.
pub fn request_insights(provider: &dyn InsightProvider, scan: &ScanResult) -> Result<Insights> {
    let reply = provider.insights(&digest(scan, DIGEST_POINTS_PER_CATEGORY))?;
    parse_insights(&reply)
}

/// Note for a single station, with the site title and the station's line as context.
pub fn request_station_note(
    provider: &dyn InsightProvider,
    scan: &ScanResult,
    point_id: &str,
) -> Result<String> {
    let point = scan
        .data_point(point_id)
        .ok_or_else(|| MetroError::Insight(format!("unknown data point {point_id}")))?;
    let line = scan
        .category(&point.category_id)
        .map(|c| c.display_name.as_str())
        .unwrap_or_default();
    let context = format!("Site: {} ({})\nLine: {line}", scan.title, scan.source_url);
    Ok(provider.station_note(point, &context)?.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, ColorPair};
    use chrono::{TimeZone, Utc};

    fn scan_with(n: usize) -> ScanResult {
        let points = (0..n)
            .map(|i| DataPoint {
                id: format!("services-{i}"),
                category_id: "services".into(),
                label: "Service".into(),
                value: format!("Service {i}"),
                confidence: i as f64 / 100.0,
                evidence: Vec::new(),
            })
            .collect();
        ScanResult {
            source_url: "https://acme.test/".into(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            title: "Acme Co".into(),
            categories: vec![Category {
                id: "services".into(),
                display_name: "Services".into(),
                color_pair: ColorPair::new("#00782a", "#3fbf6a"),
                data_points: points,
                visible: true,
            }],
            relationships: Vec::new(),
        }
    }

    #[test]
    fn test_digest_keeps_top_points_only() {
        let text = digest(&scan_with(12), DIGEST_POINTS_PER_CATEGORY);
        assert!(text.contains("## Services (12 points)"));
        assert_eq!(text.matches("\n- Service:").count(), 8);
        assert!(text.contains("Service 11 (11%)"));
        assert!(!text.contains("Service 3 "));
    }

    #[test]
    fn test_parse_fenced_reply() {
        let reply = "```json\n{\"summary\": \"A plumber\", \"key_findings\": [\"has phone\"]}\n```";
        let insights = parse_insights(reply).unwrap();
        assert_eq!(insights.summary, "A plumber");
        assert_eq!(insights.key_findings, vec!["has phone".to_string()]);
        assert!(insights.seo_notes.is_empty());
    }

    #[test]
    fn test_parse_rejects_prose() {
        assert!(matches!(
            parse_insights("Sorry, I cannot help."),
            Err(MetroError::Insight(_))
        ));
    }

    struct Canned;

    impl InsightProvider for Canned {
        fn insights(&self, digest: &str) -> Result<String> {
            Ok(format!("Here you go: {{\"summary\": \"{} lines\"}}", digest.matches("## ").count()))
        }

        fn station_note(&self, point: &DataPoint, _context: &str) -> Result<String> {
            Ok(format!("  {} looks solid.\n", point.value))
        }
    }

    #[test]
    fn test_provider_round_trip() {
        let scan = scan_with(2);
        assert_eq!(request_insights(&Canned, &scan).unwrap().summary, "1 lines");
        assert_eq!(
            request_station_note(&Canned, &scan, "services-1").unwrap(),
            "Service 1 looks solid."
        );
        assert!(request_station_note(&Canned, &scan, "nope").is_err());
    }
}
