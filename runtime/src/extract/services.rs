//! Services line: what the business sells or does.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::{heading_scoped_list, json_objects, truncate_chars, Candidate, Extractor, FieldChain, Strategy};
use crate::catalog::SERVICES;
use crate::parser::meta::{json_str, json_types};
use crate::parser::ParsedPage;
use crate::types::{Evidence, EvidenceSource};

pub struct ServicesExtractor;

const OFFER_TYPES: &[&str] = &["Service", "Product", "Offer", "MenuItem", "Course"];

/// Headings that introduce a list of offerings.
pub const SERVICE_HEADINGS: &[&str] = &[
    "services",
    "what we do",
    "what we offer",
    "our work",
    "solutions",
    "offerings",
    "products",
    "specialties",
    "specialities",
    "treatments",
    "practice areas",
    "capabilities",
    "menu",
];

static WE_OFFER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bwe (?:offer|provide|specialize in|specialise in)\s+([^.;:!?]{3,200})").unwrap()
});

fn offer_name(object: &Value) -> Option<String> {
    let types = json_types(object);
    if !types.iter().any(|t| OFFER_TYPES.iter().any(|o| o.eq_ignore_ascii_case(t))) {
        return None;
    }
    let is_offer = types.iter().any(|t| t.eq_ignore_ascii_case("Offer"));
    if is_offer && object.get("itemOffered").is_some() {
        // The offered item is visited on its own.
        return None;
    }
    object
        .get("name")
        .and_then(json_str)
        .or_else(|| object.get("serviceType").and_then(json_str))
}

fn structured_services(page: &ParsedPage, cap: usize) -> Vec<Candidate> {
    json_objects(page)
        .into_iter()
        .filter_map(|(object, locator)| {
            let name = truncate_chars(&offer_name(object)?, cap);
            Some(Candidate::new(
                &name,
                Evidence::new(EvidenceSource::StructuredData, locator, &name),
            ))
        })
        .collect()
}

fn microdata_services(page: &ParsedPage, cap: usize) -> Vec<Candidate> {
    page.microdata
        .iter()
        .filter(|item| item.is_type(OFFER_TYPES))
        .filter_map(|item| {
            let name = item.first("name").or_else(|| item.first("serviceType"))?;
            let name = truncate_chars(name, cap);
            Some(Candidate::new(
                &name,
                Evidence::new(EvidenceSource::SemanticMarkup, &item.locator, &name),
            ))
        })
        .collect()
}

/// Split "we offer drain cleaning, water heaters and repiping" into items.
pub fn split_offer_phrase(phrase: &str) -> Vec<String> {
    phrase
        .split(',')
        .flat_map(|part| part.split(" and "))
        .map(|s| {
            s.trim()
                .trim_start_matches("and ")
                .trim_start_matches("or ")
                .trim()
                .to_string()
        })
        .filter(|s| (3..=60).contains(&s.chars().count()))
        .collect()
}

fn text_services(page: &ParsedPage, cap: usize) -> Vec<Candidate> {
    let mut out = Vec::new();
    for block in &page.text_blocks {
        for cap_match in WE_OFFER_RE.captures_iter(&block.text) {
            let Some(phrase) = cap_match.get(1) else {
                continue;
            };
            for item in split_offer_phrase(phrase.as_str()) {
                let value = truncate_chars(&item, cap);
                out.push(Candidate::new(
                    &value,
                    Evidence::new(EvidenceSource::Heuristic, &block.locator, phrase.as_str()),
                ));
            }
        }
    }
    out
}

impl Extractor for ServicesExtractor {
    fn category_id(&self) -> &'static str {
        SERVICES
    }

    fn chains(&self) -> Vec<FieldChain> {
        vec![FieldChain::new(
            "Service",
            vec![
                Strategy::new("json-ld", |page, config| structured_services(page, config.list_item_cap))
                    .when(|page| !page.structured_data.is_empty()),
                Strategy::new("microdata", |page, config| microdata_services(page, config.list_item_cap))
                    .when(|page| !page.microdata.is_empty()),
                Strategy::new("heading-list", |page, config| {
                    heading_scoped_list(
                        page,
                        SERVICE_HEADINGS,
                        config.heading_sibling_window,
                        config.list_item_cap,
                    )
                }),
                Strategy::new("text", |page, config| text_services(page, config.list_item_cap)),
            ],
        )]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::parser::parse;
    use crate::types::DataPoint;

    fn extract(html: &str) -> Vec<DataPoint> {
        let page = parse(html, "https://acme.test/");
        ServicesExtractor.extract(&page, &ScanConfig::default())
    }

    fn values(points: &[DataPoint]) -> Vec<&str> {
        points.iter().map(|p| p.value.as_str()).collect()
    }

    #[test]
    fn test_offer_catalog() {
        let points = extract(
            r#"<html><head><script type="application/ld+json">
            {"@type":"Plumber","name":"Acme Co","hasOfferCatalog":{"@type":"OfferCatalog","name":"Plumbing",
              "itemListElement":[
                {"@type":"Offer","itemOffered":{"@type":"Service","name":"Drain Cleaning"}},
                {"@type":"Offer","name":"Water Heaters"}
              ]}}
            </script></head><body>
            <h2>Services</h2><ul><li>Drain cleaning</li><li>Gutter work</li></ul>
            </body></html>"#,
        );
        assert_eq!(values(&points), vec!["Drain Cleaning", "Water Heaters"]);
        assert_eq!(points[0].evidence.len(), 2);
        assert!(points.iter().all(|p| p.label == "Service"));
    }

    #[test]
    fn test_heading_list_beats_text() {
        let points = extract(
            r#"<html><body>
            <h3>What We Do</h3>
            <ol><li>Kitchen Remodeling</li><li>Bathroom Remodeling</li></ol>
            <p>We offer kitchen remodeling and decks.</p>
            </body></html>"#,
        );
        assert_eq!(values(&points), vec!["Kitchen Remodeling", "Bathroom Remodeling"]);
        assert_eq!(points[0].evidence.len(), 2);
        assert_eq!(points[0].evidence[0].source, EvidenceSource::Markup);
    }

    #[test]
    fn test_we_offer_text_fallback() {
        let points = extract("<p>We offer drain cleaning, water heaters and repiping.</p>");
        assert_eq!(values(&points), vec!["drain cleaning", "water heaters", "repiping"]);
        assert!(points.iter().all(|p| p.evidence[0].source == EvidenceSource::Heuristic));
    }

    #[test]
    fn test_long_items_are_truncated() {
        let long = "x".repeat(120);
        let html = format!("<h2>Services</h2><ul><li>{long}</li></ul>");
        let points = extract(&html);
        assert_eq!(points[0].value.chars().count(), 80);
    }
}
