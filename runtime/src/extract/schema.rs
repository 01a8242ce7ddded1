//! Schema line: the machine-readable vocabulary a page declares.

use super::identity::meta_candidate;
use super::{Candidate, Extractor, FieldChain, Strategy};
use crate::catalog::SCHEMA;
use crate::parser::links::resolve_href;
use crate::parser::ParsedPage;
use crate::types::{Evidence, EvidenceSource};

pub struct SchemaExtractor;

fn meta_chain(label: &'static str, keys: &'static [&'static str]) -> FieldChain {
    FieldChain::new(
        label,
        vec![Strategy::new("meta", move |page, _| {
            keys.iter()
                .find_map(|k| meta_candidate(page, k))
                .into_iter()
                .collect()
        })],
    )
}

fn schema_types(page: &ParsedPage) -> Vec<Candidate> {
    page.structured_data
        .iter()
        .flat_map(|item| {
            item.types().into_iter().map(move |t| {
                Candidate::new(
                    &t,
                    Evidence::new(EvidenceSource::StructuredData, format!("{}/@type", item.locator), &t),
                )
            })
        })
        .collect()
}

fn microdata_types(page: &ParsedPage) -> Vec<Candidate> {
    page.microdata
        .iter()
        .filter_map(|item| {
            let t = item.item_type.as_deref()?;
            Some(Candidate::new(
                t,
                Evidence::new(EvidenceSource::SemanticMarkup, format!("{}[itemtype]", item.locator), t),
            ))
        })
        .collect()
}

fn canonical_chain() -> FieldChain {
    FieldChain::new(
        "Canonical URL",
        vec![
            Strategy::new("link-canonical", |page, _| {
                page.canonical
                    .as_deref()
                    .and_then(|href| {
                        let abs = resolve_href(href, page.base_url.as_ref())?;
                        Some(Candidate::new(
                            abs,
                            Evidence::new(EvidenceSource::SemanticMarkup, "link[rel=canonical]", href),
                        ))
                    })
                    .into_iter()
                    .collect()
            }),
            Strategy::new("og-url", |page, _| meta_candidate(page, "og:url").into_iter().collect()),
        ],
    )
}

impl Extractor for SchemaExtractor {
    fn category_id(&self) -> &'static str {
        SCHEMA
    }

    fn chains(&self) -> Vec<FieldChain> {
        vec![
            FieldChain::new(
                "Schema Type",
                vec![Strategy::new("json-ld", |page, _| schema_types(page))],
            ),
            FieldChain::new(
                "Microdata Type",
                vec![Strategy::new("microdata", |page, _| microdata_types(page))],
            ),
            meta_chain("Open Graph", &["og:type"]),
            meta_chain("Twitter Card", &["twitter:card"]),
            canonical_chain(),
            meta_chain("Robots", &["robots", "googlebot"]),
        ]
    }
}
