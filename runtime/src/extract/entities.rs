//! People & entities line: founders, staff, authors, related organizations.

use std::sync::LazyLock;

use regex::Regex;

use super::{
    heading_scoped_list, is_organization_type, json_objects, json_values, Candidate, Extractor,
    FieldChain, Strategy,
};
use crate::catalog::ENTITIES;
use crate::parser::meta::{json_str, json_types};
use crate::parser::ParsedPage;
use crate::types::{dedup_key, Evidence, EvidenceSource};

pub struct EntitiesExtractor;

const PERSON_KEYS: &[&str] = &["founder", "founders", "employee", "employees", "member", "members"];
const RELATED_ORG_KEYS: &[&str] = &["parentOrganization", "subOrganization", "brand", "memberOf", "publisher"];
const TEAM_CARD_LABELS: &[&str] = &["team-member", "staff-member", "team-card", "person-card", "profile-card", "bio-card"];
const TEAM_HEADINGS: &[&str] = &["our team", "meet the", "leadership", "our staff", "our people", "attorneys", "our doctors"];

static FOUNDED_BY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:[Ff]ounded|[Oo]wned|[Ll]ed|[Rr]un|[Ss]tarted) by ((?:Dr\. )?[A-Z][a-z]+(?: [A-Z]\.)?(?: [A-Z][a-zA-Z'-]+){1,2})").unwrap()
});

/// Plausible person or organization name.
pub fn looks_like_name(s: &str) -> bool {
    let len = s.chars().count();
    (2..=60).contains(&len)
        && s.chars().any(|c| c.is_alphabetic())
        && !s.contains('@')
        && !s.starts_with("http")
}

fn structured_named(page: &ParsedPage, keys: &[&str], skip_names: &[String]) -> Vec<Candidate> {
    let mut out = Vec::new();
    for (object, locator) in json_objects(page) {
        for key in keys {
            for v in json_values(object, key) {
                let Some(name) = json_str(v) else {
                    continue;
                };
                if !looks_like_name(&name) || skip_names.contains(&dedup_key(&name)) {
                    continue;
                }
                out.push(Candidate::new(
                    &name,
                    Evidence::new(EvidenceSource::StructuredData, format!("{locator}/{key}"), &name),
                ));
            }
        }
    }
    out
}

fn structured_persons(page: &ParsedPage) -> Vec<Candidate> {
    let mut out: Vec<Candidate> = json_objects(page)
        .into_iter()
        .filter(|(object, _)| json_types(object).iter().any(|t| t == "Person"))
        .filter_map(|(object, locator)| {
            let name = object.get("name").and_then(json_str)?;
            looks_like_name(&name).then(|| {
                Candidate::new(
                    &name,
                    Evidence::new(EvidenceSource::StructuredData, format!("{locator}/name"), &name),
                )
            })
        })
        .collect();
    out.extend(structured_named(page, PERSON_KEYS, &[]));
    out
}

/// Names of the top-level organization items, i.e. the site itself.
fn own_names(page: &ParsedPage) -> Vec<String> {
    page.structured_data
        .iter()
        .filter(|item| item.types().iter().any(|t| is_organization_type(t)))
        .filter_map(|item| item.str_prop("name"))
        .map(|n| dedup_key(&n))
        .collect()
}

fn team_cards(page: &ParsedPage, window: usize, cap: usize) -> Vec<Candidate> {
    let tree = &page.tree;
    let mut out = Vec::new();
    for id in tree.elements() {
        if !tree.labelled_with(id, TEAM_CARD_LABELS) {
            continue;
        }
        let name_node = tree.descendants(id).into_iter().find(|&d| {
            matches!(tree.tag(d), Some("h2" | "h3" | "h4" | "h5" | "strong"))
        });
        let Some(node) = name_node else {
            continue;
        };
        let name = tree.text(node);
        if looks_like_name(&name) {
            out.push(Candidate::new(
                &name,
                Evidence::new(EvidenceSource::Markup, tree.locator(node), &name),
            ));
        }
    }
    out.extend(
        heading_scoped_list(page, TEAM_HEADINGS, window, cap)
            .into_iter()
            .filter(|c| looks_like_name(&c.value)),
    );
    out
}

fn founded_by(page: &ParsedPage) -> Vec<Candidate> {
    let mut out = Vec::new();
    for block in &page.text_blocks {
        for cap in FOUNDED_BY_RE.captures_iter(&block.text) {
            let (Some(all), Some(name)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            out.push(Candidate::new(
                name.as_str(),
                Evidence::new(EvidenceSource::Heuristic, &block.locator, all.as_str()),
            ));
        }
    }
    out
}

fn person_chain() -> FieldChain {
    FieldChain::new(
        "Person",
        vec![
            Strategy::new("json-ld", |page, _| structured_persons(page))
                .when(|page| !page.structured_data.is_empty()),
            Strategy::new("microdata", |page, _| {
                page.microdata
                    .iter()
                    .filter(|item| item.is_type(&["Person"]))
                    .filter_map(|item| {
                        let name = item.first("name")?;
                        looks_like_name(name).then(|| {
                            Candidate::new(
                                name,
                                Evidence::new(EvidenceSource::SemanticMarkup, &item.locator, name),
                            )
                        })
                    })
                    .collect()
            }),
            Strategy::new("team", |page, config| {
                team_cards(page, config.heading_sibling_window, config.list_item_cap)
            }),
            Strategy::new("founded-by", |page, _| founded_by(page)),
        ],
    )
}

fn author_chain() -> FieldChain {
    FieldChain::new(
        "Author",
        vec![
            Strategy::new("json-ld", |page, _| structured_named(page, &["author", "creator"], &[]))
                .when(|page| !page.structured_data.is_empty()),
            Strategy::new("meta", |page, _| {
                page.meta
                    .get("author")
                    .filter(|m| looks_like_name(&m.content))
                    .map(|m| Candidate::new(&m.content, Evidence::new(EvidenceSource::Metadata, &m.locator, &m.content)))
                    .into_iter()
                    .collect()
            }),
            Strategy::new("rel-author", |page, _| {
                let tree = &page.tree;
                tree.elements_by_tag("a")
                    .filter(|&id| tree.attr(id, "rel").is_some_and(|r| r.split_whitespace().any(|r| r == "author")))
                    .filter_map(|id| {
                        let name = tree.text(id);
                        looks_like_name(&name).then(|| {
                            Candidate::new(&name, Evidence::new(EvidenceSource::Markup, tree.locator(id), &name))
                        })
                    })
                    .collect()
            }),
        ],
    )
}

fn organization_chain() -> FieldChain {
    FieldChain::new(
        "Organization",
        vec![
            Strategy::new("json-ld", |page, _| structured_named(page, RELATED_ORG_KEYS, &own_names(page)))
                .when(|page| !page.structured_data.is_empty()),
            Strategy::new("microdata", |page, _| {
                page.microdata
                    .iter()
                    .flat_map(|item| {
                        ["brand", "parentOrganization", "memberOf"]
                            .into_iter()
                            .filter_map(move |k| item.first(k).map(|v| (item, v)))
                    })
                    .filter(|(_, v)| looks_like_name(v))
                    .map(|(item, v)| Candidate::new(v, Evidence::new(EvidenceSource::SemanticMarkup, &item.locator, v)))
                    .collect()
            }),
        ],
    )
}

impl Extractor for EntitiesExtractor {
    fn category_id(&self) -> &'static str {
        ENTITIES
    }

    fn chains(&self) -> Vec<FieldChain> {
        vec![person_chain(), author_chain(), organization_chain()]
    }
}
