//! Identity line: who the site is.

use std::sync::LazyLock;

use regex::Regex;

use super::{is_organization_type, Candidate, Extractor, FieldChain, Strategy};
use crate::catalog::IDENTITY;
use crate::parser::links::resolve_href;
use crate::parser::meta::json_str;
use crate::parser::ParsedPage;
use crate::types::{Evidence, EvidenceSource};

static FOUNDED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:established|founded|since|est\.)\s+(?:in\s+)?((?:18|19|20)\d{2})\b").unwrap()
});

const TITLE_SEPARATORS: &[&str] = &[" | ", " - ", " – ", " — ", " :: ", ": ", " · "];

pub struct IdentityExtractor;

/// Structured-data candidates for one property of every organization item.
pub(crate) fn org_property(page: &ParsedPage, key: &str) -> Vec<Candidate> {
    page.structured_data
        .iter()
        .filter(|item| item.types().iter().any(|t| is_organization_type(t)))
        .filter_map(|item| {
            let value = item.str_prop(key)?;
            Some(Candidate::new(
                &value,
                Evidence::new(
                    EvidenceSource::StructuredData,
                    format!("{}/{key}", item.locator),
                    &value,
                ),
            ))
        })
        .collect()
}

/// Microdata candidates for one property of every organization scope.
pub(crate) fn microdata_org_property(page: &ParsedPage, key: &str) -> Vec<Candidate> {
    page.microdata
        .iter()
        .filter(|item| item.item_type.as_deref().is_some_and(is_organization_type))
        .filter_map(|item| {
            let value = item.first(key)?;
            Some(Candidate::new(
                value,
                Evidence::new(
                    EvidenceSource::SemanticMarkup,
                    format!("{}@{key}", item.locator),
                    value,
                ),
            ))
        })
        .collect()
}

pub(crate) fn meta_candidate(page: &ParsedPage, key: &str) -> Option<Candidate> {
    let entry = page.meta.get(key)?;
    Some(Candidate::new(
        &entry.content,
        Evidence::new(EvidenceSource::Metadata, &entry.locator, &entry.content),
    ))
}

fn resolved(page: &ParsedPage, candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates
        .into_iter()
        .map(|mut c| {
            if let Some(abs) = resolve_href(&c.value, page.base_url.as_ref()) {
                c.value = abs;
            }
            c
        })
        .collect()
}

/// Pick the title segment that names the site.
///
/// "Drain Cleaning | Acme Co" → "Acme Co" when the host is `acme.test`;
/// otherwise the first segment.
pub fn business_name_from_title(title: &str, domain_token: &str) -> Option<String> {
    let mut segments = vec![title.trim().to_string()];
    for sep in TITLE_SEPARATORS {
        segments = segments
            .iter()
            .flat_map(|s| s.split(sep).map(|p| p.trim().to_string()))
            .filter(|s| !s.is_empty())
            .collect();
    }
    if segments.is_empty() {
        return None;
    }
    let squash = |s: &str| -> String {
        s.chars()
            .filter(|c| c.is_alphanumeric())
            .collect::<String>()
            .to_lowercase()
    };
    if domain_token.len() >= 3 {
        if let Some(named) = segments.iter().find(|s| squash(s).contains(domain_token)) {
            return Some(named.clone());
        }
    }
    segments.into_iter().next()
}

fn business_name_chain() -> FieldChain {
    FieldChain::new(
        "Business Name",
        vec![
            Strategy::new("json-ld", |page, _| org_property(page, "name"))
                .when(|page| !page.structured_data.is_empty()),
            Strategy::new("microdata", |page, _| microdata_org_property(page, "name"))
                .when(|page| !page.microdata.is_empty()),
            Strategy::new("site-name", |page, _| {
                ["og:site_name", "application-name"]
                    .iter()
                    .filter_map(|k| meta_candidate(page, k))
                    .take(1)
                    .collect()
            }),
            Strategy::new("title", |page, _| {
                business_name_from_title(&page.title, &page.domain_token)
                    .map(|name| {
                        Candidate::new(
                            &name,
                            Evidence::new(EvidenceSource::Metadata, "title", &page.title),
                        )
                    })
                    .into_iter()
                    .collect()
            }),
        ],
    )
}

fn description_chain() -> FieldChain {
    FieldChain::new(
        "Description",
        vec![
            Strategy::new("json-ld", |page, _| org_property(page, "description")),
            Strategy::new("microdata", |page, _| microdata_org_property(page, "description")),
            Strategy::new("meta", |page, _| {
                meta_candidate(page, "description")
                    .or_else(|| meta_candidate(page, "og:description"))
                    .into_iter()
                    .collect()
            }),
        ],
    )
}

fn logo_chain() -> FieldChain {
    FieldChain::new(
        "Logo",
        vec![
            Strategy::new("json-ld", |page, _| resolved(page, org_property(page, "logo"))),
            Strategy::new("microdata", |page, _| {
                resolved(page, microdata_org_property(page, "logo"))
            }),
            Strategy::new("og-image", |page, _| {
                resolved(page, meta_candidate(page, "og:image").into_iter().collect())
            }),
            Strategy::new("icon", |page, _| {
                let tree = &page.tree;
                tree.elements_by_tag("link")
                    .filter(|&id| {
                        tree.attr(id, "rel")
                            .is_some_and(|r| r.to_ascii_lowercase().contains("icon"))
                    })
                    .filter_map(|id| {
                        let href = tree.attr(id, "href")?;
                        let abs = resolve_href(href, page.base_url.as_ref())?;
                        Some(Candidate::new(
                            abs,
                            Evidence::new(EvidenceSource::Markup, tree.locator(id), href),
                        ))
                    })
                    .take(1)
                    .collect()
            }),
        ],
    )
}

fn brand_color_chain() -> FieldChain {
    FieldChain::new(
        "Brand Color",
        vec![
            Strategy::new("theme-color", |page, _| {
                page.styles
                    .theme_color
                    .iter()
                    .map(|c| {
                        Candidate::new(
                            c.to_lowercase(),
                            Evidence::new(EvidenceSource::Metadata, "meta[name=theme-color]", c),
                        )
                    })
                    .collect()
            }),
            Strategy::new("stylesheet", |page, _| {
                page.styles
                    .colors
                    .first()
                    .map(|c| {
                        Candidate::new(c, Evidence::new(EvidenceSource::Heuristic, "style", c))
                    })
                    .into_iter()
                    .collect()
            }),
        ],
    )
}

fn founded_chain() -> FieldChain {
    FieldChain::new(
        "Founded",
        vec![
            Strategy::new("json-ld", |page, _| {
                org_property(page, "foundingDate")
                    .into_iter()
                    .map(|mut c| {
                        c.value = c.value.chars().take(4).collect();
                        c
                    })
                    .collect()
            }),
            Strategy::new("text", |page, _| {
                page.text_blocks
                    .iter()
                    .find_map(|block| {
                        let cap = FOUNDED_RE.captures(&block.text)?;
                        let year = cap.get(1)?.as_str();
                        let raw = cap.get(0)?.as_str();
                        Some(Candidate::new(
                            year,
                            Evidence::new(EvidenceSource::Heuristic, &block.locator, raw),
                        ))
                    })
                    .into_iter()
                    .collect()
            }),
        ],
    )
}

fn language_chain() -> FieldChain {
    FieldChain::new(
        "Language",
        vec![
            Strategy::new("html-lang", |page, _| {
                page.lang
                    .iter()
                    .map(|l| {
                        Candidate::new(l, Evidence::new(EvidenceSource::Metadata, "html[lang]", l))
                    })
                    .collect()
            }),
            Strategy::new("meta", |page, _| {
                meta_candidate(page, "content-language")
                    .or_else(|| meta_candidate(page, "og:locale"))
                    .map(|mut c| {
                        c.value = c.value.replace('_', "-");
                        c
                    })
                    .into_iter()
                    .collect()
            }),
            Strategy::new("json-ld", |page, _| {
                page.structured_data
                    .iter()
                    .filter_map(|item| {
                        let lang = item.value.get("inLanguage").and_then(json_str)?;
                        Some(Candidate::new(
                            &lang,
                            Evidence::new(
                                EvidenceSource::StructuredData,
                                format!("{}/inLanguage", item.locator),
                                &lang,
                            ),
                        ))
                    })
                    .take(1)
                    .collect()
            }),
        ],
    )
}

impl Extractor for IdentityExtractor {
    fn category_id(&self) -> &'static str {
        IDENTITY
    }

    fn chains(&self) -> Vec<FieldChain> {
        vec![
            business_name_chain(),
            description_chain(),
            logo_chain(),
            brand_color_chain(),
            founded_chain(),
            language_chain(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::parser::parse;
    use crate::types::DataPoint;

    fn extract(html: &str) -> Vec<DataPoint> {
        let page = parse(html, "https://www.acme.test/");
        IdentityExtractor.extract(&page, &ScanConfig::default())
    }

    fn value_of<'a>(points: &'a [DataPoint], label: &str) -> Option<&'a str> {
        points.iter().find(|p| p.label == label).map(|p| p.value.as_str())
    }

    #[test]
    fn test_title_segment_naming_the_site() {
        assert_eq!(
            business_name_from_title("Drain Cleaning | Acme Co", "acme").as_deref(),
            Some("Acme Co")
        );
        assert_eq!(
            business_name_from_title("Welcome - Springfield Plumbing", "zzz").as_deref(),
            Some("Welcome")
        );
        assert_eq!(business_name_from_title("   ", "acme"), None);
    }

    #[test]
    fn test_structured_name_wins_and_title_corroborates() {
        let points = extract(
            r#"<html lang="en"><head><title>Home | Acme Co</title>
            <script type="application/ld+json">{"@type":"LocalBusiness","name":"Acme Co","foundingDate":"1998-04-01"}</script>
            </head><body></body></html>"#,
        );
        let name = points.iter().find(|p| p.label == "Business Name").unwrap();
        assert_eq!(name.value, "Acme Co");
        assert_eq!(name.evidence.len(), 2);
        assert_eq!(name.evidence[0].source, EvidenceSource::StructuredData);
        assert_eq!(value_of(&points, "Founded"), Some("1998"));
        assert_eq!(value_of(&points, "Language"), Some("en"));
        assert!(points.iter().all(|p| p.confidence == 0.0));
    }

    #[test]
    fn test_fallbacks_without_structured_data() {
        let points = extract(
            r##"<html><head><title>Springfield's best | Acme Plumbing</title>
            <meta name="description" content="Family plumbers since 1987.">
            <meta name="theme-color" content="#FF6600">
            <link rel="icon" href="/favicon.png">
            </head><body><p>Family owned and founded in 1987.</p></body></html>"##,
        );
        assert_eq!(value_of(&points, "Business Name"), Some("Acme Plumbing"));
        assert_eq!(value_of(&points, "Description"), Some("Family plumbers since 1987."));
        assert_eq!(value_of(&points, "Brand Color"), Some("#ff6600"));
        assert_eq!(value_of(&points, "Logo"), Some("https://www.acme.test/favicon.png"));
        assert_eq!(value_of(&points, "Founded"), Some("1987"));
    }

    #[test]
    fn test_empty_page_has_no_identity() {
        assert!(extract("").is_empty());
    }
}
