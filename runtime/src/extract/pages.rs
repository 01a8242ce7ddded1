//! Pages line: where the site sends visitors.

use url::Url;

use super::{Candidate, Extractor, FieldChain, Strategy};
use crate::catalog::PAGES;
use crate::parser::links::platform_for;
use crate::parser::{Link, ParsedPage};
use crate::types::{Evidence, EvidenceSource};

pub struct PagesExtractor;

/// Path fragments that mark a page worth its own station.
pub const KEY_PAGE_MARKERS: &[&str] = &[
    "about", "contact", "pricing", "services", "blog", "careers", "jobs", "faq", "team", "shop",
    "menu", "book", "appointment", "locations", "portfolio", "reviews", "testimonials",
];

const MAX_PAGE_LABEL: usize = 60;

fn same_site(page: &ParsedPage, url: &Url) -> bool {
    match (page.base_url.as_ref().and_then(|b| b.host_str()), url.host_str()) {
        (Some(base), Some(host)) => {
            let strip = |h: &str| h.trim_start_matches("www.").to_ascii_lowercase();
            strip(base) == strip(host)
        }
        _ => true,
    }
}

/// Station value for a link: its text, or the last path segment.
fn page_name(link: &Link) -> Option<String> {
    if !link.text.is_empty() && link.text.chars().count() <= MAX_PAGE_LABEL {
        return Some(link.text.clone());
    }
    let url = Url::parse(&link.href).ok()?;
    let segment = url
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()?
        .replace(['-', '_'], " ");
    (!segment.is_empty()).then_some(segment)
}

fn page_candidates<'a>(
    page: &ParsedPage,
    links: impl Iterator<Item = &'a Link>,
    keep: impl Fn(&Url) -> bool,
) -> Vec<Candidate> {
    links
        .filter_map(|link| {
            let url = Url::parse(&link.href).ok()?;
            if platform_for(&url).is_some() || !same_site(page, &url) || !keep(&url) {
                return None;
            }
            let name = page_name(link)?;
            Some(Candidate::new(
                &name,
                Evidence::new(EvidenceSource::Markup, &link.locator, &link.href),
            ))
        })
        .collect()
}

fn is_key_page(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    KEY_PAGE_MARKERS.iter().any(|m| path.contains(m))
}

impl Extractor for PagesExtractor {
    fn category_id(&self) -> &'static str {
        PAGES
    }

    fn chains(&self) -> Vec<FieldChain> {
        vec![
            FieldChain::new(
                "Navigation Page",
                vec![Strategy::new("nav-links", |page, _| {
                    page_candidates(page, page.links.navigation.iter(), |_| true)
                })],
            ),
            FieldChain::new(
                "Footer Page",
                vec![Strategy::new("footer-links", |page, _| {
                    page_candidates(page, page.links.footer.iter(), |_| true)
                })],
            ),
            FieldChain::new(
                "Key Page",
                vec![Strategy::new("content-links", |page, _| {
                    page_candidates(page, page.links.general.iter(), is_key_page)
                })],
            ),
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
        PagesExtractor.extract(&page, &ScanConfig::default())
    }

    #[test]
    fn test_partitions_become_labels() {
        let points = extract(
            r#"<html><body>
            <nav><a href="/">Home</a><a href="/services">Services</a><a href="https://other.test/x">Partner</a></nav>
            <main><a href="/about-us">Learn more</a><a href="/blog/post-1">Read</a><a href="/random">Random</a></main>
            <footer><a href="/privacy-policy"></a><a href="https://facebook.com/acme">Facebook</a></footer>
            </body></html>"#,
        );
        let by_label = |label: &str| -> Vec<&str> {
            points
                .iter()
                .filter(|p| p.label == label)
                .map(|p| p.value.as_str())
                .collect()
        };
        assert_eq!(by_label("Navigation Page"), vec!["Home", "Services"]);
        assert_eq!(by_label("Footer Page"), vec!["privacy policy"]);
        assert_eq!(by_label("Key Page"), vec!["Learn more", "Read"]);
    }

    #[test]
    fn test_repeated_link_text_is_one_station() {
        let points = extract(
            r#"<nav><a href="/about">About</a></nav><footer><a href="/about">About</a></footer>"#,
        );
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].label, "Navigation Page");
        assert_eq!(points[0].evidence.len(), 2);
    }
}
