//! Markup parser: raw page text → node tree plus pre-computed indices.
//!
//! Parsing never fails. Malformed markup is repaired by html5ever, and any
//! sub-extraction that cannot make sense of its input (a broken JSON-LD
//! block, a regex candidate that fails validation) is skipped on its own.

pub mod contacts;
pub mod dom;
pub mod links;
pub mod meta;
pub mod microdata;
pub mod styles;

use std::collections::BTreeMap;

use scraper::Html;
use serde::{Deserialize, Serialize};
use url::Url;

pub use contacts::{ContactHint, ContactHints, HintOrigin};
pub use dom::{DomTree, NodeId};
pub use links::{Link, LinkIndex, SocialLink};
pub use meta::{MetaEntry, StructuredItem};
pub use microdata::MicrodataItem;
pub use styles::{ScriptInfo, StyleHints};

/// Which sub-extraction degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    StructuredData,
    SourceUrl,
}

/// A parse-local failure that was skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseWarning {
    pub kind: WarningKind,
    pub locator: String,
    pub message: String,
}

/// Visible text grouped by its nearest block-level element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    pub node: NodeId,
    pub locator: String,
    pub text: String,
}

/// Everything the extractors need to know about one page.
#[derive(Debug, Clone)]
pub struct ParsedPage {
    pub source_url: String,
    pub base_url: Option<Url>,
    /// Registrable name of the host, e.g. `acme` for `www.acme.co.uk`.
    pub domain_token: String,
    pub tree: DomTree,
    pub title: String,
    pub lang: Option<String>,
    pub canonical: Option<String>,
    pub meta: BTreeMap<String, MetaEntry>,
    pub structured_data: Vec<StructuredItem>,
    pub microdata: Vec<MicrodataItem>,
    pub links: LinkIndex,
    pub contacts: ContactHints,
    pub social: Vec<SocialLink>,
    /// Fallback count `social` was built with.
    pub social_fallback_count: usize,
    pub styles: StyleHints,
    pub scripts: Vec<ScriptInfo>,
    pub stylesheets: Vec<String>,
    /// Locator and lowercased `name=value` for every attribute outside scripts.
    pub attribute_index: Vec<(String, String)>,
    pub text_blocks: Vec<TextBlock>,
    pub warnings: Vec<ParseWarning>,
}

impl ParsedPage {
    pub fn meta_content(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(|m| m.content.as_str())
    }

    /// Heading elements (`h1`–`h6`) in document order.
    pub fn headings(&self) -> Vec<NodeId> {
        self.tree
            .elements()
            .filter(|&id| {
                matches!(
                    self.tree.tag(id),
                    Some("h1" | "h2" | "h3" | "h4" | "h5" | "h6")
                )
            })
            .collect()
    }

    /// Concatenated visible text of the page.
    pub fn body_text(&self) -> String {
        self.text_blocks
            .iter()
            .map(|b| b.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Social links kept when fewer than three high-confidence profiles are found.
pub const SOCIAL_FALLBACK_COUNT: usize = 5;

/// Parse raw markup. Always returns a page, even for empty input.
pub fn parse(raw_markup: &str, source_url: &str) -> ParsedPage {
    let mut warnings = Vec::new();

    let base_url = match Url::parse(source_url.trim()) {
        Ok(u) => Some(u),
        Err(e) => {
            warnings.push(ParseWarning {
                kind: WarningKind::SourceUrl,
                locator: source_url.to_string(),
                message: e.to_string(),
            });
            None
        }
    };
    let domain_token = base_url
        .as_ref()
        .and_then(|u| u.host_str())
        .map(domain_token)
        .unwrap_or_default();

    let document = Html::parse_document(raw_markup);
    let title = meta::extract_title(&document);
    let lang = meta::extract_lang(&document);
    let canonical = meta::extract_canonical(&document);
    let meta_map = meta::extract_meta(&document);
    let structured_data = meta::extract_json_ld(&document, &mut warnings);
    let tree = DomTree::from_html(&document);
    drop(document);

    let text_blocks = text_blocks(&tree);
    let microdata = microdata::extract_microdata(&tree);
    let links = links::extract_links(&tree, base_url.as_ref());
    let contacts = contacts::extract_contacts(&tree, &text_blocks);
    let social = links::extract_social(&tree, base_url.as_ref(), &domain_token, SOCIAL_FALLBACK_COUNT);
    let styles = styles::extract_style_hints(&tree, &meta_map);
    let scripts = styles::extract_scripts(&tree, base_url.as_ref());
    let stylesheets = styles::extract_stylesheets(&tree, base_url.as_ref());
    let attribute_index = styles::extract_attribute_index(&tree, &stylesheets);

    ParsedPage {
        source_url: source_url.to_string(),
        base_url,
        domain_token,
        tree,
        title,
        lang,
        canonical,
        meta: meta_map,
        structured_data,
        microdata,
        links,
        contacts,
        social,
        social_fallback_count: SOCIAL_FALLBACK_COUNT,
        styles,
        scripts,
        stylesheets,
        attribute_index,
        text_blocks,
        warnings,
    }
}

/// Re-run social detection with a different fallback count.
pub fn social_with_fallback(page: &ParsedPage, fallback_count: usize) -> Vec<SocialLink> {
    links::extract_social(
        &page.tree,
        page.base_url.as_ref(),
        &page.domain_token,
        fallback_count,
    )
}

/// `www.shop.acme.co.uk` → `acme`.
pub fn domain_token(host: &str) -> String {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let mut labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    if labels.first() == Some(&"www") {
        labels.remove(0);
    }
    if labels.len() >= 3 {
        let n = labels.len();
        let second_level = labels[n - 2];
        if labels[n - 1].len() == 2 && second_level.len() <= 3 {
            labels.truncate(n - 2);
        } else {
            labels.truncate(n - 1);
        }
    } else if labels.len() == 2 {
        labels.truncate(1);
    }
    labels.last().map(|l| l.to_string()).unwrap_or_default()
}

fn text_blocks(tree: &DomTree) -> Vec<TextBlock> {
    let mut grouped: BTreeMap<NodeId, Vec<String>> = BTreeMap::new();
    for id in 0..tree.len() {
        let dom::NodeKind::Text(text) = &tree.node(id).kind else {
            continue;
        };
        if text.trim().is_empty() || tree.is_hidden(id) {
            continue;
        }
        let Some(block) = tree.block_ancestor(id) else {
            continue;
        };
        grouped.entry(block).or_default().push(text.clone());
    }

    grouped
        .into_iter()
        .filter_map(|(node, parts)| {
            let text = dom::collapse_whitespace(&parts.join(" "));
            if text.is_empty() {
                None
            } else {
                Some(TextBlock {
                    node,
                    locator: tree.locator(node),
                    text,
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_token() {
        assert_eq!(domain_token("www.acme.com"), "acme");
        assert_eq!(domain_token("shop.acme.co.uk"), "acme");
        assert_eq!(domain_token("acme.io"), "acme");
        assert_eq!(domain_token("localhost"), "localhost");
    }

    #[test]
    fn test_empty_markup_yields_empty_page() {
        let page = parse("", "https://acme.test/");
        assert!(page.title.is_empty());
        assert!(page.structured_data.is_empty());
        assert!(page.text_blocks.is_empty());
        assert!(page.warnings.is_empty());
    }

    #[test]
    fn test_invalid_url_is_a_warning_not_a_failure() {
        let page = parse("<p>hi</p>", "not a url");
        assert_eq!(page.warnings.len(), 1);
        assert_eq!(page.warnings[0].kind, WarningKind::SourceUrl);
        assert!(page.domain_token.is_empty());
        assert_eq!(page.text_blocks.len(), 1);
    }

    #[test]
    fn test_text_blocks_group_inline_and_br() {
        let page = parse(
            "<html><body><p>123 Main St<br>Springfield, <b>IL</b> 62701</p><script>x=1</script></body></html>",
            "https://acme.test/",
        );
        assert_eq!(page.text_blocks.len(), 1);
        assert_eq!(page.text_blocks[0].text, "123 Main St Springfield, IL 62701");
    }

    #[test]
    fn test_full_page_indices() {
        let html = r#"<html lang="en"><head>
            <title>Acme Co | Plumbing</title>
            <meta name="description" content="Plumbing for Springfield">
            <script type="application/ld+json">{"@type":"Organization","name":"Acme Co"}</script>
            </head><body>
            <nav><a href="/services">Services</a></nav>
            <p>Call 555-123-4567 or email hello@acme.test</p>
            <footer><a href="https://facebook.com/acmeco">Facebook</a></footer>
            </body></html>"#;
        let page = parse(html, "https://www.acme.test/");
        assert_eq!(page.title, "Acme Co | Plumbing");
        assert_eq!(page.lang.as_deref(), Some("en"));
        assert_eq!(page.structured_data.len(), 1);
        assert_eq!(page.links.navigation.len(), 1);
        assert_eq!(page.contacts.phones.len(), 1);
        assert_eq!(page.contacts.emails[0].value, "hello@acme.test");
        assert_eq!(page.social.len(), 1);
        assert!(page.social[0].high_confidence);
    }
}
