//! Style hints, script inventory and stylesheet references.

use super::dom::{collapse_whitespace, DomTree, NodeId, NodeKind};
use super::links::resolve_href;
use super::meta::MetaEntry;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;
use url::Url;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleHints {
    pub theme_color: Option<String>,
    /// Hex colors, most frequent first.
    pub colors: Vec<String>,
    pub fonts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptInfo {
    pub src: Option<String>,
    /// Inline body; empty for external scripts.
    pub body: String,
    pub script_type: Option<String>,
    pub locator: String,
}

static HEX_COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(?:[0-9a-fA-F]{6}|[0-9a-fA-F]{3})\b").unwrap());

static FONT_FAMILY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)font-family\s*:\s*([^;}{]+)").unwrap());

const GENERIC_FONTS: &[&str] = &[
    "serif", "sans-serif", "monospace", "cursive", "fantasy", "system-ui", "inherit", "initial",
    "-apple-system", "blinkmacsystemfont", "ui-sans-serif", "ui-serif", "ui-monospace",
];

const NEUTRAL_COLORS: &[&str] = &["#ffffff", "#000000"];

fn expand_hex(hex: &str) -> String {
    let h = hex.trim_start_matches('#').to_ascii_lowercase();
    if h.len() == 3 {
        let expanded: String = h.chars().flat_map(|c| [c, c]).collect();
        format!("#{expanded}")
    } else {
        format!("#{h}")
    }
}

pub fn extract_style_hints(tree: &DomTree, meta: &BTreeMap<String, MetaEntry>) -> StyleHints {
    let mut css_sources: Vec<String> = tree
        .elements_by_tag("style")
        .map(|id| tree.raw_text(id))
        .collect();
    css_sources.extend(
        tree.elements()
            .filter_map(|id| tree.attr(id, "style"))
            .map(|s| s.to_string()),
    );

    // (count, first-seen) per color keeps ordering deterministic.
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    let mut order = 0usize;
    let mut fonts: Vec<String> = Vec::new();

    for css in &css_sources {
        for m in HEX_COLOR_RE.find_iter(css) {
            let color = expand_hex(m.as_str());
            if NEUTRAL_COLORS.contains(&color.as_str()) {
                continue;
            }
            let entry = counts.entry(color).or_insert((0, order));
            entry.0 += 1;
            order += 1;
        }
        for cap in FONT_FAMILY_RE.captures_iter(css) {
            let Some(family) = cap.get(1).and_then(|m| m.as_str().split(',').next()) else {
                continue;
            };
            let family = collapse_whitespace(family.trim().trim_matches(['"', '\'']));
            if family.is_empty()
                || family.starts_with("var(")
                || GENERIC_FONTS.contains(&family.to_ascii_lowercase().as_str())
            {
                continue;
            }
            if !fonts.iter().any(|f| f.eq_ignore_ascii_case(&family)) {
                fonts.push(family);
            }
        }
    }

    let mut colors: Vec<(String, (usize, usize))> = counts.into_iter().collect();
    colors.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));

    let theme_color = meta
        .get("theme-color")
        .map(|m| m.content.trim().to_string())
        .filter(|c| !c.is_empty());

    StyleHints {
        theme_color,
        colors: colors.into_iter().map(|(c, _)| c).collect(),
        fonts,
    }
}

pub fn extract_scripts(tree: &DomTree, base: Option<&Url>) -> Vec<ScriptInfo> {
    tree.elements_by_tag("script")
        .map(|id: NodeId| ScriptInfo {
            src: tree.attr(id, "src").and_then(|s| resolve_href(s, base)),
            body: tree.raw_text(id),
            script_type: tree.attr(id, "type").map(|t| t.trim().to_ascii_lowercase()),
            locator: tree.locator(id),
        })
        .collect()
}

pub fn extract_stylesheets(tree: &DomTree, base: Option<&Url>) -> Vec<String> {
    tree.elements_by_tag("link")
        .filter(|&id| {
            tree.attr(id, "rel")
                .is_some_and(|r| r.to_ascii_lowercase().split_whitespace().any(|r| r == "stylesheet"))
        })
        .filter_map(|id| tree.attr(id, "href").and_then(|h| resolve_href(h, base)))
        .collect()
}

/// Lowercased `name=value` attribute pairs of every non-script element with
/// their locators, plus stylesheet URLs.
pub fn extract_attribute_index(tree: &DomTree, stylesheets: &[String]) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = stylesheets
        .iter()
        .map(|href| ("link[rel=stylesheet]".to_string(), href.to_lowercase()))
        .collect();
    for id in tree.elements() {
        if tree.tag(id) == Some("script") {
            continue;
        }
        if let NodeKind::Element { attrs, .. } = &tree.node(id).kind {
            for (name, value) in attrs {
                out.push((tree.locator(id), format!("{name}={}", value.to_lowercase())));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_colors_by_frequency() {
        let html = r#"<html><head><style>
            body { color: #333; font-family: "Inter", sans-serif; }
            a { color: #FF6600; } .btn { background: #ff6600; border-color: #fff; }
        </style></head><body><div style="color:#333333">x</div></body></html>"#;
        let tree = DomTree::from_html(&Html::parse_document(html));
        let hints = extract_style_hints(&tree, &BTreeMap::new());
        assert_eq!(hints.colors, vec!["#333333", "#ff6600"]);
        assert_eq!(hints.fonts, vec!["Inter"]);
    }

    #[test]
    fn test_scripts_and_stylesheets_resolved() {
        let html = r#"<html><head>
            <script src="/wp-includes/js/jquery.js"></script>
            <script>window.dataLayer = [];</script>
            <link rel="stylesheet" href="/css/site.css">
        </head></html>"#;
        let tree = DomTree::from_html(&Html::parse_document(html));
        let base = Url::parse("https://acme.test/").unwrap();
        let scripts = extract_scripts(&tree, Some(&base));
        assert_eq!(scripts.len(), 2);
        assert_eq!(scripts[0].src.as_deref(), Some("https://acme.test/wp-includes/js/jquery.js"));
        assert!(scripts[1].body.contains("dataLayer"));
        assert_eq!(extract_stylesheets(&tree, Some(&base)), vec!["https://acme.test/css/site.css"]);
    }

    #[test]
    fn test_attribute_index_skips_scripts() {
        let html = r#"<html><head>
            <script src="/js/Elementor.js" data-cfasync="false"></script>
        </head><body><div class="Elementor-Section" id="hero">x</div></body></html>"#;
        let tree = DomTree::from_html(&Html::parse_document(html));
        let sheets = vec!["https://acme.test/CSS/Site.css".to_string()];
        let index = extract_attribute_index(&tree, &sheets);
        assert_eq!(index[0], ("link[rel=stylesheet]".to_string(), "https://acme.test/css/site.css".to_string()));
        let values: Vec<&str> = index.iter().map(|(_, v)| v.as_str()).collect();
        assert!(values.contains(&"class=elementor-section"));
        assert!(values.contains(&"id=hero"));
        assert!(values.iter().all(|v| !v.contains("cfasync") && !v.contains(".js")));
    }
}
