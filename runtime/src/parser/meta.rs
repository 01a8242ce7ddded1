//! `<meta>`, `<title>` and JSON-LD indices read straight off the scraper document.

use super::dom::collapse_whitespace;
use super::{ParseWarning, WarningKind};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaEntry {
    pub content: String,
    pub locator: String,
}

/// One JSON-LD object after flattening arrays and `@graph`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredItem {
    pub value: serde_json::Value,
    /// `ld+json[block]` or `ld+json[block]/@graph[i]`.
    pub locator: String,
}

impl StructuredItem {
    /// All `@type` values, with any `schema:` prefix or URL path removed.
    pub fn types(&self) -> Vec<String> {
        json_types(&self.value)
    }

    pub fn has_type(&self, candidates: &[&str]) -> bool {
        self.types()
            .iter()
            .any(|t| candidates.iter().any(|c| c.eq_ignore_ascii_case(t)))
    }

    /// String value of a top-level property.
    pub fn str_prop(&self, key: &str) -> Option<String> {
        json_str(self.value.get(key)?)
    }
}

pub fn json_types(value: &serde_json::Value) -> Vec<String> {
    let raw: Vec<&str> = match value.get("@type") {
        Some(serde_json::Value::String(s)) => vec![s.as_str()],
        Some(serde_json::Value::Array(arr)) => arr.iter().filter_map(|v| v.as_str()).collect(),
        _ => Vec::new(),
    };
    raw.into_iter()
        .map(|t| {
            t.rsplit(['/', ':', '#'])
                .next()
                .unwrap_or(t)
                .trim()
                .to_string()
        })
        .filter(|t| !t.is_empty())
        .collect()
}

/// Best-effort string rendering of a JSON-LD property value.
///
/// Strings and numbers render directly, objects fall back to their `name`
/// or `@id`, arrays take the first renderable element.
pub fn json_str(value: &serde_json::Value) -> Option<String> {
    let s = match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::Object(map) => {
            return map
                .get("name")
                .or_else(|| map.get("url"))
                .or_else(|| map.get("@id"))
                .and_then(json_str);
        }
        serde_json::Value::Array(arr) => return arr.iter().find_map(json_str),
        _ => return None,
    };
    let s = collapse_whitespace(&s);
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

pub fn extract_title(document: &Html) -> String {
    let Ok(sel) = Selector::parse("title") else {
        return String::new();
    };
    document
        .select(&sel)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .unwrap_or_default()
}

pub fn extract_lang(document: &Html) -> Option<String> {
    document
        .root_element()
        .value()
        .attr("lang")
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
}

/// Flatten all `<meta>` tags into a key → content map; first occurrence wins.
pub fn extract_meta(document: &Html) -> BTreeMap<String, MetaEntry> {
    let mut meta = BTreeMap::new();
    let Ok(sel) = Selector::parse("meta[content]") else {
        return meta;
    };

    for el in document.select(&sel) {
        let content = collapse_whitespace(el.value().attr("content").unwrap_or_default());
        if content.is_empty() {
            continue;
        }
        for attr in ["name", "property", "http-equiv", "itemprop"] {
            if let Some(key) = el.value().attr(attr) {
                let key = key.trim().to_ascii_lowercase();
                if key.is_empty() {
                    continue;
                }
                meta.entry(key.clone()).or_insert_with(|| MetaEntry {
                    content: content.clone(),
                    locator: format!("meta[{attr}={key}]"),
                });
            }
        }
    }

    meta
}

/// `<link rel="canonical">`, if present.
pub fn extract_canonical(document: &Html) -> Option<String> {
    let sel = Selector::parse(r#"link[rel="canonical"]"#).ok()?;
    document
        .select(&sel)
        .find_map(|el| el.value().attr("href"))
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
}

/// Parse every JSON-LD block. A block that fails to parse is skipped and
/// reported; it never affects the others.
pub fn extract_json_ld(document: &Html, warnings: &mut Vec<ParseWarning>) -> Vec<StructuredItem> {
    let mut items = Vec::new();
    let Ok(sel) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
        return items;
    };

    for (block, script) in document.select(&sel).enumerate() {
        let text: String = script.text().collect();
        let cleaned = strip_block_wrappers(&text);
        if cleaned.is_empty() {
            continue;
        }
        let locator = format!("ld+json[{block}]");
        match serde_json::from_str::<serde_json::Value>(cleaned) {
            Ok(json) => flatten_json_ld(&json, &locator, &mut items),
            Err(e) => warnings.push(ParseWarning {
                kind: WarningKind::StructuredData,
                locator,
                message: e.to_string(),
            }),
        }
    }

    items
}

/// Remove HTML comment and CDATA wrappers some CMSes put around JSON-LD.
fn strip_block_wrappers(text: &str) -> &str {
    let mut s = text.trim();
    for (open, close) in [("<!--", "-->"), ("<![CDATA[", "]]>"), ("//<![CDATA[", "//]]>")] {
        if let Some(rest) = s.strip_prefix(open) {
            s = rest.strip_suffix(close).unwrap_or(rest).trim();
        }
    }
    s.trim_end_matches(';').trim()
}

fn flatten_json_ld(json: &serde_json::Value, locator: &str, items: &mut Vec<StructuredItem>) {
    match json {
        serde_json::Value::Object(map) => {
            if let Some(serde_json::Value::Array(graph)) = map.get("@graph") {
                for (i, item) in graph.iter().enumerate() {
                    flatten_json_ld(item, &format!("{locator}/@graph[{i}]"), items);
                }
            } else {
                items.push(StructuredItem {
                    value: json.clone(),
                    locator: locator.to_string(),
                });
            }
        }
        serde_json::Value::Array(arr) => {
            for (i, item) in arr.iter().enumerate() {
                flatten_json_ld(item, &format!("{locator}[{i}]"), items);
            }
        }
        _ => {}
    }
}
