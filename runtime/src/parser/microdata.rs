//! Microdata (`itemscope` / `itemprop`) scopes.

use super::dom::{collapse_whitespace, DomTree, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicrodataItem {
    /// Last path segment of `itemtype`, e.g. `LocalBusiness`.
    pub item_type: Option<String>,
    pub properties: BTreeMap<String, Vec<String>>,
    pub node: NodeId,
    pub locator: String,
    /// True when the scope sits inside another scope.
    pub nested: bool,
}

impl MicrodataItem {
    pub fn first(&self, prop: &str) -> Option<&str> {
        self.properties
            .get(prop)
            .and_then(|v| v.first())
            .map(|s| s.as_str())
    }

    pub fn is_type(&self, candidates: &[&str]) -> bool {
        self.item_type
            .as_deref()
            .is_some_and(|t| candidates.iter().any(|c| c.eq_ignore_ascii_case(t)))
    }

    fn property_count(&self) -> usize {
        self.properties.values().map(|v| v.len()).sum()
    }
}

/// Collect microdata scopes. Top-level scopes are kept with at least one
/// property; nested scopes only when they carry two or more.
pub fn extract_microdata(tree: &DomTree) -> Vec<MicrodataItem> {
    let scopes: Vec<NodeId> = tree
        .elements()
        .filter(|&id| tree.has_attr(id, "itemscope"))
        .collect();

    let mut items: BTreeMap<NodeId, MicrodataItem> = scopes
        .iter()
        .map(|&id| {
            let nested = tree.ancestors(id).any(|a| tree.has_attr(a, "itemscope"));
            let item_type = tree.attr(id, "itemtype").and_then(short_type);
            (
                id,
                MicrodataItem {
                    item_type,
                    properties: BTreeMap::new(),
                    node: id,
                    locator: tree.locator(id),
                    nested,
                },
            )
        })
        .collect();

    for id in tree.elements() {
        let Some(props) = tree.attr(id, "itemprop") else {
            continue;
        };
        let Some(owner) = tree.ancestors(id).find(|&a| tree.has_attr(a, "itemscope")) else {
            continue;
        };
        let Some(value) = property_value(tree, id) else {
            continue;
        };
        if let Some(item) = items.get_mut(&owner) {
            for prop in props.split_whitespace() {
                item.properties
                    .entry(prop.to_string())
                    .or_default()
                    .push(value.clone());
            }
        }
    }

    items
        .into_values()
        .filter(|item| {
            let count = item.property_count();
            if item.nested {
                count >= 2
            } else {
                count >= 1
            }
        })
        .collect()
}

fn short_type(itemtype: &str) -> Option<String> {
    let first = itemtype.split_whitespace().next()?;
    let short = first.trim_end_matches('/').rsplit('/').next()?.trim();
    if short.is_empty() {
        None
    } else {
        Some(short.to_string())
    }
}

/// Microdata value rules: `content` wins, then URL attributes, then
/// `datetime`, then text. Nested scopes render as their `name` property.
fn property_value(tree: &DomTree, id: NodeId) -> Option<String> {
    if let Some(content) = tree.attr(id, "content") {
        return non_empty(content);
    }
    let tag = tree.tag(id)?;
    let url_attr = match tag {
        "a" | "link" | "area" => Some("href"),
        "img" | "audio" | "video" | "source" | "iframe" | "embed" => Some("src"),
        "object" => Some("data"),
        _ => None,
    };
    if let Some(v) = url_attr.and_then(|attr| tree.attr(id, attr)) {
        return non_empty(v);
    }
    if tag == "time" {
        if let Some(v) = tree.attr(id, "datetime") {
            return non_empty(v);
        }
    }
    if tree.has_attr(id, "itemscope") {
        let name = tree
            .descendants(id)
            .into_iter()
            .find(|&d| {
                tree.attr(d, "itemprop")
                    .is_some_and(|p| p.split_whitespace().any(|p| p == "name"))
            })
            .map(|d| tree.text(d));
        if let Some(name) = name.and_then(|n| non_empty(&n)) {
            return Some(name);
        }
    }
    non_empty(&tree.text(id))
}

fn non_empty(s: &str) -> Option<String> {
    let s = collapse_whitespace(s);
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn items(html: &str) -> Vec<MicrodataItem> {
        extract_microdata(&DomTree::from_html(&Html::parse_document(html)))
    }

    #[test]
    fn test_basic_scope() {
        let found = items(
            r#"<div itemscope itemtype="https://schema.org/LocalBusiness">
                <span itemprop="name">Acme Plumbing</span>
                <span itemprop="telephone">(555) 123-4567</span>
                <a itemprop="url" href="https://acme.test/">site</a>
            </div>"#,
        );
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].item_type.as_deref(), Some("LocalBusiness"));
        assert_eq!(found[0].first("name"), Some("Acme Plumbing"));
        assert_eq!(found[0].first("url"), Some("https://acme.test/"));
    }

    #[test]
    fn test_nested_scope_needs_two_properties() {
        let found = items(
            r#"<div itemscope itemtype="https://schema.org/Organization">
                <span itemprop="name">Acme</span>
                <div itemprop="address" itemscope itemtype="https://schema.org/PostalAddress">
                    <span itemprop="streetAddress">1 Main St</span>
                    <span itemprop="addressLocality">Springfield</span>
                </div>
                <div itemprop="brand" itemscope itemtype="https://schema.org/Brand">
                    <span itemprop="name">Acme Pro</span>
                </div>
            </div>"#,
        );
        let types: Vec<_> = found.iter().filter_map(|i| i.item_type.clone()).collect();
        assert_eq!(types, vec!["Organization", "PostalAddress"]);
        assert_eq!(found[0].first("brand"), Some("Acme Pro"));
    }
}
