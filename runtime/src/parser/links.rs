//! Link graph of the page: navigation / footer / general partitions and
//! social profile detection.

use super::dom::{DomTree, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use url::Url;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub text: String,
    pub node: NodeId,
    pub locator: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkRegion {
    Navigation,
    Footer,
    General,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkIndex {
    pub navigation: Vec<Link>,
    pub footer: Vec<Link>,
    pub general: Vec<Link>,
}

impl LinkIndex {
    pub fn all(&self) -> impl Iterator<Item = &Link> {
        self.navigation
            .iter()
            .chain(self.footer.iter())
            .chain(self.general.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialLink {
    pub platform: String,
    pub url: String,
    pub text: String,
    pub locator: String,
    /// Found in a header/footer/contact region or names the site itself.
    pub high_confidence: bool,
}

/// Host suffix → platform display name.
const SOCIAL_PLATFORMS: &[(&str, &str)] = &[
    ("facebook.com", "Facebook"),
    ("instagram.com", "Instagram"),
    ("twitter.com", "Twitter"),
    ("x.com", "X"),
    ("linkedin.com", "LinkedIn"),
    ("youtube.com", "YouTube"),
    ("tiktok.com", "TikTok"),
    ("pinterest.com", "Pinterest"),
    ("github.com", "GitHub"),
    ("yelp.com", "Yelp"),
    ("threads.net", "Threads"),
];

const SHARE_MARKERS: &[&str] = &["sharer", "/share", "intent/", "dialog/", "sharearticle", "pin/create"];

const TRUSTED_REGION_LABELS: &[&str] = &["contact", "social", "footer", "header", "follow"];

/// Resolve an href against the page URL. Returns `None` for scripts, bare
/// fragments and other non-navigable targets.
pub fn resolve_href(href: &str, base: Option<&Url>) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:") || lower.starts_with("data:") {
        return None;
    }
    match base {
        Some(base) => base.join(href).ok().map(|u| u.to_string()),
        None => Url::parse(href).ok().map(|u| u.to_string()),
    }
}

fn link_text(tree: &DomTree, id: NodeId) -> String {
    let text = tree.text(id);
    if !text.is_empty() {
        return text;
    }
    tree.attr(id, "aria-label")
        .or_else(|| tree.attr(id, "title"))
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn region_of(tree: &DomTree, id: NodeId) -> LinkRegion {
    for a in tree.ancestors(id) {
        let tag = tree.tag(a).unwrap_or_default();
        let role = tree.attr(a, "role").unwrap_or_default();
        if tag == "footer" || role == "contentinfo" {
            return LinkRegion::Footer;
        }
        if tag == "nav" || tag == "header" || role == "navigation" {
            return LinkRegion::Navigation;
        }
    }
    LinkRegion::General
}

/// Partition all navigable anchors, dropping `mailto:`/`tel:` (contacts own
/// those) and duplicate (target, text) pairs within each partition.
pub fn extract_links(tree: &DomTree, base: Option<&Url>) -> LinkIndex {
    let mut index = LinkIndex::default();
    let mut seen: [HashSet<(String, String)>; 3] = Default::default();

    for id in tree.elements_by_tag("a") {
        let Some(raw) = tree.attr(id, "href") else {
            continue;
        };
        let lower = raw.trim().to_ascii_lowercase();
        if lower.starts_with("mailto:") || lower.starts_with("tel:") {
            continue;
        }
        let Some(href) = resolve_href(raw, base) else {
            continue;
        };
        let text = link_text(tree, id);
        let (slot, list) = match region_of(tree, id) {
            LinkRegion::Navigation => (0, &mut index.navigation),
            LinkRegion::Footer => (1, &mut index.footer),
            LinkRegion::General => (2, &mut index.general),
        };
        if seen[slot].insert((href.clone(), text.to_lowercase())) {
            list.push(Link {
                href,
                text,
                node: id,
                locator: tree.locator(id),
            });
        }
    }

    index
}

pub fn platform_for(url: &Url) -> Option<&'static str> {
    let host = url.host_str()?.to_ascii_lowercase();
    SOCIAL_PLATFORMS
        .iter()
        .find(|(suffix, _)| host == *suffix || host.ends_with(&format!(".{suffix}")))
        .map(|(_, name)| *name)
}

/// Find social profile links.
///
/// High-confidence links are kept when there are at least three of them;
/// otherwise the first `fallback_count` links found are used, with the
/// high-confidence ones always included first.
pub fn extract_social(
    tree: &DomTree,
    base: Option<&Url>,
    domain_token: &str,
    fallback_count: usize,
) -> Vec<SocialLink> {
    let mut found: Vec<SocialLink> = Vec::new();
    let mut seen = HashSet::new();

    for id in tree.elements_by_tag("a") {
        let Some(href) = tree.attr(id, "href").and_then(|h| resolve_href(h, base)) else {
            continue;
        };
        let Ok(url) = Url::parse(&href) else {
            continue;
        };
        let Some(platform) = platform_for(&url) else {
            continue;
        };
        let path = url.path().to_ascii_lowercase();
        if path.trim_matches('/').is_empty() || SHARE_MARKERS.iter().any(|m| href.to_ascii_lowercase().contains(m)) {
            continue;
        }
        let normalized = href.trim_end_matches('/').to_ascii_lowercase();
        if !seen.insert(normalized) {
            continue;
        }

        let text = link_text(tree, id);
        let in_trusted_region = std::iter::once(id).chain(tree.ancestors(id)).any(|a| {
            matches!(tree.tag(a), Some("header") | Some("footer")) || tree.labelled_with(a, TRUSTED_REGION_LABELS)
        });
        let names_site = domain_token.len() >= 3
            && (path.contains(domain_token) || text.to_ascii_lowercase().contains(domain_token));

        found.push(SocialLink {
            platform: platform.to_string(),
            url: href,
            text,
            locator: tree.locator(id),
            high_confidence: in_trusted_region || names_site,
        });
    }

    let high: Vec<SocialLink> = found.iter().filter(|l| l.high_confidence).cloned().collect();
    if high.len() >= 3 {
        return high;
    }

    let limit = fallback_count.max(high.len());
    let mut selected = high;
    for link in found.into_iter().filter(|l| !l.high_confidence) {
        if selected.len() >= limit {
            break;
        }
        selected.push(link);
    }
    selected
}
