//! Owned, thread-safe node tree built from a scraper document.
//!
//! `scraper::Html` is neither `Send` nor `Sync`, so the parser copies the
//! document into a flat arena once. Node ids follow document order, which
//! keeps every traversal below deterministic.

use scraper::{ElementRef, Html};

pub type NodeId = usize;

#[derive(Debug, Clone)]
pub enum NodeKind {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
pub struct DomNode {
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub kind: NodeKind,
}

/// Tags whose text never counts as visible page text.
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template", "head", "svg"];

/// Tags that start a new text block.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "body", "dd", "div", "dl", "dt", "figcaption",
    "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "li", "main", "nav", "ol", "p",
    "section", "table", "td", "th", "tr", "ul",
];

#[derive(Debug, Clone, Default)]
pub struct DomTree {
    nodes: Vec<DomNode>,
}

enum Pending<'a> {
    Element(ElementRef<'a>, Option<NodeId>),
    Text(String, Option<NodeId>),
}

impl DomTree {
    /// Copy a parsed document into an arena, depth-first in document order.
    pub fn from_html(document: &Html) -> Self {
        let mut nodes: Vec<DomNode> = Vec::new();
        let mut stack = vec![Pending::Element(document.root_element(), None)];

        while let Some(pending) = stack.pop() {
            let id = nodes.len();
            match pending {
                Pending::Element(el, parent) => {
                    let tag = el.value().name().to_ascii_lowercase();
                    let attrs = el
                        .value()
                        .attrs()
                        .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
                        .collect();
                    nodes.push(DomNode {
                        parent,
                        children: Vec::new(),
                        kind: NodeKind::Element { tag, attrs },
                    });
                    if let Some(p) = parent {
                        nodes[p].children.push(id);
                    }

                    let mut children = Vec::new();
                    for child in el.children() {
                        if let Some(child_el) = ElementRef::wrap(child) {
                            children.push(Pending::Element(child_el, Some(id)));
                        } else if let Some(text) = child.value().as_text() {
                            let text: &str = text;
                            if !text.is_empty() {
                                children.push(Pending::Text(text.to_string(), Some(id)));
                            }
                        }
                    }
                    stack.extend(children.into_iter().rev());
                }
                Pending::Text(text, parent) => {
                    nodes.push(DomNode {
                        parent,
                        children: Vec::new(),
                        kind: NodeKind::Text(text),
                    });
                    if let Some(p) = parent {
                        nodes[p].children.push(id);
                    }
                }
            }
        }

        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> &DomNode {
        &self.nodes[id]
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.nodes.get(id)?.kind {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.nodes.get(id)?.kind {
            NodeKind::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str()),
            NodeKind::Text(_) => None,
        }
    }

    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    /// All element ids in document order.
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| matches!(n.kind, NodeKind::Element { .. }))
            .map(|(i, _)| i)
    }

    pub fn elements_by_tag<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = NodeId> + 'a {
        self.elements().filter(move |&id| self.tag(id) == Some(tag))
    }

    /// Element children of a node, in order.
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.nodes[id]
            .children
            .iter()
            .copied()
            .filter(|&c| self.tag(c).is_some())
            .collect()
    }

    /// Element siblings that follow `id`, nearest first.
    pub fn following_element_siblings(&self, id: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.nodes[id].parent else {
            return Vec::new();
        };
        let siblings = self.element_children(parent);
        match siblings.iter().position(|&s| s == id) {
            Some(pos) => siblings[pos + 1..].to_vec(),
            None => Vec::new(),
        }
    }

    /// Strict ancestors, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.nodes[id].parent, move |&p| self.nodes[p].parent)
    }

    /// Descendants in document order, excluding `id` itself.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id].children.iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            out.push(n);
            stack.extend(self.nodes[n].children.iter().rev().copied());
        }
        out
    }

    /// True when the node or any ancestor is a hidden tag.
    pub fn is_hidden(&self, id: NodeId) -> bool {
        let own = self.tag(id).is_some_and(|t| HIDDEN_TAGS.contains(&t));
        own || self
            .ancestors(id)
            .any(|a| self.tag(a).is_some_and(|t| HIDDEN_TAGS.contains(&t)))
    }

    /// Visible text under a node, whitespace-collapsed.
    pub fn text(&self, id: NodeId) -> String {
        if let NodeKind::Text(t) = &self.nodes[id].kind {
            return collapse_whitespace(t);
        }
        let mut parts = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id].children.iter().rev().copied().collect();
        while let Some(n) = stack.pop() {
            match &self.nodes[n].kind {
                NodeKind::Text(t) => parts.push(t.as_str()),
                NodeKind::Element { tag, .. } => {
                    if !HIDDEN_TAGS.contains(&tag.as_str()) {
                        stack.extend(self.nodes[n].children.iter().rev().copied());
                    }
                }
            }
        }
        collapse_whitespace(&parts.join(" "))
    }

    /// Raw text of all descendant text nodes, including script bodies.
    pub fn raw_text(&self, id: NodeId) -> String {
        self.descendants(id)
            .into_iter()
            .filter_map(|n| match &self.nodes[n].kind {
                NodeKind::Text(t) => Some(t.as_str()),
                NodeKind::Element { .. } => None,
            })
            .collect()
    }

    /// Whether the element's id, class or aria-label contains any needle.
    pub fn labelled_with(&self, id: NodeId, needles: &[&str]) -> bool {
        ["id", "class", "aria-label", "role"].iter().any(|attr| {
            self.attr(id, attr).is_some_and(|v| {
                let v = v.to_ascii_lowercase();
                needles.iter().any(|n| v.contains(n))
            })
        })
    }

    /// Nearest block-level element containing the node (or the node itself).
    pub fn block_ancestor(&self, id: NodeId) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&n| self.tag(n).is_some_and(|t| BLOCK_TAGS.contains(&t)))
    }

    /// XPath-like path, e.g. `html/body/footer/p[2]`.
    pub fn locator(&self, id: NodeId) -> String {
        let element = if self.tag(id).is_some() {
            Some(id)
        } else {
            self.nodes[id].parent
        };
        let Some(element) = element else {
            return String::new();
        };

        let mut segments = Vec::new();
        for n in std::iter::once(element).chain(self.ancestors(element)) {
            let tag = self.tag(n).unwrap_or("?");
            let segment = match self.nodes[n].parent {
                Some(p) => {
                    let same: Vec<NodeId> = self
                        .element_children(p)
                        .into_iter()
                        .filter(|&s| self.tag(s) == Some(tag))
                        .collect();
                    if same.len() > 1 {
                        let pos = same.iter().position(|&s| s == n).unwrap_or(0) + 1;
                        format!("{tag}[{pos}]")
                    } else {
                        tag.to_string()
                    }
                }
                None => tag.to_string(),
            };
            segments.push(segment);
        }
        segments.reverse();
        segments.join("/")
    }
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree(html: &str) -> DomTree {
        DomTree::from_html(&Html::parse_document(html))
    }

    #[test]
    fn test_document_order_ids() {
        let t = tree("<html><body><p>one</p><p>two <b>bold</b></p></body></html>");
        let ps: Vec<NodeId> = t.elements_by_tag("p").collect();
        assert_eq!(ps.len(), 2);
        assert!(ps[0] < ps[1]);
        assert_eq!(t.text(ps[1]), "two bold");
    }

    #[test]
    fn test_text_skips_scripts() {
        let t = tree("<html><body><div>hello<script>var x = 1;</script> world</div></body></html>");
        let div = t.elements_by_tag("div").next().unwrap();
        assert_eq!(t.text(div), "hello world");
        assert!(t.raw_text(div).contains("var x"));
    }

    #[test]
    fn test_locator_indexes_repeated_tags() {
        let t = tree("<html><body><footer><p>a</p><p>b</p></footer></body></html>");
        let second = t.elements_by_tag("p").nth(1).unwrap();
        assert_eq!(t.locator(second), "html/body/footer/p[2]");
    }

    #[test]
    fn test_following_siblings() {
        let t = tree("<html><body><h2>Services</h2><p>intro</p><ul><li>A</li></ul></body></html>");
        let h2 = t.elements_by_tag("h2").next().unwrap();
        let tags: Vec<&str> = t
            .following_element_siblings(h2)
            .into_iter()
            .filter_map(|n| t.tag(n))
            .collect();
        assert_eq!(tags, vec!["p", "ul"]);
    }

    #[test]
    fn test_empty_input_still_has_root() {
        let t = tree("");
        assert!(!t.is_empty());
        assert_eq!(t.tag(0), Some("html"));
    }
}
