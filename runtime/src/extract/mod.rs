//! Category extractors: parsed page → evidence-backed data points.
//!
//! Every extractor is a list of [`FieldChain`]s, one per label. A chain runs
//! its strategies in priority order; the first one that yields candidates
//! fixes the value set and the rest can only corroborate those values. A
//! strategy marked with [`Strategy::fill_label_gaps`] may still add values
//! whose per-candidate label the winner did not produce.

pub mod contacts;
pub mod entities;
pub mod identity;
pub mod pages;
pub mod schema;
pub mod services;
pub mod technology;

use std::collections::{HashMap, HashSet};
use std::hash::Hasher;

use fnv::FnvHasher;
use serde_json::Value;

use crate::config::{IdStrategy, ScanConfig};
use crate::parser::dom::collapse_whitespace;
use crate::parser::{NodeId, ParsedPage};
use crate::types::{dedup_key, DataPoint, Evidence, EvidenceSource};

pub use contacts::ContactsExtractor;
pub use entities::EntitiesExtractor;
pub use identity::IdentityExtractor;
pub use pages::PagesExtractor;
pub use schema::SchemaExtractor;
pub use services::ServicesExtractor;
pub use technology::TechnologyExtractor;

/// JSON-LD / microdata types treated as "the business".
pub const ORGANIZATION_TYPES: &[&str] = &[
    "Organization",
    "LocalBusiness",
    "Corporation",
    "Store",
    "Restaurant",
    "ProfessionalService",
    "MedicalBusiness",
    "MedicalClinic",
    "Dentist",
    "LegalService",
    "Attorney",
    "HomeAndConstructionBusiness",
    "Plumber",
    "Electrician",
    "FoodEstablishment",
    "CafeOrCoffeeShop",
    "AutomotiveBusiness",
    "FinancialService",
    "RealEstateAgent",
    "EducationalOrganization",
    "NGO",
    "OnlineBusiness",
];

/// True for known business types and the many `*Business` / `*Store` subtypes.
pub fn is_organization_type(t: &str) -> bool {
    ORGANIZATION_TYPES.iter().any(|o| o.eq_ignore_ascii_case(t))
        || t.ends_with("Business")
        || t.ends_with("Store")
        || t.ends_with("Organization")
}

/// Every JSON-LD object on the page, including nested ones, with its locator.
pub(crate) fn json_objects(page: &ParsedPage) -> Vec<(&Value, String)> {
    let mut out = Vec::new();
    for item in &page.structured_data {
        let mut stack = vec![(&item.value, item.locator.clone())];
        while let Some((value, locator)) = stack.pop() {
            match value {
                Value::Object(map) => {
                    out.push((value, locator.clone()));
                    for (k, v) in map.iter().rev() {
                        if v.is_object() || v.is_array() {
                            stack.push((v, format!("{locator}/{k}")));
                        }
                    }
                }
                Value::Array(arr) => {
                    for (i, v) in arr.iter().enumerate().rev() {
                        stack.push((v, format!("{locator}[{i}]")));
                    }
                }
                _ => {}
            }
        }
    }
    out
}

pub(crate) fn json_values<'a>(value: &'a Value, key: &str) -> Vec<&'a Value> {
    match value.get(key) {
        Some(Value::Array(arr)) => arr.iter().collect(),
        Some(v) => vec![v],
        None => Vec::new(),
    }
}

/// A value proposed by one strategy, with the evidence that found it.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Overrides the chain label (technology kinds, social platforms).
    pub label: Option<String>,
    pub value: String,
    pub evidence: Evidence,
}

impl Candidate {
    pub fn new(value: impl AsRef<str>, evidence: Evidence) -> Self {
        Self {
            label: None,
            value: collapse_whitespace(value.as_ref()),
            evidence,
        }
    }

    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

type StrategyFn = Box<dyn Fn(&ParsedPage, &ScanConfig) -> Vec<Candidate> + Send + Sync>;

/// One source of candidates for a label.
pub struct Strategy {
    pub name: &'static str,
    applies: fn(&ParsedPage) -> bool,
    fills_label_gaps: bool,
    run: StrategyFn,
}

impl Strategy {
    pub fn new<F>(name: &'static str, run: F) -> Self
    where
        F: Fn(&ParsedPage, &ScanConfig) -> Vec<Candidate> + Send + Sync + 'static,
    {
        Self {
            name,
            applies: |_| true,
            fills_label_gaps: false,
            run: Box::new(run),
        }
    }

    /// Guard the strategy with a cheap predicate over the page indices.
    pub fn when(mut self, applies: fn(&ParsedPage) -> bool) -> Self {
        self.applies = applies;
        self
    }

    /// When this strategy does not win, admit its labelled candidates for
    /// labels the winner left uncovered (e.g. a platform missing from `sameAs`).
    pub fn fill_label_gaps(mut self) -> Self {
        self.fills_label_gaps = true;
        self
    }

    fn candidates(&self, page: &ParsedPage, config: &ScanConfig) -> Vec<Candidate> {
        if !(self.applies)(page) {
            return Vec::new();
        }
        (self.run)(page, config)
            .into_iter()
            .filter(|c| !c.value.is_empty())
            .collect()
    }
}

/// Ordered strategies for one label.
pub struct FieldChain {
    pub label: &'static str,
    pub strategies: Vec<Strategy>,
}

/// Outcome of running a chain: the winning strategy's candidates plus the
/// lower-priority candidates that may corroborate them.
#[derive(Debug, Default)]
pub struct ChainOutcome {
    pub winner: Option<&'static str>,
    pub primary: Vec<Candidate>,
    pub corroborating: Vec<Candidate>,
}

impl FieldChain {
    pub fn new(label: &'static str, strategies: Vec<Strategy>) -> Self {
        Self { label, strategies }
    }

    pub fn run(&self, page: &ParsedPage, config: &ScanConfig) -> ChainOutcome {
        let mut outcome = ChainOutcome::default();
        for strategy in &self.strategies {
            let found = strategy.candidates(page, config);
            if found.is_empty() {
                continue;
            }
            if outcome.winner.is_none() {
                outcome.winner = Some(strategy.name);
                outcome.primary = found;
            } else if strategy.fills_label_gaps {
                let covered: HashSet<String> =
                    outcome.primary.iter().filter_map(|c| c.label.clone()).collect();
                let (fresh, known): (Vec<Candidate>, Vec<Candidate>) = found
                    .into_iter()
                    .partition(|c| c.label.as_ref().is_some_and(|l| !covered.contains(l)));
                outcome.primary.extend(fresh);
                outcome.corroborating.extend(known);
            } else {
                outcome.corroborating.extend(found);
            }
        }
        outcome
    }
}

/// Produces data point ids for one category.
#[derive(Debug)]
pub struct IdGenerator {
    strategy: IdStrategy,
    category_id: String,
    next: usize,
    issued: HashSet<String>,
}

impl IdGenerator {
    pub fn new(strategy: IdStrategy, category_id: &str) -> Self {
        Self {
            strategy,
            category_id: category_id.to_string(),
            next: 0,
            issued: HashSet::new(),
        }
    }

    pub fn next_id(&mut self, label: &str, value: &str) -> String {
        let base = match self.strategy {
            IdStrategy::Sequential => {
                self.next += 1;
                format!("{}-{}", self.category_id, self.next)
            }
            IdStrategy::ContentHash => {
                let mut hasher = FnvHasher::default();
                hasher.write(label.to_lowercase().as_bytes());
                hasher.write(b"|");
                hasher.write(dedup_key(value).as_bytes());
                format!("{}-{:08x}", self.category_id, hasher.finish() as u32)
            }
        };
        let mut id = base.clone();
        let mut n = 2;
        while !self.issued.insert(id.clone()) {
            id = format!("{base}-{n}");
            n += 1;
        }
        id
    }
}

/// Accumulates a category's points, deduplicating by normalized value.
#[derive(Debug)]
pub struct StationSet {
    category_id: String,
    ids: IdGenerator,
    points: Vec<DataPoint>,
    index: HashMap<String, usize>,
}

impl StationSet {
    pub fn new(category_id: &str, strategy: IdStrategy) -> Self {
        Self {
            category_id: category_id.to_string(),
            ids: IdGenerator::new(strategy, category_id),
            points: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Add a candidate, merging evidence into an existing point with the same value.
    pub fn insert(&mut self, label: &str, candidate: Candidate) {
        let key = dedup_key(&candidate.value);
        if key.is_empty() {
            return;
        }
        if let Some(&i) = self.index.get(&key) {
            self.points[i].merge_evidence(std::slice::from_ref(&candidate.evidence));
            return;
        }
        let label = candidate.label.as_deref().unwrap_or(label).to_string();
        let id = self.ids.next_id(&label, &candidate.value);
        self.index.insert(key, self.points.len());
        self.points.push(DataPoint {
            id,
            category_id: self.category_id.clone(),
            label,
            value: candidate.value,
            confidence: 0.0,
            evidence: vec![candidate.evidence],
        });
    }

    /// Add evidence to an existing value only. Returns whether it matched.
    pub fn corroborate(&mut self, candidate: &Candidate) -> bool {
        match self.index.get(&dedup_key(&candidate.value)) {
            Some(&i) => {
                self.points[i].merge_evidence(std::slice::from_ref(&candidate.evidence));
                true
            }
            None => false,
        }
    }

    pub fn absorb(&mut self, label: &str, outcome: ChainOutcome) {
        for candidate in outcome.primary {
            self.insert(label, candidate);
        }
        for candidate in &outcome.corroborating {
            self.corroborate(candidate);
        }
    }

    pub fn into_points(self) -> Vec<DataPoint> {
        self.points
    }
}

/// A fixed-category extractor.
pub trait Extractor: Send + Sync {
    fn category_id(&self) -> &'static str;

    fn chains(&self) -> Vec<FieldChain>;

    /// Run every chain. Confidence is left at 0 for the scorer.
    fn extract(&self, page: &ParsedPage, config: &ScanConfig) -> Vec<DataPoint> {
        let mut set = StationSet::new(self.category_id(), config.id_strategy);
        for chain in self.chains() {
            let outcome = chain.run(page, config);
            set.absorb(chain.label, outcome);
        }
        set.into_points()
    }
}

/// All fixed extractors in map order.
pub fn default_extractors() -> Vec<Box<dyn Extractor>> {
    vec![
        Box::new(IdentityExtractor),
        Box::new(ContactsExtractor),
        Box::new(ServicesExtractor),
        Box::new(TechnologyExtractor),
        Box::new(EntitiesExtractor),
        Box::new(PagesExtractor),
        Box::new(SchemaExtractor),
    ]
}

/// Truncate to at most `cap` characters on a char boundary.
pub fn truncate_chars(s: &str, cap: usize) -> String {
    let s = s.trim();
    match s.char_indices().nth(cap) {
        Some((idx, _)) => s[..idx].trim_end().to_string(),
        None => s.to_string(),
    }
}

fn is_list_container(tag: Option<&str>) -> bool {
    matches!(tag, Some("ul" | "ol" | "dl"))
}

/// Items of the first list that follows a heading matching `keywords`.
///
/// Up to `window` following element siblings are inspected; a sibling may be
/// the list itself or wrap one. Scanning stops at the first list found.
pub fn heading_scoped_list(
    page: &ParsedPage,
    keywords: &[&str],
    window: usize,
    cap: usize,
) -> Vec<Candidate> {
    let tree = &page.tree;
    let mut out = Vec::new();

    for heading in page.headings() {
        let heading_text = tree.text(heading).to_lowercase();
        if !keywords.iter().any(|k| heading_text.contains(k)) {
            continue;
        }
        let Some(list) = first_list_after(page, heading, window) else {
            continue;
        };
        let item_tags: &[&str] = if tree.tag(list) == Some("dl") {
            &["dt"]
        } else {
            &["li"]
        };
        for item in tree.element_children(list) {
            if !tree.tag(item).is_some_and(|t| item_tags.contains(&t)) {
                continue;
            }
            let text = truncate_chars(&tree.text(item), cap);
            if text.is_empty() {
                continue;
            }
            out.push(Candidate::new(
                &text,
                Evidence::new(EvidenceSource::Markup, tree.locator(item), &text),
            ));
        }
        break;
    }

    out
}

fn first_list_after(page: &ParsedPage, heading: NodeId, window: usize) -> Option<NodeId> {
    let tree = &page.tree;
    for sibling in tree.following_element_siblings(heading).into_iter().take(window) {
        if is_list_container(tree.tag(sibling)) {
            return Some(sibling);
        }
        if let Some(nested) = tree
            .descendants(sibling)
            .into_iter()
            .find(|&d| d != sibling && is_list_container(tree.tag(d)))
        {
            return Some(nested);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn candidate(value: &str, source: EvidenceSource, locator: &str) -> Candidate {
        Candidate::new(value, Evidence::new(source, locator, value))
    }

    #[test]
    fn test_station_set_merges_case_insensitive_values() {
        let mut set = StationSet::new("services", IdStrategy::Sequential);
        set.insert("Service", candidate("Drain Cleaning", EvidenceSource::Markup, "a"));
        set.insert("Service", candidate("drain  cleaning", EvidenceSource::Heuristic, "b"));
        let points = set.into_points();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].evidence.len(), 2);
        assert_eq!(points[0].id, "services-1");
    }

    #[test]
    fn test_chain_first_success_fixes_values() {
        let chain = FieldChain::new(
            "Phone",
            vec![
                Strategy::new("structured", |_, _| {
                    vec![candidate("(555) 123-4567", EvidenceSource::StructuredData, "ld")]
                }),
                Strategy::new("text", |_, _| {
                    vec![
                        candidate("(555) 123-4567", EvidenceSource::Heuristic, "p"),
                        candidate("(555) 999-0000", EvidenceSource::Heuristic, "p"),
                    ]
                }),
            ],
        );
        let page = parse("", "https://acme.test/");
        let outcome = chain.run(&page, &ScanConfig::default());
        assert_eq!(outcome.winner, Some("structured"));

        let mut set = StationSet::new("contacts", IdStrategy::ContentHash);
        set.absorb(chain.label, outcome);
        let points = set.into_points();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].evidence.len(), 2);
    }

    #[test]
    fn test_gap_filling_strategy_adds_uncovered_labels_only() {
        let chain = FieldChain::new(
            "Social Profile",
            vec![
                Strategy::new("same-as", |_, _| {
                    vec![candidate("https://facebook.com/acme", EvidenceSource::StructuredData, "ld").labelled("Facebook")]
                }),
                Strategy::new("links", |_, _| {
                    vec![
                        candidate("https://facebook.com/acme-old", EvidenceSource::Markup, "a[1]").labelled("Facebook"),
                        candidate("https://linkedin.com/company/acme", EvidenceSource::Markup, "a[2]").labelled("LinkedIn"),
                    ]
                })
                .fill_label_gaps(),
            ],
        );
        let page = parse("", "https://acme.test/");
        let outcome = chain.run(&page, &ScanConfig::default());
        assert_eq!(outcome.winner, Some("same-as"));
        let primary: Vec<&str> = outcome.primary.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(primary, vec!["https://facebook.com/acme", "https://linkedin.com/company/acme"]);
        assert_eq!(outcome.corroborating.len(), 1);
    }

    #[test]
    fn test_chain_falls_through_empty_strategies() {
        let chain = FieldChain::new(
            "Email",
            vec![
                Strategy::new("never", |_, _| vec![candidate("x@y.z", EvidenceSource::StructuredData, "")])
                    .when(|_| false),
                Strategy::new("text", |_, _| vec![candidate("hi@acme.test", EvidenceSource::Heuristic, "p")]),
            ],
        );
        let page = parse("", "https://acme.test/");
        let outcome = chain.run(&page, &ScanConfig::default());
        assert_eq!(outcome.winner, Some("text"));
        assert_eq!(outcome.primary[0].value, "hi@acme.test");
    }

    #[test]
    fn test_content_hash_ids_are_stable_and_unique() {
        let mut a = IdGenerator::new(IdStrategy::ContentHash, "identity");
        let mut b = IdGenerator::new(IdStrategy::ContentHash, "identity");
        let first = a.next_id("Business Name", "Acme Co");
        assert_eq!(first, b.next_id("Business Name", "acme  co"));
        assert!(first.starts_with("identity-"));
        let again = a.next_id("Business Name", "Acme Co");
        assert_eq!(again, format!("{first}-2"));
    }

    #[test]
    fn test_heading_scoped_list_stops_at_first_list() {
        let html = r#"<html><body>
            <h2>Our Services</h2>
            <p>We do a lot.</p>
            <div><ul><li>Drain Cleaning</li><li>Water Heaters</li></ul></div>
            <ul><li>Not this one</li></ul>
        </body></html>"#;
        let page = parse(html, "https://acme.test/");
        let items = heading_scoped_list(&page, &["services"], 3, 80);
        let values: Vec<&str> = items.iter().map(|c| c.value.as_str()).collect();
        assert_eq!(values, vec!["Drain Cleaning", "Water Heaters"]);
        assert_eq!(items[0].evidence.source, EvidenceSource::Markup);
    }

    #[test]
    fn test_heading_scoped_list_respects_window() {
        let html = r#"<html><body>
            <h2>Services</h2><p>a</p><p>b</p><p>c</p>
            <ul><li>Too far</li></ul>
        </body></html>"#;
        let page = parse(html, "https://acme.test/");
        assert!(heading_scoped_list(&page, &["services"], 3, 80).is_empty());
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("abcdef", 3), "abc");
        assert_eq!(truncate_chars("  ab ", 3), "ab");
        assert_eq!(truncate_chars("héllo", 2), "hé");
    }
}
