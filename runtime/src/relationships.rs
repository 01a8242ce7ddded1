//! Transfer detection between stations on different lines.
//!
//! What counts as "the same fact seen twice" is a pluggable [`TransferRule`].
//! The [`TransferDetector`] runs its rules in order and enforces the
//! invariants every relationship must satisfy:
//!
//! - the two points live in two different categories,
//! - both point ids exist in the scanned categories,
//! - an unordered pair of points is linked at most once,
//! - a pair of categories carries at most `max_per_pair` transfers.

use std::collections::{HashMap, HashSet};

use regex::Regex;

use crate::extract::entities::looks_like_name;
use crate::layout::geometry::{segment_intersection, Point};
use crate::layout::LayoutLine;
use crate::types::{Category, DataPoint, Relationship};

/// Minimum normalized length for a shared value to count.
const SHARED_KEY_MIN: usize = 3;
/// Minimum length of a name that may be found inside another value.
const CONTAINED_NAME_MIN: usize = 4;

/// What a rule sees: the final categories and, when available, their routed lines.
pub struct RuleContext<'a> {
    pub categories: &'a [Category],
    pub lines: &'a [LayoutLine],
}

/// A proposed link between two points, `(category_id, point_id)` each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferCandidate {
    pub a: (String, String),
    pub b: (String, String),
    pub reason: String,
}

impl TransferCandidate {
    fn between(a: &DataPoint, b: &DataPoint, reason: String) -> Self {
        Self {
            a: (a.category_id.clone(), a.id.clone()),
            b: (b.category_id.clone(), b.id.clone()),
            reason,
        }
    }
}

pub trait TransferRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn candidates(&self, ctx: &RuleContext<'_>) -> Vec<TransferCandidate>;
}

/// Every pair of points in two different categories, categories in order.
fn cross_pairs(categories: &[Category]) -> impl Iterator<Item = (&DataPoint, &DataPoint)> {
    categories.iter().enumerate().flat_map(move |(i, ca)| {
        categories[i + 1..].iter().flat_map(move |cb| {
            ca.data_points
                .iter()
                .flat_map(move |a| cb.data_points.iter().map(move |b| (a, b)))
        })
    })
}

/// Lowercase alphanumerics only, so "(555) 123-4567" and "555.123.4567" agree.
pub fn alnum_key(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Same normalized value in two categories.
pub struct SharedValueRule;

impl TransferRule for SharedValueRule {
    fn name(&self) -> &'static str {
        "shared-value"
    }

    fn candidates(&self, ctx: &RuleContext<'_>) -> Vec<TransferCandidate> {
        cross_pairs(ctx.categories)
            .filter_map(|(a, b)| {
                let key = alnum_key(&a.value);
                (key.chars().count() >= SHARED_KEY_MIN && key == alnum_key(&b.value)).then(|| {
                    TransferCandidate::between(a, b, format!("shared value \"{}\"", a.value))
                })
            })
            .collect()
    }
}

/// A name-like value that appears as a whole word inside a longer value.
pub struct ContainmentRule;

impl ContainmentRule {
    fn pattern(value: &str) -> Option<Regex> {
        let name_like = looks_like_name(value)
            && value.chars().count() >= CONTAINED_NAME_MIN
            && value.chars().any(char::is_alphabetic);
        if !name_like {
            return None;
        }
        Regex::new(&format!(r"(?i)\b{}\b", regex::escape(value))).ok()
    }

    /// Compile one pattern per distinct name-like value.
    fn compile(categories: &[Category]) -> ContainmentPatterns<'_> {
        let mut compiled = Vec::new();
        let mut by_value: HashMap<&str, Option<usize>> = HashMap::new();
        let mut by_id = HashMap::new();
        for p in categories.iter().flat_map(|c| c.data_points.iter()) {
            let slot = *by_value.entry(p.value.as_str()).or_insert_with(|| {
                Self::pattern(&p.value).map(|re| {
                    compiled.push(re);
                    compiled.len() - 1
                })
            });
            if let Some(i) = slot {
                by_id.insert(p.id.as_str(), i);
            }
        }
        ContainmentPatterns { compiled, by_id }
    }
}

/// Word-boundary patterns shared by every point with the same value.
struct ContainmentPatterns<'c> {
    compiled: Vec<Regex>,
    by_id: HashMap<&'c str, usize>,
}

impl ContainmentPatterns<'_> {
    fn contains(&self, needle: &DataPoint, hay: &DataPoint) -> bool {
        if hay.value.chars().count() <= needle.value.chars().count() {
            return false;
        }
        self.by_id
            .get(needle.id.as_str())
            .is_some_and(|&i| self.compiled[i].is_match(&hay.value))
    }
}

impl TransferRule for ContainmentRule {
    fn name(&self) -> &'static str {
        "containment"
    }

    fn candidates(&self, ctx: &RuleContext<'_>) -> Vec<TransferCandidate> {
        let patterns = Self::compile(ctx.categories);
        cross_pairs(ctx.categories)
            .filter_map(|(a, b)| {
                if patterns.contains(a, b) {
                    Some(TransferCandidate::between(
                        a,
                        b,
                        format!("\"{}\" mentions \"{}\"", b.value, a.value),
                    ))
                } else if patterns.contains(b, a) {
                    Some(TransferCandidate::between(
                        a,
                        b,
                        format!("\"{}\" mentions \"{}\"", a.value, b.value),
                    ))
                } else {
                    None
                }
            })
            .collect()
    }
}

/// Two routed lines cross: link the station on each line nearest the first crossing.
pub struct PathCrossingRule;

impl PathCrossingRule {
    fn first_crossing(a: &LayoutLine, b: &LayoutLine) -> Option<Point> {
        a.segments.iter().find_map(|sa| {
            b.segments
                .iter()
                .find_map(|sb| segment_intersection(sa, sb))
        })
    }

    fn nearest_station<'a>(line: &'a LayoutLine, at: &Point) -> Option<&'a DataPoint> {
        line.placed_data_points
            .iter()
            .min_by(|p, q| {
                let dp = Point::new(p.x, p.y).distance(at);
                let dq = Point::new(q.x, q.y).distance(at);
                dp.partial_cmp(&dq).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|p| &p.point)
    }
}

impl TransferRule for PathCrossingRule {
    fn name(&self) -> &'static str {
        "path-crossing"
    }

    fn candidates(&self, ctx: &RuleContext<'_>) -> Vec<TransferCandidate> {
        let mut out = Vec::new();
        for (i, la) in ctx.lines.iter().enumerate() {
            for lb in &ctx.lines[i + 1..] {
                let Some(at) = Self::first_crossing(la, lb) else {
                    continue;
                };
                if let (Some(a), Some(b)) =
                    (Self::nearest_station(la, &at), Self::nearest_station(lb, &at))
                {
                    out.push(TransferCandidate::between(
                        a,
                        b,
                        format!("lines cross at ({:.0}, {:.0})", at.x, at.y),
                    ));
                }
            }
        }
        out
    }
}

pub fn default_rules() -> Vec<Box<dyn TransferRule>> {
    vec![
        Box::new(SharedValueRule),
        Box::new(ContainmentRule),
        Box::new(PathCrossingRule),
    ]
}

pub struct TransferDetector {
    rules: Vec<Box<dyn TransferRule>>,
    max_per_pair: usize,
}

impl TransferDetector {
    pub fn new(rules: Vec<Box<dyn TransferRule>>, max_per_pair: usize) -> Self {
        Self { rules, max_per_pair }
    }

    pub fn with_default_rules(max_per_pair: usize) -> Self {
        Self::new(default_rules(), max_per_pair)
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run every rule and keep the candidates that satisfy the invariants.
    /// Ids are `transfer-{n}` in acceptance order.
    pub fn detect(&self, ctx: &RuleContext<'_>) -> Vec<Relationship> {
        let known: HashMap<&str, &str> = ctx
            .categories
            .iter()
            .flat_map(|c| c.data_points.iter().map(move |p| (p.id.as_str(), c.id.as_str())))
            .collect();

        let mut seen_pairs: HashSet<(String, String)> = HashSet::new();
        let mut per_category_pair: HashMap<(String, String), usize> = HashMap::new();
        let mut out = Vec::new();

        for rule in &self.rules {
            for candidate in rule.candidates(ctx) {
                let (cat_a, id_a) = &candidate.a;
                let (cat_b, id_b) = &candidate.b;
                if cat_a == cat_b || id_a == id_b {
                    continue;
                }
                let exists = |id: &str, cat: &str| known.get(id).is_some_and(|c| *c == cat);
                if !exists(id_a.as_str(), cat_a.as_str()) || !exists(id_b.as_str(), cat_b.as_str()) {
                    continue;
                }
                let pair = ordered(id_a, id_b);
                if seen_pairs.contains(&pair) {
                    continue;
                }
                let count = per_category_pair.entry(ordered(cat_a, cat_b)).or_insert(0);
                if *count >= self.max_per_pair {
                    continue;
                }
                *count += 1;
                seen_pairs.insert(pair);
                out.push(Relationship {
                    id: format!("transfer-{}", out.len() + 1),
                    data_point_ids: (id_a.clone(), id_b.clone()),
                    category_ids: (cat_a.clone(), cat_b.clone()),
                    reason: candidate.reason,
                });
            }
        }
        out
    }
}

fn ordered(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}
