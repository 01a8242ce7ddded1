//! Dynamic categories: propose thematic lines from the scanned text and
//! move matching non-core stations onto them.
//!
//! Everything here is a pure function of its inputs so the pass can be
//! replayed on fixed fixtures.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::catalog::{self, CategoryDefinition, FALLBACK_CATEGORY_IDS};
use crate::config::ScanConfig;
use crate::types::{dedup_key, DataPoint};

struct CompiledTheme {
    definition: CategoryDefinition,
    patterns: Vec<Regex>,
}

static THEMES: LazyLock<Vec<CompiledTheme>> = LazyLock::new(|| {
    catalog::themes()
        .into_iter()
        .map(|definition| {
            let patterns = definition
                .keywords
                .iter()
                .map(|k| Regex::new(&format!(r"(?i)\b{}\b", regex::escape(k))).unwrap())
                .collect();
            CompiledTheme {
                definition,
                patterns,
            }
        })
        .collect()
});

fn point_text(point: &DataPoint) -> String {
    format!("{} {}", point.label, point.value)
}

fn keyword_score(theme: &CompiledTheme, text: &str) -> usize {
    theme.patterns.iter().map(|p| p.find_iter(text).count()).sum()
}

/// Word-boundary keyword counts per theme over all points, in catalog order.
pub fn theme_scores(points: &[DataPoint]) -> Vec<(String, usize)> {
    let text = points.iter().map(point_text).collect::<Vec<_>>().join("\n");
    THEMES
        .iter()
        .map(|t| (t.definition.id.clone(), keyword_score(t, &text)))
        .collect()
}

/// Categories the map should carry for these points.
///
/// Core categories come first when they have points, then the top-scoring
/// themes, then fallback lines until `min_categories` is reached.
pub fn propose_categories(points: &[DataPoint], config: &ScanConfig) -> Vec<CategoryDefinition> {
    let mut proposed: Vec<CategoryDefinition> = Vec::new();

    for id in catalog::CORE_CATEGORY_IDS {
        if points.iter().any(|p| p.category_id == id) {
            proposed.extend(catalog::definition(id));
        }
    }

    let mut scored: Vec<(usize, &CompiledTheme, usize)> = theme_scores(points)
        .into_iter()
        .zip(THEMES.iter())
        .enumerate()
        .filter(|(_, ((_, score), _))| *score > 0)
        .map(|(order, ((_, score), theme))| (order, theme, score))
        .collect();
    scored.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));
    proposed.extend(
        scored
            .into_iter()
            .take(config.max_dynamic_categories)
            .map(|(_, theme, _)| theme.definition.clone()),
    );

    for id in FALLBACK_CATEGORY_IDS {
        if proposed.len() >= config.min_categories {
            break;
        }
        if !proposed.iter().any(|d| d.id == id) {
            proposed.extend(catalog::definition(id));
        }
    }

    proposed
}

/// Pure reducer: the existing set extended by new proposals, order kept.
pub fn reduce(
    existing: &[CategoryDefinition],
    points: &[DataPoint],
    config: &ScanConfig,
) -> Vec<CategoryDefinition> {
    let mut out = existing.to_vec();
    for definition in propose_categories(points, config) {
        if !out.iter().any(|d| d.id == definition.id) {
            out.push(definition);
        }
    }
    out
}

/// Move non-core points onto their best-matching theme among `categories`.
///
/// Points that match no theme keep their category. Points that land on the
/// same value in the same category are merged.
pub fn assign(points: &[DataPoint], categories: &[CategoryDefinition]) -> Vec<DataPoint> {
    let themes: Vec<&CompiledTheme> = categories
        .iter()
        .filter(|c| c.is_theme())
        .filter_map(|c| THEMES.iter().find(|t| t.definition.id == c.id))
        .collect();

    let mut out: Vec<DataPoint> = Vec::with_capacity(points.len());
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for point in points {
        let mut point = point.clone();
        if !catalog::is_core(&point.category_id) {
            let text = point_text(&point);
            let best = themes
                .iter()
                .map(|t| (*t, keyword_score(t, &text)))
                .filter(|(_, s)| *s > 0)
                .fold(None::<(&CompiledTheme, usize)>, |best, (t, s)| match best {
                    Some((_, b)) if b >= s => best,
                    _ => Some((t, s)),
                });
            if let Some((theme, _)) = best {
                point.category_id = theme.definition.id.clone();
            }
        }

        let key = (point.category_id.clone(), dedup_key(&point.value));
        match index.get(&key) {
            Some(&i) => out[i].merge_evidence(&point.evidence),
            None => {
                index.insert(key, out.len());
                out.push(point);
            }
        }
    }

    out
}
