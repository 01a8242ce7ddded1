//! Confidence scoring.
//!
//! A point's confidence is its strongest evidence source, plus a small bonus
//! for corroboration and for values long enough to be unlikely noise.

use crate::types::{DataPoint, EvidenceSource};

/// Score of a point that carries no evidence at all.
pub const FLOOR: f64 = 0.30;

pub const CORROBORATION_STEP: f64 = 0.05;
pub const CORROBORATION_CAP: f64 = 0.10;
pub const LONG_VALUE_BONUS: f64 = 0.05;
pub const LONG_VALUE_CHARS: usize = 20;

pub fn source_weight(source: EvidenceSource) -> f64 {
    match source {
        EvidenceSource::StructuredData => 0.90,
        EvidenceSource::SemanticMarkup => 0.80,
        EvidenceSource::Metadata => 0.75,
        EvidenceSource::ScriptSignature => 0.70,
        EvidenceSource::Markup => 0.60,
        EvidenceSource::Heuristic => 0.45,
    }
}

/// Pure and total: every point gets a value in `[0, 1]`.
pub fn score(point: &DataPoint) -> f64 {
    let Some(base) = point
        .evidence
        .iter()
        .map(|e| source_weight(e.source))
        .reduce(f64::max)
    else {
        return FLOOR;
    };

    let extra = point.evidence.len().saturating_sub(1) as f64;
    let corroboration = (extra * CORROBORATION_STEP).min(CORROBORATION_CAP);
    let length = if point.value.chars().count() > LONG_VALUE_CHARS {
        LONG_VALUE_BONUS
    } else {
        0.0
    };

    (base + corroboration + length).clamp(0.0, 1.0)
}

/// Assign derived confidences in place.
pub fn score_all(points: &mut [DataPoint]) {
    for point in points {
        point.confidence = score(point);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Evidence;

    fn point(value: &str, sources: &[EvidenceSource]) -> DataPoint {
        DataPoint {
            id: "p".into(),
            category_id: "contacts".into(),
            label: "Phone".into(),
            value: value.into(),
            confidence: 0.0,
            evidence: sources
                .iter()
                .enumerate()
                .map(|(i, s)| Evidence::new(*s, format!("loc{i}"), value))
                .collect(),
        }
    }

    #[test]
    fn test_no_evidence_scores_floor() {
        assert_eq!(score(&point("x", &[])), FLOOR);
    }

    #[test]
    fn test_structured_plus_text_reaches_ninety_five() {
        let p = point(
            "(555) 123-4567",
            &[EvidenceSource::StructuredData, EvidenceSource::Heuristic],
        );
        assert!((score(&p) - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_corroboration_bonus_is_capped() {
        let p = point("abc", &[EvidenceSource::Heuristic; 6]);
        assert!((score(&p) - 0.55).abs() < 1e-9);
    }

    #[test]
    fn test_long_values_get_a_bonus_and_clamp() {
        let long = "a value that is clearly longer than twenty";
        let p = point(long, &[EvidenceSource::StructuredData; 4]);
        assert_eq!(score(&p), 1.0);
        let q = point(long, &[EvidenceSource::Markup]);
        assert!((score(&q) - 0.65).abs() < 1e-9);
    }

    #[test]
    fn test_score_all_fills_confidence() {
        let mut points = vec![point("a", &[EvidenceSource::Metadata])];
        score_all(&mut points);
        assert!((points[0].confidence - 0.75).abs() < 1e-9);
    }
}
