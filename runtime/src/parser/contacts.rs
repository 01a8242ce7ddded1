//! Contact hints: emails, phones, postal addresses and opening hours.
//!
//! Passes run from most to least trustworthy: `mailto:`/`tel:` anchors,
//! `<address>` elements, then regex passes over visible text blocks. Every
//! regex candidate is validated before it is kept.

use super::dom::{collapse_whitespace, DomTree};
use super::TextBlock;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// How a contact hint was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HintOrigin {
    /// `mailto:` / `tel:` anchors.
    Anchor,
    /// A dedicated element such as `<address>`.
    Element,
    /// Regex over free text.
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactHint {
    /// Normalized value.
    pub value: String,
    /// Matched text before normalization.
    pub raw: String,
    pub locator: String,
    pub origin: HintOrigin,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactHints {
    pub emails: Vec<ContactHint>,
    pub phones: Vec<ContactHint>,
    pub addresses: Vec<ContactHint>,
    pub hours: Vec<ContactHint>,
}

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap());

static EMAIL_EXACT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9._%+-]+@[a-z0-9-]+(?:\.[a-z0-9-]+)*\.[a-z]{2,}$").unwrap());

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\+\d{1,3}[\s.-]?)?(?:\(\d{2,4}\)\s?|\d{2,4}[\s.-])\d{3,4}[\s.-]\d{3,4}").unwrap()
});

static ADDRESS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        \b\d{1,6}\s+
        (?:[A-Za-z0-9][A-Za-z0-9.'-]*\s+){0,4}
        (?:Street|St|Avenue|Ave|Road|Rd|Boulevard|Blvd|Lane|Ln|Drive|Dr|Court|Ct|Way|Place|Pl|Parkway|Pkwy|Highway|Hwy|Terrace|Square|Sq)\b\.?
        (?:,?\s*(?:Suite|Ste|Unit|\#)\s*[A-Za-z0-9-]+)?
        (?:,?\s+[A-Z][A-Za-z.]+(?:\s[A-Z][A-Za-z.]+){0,2})?
        (?:,\s*[A-Z]{2}\s+\d{5}(?:-\d{4})?)?",
    )
    .unwrap()
});

static HOURS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?xi)
        \b(?:mon|tue|tues|wed|thu|thur|thurs|fri|sat|sun)(?:day|nesday|rsday|urday|sday)?\.?
        (?:\s*(?:-|–|to|&)\s*(?:mon|tue|tues|wed|thu|thur|thurs|fri|sat|sun)(?:day|nesday|rsday|urday|sday)?\.?)?
        :?\s*
        \d{1,2}(?::\d{2})?\s*(?:am|pm|a\.m\.|p\.m\.)?
        \s*(?:-|–|to)\s*
        \d{1,2}(?::\d{2})?\s*(?:am|pm|a\.m\.|p\.m\.)?",
    )
    .unwrap()
});

/// File extensions that look like TLDs in asset names such as `logo@2x.png`.
const ASSET_TLDS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp", "css", "js", "ico", "avif"];

/// Validate and normalize an email candidate.
pub fn normalize_email(candidate: &str) -> Option<String> {
    let s = candidate.trim();
    let s = s.strip_prefix("mailto:").unwrap_or(s);
    let s = s.split('?').next().unwrap_or(s);
    let s = s.trim().trim_end_matches('.').to_lowercase();
    if !EMAIL_EXACT_RE.is_match(&s) {
        return None;
    }
    let tld = s.rsplit('.').next().unwrap_or_default();
    if ASSET_TLDS.contains(&tld) {
        return None;
    }
    Some(s)
}

/// Validate and normalize a phone candidate.
///
/// Accepts 7–15 digits. Free-text candidates must also carry separator,
/// parenthesis or plus punctuation; `tel:` anchors are trusted without it.
/// Runs of year-like four-digit groups ("2019 2020 2021") are rejected.
/// North American numbers normalize to `(AAA) BBB-CCCC`.
pub fn normalize_phone(candidate: &str, require_punctuation: bool) -> Option<String> {
    let s = collapse_whitespace(candidate.trim().trim_start_matches("tel:"));
    let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
    if !(7..=15).contains(&digits.len()) {
        return None;
    }
    let punctuated = s.chars().any(|c| matches!(c, ' ' | '-' | '.' | '(' | ')' | '+'));
    if require_punctuation && !punctuated {
        return None;
    }
    let groups: Vec<&str> = s
        .split(|c: char| !c.is_ascii_digit())
        .filter(|g| !g.is_empty())
        .collect();
    let year_like = |g: &&str| g.len() == 4 && (g.starts_with("19") || g.starts_with("20"));
    if groups.len() > 1 && groups.iter().all(year_like) {
        return None;
    }

    let national = match digits.len() {
        10 => Some(digits.as_str()),
        11 if digits.starts_with('1') => Some(&digits[1..]),
        _ => None,
    };
    match national {
        Some(d) => Some(format!("({}) {}-{}", &d[0..3], &d[3..6], &d[6..10])),
        None => Some(s),
    }
}

/// Digits-only key so differently formatted phones compare equal.
pub fn phone_digits(value: &str) -> String {
    let digits: String = value.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 11 && digits.starts_with('1') {
        digits[1..].to_string()
    } else {
        digits
    }
}

fn boundary_ok(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(|c| c.is_ascii_digit() || c.is_ascii_alphabetic())
        && !after.is_some_and(|c| c.is_ascii_digit())
}

fn push_unique(list: &mut Vec<ContactHint>, hint: ContactHint) {
    if !list
        .iter()
        .any(|h| h.value.eq_ignore_ascii_case(&hint.value) && h.locator == hint.locator)
    {
        list.push(hint);
    }
}

/// Phones found in one piece of free text.
pub fn scan_phones(text: &str) -> Vec<(String, String)> {
    PHONE_RE
        .find_iter(text)
        .filter(|m| boundary_ok(text, m.start(), m.end()))
        .filter_map(|m| {
            let raw = collapse_whitespace(m.as_str());
            normalize_phone(&raw, true).map(|v| (v, raw))
        })
        .collect()
}

pub fn extract_contacts(tree: &DomTree, blocks: &[TextBlock]) -> ContactHints {
    let mut hints = ContactHints::default();

    // Pass 1: anchors.
    for id in tree.elements_by_tag("a") {
        let Some(href) = tree.attr(id, "href") else {
            continue;
        };
        let href = href.trim();
        let lower = href.to_ascii_lowercase();
        if lower.starts_with("mailto:") {
            if let Some(value) = normalize_email(&href[7..]) {
                push_unique(
                    &mut hints.emails,
                    ContactHint {
                        value,
                        raw: href.to_string(),
                        locator: tree.locator(id),
                        origin: HintOrigin::Anchor,
                    },
                );
            }
        } else if lower.starts_with("tel:") {
            if let Some(value) = normalize_phone(&href[4..], false) {
                push_unique(
                    &mut hints.phones,
                    ContactHint {
                        value,
                        raw: href.to_string(),
                        locator: tree.locator(id),
                        origin: HintOrigin::Anchor,
                    },
                );
            }
        }
    }

    // Pass 2: <address> elements.
    for id in tree.elements_by_tag("address") {
        let text = tree.text(id);
        let Some(m) = ADDRESS_RE.find(&text) else {
            continue;
        };
        push_unique(
            &mut hints.addresses,
            ContactHint {
                value: clean_address(m.as_str()),
                raw: text.clone(),
                locator: tree.locator(id),
                origin: HintOrigin::Element,
            },
        );
    }

    // Pass 3: regex over visible text.
    for block in blocks {
        for m in EMAIL_RE.find_iter(&block.text) {
            if let Some(value) = normalize_email(m.as_str()) {
                push_unique(
                    &mut hints.emails,
                    ContactHint {
                        value,
                        raw: m.as_str().to_string(),
                        locator: block.locator.clone(),
                        origin: HintOrigin::Text,
                    },
                );
            }
        }
        for (value, raw) in scan_phones(&block.text) {
            push_unique(
                &mut hints.phones,
                ContactHint {
                    value,
                    raw,
                    locator: block.locator.clone(),
                    origin: HintOrigin::Text,
                },
            );
        }
        for m in ADDRESS_RE.find_iter(&block.text) {
            let value = clean_address(m.as_str());
            if value.split_whitespace().count() < 3 {
                continue;
            }
            push_unique(
                &mut hints.addresses,
                ContactHint {
                    value,
                    raw: m.as_str().to_string(),
                    locator: block.locator.clone(),
                    origin: HintOrigin::Text,
                },
            );
        }
        for m in HOURS_RE.find_iter(&block.text) {
            push_unique(
                &mut hints.hours,
                ContactHint {
                    value: collapse_whitespace(m.as_str()),
                    raw: m.as_str().to_string(),
                    locator: block.locator.clone(),
                    origin: HintOrigin::Text,
                },
            );
        }
    }

    hints
}

fn clean_address(s: &str) -> String {
    collapse_whitespace(s)
        .trim_end_matches([',', ' '])
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_is_not_a_phone() {
        assert!(scan_phones("Copyright 2025 Acme").is_empty());
        assert!(scan_phones("Serving since 2019 2020 2021").is_empty());
        assert!(scan_phones("ZIP 62701").is_empty());
    }

    #[test]
    fn test_formatted_phone_is_found_once() {
        let found = scan_phones("Call (555) 123-4567 today");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].0, "(555) 123-4567");
    }

    #[test]
    fn test_phone_normalization_is_shared() {
        assert_eq!(normalize_phone("555-123-4567", true).as_deref(), Some("(555) 123-4567"));
        assert_eq!(normalize_phone("+1 555.123.4567", true).as_deref(), Some("(555) 123-4567"));
        assert_eq!(normalize_phone("5551234567", true), None);
        assert_eq!(normalize_phone("5551234567", false).as_deref(), Some("(555) 123-4567"));
        assert_eq!(
            normalize_phone("+44 20 7946 0958", true).as_deref(),
            Some("+44 20 7946 0958")
        );
    }

    #[test]
    fn test_email_rejects_assets() {
        assert_eq!(normalize_email("Hello@Acme.test").as_deref(), Some("hello@acme.test"));
        assert_eq!(normalize_email("logo@2x.png"), None);
        assert_eq!(
            normalize_email("mailto:info@acme.test?subject=Hi").as_deref(),
            Some("info@acme.test")
        );
    }

    #[test]
    fn test_address_and_hours_patterns() {
        let text = "Visit us at 123 Main Street, Springfield, IL 62701. Open Mon-Fri 9am - 5pm";
        let addr = ADDRESS_RE.find(text).unwrap();
        assert!(addr.as_str().starts_with("123 Main Street"));
        assert!(addr.as_str().contains("62701"));
        let hours = HOURS_RE.find(text).unwrap();
        assert_eq!(collapse_whitespace(hours.as_str()), "Mon-Fri 9am - 5pm");
    }
}
