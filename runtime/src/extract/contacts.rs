//! Contacts line: phone, email, address, hours, social profiles.

use serde_json::Value;
use url::Url;

use super::{json_objects, json_values, Candidate, Extractor, FieldChain, Strategy};
use crate::catalog::CONTACTS;
use crate::parser::contacts::{normalize_email, normalize_phone};
use crate::parser::dom::collapse_whitespace;
use crate::parser::links::platform_for;
use crate::parser::meta::json_str;
use crate::parser::{social_with_fallback, ContactHint, HintOrigin, ParsedPage};
use crate::types::{Evidence, EvidenceSource};

pub struct ContactsExtractor;

const ADDRESS_PARTS: &[&str] = &["streetAddress", "addressLocality", "addressRegion", "postalCode"];

fn structured_field<F>(page: &ParsedPage, key: &str, normalize: F) -> Vec<Candidate>
where
    F: Fn(&str) -> Option<String>,
{
    let mut out = Vec::new();
    for (object, locator) in json_objects(page) {
        for v in json_values(object, key) {
            let Some(raw) = v.as_str() else {
                continue;
            };
            if let Some(value) = normalize(raw) {
                out.push(Candidate::new(
                    value,
                    Evidence::new(EvidenceSource::StructuredData, format!("{locator}/{key}"), raw),
                ));
            }
        }
    }
    out
}

fn microdata_field<F>(page: &ParsedPage, key: &str, normalize: F) -> Vec<Candidate>
where
    F: Fn(&str) -> Option<String>,
{
    page.microdata
        .iter()
        .flat_map(|item| {
            item.properties
                .get(key)
                .into_iter()
                .flatten()
                .map(move |raw| (item, raw))
        })
        .filter_map(|(item, raw)| {
            let value = normalize(raw)?;
            Some(Candidate::new(
                value,
                Evidence::new(EvidenceSource::SemanticMarkup, format!("{}@{key}", item.locator), raw),
            ))
        })
        .collect()
}

fn hint_candidates(hints: &[ContactHint], origins: &[HintOrigin], source: EvidenceSource) -> Vec<Candidate> {
    hints
        .iter()
        .filter(|h| origins.contains(&h.origin))
        .map(|h| Candidate::new(&h.value, Evidence::new(source, &h.locator, &h.raw)))
        .collect()
}

/// `{"streetAddress": "...", ...}` → "123 Main Street, Springfield, IL 62701".
pub fn format_postal_address(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = collapse_whitespace(s);
            (!s.is_empty()).then_some(s)
        }
        Value::Object(map) => {
            let part = |k: &str| map.get(k).and_then(json_str);
            let street = part("streetAddress");
            let locality = part("addressLocality");
            let region_postal = match (part("addressRegion"), part("postalCode")) {
                (Some(r), Some(p)) => Some(format!("{r} {p}")),
                (r, p) => r.or(p),
            };
            let joined: Vec<String> = [street, locality, region_postal].into_iter().flatten().collect();
            if joined.is_empty() {
                None
            } else {
                Some(joined.join(", "))
            }
        }
        _ => None,
    }
}

/// One `openingHoursSpecification` entry → "Monday-Friday 09:00-17:00".
fn format_hours_spec(spec: &Value) -> Option<String> {
    let days: Vec<String> = json_values(spec, "dayOfWeek")
        .into_iter()
        .filter_map(|d| d.as_str())
        .map(|d| d.rsplit('/').next().unwrap_or(d).to_string())
        .collect();
    let opens = spec.get("opens").and_then(Value::as_str)?;
    let closes = spec.get("closes").and_then(Value::as_str)?;
    let day_part = match days.as_slice() {
        [] => String::new(),
        [one] => one.clone(),
        [first, .., last] => format!("{first}-{last}"),
    };
    Some(collapse_whitespace(&format!("{day_part} {opens}-{closes}")))
}

/// Canonical profile URL: `https://www.facebook.com/acme/` → `https://facebook.com/acme`.
pub fn normalize_profile_url(raw: &str) -> Option<(&'static str, String)> {
    let url = Url::parse(raw.trim()).ok()?;
    let platform = platform_for(&url)?;
    let host = url.host_str()?.to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    let path = url.path().trim_end_matches('/');
    if path.is_empty() {
        return None;
    }
    Some((platform, format!("https://{host}{path}")))
}

fn phone_chain() -> FieldChain {
    FieldChain::new(
        "Phone",
        vec![
            Strategy::new("json-ld", |page, _| {
                structured_field(page, "telephone", |v| normalize_phone(v, false))
            })
            .when(|page| !page.structured_data.is_empty()),
            Strategy::new("microdata", |page, _| {
                microdata_field(page, "telephone", |v| normalize_phone(v, false))
            }),
            Strategy::new("anchors", |page, _| {
                hint_candidates(&page.contacts.phones, &[HintOrigin::Anchor, HintOrigin::Element], EvidenceSource::Markup)
            }),
            Strategy::new("text", |page, _| {
                hint_candidates(&page.contacts.phones, &[HintOrigin::Text], EvidenceSource::Heuristic)
            }),
        ],
    )
}

fn email_chain() -> FieldChain {
    FieldChain::new(
        "Email",
        vec![
            Strategy::new("json-ld", |page, _| structured_field(page, "email", normalize_email))
                .when(|page| !page.structured_data.is_empty()),
            Strategy::new("microdata", |page, _| microdata_field(page, "email", normalize_email)),
            Strategy::new("anchors", |page, _| {
                hint_candidates(&page.contacts.emails, &[HintOrigin::Anchor, HintOrigin::Element], EvidenceSource::Markup)
            }),
            Strategy::new("text", |page, _| {
                hint_candidates(&page.contacts.emails, &[HintOrigin::Text], EvidenceSource::Heuristic)
            }),
        ],
    )
}

fn address_chain() -> FieldChain {
    FieldChain::new(
        "Address",
        vec![
            Strategy::new("json-ld", |page, _| {
                let mut out = Vec::new();
                for (object, locator) in json_objects(page) {
                    for v in json_values(object, "address") {
                        if let Some(value) = format_postal_address(v) {
                            out.push(Candidate::new(
                                &value,
                                Evidence::new(
                                    EvidenceSource::StructuredData,
                                    format!("{locator}/address"),
                                    v.to_string(),
                                ),
                            ));
                        }
                    }
                }
                out
            })
            .when(|page| !page.structured_data.is_empty()),
            Strategy::new("microdata", |page, _| {
                page.microdata
                    .iter()
                    .filter(|item| item.is_type(&["PostalAddress"]))
                    .filter_map(|item| {
                        let parts: serde_json::Map<String, Value> = ADDRESS_PARTS
                            .iter()
                            .filter_map(|k| item.first(k).map(|v| (k.to_string(), Value::from(v))))
                            .collect();
                        let value = format_postal_address(&Value::Object(parts))?;
                        Some(Candidate::new(
                            &value,
                            Evidence::new(EvidenceSource::SemanticMarkup, &item.locator, &value),
                        ))
                    })
                    .collect()
            }),
            Strategy::new("address-element", |page, _| {
                hint_candidates(&page.contacts.addresses, &[HintOrigin::Element], EvidenceSource::Markup)
            }),
            Strategy::new("text", |page, _| {
                hint_candidates(&page.contacts.addresses, &[HintOrigin::Text], EvidenceSource::Heuristic)
            }),
        ],
    )
}

fn hours_chain() -> FieldChain {
    FieldChain::new(
        "Hours",
        vec![
            Strategy::new("json-ld", |page, _| {
                let mut out = Vec::new();
                for (object, locator) in json_objects(page) {
                    for v in json_values(object, "openingHours") {
                        if let Some(value) = json_str(v) {
                            out.push(Candidate::new(
                                &value,
                                Evidence::new(
                                    EvidenceSource::StructuredData,
                                    format!("{locator}/openingHours"),
                                    &value,
                                ),
                            ));
                        }
                    }
                    for (i, spec) in json_values(object, "openingHoursSpecification").into_iter().enumerate() {
                        if let Some(value) = format_hours_spec(spec) {
                            out.push(Candidate::new(
                                &value,
                                Evidence::new(
                                    EvidenceSource::StructuredData,
                                    format!("{locator}/openingHoursSpecification[{i}]"),
                                    spec.to_string(),
                                ),
                            ));
                        }
                    }
                }
                out
            })
            .when(|page| !page.structured_data.is_empty()),
            Strategy::new("microdata", |page, _| {
                microdata_field(page, "openingHours", |v| {
                    let v = collapse_whitespace(v);
                    (!v.is_empty()).then_some(v)
                })
            }),
            Strategy::new("text", |page, _| {
                hint_candidates(&page.contacts.hours, &[HintOrigin::Text], EvidenceSource::Heuristic)
            }),
        ],
    )
}

fn social_chain() -> FieldChain {
    FieldChain::new(
        "Social Profile",
        vec![
            Strategy::new("same-as", |page, _| {
                let mut out = Vec::new();
                for (object, locator) in json_objects(page) {
                    for v in json_values(object, "sameAs") {
                        let Some(raw) = v.as_str() else {
                            continue;
                        };
                        if let Some((platform, url)) = normalize_profile_url(raw) {
                            out.push(
                                Candidate::new(
                                    url,
                                    Evidence::new(EvidenceSource::StructuredData, format!("{locator}/sameAs"), raw),
                                )
                                .labelled(platform),
                            );
                        }
                    }
                }
                out
            })
            .when(|page| !page.structured_data.is_empty()),
            Strategy::new("links", |page, config| {
                let owned;
                let links = if config.social_fallback_count == page.social_fallback_count {
                    &page.social
                } else {
                    owned = social_with_fallback(page, config.social_fallback_count);
                    &owned
                };
                links
                    .iter()
                    .filter_map(|link| {
                        let (platform, url) = normalize_profile_url(&link.url)?;
                        let source = if link.high_confidence {
                            EvidenceSource::Markup
                        } else {
                            EvidenceSource::Heuristic
                        };
                        Some(
                            Candidate::new(url, Evidence::new(source, &link.locator, &link.url))
                                .labelled(platform),
                        )
                    })
                    .collect()
            })
            .fill_label_gaps(),
        ],
    )
}

impl Extractor for ContactsExtractor {
    fn category_id(&self) -> &'static str {
        CONTACTS
    }

    fn chains(&self) -> Vec<FieldChain> {
        vec![
            phone_chain(),
            email_chain(),
            address_chain(),
            hours_chain(),
            social_chain(),
        ]
    }
}
