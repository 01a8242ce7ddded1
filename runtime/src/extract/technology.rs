//! Technology line: CMS, frameworks, analytics, commerce, libraries, hosting.
//!
//! Detection is signature based. Each [`Signature`] lists lowercase
//! substrings looked for in the `generator` meta, script URLs and inline
//! script bodies, and markup attributes / stylesheet URLs.

use super::{Candidate, Extractor, FieldChain, Strategy};
use crate::catalog::TECHNOLOGY;
use crate::parser::ParsedPage;
use crate::types::{Evidence, EvidenceSource};

pub struct TechnologyExtractor;

pub const KINDS: &[&str] = &["CMS", "Framework", "Analytics", "Commerce", "Library", "Hosting"];

#[derive(Debug, Clone, Copy)]
pub struct Signature {
    pub name: &'static str,
    pub kind: &'static str,
    pub generator: &'static [&'static str],
    pub script_src: &'static [&'static str],
    pub script_inline: &'static [&'static str],
    pub markup: &'static [&'static str],
}

const fn sig(
    name: &'static str,
    kind: &'static str,
    generator: &'static [&'static str],
    script_src: &'static [&'static str],
    script_inline: &'static [&'static str],
    markup: &'static [&'static str],
) -> Signature {
    Signature {
        name,
        kind,
        generator,
        script_src,
        script_inline,
        markup,
    }
}

pub const SIGNATURES: &[Signature] = &[
    sig("WordPress", "CMS", &["wordpress"], &["/wp-content/", "/wp-includes/"], &[], &["/wp-content/", "wp-block-"]),
    sig("Squarespace", "CMS", &["squarespace"], &["squarespace.com", "sqspcdn.com"], &[], &["sqs-block"]),
    sig("Wix", "CMS", &["wix.com"], &["static.parastorage.com", "static.wixstatic.com"], &[], &["wixstatic.com"]),
    sig("Webflow", "CMS", &["webflow"], &["webflow.js", "assets.website-files.com"], &[], &["data-wf-page", "data-wf-site"]),
    sig("Drupal", "CMS", &["drupal"], &["/misc/drupal.js", "/core/misc/drupal"], &["drupalsettings"], &["/sites/default/files/"]),
    sig("Joomla", "CMS", &["joomla"], &["/media/jui/"], &[], &[]),
    sig("Ghost", "CMS", &["ghost"], &["/ghost/"], &[], &[]),
    sig("Next.js", "Framework", &["next.js"], &["/_next/"], &["__next_data__"], &["__next"]),
    sig("Nuxt", "Framework", &["nuxt"], &["/_nuxt/"], &["window.__nuxt__"], &["__nuxt"]),
    sig("Gatsby", "Framework", &["gatsby"], &[], &[], &["___gatsby"]),
    sig("React", "Framework", &[], &["react.production", "react-dom"], &["react.createelement"], &["data-reactroot"]),
    sig("Vue.js", "Framework", &[], &["vue.min.js", "vue.global", "vue.runtime"], &["new vue("], &["data-v-app"]),
    sig("Angular", "Framework", &[], &["angular.min.js", "@angular/"], &[], &["ng-version"]),
    sig("Google Analytics", "Analytics", &[], &["google-analytics.com", "googletagmanager.com/gtag/"], &["gtag('config'", "gtag(\"config\"", "ga('create'"], &[]),
    sig("Google Tag Manager", "Analytics", &[], &["googletagmanager.com/gtm.js"], &["gtm.start"], &["googletagmanager.com/ns.html"]),
    sig("Facebook Pixel", "Analytics", &[], &["connect.facebook.net"], &["fbq('init'", "fbq(\"init\""], &[]),
    sig("Hotjar", "Analytics", &[], &["static.hotjar.com"], &["_hjsettings"], &[]),
    sig("HubSpot", "Analytics", &[], &["js.hs-scripts.com", "js.hs-analytics.net"], &[], &[]),
    sig("Shopify", "Commerce", &["shopify"], &["cdn.shopify.com"], &["shopify.shop"], &["cdn.shopify.com"]),
    sig("WooCommerce", "Commerce", &["woocommerce"], &["/woocommerce/"], &[], &["woocommerce"]),
    sig("Stripe", "Commerce", &[], &["js.stripe.com"], &[], &[]),
    sig("jQuery", "Library", &[], &["jquery"], &[], &[]),
    sig("Bootstrap", "Library", &[], &["bootstrap.min.js", "bootstrap.bundle"], &[], &["bootstrap.min.css", "bootstrap.css"]),
    sig("Font Awesome", "Library", &[], &["fontawesome", "font-awesome"], &[], &["fontawesome", "font-awesome"]),
    sig("Google Fonts", "Library", &[], &[], &[], &["fonts.googleapis.com"]),
    sig("Cloudflare", "Hosting", &[], &["/cdn-cgi/"], &[], &["/cdn-cgi/"]),
    sig("Netlify", "Hosting", &[], &["netlify"], &[], &[]),
    sig("Vercel", "Hosting", &[], &["/_vercel/"], &[], &[]),
];

fn first_match<'a>(haystack: &str, needles: &'a [&'a str]) -> Option<&'a str> {
    needles.iter().copied().find(|n| haystack.contains(n))
}

fn for_kind(kind: &'static str) -> impl Iterator<Item = &'static Signature> {
    SIGNATURES.iter().filter(move |s| s.kind == kind)
}

fn from_generator(page: &ParsedPage, kind: &'static str) -> Vec<Candidate> {
    let Some(entry) = page.meta.get("generator") else {
        return Vec::new();
    };
    let generator = entry.content.to_lowercase();
    for_kind(kind)
        .filter(|s| first_match(&generator, s.generator).is_some())
        .map(|s| {
            Candidate::new(s.name, Evidence::new(EvidenceSource::Metadata, &entry.locator, &entry.content))
                .labelled(kind)
        })
        .collect()
}

fn from_scripts(page: &ParsedPage, kind: &'static str) -> Vec<Candidate> {
    let mut out = Vec::new();
    for signature in for_kind(kind) {
        for script in &page.scripts {
            let hit = match &script.src {
                Some(src) => first_match(&src.to_lowercase(), signature.script_src).map(|_| src.clone()),
                None => first_match(&script.body.to_lowercase(), signature.script_inline).map(|n| n.to_string()),
            };
            if let Some(raw) = hit {
                out.push(
                    Candidate::new(
                        signature.name,
                        Evidence::new(EvidenceSource::ScriptSignature, &script.locator, raw),
                    )
                    .labelled(kind),
                );
                break;
            }
        }
    }
    out
}

fn from_markup(page: &ParsedPage, kind: &'static str) -> Vec<Candidate> {
    for_kind(kind)
        .filter_map(|signature| {
            page.attribute_index.iter().find_map(|(locator, text)| {
                let needle = first_match(text, signature.markup)?;
                Some(
                    Candidate::new(
                        signature.name,
                        Evidence::new(EvidenceSource::Markup, locator, needle),
                    )
                    .labelled(kind),
                )
            })
        })
        .collect()
}

fn kind_chain(kind: &'static str) -> FieldChain {
    FieldChain::new(
        kind,
        vec![
            Strategy::new("generator", move |page, _| from_generator(page, kind))
                .when(|page| page.meta.contains_key("generator")),
            Strategy::new("scripts", move |page, _| from_scripts(page, kind))
                .when(|page| !page.scripts.is_empty()),
            Strategy::new("markup", move |page, _| from_markup(page, kind)),
        ],
    )
}

impl Extractor for TechnologyExtractor {
    fn category_id(&self) -> &'static str {
        TECHNOLOGY
    }

    fn chains(&self) -> Vec<FieldChain> {
        KINDS.iter().map(|&kind| kind_chain(kind)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::parser::parse;
    use crate::types::DataPoint;

    fn extract(html: &str) -> Vec<DataPoint> {
        let page = parse(html, "https://acme.test/");
        TechnologyExtractor.extract(&page, &ScanConfig::default())
    }

    fn find<'a>(points: &'a [DataPoint], value: &str) -> Option<&'a DataPoint> {
        points.iter().find(|p| p.value == value)
    }

    #[test]
    fn test_signature_kinds_are_known() {
        assert!(SIGNATURES.iter().all(|s| KINDS.contains(&s.kind)));
        assert!(SIGNATURES.iter().all(|s| {
            s.generator
                .iter()
                .chain(s.script_src)
                .chain(s.script_inline)
                .chain(s.markup)
                .all(|n| n.to_lowercase() == *n)
        }));
    }

    #[test]
    fn test_wordpress_generator_corroborated_by_scripts() {
        let points = extract(
            r#"<html><head>
            <meta name="generator" content="WordPress 6.5">
            <script src="/wp-includes/js/jquery/jquery.min.js"></script>
            <script src="https://www.googletagmanager.com/gtag/js?id=G-1"></script>
            <script>window.dataLayer=[];gtag('config','G-1');</script>
            </head><body><div class="wp-block-group">x</div></body></html>"#,
        );
        let wp = find(&points, "WordPress").unwrap();
        assert_eq!(wp.label, "CMS");
        assert_eq!(wp.evidence.len(), 3);
        assert_eq!(wp.evidence[0].source, EvidenceSource::Metadata);
        assert_eq!(find(&points, "jQuery").unwrap().label, "Library");
        let ga = find(&points, "Google Analytics").unwrap();
        assert_eq!(ga.label, "Analytics");
        assert_eq!(ga.evidence[0].source, EvidenceSource::ScriptSignature);
    }

    #[test]
    fn test_markup_only_signatures() {
        let points = extract(
            r#"<html><head><link rel="stylesheet" href="https://fonts.googleapis.com/css?family=Inter"></head>
            <body><div id="__next" data-reactroot="">hi</div></body></html>"#,
        );
        assert_eq!(find(&points, "Google Fonts").unwrap().evidence[0].source, EvidenceSource::Markup);
        assert!(find(&points, "Next.js").is_some());
        assert!(find(&points, "React").is_some());
    }

    #[test]
    fn test_plain_page_has_no_technology() {
        assert!(extract("<p>Hello</p>").is_empty());
    }
}
