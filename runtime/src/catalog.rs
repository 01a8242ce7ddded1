//! Category catalog: the fixed extractor lines, the thematic dictionaries
//! used by the dynamic pass, and their display colors.

use crate::types::ColorPair;
use serde::{Deserialize, Serialize};

pub const IDENTITY: &str = "identity";
pub const CONTACTS: &str = "contacts";
pub const SERVICES: &str = "services";
pub const TECHNOLOGY: &str = "technology";
pub const ENTITIES: &str = "entities";
pub const PAGES: &str = "pages";
pub const SCHEMA: &str = "schema";

/// Categories that survive every dynamic pass and are never reassigned from.
pub const CORE_CATEGORY_IDS: [&str; 2] = [IDENTITY, CONTACTS];

/// Backfill order when too few categories are proposed.
pub const FALLBACK_CATEGORY_IDS: [&str; 3] = [SERVICES, PAGES, TECHNOLOGY];

/// A category that may appear on the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDefinition {
    pub id: String,
    pub display_name: String,
    pub color_pair: ColorPair,
    /// Trigger words for thematic scoring; empty for fixed extractor lines.
    pub keywords: Vec<String>,
}

impl CategoryDefinition {
    fn new(id: &str, display_name: &str, light: &str, dark: &str, keywords: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            color_pair: ColorPair::new(light, dark),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    pub fn is_core(&self) -> bool {
        is_core(&self.id)
    }

    pub fn is_theme(&self) -> bool {
        !self.keywords.is_empty()
    }
}

pub fn is_core(category_id: &str) -> bool {
    CORE_CATEGORY_IDS.contains(&category_id)
}

/// The seven lines populated directly by extractors, in map order.
pub fn fixed_categories() -> Vec<CategoryDefinition> {
    vec![
        CategoryDefinition::new(IDENTITY, "Identity", "#e32017", "#ff5a4f", &[]),
        CategoryDefinition::new(CONTACTS, "Contacts", "#0098d4", "#4cc3f0", &[]),
        CategoryDefinition::new(SERVICES, "Services", "#00782a", "#3fbf6a", &[]),
        CategoryDefinition::new(TECHNOLOGY, "Technology", "#9b0056", "#e0569b", &[]),
        CategoryDefinition::new(ENTITIES, "People & Entities", "#f3a9bb", "#f7c6d2", &[]),
        CategoryDefinition::new(PAGES, "Pages", "#a0a5a9", "#c9ccce", &[]),
        CategoryDefinition::new(SCHEMA, "Schema", "#ffd300", "#ffe566", &[]),
    ]
}

/// Thematic dictionaries scored against the scanned text.
pub fn themes() -> Vec<CategoryDefinition> {
    vec![
        CategoryDefinition::new(
            "commerce",
            "Shop & Commerce",
            "#ee7c0e",
            "#ffa552",
            &["shop", "store", "cart", "checkout", "product", "products", "price", "sale", "order", "shipping", "buy", "retail"],
        ),
        CategoryDefinition::new(
            "hospitality",
            "Food & Hospitality",
            "#b36305",
            "#e39a4a",
            &["restaurant", "menu", "dining", "cafe", "coffee", "bar", "reservation", "reservations", "hotel", "catering", "breakfast", "dinner"],
        ),
        CategoryDefinition::new(
            "health",
            "Health & Care",
            "#00a4a7",
            "#4fd4d6",
            &["health", "clinic", "dental", "dentist", "medical", "doctor", "patient", "patients", "therapy", "care", "wellness", "treatment"],
        ),
        CategoryDefinition::new(
            "legal",
            "Legal & Advisory",
            "#003688",
            "#4d7fd1",
            &["law", "legal", "attorney", "attorneys", "lawyer", "litigation", "counsel", "injury", "estate planning", "immigration"],
        ),
        CategoryDefinition::new(
            "home-services",
            "Home Services",
            "#84b817",
            "#b0dc4f",
            &["plumbing", "plumber", "repair", "installation", "hvac", "heating", "cooling", "roofing", "electrical", "cleaning", "landscaping", "remodeling"],
        ),
        CategoryDefinition::new(
            "finance",
            "Finance",
            "#6950a1",
            "#9b86cf",
            &["finance", "financial", "bank", "banking", "loan", "loans", "mortgage", "insurance", "investment", "accounting", "tax", "credit"],
        ),
        CategoryDefinition::new(
            "education",
            "Education",
            "#95cdba",
            "#bfe5d8",
            &["school", "course", "courses", "training", "class", "classes", "learning", "students", "tutoring", "academy", "education", "workshop"],
        ),
        CategoryDefinition::new(
            "real-estate",
            "Real Estate",
            "#7156a5",
            "#a48fd1",
            &["real estate", "property", "properties", "homes", "listing", "listings", "rent", "rental", "apartment", "realtor", "lease", "mortgage"],
        ),
        CategoryDefinition::new(
            "software",
            "Software & Digital",
            "#0019a8",
            "#5a6ee0",
            &["software", "platform", "app", "api", "cloud", "saas", "integration", "integrations", "developer", "developers", "analytics", "automation"],
        ),
        CategoryDefinition::new(
            "events",
            "Events & Media",
            "#d799af",
            "#ecc2d2",
            &["event", "events", "tickets", "concert", "festival", "conference", "wedding", "photography", "video", "podcast", "news", "blog"],
        ),
    ]
}

/// Look up a fixed category or theme by id.
pub fn definition(id: &str) -> Option<CategoryDefinition> {
    fixed_categories()
        .into_iter()
        .chain(themes())
        .find(|d| d.id == id)
}
