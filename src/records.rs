//! Record shapes for every content table, with their templates and the
//! built-in brand content.
//!
//! DESIGN
//! ======
//! Each payload type mirrors its table's editable columns and implements
//! `Resource` (and `OrderedResource` for list tables). The built-in content
//! is what the public page shows when no backend is configured; it is also
//! what `DATABASE_URL=memory://` seeds.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{Backend, BackendError, OrderedRecord, OrderedResource, Resource, Table, to_row};

const DEFAULT_HERO_IMAGE_URL: &str = "https://images.unsplash.com/photo-1617806118233-18e1de247200?w=1920&q=80";
const DEFAULT_TEXTURE_IMAGE_URL: &str = "https://images.unsplash.com/photo-1558618666-fcd25c85cd64?w=1920&q=60";

/// Stable ids for built-in records, so defaults round-trip through clients.
fn builtin_id(n: u128) -> Uuid {
    Uuid::from_u128(n)
}

fn builtin<T>(items: Vec<T>) -> Vec<OrderedRecord<T>> {
    items
        .into_iter()
        .zip(0_i32..)
        .map(|(payload, order_index)| OrderedRecord {
            id: builtin_id(u128::from(order_index.unsigned_abs()) + 1),
            order_index,
            payload,
        })
        .collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_owned()).collect()
}

// =============================================================================
// SITE SETTINGS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSettings {
    pub brand_name: String,
    pub tagline: String,
    pub hero_line_1: String,
    pub hero_line_2: String,
    pub hero_background_image_url: String,
    pub cta_text: String,
    pub philosophy_common: String,
    pub philosophy_differentiated: String,
    pub philosophy_keyword: String,
    pub philosophy_texture_url: String,
}

impl SiteSettings {
    /// All fields empty; the starting point for a first save.
    #[must_use]
    pub fn blank() -> Self {
        Self {
            brand_name: String::new(),
            tagline: String::new(),
            hero_line_1: String::new(),
            hero_line_2: String::new(),
            hero_background_image_url: String::new(),
            cta_text: String::new(),
            philosophy_common: String::new(),
            philosophy_differentiated: String::new(),
            philosophy_keyword: String::new(),
            philosophy_texture_url: String::new(),
        }
    }

    #[must_use]
    pub fn builtin() -> Self {
        Self {
            brand_name: "AURENIX".into(),
            tagline: "Precision-engineered cinematic interfaces for visionary brands.".into(),
            hero_line_1: "Craft meets".into(),
            hero_line_2: "precision.".into(),
            hero_background_image_url: DEFAULT_HERO_IMAGE_URL.into(),
            cta_text: "Access the Experience".into(),
            philosophy_common: "Most studios focus on: templated solutions and generic UX.".into(),
            philosophy_differentiated: "We focus on:".into(),
            philosophy_keyword: "precision-engineered cinematic interfaces.".into(),
            philosophy_texture_url: DEFAULT_TEXTURE_IMAGE_URL.into(),
        }
    }
}

impl Resource for SiteSettings {
    const TABLE: Table = Table {
        name: "site_settings",
        columns: &[
            "brand_name",
            "tagline",
            "hero_line_1",
            "hero_line_2",
            "hero_background_image_url",
            "cta_text",
            "philosophy_common",
            "philosophy_differentiated",
            "philosophy_keyword",
            "philosophy_texture_url",
        ],
        ordered: false,
        stamped: true,
    };
}

// =============================================================================
// NAV LINKS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavLink {
    pub label: String,
    pub href: String,
}

impl Resource for NavLink {
    const TABLE: Table = Table { name: "nav_links", columns: &["label", "href"], ordered: true, stamped: false };
}

impl OrderedResource for NavLink {
    const SLUG: &'static str = "nav";

    fn template(_len: usize) -> Option<Self> {
        Some(Self { label: "New Link".into(), href: "#".into() })
    }

    fn defaults() -> Vec<OrderedRecord<Self>> {
        builtin(
            [
                ("Features", "#features"),
                ("Philosophy", "#philosophy"),
                ("Protocol", "#protocol"),
                ("Gallery", "#gallery"),
                ("Pricing", "#pricing"),
            ]
            .into_iter()
            .map(|(label, href)| Self { label: label.into(), href: href.into() })
            .collect(),
        )
    }
}

// =============================================================================
// FEATURES
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub heading: String,
    pub descriptor: String,
    pub value_prop: String,
    pub sub_labels: Vec<String>,
}

impl Resource for Feature {
    const TABLE: Table = Table {
        name: "features",
        columns: &["heading", "descriptor", "value_prop", "sub_labels"],
        ordered: true,
        stamped: false,
    };
}

impl OrderedResource for Feature {
    const SLUG: &'static str = "features";

    fn template(_len: usize) -> Option<Self> {
        Some(Self {
            heading: "New Feature".into(),
            descriptor: "Description".into(),
            value_prop: "Label".into(),
            sub_labels: strings(&["A", "B", "C"]),
        })
    }

    fn defaults() -> Vec<OrderedRecord<Self>> {
        builtin(vec![
            Self {
                heading: "Ultra-Refined Visual Systems".into(),
                descriptor: "Design tokens and component libraries built for consistency at scale.".into(),
                value_prop: "Visual Systems".into(),
                sub_labels: strings(&["Typography", "Color Systems", "Spacing Grids"]),
            },
            Self {
                heading: "Cinematic Interaction Engineering".into(),
                descriptor: "Every scroll and transition weighted for narrative impact.".into(),
                value_prop: "Interaction".into(),
                sub_labels: strings(&["Scroll choreography", "Micro-interactions", "Motion design"]),
            },
            Self {
                heading: "Precision-Tuned Interface Architecture".into(),
                descriptor: "Modular, performant systems ready for complex workflows.".into(),
                value_prop: "Architecture".into(),
                sub_labels: strings(&["Component Library", "API Design", "Performance"]),
            },
        ])
    }
}

// =============================================================================
// PROTOCOL STEPS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolStep {
    pub step_number: i32,
    pub title: String,
    pub description: String,
}

impl Resource for ProtocolStep {
    const TABLE: Table = Table {
        name: "protocol_steps",
        columns: &["step_number", "title", "description"],
        ordered: true,
        stamped: false,
    };
}

impl OrderedResource for ProtocolStep {
    const SLUG: &'static str = "protocol";

    fn template(len: usize) -> Option<Self> {
        let step_number = i32::try_from(len).ok()?.checked_add(1)?;
        Some(Self { step_number, title: "New Step".into(), description: "Description".into() })
    }

    fn defaults() -> Vec<OrderedRecord<Self>> {
        builtin(vec![
            Self {
                step_number: 1,
                title: "Discovery & Strategy".into(),
                description: "We map your vision to technical requirements and define the experience architecture."
                    .into(),
            },
            Self {
                step_number: 2,
                title: "Design System Synthesis".into(),
                description:
                    "Visual identity and interaction patterns are crystallized into a reusable design language."
                        .into(),
            },
            Self {
                step_number: 3,
                title: "Precision Build & Delivery".into(),
                description:
                    "Engineering meets craft. Your digital instrument is shipped with documentation and support."
                        .into(),
            },
        ])
    }
}

// =============================================================================
// PRICING TIERS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTier {
    pub name: String,
    pub price: String,
    pub description: String,
    pub features: Vec<String>,
    pub highlighted: bool,
}

impl Resource for PricingTier {
    const TABLE: Table = Table {
        name: "pricing_tiers",
        columns: &["name", "price", "description", "features", "highlighted"],
        ordered: true,
        stamped: false,
    };
}

impl OrderedResource for PricingTier {
    const SLUG: &'static str = "pricing";

    fn template(_len: usize) -> Option<Self> {
        Some(Self {
            name: "New Tier".into(),
            price: "Custom".into(),
            description: "Description".into(),
            features: strings(&["Feature 1", "Feature 2"]),
            highlighted: false,
        })
    }

    fn defaults() -> Vec<OrderedRecord<Self>> {
        builtin(vec![
            Self {
                name: "Essential".into(),
                price: "Custom".into(),
                description: "For brands ready to elevate their digital presence.".into(),
                features: strings(&["Strategy workshop", "Design system", "Landing experience"]),
                highlighted: false,
            },
            Self {
                name: "Performance".into(),
                price: "Custom".into(),
                description: "Full cinematic experience with advanced interactions.".into(),
                features: strings(&[
                    "Everything in Essential",
                    "Multi-page experiences",
                    "CMS integration",
                    "Ongoing support",
                ]),
                highlighted: true,
            },
            Self {
                name: "Enterprise".into(),
                price: "Custom".into(),
                description: "Bespoke systems for the most demanding visionaries.".into(),
                features: strings(&[
                    "Everything in Performance",
                    "Custom integrations",
                    "Dedicated team",
                    "SLA & priority support",
                ]),
                highlighted: false,
            },
        ])
    }
}

// =============================================================================
// GALLERY
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    /// Classify an uploaded file by its content type.
    #[must_use]
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if ct.trim().to_ascii_lowercase().starts_with("video") => Self::Video,
            _ => Self::Image,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryItem {
    #[serde(default)]
    pub title: Option<String>,
    pub media_type: MediaType,
    pub media_url: String,
}

impl Resource for GalleryItem {
    const TABLE: Table = Table {
        name: "gallery_items",
        columns: &["title", "media_type", "media_url"],
        ordered: true,
        stamped: false,
    };

    fn normalize(&mut self) {
        self.media_url = self.media_url.trim().to_owned();
        self.title = self
            .title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
            .map(str::to_owned);
    }

    fn validate(&self) -> Result<(), String> {
        if self.media_url.is_empty() {
            return Err("gallery items need a media url".into());
        }
        Ok(())
    }
}

impl OrderedResource for GalleryItem {
    const SLUG: &'static str = "gallery";

    fn template(_len: usize) -> Option<Self> {
        None
    }

    fn defaults() -> Vec<OrderedRecord<Self>> {
        builtin(vec![
            Self { title: Some("Craft".into()), media_type: MediaType::Image, media_url: DEFAULT_HERO_IMAGE_URL.into() },
            Self {
                title: Some("Texture".into()),
                media_type: MediaType::Image,
                media_url: DEFAULT_TEXTURE_IMAGE_URL.into(),
            },
        ])
    }
}

// =============================================================================
// SEEDING
// =============================================================================

async fn seed_ordered<T: OrderedResource>(backend: &dyn Backend) -> Result<(), BackendError> {
    if backend.count(&T::TABLE).await? > 0 {
        return Ok(());
    }
    for record in T::defaults() {
        let row = to_row(&record).map_err(|e| BackendError::Rejected(e.to_string()))?;
        backend.insert(&T::TABLE, row).await?;
    }
    Ok(())
}

/// Write the built-in content into every empty table of `backend`.
///
/// # Errors
///
/// Returns the first backend error encountered.
pub async fn seed_builtin_content(backend: &dyn Backend) -> Result<(), BackendError> {
    if backend.count(&SiteSettings::TABLE).await? == 0 {
        let record = crate::store::SettingsRecord {
            id: Uuid::new_v4(),
            updated_at: None,
            settings: SiteSettings::builtin(),
        };
        let row = to_row(&record).map_err(|e| BackendError::Rejected(e.to_string()))?;
        backend.insert(&SiteSettings::TABLE, row).await?;
    }
    seed_ordered::<NavLink>(backend).await?;
    seed_ordered::<Feature>(backend).await?;
    seed_ordered::<ProtocolStep>(backend).await?;
    seed_ordered::<PricingTier>(backend).await?;
    seed_ordered::<GalleryItem>(backend).await?;
    Ok(())
}

#[cfg(test)]
#[path = "records_test.rs"]
mod tests;
