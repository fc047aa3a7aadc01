//! Public site content: everything the brand page renders, read fresh on
//! every request.
//!
//! ERROR HANDLING
//! ==============
//! The public page must render even when the backend hiccups. Each resource
//! is read independently; a failed read is logged and replaced by that
//! resource's built-in content, so one bad table never blanks the page.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::records::{Feature, GalleryItem, NavLink, PricingTier, ProtocolStep, SiteSettings};
use crate::store::ordered::sort_by_order;
use crate::store::{Backend, OrderedRecord, OrderedRecordStore, OrderedResource, ReorderRetry, SettingsStore};

/// Payload of `GET /api/content`.
#[derive(Debug, Clone, Serialize)]
pub struct SiteContent {
    pub settings: SiteSettings,
    pub nav_links: Vec<OrderedRecord<NavLink>>,
    pub features: Vec<OrderedRecord<Feature>>,
    pub protocol_steps: Vec<OrderedRecord<ProtocolStep>>,
    pub gallery_items: Vec<OrderedRecord<GalleryItem>>,
    pub pricing_tiers: Vec<OrderedRecord<PricingTier>>,
}

fn builtin_list<T: OrderedResource>() -> Vec<OrderedRecord<T>> {
    let mut records = T::defaults();
    sort_by_order(&mut records);
    records
}

async fn list_or_builtin<T: OrderedResource>(backend: &Arc<dyn Backend>) -> Vec<OrderedRecord<T>> {
    let store = OrderedRecordStore::<T>::new(Some(Arc::clone(backend)), ReorderRetry::default());
    match store.try_list().await {
        Ok(records) => records,
        Err(e) => {
            warn!(error = %e, resource = T::SLUG, "content read failed; serving built-in content");
            builtin_list()
        }
    }
}

async fn settings_or_builtin(backend: &Arc<dyn Backend>) -> SiteSettings {
    let mut store = SettingsStore::new(Some(Arc::clone(backend)));
    match store.load().await {
        Ok(Some(record)) => record.settings,
        Ok(None) => SiteSettings::builtin(),
        Err(e) => {
            warn!(error = %e, "settings read failed; serving built-in settings");
            SiteSettings::builtin()
        }
    }
}

/// Load the full page content. Never fails: without a backend, or for any
/// resource whose read fails, the built-in content is used.
pub async fn load_site_content(backend: Option<&Arc<dyn Backend>>) -> SiteContent {
    let Some(backend) = backend else {
        return builtin_site_content();
    };

    let (settings, nav_links, features, protocol_steps, gallery_items, pricing_tiers) = tokio::join!(
        settings_or_builtin(backend),
        list_or_builtin::<NavLink>(backend),
        list_or_builtin::<Feature>(backend),
        list_or_builtin::<ProtocolStep>(backend),
        list_or_builtin::<GalleryItem>(backend),
        list_or_builtin::<PricingTier>(backend),
    );

    SiteContent { settings, nav_links, features, protocol_steps, gallery_items, pricing_tiers }
}

/// The page as shown with no backend configured.
#[must_use]
pub fn builtin_site_content() -> SiteContent {
    SiteContent {
        settings: SiteSettings::builtin(),
        nav_links: builtin_list(),
        features: builtin_list(),
        protocol_steps: builtin_list(),
        gallery_items: builtin_list(),
        pricing_tiers: builtin_list(),
    }
}

#[cfg(test)]
#[path = "content_test.rs"]
mod tests;
