use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, info};

use super::labels::format_title;
use super::types::{Component, Slot};
use crate::api::{CatalogSource, CategoryInfo};
use crate::error::Result;

/// Session cache of fetched components, keyed by category.
///
/// Categories are fetched on first access and kept for the rest of the session.
/// Components are shared as `Arc` so the build and wizard can hold them without
/// copying attribute bags.
#[derive(Debug, Default, Clone)]
pub struct ComponentRegistry {
    categories: BTreeMap<Slot, Vec<Arc<Component>>>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache a category's component list, replacing any previous list.
    ///
    /// Components filed under another category are re-tagged to `slot`.
    pub fn insert_category(&mut self, slot: Slot, components: Vec<Component>) -> &[Arc<Component>] {
        let list: Vec<Arc<Component>> = components
            .into_iter()
            .map(|mut c| {
                c.category = slot;
                Arc::new(c)
            })
            .collect();
        debug!("Cached {} components for {}", list.len(), slot);
        self.categories.insert(slot, list);
        self.categories.get(&slot).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_cached(&self, slot: Slot) -> bool {
        self.categories.contains_key(&slot)
    }

    /// Cached components of a category (empty if never fetched).
    pub fn category(&self, slot: Slot) -> &[Arc<Component>] {
        self.categories.get(&slot).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get(&self, slot: Slot, pid: &str) -> Option<Arc<Component>> {
        self.category(slot).iter().find(|c| c.pid == pid).cloned()
    }

    /// Make sure a category is cached, fetching it from `source` on a miss.
    pub async fn ensure_category(
        &mut self,
        source: &dyn CatalogSource,
        slot: Slot,
    ) -> Result<&[Arc<Component>]> {
        if self.is_cached(slot) {
            debug!("Cache hit for {}", slot);
            return Ok(self.category(slot));
        }

        info!("Fetching category {}", slot);
        let components = source.list_components(slot).await?;
        Ok(self.insert_category(slot, components))
    }

    /// Replace the whole cache with an imported catalog.
    pub fn load_catalog(&mut self, catalog: BTreeMap<Slot, Vec<Component>>) {
        self.categories.clear();
        for (slot, components) in catalog {
            self.insert_category(slot, components);
        }
        info!(
            "Loaded catalog with {} categories ({} components)",
            self.categories.len(),
            self.component_count()
        );
    }

    pub fn component_count(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn cached_slots(&self) -> impl Iterator<Item = Slot> + '_ {
        self.categories.keys().copied()
    }

    /// Category summaries of the cached data, in slot priority order.
    pub fn category_summaries(&self) -> Vec<CategoryInfo> {
        self.categories
            .iter()
            .map(|(slot, list)| CategoryInfo {
                slug: slot.slug().to_string(),
                name: format_title(slot.slug()),
                count: list.len(),
            })
            .collect()
    }
}
