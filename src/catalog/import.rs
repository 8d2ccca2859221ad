//! Catalog import from the JSON export format.
//!
//! Accepts either `{"components": {slug: [...]}}` or a bare `{slug: [...]}`.
//! Entries may be flat (attributes next to `pid` / `name`) or carry a
//! `schema_data` object; both end up in the component's attribute bag.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{info, warn};

use super::labels::format_title;
use super::types::{format_price, Attributes, Component, Slot};
use crate::api::{CatalogSource, CategoryInfo};
use crate::error::{DroneClearError, Result};

/// Catalog keyed by category.
pub type Catalog = BTreeMap<Slot, Vec<Component>>;

/// Keys lifted into component columns instead of the attribute bag.
const CORE_FIELDS: &[&str] = &[
    "pid",
    "id",
    "name",
    "manufacturer",
    "description",
    "link",
    "approx_price",
    "_approx_price",
    "image_file",
    "manual_link",
    "category",
    "schema_data",
];

/// Parse catalog JSON text. Nothing is returned unless the whole document is valid.
pub fn parse_catalog(json: &str) -> Result<Catalog> {
    let value: Value = serde_json::from_str(json)
        .map_err(|e| DroneClearError::Import(format!("Invalid JSON: {}", e)))?;
    catalog_from_value(value)
}

/// Read and parse a catalog file.
pub fn load_catalog_file(path: &Path) -> Result<Catalog> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        DroneClearError::Import(format!("Failed to read {}: {}", path.display(), e))
    })?;
    let catalog = parse_catalog(&content)?;
    info!("Imported catalog from {}", path.display());
    Ok(catalog)
}

pub fn catalog_from_value(value: Value) -> Result<Catalog> {
    let Value::Object(mut root) = value else {
        return Err(DroneClearError::Import(
            "Catalog must be a JSON object".to_string(),
        ));
    };

    let categories = match root.remove("components") {
        Some(Value::Object(map)) => map,
        Some(_) => {
            return Err(DroneClearError::Import(
                "\"components\" must be an object keyed by category".to_string(),
            ))
        }
        None => root,
    };

    let mut catalog = Catalog::new();
    let mut skipped = 0usize;

    for (slug, entries) in categories {
        let Value::Array(entries) = entries else {
            return Err(DroneClearError::Import(format!(
                "Category '{}' must be an array of components",
                slug
            )));
        };

        let Some(slot) = Slot::from_slug(&slug) else {
            warn!("Skipping unknown category '{}' ({} entries)", slug, entries.len());
            continue;
        };

        let list = catalog.entry(slot).or_default();
        for entry in entries {
            match component_from_entry(slot, entry)? {
                Some(component) => list.push(component),
                None => skipped += 1,
            }
        }
    }

    if skipped > 0 {
        warn!("Skipped {} catalog entries without a pid", skipped);
    }
    Ok(catalog)
}

fn component_from_entry(slot: Slot, entry: Value) -> Result<Option<Component>> {
    let Value::Object(mut fields) = entry else {
        return Err(DroneClearError::Import(format!(
            "Entries in '{}' must be objects",
            slot
        )));
    };

    let pid = match fields.get("pid").or_else(|| fields.get("id")) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Ok(None),
    };

    let text = |fields: &Map<String, Value>, key: &str| -> Option<String> {
        fields
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };

    let approx_price = ["approx_price", "_approx_price"]
        .iter()
        .find_map(|key| match fields.get(*key) {
            Some(Value::Number(n)) => n.as_f64().map(format_price),
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        });

    let name = text(&fields, "name").unwrap_or_else(|| "Unnamed".to_string());
    let manufacturer = text(&fields, "manufacturer").unwrap_or_else(|| "Unknown".to_string());
    let description = text(&fields, "description").unwrap_or_default();
    let link = text(&fields, "link");
    let image_file = text(&fields, "image_file");
    let manual_link = text(&fields, "manual_link");

    let mut attributes = match fields.remove("schema_data") {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    for (key, value) in fields {
        if !CORE_FIELDS.contains(&key.as_str()) {
            attributes.insert(key, value);
        }
    }

    Ok(Some(Component {
        pid,
        category: slot,
        name,
        manufacturer,
        description,
        approx_price,
        image_file,
        link,
        manual_link,
        attributes: Attributes::from_map(attributes),
    }))
}

// =============================================================================
// IN-MEMORY CATALOG SOURCE
// =============================================================================

/// A [`CatalogSource`] serving an imported catalog from memory.
#[derive(Debug, Default, Clone)]
pub struct StaticCatalog {
    catalog: Catalog,
}

impl StaticCatalog {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::new(parse_catalog(json)?))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self::new(load_catalog_file(path)?))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

#[async_trait]
impl CatalogSource for StaticCatalog {
    async fn list_categories(&self) -> Result<Vec<CategoryInfo>> {
        Ok(self
            .catalog
            .iter()
            .map(|(slot, list)| CategoryInfo {
                slug: slot.slug().to_string(),
                name: format_title(slot.slug()),
                count: list.len(),
            })
            .collect())
    }

    async fn list_components(&self, slot: Slot) -> Result<Vec<Component>> {
        Ok(self.catalog.get(&slot).cloned().unwrap_or_default())
    }
}
