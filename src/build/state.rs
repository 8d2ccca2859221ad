use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::view::{BuildView, PartView};
use crate::api::CatalogSource;
use crate::catalog::{Component, ComponentRegistry, Slot};
use crate::error::Result;

/// Derived totals over the filled slots.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BuildAggregates {
    pub total_weight_g: f64,
    pub total_cost: f64,
    pub filled_count: usize,
}

/// A saved relation that could not be restored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DroppedRelation {
    pub slot: String,
    pub pid: String,
}

/// Outcome of re-resolving a saved slot map against the catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RehydrateReport {
    pub restored: usize,
    pub dropped: Vec<DroppedRelation>,
}

/// The in-progress build: at most one component per slot.
#[derive(Debug, Clone, Default)]
pub struct BuildState {
    slots: BTreeMap<Slot, Arc<Component>>,
}

impl BuildState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: Slot) -> Option<&Arc<Component>> {
        self.slots.get(&slot)
    }

    pub fn is_filled(&self, slot: Slot) -> bool {
        self.slots.contains_key(&slot)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn filled_count(&self) -> usize {
        self.slots.len()
    }

    /// Filled slots in priority order.
    pub fn iter(&self) -> impl Iterator<Item = (Slot, &Arc<Component>)> {
        self.slots.iter().map(|(slot, c)| (*slot, c))
    }

    /// Put a component into a slot, returning whatever it replaced.
    ///
    /// Always overwrites; asking the user before replacing is the caller's job.
    pub fn set_slot(&mut self, slot: Slot, component: Arc<Component>) -> Option<Arc<Component>> {
        self.slots.insert(slot, component)
    }

    pub fn clear_slot(&mut self, slot: Slot) -> Option<Arc<Component>> {
        self.slots.remove(&slot)
    }

    pub fn clear_all(&mut self) {
        self.slots.clear();
    }

    /// Totals over filled slots. Parts without a parseable weight or price are
    /// left out of that sum but still counted as filled.
    pub fn aggregates(&self) -> BuildAggregates {
        let total_weight_g = self.slots.values().filter_map(|c| c.weight_g()).sum();
        let total_cost = self.slots.values().filter_map(|c| c.price()).sum();
        BuildAggregates {
            total_weight_g,
            total_cost,
            filled_count: self.slots.len(),
        }
    }

    /// Slot -> component id map, as stored in a saved build.
    pub fn serialize(&self) -> BTreeMap<Slot, String> {
        self.slots
            .iter()
            .map(|(slot, c)| (*slot, c.pid.clone()))
            .collect()
    }

    /// Rebuild from a saved slot map using only what the registry has cached.
    ///
    /// Each slot is restored once. When an alias (`"frame"`) and the canonical
    /// slug (`"frames"`) both name a slot, the canonical key wins and the alias
    /// is reported as dropped.
    pub fn from_registry(
        relations: &BTreeMap<String, String>,
        registry: &ComponentRegistry,
    ) -> (BuildState, RehydrateReport) {
        let mut build = BuildState::new();
        let mut report = RehydrateReport::default();

        let mut entries: Vec<(&String, &String)> = relations.iter().collect();
        entries.sort_by_key(|(slug, _)| {
            Slot::from_slug(slug).map_or(true, |slot| slot.slug() != slug.as_str())
        });

        for (slug, pid) in entries {
            let resolved = Slot::from_slug(slug)
                .and_then(|slot| registry.get(slot, pid).map(|c| (slot, c)));
            match resolved {
                Some((slot, _)) if build.is_filled(slot) => {
                    warn!("Dropping saved slot {} -> {}: {} already restored", slug, pid, slot);
                    report.dropped.push(DroppedRelation {
                        slot: slug.clone(),
                        pid: pid.clone(),
                    });
                }
                Some((slot, component)) => {
                    build.set_slot(slot, component);
                    report.restored += 1;
                }
                None => {
                    warn!("Dropping saved slot {} -> {}: no longer in the catalog", slug, pid);
                    report.dropped.push(DroppedRelation {
                        slot: slug.clone(),
                        pid: pid.clone(),
                    });
                }
            }
        }

        (build, report)
    }

    /// Rebuild from a saved slot map, fetching any category not yet cached.
    ///
    /// Ids that no longer resolve are dropped and reported. A failed category
    /// fetch is returned as an error.
    pub async fn rehydrate(
        relations: &BTreeMap<String, String>,
        registry: &mut ComponentRegistry,
        source: &dyn CatalogSource,
    ) -> Result<(BuildState, RehydrateReport)> {
        for slug in relations.keys() {
            if let Some(slot) = Slot::from_slug(slug) {
                registry.ensure_category(source, slot).await?;
            }
        }

        let (build, report) = Self::from_registry(relations, registry);
        info!(
            "Rehydrated build: {} restored, {} dropped",
            report.restored,
            report.dropped.len()
        );
        Ok((build, report))
    }

    pub fn view(&self) -> BuildView<'_> {
        BuildView::new(self)
    }

    pub fn effective_flight_controller(&self) -> Option<PartView<'_>> {
        self.view().effective_flight_controller()
    }

    pub fn effective_esc(&self) -> Option<PartView<'_>> {
        self.view().effective_esc()
    }
}

/// Builds are equal when the same component ids fill the same slots.
impl PartialEq for BuildState {
    fn eq(&self, other: &Self) -> bool {
        self.serialize() == other.serialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn component(pid: &str, category: &str, extra: serde_json::Value) -> Component {
        let mut record = json!({ "pid": pid, "category": category, "name": pid });
        if let (serde_json::Value::Object(base), serde_json::Value::Object(more)) = (&mut record, extra) {
            base.extend(more);
        }
        serde_json::from_value(record).unwrap()
    }

    #[test]
    fn test_set_slot_overwrites_and_returns_previous() {
        let mut build = BuildState::new();
        assert!(build.set_slot(Slot::Motors, Arc::new(component("M1", "motors", json!({})))).is_none());
        let previous = build.set_slot(Slot::Motors, Arc::new(component("M2", "motors", json!({}))));
        assert_eq!(previous.map(|c| c.pid.clone()), Some("M1".to_string()));
        assert_eq!(build.get(Slot::Motors).map(|c| c.pid.as_str()), Some("M2"));
        assert_eq!(build.filled_count(), 1);
    }

    #[test]
    fn test_aggregates_skip_missing_values() {
        let mut build = BuildState::new();
        build.set_slot(
            Slot::Frames,
            Arc::new(component("F1", "frames", json!({ "approx_price": "$1,099.50", "schema_data": { "weight_g": 120.5 } }))),
        );
        build.set_slot(
            Slot::Motors,
            Arc::new(component("M1", "motors", json!({ "approx_price": "TBD", "schema_data": { "weight_g": "32g" } }))),
        );
        build.set_slot(Slot::Batteries, Arc::new(component("B1", "batteries", json!({}))));

        let totals = build.aggregates();
        assert!((totals.total_weight_g - 152.5).abs() < 1e-9, "Got {}", totals.total_weight_g);
        assert!((totals.total_cost - 1099.5).abs() < 1e-9, "Got {}", totals.total_cost);
        assert_eq!(totals.filled_count, 3);
    }

    #[test]
    fn test_serialize_and_restore_from_registry() {
        let mut registry = ComponentRegistry::new();
        registry.insert_category(Slot::Frames, vec![component("F1", "frames", json!({}))]);
        registry.insert_category(Slot::Motors, vec![component("M1", "motors", json!({}))]);

        let mut build = BuildState::new();
        build.set_slot(Slot::Frames, registry.get(Slot::Frames, "F1").unwrap());
        build.set_slot(Slot::Motors, registry.get(Slot::Motors, "M1").unwrap());

        let relations: BTreeMap<String, String> = build
            .serialize()
            .into_iter()
            .map(|(slot, pid)| (slot.slug().to_string(), pid))
            .collect();
        let (restored, report) = BuildState::from_registry(&relations, &registry);

        assert_eq!(restored, build);
        assert_eq!(report.restored, 2);
        assert!(report.dropped.is_empty());
    }

    #[test]
    fn test_unresolvable_ids_are_dropped() {
        let mut registry = ComponentRegistry::new();
        registry.insert_category(Slot::Frames, vec![component("F1", "frames", json!({}))]);

        let relations = BTreeMap::from([
            ("frames".to_string(), "F1".to_string()),
            ("motors".to_string(), "M-GONE".to_string()),
            ("gimbals".to_string(), "G1".to_string()),
        ]);
        let (build, report) = BuildState::from_registry(&relations, &registry);

        assert_eq!(build.filled_count(), 1);
        assert_eq!(report.dropped.len(), 2);
        assert!(report.dropped.iter().any(|d| d.pid == "M-GONE"));
    }

    #[test]
    fn test_alias_and_canonical_keys_restore_one_slot() {
        let mut registry = ComponentRegistry::new();
        registry.insert_category(
            Slot::Frames,
            vec![
                component("F1", "frames", json!({})),
                component("F2", "frames", json!({})),
            ],
        );

        let relations = BTreeMap::from([
            ("frame".to_string(), "F1".to_string()),
            ("frames".to_string(), "F2".to_string()),
        ]);
        let (build, report) = BuildState::from_registry(&relations, &registry);

        assert_eq!(build.get(Slot::Frames).map(|c| c.pid.as_str()), Some("F2"));
        assert_eq!(report.restored, 1);
        assert_eq!(
            report.dropped,
            vec![DroppedRelation {
                slot: "frame".to_string(),
                pid: "F1".to_string(),
            }]
        );
    }

    #[test]
    fn test_effective_parts_prefer_standalone() {
        let stack = component(
            "S1",
            "stacks",
            json!({ "schema_data": { "fc": { "mounting_pattern_mm": 20 }, "esc": { "battery_connector": "XT60" } } }),
        );
        let mut build = BuildState::new();
        build.set_slot(Slot::Stacks, Arc::new(stack));

        let fc = build.effective_flight_controller().expect("Stack supplies the FC");
        assert_eq!(fc.source, Slot::Stacks);
        assert!(build.effective_esc().is_some());

        build.set_slot(Slot::FlightControllers, Arc::new(component("FC1", "flight_controllers", json!({}))));
        let fc = build.effective_flight_controller().unwrap();
        assert_eq!(fc.source, Slot::FlightControllers);
        assert_eq!(fc.name, "FC1");
    }
}
