//! One user's configurator session.
//!
//! Owns the component cache, the build, the wizard and the evaluator, and
//! keeps track of which category is on screen so that late category fetches
//! can be told apart from current ones.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api::{BuildStore, CatalogSource};
use crate::build::{BuildAggregates, BuildState, RehydrateReport, SavedBuild};
use crate::catalog::{parse_catalog, Component, ComponentQuery, ComponentRegistry, Slot};
use crate::error::{DroneClearError, Result};
use crate::rules::{Evaluator, Warning};
use crate::wizard::{
    CandidatePartition, ClassFilter, StartOutcome, Transition, Wizard, WizardStep, WizardSummary,
};

/// Result of offering a component to the build.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AddOutcome {
    /// The slot now holds the component.
    Added {
        replaced: Option<Arc<Component>>,
        /// Set when the wizard moved on as a result.
        wizard: Option<Transition>,
    },
    /// The slot holds a different part; ask before replacing it.
    NeedsConfirmation { current: Arc<Component> },
    /// The same part already fills the slot.
    AlreadyInBuild,
}

/// Result of a category fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum CategoryOutcome {
    /// The category is on screen with this many components.
    Displayed(usize),
    /// Another category was selected while this one loaded.
    Stale,
    /// The fetch failed. Nothing else changed.
    Failed(String),
}

#[derive(Debug)]
pub struct Session {
    registry: ComponentRegistry,
    build: BuildState,
    wizard: Wizard,
    evaluator: Evaluator,
    displayed: Option<Slot>,
}

impl Session {
    pub fn new(steps: Vec<WizardStep>) -> Self {
        Self::with_evaluator(steps, Evaluator::new())
    }

    pub fn with_evaluator(steps: Vec<WizardStep>, evaluator: Evaluator) -> Self {
        Self {
            registry: ComponentRegistry::new(),
            build: BuildState::new(),
            wizard: Wizard::new(steps),
            evaluator,
            displayed: None,
        }
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn build(&self) -> &BuildState {
        &self.build
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn displayed_category(&self) -> Option<Slot> {
        self.displayed
    }

    // =========================================================================
    // CATEGORY DISPLAY
    // =========================================================================

    /// Mark `slot` as the category on screen. Later selections win.
    pub fn begin_category(&mut self, slot: Slot) {
        debug!("Displaying category {}", slot);
        self.displayed = Some(slot);
    }

    /// Apply the result of a category fetch started with `begin_category`.
    ///
    /// Successful results are always cached, but only shown when `slot` is
    /// still the displayed category.
    pub fn complete_category(&mut self, slot: Slot, result: Result<Vec<Component>>) -> CategoryOutcome {
        let current = self.displayed == Some(slot);
        match result {
            Ok(components) => {
                let count = self.registry.insert_category(slot, components).len();
                if current {
                    CategoryOutcome::Displayed(count)
                } else {
                    debug!("Discarding stale result for {}", slot);
                    CategoryOutcome::Stale
                }
            }
            Err(e) if current => {
                warn!("Failed to load {}: {}", slot, e);
                CategoryOutcome::Failed(e.to_string())
            }
            Err(e) => {
                debug!("Ignoring failed stale fetch for {}: {}", slot, e);
                CategoryOutcome::Stale
            }
        }
    }

    /// Select a category and fetch it unless it is already cached.
    pub async fn show_category(&mut self, source: &dyn CatalogSource, slot: Slot) -> CategoryOutcome {
        self.begin_category(slot);
        if self.registry.is_cached(slot) {
            return CategoryOutcome::Displayed(self.registry.category(slot).len());
        }
        let result = source.list_components(slot).await;
        self.complete_category(slot, result)
    }

    /// The displayed category after search, filters and sort.
    pub fn displayed_components(&self, query: &ComponentQuery) -> Vec<Arc<Component>> {
        match self.displayed {
            Some(slot) => query.apply(self.registry.category(slot)),
            None => Vec::new(),
        }
    }

    // =========================================================================
    // BUILD EDITING
    // =========================================================================

    /// Put a component into its category's slot.
    ///
    /// Replacing a different part needs `confirmed`. While the wizard is on a
    /// step, adding a part of that step's category moves it to the next step.
    pub fn add_to_build(&mut self, component: Arc<Component>, confirmed: bool) -> AddOutcome {
        let slot = component.category;
        if let Some(current) = self.build.get(slot) {
            if current.pid == component.pid {
                return AddOutcome::AlreadyInBuild;
            }
            if !confirmed {
                return AddOutcome::NeedsConfirmation {
                    current: Arc::clone(current),
                };
            }
        }

        info!("Adding {} to {}", component.pid, slot);
        let replaced = self.build.set_slot(slot, component);
        let on_step = self.wizard.current_step().map(|s| s.category) == Some(slot);
        let wizard = if on_step {
            self.wizard.advance(&self.build).ok()
        } else {
            None
        };
        AddOutcome::Added { replaced, wizard }
    }

    pub fn remove_from_build(&mut self, slot: Slot) -> Option<Arc<Component>> {
        self.build.clear_slot(slot)
    }

    pub fn clear_build(&mut self) {
        self.build.clear_all();
    }

    pub fn warnings(&self) -> Vec<Warning> {
        self.evaluator.evaluate(&self.build)
    }

    pub fn aggregates(&self) -> BuildAggregates {
        self.build.aggregates()
    }

    // =========================================================================
    // WIZARD
    // =========================================================================

    pub fn start_wizard(&mut self, confirmed: bool) -> StartOutcome {
        self.wizard.start(&mut self.build, confirmed)
    }

    pub fn choose_class(&mut self, filter: ClassFilter) -> Result<Transition> {
        self.wizard.choose_class(filter, &self.build)
    }

    pub fn wizard_advance(&mut self) -> Result<Transition> {
        self.wizard.advance(&self.build)
    }

    pub fn wizard_skip(&mut self) -> Result<Transition> {
        self.wizard.skip(&self.build)
    }

    pub fn wizard_exit(&mut self, completed: bool) -> WizardSummary {
        self.wizard.exit(completed, &self.build)
    }

    /// Category of the active wizard step, for fetching before partitioning.
    pub fn wizard_category(&self) -> Option<Slot> {
        self.wizard.current_step().map(|step| step.category)
    }

    /// Cached candidates for the current step, narrowed by `query` and then
    /// bucketed against the build.
    pub fn wizard_candidates(&self, query: &ComponentQuery) -> Option<CandidatePartition> {
        let slot = self.wizard_category()?;
        let components = query.apply(self.registry.category(slot));
        self.wizard
            .candidate_partition(&self.build, &components, &self.evaluator)
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    pub async fn save_build(
        &self,
        store: &dyn BuildStore,
        name: &str,
        description: &str,
    ) -> Result<SavedBuild> {
        if name.trim().is_empty() {
            return Err(DroneClearError::InvalidInput(
                "A build name is required".to_string(),
            ));
        }
        if self.build.is_empty() {
            return Err(DroneClearError::InvalidInput(
                "Cannot save an empty build".to_string(),
            ));
        }

        let record = SavedBuild::from_build(name, description, &self.build);
        info!("Saving build {} ({} parts)", record.pid, record.relations.len());
        store.save_build(&record).await
    }

    /// Replace the build with a saved one. On any failure the current build
    /// is kept.
    pub async fn load_build(
        &mut self,
        store: &dyn BuildStore,
        source: &dyn CatalogSource,
        pid: &str,
    ) -> Result<RehydrateReport> {
        let saved = store.get_saved_build(pid).await?;
        let (build, report) =
            BuildState::rehydrate(&saved.relations, &mut self.registry, source).await?;

        if self.wizard.is_active() {
            self.wizard.exit(false, &build);
        }
        self.build = build;
        info!("Loaded build {} ({})", saved.pid, saved.name);
        Ok(report)
    }

    /// Replace the cached catalog with an imported one. Returns the number of
    /// components loaded. A rejected import leaves everything as it was.
    pub fn import_catalog(&mut self, json: &str) -> Result<usize> {
        let catalog = parse_catalog(json)?;
        self.registry.load_catalog(catalog);
        Ok(self.registry.component_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::wizard::WizardPhase;

    const CATALOG: &str = r#"{
        "frames": [
            { "pid": "FRM-1", "name": "Apex 5", "compatibility": { "prop_size_max_in": 5.1 } }
        ],
        "motors": [
            { "pid": "MTR-1", "name": "2207 1950KV", "compatibility": { "motor_mount_hole_spacing_mm": 16 } }
        ],
        "propellers": [
            { "pid": "PRP-1", "name": "Gemfan 51433", "compatibility": { "diameter_in": 5.1 } },
            { "pid": "PRP-2", "name": "HQ 6x4", "compatibility": { "diameter_in": 6 } }
        ]
    }"#;

    fn steps() -> Vec<WizardStep> {
        vec![
            WizardStep {
                category: Slot::Frames,
                name: "Frame".to_string(),
                prompt: "Pick a frame".to_string(),
                optional: false,
            },
            WizardStep {
                category: Slot::Propellers,
                name: "Props".to_string(),
                prompt: "Pick props".to_string(),
                optional: false,
            },
        ]
    }

    fn session() -> Session {
        let mut session = Session::new(steps());
        session.import_catalog(CATALOG).unwrap();
        session
    }

    fn cached(session: &Session, slot: Slot, pid: &str) -> Arc<Component> {
        session.registry().get(slot, pid).unwrap()
    }

    #[test]
    fn test_add_requires_confirmation_to_replace() {
        let mut session = session();
        let p1 = cached(&session, Slot::Propellers, "PRP-1");
        let p2 = cached(&session, Slot::Propellers, "PRP-2");

        assert!(matches!(session.add_to_build(Arc::clone(&p1), false), AddOutcome::Added { replaced: None, .. }));
        assert!(matches!(session.add_to_build(Arc::clone(&p1), false), AddOutcome::AlreadyInBuild));
        assert!(matches!(
            session.add_to_build(Arc::clone(&p2), false),
            AddOutcome::NeedsConfirmation { .. }
        ));
        assert_eq!(session.build().get(Slot::Propellers).map(|c| c.pid.as_str()), Some("PRP-1"));

        match session.add_to_build(p2, true) {
            AddOutcome::Added { replaced, .. } => {
                assert_eq!(replaced.map(|c| c.pid.clone()).as_deref(), Some("PRP-1"));
            }
            other => panic!("Expected Added, got {:?}", other),
        }
    }

    #[test]
    fn test_warnings_follow_build() {
        let mut session = session();
        session.add_to_build(cached(&session, Slot::Frames, "FRM-1"), false);
        session.add_to_build(cached(&session, Slot::Propellers, "PRP-2"), false);
        assert_eq!(session.warnings().len(), 1, "6in props on a 5in frame");

        session.remove_from_build(Slot::Propellers);
        assert!(session.warnings().is_empty());
        session.clear_build();
        assert_eq!(session.aggregates().filled_count, 0);
    }

    #[test]
    fn test_add_advances_active_wizard() {
        let mut session = session();
        assert_eq!(session.start_wizard(false), StartOutcome::Started);
        session.choose_class(ClassFilter::All).unwrap();
        assert_eq!(session.wizard_category(), Some(Slot::Frames));

        match session.add_to_build(cached(&session, Slot::Frames, "FRM-1"), false) {
            AddOutcome::Added { wizard: Some(t), .. } => assert_eq!(t.phase, WizardPhase::Step(1)),
            other => panic!("Expected wizard to advance, got {:?}", other),
        }

        let partition = session.wizard_candidates(&ComponentQuery::default()).unwrap();
        assert_eq!(partition.compatible.len(), 1);
        assert_eq!(partition.caution.len(), 1, "Prop size is soft by default");
    }

    #[test]
    fn test_add_outside_current_step_keeps_wizard_in_place() {
        let mut session = session();
        session.start_wizard(false);
        session.choose_class(ClassFilter::All).unwrap();

        match session.add_to_build(cached(&session, Slot::Motors, "MTR-1"), false) {
            AddOutcome::Added { wizard: None, .. } => {}
            other => panic!("Expected the wizard to stay put, got {:?}", other),
        }
        assert_eq!(session.wizard_category(), Some(Slot::Frames));
        assert_eq!(session.wizard().phase(), WizardPhase::Step(0));
        assert!(session.build().is_filled(Slot::Motors));
    }

    #[test]
    fn test_stale_category_result_is_not_displayed() {
        let mut session = Session::new(steps());
        session.begin_category(Slot::Frames);
        session.begin_category(Slot::Motors);

        let outcome = session.complete_category(Slot::Frames, Ok(Vec::new()));
        assert_eq!(outcome, CategoryOutcome::Stale);
        assert!(session.registry().is_cached(Slot::Frames), "Stale data is still cached");

        let outcome = session.complete_category(
            Slot::Motors,
            Err(DroneClearError::Network("connection refused".to_string())),
        );
        assert!(matches!(outcome, CategoryOutcome::Failed(_)));
        assert_eq!(session.displayed_category(), Some(Slot::Motors));
    }

    #[test]
    fn test_rejected_import_keeps_registry() {
        let mut session = session();
        let before = session.registry().component_count();
        assert!(session.import_catalog("[1, 2").is_err());
        assert!(session.import_catalog("[]").is_err());
        assert_eq!(session.registry().component_count(), before);
    }

    #[tokio::test]
    async fn test_show_category_fetches_once() {
        let source = StaticCatalog::from_json(CATALOG).unwrap();
        let mut session = Session::new(steps());

        let outcome = session.show_category(&source, Slot::Propellers).await;
        assert_eq!(outcome, CategoryOutcome::Displayed(2));
        let shown = session.displayed_components(&ComponentQuery::search("gemfan"));
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].pid, "PRP-1");
    }
}
