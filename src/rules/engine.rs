//! Rule evaluation over a build.
//!
//! The `Evaluator` runs the enabled checks, in canonical order, over a
//! borrowed view of a build. It holds no mutable state, so it is safe to call
//! once per candidate on every filter change.

use crate::build::{BuildState, BuildView};
use crate::catalog::{Component, Slot};

use super::checks::CHECKS;
use super::types::{RuleId, Warning};

/// The compatibility evaluator.
#[derive(Debug, Clone)]
pub struct Evaluator {
    enabled: Vec<RuleId>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    /// Evaluator running every rule.
    pub fn new() -> Self {
        Self {
            enabled: RuleId::ALL.to_vec(),
        }
    }

    /// Evaluator running only the given rules. Output order stays canonical
    /// regardless of the order given here.
    pub fn with_rules(rules: &[RuleId]) -> Self {
        let mut enabled = rules.to_vec();
        enabled.sort();
        enabled.dedup();
        Self { enabled }
    }

    pub fn enabled_rules(&self) -> &[RuleId] {
        &self.enabled
    }

    /// Warnings for the build as it stands.
    pub fn evaluate(&self, build: &BuildState) -> Vec<Warning> {
        self.evaluate_view(&build.view())
    }

    /// Warnings for the build as if `slot` held `candidate`. The build is not modified.
    pub fn evaluate_hypothetical(
        &self,
        build: &BuildState,
        slot: Slot,
        candidate: &Component,
    ) -> Vec<Warning> {
        self.evaluate_view(&BuildView::with_candidate(build, slot, candidate))
    }

    pub fn evaluate_view(&self, view: &BuildView<'_>) -> Vec<Warning> {
        CHECKS
            .iter()
            .filter(|(rule, _)| self.enabled.contains(rule))
            .filter_map(|(_, check)| check(view))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{json, Value};

    use super::*;
    use crate::catalog::Severity;

    fn part(pid: &str, category: &str, schema_data: Value) -> Arc<Component> {
        Arc::new(
            serde_json::from_value(json!({
                "pid": pid,
                "category": category,
                "name": pid,
                "schema_data": schema_data
            }))
            .unwrap(),
        )
    }

    fn build_with(parts: &[(Slot, Arc<Component>)]) -> BuildState {
        let mut build = BuildState::new();
        for (slot, component) in parts {
            build.set_slot(*slot, Arc::clone(component));
        }
        build
    }

    #[test]
    fn test_empty_build_has_no_warnings() {
        assert!(Evaluator::new().evaluate(&BuildState::new()).is_empty());
    }

    #[test]
    fn test_prop_size_severity_follows_frame_lists() {
        let props = part("P6", "propellers", json!({ "diameter_in": 6 }));
        let soft_frame = part("F5", "frames", json!({ "compatibility": { "prop_size_max_in": 5 } }));
        let hard_frame = part(
            "F5H",
            "frames",
            json!({ "compatibility": { "prop_size_max_in": 5, "_compat_hard": ["prop_size_max_in"] } }),
        );

        let evaluator = Evaluator::new();
        let soft = evaluator.evaluate(&build_with(&[(Slot::Frames, soft_frame), (Slot::Propellers, props.clone())]));
        assert_eq!(soft.len(), 1, "Exactly one warning expected");
        assert_eq!(soft[0].rule, RuleId::PropSize);
        assert_eq!(soft[0].severity, Severity::Warning);
        assert_eq!(soft[0].title, "Propeller Size Exceeds Frame Limits");

        let hard = evaluator.evaluate(&build_with(&[(Slot::Frames, hard_frame), (Slot::Propellers, props)]));
        assert_eq!(hard[0].severity, Severity::Error);
    }

    #[test]
    fn test_esc_overvoltage_defaults_to_error() {
        let battery = part("B6", "batteries", json!({ "cell_count": 6 }));
        let esc = part("E4", "escs", json!({ "compatibility": { "cell_count_max": 4 } }));

        let warnings = Evaluator::new().evaluate(&build_with(&[(Slot::Batteries, battery), (Slot::Escs, esc)]));
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].severity, Severity::Error);
        assert!(warnings[0].message.contains("4S"), "Message was: {}", warnings[0].message);
        assert!(warnings[0].message.contains("6S"), "Message was: {}", warnings[0].message);
    }

    #[test]
    fn test_hypothetical_does_not_touch_build() {
        let frame = part("F5", "frames", json!({ "compatibility": { "prop_size_max_in": 5 } }));
        let build = build_with(&[(Slot::Frames, frame)]);
        let candidate = part("P7", "propellers", json!({ "diameter_in": 7 }));

        let warnings = Evaluator::new().evaluate_hypothetical(&build, Slot::Propellers, &candidate);
        assert_eq!(warnings.len(), 1);
        assert!(!build.is_filled(Slot::Propellers));
        assert!(Evaluator::new().evaluate(&build).is_empty());
    }

    #[test]
    fn test_with_rules_limits_and_keeps_order() {
        let evaluator = Evaluator::with_rules(&[RuleId::EscCurrent, RuleId::PropSize, RuleId::PropSize]);
        assert_eq!(evaluator.enabled_rules(), &[RuleId::PropSize, RuleId::EscCurrent]);

        let battery = part("B6", "batteries", json!({ "cell_count": 6 }));
        let esc = part("E4", "escs", json!({ "compatibility": { "cell_count_max": 4 } }));
        assert!(evaluator
            .evaluate(&build_with(&[(Slot::Batteries, battery), (Slot::Escs, esc)]))
            .is_empty());
    }
}
