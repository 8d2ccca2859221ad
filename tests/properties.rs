use std::path::PathBuf;

use once_cell::sync::Lazy;
use proptest::prelude::*;

use droneclear::build::BuildState;
use droneclear::catalog::{load_catalog_file, ComponentRegistry, Severity, Slot};
use droneclear::rules::{Evaluator, RuleId};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

static REGISTRY: Lazy<ComponentRegistry> = Lazy::new(|| {
    let catalog = load_catalog_file(&fixture_path("catalog.json")).expect("Failed to load fixture");
    let mut registry = ComponentRegistry::new();
    registry.load_catalog(catalog);
    registry
});

/// One optional pick per slot, as an index into that slot's fixture list.
fn picks() -> impl Strategy<Value = Vec<Option<usize>>> {
    prop::collection::vec(prop::option::of(0usize..16), Slot::ALL.len())
}

fn build_from(picks: &[Option<usize>]) -> BuildState {
    let mut build = BuildState::new();
    for (slot, pick) in Slot::ALL.iter().zip(picks) {
        let list = REGISTRY.category(*slot);
        if let Some(i) = *pick {
            if !list.is_empty() {
                build.set_slot(*slot, list[i % list.len()].clone());
            }
        }
    }
    build
}

/// Frame field whose declared severity a frame-bound rule uses.
fn frame_field(rule: RuleId) -> Option<&'static str> {
    match rule {
        RuleId::PropSize => Some("prop_size_max_in"),
        RuleId::FcMountPattern | RuleId::EscMountPattern => Some("fc_mounting_patterns_mm"),
        RuleId::MotorMountSpacing => Some("motor_mount_hole_spacing_mm"),
        RuleId::FcMountHoleSize => Some("fc_mount_hole_size"),
        RuleId::MotorBoltSize => Some("motor_mount_bolt_size"),
        _ => None,
    }
}

proptest! {
    #[test]
    fn test_evaluation_is_deterministic(picks in picks()) {
        let build = build_from(&picks);
        let evaluator = Evaluator::new();
        prop_assert_eq!(evaluator.evaluate(&build), evaluator.evaluate(&build));
    }

    #[test]
    fn test_hypothetical_equals_applied_and_never_mutates(
        picks in picks(),
        slot_index in 0usize..12,
        candidate_index in 0usize..16,
    ) {
        let build = build_from(&picks);
        let slot = Slot::ALL[slot_index];
        let list = REGISTRY.category(slot);
        prop_assume!(!list.is_empty());
        let candidate = list[candidate_index % list.len()].clone();

        let before = build.serialize();
        let evaluator = Evaluator::new();
        let preview = evaluator.evaluate_hypothetical(&build, slot, &candidate);
        prop_assert_eq!(build.serialize(), before);

        let mut applied = build.clone();
        applied.set_slot(slot, candidate);
        prop_assert_eq!(preview, evaluator.evaluate(&applied));
    }

    #[test]
    fn test_warnings_only_name_filled_slots(picks in picks()) {
        let build = build_from(&picks);
        for warning in Evaluator::new().evaluate(&build) {
            for slot in warning.slots {
                prop_assert!(build.is_filled(slot), "{} warned about empty slot {}", warning.rule, slot);
            }
        }
    }

    #[test]
    fn test_clearing_a_slot_silences_its_warnings(picks in picks(), slot_index in 0usize..12) {
        let mut build = build_from(&picks);
        let slot = Slot::ALL[slot_index];
        build.clear_slot(slot);
        for warning in Evaluator::new().evaluate(&build) {
            prop_assert!(!warning.slots.contains(&slot));
        }
    }

    #[test]
    fn test_severity_follows_declarations(picks in picks()) {
        let build = build_from(&picks);
        for warning in Evaluator::new().evaluate(&build) {
            match warning.rule {
                RuleId::BatteryConnector => prop_assert_eq!(warning.severity, Severity::Error),
                RuleId::BatteryVoltage
                | RuleId::MotorCellCount
                | RuleId::VideoSystem
                | RuleId::EscCurrent => prop_assert_eq!(warning.severity, Severity::Warning),
                RuleId::EscCellCount => {}
                rule => {
                    let frame = build.get(Slot::Frames).expect("Frame rules need a frame");
                    let field = frame_field(rule).expect("Frame rule has a field");
                    prop_assert_eq!(
                        warning.severity,
                        frame.attributes.severities().severity_for(field)
                    );
                }
            }
        }
    }

    #[test]
    fn test_aggregate_weight_sums_known_weights(picks in picks()) {
        let build = build_from(&picks);
        let expected: f64 = build.iter().filter_map(|(_, c)| c.weight_g()).sum();
        let totals = build.aggregates();
        prop_assert!((totals.total_weight_g - expected).abs() < 1e-9);
        prop_assert_eq!(totals.filled_count, build.iter().count());
    }
}
