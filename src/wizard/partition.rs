use std::cmp::Ordering;
use std::sync::Arc;

use crate::build::BuildState;
use crate::catalog::{Component, Slot};
use crate::rules::{has_errors, Evaluator};

use super::classify::infer_frame_class;
use super::types::{Candidate, CandidatePartition, ClassFilter};

/// Bucket the candidates for `slot` by what they would do to the build.
///
/// Each candidate is evaluated as if it filled `slot`; the build itself is
/// only read. Frames are first narrowed by the class filter.
pub fn partition_candidates(
    slot: Slot,
    class_filter: ClassFilter,
    build: &BuildState,
    components: &[Arc<Component>],
    evaluator: &Evaluator,
) -> CandidatePartition {
    let mut partition = CandidatePartition {
        category: slot,
        compatible: Vec::new(),
        caution: Vec::new(),
        incompatible: Vec::new(),
    };

    for component in components {
        if slot == Slot::Frames && !class_filter.admits(infer_frame_class(component)) {
            continue;
        }

        let warnings = evaluator.evaluate_hypothetical(build, slot, component);
        let candidate = Candidate {
            component: Arc::clone(component),
            warnings,
        };

        if candidate.warnings.is_empty() {
            partition.compatible.push(candidate);
        } else if has_errors(&candidate.warnings) {
            partition.incompatible.push(candidate);
        } else {
            partition.caution.push(candidate);
        }
    }

    partition
        .compatible
        .sort_by(|a, b| by_weight(a, b).then_with(|| by_name(a, b)));
    partition.caution.sort_by(|a, b| {
        a.warnings
            .len()
            .cmp(&b.warnings.len())
            .then_with(|| by_weight(a, b))
            .then_with(|| by_name(a, b))
    });
    partition.incompatible.sort_by(by_name);

    partition
}

/// Ascending weight, unknown weight last.
fn by_weight(a: &Candidate, b: &Candidate) -> Ordering {
    match (a.component.weight_g(), b.component.weight_g()) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Case-insensitive name, then pid.
fn by_name(a: &Candidate, b: &Candidate) -> Ordering {
    a.component
        .name
        .to_lowercase()
        .cmp(&b.component.name.to_lowercase())
        .then_with(|| a.component.pid.cmp(&b.component.pid))
}
