use std::sync::Arc;

use super::types::Component;

/// Default number of suggestions shown under a component's detail view.
pub const DEFAULT_SIMILAR_LIMIT: usize = 3;

/// Similarity score of `candidate` against `target`.
///
/// Same manufacturer +3, each shared tag +2, weight within 10% +4 (within
/// 25% +2), each identical compatibility field +5.
pub fn similarity_score(target: &Component, candidate: &Component) -> u32 {
    let mut score = 0;

    let (tm, cm) = (target.manufacturer.trim(), candidate.manufacturer.trim());
    if !tm.is_empty() && tm.eq_ignore_ascii_case(cm) {
        score += 3;
    }

    let candidate_tags = candidate.attributes.tags();
    let shared = target
        .attributes
        .tags()
        .iter()
        .filter(|t| candidate_tags.contains(t))
        .count() as u32;
    score += shared * 2;

    if let (Some(tw), Some(cw)) = (target.weight_g(), candidate.weight_g()) {
        if tw > 0.0 && cw > 0.0 {
            let diff = (tw - cw).abs();
            if diff <= tw * 0.10 {
                score += 4;
            } else if diff <= tw * 0.25 {
                score += 2;
            }
        }
    }

    let candidate_compat = candidate.attributes.compatibility();
    for (key, value) in target.attributes.compatibility().values() {
        if candidate_compat.get(key).is_some_and(|other| other.same_as(value)) {
            score += 5;
        }
    }

    score
}

/// The best-scoring components of `pool` relative to `target`, best first.
///
/// The target itself and zero scores are excluded; ties keep pool order.
pub fn similar_components(
    target: &Component,
    pool: &[Arc<Component>],
    limit: usize,
) -> Vec<Arc<Component>> {
    let mut scored: Vec<(u32, &Arc<Component>)> = pool
        .iter()
        .filter(|c| c.pid != target.pid)
        .map(|c| (similarity_score(target, c), c))
        .filter(|(score, _)| *score > 0)
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
        .into_iter()
        .take(limit)
        .map(|(_, c)| Arc::clone(c))
        .collect()
}
