//! NeuCode isotope pair detection.

use crate::config::EngineConfig;
use crate::constants::MONOISOTOPIC_UNIT_MASS;
use crate::models::{
    Component,
    ComponentId,
    IsotopePair,
    PairId,
};
use crate::store::RecordStore;
use rayon::prelude::*;
use std::collections::HashMap;
use std::time::Instant;
use tracing::{
    debug,
    info,
};

/// Every putative pair among the components of one scan range group.
///
/// Only accepted components with a finite mass take part. Candidate
/// generation runs in parallel over the lower mass partner.
pub fn candidate_pairs(components: &[&Component], window: f64) -> Vec<IsotopePair> {
    let mut sorted: Vec<&Component> = components
        .iter()
        .copied()
        .filter(|c| c.accepted && c.weighted_monoisotopic_mass.is_finite())
        .collect();
    sorted.sort_by(|a, b| {
        a.weighted_monoisotopic_mass
            .total_cmp(&b.weighted_monoisotopic_mass)
            .then(a.id.cmp(&b.id))
    });

    let sorted = &sorted;
    (0..sorted.len())
        .into_par_iter()
        .flat_map_iter(|i| {
            let lower = sorted[i];
            sorted[i + 1..]
                .iter()
                .take_while(move |higher| {
                    higher.weighted_monoisotopic_mass - lower.weighted_monoisotopic_mass < window
                })
                .filter(move |higher| {
                    higher.weighted_monoisotopic_mass > lower.weighted_monoisotopic_mass
                })
                .filter_map(move |higher| IsotopePair::from_partners(lower, higher))
        })
        .collect()
}

/// Resolves competing candidates into the retained set.
///
/// Candidates are visited by ascending lower mass, then higher mass. A pair is
/// kept when its light partner is no heavier than its heavy partner plus one
/// isotope spacing, and no kept pair already claims the same heavy partner with
/// a more intense light. Running this again on its own output keeps everything.
pub fn retain_pairs(mut candidates: Vec<IsotopePair>) -> Vec<IsotopePair> {
    candidates.sort_by(|a, b| {
        a.lower_mass()
            .total_cmp(&b.lower_mass())
            .then(a.higher_mass().total_cmp(&b.higher_mass()))
            .then(a.light.cmp(&b.light))
            .then(a.heavy.cmp(&b.heavy))
    });

    let mut strongest_light: HashMap<ComponentId, f64> = HashMap::new();
    let mut retained = Vec::with_capacity(candidates.len());
    for pair in candidates {
        let plausible = pair.light_mass <= pair.heavy_mass + MONOISOTOPIC_UNIT_MASS;
        let dominated = strongest_light
            .get(&pair.heavy)
            .is_some_and(|&best| best > pair.light_intensity);
        if plausible && !dominated {
            let best = strongest_light.entry(pair.heavy).or_insert(pair.light_intensity);
            if pair.light_intensity > *best {
                *best = pair.light_intensity;
            }
            retained.push(pair);
        }
    }
    retained
}

/// Marks a pair acceptable when its light partner is accepted and its ratio
/// and lysine count are inside the configured ranges.
pub fn gate_pair(pair: &mut IsotopePair, light_accepted: bool, config: &EngineConfig) {
    pair.accepted = light_accepted
        && config.intensity_ratio.contains(pair.intensity_ratio)
        && config.lysine_count.contains(pair.lysine_count as f64);
}

/// Finds the retained, gated pairs of every scan range group in the store.
///
/// Pair ids are positions in the returned list.
pub fn find_isotope_pairs(store: &RecordStore, config: &EngineConfig) -> Vec<IsotopePair> {
    let start = Instant::now();
    let groups = store.scan_range_groups();
    let mut pairs = Vec::new();
    for ((file, scan_range), components) in groups.iter() {
        let found = retain_pairs(candidate_pairs(components, config.isotope_pair_window));
        debug!(
            "{} {}: {} pairs from {} components",
            file,
            scan_range,
            found.len(),
            components.len()
        );
        pairs.extend(found);
    }
    for (i, pair) in pairs.iter_mut().enumerate() {
        pair.id = PairId(i as u32);
        let light_accepted = store.get(pair.light).is_some_and(|c| c.accepted);
        gate_pair(pair, light_accepted, config);
    }
    info!(
        "Found {} isotope pairs ({} accepted) in {} scan range groups, took {:#?}",
        pairs.len(),
        pairs.iter().filter(|p| p.accepted).count(),
        groups.len(),
        start.elapsed()
    );
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::NEUCODE_LYSINE_MASS_SHIFT;
    use crate::models::component::tests::component;

    fn with_ids(mut comps: Vec<Component>) -> Vec<Component> {
        for (i, c) in comps.iter_mut().enumerate() {
            c.id = ComponentId(i as u32);
        }
        comps
    }

    #[test]
    fn test_window_is_exclusive() {
        let comps = with_ids(vec![
            component(100.0, 10.0, &[(1, 10.0)]),
            component(106.0, 5.0, &[(1, 5.0)]),
            component(105.9, 5.0, &[(1, 5.0)]),
        ]);
        let refs: Vec<&Component> = comps.iter().collect();
        let pairs = candidate_pairs(&refs, 6.0);
        // 100-105.9, 105.9-106.0 ; never 100-106
        assert_eq!(pairs.len(), 2);
        assert!(pairs.iter().all(|p| p.mass_difference < 6.0));
    }

    #[test]
    fn test_unaccepted_components_not_paired() {
        let mut comps = with_ids(vec![
            component(100.0, 10.0, &[(1, 10.0)]),
            component(100.036, 5.0, &[(1, 5.0)]),
        ]);
        comps[1].accepted = false;
        let refs: Vec<&Component> = comps.iter().collect();
        assert!(candidate_pairs(&refs, 6.0).is_empty());
    }

    #[test]
    fn test_heavy_claimed_by_stronger_light() {
        // Heavy at 10_000; two lights compete for it.
        let comps = with_ids(vec![
            component(10_000.0, 10.0, &[(10, 10.0)]),
            component(10_000.0 - 4.0 * NEUCODE_LYSINE_MASS_SHIFT, 80.0, &[(10, 80.0)]),
            component(10_000.0 - 2.0 * NEUCODE_LYSINE_MASS_SHIFT, 40.0, &[(10, 40.0)]),
        ]);
        let refs: Vec<&Component> = comps.iter().collect();
        let candidates = candidate_pairs(&refs, 6.0);
        let retained = retain_pairs(candidates);
        let claiming_heavy: Vec<&IsotopePair> =
            retained.iter().filter(|p| p.heavy == ComponentId(0)).collect();
        // The 80 light is processed first (lowest mass) and blocks the weaker 40 light.
        assert_eq!(claiming_heavy.len(), 1);
        assert_eq!(claiming_heavy[0].light, ComponentId(1));
    }

    #[test]
    fn test_retention_is_a_fixed_point() {
        let comps = with_ids(vec![
            component(10_000.0, 10.0, &[(10, 10.0)]),
            component(10_000.0 - 4.0 * NEUCODE_LYSINE_MASS_SHIFT, 80.0, &[(10, 80.0)]),
            component(10_000.0 - 2.0 * NEUCODE_LYSINE_MASS_SHIFT, 40.0, &[(10, 40.0), (11, 5.0)]),
            component(10_003.0, 50.0, &[(10, 30.0), (11, 20.0)]),
        ]);
        let refs: Vec<&Component> = comps.iter().collect();
        let once = retain_pairs(candidate_pairs(&refs, 6.0));
        let twice = retain_pairs(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_gate_uses_ranges() {
        let config = EngineConfig::default();
        let comps = with_ids(vec![
            component(20_000.0, 20.0, &[(10, 20.0)]),
            component(20_000.0 + 8.0 * NEUCODE_LYSINE_MASS_SHIFT, 10.0, &[(10, 10.0)]),
        ]);
        let mut pair = IsotopePair::from_partners(&comps[0], &comps[1]).unwrap();
        gate_pair(&mut pair, true, &config);
        assert!(pair.accepted);
        gate_pair(&mut pair, false, &config);
        assert!(!pair.accepted);

        // Ratio of 1.0 is below the 1.4 floor.
        let even = with_ids(vec![
            component(20_000.0, 10.0, &[(10, 10.0)]),
            component(20_000.0 + 8.0 * NEUCODE_LYSINE_MASS_SHIFT, 10.0, &[(10, 10.0)]),
        ]);
        let mut pair = IsotopePair::from_partners(&even[0], &even[1]).unwrap();
        gate_pair(&mut pair, true, &config);
        assert!(!pair.accepted);
    }
}
