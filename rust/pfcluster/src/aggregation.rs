use crate::models::{
    ProteoformCandidate,
    RecordRef,
};
use crate::pass::{
    Claim,
    PassContext,
    RootSource,
    run_batches,
};
use crate::pool::RemainingPool;
use crate::tolerance::RtTolerance;
use crate::traits::ClusterRecord;
use serde::Serialize;
use std::collections::{
    HashSet,
    VecDeque,
};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationOutcome {
    pub candidates: Vec<ProteoformCandidate>,
    /// Records that passed the filters but were never claimed by a candidate.
    pub remaining: Vec<RecordRef>,
}

/// Clusters the accepted records into proteoform candidates.
///
/// Records are filtered by acceptance, relative abundance and charge state
/// count, then ordered by descending intensity. Roots are issued from that
/// order by the mass-window scheduler; each root's worker absorbs every
/// remaining record reachable through a chain of mass matches. Accessions are
/// `E0`, `E1`, ... in root launch order.
pub fn aggregate<R: ClusterRecord>(ctx: &PassContext<'_>, records: &[R]) -> AggregationOutcome {
    let config = ctx.config;
    let mut ordered: Vec<&R> = records
        .iter()
        .filter(|r| {
            r.is_accepted()
                && r.relative_abundance() >= config.min_relative_abundance
                && r.charge_state_count() >= config.min_charge_states
        })
        .collect();
    // Stable, so ties keep input order.
    ordered.sort_by(|a, b| b.intensity().total_cmp(&a.intensity()));

    let mut pool = RemainingPool::new(&ordered);
    let ordered = &ordered;
    let results = run_batches(
        ctx,
        "Aggregation",
        ordered,
        RootSource::Pool,
        &mut pool,
        |root, pool| absorb(ctx, ordered, root, pool),
    );

    let candidates: Vec<ProteoformCandidate> = results
        .into_iter()
        .enumerate()
        .map(|(i, (root, members))| {
            let root = ordered[root];
            ProteoformCandidate {
                accession: ProteoformCandidate::accession_for(i),
                root: root.record_ref(),
                members: members.iter().map(|&slot| ordered[slot].record_ref()).collect(),
                agg_mass: root.mass(),
                agg_intensity: root.intensity(),
                agg_rt: root.rt_apex(),
                lysine_count: root.lysine_count(),
                heavy_offset: root.heavy_offset(),
                lt_verification: Vec::new(),
                hv_verification: Vec::new(),
                lt_quant: Vec::new(),
                hv_quant: Vec::new(),
                accepted: false,
            }
        })
        .collect();

    let remaining: Vec<RecordRef> = pool
        .slots()
        .iter()
        .map(|&slot| ordered[slot].record_ref())
        .collect();
    info!(
        "Aggregated {} records into {} candidates, {} left unclaimed",
        ordered.len(),
        candidates.len(),
        remaining.len()
    );
    AggregationOutcome {
        candidates,
        remaining,
    }
}

/// Grows one candidate from `root`, returning the claimed slots root first.
fn absorb<R: ClusterRecord>(
    ctx: &PassContext<'_>,
    ordered: &[&R],
    root: usize,
    pool: &RemainingPool,
) -> Claim<Vec<usize>> {
    let config = ctx.config;
    let tolerance = config.mass_tolerance();
    let rt_tolerance = RtTolerance::from_option(config.retention_time_tolerance);
    let limit = ctx.claim_radius();

    let root_record = ordered[root];
    let root_mass = root_record.mass();
    let root_rt = root_record.rt_apex();
    let root_lysines = root_record.lysine_count();

    let mut members = vec![root];
    let mut seen: HashSet<usize> = HashSet::from([root]);
    let mut queue: VecDeque<usize> = VecDeque::from([root]);
    while let Some(current) = queue.pop_front() {
        let current_mass = ordered[current].mass();
        let reach = tolerance.max_reach(current_mass);
        for slot in pool.slots_in_mass_range(current_mass - reach, current_mass + reach) {
            if seen.contains(&slot) {
                continue;
            }
            let candidate = ordered[slot];
            let mass = candidate.mass();
            if (mass - root_mass).abs() >= limit
                || !rt_tolerance.matches(candidate.rt_apex(), root_rt)
                || !lysines_compatible(root_lysines, candidate.lysine_count(), config.missed_lysines)
                || !tolerance.matches(mass, current_mass)
            {
                continue;
            }
            seen.insert(slot);
            members.push(slot);
            queue.push_back(slot);
        }
    }

    Claim {
        slots: members.clone(),
        value: members,
    }
}

fn lysines_compatible(root: Option<u32>, other: Option<u32>, missed_lysines: u32) -> bool {
    match (root, other) {
        (Some(a), Some(b)) => a.abs_diff(b) <= missed_lysines,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        EngineConfig,
        Labeling,
    };
    use crate::constants::MONOISOTOPIC_UNIT_MASS;
    use crate::models::component::tests::component;
    use crate::constants::NEUCODE_LYSINE_MASS_SHIFT;
    use crate::models::{
        Component,
        ComponentId,
        IsotopePair,
        PairId,
    };
    use crate::scheduler::MassWindowScheduler;
    use rayon::ThreadPoolBuilder;

    fn comps(specs: &[(f64, f64)]) -> Vec<Component> {
        specs
            .iter()
            .enumerate()
            .map(|(i, &(mass, intensity))| {
                let mut c = component(mass, intensity, &[(10, intensity)]);
                c.id = ComponentId(i as u32);
                c
            })
            .collect()
    }

    fn pair(i: u32, light_mass: f64, intensity: f64, lysines: u32) -> IsotopePair {
        let offset = lysines as f64 * NEUCODE_LYSINE_MASS_SHIFT;
        IsotopePair {
            id: PairId(i),
            light: ComponentId(2 * i),
            heavy: ComponentId(2 * i + 1),
            mass_difference: offset,
            shared_charges: vec![10],
            light_mass,
            heavy_mass: light_mass + offset,
            light_intensity: intensity,
            heavy_intensity: intensity / 2.0,
            intensity_ratio: 2.0,
            lysine_count: lysines,
            rt_apex: 11.0,
            relative_abundance: 1.0,
            accepted: true,
        }
    }

    fn run<R: ClusterRecord>(records: &[R], config: &EngineConfig, threads: usize) -> AggregationOutcome {
        let scheduler = MassWindowScheduler::new(config.exclusion_radius);
        let workers = ThreadPoolBuilder::new().num_threads(threads).build().unwrap();
        let ctx = PassContext::new(config, &scheduler, &workers);
        aggregate(&ctx, records)
    }

    fn unlabeled() -> EngineConfig {
        EngineConfig {
            labeling: Labeling::Unlabeled,
            ..Default::default()
        }
    }

    #[test]
    fn test_empty_input() {
        let out = run::<Component>(&[], &unlabeled(), 2);
        assert!(out.candidates.is_empty());
        assert!(out.remaining.is_empty());
    }

    #[test]
    fn test_chain_absorption_through_missed_monoisotopics() {
        // 10_000 -> +1 isotope -> +2 isotopes: the last is 2 away from the root but
        // 1 away from the middle one.
        let records = comps(&[
            (10_000.0, 100.0),
            (10_000.0 + MONOISOTOPIC_UNIT_MASS, 50.0),
            (10_000.0 + 4.0 * MONOISOTOPIC_UNIT_MASS, 20.0),
            (10_500.0, 80.0),
        ]);
        let config = EngineConfig {
            missed_monoisotopics: 3,
            ..unlabeled()
        };
        let out = run(&records, &config, 2);
        assert_eq!(out.candidates.len(), 2);
        assert_eq!(out.candidates[0].accession, "E0");
        assert_eq!(out.candidates[0].root, RecordRef::Component(ComponentId(0)));
        assert_eq!(out.candidates[0].members.len(), 3);
        assert_eq!(out.candidates[1].root, RecordRef::Component(ComponentId(3)));
        assert!(out.remaining.is_empty());
    }

    #[test]
    fn test_filters_leave_records_out() {
        let mut records = comps(&[(10_000.0, 100.0), (20_000.0, 50.0), (30_000.0, 20.0)]);
        records[1].accepted = false;
        records[2].relative_abundance = 0.01;
        let config = EngineConfig {
            min_relative_abundance: 0.5,
            ..unlabeled()
        };
        let out = run(&records, &config, 2);
        assert_eq!(out.candidates.len(), 1);
        assert_eq!(out.candidates[0].agg_mass, 10_000.0);
    }

    #[test]
    fn test_rt_tolerance_splits_clusters() {
        let mut records = comps(&[(10_000.0, 100.0), (10_000.0, 50.0)]);
        records[1].rt_apex = records[0].rt_apex + 10.0;
        let config = EngineConfig {
            retention_time_tolerance: Some(2.0),
            ..unlabeled()
        };
        let out = run(&records, &config, 2);
        assert_eq!(out.candidates.len(), 2);
    }

    #[test]
    fn test_partition_and_repeatability() {
        let specs: Vec<(f64, f64)> = (0..60)
            .map(|i| {
                let base = 5_000.0 + (i % 12) as f64 * 7.3;
                let offset = (i / 12) as f64 * MONOISOTOPIC_UNIT_MASS;
                (base + offset, 1_000.0 - i as f64)
            })
            .collect();
        let records = comps(&specs);
        let config = unlabeled();
        let first = run(&records, &config, 4);
        let second = run(&records, &config, 4);
        assert_eq!(first, second);

        let mut seen = HashSet::new();
        for c in first.candidates.iter() {
            for m in c.members.iter() {
                assert!(seen.insert(*m), "{} claimed twice", m);
            }
        }
        for r in first.remaining.iter() {
            assert!(seen.insert(*r));
        }
        assert_eq!(seen.len(), records.len());
    }

    #[test]
    fn test_lysine_gate_on_pairs() {
        let config = EngineConfig::default();
        let pairs = vec![
            pair(0, 20_000.0, 100.0, 10),
            // One isotope up, three lysines off the root.
            pair(1, 20_000.0 + MONOISOTOPIC_UNIT_MASS, 50.0, 13),
            // Two isotopes up, two lysines off the root.
            pair(2, 20_000.0 + 2.0 * MONOISOTOPIC_UNIT_MASS, 40.0, 12),
        ];
        let out = run(&pairs, &config, 2);
        assert_eq!(out.candidates.len(), 2);
        assert_eq!(
            out.candidates[0].members,
            vec![RecordRef::Pair(PairId(0)), RecordRef::Pair(PairId(2))]
        );
        assert_eq!(out.candidates[0].lysine_count, Some(10));
        assert_eq!(out.candidates[1].members, vec![RecordRef::Pair(PairId(1))]);
        assert!(out.remaining.is_empty());
    }
}
