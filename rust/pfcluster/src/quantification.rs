use crate::models::{
    Component,
    ProteoformCandidate,
};
use crate::pass::{
    Claim,
    PassContext,
    RootSource,
    run_batches,
};
use crate::pool::RemainingPool;
use crate::vetting::match_partners;
use tracing::info;

/// Assigns quantification components to already vetted candidates.
///
/// Uses the same light/heavy partner matching and scheduling as vetting, over
/// the separate quantification population. No candidate is created or
/// dropped. Returns how many components were assigned.
pub fn assign_quantification(
    ctx: &PassContext<'_>,
    candidates: &mut [ProteoformCandidate],
    quant_components: &[&Component],
) -> usize {
    for c in candidates.iter_mut() {
        c.clear_quantification();
    }
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        candidates[b]
            .agg_intensity
            .total_cmp(&candidates[a].agg_intensity)
    });

    let mut pool = RemainingPool::new(quant_components);
    let results = {
        let roots: Vec<&ProteoformCandidate> = order.iter().map(|&i| &candidates[i]).collect();
        run_batches(
            ctx,
            "Quantification",
            &roots,
            RootSource::Separate,
            &mut pool,
            |i, pool| {
                let matches = match_partners(ctx, roots[i], quant_components, pool);
                Claim {
                    slots: matches.slots(),
                    value: matches,
                }
            },
        )
    };

    let mut assigned = 0;
    for (pos, matches) in results {
        let candidate = &mut candidates[order[pos]];
        candidate.lt_quant = matches
            .light
            .iter()
            .map(|&s| quant_components[s].id)
            .collect();
        candidate.hv_quant = matches
            .heavy
            .iter()
            .map(|&s| quant_components[s].id)
            .collect();
        assigned += candidate.lt_quant.len() + candidate.hv_quant.len();
    }
    info!(
        "Assigned {} of {} quantification components to {} candidates",
        assigned,
        quant_components.len(),
        candidates.len()
    );
    assigned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::constants::NEUCODE_LYSINE_MASS_SHIFT;
    use crate::models::component::tests::component;
    use crate::models::{
        ComponentId,
        Purpose,
        RecordRef,
    };
    use crate::scheduler::MassWindowScheduler;
    use rayon::ThreadPoolBuilder;

    #[test]
    fn test_quant_partners_assigned_in_place() {
        let config = EngineConfig::default();
        let scheduler = MassWindowScheduler::new(config.exclusion_radius);
        let workers = ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let ctx = PassContext::new(&config, &scheduler, &workers);

        let quant: Vec<Component> = [15_000.0, 15_000.0 + 7.0 * NEUCODE_LYSINE_MASS_SHIFT, 40_000.0]
            .iter()
            .enumerate()
            .map(|(i, &m)| {
                let mut c = component(m, 1.0, &[(12, 1.0)]);
                c.id = ComponentId(10 + i as u32);
                c.purpose = Purpose::Quantification;
                c
            })
            .collect();
        let refs: Vec<&Component> = quant.iter().collect();

        let mut candidates = vec![ProteoformCandidate {
            accession: "E0".into(),
            root: RecordRef::Component(ComponentId(0)),
            members: vec![],
            agg_mass: 15_000.0,
            agg_intensity: 1.0,
            agg_rt: 11.0,
            lysine_count: Some(7),
            heavy_offset: None,
            lt_verification: vec![ComponentId(0)],
            hv_verification: vec![ComponentId(1)],
            lt_quant: vec![],
            hv_quant: vec![],
            accepted: true,
        }];
        let assigned = assign_quantification(&ctx, &mut candidates, &refs);
        assert_eq!(assigned, 2);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].lt_quant, vec![ComponentId(10)]);
        assert_eq!(candidates[0].hv_quant, vec![ComponentId(11)]);
        // Verification membership is untouched.
        assert_eq!(candidates[0].lt_verification, vec![ComponentId(0)]);
    }
}
