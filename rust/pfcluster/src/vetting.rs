use crate::models::{
    Component,
    ComponentId,
    ProteoformCandidate,
    Purpose,
};
use crate::pass::{
    Claim,
    PassContext,
    RootSource,
    run_batches,
};
use crate::pool::RemainingPool;
use crate::tolerance::RtTolerance;
use tracing::info;

/// Pool slots matching a candidate's light and heavy reference masses.
pub(crate) struct PartnerMatches {
    pub light: Vec<usize>,
    pub heavy: Vec<usize>,
}

impl PartnerMatches {
    pub fn slots(&self) -> Vec<usize> {
        self.light.iter().chain(self.heavy.iter()).copied().collect()
    }
}

/// Finds the remaining components supporting `candidate`.
///
/// Light partners match the aggregate mass; in labeled runs heavy partners
/// match [`ProteoformCandidate::heavy_reference_mass`]. A component
/// matching both is light. Only components within the claim radius of the
/// aggregate mass are considered.
pub(crate) fn match_partners(
    ctx: &PassContext<'_>,
    candidate: &ProteoformCandidate,
    components: &[&Component],
    pool: &RemainingPool,
) -> PartnerMatches {
    let config = ctx.config;
    let tolerance = config.mass_tolerance();
    let rt_tolerance = RtTolerance::from_option(config.retention_time_tolerance);
    let limit = ctx.claim_radius();

    let light_ref = candidate.agg_mass;
    let heavy_ref = if config.labeling.is_labeled() {
        candidate.heavy_reference_mass()
    } else {
        None
    };
    let bottom = heavy_ref.unwrap_or(light_ref).min(light_ref);
    let top = heavy_ref.unwrap_or(light_ref).max(light_ref);
    let low = bottom - tolerance.max_reach(bottom);
    let high = top + tolerance.max_reach(top);

    let mut matches = PartnerMatches {
        light: Vec::new(),
        heavy: Vec::new(),
    };
    for slot in pool.slots_in_mass_range(low, high) {
        let component = components[slot];
        let mass = component.weighted_monoisotopic_mass;
        if (mass - light_ref).abs() >= limit
            || !rt_tolerance.matches(component.rt_apex, candidate.agg_rt)
        {
            continue;
        }
        if tolerance.matches(mass, light_ref) {
            matches.light.push(slot);
        } else if heavy_ref.is_some_and(|h| tolerance.matches(mass, h)) {
            matches.heavy.push(slot);
        }
    }
    matches
}

fn ids(components: &[&Component], slots: &[usize]) -> Vec<ComponentId> {
    slots.iter().map(|&s| components[s].id).collect()
}

/// Re-derives every candidate's support from the full component pool.
///
/// Candidates are processed by descending aggregate intensity through the
/// mass-window scheduler. A candidate is kept when it found light support
/// (unlabeled) or both light and heavy support (labeled). Components are
/// consumed by the candidate that found them whether or not it is kept.
///
/// In unlabeled runs, light partners from quantification files are recorded
/// as light quantification members instead of verification members.
pub fn vet(
    ctx: &PassContext<'_>,
    candidates: Vec<ProteoformCandidate>,
    components: &[&Component],
) -> Vec<ProteoformCandidate> {
    let labeled = ctx.config.labeling.is_labeled();
    let mut ordered = candidates;
    ordered.sort_by(|a, b| b.agg_intensity.total_cmp(&a.agg_intensity));
    for c in ordered.iter_mut() {
        c.clear_verification();
        if !labeled {
            c.clear_quantification();
        }
        c.accepted = false;
    }
    let submitted = ordered.len();

    let mut pool = RemainingPool::new(components);
    let results = run_batches(
        ctx,
        "Vetting",
        &ordered,
        RootSource::Separate,
        &mut pool,
        |i, pool| {
            let matches = match_partners(ctx, &ordered[i], components, pool);
            Claim {
                slots: matches.slots(),
                value: matches,
            }
        },
    );

    let mut slots: Vec<Option<ProteoformCandidate>> = ordered.into_iter().map(Some).collect();
    let mut vetted = Vec::with_capacity(results.len());
    for (i, matches) in results {
        let Some(mut candidate) = slots[i].take() else {
            continue;
        };
        for &slot in matches.light.iter() {
            let component = components[slot];
            if !labeled && component.purpose == Purpose::Quantification {
                candidate.lt_quant.push(component.id);
            } else {
                candidate.lt_verification.push(component.id);
            }
        }
        candidate.hv_verification = ids(components, &matches.heavy);
        candidate.accepted = if labeled {
            !candidate.lt_verification.is_empty() && !candidate.hv_verification.is_empty()
        } else {
            !candidate.lt_verification.is_empty()
        };
        if candidate.accepted {
            vetted.push(candidate);
        }
    }
    info!(
        "Vetting kept {} of {} candidates, {} components unclaimed",
        vetted.len(),
        submitted,
        pool.len()
    );
    vetted
}
