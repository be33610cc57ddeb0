//! Explains relation mass differences with modification changes.

use crate::catalog::PtmCatalog;
use crate::models::{
    Identity,
    IdentityAssignment,
    IdentityId,
    ModificationKind,
    PtmChange,
    PtmSet,
    Relation,
    RelationAssignment,
    RelationKind,
    TheoreticalInfo,
};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{
    debug,
    info,
};

/// Counts describing a family-wide resolution run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolutionReport {
    pub identified_experimentals: usize,
    pub resolved_relations: usize,
    pub unresolved_relations: usize,
    pub layers: usize,
}

/// Picks the modification change that best explains a relation.
pub struct IdentityResolver<'a> {
    catalog: &'a PtmCatalog,
    mass_tolerance_ppm: f64,
    additional_ptm_penalty: i32,
}

/// Number of terminal residues whose motif appears among the `Missing`
/// modifications of `set`, counted from the start or the end of `sequence`.
pub fn degraded_residue_count(sequence: &str, set: &PtmSet, from_start: bool) -> usize {
    let missing: Vec<char> = set
        .ptms
        .iter()
        .filter(|m| m.kind == ModificationKind::Missing)
        .filter_map(|m| m.motif)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if missing.is_empty() {
        return 0;
    }
    let is_missing = |c: &char| missing.contains(&c.to_ascii_uppercase());
    if from_start {
        sequence.chars().take_while(is_missing).count()
    } else {
        sequence.chars().rev().take_while(is_missing).count()
    }
}

fn signum(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

impl<'a> IdentityResolver<'a> {
    pub fn new(catalog: &'a PtmCatalog, mass_tolerance_ppm: f64) -> Self {
        Self {
            catalog,
            mass_tolerance_ppm,
            additional_ptm_penalty: 1,
        }
    }

    /// Scores every candidate set as an addition to `source_set` and keeps the
    /// ones at or under the catalog's rank threshold, with adjusted rank sums.
    ///
    /// Modifications positioned like a terminal degradation, a likely cleavage
    /// or methionine retention are favoured; ones not annotated on the base
    /// protein are penalised. Motif violations disqualify a set.
    pub fn score_additions(
        &self,
        candidate_sets: &[Arc<PtmSet>],
        source_set: &PtmSet,
        base: Option<&TheoreticalInfo>,
    ) -> Vec<PtmSet> {
        let ranks = self.catalog.ranks();
        let half_q1 = ranks.half_first_quartile();
        let sequence = base.map(|b| b.sequence.as_str()).unwrap_or("");
        let n_degraded = degraded_residue_count(sequence, source_set, true);
        let c_degraded = degraded_residue_count(sequence, source_set, false);
        let n_residue = base.and_then(|b| b.residue(n_degraded));
        let c_residue = base.and_then(|b| b.residue_from_end(c_degraded));
        let known = |id: &str| base.is_some_and(|b| b.known_modifications.iter().any(|k| k == id));

        let mut kept = Vec::new();
        for set in candidate_sets.iter() {
            let ptm_count: i32 = set.ptms.iter().map(|m| m.ptm_count as i32).sum();
            let mut rank_sum = self.additional_ptm_penalty * (ptm_count - 1);
            let mut rejected = false;
            for m in set.ptms.iter() {
                let mod_rank = self.catalog.rank_of(m);
                if m.monoisotopic_mass == 0.0 {
                    rank_sum += mod_rank;
                    continue;
                }

                let could_be_m_retention = m.kind == ModificationKind::AminoAcid
                    && m.motif_is(Some('M'))
                    && base.is_some_and(|b| b.begin == 2)
                    && !source_set.contains(m);
                let motif_at_n = m.motif_is(n_residue);
                let motif_at_c = m.motif_is(c_residue);
                let cannot_be_degradation = !motif_at_n && !motif_at_c;
                if (m.kind == ModificationKind::Missing && cannot_be_degradation)
                    || (m.kind == ModificationKind::AminoAcid && !could_be_m_retention)
                    || (m.require_proteoform_without_mod && set.len() > 1)
                {
                    rejected = true;
                    break;
                }

                let n_term_degradation = m.kind == ModificationKind::Missing && motif_at_n;
                let c_term_degradation = m.kind == ModificationKind::Missing && motif_at_c;
                let likely_cleavage = (n_term_degradation
                    && n_residue.is_some_and(|r| self.catalog.is_likely_cleavage(r)))
                    || (c_term_degradation
                        && c_residue.is_some_and(|r| self.catalog.is_likely_cleavage(r)));

                let variable = self.catalog.is_variable(m);
                if variable {
                    rank_sum -= 1;
                }
                if likely_cleavage {
                    rank_sum += half_q1;
                } else if could_be_m_retention || n_term_degradation || c_term_degradation {
                    rank_sum += ranks.second_quartile;
                } else if known(&m.id) || variable {
                    rank_sum += mod_rank;
                } else {
                    rank_sum += mod_rank + half_q1;
                }
            }

            if !rejected && rank_sum <= ranks.threshold {
                kept.push(PtmSet {
                    ptms: set.ptms.clone(),
                    mass: set.mass,
                    rank_sum,
                });
            }
        }
        kept
    }

    /// Lowest rank sum, ties broken by the smallest distance to `delta`.
    pub fn best_addition(&self, scored: Vec<PtmSet>, delta: f64) -> Option<PtmSet> {
        scored.into_iter().min_by(|a, b| {
            a.rank_sum.cmp(&b.rank_sum).then(
                (a.mass - delta)
                    .abs()
                    .total_cmp(&(b.mass - delta).abs()),
            )
        })
    }

    /// The catalog set whose removal best explains `delta`, among sets whose
    /// members are all present on `source_set`.
    pub fn best_loss(&self, delta: f64, tolerance: f64, source_set: &PtmSet) -> Option<Arc<PtmSet>> {
        let mut best: Option<&Arc<PtmSet>> = None;
        for set in self.catalog.all_sets() {
            let residual = (delta + set.mass).abs();
            if residual > tolerance {
                continue;
            }
            if !set.ptms.iter().all(|m| source_set.contains(m)) {
                continue;
            }
            match best {
                Some(b) if (delta + b.mass).abs() <= residual => {}
                _ => best = Some(set),
            }
        }
        best.cloned()
    }

    /// Resolves `relation` from `source` towards its other endpoint.
    ///
    /// Writes the relation's assignment and the target's identification,
    /// each only if unset. Returns the target when the relation could be
    /// explained, whichever resolution got there first.
    pub fn resolve_relation(
        &self,
        identities: &[Identity],
        relation: &Relation,
        source_id: IdentityId,
    ) -> Option<IdentityId> {
        let target_id = relation.other(source_id)?;
        let source = identities.get(source_id.index())?;
        let target = identities.get(target_id.index())?;
        if !target.is_experimental() || target_id == source_id {
            return None;
        }
        let source_set = source.ptm_set()?;

        let tolerance = source.modified_mass.abs() / 1e6 * self.mass_tolerance_ppm;
        let sign = signum(target.modified_mass - source.modified_mass);
        let delta = if relation.delta_mass < 0.0 {
            relation.delta_mass
        } else {
            sign * relation.delta_mass
        };

        let base = match source.theoretical_info() {
            Some(info) => Some(info),
            None => source
                .lineage()
                .first()
                .and_then(|id| identities.get(id.index()))
                .and_then(|i| i.theoretical_info()),
        };

        let scored = self.score_additions(&relation.candidate_sets, source_set, base);
        let addition = self.best_addition(scored, delta);
        let loss = self.best_loss(delta, tolerance, source_set);

        let (change, new_set) = match (loss, addition) {
            (Some(loss), _) => {
                let new_set = source_set.with_removed(&loss);
                (PtmChange::Loss(loss.as_ref().clone()), new_set)
            }
            (None, Some(addition)) => {
                let new_set = source_set.with_added(&addition);
                (PtmChange::Addition(addition), new_set)
            }
            (None, None) if relation.delta_mass.abs() <= tolerance => {
                (PtmChange::Unmodified, source_set.clone())
            }
            (None, None) => return None,
        };

        let signed_delta_mass = match relation.kind {
            RelationKind::ExperimentalExperimental => relation.delta_mass * sign,
            RelationKind::ExperimentalTheoretical => relation.delta_mass,
        };
        relation.assign(RelationAssignment {
            change,
            signed_delta_mass,
        });
        let mut lineage = source.lineage().to_vec();
        lineage.push(source_id);
        target.assign(IdentityAssignment {
            lineage,
            ptm_set: new_set,
        });
        Some(target_id)
    }

    /// Resolves every accepted relation of `source` in id order.
    ///
    /// `adjacent` are positions in `relations`. Returns the identified experimentals.
    pub fn identify_connected(
        &self,
        identities: &[Identity],
        relations: &[Relation],
        adjacent: &[usize],
        source: IdentityId,
    ) -> Vec<IdentityId> {
        adjacent
            .iter()
            .filter_map(|&r| relations.get(r))
            .filter(|r| r.accepted)
            .filter_map(|r| self.resolve_relation(identities, r, source))
            .collect()
    }

    /// Identifies experimentals layer by layer starting from the theoreticals.
    ///
    /// Every layer's sources are resolved in parallel; experimentals first
    /// identified in a layer become the sources of the next one.
    pub fn resolve_families(&self, identities: &[Identity], relations: &[Relation]) -> ResolutionReport {
        let start = Instant::now();
        let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); identities.len()];
        for (i, r) in relations.iter().enumerate() {
            for end in [r.endpoints.0, r.endpoints.1] {
                if let Some(list) = adjacency.get_mut(end.index()) {
                    list.push(i);
                }
            }
        }

        let mut frontier: Vec<IdentityId> = identities
            .iter()
            .filter(|i| !i.is_experimental())
            .map(|i| i.id)
            .collect();
        let mut visited: HashSet<IdentityId> = frontier.iter().copied().collect();
        let mut layers = 0;
        while !frontier.is_empty() {
            let found: Vec<Vec<IdentityId>> = frontier
                .par_iter()
                .map(|&source| {
                    let adjacent = adjacency
                        .get(source.index())
                        .map(|v| v.as_slice())
                        .unwrap_or(&[]);
                    self.identify_connected(identities, relations, adjacent, source)
                })
                .collect();
            let mut next: Vec<IdentityId> = found
                .into_iter()
                .flatten()
                .filter(|id| visited.insert(*id))
                .collect();
            next.sort_unstable();
            debug!(
                "Resolution layer {}: {} sources identified {} new experimentals",
                layers,
                frontier.len(),
                next.len()
            );
            layers += 1;
            frontier = next;
        }

        let report = ResolutionReport {
            identified_experimentals: identities
                .iter()
                .filter(|i| i.is_experimental() && i.is_identified())
                .count(),
            resolved_relations: relations.iter().filter(|r| r.is_resolved()).count(),
            unresolved_relations: relations
                .iter()
                .filter(|r| r.accepted && !r.is_resolved())
                .count(),
            layers,
        };
        info!(
            "Identified {} experimentals over {} layers, {} relations resolved and {} unresolved, took {:#?}",
            report.identified_experimentals,
            report.layers,
            report.resolved_relations,
            report.unresolved_relations,
            start.elapsed()
        );
        report
    }
}
