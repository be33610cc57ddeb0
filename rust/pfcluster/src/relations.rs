use crate::catalog::PtmCatalog;
use crate::config::EngineConfig;
use crate::models::{
    Identity,
    IdentityId,
    ProteoformCandidate,
    Relation,
    RelationId,
    RelationKind,
};
use rayon::prelude::*;
use std::time::Instant;
use tracing::info;

/// Experimental identities for vetted candidates, numbered from `first_id`.
pub fn experimental_identities(candidates: &[ProteoformCandidate], first_id: u32) -> Vec<Identity> {
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| {
            Identity::experimental(
                IdentityId(first_id + i as u32),
                c.accession.clone(),
                c.agg_mass,
                c.lysine_count,
                c.agg_rt,
            )
        })
        .collect()
}

fn lysines_match(labeled: bool, a: &Identity, b: &Identity) -> bool {
    if !labeled {
        return true;
    }
    matches!((a.lysine_count, b.lysine_count), (Some(x), Some(y)) if x == y)
}

struct Draft {
    kind: RelationKind,
    endpoints: (IdentityId, IdentityId),
    delta_mass: f64,
    rt_difference: Option<f64>,
}

/// Relates every experimental to the theoreticals and experimentals around it.
///
/// Experimental-theoretical relations keep `experimental - theoretical` as
/// their delta. Experimental-experimental relations keep the absolute
/// difference and list the lower numbered identity first. In labeled runs both
/// ends must carry the same lysine count. Ids follow the position in the
/// returned list: every experimental-theoretical relation first.
pub fn build_relations(identities: &[Identity], catalog: &PtmCatalog, config: &EngineConfig) -> Vec<Relation> {
    let start = Instant::now();
    let labeled = config.labeling.is_labeled();
    let windows = &config.relations;
    let experimentals: Vec<&Identity> = identities
        .iter()
        .filter(|i| i.is_experimental() && i.modified_mass.is_finite())
        .collect();
    let theoreticals: Vec<&Identity> = identities
        .iter()
        .filter(|i| !i.is_experimental() && i.modified_mass.is_finite())
        .collect();

    let et: Vec<Draft> = experimentals
        .par_iter()
        .flat_map_iter(|e| {
            theoreticals.iter().filter_map(move |t| {
                let delta = e.modified_mass - t.modified_mass;
                if windows.et_mass_difference.contains(delta) && lysines_match(labeled, e, t) {
                    Some(Draft {
                        kind: RelationKind::ExperimentalTheoretical,
                        endpoints: (e.id, t.id),
                        delta_mass: delta,
                        rt_difference: None,
                    })
                } else {
                    None
                }
            })
        })
        .collect();

    let experimentals = &experimentals;
    let ee: Vec<Draft> = (0..experimentals.len())
        .into_par_iter()
        .flat_map_iter(|i| {
            let a = experimentals[i];
            experimentals[i + 1..].iter().filter_map(move |b| {
                let delta = (a.modified_mass - b.modified_mass).abs();
                let rt_difference = match (a.rt, b.rt) {
                    (Some(x), Some(y)) => Some((x - y).abs()),
                    _ => None,
                };
                let rt_ok = rt_difference
                    .is_none_or(|d| d <= windows.ee_max_retention_time_difference);
                if delta <= windows.ee_max_mass_difference && rt_ok && lysines_match(labeled, a, b) {
                    Some(Draft {
                        kind: RelationKind::ExperimentalExperimental,
                        endpoints: (a.id, b.id),
                        delta_mass: delta,
                        rt_difference,
                    })
                } else {
                    None
                }
            })
        })
        .collect();

    let (n_et, n_ee) = (et.len(), ee.len());
    let relations: Vec<Relation> = et
        .into_iter()
        .chain(ee)
        .enumerate()
        .map(|(i, d)| {
            Relation::new(
                RelationId(i as u32),
                d.kind,
                d.endpoints,
                d.delta_mass,
                d.rt_difference,
                catalog.candidates_near(d.delta_mass).to_vec(),
            )
        })
        .collect();
    info!(
        "Built {} experimental-theoretical and {} experimental-experimental relations in {:#?}",
        n_et,
        n_ee,
        start.elapsed()
    );
    relations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{
        CatalogInput,
        TheoreticalEntry,
    };
    use crate::config::Labeling;
    use crate::models::Modification;

    fn catalog() -> PtmCatalog {
        let input = CatalogInput {
            modifications: vec![Modification::new("Acetylation", 42.010565)],
            ..Default::default()
        };
        PtmCatalog::build(&input, &[]).unwrap()
    }

    fn theoretical(id: u32, mass: f64, lysines: u32) -> Identity {
        catalog()
            .theoretical_identity(
                IdentityId(id),
                &TheoreticalEntry {
                    accession: format!("T{}", id),
                    sequence: "MAK".into(),
                    begin: 1,
                    end: 3,
                    modified_mass: mass,
                    lysine_count: Some(lysines),
                    ptms: vec![],
                    known_modifications: vec![],
                },
            )
            .unwrap()
    }

    #[test]
    fn test_relation_windows() {
        let config = EngineConfig::default();
        let identities = vec![
            theoretical(0, 10_000.0, 4),
            Identity::experimental(IdentityId(1), "E0", 10_042.01, Some(4), 30.0),
            Identity::experimental(IdentityId(2), "E1", 10_000.0, Some(4), 31.0),
            // Wrong lysine count for any relation.
            Identity::experimental(IdentityId(3), "E2", 10_001.0, Some(5), 30.0),
            // Outside the retention time window of the others.
            Identity::experimental(IdentityId(4), "E3", 10_010.0, Some(4), 50.0),
        ];
        let relations = build_relations(&identities, &catalog(), &config);
        let et: Vec<&Relation> = relations
            .iter()
            .filter(|r| r.kind == RelationKind::ExperimentalTheoretical)
            .collect();
        let ee: Vec<&Relation> = relations
            .iter()
            .filter(|r| r.kind == RelationKind::ExperimentalExperimental)
            .collect();
        assert_eq!(et.len(), 3);
        assert_eq!(ee.len(), 1);
        assert_eq!(ee[0].endpoints, (IdentityId(1), IdentityId(2)));
        assert!((ee[0].delta_mass - 42.01).abs() < 1e-9);
        assert!(ee[0].candidate_sets.iter().any(|s| s.ptms[0].id == "Acetylation"));
        assert_eq!(relations[0].id, RelationId(0));
    }

    #[test]
    fn test_unlabeled_ignores_lysines() {
        let config = EngineConfig {
            labeling: Labeling::Unlabeled,
            ..Default::default()
        };
        let identities = vec![
            theoretical(0, 10_000.0, 4),
            Identity::experimental(IdentityId(1), "E0", 10_001.0, Some(5), 30.0),
        ];
        assert_eq!(build_relations(&identities, &catalog(), &config).len(), 1);
    }
}
