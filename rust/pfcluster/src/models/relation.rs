use super::identity::IdentityId;
use super::modification::PtmSet;
use serde::Serialize;
use std::sync::{
    Arc,
    OnceLock,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RelationId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RelationKind {
    #[serde(rename = "experimental_experimental")]
    ExperimentalExperimental,
    #[serde(rename = "experimental_theoretical")]
    ExperimentalTheoretical,
}

/// The modification change explaining a relation's mass difference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PtmChange {
    Unmodified,
    Addition(PtmSet),
    Loss(PtmSet),
}

impl PtmChange {
    pub fn ptm_set(&self) -> Option<&PtmSet> {
        match self {
            Self::Unmodified => None,
            Self::Addition(x) | Self::Loss(x) => Some(x),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationAssignment {
    pub change: PtmChange,
    /// Mass difference oriented from the resolving source to the target.
    pub signed_delta_mass: f64,
}

/// An observed mass difference between two identities.
#[derive(Debug, Serialize)]
pub struct Relation {
    pub id: RelationId,
    pub kind: RelationKind,
    /// For experimental-theoretical relations the theoretical comes second.
    pub endpoints: (IdentityId, IdentityId),
    /// Experimental minus theoretical mass, or the absolute difference between two experimentals.
    pub delta_mass: f64,
    pub rt_difference: Option<f64>,
    /// Catalog sets whose mass lies around `delta_mass`.
    #[serde(skip)]
    pub candidate_sets: Vec<Arc<PtmSet>>,
    pub accepted: bool,
    #[serde(serialize_with = "serialize_assignment")]
    assignment: OnceLock<RelationAssignment>,
}

fn serialize_assignment<S>(
    cell: &OnceLock<RelationAssignment>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    cell.get().serialize(serializer)
}

impl Relation {
    pub fn new(
        id: RelationId,
        kind: RelationKind,
        endpoints: (IdentityId, IdentityId),
        delta_mass: f64,
        rt_difference: Option<f64>,
        candidate_sets: Vec<Arc<PtmSet>>,
    ) -> Self {
        Self {
            id,
            kind,
            endpoints,
            delta_mass,
            rt_difference,
            candidate_sets,
            accepted: true,
            assignment: OnceLock::new(),
        }
    }

    /// The endpoint that is not `id`, if `id` is one of them.
    pub fn other(&self, id: IdentityId) -> Option<IdentityId> {
        match self.endpoints {
            (a, b) if a == id => Some(b),
            (a, b) if b == id => Some(a),
            _ => None,
        }
    }

    pub fn assignment(&self) -> Option<&RelationAssignment> {
        self.assignment.get()
    }

    pub fn is_resolved(&self) -> bool {
        self.assignment.get().is_some()
    }

    /// First resolution wins; later calls are ignored and return `false`.
    pub fn assign(&self, assignment: RelationAssignment) -> bool {
        self.assignment.set(assignment).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_assignment_set_once() {
        let r = Relation::new(
            RelationId(0),
            RelationKind::ExperimentalExperimental,
            (IdentityId(0), IdentityId(1)),
            42.01,
            Some(0.2),
            vec![],
        );
        assert_eq!(r.other(IdentityId(1)), Some(IdentityId(0)));
        assert_eq!(r.other(IdentityId(5)), None);
        assert!(r.assign(RelationAssignment {
            change: PtmChange::Unmodified,
            signed_delta_mass: 42.01,
        }));
        assert!(!r.assign(RelationAssignment {
            change: PtmChange::Unmodified,
            signed_delta_mass: -42.01,
        }));
        assert_eq!(r.assignment().map(|a| a.signed_delta_mass), Some(42.01));
    }
}
