use super::modification::PtmSet;
use serde::{
    Deserialize,
    Serialize,
};
use std::fmt::Display;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(pub u32);

impl IdentityId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl Display for IdentityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "I{}", self.0)
    }
}

/// Sequence context of a theoretical proteoform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TheoreticalInfo {
    pub sequence: String,
    /// One based position of the first residue in the parent protein.
    pub begin: u32,
    pub end: u32,
    /// Ids of modifications annotated on the parent protein.
    pub known_modifications: Vec<String>,
}

impl TheoreticalInfo {
    pub fn residue(&self, index: usize) -> Option<char> {
        self.sequence.chars().nth(index)
    }

    pub fn residue_from_end(&self, index: usize) -> Option<char> {
        self.sequence.chars().rev().nth(index)
    }

    pub fn len(&self) -> usize {
        self.sequence.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum IdentityKind {
    Experimental,
    Theoretical(TheoreticalInfo),
}

/// The identification reached for an identity, set exactly once.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentityAssignment {
    /// Identities traced to reach this one, starting at a theoretical.
    pub lineage: Vec<IdentityId>,
    pub ptm_set: PtmSet,
}

/// An experimental or theoretical proteoform taking part in relations.
#[derive(Debug, Serialize)]
pub struct Identity {
    pub id: IdentityId,
    pub accession: String,
    pub kind: IdentityKind,
    pub modified_mass: f64,
    pub lysine_count: Option<u32>,
    pub rt: Option<f64>,
    #[serde(serialize_with = "serialize_once")]
    assignment: OnceLock<IdentityAssignment>,
}

fn serialize_once<S, T>(cell: &OnceLock<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
    T: Serialize,
{
    cell.get().serialize(serializer)
}

impl Identity {
    pub fn experimental(
        id: IdentityId,
        accession: impl Into<String>,
        modified_mass: f64,
        lysine_count: Option<u32>,
        rt: f64,
    ) -> Self {
        Self {
            id,
            accession: accession.into(),
            kind: IdentityKind::Experimental,
            modified_mass,
            lysine_count,
            rt: Some(rt),
            assignment: OnceLock::new(),
        }
    }

    /// Theoretical identities are identified from the start, by their own modifications.
    pub fn theoretical(
        id: IdentityId,
        accession: impl Into<String>,
        modified_mass: f64,
        lysine_count: Option<u32>,
        info: TheoreticalInfo,
        ptm_set: PtmSet,
    ) -> Self {
        let assignment = OnceLock::new();
        let _ = assignment.set(IdentityAssignment {
            lineage: Vec::new(),
            ptm_set,
        });
        Self {
            id,
            accession: accession.into(),
            kind: IdentityKind::Theoretical(info),
            modified_mass,
            lysine_count,
            rt: None,
            assignment,
        }
    }

    pub fn is_experimental(&self) -> bool {
        matches!(self.kind, IdentityKind::Experimental)
    }

    pub fn theoretical_info(&self) -> Option<&TheoreticalInfo> {
        match &self.kind {
            IdentityKind::Theoretical(info) => Some(info),
            IdentityKind::Experimental => None,
        }
    }

    pub fn assignment(&self) -> Option<&IdentityAssignment> {
        self.assignment.get()
    }

    pub fn ptm_set(&self) -> Option<&PtmSet> {
        self.assignment.get().map(|a| &a.ptm_set)
    }

    pub fn lineage(&self) -> &[IdentityId] {
        self.assignment
            .get()
            .map(|a| a.lineage.as_slice())
            .unwrap_or(&[])
    }

    /// Records the identification unless one is already present.
    ///
    /// Returns whether this call was the one that set it.
    pub fn assign(&self, assignment: IdentityAssignment) -> bool {
        self.assignment.set(assignment).is_ok()
    }

    pub fn is_identified(&self) -> bool {
        self.assignment.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_assignment_wins() {
        let e = Identity::experimental(IdentityId(3), "E3", 10_000.0, None, 30.0);
        assert!(!e.is_identified());
        assert!(e.assign(IdentityAssignment {
            lineage: vec![IdentityId(0)],
            ptm_set: PtmSet::unmodified(),
        }));
        assert!(!e.assign(IdentityAssignment {
            lineage: vec![IdentityId(1)],
            ptm_set: PtmSet::unmodified(),
        }));
        assert_eq!(e.lineage(), &[IdentityId(0)]);
    }

    #[test]
    fn test_theoretical_starts_identified() {
        let info = TheoreticalInfo {
            sequence: "MKTAYIAK".into(),
            begin: 1,
            end: 8,
            known_modifications: vec![],
        };
        let t = Identity::theoretical(IdentityId(0), "P1", 900.0, Some(2), info, PtmSet::unmodified());
        assert!(t.is_identified());
        assert!(t.lineage().is_empty());
        assert_eq!(t.theoretical_info().and_then(|i| i.residue_from_end(0)), Some('K'));
    }
}
