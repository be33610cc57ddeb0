use serde::{
    Deserialize,
    Serialize,
};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ModificationKind {
    /// A residue missing from a terminus (degradation or cleavage).
    #[serde(rename = "missing")]
    Missing,
    /// A residue present beyond the annotated sequence (methionine retention).
    #[serde(rename = "amino_acid")]
    AminoAcid,
    #[serde(rename = "other")]
    #[default]
    Other,
}

/// A named modification from the theoretical catalog.
///
/// Two modifications are the same when their ids are.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Modification {
    pub id: String,
    pub monoisotopic_mass: f64,
    #[serde(default)]
    pub kind: ModificationKind,
    /// Residue the modification applies to, if motif restricted.
    #[serde(default)]
    pub motif: Option<char>,
    /// How many modifications this entry stands for when counting the size of a set.
    #[serde(default = "default_ptm_count")]
    pub ptm_count: u32,
    /// Explicit rank overriding the mass-derived rank table.
    #[serde(default)]
    pub rank: Option<i32>,
    /// Only acceptable as the sole member of a set.
    #[serde(default)]
    pub require_proteoform_without_mod: bool,
}

fn default_ptm_count() -> u32 {
    1
}

impl PartialEq for Modification {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Modification {}

impl Modification {
    pub fn new(id: impl Into<String>, monoisotopic_mass: f64) -> Self {
        Self {
            id: id.into(),
            monoisotopic_mass,
            kind: ModificationKind::Other,
            motif: None,
            ptm_count: 1,
            rank: None,
            require_proteoform_without_mod: false,
        }
    }

    pub fn with_kind(mut self, kind: ModificationKind, motif: char) -> Self {
        self.kind = kind;
        self.motif = Some(motif);
        self
    }

    pub fn motif_is(&self, residue: Option<char>) -> bool {
        match (self.motif, residue) {
            (Some(m), Some(r)) => m.eq_ignore_ascii_case(&r),
            _ => false,
        }
    }
}

/// An ordered multiset of modifications with its combined mass and rank.
///
/// Lower `rank_sum` is more likely.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PtmSet {
    pub ptms: Vec<Arc<Modification>>,
    pub mass: f64,
    pub rank_sum: i32,
}

impl PtmSet {
    pub fn new(ptms: Vec<Arc<Modification>>, rank_sum: i32) -> Self {
        let mass = ptms.iter().map(|m| m.monoisotopic_mass).sum();
        Self {
            ptms,
            mass,
            rank_sum,
        }
    }

    pub fn unmodified() -> Self {
        Self::new(Vec::new(), 0)
    }

    pub fn len(&self) -> usize {
        self.ptms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ptms.is_empty()
    }

    pub fn contains(&self, modification: &Modification) -> bool {
        self.ptms.iter().any(|m| m.as_ref() == modification)
    }

    pub fn has_zero_mass_member(&self) -> bool {
        self.ptms.iter().any(|m| m.monoisotopic_mass == 0.0)
    }

    /// Human readable listing, `"Unmodified"` for the empty set.
    pub fn description(&self) -> String {
        if self.ptms.is_empty() {
            return "Unmodified".to_string();
        }
        self.ptms
            .iter()
            .map(|m| m.id.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// This set plus every member of `other` that carries mass.
    pub fn with_added(&self, other: &PtmSet) -> PtmSet {
        let ptms = self
            .ptms
            .iter()
            .chain(other.ptms.iter().filter(|m| m.monoisotopic_mass != 0.0))
            .cloned()
            .collect();
        PtmSet::new(ptms, 0)
    }

    /// This set with one instance of every member of `other` removed.
    pub fn with_removed(&self, other: &PtmSet) -> PtmSet {
        let mut ptms = self.ptms.clone();
        for m in other.ptms.iter() {
            if let Some(pos) = ptms.iter().position(|x| x == m) {
                ptms.remove(pos);
            }
        }
        PtmSet::new(ptms, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn acetyl() -> Arc<Modification> {
        Arc::new(Modification::new("Acetylation", 42.010565))
    }

    fn phospho() -> Arc<Modification> {
        Arc::new(Modification::new("Phosphorylation", 79.966331))
    }

    #[test]
    fn test_mass_is_sum_of_members() {
        let set = PtmSet::new(vec![acetyl(), phospho(), phospho()], 0);
        assert!((set.mass - (42.010565 + 2.0 * 79.966331)).abs() < 1e-9);
        assert_eq!(set.description(), "Acetylation; Phosphorylation; Phosphorylation");
        assert_eq!(PtmSet::unmodified().description(), "Unmodified");
    }

    #[test]
    fn test_remove_one_instance() {
        let set = PtmSet::new(vec![acetyl(), phospho(), phospho()], 0);
        let loss = PtmSet::new(vec![phospho()], 0);
        let left = set.with_removed(&loss);
        assert_eq!(left.len(), 2);
        assert!(left.contains(&phospho()));
        assert!(left.contains(&acetyl()));
    }

    #[test]
    fn test_add_skips_zero_mass() {
        let none = Arc::new(Modification::new("Unmodified", 0.0));
        let set = PtmSet::new(vec![acetyl()], 0);
        let added = set.with_added(&PtmSet::new(vec![none, phospho()], 0));
        assert_eq!(added.len(), 2);
        assert!(!added.has_zero_mass_member());
    }
}
