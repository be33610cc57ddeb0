use super::component::ComponentId;
use crate::constants::NEUCODE_LYSINE_MASS_SHIFT;
use super::isotope_pair::{
    IsotopePair,
    PairId,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::fmt::Display;

/// Reference to a record a candidate can be rooted at or aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id")]
pub enum RecordRef {
    #[serde(rename = "component")]
    Component(ComponentId),
    #[serde(rename = "pair")]
    Pair(PairId),
}

impl Display for RecordRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Component(x) => write!(f, "{}", x),
            Self::Pair(x) => write!(f, "{}", x),
        }
    }
}

/// A cluster of records believed to represent one proteoform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProteoformCandidate {
    pub accession: String,
    pub root: RecordRef,
    /// Aggregated records, root first.
    pub members: Vec<RecordRef>,
    pub agg_mass: f64,
    pub agg_intensity: f64,
    pub agg_rt: f64,
    /// Lysine count of the root pair, labeled runs only.
    pub lysine_count: Option<u32>,
    /// Heavy minus light mass of the root pair. Negative when the light
    /// partner is the heavier component.
    #[serde(default)]
    pub heavy_offset: Option<f64>,
    pub lt_verification: Vec<ComponentId>,
    pub hv_verification: Vec<ComponentId>,
    pub lt_quant: Vec<ComponentId>,
    pub hv_quant: Vec<ComponentId>,
    pub accepted: bool,
}

impl ProteoformCandidate {
    pub fn accession_for(index: usize) -> String {
        format!("E{}", index)
    }

    /// Every component behind the aggregated members, pairs expanded to both partners.
    pub fn member_components(&self, pairs: &[IsotopePair]) -> Vec<ComponentId> {
        let mut out = Vec::with_capacity(self.members.len() * 2);
        for member in self.members.iter() {
            match member {
                RecordRef::Component(c) => out.push(*c),
                RecordRef::Pair(p) => {
                    if let Some(pair) = pairs.get(p.index()) {
                        out.extend(pair.members());
                    }
                }
            }
        }
        out
    }

    /// Mass at which the heavy partner of this proteoform is expected.
    ///
    /// Follows the root pair's own offset; without one, one label shift per lysine.
    pub fn heavy_reference_mass(&self) -> Option<f64> {
        match (self.heavy_offset, self.lysine_count) {
            (Some(offset), _) => Some(self.agg_mass + offset),
            (None, Some(k)) => Some(self.agg_mass + k as f64 * NEUCODE_LYSINE_MASS_SHIFT),
            (None, None) => None,
        }
    }

    pub(crate) fn clear_verification(&mut self) {
        self.lt_verification.clear();
        self.hv_verification.clear();
    }

    pub(crate) fn clear_quantification(&mut self) {
        self.lt_quant.clear();
        self.hv_quant.clear();
    }
}
