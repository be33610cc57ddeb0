//! Record abstractions shared by the clustering passes.

use crate::models::{
    Component,
    IsotopePair,
    ProteoformCandidate,
    RecordRef,
};

/// Anything the mass-window scheduler can order and exclude by mass.
pub trait HasMass {
    fn mass(&self) -> f64;
}

impl<T: HasMass + ?Sized> HasMass for &T {
    fn mass(&self) -> f64 {
        (**self).mass()
    }
}

impl HasMass for f64 {
    fn mass(&self) -> f64 {
        *self
    }
}

/// A record that can seed or join a proteoform candidate during aggregation.
///
/// Implemented by raw [`Component`]s (unlabeled runs) and by [`IsotopePair`]s
/// (NeuCode labeled runs).
pub trait ClusterRecord: HasMass + Sync {
    fn record_ref(&self) -> RecordRef;
    fn intensity(&self) -> f64;
    fn rt_apex(&self) -> f64;
    fn lysine_count(&self) -> Option<u32>;
    /// Signed heavy minus light mass, for records that carry both partners.
    fn heavy_offset(&self) -> Option<f64>;
    fn is_accepted(&self) -> bool;
    fn relative_abundance(&self) -> f64;
    fn charge_state_count(&self) -> usize;
}

impl<T: ClusterRecord + ?Sized> ClusterRecord for &T {
    fn record_ref(&self) -> RecordRef {
        (**self).record_ref()
    }

    fn intensity(&self) -> f64 {
        (**self).intensity()
    }

    fn rt_apex(&self) -> f64 {
        (**self).rt_apex()
    }

    fn lysine_count(&self) -> Option<u32> {
        (**self).lysine_count()
    }

    fn heavy_offset(&self) -> Option<f64> {
        (**self).heavy_offset()
    }

    fn is_accepted(&self) -> bool {
        (**self).is_accepted()
    }

    fn relative_abundance(&self) -> f64 {
        (**self).relative_abundance()
    }

    fn charge_state_count(&self) -> usize {
        (**self).charge_state_count()
    }
}

impl HasMass for Component {
    fn mass(&self) -> f64 {
        self.weighted_monoisotopic_mass
    }
}

impl ClusterRecord for Component {
    fn record_ref(&self) -> RecordRef {
        RecordRef::Component(self.id)
    }

    fn intensity(&self) -> f64 {
        self.intensity_sum
    }

    fn rt_apex(&self) -> f64 {
        self.rt_apex
    }

    fn lysine_count(&self) -> Option<u32> {
        None
    }

    fn heavy_offset(&self) -> Option<f64> {
        None
    }

    fn is_accepted(&self) -> bool {
        self.accepted
    }

    fn relative_abundance(&self) -> f64 {
        self.relative_abundance
    }

    fn charge_state_count(&self) -> usize {
        self.num_charge_states()
    }
}

impl HasMass for IsotopePair {
    fn mass(&self) -> f64 {
        self.light_mass
    }
}

impl ClusterRecord for IsotopePair {
    fn record_ref(&self) -> RecordRef {
        RecordRef::Pair(self.id)
    }

    fn intensity(&self) -> f64 {
        self.light_intensity
    }

    fn rt_apex(&self) -> f64 {
        self.rt_apex
    }

    fn lysine_count(&self) -> Option<u32> {
        Some(self.lysine_count)
    }

    fn heavy_offset(&self) -> Option<f64> {
        Some(self.heavy_mass - self.light_mass)
    }

    fn is_accepted(&self) -> bool {
        self.accepted
    }

    fn relative_abundance(&self) -> f64 {
        self.relative_abundance
    }

    fn charge_state_count(&self) -> usize {
        self.shared_charges.len()
    }
}

impl HasMass for ProteoformCandidate {
    fn mass(&self) -> f64 {
        self.agg_mass
    }
}
