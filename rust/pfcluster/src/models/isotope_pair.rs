use super::component::{
    Component,
    ComponentId,
};
use crate::constants::{
    LYSINE_COUNT_ISOTOPE_SPACING,
    NEUCODE_LYSINE_MASS_SHIFT,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairId(pub u32);

impl PairId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl Display for PairId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Two components of one scan range believed to be the light and heavy
/// NeuCode labeled forms of the same species.
///
/// The light partner is the one with the larger intensity over the shared
/// charge states, so `intensity_ratio >= 1` always holds. It is not
/// necessarily the lower mass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsotopePair {
    pub id: PairId,
    pub light: ComponentId,
    pub heavy: ComponentId,
    /// Higher minus lower mass of the two partners.
    pub mass_difference: f64,
    pub shared_charges: Vec<u8>,
    pub light_mass: f64,
    pub heavy_mass: f64,
    /// Intensity of each partner summed over the shared charge states only.
    pub light_intensity: f64,
    pub heavy_intensity: f64,
    pub intensity_ratio: f64,
    pub lysine_count: u32,
    pub rt_apex: f64,
    pub relative_abundance: f64,
    pub accepted: bool,
}

impl IsotopePair {
    /// Builds the pair, deciding which partner is light.
    ///
    /// Returns `None` when the two share no charge state or when either side
    /// has no intensity over the shared charges.
    pub fn from_partners(a: &Component, b: &Component) -> Option<Self> {
        let (lower, higher) = if a.weighted_monoisotopic_mass <= b.weighted_monoisotopic_mass {
            (a, b)
        } else {
            (b, a)
        };
        let higher_charges = higher.charges();
        let shared: Vec<u8> = lower
            .charges()
            .into_iter()
            .filter(|c| higher_charges.contains(c))
            .collect();
        if shared.is_empty() {
            return None;
        }

        let lower_intensity = lower.intensity_over(&shared);
        let higher_intensity = higher.intensity_over(&shared);
        if !(lower_intensity > 0.0 && higher_intensity > 0.0) {
            return None;
        }

        let light_is_lower = lower_intensity > higher_intensity;
        let (light, heavy, light_intensity, heavy_intensity) = if light_is_lower {
            (lower, higher, lower_intensity, higher_intensity)
        } else {
            (higher, lower, higher_intensity, lower_intensity)
        };
        let mass_difference = higher.weighted_monoisotopic_mass - lower.weighted_monoisotopic_mass;

        Some(Self {
            id: PairId(0),
            light: light.id,
            heavy: heavy.id,
            mass_difference,
            shared_charges: shared,
            light_mass: light.weighted_monoisotopic_mass,
            heavy_mass: heavy.weighted_monoisotopic_mass,
            light_intensity,
            heavy_intensity,
            intensity_ratio: light_intensity / heavy_intensity,
            lysine_count: lysine_count(
                light.weighted_monoisotopic_mass,
                heavy.weighted_monoisotopic_mass,
                mass_difference,
                light_is_lower,
            ),
            rt_apex: light.rt_apex,
            relative_abundance: light.relative_abundance,
            accepted: false,
        })
    }

    pub fn lower_mass(&self) -> f64 {
        self.light_mass.min(self.heavy_mass)
    }

    pub fn higher_mass(&self) -> f64 {
        self.light_mass.max(self.heavy_mass)
    }

    pub fn members(&self) -> [ComponentId; 2] {
        [self.light, self.heavy]
    }
}

/// Number of labeled lysines implied by the mass difference of a pair.
///
/// Whole isotope spacings are stripped from the difference first, the
/// remainder is then a multiple of the light/heavy label shift.
pub fn lysine_count(light_mass: f64, heavy_mass: f64, mass_difference: f64, light_is_lower: bool) -> u32 {
    let isotope_offsets = (mass_difference / LYSINE_COUNT_ISOTOPE_SPACING).round();
    let first_correction = if light_is_lower {
        light_mass + isotope_offsets * LYSINE_COUNT_ISOTOPE_SPACING
    } else {
        light_mass - isotope_offsets * LYSINE_COUNT_ISOTOPE_SPACING
    };
    ((heavy_mass - first_correction) / NEUCODE_LYSINE_MASS_SHIFT)
        .round()
        .abs() as u32
}
