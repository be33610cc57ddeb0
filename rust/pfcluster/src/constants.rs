//! Mass constants shared by the pairing and clustering passes.

/// Spacing between consecutive isotopic peaks of an intact protein.
pub const MONOISOTOPIC_UNIT_MASS: f64 = 1.0023;

/// Mass difference between the NeuCode light and heavy lysine labels.
pub const NEUCODE_LYSINE_MASS_SHIFT: f64 = 0.036015372;

/// Isotope spacing used to strip whole-dalton offsets before counting lysines.
pub const LYSINE_COUNT_ISOTOPE_SPACING: f64 = 1.0015;

/// Two components further apart than this are never considered label partners.
pub const ISOTOPE_PAIR_MAX_MASS_DIFFERENCE: f64 = 6.0;

/// Half-width of the mass window around an active root inside which no other
/// root may be issued.
pub const DEFAULT_EXCLUSION_RADIUS: f64 = 20.0;
