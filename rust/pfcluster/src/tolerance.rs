use crate::constants::MONOISOTOPIC_UNIT_MASS;
use serde::{
    Deserialize,
    Serialize,
};

/// Mass matching rule used by every clustering pass.
///
/// An observed mass matches a reference mass when it lies within `ppm` of
/// `reference + k * MONOISOTOPIC_UNIT_MASS` for some integer `k` in
/// `[-missed_monoisotopics, missed_monoisotopics]`. Deconvolution picks the
/// wrong isotope peak as monoisotopic often enough that a strict ppm window
/// would split one species into several clusters.
///
/// Example:
/// ```
/// use pfcluster::MassTolerance;
///
/// let tol = MassTolerance::new(5.0, 3);
/// assert!(tol.matches(10_002.0046, 10_000.0));
/// assert!(!tol.matches(10_000.5, 10_000.0));
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MassTolerance {
    pub ppm: f64,
    pub missed_monoisotopics: u32,
}

impl MassTolerance {
    pub fn new(ppm: f64, missed_monoisotopics: u32) -> Self {
        Self {
            ppm,
            missed_monoisotopics,
        }
    }

    /// Half-width in daltons of the ppm window around `mass`.
    pub fn ppm_window(&self, mass: f64) -> f64 {
        mass.abs() * self.ppm / 1e6
    }

    /// The isotope offset `k` under which `observed` matches `reference`, if any.
    ///
    /// The offset with the smallest residual wins, so an exact match returns `Some(0)`.
    pub fn matching_offset(&self, observed: f64, reference: f64) -> Option<i32> {
        if !observed.is_finite() || !reference.is_finite() {
            return None;
        }
        let missed = self.missed_monoisotopics as i32;
        let mut best: Option<(i32, f64)> = None;
        for k in -missed..=missed {
            let target = reference + k as f64 * MONOISOTOPIC_UNIT_MASS;
            let residual = (observed - target).abs();
            if residual <= self.ppm_window(target) {
                match best {
                    Some((_, r)) if r <= residual => {}
                    _ => best = Some((k, residual)),
                }
            }
        }
        best.map(|(k, _)| k)
    }

    pub fn matches(&self, observed: f64, reference: f64) -> bool {
        self.matching_offset(observed, reference).is_some()
    }

    /// Widest distance from `reference` at which a match is still possible.
    ///
    /// Useful to pre-filter mass-sorted collections before calling [`Self::matches`].
    pub fn max_reach(&self, reference: f64) -> f64 {
        let span = self.missed_monoisotopics as f64 * MONOISOTOPIC_UNIT_MASS;
        span + self.ppm_window(reference.abs() + span)
    }
}

/// Optional retention time restriction, in minutes around a reference apex.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RtTolerance {
    Minutes(f64),
    #[default]
    Unrestricted,
}

impl RtTolerance {
    pub fn from_option(minutes: Option<f64>) -> Self {
        match minutes {
            Some(x) => Self::Minutes(x),
            None => Self::Unrestricted,
        }
    }

    pub fn matches(&self, observed: f64, reference: f64) -> bool {
        match self {
            Self::Minutes(tol) => (observed - reference).abs() <= *tol,
            Self::Unrestricted => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_mass_matches_without_offset() {
        let tol = MassTolerance::new(5.0, 3);
        assert_eq!(tol.matching_offset(12_345.6, 12_345.6), Some(0));
    }

    #[test]
    fn test_missed_monoisotopic_offsets() {
        let tol = MassTolerance::new(5.0, 2);
        let reference = 20_000.0;
        assert_eq!(
            tol.matching_offset(reference + 2.0 * MONOISOTOPIC_UNIT_MASS, reference),
            Some(2)
        );
        assert_eq!(
            tol.matching_offset(reference - MONOISOTOPIC_UNIT_MASS, reference),
            Some(-1)
        );
        // Three offsets away is outside the allowed two.
        assert_eq!(
            tol.matching_offset(reference + 3.0 * MONOISOTOPIC_UNIT_MASS, reference),
            None
        );
    }

    #[test]
    fn test_ppm_window_bounds() {
        let tol = MassTolerance::new(10.0, 0);
        // 10 ppm of 10 kDa is 0.1 Da.
        assert!(tol.matches(10_000.09, 10_000.0));
        assert!(!tol.matches(10_000.11, 10_000.0));
    }

    #[test]
    fn test_non_finite_never_matches() {
        let tol = MassTolerance::new(5.0, 3);
        assert!(!tol.matches(f64::NAN, 100.0));
        assert!(!tol.matches(100.0, f64::INFINITY));
    }

    #[test]
    fn test_max_reach_covers_matches() {
        let tol = MassTolerance::new(5.0, 3);
        let reference = 50_000.0;
        let observed = reference + 3.0 * MONOISOTOPIC_UNIT_MASS + tol.ppm_window(reference) * 0.9;
        assert!(tol.matches(observed, reference));
        assert!((observed - reference).abs() <= tol.max_reach(reference));
    }

    #[test]
    fn test_rt_tolerance() {
        assert!(RtTolerance::Unrestricted.matches(1000.0, 0.0));
        let rt = RtTolerance::from_option(Some(2.0));
        assert!(rt.matches(11.5, 10.0));
        assert!(!rt.matches(12.5, 10.0));
    }
}
