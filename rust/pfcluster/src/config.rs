use crate::constants::{
    DEFAULT_EXCLUSION_RADIUS,
    ISOTOPE_PAIR_MAX_MASS_DIFFERENCE,
};
use crate::errors::ConfigError;
use crate::tolerance::MassTolerance;
use serde::{
    Deserialize,
    Serialize,
};

/// Whether the run used NeuCode lysine labels.
///
/// Labeled runs cluster isotope pairs and partition verification and
/// quantification members into light/heavy subsets. Unlabeled runs cluster
/// the raw components and keep everything in the light subsets.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Labeling {
    #[serde(rename = "neucode")]
    #[default]
    NeuCode,
    #[serde(rename = "unlabeled")]
    Unlabeled,
}

impl Labeling {
    pub fn is_labeled(&self) -> bool {
        matches!(self, Labeling::NeuCode)
    }
}

/// Inclusive `(low, high)` acceptance range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AcceptanceRange {
    pub low: f64,
    pub high: f64,
}

impl AcceptanceRange {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if !self.low.is_finite() || !self.high.is_finite() {
            return Err(ConfigError::NonFinite { field });
        }
        if self.low > self.high {
            return Err(ConfigError::InvertedRange {
                field,
                low: self.low,
                high: self.high,
            });
        }
        Ok(())
    }
}

/// Mass and retention time windows used when relating identities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RelationConfig {
    /// Largest |Δm| between two experimentals that still forms a relation.
    pub ee_max_mass_difference: f64,
    /// Largest |ΔRT| (minutes) between two experimentals that still forms a relation.
    pub ee_max_retention_time_difference: f64,
    /// Allowed experimental minus theoretical mass differences.
    pub et_mass_difference: AcceptanceRange,
}

impl Default for RelationConfig {
    fn default() -> Self {
        Self {
            ee_max_mass_difference: 300.0,
            ee_max_retention_time_difference: 2.5,
            et_mass_difference: AcceptanceRange::new(-300.0, 300.0),
        }
    }
}

/// Every tunable of an analysis run.
///
/// Example:
/// ```
/// use pfcluster::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert!(config.validate().is_ok());
/// assert_eq!(config.missed_monoisotopics, 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub labeling: Labeling,
    /// Upper bound (exclusive) on the mass difference of putative label partners.
    pub isotope_pair_window: f64,
    pub missed_monoisotopics: u32,
    pub missed_lysines: u32,
    pub mass_tolerance_ppm: f64,
    /// Minutes around the root's apex. `None` leaves retention time unrestricted.
    pub retention_time_tolerance: Option<f64>,
    pub min_relative_abundance: f64,
    pub min_charge_states: usize,
    pub intensity_ratio: AcceptanceRange,
    pub lysine_count: AcceptanceRange,
    pub exclusion_radius: f64,
    /// Number of clustering workers. `None` uses the available parallelism.
    pub concurrency: Option<usize>,
    pub two_pass_validation: bool,
    pub relations: RelationConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            labeling: Labeling::NeuCode,
            isotope_pair_window: ISOTOPE_PAIR_MAX_MASS_DIFFERENCE,
            missed_monoisotopics: 3,
            missed_lysines: 2,
            mass_tolerance_ppm: 5.0,
            retention_time_tolerance: Some(5.0),
            min_relative_abundance: 0.0,
            min_charge_states: 1,
            intensity_ratio: AcceptanceRange::new(1.4, 6.0),
            lysine_count: AcceptanceRange::new(1.5, 26.2),
            exclusion_radius: DEFAULT_EXCLUSION_RADIUS,
            concurrency: None,
            two_pass_validation: true,
            relations: RelationConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("isotope_pair_window", self.isotope_pair_window)?;
        positive("exclusion_radius", self.exclusion_radius)?;
        if !self.mass_tolerance_ppm.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "mass_tolerance_ppm",
            });
        }
        if self.mass_tolerance_ppm < 0.0 {
            return Err(ConfigError::NonPositive {
                field: "mass_tolerance_ppm",
                value: self.mass_tolerance_ppm,
            });
        }
        if let Some(rt) = self.retention_time_tolerance {
            positive("retention_time_tolerance", rt)?;
        }
        if !self.min_relative_abundance.is_finite() {
            return Err(ConfigError::NonFinite {
                field: "min_relative_abundance",
            });
        }
        self.intensity_ratio.validate("intensity_ratio")?;
        self.lysine_count.validate("lysine_count")?;
        self.relations
            .et_mass_difference
            .validate("relations.et_mass_difference")?;
        positive(
            "relations.ee_max_mass_difference",
            self.relations.ee_max_mass_difference,
        )?;
        positive(
            "relations.ee_max_retention_time_difference",
            self.relations.ee_max_retention_time_difference,
        )?;
        if self.concurrency == Some(0) {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }

    pub fn mass_tolerance(&self) -> MassTolerance {
        MassTolerance::new(self.mass_tolerance_ppm, self.missed_monoisotopics)
    }

    /// Number of workers a session should run with.
    pub fn worker_count(&self) -> usize {
        self.concurrency.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() {
        return Err(ConfigError::NonFinite { field });
    }
    if value <= 0.0 {
        return Err(ConfigError::NonPositive { field, value });
    }
    Ok(())
}
