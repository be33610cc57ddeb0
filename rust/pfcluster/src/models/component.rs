use crate::constants::MONOISOTOPIC_UNIT_MASS;
use serde::{
    Deserialize,
    Serialize,
};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ComponentId(pub u32);

impl ComponentId {
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "C{}", self.0)
    }
}

/// The experimental purpose of the file a component was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Purpose {
    #[serde(rename = "identification")]
    #[default]
    Identification,
    #[serde(rename = "quantification")]
    Quantification,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChargeState {
    pub charge: u8,
    pub intensity: f64,
    #[serde(default)]
    pub mz_centroid: f64,
}

/// Inclusive range of scan numbers, written as `"first-last"`.
///
/// Anything that does not parse as two integers separated by `-` becomes
/// `0-0`, which downstream code treats as "no scans".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ScanRange {
    pub first: u32,
    pub last: u32,
}

impl ScanRange {
    pub fn new(first: u32, last: u32) -> Self {
        Self { first, last }
    }

    /// Both ends are real (one based) scan numbers.
    pub fn is_valid(&self) -> bool {
        self.first > 0 && self.last > 0
    }

    pub fn contains(&self, scan: u32) -> bool {
        scan >= self.first && scan <= self.last
    }
}

impl FromStr for ScanRange {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.trim().splitn(2, '-');
        let first = parts.next().unwrap_or_default().trim().parse()?;
        let last = parts.next().unwrap_or_default().trim().parse()?;
        Ok(Self { first, last })
    }
}

impl From<String> for ScanRange {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_default()
    }
}

impl From<ScanRange> for String {
    fn from(value: ScanRange) -> Self {
        value.to_string()
    }
}

impl Display for ScanRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.first, self.last)
    }
}

/// One deconvoluted species observed in a scan range of an input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    /// Assigned by the [`crate::RecordStore`]; any value in the input is overwritten.
    #[serde(default)]
    pub id: ComponentId,
    pub input_file: String,
    #[serde(default)]
    pub purpose: Purpose,
    pub scan_range: ScanRange,
    #[serde(default)]
    pub rt_range: (f64, f64),
    #[serde(default)]
    pub rt_apex: f64,
    pub weighted_monoisotopic_mass: f64,
    pub intensity_sum: f64,
    #[serde(default)]
    pub relative_abundance: f64,
    pub charge_states: Vec<ChargeState>,
    #[serde(default = "default_accepted")]
    pub accepted: bool,
    /// Whole isotope peaks added by a manual mass correction.
    #[serde(default)]
    pub manual_mass_shift: i32,
}

fn default_accepted() -> bool {
    true
}

impl Component {
    /// Number of distinct charge states.
    pub fn num_charge_states(&self) -> usize {
        let mut charges: Vec<u8> = self.charge_states.iter().map(|cs| cs.charge).collect();
        charges.sort_unstable();
        charges.dedup();
        charges.len()
    }

    pub fn charges(&self) -> Vec<u8> {
        let mut charges: Vec<u8> = self.charge_states.iter().map(|cs| cs.charge).collect();
        charges.sort_unstable();
        charges.dedup();
        charges
    }

    /// Summed intensity over the charge states listed in `charges`.
    pub fn intensity_over(&self, charges: &[u8]) -> f64 {
        self.charge_states
            .iter()
            .filter(|cs| charges.contains(&cs.charge))
            .map(|cs| cs.intensity)
            .sum()
    }

    /// Moves the mass by whole isotope spacings, keeping track of the total shift.
    pub fn shift_mass(&mut self, shift: i32) {
        self.weighted_monoisotopic_mass += shift as f64 * MONOISOTOPIC_UNIT_MASS;
        self.manual_mass_shift += shift;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn component(mass: f64, intensity: f64, charges: &[(u8, f64)]) -> Component {
        Component {
            id: ComponentId(0),
            input_file: "file_a".into(),
            purpose: Purpose::Identification,
            scan_range: ScanRange::new(1, 10),
            rt_range: (10.0, 12.0),
            rt_apex: 11.0,
            weighted_monoisotopic_mass: mass,
            intensity_sum: intensity,
            relative_abundance: 1.0,
            charge_states: charges
                .iter()
                .map(|&(charge, intensity)| ChargeState {
                    charge,
                    intensity,
                    mz_centroid: 0.0,
                })
                .collect(),
            accepted: true,
            manual_mass_shift: 0,
        }
    }

    #[test]
    fn test_scan_range_parsing() {
        assert_eq!("12-40".parse::<ScanRange>(), Ok(ScanRange::new(12, 40)));
        assert!("12".parse::<ScanRange>().is_err());
        assert_eq!(ScanRange::from("garbage".to_string()), ScanRange::new(0, 0));
        assert!(!ScanRange::from("a-b".to_string()).is_valid());
        assert_eq!(ScanRange::new(3, 7).to_string(), "3-7");
    }

    #[test]
    fn test_scan_range_serde_as_string() {
        let json = serde_json::to_string(&ScanRange::new(5, 9)).unwrap();
        assert_eq!(json, "\"5-9\"");
        let back: ScanRange = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ScanRange::new(5, 9));
    }

    #[test]
    fn test_intensity_over_shared_charges() {
        let c = component(1000.0, 60.0, &[(5, 10.0), (6, 20.0), (7, 30.0)]);
        assert_eq!(c.intensity_over(&[6, 7]), 50.0);
        assert_eq!(c.intensity_over(&[9]), 0.0);
        assert_eq!(c.num_charge_states(), 3);
    }

    #[test]
    fn test_manual_shift() {
        let mut c = component(1000.0, 1.0, &[(5, 1.0)]);
        c.shift_mass(-2);
        assert!((c.weighted_monoisotopic_mass - (1000.0 - 2.0 * MONOISOTOPIC_UNIT_MASS)).abs() < 1e-9);
        assert_eq!(c.manual_mass_shift, -2);
    }
}
