//! Per-scan mass correction factors produced by an upstream calibration.

use crate::models::ScanRange;
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub file_name: String,
    pub scan_number: u32,
    /// `NaN` when the calibration could not determine a value for this scan.
    pub correction: f64,
}

/// Correction factors of every file, sorted by scan and fully defined.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrectionTable {
    by_file: HashMap<String, Vec<(u32, f64)>>,
}

impl CorrectionTable {
    pub fn new(corrections: impl IntoIterator<Item = Correction>) -> Self {
        let mut by_file: HashMap<String, Vec<(u32, f64)>> = HashMap::new();
        for c in corrections {
            by_file
                .entry(c.file_name)
                .or_default()
                .push((c.scan_number, c.correction));
        }
        for factors in by_file.values_mut() {
            factors.sort_by_key(|(scan, _)| *scan);
            let mut values: Vec<f64> = factors.iter().map(|(_, v)| *v).collect();
            interpolate_corrections(&mut values);
            for (slot, value) in factors.iter_mut().zip(values) {
                slot.1 = value;
            }
        }
        Self { by_file }
    }

    pub fn is_empty(&self) -> bool {
        self.by_file.values().all(|v| v.is_empty())
    }

    /// Mean correction of `file` over `scan_range`.
    ///
    /// Zero when the range is not a real scan range or no factor falls inside it.
    pub fn correction_for(&self, file: &str, scan_range: &ScanRange) -> f64 {
        if !scan_range.is_valid() {
            return 0.0;
        }
        let Some(factors) = self.by_file.get(file) else {
            return 0.0;
        };
        let (sum, count) = factors
            .iter()
            .filter(|(scan, _)| scan_range.contains(*scan))
            .fold((0.0, 0usize), |(s, n), (_, v)| (s + v, n + 1));
        if count == 0 {
            return 0.0;
        }
        sum / count as f64
    }
}

/// Fills undefined (`NaN`) factors in a scan ordered list.
///
/// Leading gaps take the first defined value, interior gaps the mean of the
/// defined values on either side and trailing gaps the last defined value.
/// A list without any defined value becomes all zeros.
pub fn interpolate_corrections(values: &mut [f64]) {
    let mut recent: Option<f64> = None;
    let mut pending: Vec<usize> = Vec::new();
    for i in 0..values.len() {
        let v = values[i];
        if v.is_nan() {
            pending.push(i);
            continue;
        }
        let fill = match recent {
            None => v,
            Some(prev) => (prev + v) / 2.0,
        };
        for &j in pending.iter() {
            values[j] = fill;
        }
        pending.clear();
        recent = Some(v);
    }
    let tail = recent.unwrap_or(0.0);
    for &j in pending.iter() {
        values[j] = tail;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolation_fills_head_gaps_and_tail() {
        let mut values = vec![f64::NAN, 2.0, f64::NAN, f64::NAN, 4.0, f64::NAN];
        interpolate_corrections(&mut values);
        assert_eq!(values, vec![2.0, 2.0, 3.0, 3.0, 4.0, 4.0]);
    }

    #[test]
    fn test_interpolation_all_undefined() {
        let mut values = vec![f64::NAN, f64::NAN];
        interpolate_corrections(&mut values);
        assert_eq!(values, vec![0.0, 0.0]);
    }

    #[test]
    fn test_correction_for_scan_range() {
        let table = CorrectionTable::new(vec![
            Correction {
                file_name: "a".into(),
                scan_number: 3,
                correction: f64::NAN,
            },
            Correction {
                file_name: "a".into(),
                scan_number: 1,
                correction: 0.1,
            },
            Correction {
                file_name: "a".into(),
                scan_number: 5,
                correction: 0.3,
            },
        ]);
        // scan 3 interpolates to 0.2, mean over 1..=5 is 0.2
        assert!((table.correction_for("a", &ScanRange::new(1, 5)) - 0.2).abs() < 1e-12);
        assert!((table.correction_for("a", &ScanRange::new(4, 9)) - 0.3).abs() < 1e-12);
        assert_eq!(table.correction_for("b", &ScanRange::new(1, 5)), 0.0);
        assert_eq!(table.correction_for("a", &ScanRange::new(0, 5)), 0.0);
        assert_eq!(table.correction_for("a", &ScanRange::new(6, 9)), 0.0);
    }
}
