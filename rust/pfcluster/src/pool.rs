use crate::traits::HasMass;

/// Records still available to a clustering pass.
///
/// Slots are positions in the slice the pool was built from. Entries are kept
/// in that slice's priority order and, separately, sorted by mass so workers
/// can look up their neighbourhood without scanning everything.
///
/// Workers only read the pool; claimed slots are removed by the orchestrating
/// thread between batches.
#[derive(Debug, Clone)]
pub struct RemainingPool {
    ordered: Vec<usize>,
    by_mass: Vec<(f64, usize)>,
    present: Vec<bool>,
}

impl RemainingPool {
    /// Pool over every record of `records` with a finite mass.
    pub fn new<T: HasMass>(records: &[T]) -> Self {
        let ordered: Vec<usize> = (0..records.len())
            .filter(|&i| records[i].mass().is_finite())
            .collect();
        let mut by_mass: Vec<(f64, usize)> = ordered.iter().map(|&i| (records[i].mass(), i)).collect();
        by_mass.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        let mut present = vec![false; records.len()];
        for &i in ordered.iter() {
            present[i] = true;
        }
        Self {
            ordered,
            by_mass,
            present,
        }
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn contains(&self, slot: usize) -> bool {
        self.present.get(slot).copied().unwrap_or(false)
    }

    /// Remaining slots in priority order.
    pub fn slots(&self) -> &[usize] {
        &self.ordered
    }

    /// Remaining slots with mass in `[low, high]`, ascending by mass.
    pub fn slots_in_mass_range(&self, low: f64, high: f64) -> impl Iterator<Item = usize> + '_ {
        let start = self.by_mass.partition_point(|(m, _)| *m < low);
        self.by_mass[start..]
            .iter()
            .take_while(move |(m, _)| *m <= high)
            .map(|(_, slot)| *slot)
    }

    /// Drops the given slots. Slots not in the pool are ignored.
    pub fn remove(&mut self, slots: impl IntoIterator<Item = usize>) -> usize {
        let mut removed = 0;
        for slot in slots {
            if let Some(p) = self.present.get_mut(slot) {
                if *p {
                    *p = false;
                    removed += 1;
                }
            }
        }
        if removed > 0 {
            let present = &self.present;
            self.ordered.retain(|s| present[*s]);
            self.by_mass.retain(|(_, s)| present[*s]);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mass_range_lookup() {
        let masses = vec![300.0, 100.0, 200.0, 150.0];
        let pool = RemainingPool::new(&masses);
        let found: Vec<usize> = pool.slots_in_mass_range(120.0, 200.0).collect();
        assert_eq!(found, vec![3, 2]);
        assert_eq!(pool.slots(), &[0, 1, 2, 3]);
    }

    #[test]
    fn test_remove_keeps_order() {
        let masses = vec![300.0, 100.0, 200.0, 150.0];
        let mut pool = RemainingPool::new(&masses);
        assert_eq!(pool.remove([1, 3, 3, 9]), 2);
        assert_eq!(pool.slots(), &[0, 2]);
        assert!(!pool.contains(1));
        assert_eq!(pool.slots_in_mass_range(0.0, 1000.0).collect::<Vec<_>>(), vec![2, 0]);
    }

    #[test]
    fn test_non_finite_masses_left_out() {
        let masses = vec![f64::NAN, 10.0];
        let pool = RemainingPool::new(&masses);
        assert_eq!(pool.len(), 1);
        assert!(!pool.contains(0));
    }
}
