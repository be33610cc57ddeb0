use crate::correction::CorrectionTable;
use crate::models::{
    Component,
    ComponentId,
    Purpose,
    ScanRange,
};
use std::collections::BTreeMap;
use tracing::{
    debug,
    warn,
};

/// All components of an analysis, identified by their position.
///
/// Components are loaded once; afterwards only their `accepted` flag and
/// manual mass shifts change, through [`RecordStore::component_mut`].
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    components: Vec<Component>,
}

impl RecordStore {
    pub fn new(components: impl IntoIterator<Item = Component>) -> Self {
        let mut components: Vec<Component> = components.into_iter().collect();
        for (i, c) in components.iter_mut().enumerate() {
            c.id = ComponentId(i as u32);
        }
        let non_finite = components
            .iter()
            .filter(|c| !c.weighted_monoisotopic_mass.is_finite())
            .count();
        if non_finite > 0 {
            warn!(
                "{} of {} components have a non-finite mass and will never be clustered",
                non_finite,
                components.len()
            );
        }
        debug!("Loaded {} components", components.len());
        Self { components }
    }

    /// Subtracts the calibration correction of each component's scan range from its mass.
    pub fn apply_corrections(&mut self, table: &CorrectionTable) {
        if table.is_empty() {
            return;
        }
        let mut corrected = 0usize;
        for c in self.components.iter_mut() {
            let factor = table.correction_for(&c.input_file, &c.scan_range);
            if factor != 0.0 {
                c.weighted_monoisotopic_mass -= factor;
                corrected += 1;
            }
        }
        debug!("Applied mass corrections to {} components", corrected);
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn get(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id.index())
    }

    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.components.get_mut(id.index())
    }

    pub fn with_purpose(&self, purpose: Purpose) -> impl Iterator<Item = &Component> {
        self.components.iter().filter(move |c| c.purpose == purpose)
    }

    pub fn has_purpose(&self, purpose: Purpose) -> bool {
        self.components.iter().any(|c| c.purpose == purpose)
    }

    /// Identification components grouped by input file and scan range, in a stable order.
    pub fn scan_range_groups(&self) -> BTreeMap<(&str, ScanRange), Vec<&Component>> {
        let mut groups: BTreeMap<(&str, ScanRange), Vec<&Component>> = BTreeMap::new();
        for c in self.with_purpose(Purpose::Identification) {
            groups
                .entry((c.input_file.as_str(), c.scan_range))
                .or_default()
                .push(c);
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correction::Correction;
    use crate::models::component::tests::component;

    #[test]
    fn test_ids_follow_position() {
        let store = RecordStore::new(vec![
            component(100.0, 1.0, &[(1, 1.0)]),
            component(200.0, 1.0, &[(1, 1.0)]),
        ]);
        assert_eq!(store.components()[1].id, ComponentId(1));
        assert_eq!(store.get(ComponentId(1)).map(|c| c.weighted_monoisotopic_mass), Some(200.0));
    }

    #[test]
    fn test_scan_range_groups() {
        let mut a = component(100.0, 1.0, &[(1, 1.0)]);
        a.scan_range = ScanRange::new(1, 5);
        let mut b = component(101.0, 1.0, &[(1, 1.0)]);
        b.scan_range = ScanRange::new(6, 9);
        let mut c = component(102.0, 1.0, &[(1, 1.0)]);
        c.scan_range = ScanRange::new(1, 5);
        let mut q = component(103.0, 1.0, &[(1, 1.0)]);
        q.purpose = Purpose::Quantification;
        let store = RecordStore::new(vec![a, b, c, q]);
        let groups = store.scan_range_groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[&("file_a", ScanRange::new(1, 5))].len(), 2);
    }

    #[test]
    fn test_apply_corrections() {
        let mut store = RecordStore::new(vec![component(1000.0, 1.0, &[(1, 1.0)])]);
        store.apply_corrections(&CorrectionTable::new(vec![Correction {
            file_name: "file_a".into(),
            scan_number: 2,
            correction: 0.5,
        }]));
        assert_eq!(store.components()[0].weighted_monoisotopic_mass, 999.5);
    }
}
