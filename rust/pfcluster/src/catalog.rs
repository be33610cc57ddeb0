//! Theoretical modification catalog: rank table, candidate sets and mass buckets.

use crate::errors::{
    PfClusterError,
    Result,
};
use crate::models::{
    Identity,
    IdentityId,
    Modification,
    PtmSet,
    TheoreticalInfo,
};
use ordered_float::OrderedFloat;
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::{
    BTreeMap,
    HashMap,
    HashSet,
};
use std::sync::Arc;
use tracing::{
    debug,
    info,
};

/// Integer rank per modification mass, lower meaning more commonly observed.
#[derive(Debug, Clone, PartialEq)]
pub struct ModificationRanks {
    ranks: BTreeMap<OrderedFloat<f64>, i32>,
    pub first_quartile: i32,
    pub second_quartile: i32,
    pub third_quartile: i32,
    /// Largest rank handed out; also the cut off for summed ranks.
    pub threshold: i32,
}

impl ModificationRanks {
    /// Ranks masses by how often they were observed on theoretical entries.
    ///
    /// The most frequent masses start at rank 3, the rank steps up whenever a
    /// count drops below the previous one. Zero mass gets 0, variable
    /// modifications 2, anything never observed the final threshold.
    pub fn from_counts(
        observed_masses: impl IntoIterator<Item = f64>,
        variable_masses: impl IntoIterator<Item = f64>,
        all_masses: impl IntoIterator<Item = f64>,
    ) -> Self {
        let mut counts: BTreeMap<OrderedFloat<f64>, usize> = BTreeMap::new();
        for m in observed_masses {
            *counts.entry(OrderedFloat(m)).or_default() += 1;
        }
        let mut ordered: Vec<(OrderedFloat<f64>, usize)> = counts.into_iter().collect();
        // Stable, so equal counts stay in mass order.
        ordered.sort_by(|a, b| b.1.cmp(&a.1));

        let mut ranks: BTreeMap<OrderedFloat<f64>, i32> = BTreeMap::new();
        let mut rank = 3;
        let mut last_count = 0;
        for (mass, count) in ordered {
            ranks.insert(mass, rank);
            if count < last_count {
                rank += 1;
            }
            last_count = count;
        }
        ranks.insert(OrderedFloat(0.0), 0);
        for m in variable_masses {
            ranks.insert(OrderedFloat(m), 2);
        }

        let mut values: Vec<i32> = ranks.values().copied().collect();
        values.sort_unstable();
        let n = values.len();
        let first_quartile = values[n / 4];
        let second_quartile = values[2 * n / 4];
        let third_quartile = values[3 * n / 4];
        let threshold = values.iter().copied().max().unwrap_or(0);

        for m in all_masses {
            ranks.entry(OrderedFloat(m)).or_insert(threshold);
        }

        Self {
            ranks,
            first_quartile,
            second_quartile,
            third_quartile,
            threshold,
        }
    }

    pub fn rank_of_mass(&self, mass: f64) -> i32 {
        self.ranks
            .get(&OrderedFloat(mass))
            .copied()
            .unwrap_or(self.threshold)
    }

    /// Penalty applied per extra modification and for unexpected modifications.
    pub fn half_first_quartile(&self) -> i32 {
        self.first_quartile / 2
    }
}

/// Catalog description as supplied by the theoretical database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogInput {
    pub modifications: Vec<Modification>,
    /// Ids of modifications applied as variable modifications.
    pub variable_modifications: Vec<String>,
    pub max_ptms: usize,
    /// Residues after which terminal degradation is most commonly observed.
    pub likely_cleavages: Vec<char>,
}

impl Default for CatalogInput {
    fn default() -> Self {
        Self {
            modifications: Vec::new(),
            variable_modifications: Vec::new(),
            max_ptms: 3,
            likely_cleavages: vec!['I', 'L', 'A'],
        }
    }
}

/// A theoretical proteoform as supplied by the theoretical database.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TheoreticalEntry {
    pub accession: String,
    pub sequence: String,
    #[serde(default = "default_begin")]
    pub begin: u32,
    #[serde(default)]
    pub end: u32,
    pub modified_mass: f64,
    #[serde(default)]
    pub lysine_count: Option<u32>,
    /// Modifications carried by this proteoform.
    #[serde(default)]
    pub ptms: Vec<String>,
    /// Modifications annotated anywhere on the parent protein.
    #[serde(default)]
    pub known_modifications: Vec<String>,
}

fn default_begin() -> u32 {
    1
}

/// Read-only modification catalog used by relation building and identity resolution.
#[derive(Debug, Clone)]
pub struct PtmCatalog {
    modifications: BTreeMap<String, Arc<Modification>>,
    variable: HashSet<String>,
    ranks: ModificationRanks,
    all_sets: Vec<Arc<PtmSet>>,
    buckets: HashMap<i64, Vec<Arc<PtmSet>>>,
    likely_cleavages: Vec<char>,
}

fn bucket_key(mass: f64) -> i64 {
    (mass * 10.0).round() as i64
}

impl PtmCatalog {
    /// Builds the catalog, ranking modifications by how often the given
    /// theoretical entries are annotated with them.
    pub fn build(input: &CatalogInput, theoreticals: &[TheoreticalEntry]) -> Result<Self> {
        let mut modifications = BTreeMap::new();
        for m in input.modifications.iter() {
            modifications.insert(m.id.clone(), Arc::new(m.clone()));
        }
        let lookup = |id: &str, context: &str| -> Result<Arc<Modification>> {
            modifications
                .get(id)
                .cloned()
                .ok_or_else(|| PfClusterError::unknown_modification(id, context))
        };

        let mut variable = HashSet::new();
        let mut variable_masses = Vec::new();
        for id in input.variable_modifications.iter() {
            let m = lookup(id, "variable modifications")?;
            variable_masses.push(m.monoisotopic_mass);
            variable.insert(m.id.clone());
        }
        let mut observed_masses = Vec::new();
        for t in theoreticals.iter() {
            for id in t.known_modifications.iter() {
                observed_masses.push(lookup(id, &t.accession)?.monoisotopic_mass);
            }
        }
        let ranks = ModificationRanks::from_counts(
            observed_masses,
            variable_masses,
            modifications.values().map(|m| m.monoisotopic_mass),
        );

        let mods: Vec<Arc<Modification>> = modifications.values().cloned().collect();
        let all_sets = generate_ptmsets(&mods, input.max_ptms, &ranks);
        let buckets = bucket_sets(&all_sets);
        info!(
            "Modification catalog: {} modifications, {} sets in {} mass buckets, rank threshold {}",
            mods.len(),
            all_sets.len(),
            buckets.len(),
            ranks.threshold
        );

        Ok(Self {
            modifications,
            variable,
            ranks,
            all_sets,
            buckets,
            likely_cleavages: input.likely_cleavages.clone(),
        })
    }

    pub fn modification(&self, id: &str) -> Option<&Arc<Modification>> {
        self.modifications.get(id)
    }

    pub fn ranks(&self) -> &ModificationRanks {
        &self.ranks
    }

    pub fn all_sets(&self) -> &[Arc<PtmSet>] {
        &self.all_sets
    }

    pub fn is_variable(&self, m: &Modification) -> bool {
        self.variable.contains(&m.id)
    }

    pub fn is_likely_cleavage(&self, residue: char) -> bool {
        self.likely_cleavages
            .iter()
            .any(|c| c.eq_ignore_ascii_case(&residue))
    }

    pub fn rank_of(&self, m: &Modification) -> i32 {
        m.rank.unwrap_or_else(|| self.ranks.rank_of_mass(m.monoisotopic_mass))
    }

    /// Sets whose mass rounds to within half a dalton of `delta`.
    pub fn candidates_near(&self, delta: f64) -> &[Arc<PtmSet>] {
        if !delta.is_finite() {
            return &[];
        }
        self.buckets
            .get(&bucket_key(delta))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Resolves modification ids into a set, failing on ids not in the catalog.
    pub fn ptm_set(&self, ids: &[String], context: &str) -> Result<PtmSet> {
        let mut ptms = Vec::with_capacity(ids.len());
        for id in ids.iter() {
            let m = self
                .modifications
                .get(id)
                .ok_or_else(|| PfClusterError::unknown_modification(id, context))?;
            ptms.push(m.clone());
        }
        let rank_sum = ptms.iter().map(|m| self.rank_of(m)).sum();
        Ok(PtmSet::new(ptms, rank_sum))
    }

    /// Turns a theoretical entry into an identity carrying its own modifications.
    pub fn theoretical_identity(&self, id: IdentityId, entry: &TheoreticalEntry) -> Result<Identity> {
        for known in entry.known_modifications.iter() {
            if !self.modifications.contains_key(known) {
                return Err(PfClusterError::unknown_modification(known, &entry.accession));
            }
        }
        let ptm_set = self.ptm_set(&entry.ptms, &entry.accession)?;
        let info = TheoreticalInfo {
            sequence: entry.sequence.clone(),
            begin: entry.begin,
            end: entry.end,
            known_modifications: entry.known_modifications.clone(),
        };
        Ok(Identity::theoretical(
            id,
            entry.accession.clone(),
            entry.modified_mass,
            entry.lysine_count,
            info,
            ptm_set,
        ))
    }
}

/// Singletons, distinct pairs and repeats of one modification up to `max_ptms` members.
fn generate_ptmsets(mods: &[Arc<Modification>], max_ptms: usize, ranks: &ModificationRanks) -> Vec<Arc<PtmSet>> {
    let penalty = ranks.half_first_quartile();
    let rank = |m: &Modification| m.rank.unwrap_or_else(|| ranks.rank_of_mass(m.monoisotopic_mass));
    let mut sets = Vec::new();
    if max_ptms == 0 {
        return sets;
    }
    for m in mods.iter() {
        sets.push(Arc::new(PtmSet::new(vec![m.clone()], rank(m))));
    }
    if max_ptms >= 2 {
        for (i, a) in mods.iter().enumerate() {
            for b in mods[i + 1..].iter() {
                let rank_sum = rank(a) + rank(b) + penalty;
                sets.push(Arc::new(PtmSet::new(vec![a.clone(), b.clone()], rank_sum)));
            }
        }
    }
    for n in 2..=max_ptms {
        for m in mods.iter() {
            let rank_sum = rank(m) * n as i32 + penalty * (n as i32 - 1);
            sets.push(Arc::new(PtmSet::new(vec![m.clone(); n], rank_sum)));
        }
    }
    debug!("Generated {} modification sets", sets.len());
    sets
}

/// Spreads each set over the ten 0.1 Da buckets from -0.5 to +0.4 around its rounded mass.
fn bucket_sets(sets: &[Arc<PtmSet>]) -> HashMap<i64, Vec<Arc<PtmSet>>> {
    let mut buckets: HashMap<i64, Vec<Arc<PtmSet>>> = HashMap::new();
    for set in sets.iter().filter(|s| s.len() == 1 || !s.has_zero_mass_member()) {
        let center = bucket_key(set.mass);
        for i in 0..10 {
            buckets.entry(center - 5 + i).or_default().push(set.clone());
        }
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> CatalogInput {
        CatalogInput {
            modifications: vec![
                Modification::new("Acetylation", 42.010565),
                Modification::new("Phosphorylation", 79.966331),
                Modification::new("Oxidation", 15.994915),
                Modification::new("Unmodified", 0.0),
            ],
            variable_modifications: vec!["Oxidation".into()],
            max_ptms: 3,
            likely_cleavages: vec!['I', 'L', 'A'],
        }
    }

    fn entry(known: &[&str]) -> TheoreticalEntry {
        TheoreticalEntry {
            accession: "P1".into(),
            sequence: "MAKT".into(),
            begin: 1,
            end: 4,
            modified_mass: 450.0,
            lysine_count: Some(1),
            ptms: vec![],
            known_modifications: known.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_ranks_from_counts() {
        // Acetyl seen 3 times, phospho once.
        let ranks = ModificationRanks::from_counts(
            vec![42.0, 42.0, 42.0, 80.0],
            vec![16.0],
            vec![42.0, 80.0, 16.0, 0.0, 100.0],
        );
        assert_eq!(ranks.rank_of_mass(42.0), 3);
        assert_eq!(ranks.rank_of_mass(80.0), 3);
        assert_eq!(ranks.rank_of_mass(0.0), 0);
        assert_eq!(ranks.rank_of_mass(16.0), 2);
        // values [0, 2, 3, 3]
        assert_eq!(ranks.first_quartile, 2);
        assert_eq!(ranks.second_quartile, 3);
        assert_eq!(ranks.threshold, 3);
        assert_eq!(ranks.rank_of_mass(100.0), 3);
    }

    #[test]
    fn test_rank_steps_after_lower_count() {
        let ranks = ModificationRanks::from_counts(
            vec![1.0, 1.0, 1.0, 2.0, 2.0, 3.0],
            Vec::new(),
            Vec::new(),
        );
        assert_eq!(ranks.rank_of_mass(1.0), 3);
        assert_eq!(ranks.rank_of_mass(2.0), 3);
        assert_eq!(ranks.rank_of_mass(3.0), 4);
    }

    #[test]
    fn test_unknown_modification_is_an_error() {
        let err = PtmCatalog::build(&input(), &[entry(&["Methylation"])]).unwrap_err();
        assert!(matches!(err, PfClusterError::UnknownModification { .. }));
    }

    #[test]
    fn test_generated_sets_and_buckets() {
        let catalog = PtmCatalog::build(&input(), &[entry(&["Acetylation"])]).unwrap();
        // 4 singletons, 6 distinct pairs, 4 doubles and 4 triples.
        assert_eq!(catalog.all_sets().len(), 18);

        let near_acetyl = catalog.candidates_near(42.0);
        assert!(near_acetyl.iter().any(|s| s.len() == 1 && s.ptms[0].id == "Acetylation"));
        // Pairs with the zero mass member are never bucketed.
        assert!(!near_acetyl.iter().any(|s| s.len() > 1 && s.has_zero_mass_member()));
        // Bucket covers -0.5 .. +0.4 around the rounded mass.
        assert!(catalog.candidates_near(41.5).iter().any(|s| s.ptms[0].id == "Acetylation"));
        assert!(!catalog.candidates_near(42.5).iter().any(|s| s.len() == 1 && s.ptms[0].id == "Acetylation"));
        assert!(catalog.candidates_near(f64::NAN).is_empty());
    }

    #[test]
    fn test_theoretical_identity_resolves_ptms() {
        let catalog = PtmCatalog::build(&input(), &[]).unwrap();
        let mut e = entry(&[]);
        e.ptms = vec!["Acetylation".into()];
        let identity = catalog.theoretical_identity(IdentityId(0), &e).unwrap();
        assert_eq!(identity.ptm_set().map(|s| s.len()), Some(1));
        e.ptms = vec!["Nope".into()];
        assert!(catalog.theoretical_identity(IdentityId(0), &e).is_err());
    }
}
