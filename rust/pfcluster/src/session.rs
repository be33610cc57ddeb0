use crate::aggregation::{
    AggregationOutcome,
    aggregate,
};
use crate::catalog::{
    PtmCatalog,
    TheoreticalEntry,
};
use crate::config::EngineConfig;
use crate::errors::Result;
use crate::models::{
    Component,
    Identity,
    IdentityId,
    IsotopePair,
    ProteoformCandidate,
    Purpose,
    RecordRef,
    Relation,
};
use crate::pairing::find_isotope_pairs;
use crate::pass::PassContext;
use crate::quantification::assign_quantification;
use crate::relations::{
    build_relations,
    experimental_identities,
};
use crate::resolution::{
    IdentityResolver,
    ResolutionReport,
};
use crate::scheduler::{
    MassWindowScheduler,
    StopFlag,
};
use crate::store::RecordStore;
use crate::vetting::vet;
use serde::Serialize;
use tracing::info;

/// Identities, relations and the summary of one identity resolution.
#[derive(Debug, Serialize)]
pub struct IdentityResolution {
    pub identities: Vec<Identity>,
    pub relations: Vec<Relation>,
    pub report: ResolutionReport,
}

/// All state of one analysis run.
///
/// Holds the records, the worker pool and the results of every stage. The
/// clustering stages take `&mut self`, so two passes over the same pools can
/// never overlap. Independent sessions share nothing.
pub struct AnalysisSession {
    config: EngineConfig,
    scheduler: MassWindowScheduler,
    workers: rayon::ThreadPool,
    store: RecordStore,
    pairs: Vec<IsotopePair>,
    candidates: Vec<ProteoformCandidate>,
    remaining: Vec<RecordRef>,
}

impl AnalysisSession {
    pub fn new(config: EngineConfig, store: RecordStore) -> Result<Self> {
        config.validate()?;
        let workers = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_count())
            .thread_name(|i| format!("pfcluster-{}", i))
            .build()?;
        let scheduler = MassWindowScheduler::new(config.exclusion_radius);
        info!(
            "Session with {} components, {} workers, {:?} labeling",
            store.len(),
            workers.current_num_threads(),
            config.labeling
        );
        Ok(Self {
            config,
            scheduler,
            workers,
            store,
            pairs: Vec::new(),
            candidates: Vec::new(),
            remaining: Vec::new(),
        })
    }

    /// Lets another thread cancel the clustering passes through `stop`.
    pub fn with_stop_flag(mut self, stop: StopFlag) -> Self {
        self.scheduler = self.scheduler.with_stop_flag(stop);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Mutable access to the components, e.g. to flip `accepted` or shift masses.
    ///
    /// Results already computed are not updated; call [`Self::regroup`].
    pub fn store_mut(&mut self) -> &mut RecordStore {
        &mut self.store
    }

    pub fn pairs(&self) -> &[IsotopePair] {
        &self.pairs
    }

    pub fn candidates(&self) -> &[ProteoformCandidate] {
        &self.candidates
    }

    /// Records that passed the aggregation filters but joined no candidate.
    pub fn remaining(&self) -> &[RecordRef] {
        &self.remaining
    }

    fn context(&self) -> PassContext<'_> {
        PassContext::new(&self.config, &self.scheduler, &self.workers)
    }

    /// Detects isotope pairs in every scan range group. Unlabeled runs have none.
    pub fn find_isotope_pairs(&mut self) -> &[IsotopePair] {
        self.pairs = if self.config.labeling.is_labeled() {
            let (store, config) = (&self.store, &self.config);
            self.workers.install(|| find_isotope_pairs(store, config))
        } else {
            Vec::new()
        };
        &self.pairs
    }

    /// Clusters pairs (labeled) or identification components (unlabeled) into candidates.
    ///
    /// Candidates from a previous call are discarded.
    pub fn aggregate(&mut self) -> &[ProteoformCandidate] {
        let outcome: AggregationOutcome = if self.config.labeling.is_labeled() {
            aggregate(&self.context(), &self.pairs)
        } else {
            let components: Vec<&Component> = self.store.with_purpose(Purpose::Identification).collect();
            aggregate(&self.context(), &components)
        };
        self.candidates = outcome.candidates;
        self.remaining = outcome.remaining;
        &self.candidates
    }

    /// Keeps only the candidates confirmed by the full component pool.
    ///
    /// Labeled runs vet against identification components; unlabeled runs
    /// also offer quantification components so they can be assigned here.
    /// With two pass validation off, every candidate is accepted as is.
    pub fn vet(&mut self) -> &[ProteoformCandidate] {
        let candidates = std::mem::take(&mut self.candidates);
        self.candidates = if self.config.two_pass_validation {
            let components: Vec<&Component> = if self.config.labeling.is_labeled() {
                self.store.with_purpose(Purpose::Identification).collect()
            } else {
                self.store.components().iter().collect()
            };
            vet(&self.context(), candidates, &components)
        } else {
            candidates
                .into_iter()
                .map(|mut c| {
                    c.accepted = true;
                    c
                })
                .collect()
        };
        &self.candidates
    }

    /// Assigns quantification components, labeled runs only. Returns how many were assigned.
    pub fn assign_quantification(&mut self) -> usize {
        if !self.config.labeling.is_labeled() || !self.store.has_purpose(Purpose::Quantification) {
            return 0;
        }
        let ctx = PassContext::new(&self.config, &self.scheduler, &self.workers);
        let quant: Vec<&Component> = self.store.with_purpose(Purpose::Quantification).collect();
        assign_quantification(&ctx, &mut self.candidates, &quant)
    }

    /// Pairing, aggregation, vetting and quantification in order.
    pub fn run(&mut self) -> &[ProteoformCandidate] {
        self.find_isotope_pairs();
        self.aggregate();
        self.vet();
        self.assign_quantification();
        &self.candidates
    }

    /// Drops every derived result and runs the pipeline again from the current records.
    pub fn regroup(&mut self) -> &[ProteoformCandidate] {
        self.pairs.clear();
        self.candidates.clear();
        self.remaining.clear();
        self.run()
    }

    /// Relates the current candidates to the theoreticals and each other,
    /// then explains the relations with modification changes.
    ///
    /// Theoretical identities come first, numbered in input order, followed
    /// by one experimental identity per candidate.
    pub fn resolve_identities(
        &self,
        catalog: &PtmCatalog,
        theoreticals: &[TheoreticalEntry],
    ) -> Result<IdentityResolution> {
        let mut identities = Vec::with_capacity(theoreticals.len() + self.candidates.len());
        for (i, entry) in theoreticals.iter().enumerate() {
            identities.push(catalog.theoretical_identity(IdentityId(i as u32), entry)?);
        }
        identities.extend(experimental_identities(
            &self.candidates,
            theoreticals.len() as u32,
        ));

        let resolver = IdentityResolver::new(catalog, self.config.mass_tolerance_ppm);
        let (relations, report) = self.workers.install(|| {
            let relations = build_relations(&identities, catalog, &self.config);
            let report = resolver.resolve_families(&identities, &relations);
            (relations, report)
        });
        Ok(IdentityResolution {
            identities,
            relations,
            report,
        })
    }
}
