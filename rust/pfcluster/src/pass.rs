use crate::config::EngineConfig;
use crate::pool::RemainingPool;
use crate::scheduler::MassWindowScheduler;
use crate::traits::HasMass;
use rayon::prelude::*;
use std::time::Instant;
use tracing::{
    debug,
    info,
    warn,
};

/// What one clustering pass needs besides its records.
#[derive(Clone, Copy)]
pub struct PassContext<'a> {
    pub config: &'a EngineConfig,
    pub scheduler: &'a MassWindowScheduler,
    pub workers: &'a rayon::ThreadPool,
}

impl<'a> PassContext<'a> {
    pub fn new(
        config: &'a EngineConfig,
        scheduler: &'a MassWindowScheduler,
        workers: &'a rayon::ThreadPool,
    ) -> Self {
        Self {
            config,
            scheduler,
            workers,
        }
    }

    /// Distance from a root beyond which its worker may not claim records.
    pub fn claim_radius(&self) -> f64 {
        self.scheduler.radius() / 2.0
    }

    pub fn width(&self) -> usize {
        self.workers.current_num_threads().max(1)
    }
}

/// Result of one worker: its value plus the pool slots it claimed.
pub(crate) struct Claim<O> {
    pub value: O,
    pub slots: Vec<usize>,
}

/// How roots relate to the pool they claim from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RootSource {
    /// Roots are the pool's own records (slot == root position) and stop being
    /// eligible once claimed by any worker.
    Pool,
    /// Roots are a separate list, each processed exactly once.
    Separate,
}

/// Runs batches of mass-exclusive workers until no root is left.
///
/// Each batch is selected by the scheduler from the still open roots, run in
/// parallel on the context's thread pool and joined before its claims are
/// removed from `pool`. Results come back in launch order, which only depends
/// on the order of `roots`.
pub(crate) fn run_batches<R, O, W>(
    ctx: &PassContext<'_>,
    stage: &str,
    roots: &[R],
    source: RootSource,
    pool: &mut RemainingPool,
    work: W,
) -> Vec<(usize, O)>
where
    R: HasMass + Sync,
    O: Send,
    W: Fn(usize, &RemainingPool) -> Claim<O> + Sync,
{
    let start = Instant::now();
    let mut open: Vec<usize> = (0..roots.len())
        .filter(|&i| match source {
            RootSource::Pool => pool.contains(i),
            RootSource::Separate => true,
        })
        .collect();
    let skipped = open.len();
    open.retain(|&i| roots[i].mass().is_finite());
    if skipped != open.len() {
        warn!(
            "{}: skipping {} roots with a non-finite mass",
            stage,
            skipped - open.len()
        );
    }

    let width = ctx.width();
    let mut results = Vec::with_capacity(open.len());
    let mut finished = vec![false; roots.len()];
    // Everything in `open[..head]` is finished or claimed.
    let mut head = 0usize;
    let mut batches = 0usize;
    loop {
        let pool_view: &RemainingPool = pool;
        let is_open = |i: usize| {
            !finished[i]
                && match source {
                    RootSource::Pool => pool_view.contains(i),
                    RootSource::Separate => true,
                }
        };
        while head < open.len() && !is_open(open[head]) {
            head += 1;
        }
        if head == open.len() {
            break;
        }
        let batch = ctx
            .scheduler
            .select_batch_among(roots, open[head..].iter().copied(), width, &is_open);
        if batch.is_empty() {
            let left = open[head..].iter().filter(|&&i| is_open(i)).count();
            warn!("{}: stopped with {} roots left unprocessed", stage, left);
            break;
        }

        let claims: Vec<Claim<O>> = ctx
            .workers
            .install(|| batch.par_iter().map(|&i| work(i, pool_view)).collect());

        let mut claimed = 0usize;
        for (root, claim) in batch.iter().zip(claims) {
            finished[*root] = true;
            claimed += pool.remove(claim.slots);
            results.push((*root, claim.value));
        }
        debug!(
            "{}: batch {} ran {} workers claiming {} records, {} left in pool",
            stage,
            batches,
            batch.len(),
            claimed,
            pool.len()
        );
        batches += 1;
    }

    info!(
        "{}: {} workers in {} batches took {:#?}",
        stage,
        results.len(),
        batches,
        start.elapsed()
    );
    results
}
