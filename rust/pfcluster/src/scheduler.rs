use crate::traits::HasMass;
use std::sync::Arc;
use std::sync::atomic::{
    AtomicBool,
    Ordering,
};

/// Shared cancellation flag checked before any new root is issued.
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Picks cluster roots so that no two active roots are within `radius` of each other.
///
/// Every worker only ever touches records within half the radius of its own
/// root, so workers of one batch never compete for the same record.
///
/// Example:
/// ```
/// use pfcluster::MassWindowScheduler;
///
/// let scheduler = MassWindowScheduler::new(20.0);
/// // Pre-sorted by priority.
/// let ordered = vec![119.0, 121.0, 122.0];
/// let active = vec![100.0];
/// assert_eq!(scheduler.next_root(&ordered, &active), Some(&121.0));
/// ```
#[derive(Debug, Clone)]
pub struct MassWindowScheduler {
    radius: f64,
    stop: StopFlag,
}

impl MassWindowScheduler {
    pub fn new(radius: f64) -> Self {
        Self {
            radius,
            stop: StopFlag::new(),
        }
    }

    pub fn with_stop_flag(mut self, stop: StopFlag) -> Self {
        self.stop = stop;
        self
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn stop_flag(&self) -> &StopFlag {
        &self.stop
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.is_stopped()
    }

    /// Whether `mass` lies outside the exclusion window of every active root.
    pub fn is_clear_of<A: HasMass>(&self, mass: f64, active: &[A]) -> bool {
        active.iter().all(|a| {
            let d = a.mass();
            mass < d - self.radius || mass > d + self.radius
        })
    }

    /// Position of the first entry of `ordered` that can become a root next to `active`.
    pub fn next_root_index<T: HasMass, A: HasMass>(&self, ordered: &[T], active: &[A]) -> Option<usize> {
        if self.is_stopped() {
            return None;
        }
        ordered.iter().position(|c| {
            let m = c.mass();
            m.is_finite() && self.is_clear_of(m, active)
        })
    }

    /// First entry of `ordered` whose mass is clear of every active root.
    pub fn next_root<'a, T: HasMass, A: HasMass>(&self, ordered: &'a [T], active: &[A]) -> Option<&'a T> {
        self.next_root_index(ordered, active).map(|i| &ordered[i])
    }

    /// Selects up to `width` roots from `ordered`, each clear of the ones before it.
    ///
    /// Returns positions into `ordered`, in selection order.
    pub fn select_batch<T: HasMass>(&self, ordered: &[T], width: usize) -> Vec<usize> {
        self.select_batch_among(ordered, 0..ordered.len(), width, |_| true)
    }

    /// Like [`select_batch`](Self::select_batch), visiting only `positions` (in
    /// priority order) that `is_open` accepts.
    ///
    /// An entry inside the window of an already selected root stays inside it
    /// for the rest of the batch, so a single scan is enough.
    pub fn select_batch_among<T, P, F>(&self, ordered: &[T], positions: P, width: usize, is_open: F) -> Vec<usize>
    where
        T: HasMass,
        P: IntoIterator<Item = usize>,
        F: Fn(usize) -> bool,
    {
        let mut active_masses: Vec<f64> = Vec::with_capacity(width);
        let mut selected = Vec::with_capacity(width);
        for i in positions {
            if selected.len() >= width || self.is_stopped() {
                break;
            }
            if !is_open(i) {
                continue;
            }
            let m = ordered[i].mass();
            if m.is_finite() && self.is_clear_of(m, &active_masses) {
                active_masses.push(m);
                selected.push(i);
            }
        }
        selected
    }
}
