//! Transactional state cell
//!
//! Every replica's mutable state lives in a `TxCell`. Updates stage a
//! clone of the current value, run the caller's closure against the
//! clone, and publish it only if the closure succeeds, so a failed
//! operation leaves no state visible. Multi-cell transactions acquire
//! locks in a fixed order (by allocation address) and commit all staged
//! copies together or none at all.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Transactional cell holding a replica's state.
///
/// Cloning a `TxCell` shares the underlying state; all clones observe
/// the same committed values. Readers get point-in-time snapshots and
/// never block writers for longer than a clone.
#[derive(Debug, Default)]
pub struct TxCell<S> {
    inner: Arc<Mutex<S>>,
}

impl<S> Clone for TxCell<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Clone> TxCell<S> {
    /// Create a cell holding `initial`.
    pub fn new(initial: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(initial)),
        }
    }

    // The staged-clone protocol never publishes a half-applied value, so
    // a lock poisoned by a panicking reader still guards a consistent
    // state and can be recovered.
    fn lock(&self) -> MutexGuard<'_, S> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Atomic point-in-time snapshot of the current state.
    pub fn read(&self) -> S {
        self.lock().clone()
    }

    /// Apply an infallible mutation and commit the result.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let mut guard = self.lock();
        let mut staged = guard.clone();
        let result = f(&mut staged);
        *guard = staged;
        result
    }

    /// Apply a fallible mutation transactionally.
    ///
    /// The closure runs against a staged clone; on `Ok` the clone is
    /// committed, on `Err` it is discarded and the published state is
    /// exactly what it was before the call.
    pub fn update<R, E>(&self, f: impl FnOnce(&mut S) -> Result<R, E>) -> Result<R, E> {
        let mut guard = self.lock();
        let mut staged = guard.clone();
        let result = f(&mut staged)?;
        *guard = staged;
        Ok(result)
    }

    fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }
}

/// Run a transaction across two cells, committing both or neither.
///
/// Locks are acquired in allocation-address order, so concurrent
/// transactions over the same pair cannot deadlock regardless of
/// argument order. The cells must be distinct.
pub fn commit2<A, B, R, E>(
    a: &TxCell<A>,
    b: &TxCell<B>,
    f: impl FnOnce(&mut A, &mut B) -> Result<R, E>,
) -> Result<R, E>
where
    A: Clone,
    B: Clone,
{
    let (mut guard_a, mut guard_b) = if a.addr() <= b.addr() {
        let ga = a.lock();
        let gb = b.lock();
        (ga, gb)
    } else {
        let gb = b.lock();
        let ga = a.lock();
        (ga, gb)
    };

    let mut staged_a = guard_a.clone();
    let mut staged_b = guard_b.clone();
    let result = f(&mut staged_a, &mut staged_b)?;
    *guard_a = staged_a;
    *guard_b = staged_b;
    Ok(result)
}

/// Infallible two-cell transaction; both commits always happen.
///
/// Same locking discipline as `commit2`.
pub fn mutate2<A, B, R>(a: &TxCell<A>, b: &TxCell<B>, f: impl FnOnce(&mut A, &mut B) -> R) -> R
where
    A: Clone,
    B: Clone,
{
    let result: Result<R, std::convert::Infallible> = commit2(a, b, |a, b| Ok(f(a, b)));
    match result {
        Ok(value) => value,
        Err(never) => match never {},
    }
}

/// Run a transaction across three cells, committing all or none.
pub fn commit3<A, B, C, R, E>(
    a: &TxCell<A>,
    b: &TxCell<B>,
    c: &TxCell<C>,
    f: impl FnOnce(&mut A, &mut B, &mut C) -> Result<R, E>,
) -> Result<R, E>
where
    A: Clone,
    B: Clone,
    C: Clone,
{
    // Acquire in address order, then hand the guards back in call order.
    let mut order = [(a.addr(), 0usize), (b.addr(), 1), (c.addr(), 2)];
    order.sort_unstable();

    let mut guard_a = None;
    let mut guard_b = None;
    let mut guard_c = None;
    for (_, which) in order {
        match which {
            0 => guard_a = Some(a.lock()),
            1 => guard_b = Some(b.lock()),
            _ => guard_c = Some(c.lock()),
        }
    }
    // All three were just assigned above.
    let (mut guard_a, mut guard_b, mut guard_c) = match (guard_a, guard_b, guard_c) {
        (Some(ga), Some(gb), Some(gc)) => (ga, gb, gc),
        _ => unreachable!("every cell is locked exactly once"),
    };

    let mut staged_a = guard_a.clone();
    let mut staged_b = guard_b.clone();
    let mut staged_c = guard_c.clone();
    let result = f(&mut staged_a, &mut staged_b, &mut staged_c)?;
    *guard_a = staged_a;
    *guard_b = staged_b;
    *guard_c = staged_c;
    Ok(result)
}
