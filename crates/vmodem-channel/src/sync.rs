use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock `mutex`, recovering the data if a holder panicked.
///
/// Every critical section in this crate leaves its data consistent at each
/// step, so a poisoned lock carries no broken invariant.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
