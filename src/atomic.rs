use base::sync::atomic;
use base::sync::atomic::Ordering::{Acquire, Relaxed, Release};

use crate::{Counter, Error, Result, SharedPtr};

/// A soft limit on the amount of owners that may be registered with an `AtomicCounter`.
///
/// Going above this limit panics, at _exactly_ `MAX_REFCOUNT + 1` owners only if no other
/// thread increments concurrently.
const MAX_REFCOUNT: usize = (isize::MAX) as usize;

/// A thread-safe owner counter.
///
/// This is a separate flavour, the default [`LocalCounter`](crate::LocalCounter) stays
/// unsynchronized.
#[derive(Debug, Default)]
pub struct AtomicCounter {
    count: atomic::AtomicUsize,
}

/// A [`SharedPtr`] whose counter may be updated from several threads.
pub type AtomicSharedPtr<T> = SharedPtr<T, AtomicCounter>;

unsafe impl<T: ?Sized + Sync + Send> Send for SharedPtr<T, AtomicCounter> {}
unsafe impl<T: ?Sized + Sync + Send> Sync for SharedPtr<T, AtomicCounter> {}

impl crate::sealed::Sealed for AtomicCounter {}

impl Counter for AtomicCounter {
    fn zero() -> Self {
        AtomicCounter { count: atomic::AtomicUsize::new(0) }
    }

    #[inline]
    fn count(&self) -> usize {
        self.count.load(Acquire)
    }

    #[inline]
    fn increment(&self) {
        // Knowledge of an existing owner prevents other threads from freeing the value, so a
        // relaxed increment suffices.
        let old = self.count.fetch_add(1, Relaxed);

        if old > MAX_REFCOUNT {
            panic!("reference counter overflow");
        }
    }

    #[inline]
    fn decrement(&self) -> Result<usize> {
        let old = self
            .count
            .fetch_update(Release, Relaxed, |count| count.checked_sub(1))
            .map_err(|_| Error::CounterUnderflow)?;

        if old == 1 {
            // Synchronize with every other owner's release before the caller frees the value.
            atomic::fence(Acquire);
        }
        Ok(old - 1)
    }
}
