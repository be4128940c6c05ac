use base::cell::Cell;

use crate::{Counter, Error, Result};

/// A non-thread-safe owner counter.
///
/// The count is an ordinary integer without synchronization. Sharing it between threads is not
/// possible: `Cell` is not `Sync`, and the pointers holding it are neither `Send` nor `Sync`.
#[derive(Debug, Default)]
pub struct LocalCounter {
    count: Cell<usize>,
}

impl crate::sealed::Sealed for LocalCounter {}

impl Counter for LocalCounter {
    fn zero() -> Self {
        LocalCounter { count: Cell::new(0) }
    }

    #[inline]
    fn count(&self) -> usize {
        self.count.get()
    }

    #[inline]
    fn increment(&self) {
        let count = self.count();

        // An overflow would let the value be dropped while owners remain.
        if count == usize::MAX {
            panic!("reference counter overflow");
        }
        self.count.set(count + 1);
    }

    #[inline]
    fn decrement(&self) -> Result<usize> {
        match self.count() {
            0 => Err(Error::CounterUnderflow),
            count => {
                self.count.set(count - 1);
                Ok(count - 1)
            }
        }
    }
}
