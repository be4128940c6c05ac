//! A minimal shared-ownership pointer.
//!
//! [`SharedPtr`] lets several handles own one heap value. Every handle is paired with a
//! separately allocated owner counter, and the value is dropped exactly when the last owning
//! handle goes away. Handles can be empty: [`SharedPtr::null`] still allocates a counter, which
//! simply stays at zero.
//!
//! The default counter, [`LocalCounter`], is a plain `Cell<usize>`, so a `SharedPtr` is neither
//! `Send` nor `Sync`. Enable the `atomic` feature for [`AtomicCounter`] and the
//! [`AtomicSharedPtr`] alias if handles must cross threads.
#![no_std]
#![allow(unused_unsafe)]
extern crate maybe_std as base;

/// Bookkeeping for the number of handles that own one value.
///
/// This trait is sealed, the pointer relies on its implementations for memory safety.
pub trait Counter: sealed::Sealed {
    /// A fresh counter with no owners.
    fn zero() -> Self;

    /// The current number of owners.
    fn count(&self) -> usize;

    /// Register one more owner.
    fn increment(&self);

    /// Unregister one owner and return how many remain.
    ///
    /// Fails with [`Error::CounterUnderflow`] if the count is already zero; the count is left
    /// untouched in that case.
    fn decrement(&self) -> Result<usize>;
}

mod sealed {
    pub trait Sealed {}
}

mod counter;
pub use counter::*;

mod error;
pub use error::*;

mod shared;
pub use shared::*;

#[cfg(feature = "atomic")]
mod atomic;
#[cfg(feature = "atomic")]
pub use atomic::*;
