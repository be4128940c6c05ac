use base::fmt;
use base::marker::PhantomData;
use base::mem::{self, ManuallyDrop};
use base::ptr::{self, NonNull};

use base::prelude::v1::*;

use log::{debug, error, trace};

use crate::{Counter, Error, LocalCounter, Result};

/// A shared-ownership pointer with a separately allocated owner counter.
///
/// Each handle holds a possibly absent value and a counter shared with every other handle that
/// owns the same value. A handle without a value still carries its own counter, at zero.
///
/// Handles produced by [`SharedPtr::take`] or by moving out through
/// [`SharedPtr::assign_from`] carry neither; dropping them does nothing.
pub struct SharedPtr<T: ?Sized, C: Counter = LocalCounter> {
    value: Option<NonNull<T>>,
    counter: Option<NonNull<C>>,
    phantom: PhantomData<(Box<C>, Box<T>)>,
}

impl<T: ?Sized, C: Counter> SharedPtr<T, C> {
    fn from_parts(value: Option<NonNull<T>>, counter: Option<NonNull<C>>) -> Self {
        Self { value, counter, phantom: PhantomData }
    }

    fn fresh_counter() -> NonNull<C> {
        trace!("allocating owner counter");
        Box::leak(Box::new(C::zero())).into()
    }

    #[inline]
    fn counter(&self) -> Option<&C> {
        // A counter stays allocated for as long as some handle holds it: either this handle
        // counts towards it, or it is the idle counter of this handle alone.
        self.counter.map(|counter| unsafe { counter.as_ref() })
    }

    /// Whether both handles hold the same value address. Two handles without a value count as
    /// holding the same value.
    ///
    /// Zero-sized values all live at the same dangling address, so for those the counters
    /// decide instead.
    fn same_value(&self, other: &Self) -> bool {
        match (self.value, other.value) {
            (Some(value), Some(_)) if mem::size_of_val(unsafe { value.as_ref() }) == 0 => {
                Self::ptr_eq(self, other)
            }
            (a, b) => a.map(NonNull::cast::<u8>) == b.map(NonNull::cast::<u8>),
        }
    }

    /// Free the counter without looking at it.
    ///
    /// Safety: no other handle may hold this counter.
    unsafe fn free_counter(&mut self) {
        if let Some(counter) = self.counter.take() {
            trace!("freeing owner counter");
            unsafe { drop(Box::from_raw(counter.as_ptr())) };
        }
    }

    /// Drop the value and free the counter.
    ///
    /// Safety: no other handle may hold this counter.
    unsafe fn free(&mut self) {
        unsafe { self.free_counter() };
        if let Some(value) = self.value.take() {
            trace!("dropping shared value");
            unsafe { drop(Box::from_raw(value.as_ptr())) };
        }
    }

    /// Give up this handle's ownership ahead of adopting another value.
    ///
    /// A sole owner frees value and counter straight away, without decrementing first.
    fn release(&mut self) -> Result<()> {
        let counter = match self.counter() {
            Some(counter) => counter,
            None => return Ok(()),
        };

        if counter.count() == 1 {
            debug!("releasing sole owner");
            unsafe { self.free() };
        } else if counter.decrement()? == 0 {
            // Unreachable with `LocalCounter`. An `AtomicCounter` gets here when the other
            // owners let go between the two reads above.
            unsafe { self.free() };
        } else {
            debug!("releasing one of several owners");
            self.value = None;
            self.counter = None;
        }
        Ok(())
    }

    /// Clear this handle before it adopts the state of another one.
    fn vacate(&mut self) -> Result<()> {
        if self.is_empty() {
            // An idle counter belongs to this handle alone.
            unsafe { self.free_counter() };
            self.value = None;
            Ok(())
        } else {
            self.release()
        }
    }

    /// The destruction step: unregister this owner and free everything once none remain.
    ///
    /// A counter still at zero is never decremented, only freed.
    fn destroy(&mut self) -> Result<()> {
        let counter = match self.counter() {
            Some(counter) => counter,
            None => return Ok(()),
        };

        let remaining = if counter.count() > 0 { counter.decrement()? } else { 0 };
        if remaining == 0 {
            unsafe { self.free() };
        }
        Ok(())
    }

    /// Create an empty handle with a fresh counter at zero.
    pub fn null() -> Self {
        Self::from_parts(None, Some(Self::fresh_counter()))
    }

    /// Take ownership of a boxed value. The new handle is its only owner.
    pub fn from_box(value: Box<T>) -> Self {
        let counter = Self::fresh_counter();
        unsafe { counter.as_ref() }.increment();
        Self::from_parts(Some(Box::leak(value).into()), Some(counter))
    }

    /// Move `value` to the heap and become its only owner.
    pub fn new(value: T) -> Self
    where
        T: Sized,
    {
        Self::from_box(Box::new(value))
    }

    /// Move this handle's value and counter into a new handle, leaving this one without either.
    ///
    /// The owner count does not change. The emptied handle may still be assigned to, inspected
    /// or dropped.
    pub fn take(&mut self) -> Self {
        Self::from_parts(self.value.take(), self.counter.take())
    }

    /// Copy assignment: share `source`'s value and counter, giving up the current ones.
    ///
    /// Nothing happens if both handles already hold the same value, or both hold none.
    /// If `source` holds no value this handle ends up empty with a counter of its own.
    pub fn assign(&mut self, source: &Self) -> Result<()> {
        if self.same_value(source) {
            debug!("copy assignment between handles to the same value skipped");
            return Ok(());
        }

        self.vacate()?;
        match (source.value, source.counter()) {
            (Some(value), Some(counter)) => {
                counter.increment();
                self.value = Some(value);
                self.counter = source.counter;
            }
            _ => self.counter = Some(Self::fresh_counter()),
        }
        Ok(())
    }

    /// Move assignment: take over `source`'s value and counter, giving up the current ones.
    ///
    /// The same identity check as [`assign`](Self::assign) applies; when it short-circuits,
    /// `source` is left as it was. Otherwise `source` ends up without value or counter.
    pub fn assign_from(&mut self, source: &mut Self) -> Result<()> {
        if self.same_value(source) {
            debug!("move assignment between handles to the same value skipped");
            return Ok(());
        }

        self.vacate()?;
        self.value = source.value.take();
        self.counter = source.counter.take();
        Ok(())
    }

    /// The value, if any. Does not affect ownership.
    #[inline]
    pub fn get(&self) -> Option<&T> {
        // The value lives until the last owner lets go, and this handle is one of them.
        self.value.map(|value| unsafe { &*value.as_ptr() })
    }

    /// Checked dereference.
    pub fn try_deref(&self) -> Result<&T> {
        self.get().ok_or(Error::NullDereference)
    }

    /// Checked mutable dereference.
    ///
    /// Fails with [`Error::Shared`] while other handles own the value; shared mutation needs
    /// interior mutability in `T`.
    pub fn try_deref_mut(&mut self) -> Result<&mut T> {
        let value = self.value.ok_or(Error::NullDereference)?;
        match self.use_count() {
            1 => Ok(unsafe { &mut *value.as_ptr() }),
            count => Err(Error::Shared { count }),
        }
    }

    /// Access the value without any check, like a raw pointer would.
    ///
    /// # Safety
    ///
    /// The handle must hold a value.
    #[inline]
    pub unsafe fn get_unchecked(&self) -> &T {
        unsafe { &*self.value.unwrap_unchecked().as_ptr() }
    }

    /// Mutably access the value without any check, like a raw pointer would.
    ///
    /// # Safety
    ///
    /// The handle must hold a value, and no reference to the value obtained through any other
    /// handle may be alive while the returned one is.
    #[inline]
    pub unsafe fn get_mut_unchecked(&mut self) -> &mut T {
        unsafe { &mut *self.value.unwrap_unchecked().as_ptr() }
    }

    /// The number of owners of this handle's value, or 0 if the handle has no counter.
    #[inline]
    pub fn use_count(&self) -> usize {
        self.counter().map_or(0, C::count)
    }

    /// Whether this handle owns nothing, i.e. `use_count() == 0`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.use_count() == 0
    }

    /// Exchange value and counter with `other`. No owner count changes.
    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(&mut self.value, &mut other.value);
        mem::swap(&mut self.counter, &mut other.counter);
    }

    /// Whether both handles share one counter.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        match (this.counter, other.counter) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Return the value if this handle is its only owner, otherwise hand the handle back.
    pub fn try_unwrap(this: Self) -> core::result::Result<T, Self>
    where
        T: Sized,
    {
        match (this.value, this.use_count()) {
            (Some(value), 1) => {
                let mut this = ManuallyDrop::new(this);
                unsafe {
                    this.free_counter();
                    Ok(*Box::from_raw(value.as_ptr()))
                }
            }
            _ => Err(this),
        }
    }
}

impl<T, C: Counter> SharedPtr<T, C> {
    /// The value's address, null if the handle holds no value.
    pub fn as_ptr(&self) -> *const T {
        self.value.map_or(ptr::null(), |value| value.as_ptr() as *const T)
    }
}

impl<T: ?Sized, C: Counter> Clone for SharedPtr<T, C> {
    /// Makes a clone of the `SharedPtr`.
    ///
    /// This creates another owner of the same value, increasing the shared count. Cloning a
    /// handle without a value yields an empty handle with a counter of its own.
    #[inline]
    fn clone(&self) -> Self {
        match (self.value, self.counter()) {
            (Some(value), Some(counter)) => {
                counter.increment();
                Self::from_parts(Some(value), self.counter)
            }
            _ => Self::null(),
        }
    }
}

impl<T: ?Sized, C: Counter> Drop for SharedPtr<T, C> {
    /// Drops the `SharedPtr`.
    ///
    /// This will decrement the shared count, and drop the value once no owners remain.
    ///
    /// # Examples
    ///
    /// ```
    /// use shared_ptr::SharedPtr;
    ///
    /// struct Foo;
    ///
    /// impl Drop for Foo {
    ///     fn drop(&mut self) {
    ///         println!("dropped!");
    ///     }
    /// }
    ///
    /// let foo: SharedPtr<Foo> = SharedPtr::new(Foo);
    /// let foo2 = foo.clone();
    ///
    /// drop(foo);    // Doesn't print anything
    /// drop(foo2);   // Prints "dropped!"
    /// ```
    fn drop(&mut self) {
        if let Err(err) = self.destroy() {
            error!("failed to release shared pointer: {}", err);
        }
    }
}

impl<T: ?Sized, C: Counter> Default for SharedPtr<T, C> {
    /// Creates an empty `SharedPtr`, same as [`SharedPtr::null`].
    fn default() -> Self {
        Self::null()
    }
}

impl<T, C: Counter> From<T> for SharedPtr<T, C> {
    fn from(t: T) -> Self {
        Self::new(t)
    }
}

impl<T: ?Sized, C: Counter> From<Box<T>> for SharedPtr<T, C> {
    fn from(b: Box<T>) -> Self {
        Self::from_box(b)
    }
}

impl<T: ?Sized + fmt::Debug, C: Counter> fmt::Debug for SharedPtr<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedPtr")
            .field("value", &self.get())
            .field("use_count", &self.use_count())
            .finish()
    }
}

impl<T: ?Sized, C: Counter> fmt::Pointer for SharedPtr<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let address = self
            .value
            .map_or(ptr::null(), |value| value.cast::<u8>().as_ptr().cast_const());
        fmt::Pointer::fmt(&address, f)
    }
}
