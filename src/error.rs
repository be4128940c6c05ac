use thiserror::Error;

/// Errors raised by [`SharedPtr`](crate::SharedPtr) and its counters.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A counter was decremented while already at zero. This is a double release in the owning
    /// code, never an expected condition.
    #[error("attempt to decrement a reference counter that is already zero")]
    CounterUnderflow,

    #[error("dereference of an empty pointer")]
    NullDereference,

    /// Mutable access was requested while other handles still own the value.
    #[error("value is shared by {count} owners")]
    Shared { count: usize },
}

pub type Result<T> = core::result::Result<T, Error>;
