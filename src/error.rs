//! Error types for the memoizing wrapper
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cachify Error Enum ==
/// Unified error type for building and calling a memoized function.
///
/// `E` is the error type of the wrapped function.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CachifyError<E> {
    /// The normalize function returned something other than an array
    #[error("lru-cachify: normalize must return an array, got {0}")]
    InvalidNormalizeResult(&'static str),

    /// The builder was finished without a function to wrap
    #[error("lru-cachify: no function to cachify was provided")]
    MissingFunction,

    /// The wrapped function failed synchronously
    #[error("{0}")]
    Computation(E),
}

impl<E> CachifyError<E> {
    /// Recovers the wrapped function's own error, if that is what this is.
    pub fn into_computation(self) -> Option<E> {
        match self {
            CachifyError::Computation(err) => Some(err),
            _ => None,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for memoized calls.
pub type Result<T, E> = std::result::Result<T, CachifyError<E>>;
