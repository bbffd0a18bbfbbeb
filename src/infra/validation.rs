//! Utilities for validating constraints on types.

use validator::{Validate, ValidationErrors};

/// A type that cannot be instatiated without validating the value within.
/// That is, if you have a [`Valid<T>`], `T` is guaranteed to be valid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Valid<T> {
    value: T,
}

impl<T: Validate> Valid<T> {
    /// Constructs a new validated value.
    pub fn new(value: T) -> Result<Valid<T>, ValidationErrors> {
        value.validate().map(|_| Valid { value })
    }
}

impl<T> Valid<T> {
    /// Returns a reference to the validated value.
    pub fn inner(&self) -> &T {
        &self.value
    }

    /// Returns the validated value.
    pub fn into_inner(self) -> T {
        self.value
    }
}
