//! Required-argument checks emitted by generated null-checks
//!
//! A `Reject`-policy reference parameter compiles to a guard at
//! builder-step or updater-entry time. The guard calls
//! [`check_required`]; an absent value raises
//! [`RequiredArgumentMissing`] named for the parameter, surfaced to the
//! end caller of the generated code and never recovered internally.

use thiserror::Error;

/// Failure raised when a required reference argument is absent.
#[derive(Debug, Error)]
#[error("required argument missing: {name}")]
pub struct RequiredArgumentMissing {
    /// Name of the parameter whose value was absent.
    pub name: &'static str,
}

/// Absence test used by generated null-checks.
///
/// `Option` is the reference-nullability analog the generated code works
/// with; anything else a backend maps onto the check can implement this.
pub trait MaybeMissing {
    /// Whether the value is absent.
    fn is_missing(&self) -> bool;
}

impl<T> MaybeMissing for Option<T> {
    fn is_missing(&self) -> bool {
        self.is_none()
    }
}

impl<T: MaybeMissing + ?Sized> MaybeMissing for &T {
    fn is_missing(&self) -> bool {
        (**self).is_missing()
    }
}

/// Guard emitted ahead of the assignment in a generated step method.
pub fn check_required<T: MaybeMissing>(name: &'static str, value: &T) {
    if value.is_missing() {
        missing_argument(name);
    }
}

/// Raises [`RequiredArgumentMissing`] for `name`.
pub fn missing_argument(name: &'static str) -> ! {
    panic!("{}", RequiredArgumentMissing { name })
}
