//! Parameter model: one formal argument of a goal, or one settable bean
//! property
//!
//! A [`Parameter`] knows its name, type and null policy. Updater goals
//! additionally carry a [`Projection`] per parameter describing how the
//! current value is read back out of an existing instance.

use strum::Display;
use syn::Ident;

use crate::types::TypeRef;

/// Whether a runtime null-check is emitted for a reference parameter.
///
/// Primitive types never receive a check regardless of policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum NullPolicy {
    #[default]
    Reject,
    Allow,
}

/// One formal argument of a goal.
#[derive(Debug, Clone)]
pub struct Parameter {
    /// Identifier, unique within a goal.
    pub name:        Ident,
    /// Semantic type descriptor.
    pub ty:          TypeRef,
    /// Null-check policy for reference types.
    pub null_policy: NullPolicy,
}

impl Parameter {
    /// Creates a parameter with the default `Reject` policy.
    #[must_use]
    pub fn new(name: Ident, ty: TypeRef) -> Self {
        Self {
            name,
            ty,
            null_policy: NullPolicy::default(),
        }
    }

    /// Creates a parameter that accepts absent values.
    #[must_use]
    pub fn nullable(name: Ident, ty: TypeRef) -> Self {
        Self {
            name,
            ty,
            null_policy: NullPolicy::Allow,
        }
    }

    /// Whether a null-check is emitted when this parameter is assigned.
    #[must_use]
    pub fn checks_null(&self) -> bool {
        self.null_policy == NullPolicy::Reject && !self.ty.is_primitive()
    }
}

/// How a parameter's current value is read out of an existing instance.
#[derive(Debug, Clone)]
pub enum Projection {
    /// Accessor method call, with the exception types it may raise.
    Method {
        /// Accessor name (`x()`, `get_notes()`).
        name:   Ident,
        /// Exception types declared by the accessor.
        thrown: Vec<TypeRef>,
    },
    /// Direct field read.
    Field {
        /// Field name on the existing instance.
        name: Ident,
    },
}

impl Projection {
    /// Exception types raised when reading this projection.
    #[must_use]
    pub fn thrown(&self) -> &[TypeRef] {
        match self {
            Self::Method { thrown, .. } => thrown,
            Self::Field { .. } => &[],
        }
    }
}

/// A parameter together with the projection an updater copies it from.
#[derive(Debug, Clone)]
pub struct ProjectedParameter {
    /// The underlying parameter.
    pub parameter:  Parameter,
    /// How the current value is read from the existing instance.
    pub projection: Projection,
}
