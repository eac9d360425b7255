//! Ordered synthesis instructions forming generated method bodies

use proc_macro2::TokenStream;
use syn::Ident;

use crate::types::{CollectionKind, TypeRef};

/// A place an [`Instr::Assign`] writes to.
#[derive(Debug, Clone)]
pub enum Place {
    /// `self.<name>`.
    SelfField(Ident),
    /// `<base>.<name>`.
    FieldOf {
        /// Local holding the object written through.
        base: Ident,
        /// Field name.
        name: Ident,
    },
    /// A local binding.
    Var(Ident),
}

/// An expression appearing in generated method bodies.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A local or parameter by name.
    Var(Ident),
    /// The implementation instance itself (fluent returns).
    SelfRef,
    /// `self.<name>`.
    SelfField(Ident),
    /// `<base>.<name>` on a local.
    FieldOf {
        /// Local holding the object read through.
        base: Ident,
        /// Field name.
        name: Ident,
    },
    /// Boolean literal.
    Bool(bool),
    /// The type's null/default value.
    DefaultValue,
    /// Canonical empty instance of a recognized collection.
    EmptyCollection(CollectionKind),
    /// Constructor invocation: `<ty>::new(args...)`.
    New {
        /// Constructed type.
        ty:   TypeRef,
        /// Arguments, in declaration order.
        args: Vec<Expr>,
    },
    /// Static method invocation: `<ty>::<method>(args...)`.
    StaticCall {
        /// Type owning the method.
        ty:     TypeRef,
        /// Method name.
        method: Ident,
        /// Arguments, in declaration order.
        args:   Vec<Expr>,
    },
    /// Instance method invocation: `<recv>.<method>(args...)`.
    MethodCall {
        /// Receiver expression.
        recv:   Box<Expr>,
        /// Method name.
        method: Ident,
        /// Arguments, in declaration order.
        args:   Vec<Expr>,
    },
    /// Acquire the goal's cached implementation from the worker
    /// context, replacing a busy instance (`ReuseInstances` entries).
    AcquireSlot {
        /// Generation unit name, as the cache map key.
        unit:       String,
        /// The unit's cache struct.
        cache_type: Ident,
        /// Field of the cache struct holding this goal's instance.
        field:      Ident,
    },
    /// Escape hatch for rendered fragments with no structured form.
    Verbatim(TokenStream),
}

impl Expr {
    /// Convenience for `Expr::Var`.
    #[must_use]
    pub const fn var(name: Ident) -> Self {
        Self::Var(name)
    }
}

/// One ordered instruction of a generated method body.
#[derive(Debug, Clone)]
pub enum Instr {
    /// `let mut <name> = <expr>;`
    Bind {
        /// Name of the local.
        name: Ident,
        /// Initializer.
        expr: Expr,
    },
    /// `<place> = <expr>;`
    Assign {
        /// Destination.
        place: Place,
        /// Value.
        expr:  Expr,
    },
    /// Required-argument guard, named for the parameter it protects.
    NullCheck {
        /// Parameter name reported on failure.
        parameter: Ident,
        /// Value inspected by the guard.
        subject:   Expr,
    },
    /// Evaluate for effect only (void invocations).
    Eval {
        /// The discarded expression.
        expr: Expr,
    },
    /// `return <expr>;` or a bare `return;`
    Return {
        /// Returned value, if any.
        expr: Option<Expr>,
    },
}

impl Instr {
    /// Whether this instruction is a null-check for `parameter`.
    #[must_use]
    pub fn is_null_check_for(&self, parameter: &str) -> bool {
        matches!(self, Self::NullCheck { parameter: name, .. } if name == parameter)
    }
}
