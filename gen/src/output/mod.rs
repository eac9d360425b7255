//! Abstract definitions handed to the emission collaborator
//!
//! The synthesis modules produce type and method *definitions*, not
//! text: a [`TypeDef`] carries fields and methods, and a method body is
//! an ordered sequence of [`Instr`] values (bind, assign, null-check,
//! return). The emission backend may consume the structured model
//! directly or take the [`quote::ToTokens`] rendering; tests do both.

mod instr;
mod render;

pub use instr::{Expr, Instr, Place};

use proc_macro2::TokenStream;
use syn::Ident;

use crate::types::{Access, TypeRef};

/// One formal parameter of a generated method.
#[derive(Debug, Clone)]
pub struct ParamDef {
    /// Parameter name.
    pub name: Ident,
    /// Parameter type, as rendered.
    pub ty:   TokenStream,
}

impl ParamDef {
    /// Creates a parameter definition.
    #[must_use]
    pub const fn new(name: Ident, ty: TokenStream) -> Self {
        Self { name, ty }
    }
}

/// Receiver of a generated method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverKind {
    /// Free function (the entry methods).
    Function,
    /// `&mut self` method on the implementation type.
    RefMutSelf,
}

/// A generated method: signature plus body instructions.
///
/// On a contract the body is empty and only the signature renders.
#[derive(Debug, Clone)]
pub struct MethodDef {
    /// Method name.
    pub name:     Ident,
    /// Visibility; ignored inside trait definitions.
    pub access:   Access,
    /// Receiver kind.
    pub receiver: ReceiverKind,
    /// Formal parameters, in order.
    pub params:   Vec<ParamDef>,
    /// Return type, if any.
    pub ret:      Option<TokenStream>,
    /// Ordered body instructions.
    pub body:     Vec<Instr>,
    /// Exception types declared for the emission backend; carried as
    /// metadata, not rendered.
    pub throws:   Vec<TypeRef>,
}

/// A generated field.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// Field name.
    pub name: Ident,
    /// Field type, as rendered.
    pub ty:   TokenStream,
}

impl FieldDef {
    /// Creates a field definition.
    #[must_use]
    pub const fn new(name: Ident, ty: TokenStream) -> Self {
        Self { name, ty }
    }
}

/// One `impl` surface of an implementation type: either an inherent
/// block, or the block implementing a named contract.
#[derive(Debug, Clone)]
pub struct ImplBlock {
    /// Contract implemented by this block; `None` for inherent methods.
    pub contract: Option<Ident>,
    /// The block's methods.
    pub methods:  Vec<MethodDef>,
}

/// The shape of a generated type.
#[derive(Debug, Clone)]
pub enum TypeKind {
    /// A step contract: trait with method signatures only.
    Contract {
        /// Signatures declared by the contract.
        methods: Vec<MethodDef>,
    },
    /// An implementation type: struct, fields, impl blocks.
    Implementation {
        /// Private fields.
        fields:  Vec<FieldDef>,
        /// Inherent and contract impl blocks.
        impls:   Vec<ImplBlock>,
        /// Whether the type participates in the reuse cache; emits the
        /// `stepgen_runtime::Recycle` wiring.
        recycle: bool,
    },
}

/// A generated type definition.
#[derive(Debug, Clone)]
pub struct TypeDef {
    /// Type name.
    pub name:   Ident,
    /// Visibility.
    pub access: Access,
    /// Shape and members.
    pub kind:   TypeKind,
}

/// Everything generated for one generation unit: the enclosing module,
/// its types, entry functions, and the shared cache struct when any
/// goal reuses instances.
#[derive(Debug, Clone)]
pub struct GeneratedUnit {
    /// Name of the enclosing generated module.
    pub module_name: Ident,
    /// Module visibility.
    pub access:      Access,
    /// Generated contracts and implementation types, all goals.
    pub types:       Vec<TypeDef>,
    /// Entry functions, one or two per goal.
    pub entries:     Vec<MethodDef>,
    /// The unit's cache struct, present when any goal reuses instances.
    pub cache:       Option<TypeDef>,
}
