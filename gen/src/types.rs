//! Semantic type descriptors used throughout the goal model
//!
//! The discovery collaborator hands types over as `syn::Type` values;
//! [`TypeRef`] wraps them with the two classifications the synthesis
//! core cares about: primitiveness (suppresses null-checks) and
//! recognized collection shapes (enables collection shortcuts).

use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use strum::Display;
use syn::Type;

/// Scalar types that can never be absent; a null-check is never emitted
/// for them regardless of the parameter's policy.
const PRIMITIVES: &[&str] = &[
    "bool", "char", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32", "u64", "u128",
    "usize", "f32", "f64",
];

/// Semantic type descriptor: a `syn::Type` plus its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    ty:        Type,
    primitive: bool,
}

impl TypeRef {
    /// Wraps a type, classifying primitives by their path.
    #[must_use]
    pub fn new(ty: Type) -> Self {
        let primitive = last_segment(&ty).is_some_and(|name| PRIMITIVES.contains(&name.as_str()));
        Self { ty, primitive }
    }

    /// The unit type, used as terminal type of void method goals.
    #[must_use]
    pub fn unit() -> Self {
        Self::new(syn::parse_quote!(()))
    }

    /// Whether this is a scalar that can never be absent.
    #[must_use]
    pub const fn is_primitive(&self) -> bool {
        self.primitive
    }

    /// Whether this is the unit type.
    #[must_use]
    pub fn is_unit(&self) -> bool {
        matches!(&self.ty, Type::Tuple(tuple) if tuple.elems.is_empty())
    }

    /// The recognized collection shape of this type, if any.
    #[must_use]
    pub fn collection_kind(&self) -> Option<CollectionKind> {
        last_segment(&self.ty).and_then(|name| CollectionKind::from_segment(&name))
    }

    /// The wrapped syntactic type.
    #[must_use]
    pub const fn as_type(&self) -> &Type {
        &self.ty
    }

    /// Last path segment, used to derive field and variable names.
    #[must_use]
    pub fn simple_name(&self) -> Option<String> {
        last_segment(&self.ty)
    }
}

impl ToTokens for TypeRef {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        self.ty.to_tokens(tokens);
    }
}

fn last_segment(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(path) => path.path.segments.last().map(|s| s.ident.to_string()),
        _ => None,
    }
}

/// Collection shapes with a canonical empty-constructor expression.
///
/// Only these types are eligible for collection-shortcut methods; a
/// shortcut requested for anything else is a generation invariant
/// violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum CollectionKind {
    Vec,
    VecDeque,
    HashSet,
    BTreeSet,
    HashMap,
    BTreeMap,
}

impl CollectionKind {
    fn from_segment(name: &str) -> Option<Self> {
        match name {
            "Vec" => Some(Self::Vec),
            "VecDeque" => Some(Self::VecDeque),
            "HashSet" => Some(Self::HashSet),
            "BTreeSet" => Some(Self::BTreeSet),
            "HashMap" => Some(Self::HashMap),
            "BTreeMap" => Some(Self::BTreeMap),
            _ => None,
        }
    }

    /// The canonical empty-instance expression assigned by a shortcut.
    #[must_use]
    pub fn empty_expr(self) -> TokenStream {
        match self {
            Self::Vec => quote!(::std::vec::Vec::new()),
            Self::VecDeque => quote!(::std::collections::VecDeque::new()),
            Self::HashSet => quote!(::std::collections::HashSet::new()),
            Self::BTreeSet => quote!(::std::collections::BTreeSet::new()),
            Self::HashMap => quote!(::std::collections::HashMap::new()),
            Self::BTreeMap => quote!(::std::collections::BTreeMap::new()),
        }
    }
}

/// Access level of generated entry functions and nested types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Access {
    #[default]
    Public,
    Crate,
    Private,
}

impl ToTokens for Access {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        match self {
            Self::Public => tokens.extend(quote!(pub)),
            Self::Crate => tokens.extend(quote!(pub(crate))),
            Self::Private => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_classification() {
        assert!(TypeRef::new(syn::parse_quote!(i32)).is_primitive());
        assert!(TypeRef::new(syn::parse_quote!(bool)).is_primitive());
        assert!(!TypeRef::new(syn::parse_quote!(String)).is_primitive());
        assert!(!TypeRef::new(syn::parse_quote!(Vec<String>)).is_primitive());
    }

    #[test]
    fn test_unit_type() {
        assert!(TypeRef::unit().is_unit());
        assert!(!TypeRef::new(syn::parse_quote!(Point)).is_unit());
    }

    #[test]
    fn test_collection_recognition() {
        let notes = TypeRef::new(syn::parse_quote!(Vec<String>));
        assert_eq!(notes.collection_kind(), Some(CollectionKind::Vec));

        let tags = TypeRef::new(syn::parse_quote!(std::collections::HashSet<u32>));
        assert_eq!(tags.collection_kind(), Some(CollectionKind::HashSet));

        assert_eq!(TypeRef::new(syn::parse_quote!(String)).collection_kind(), None);
    }

    #[test]
    fn test_empty_expr_renders_canonical_constructor() {
        assert_eq!(CollectionKind::Vec.empty_expr().to_string(), quote!(::std::vec::Vec::new()).to_string());
    }

    #[test]
    fn test_access_rendering() {
        let public = Access::Public;
        let private = Access::Private;
        assert_eq!(quote!(#public).to_string(), "pub");
        assert_eq!(quote!(#private).to_string(), "");
    }
}
