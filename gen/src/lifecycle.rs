//! Instance lifecycle policy: fresh allocation vs. per-worker reuse
//!
//! The policy decides how generated entry methods obtain their
//! implementation instance and what the terminal methods do on
//! completion. Under `ReuseInstances` the instance comes from the
//! unit's cache slot in the explicit
//! [`WorkerContext`](stepgen_runtime::WorkerContext); a busy slot
//! (same-thread reentrancy) is replaced with a fresh instance rather
//! than corrupted. `NewInstance` goals skip the machinery entirely.

use proc_macro2::TokenStream;
use quote::quote;
use strum::Display;
use syn::Ident;

use crate::goal::GenerationUnit;
use crate::naming::{self, NamingExt};
use crate::output::{Expr, FieldDef, Instr, ParamDef, Place, TypeDef, TypeKind};
use crate::param::Parameter;
use crate::types::{Access, TypeRef};

/// Name of the reentrancy flag on reusable implementation structs.
pub const IN_USE_FIELD: &str = "currently_in_use";

/// Allocation policy for every goal of a generation unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum LifecyclePolicy {
    /// Allocate a fresh implementation instance per entry call.
    #[default]
    NewInstance,
    /// Recycle one instance per generation unit per logical thread,
    /// guarded by the in-use flag.
    ReuseInstances,
}

impl LifecyclePolicy {
    /// Whether instances are recycled from the worker cache.
    #[must_use]
    pub const fn reuses(self) -> bool {
        matches!(self, Self::ReuseInstances)
    }
}

/// The extra entry parameter threading the worker cache through the
/// call chain (`ReuseInstances` only).
#[must_use]
pub fn ctx_param() -> ParamDef {
    ParamDef::new("ctx".as_ident(), quote!(&mut ::stepgen_runtime::WorkerContext))
}

/// Extra implementation field carrying the reentrancy flag.
#[must_use]
pub fn in_use_field() -> FieldDef {
    FieldDef::new(IN_USE_FIELD.as_ident(), quote!(bool))
}

/// Binds `var` to this goal's implementation instance at entry.
///
/// Reusing goals acquire from the unit's cache slot, replacing a busy
/// instance; the rest allocate fresh.
#[must_use]
pub fn entry_acquire(unit: &GenerationUnit, impl_type: &Ident, var: &Ident) -> Instr {
    let expr = if unit.lifecycle.reuses() {
        Expr::AcquireSlot {
            unit:       unit.module_name.to_string(),
            cache_type: unit.cache_type.clone(),
            field:      naming::cache_field(impl_type),
        }
    } else {
        Expr::StaticCall {
            ty:     type_ref(impl_type),
            method: "default".as_ident(),
            args:   vec![],
        }
    };
    Instr::Bind { name: var.clone(), expr }
}

/// First effect of a terminal method on a cached instance: mark it
/// free, so the instance is reusable as soon as its values have been
/// read.
#[must_use]
pub fn mark_free() -> Instr {
    Instr::Assign {
        place: Place::SelfField(IN_USE_FIELD.as_ident()),
        expr:  Expr::Bool(false),
    }
}

/// Resets every non-primitive stored field to its default after the
/// final invocation, so references do not outlive the call via the
/// cached instance.
pub fn clear_fields<'a>(parameters: impl IntoIterator<Item = &'a Parameter>) -> Vec<Instr> {
    parameters
        .into_iter()
        .filter(|parameter| !parameter.ty.is_primitive())
        .map(|parameter| Instr::Assign {
            place: Place::SelfField(parameter.name.clone()),
            expr:  Expr::DefaultValue,
        })
        .collect()
}

/// The unit's cache struct: one field per reusable implementation
/// type, `Default`-constructed lazily by the worker context.
#[must_use]
pub fn cache_struct(unit: &GenerationUnit, slots: Vec<FieldDef>) -> TypeDef {
    TypeDef {
        name:   unit.cache_type.clone(),
        access: Access::Private,
        kind:   TypeKind::Implementation {
            fields:  slots,
            impls:   vec![],
            recycle: false,
        },
    }
}

/// The cache slot descriptor for one goal's implementation type.
#[must_use]
pub fn cache_slot(impl_type: &Ident) -> FieldDef {
    FieldDef::new(naming::cache_field(impl_type), ident_tokens(impl_type))
}

fn type_ref(name: &Ident) -> TypeRef {
    TypeRef::new(syn::Type::Path(syn::TypePath {
        qself: None,
        path:  name.clone().into(),
    }))
}

fn ident_tokens(name: &Ident) -> TokenStream {
    quote!(#name)
}

#[cfg(test)]
mod tests {
    use quote::ToTokens;

    use super::*;

    fn reuse_unit() -> GenerationUnit {
        GenerationUnit::new(
            "Point",
            TypeRef::new(syn::parse_quote!(Point)),
            LifecyclePolicy::ReuseInstances,
        )
    }

    #[test]
    fn test_reusing_entry_acquires_from_the_unit_slot() {
        let unit = reuse_unit();
        let acquire = entry_acquire(&unit, &"PointBuilderImpl".as_ident(), &"builder".as_ident());
        let rendered = acquire.to_token_stream().to_string();
        assert!(rendered.contains("stepgen_runtime :: acquire"));
        assert!(rendered.contains("unit_cache :: < PointBuildersCache >"));
        assert!(rendered.contains("\"point_builders\""));
        assert!(rendered.contains("point_builder_impl"));
    }

    #[test]
    fn test_new_instance_entry_allocates_fresh() {
        let unit = GenerationUnit::new(
            "Point",
            TypeRef::new(syn::parse_quote!(Point)),
            LifecyclePolicy::NewInstance,
        );
        let acquire = entry_acquire(&unit, &"PointBuilderImpl".as_ident(), &"builder".as_ident());
        let rendered = acquire.to_token_stream().to_string();
        assert!(rendered.contains("PointBuilderImpl :: default ()"));
        assert!(!rendered.contains("acquire"));
    }

    #[test]
    fn test_clear_fields_skips_primitives() {
        let parameters = vec![
            Parameter::new("x".as_ident(), TypeRef::new(syn::parse_quote!(i32))),
            Parameter::new("label".as_ident(), TypeRef::new(syn::parse_quote!(String))),
        ];
        let clears = clear_fields(&parameters);
        assert_eq!(clears.len(), 1);
        let rendered = clears[0].to_token_stream().to_string();
        assert!(rendered.contains("self . label"));
    }
}
