//! Name derivation for synthesized types and entry functions
//!
//! All generated names funnel through this module so that the contract
//! between the modules stays consistent: step contracts are
//! `UpperCamel`, entry functions and fields are `snake_case`.

use heck::{ToSnakeCase, ToUpperCamelCase};
use proc_macro2::Span;
use syn::Ident;

/// Extension trait for deriving generated identifiers from source names.
pub trait NamingExt {
    /// `UpperCamelCase` form, e.g. step contract name segments.
    fn upcased(&self) -> String;

    /// `snake_case` form, e.g. entry functions and cache fields.
    fn downcased(&self) -> String;

    /// The string as a call-site identifier.
    fn as_ident(&self) -> Ident;
}

impl NamingExt for str {
    fn upcased(&self) -> String {
        self.to_upper_camel_case()
    }

    fn downcased(&self) -> String {
        self.to_snake_case()
    }

    fn as_ident(&self) -> Ident {
        Ident::new(self, Span::call_site())
    }
}

/// Name of the contract trait for one step: goal name, then module
/// name, then the upcased parameter (`PointBuilderX`).
pub fn step_contract(goal: &str, module: &str, parameter: &str) -> Ident {
    format!("{}{}{}", goal.upcased(), module.upcased(), parameter.upcased()).as_ident()
}

/// Name of the implementation struct for a goal's module
/// (`PointBuilderImpl`, `PointUpdater`).
pub fn impl_type(goal: &str, module: &str, suffix: &str) -> Ident {
    format!("{}{}{}", goal.upcased(), module.upcased(), suffix).as_ident()
}

/// Name of the flat updater contract trait (`PointUpdate`).
pub fn updater_contract(goal: &str) -> Ident {
    format!("{}Update", goal.upcased()).as_ident()
}

/// Name of the entry function (`point_builder`, `point_updater`).
pub fn entry_method(goal: &str, module: &str) -> Ident {
    format!("{}_{}", goal.downcased(), module.downcased()).as_ident()
}

/// Name of the per-goal cache field inside the unit's cache struct.
pub fn cache_field(impl_type: &Ident) -> Ident {
    impl_type.to_string().downcased().as_ident()
}

/// Name of the generated module enclosing one unit's output
/// (`point_builders`).
pub fn unit_module(source_type: &str) -> Ident {
    format!("{}_builders", source_type.downcased()).as_ident()
}

/// Name of the unit's cache struct (`PointBuildersCache`).
pub fn unit_cache_type(source_type: &str) -> Ident {
    format!("{}BuildersCache", source_type.upcased()).as_ident()
}
