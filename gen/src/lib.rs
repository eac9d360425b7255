//! Goal analysis and code synthesis for fluent step builders and
//! step updaters
//!
//! Given the description of a *goal* (a constructor, static method or
//! instance method to invoke, or a bean-style object to populate) this
//! crate synthesizes the definitions of fluent step-builder and
//! step-updater types: an ordered chain of typed steps that forces
//! callers to supply required parameters in a fixed order before the
//! final object is produced, and a flat updater pre-populated from an
//! existing instance.
//!
//! The crate neither discovers goals nor writes files. Descriptions
//! arrive pre-validated from a discovery collaborator (for instance a
//! derive front end built on `syn`), and the synthesized
//! [`output::GeneratedUnit`] goes to an emission collaborator, either
//! as the structured definition model or rendered to a
//! [`proc_macro2::TokenStream`] via [`quote::ToTokens`].
//!
//! Data flows one direction through the crate:
//! [`param`] → [`step`] → [`goal`] → the synthesis modules in
//! [`modules`], with [`lifecycle`] as a cross-cutting concern. Code
//! generated under the `ReuseInstances` policy recycles its
//! implementation objects through the explicit per-worker cache in the
//! companion `stepgen_runtime` crate.
//!
//! # Example
//!
//! ```
//! use quote::ToTokens;
//! use stepgen::generator::{GoalInput, generate};
//! use stepgen::goal::{GenerationUnit, GoalDescription, RegularGoal, RegularKind};
//! use stepgen::lifecycle::LifecyclePolicy;
//! use stepgen::naming::NamingExt;
//! use stepgen::param::Parameter;
//! use stepgen::types::{Access, TypeRef};
//!
//! let goal = GoalDescription::Regular(RegularGoal {
//!     name:       "point".to_string(),
//!     goal_type:  TypeRef::new(syn::parse_quote!(Point)),
//!     kind:       RegularKind::Constructor,
//!     parameters: vec![
//!         Parameter::new("x".as_ident(), TypeRef::new(syn::parse_quote!(i32))),
//!         Parameter::new("y".as_ident(), TypeRef::new(syn::parse_quote!(i32))),
//!     ],
//!     step_order: None,
//!     thrown:     vec![],
//!     access:     Access::Public,
//! });
//! let unit = GenerationUnit::new(
//!     "Point",
//!     TypeRef::new(syn::parse_quote!(Point)),
//!     LifecyclePolicy::NewInstance,
//! );
//!
//! let generated = generate(&unit, &[GoalInput::Builder(goal)]);
//! let rendered = generated.to_token_stream().to_string();
//! assert!(rendered.contains("point_builder"));
//! ```

pub mod error;
pub mod generator;
pub mod goal;
pub mod lifecycle;
pub mod modules;
pub mod naming;
pub mod output;
pub mod param;
pub mod step;
pub mod types;

pub use error::{Error, Result};
pub use generator::{GoalInput, generate};
