//! Updater module: flat, pre-populated mutable updaters
//!
//! Unlike the builder's chained contracts, an updater exposes every
//! setter on one type, in any order, any subset. The entry function
//! copies the existing instance's current values in through the
//! parameter projections; `done()` re-invokes the goal with the current
//! field values. On reusable implementations `done()` frees the cached
//! instance as its first effect (the invocation only reads values
//! already captured in its argument expressions) and resets reference
//! fields afterwards so the cache does not extend object lifetimes.

use itertools::Itertools;
use proc_macro2::TokenStream;
use quote::{ToTokens, quote};
use syn::Ident;

use crate::error::Result;
use crate::goal::{BeanGoal, GenerationUnit, ProjectedDescription, ProjectedGoal};
use crate::lifecycle;
use crate::modules::invoke;
use crate::naming::{self, NamingExt};
use crate::output::{
    Expr, FieldDef, ImplBlock, Instr, MethodDef, ParamDef, Place, ReceiverKind, TypeDef, TypeKind,
};
use crate::param::{Parameter, Projection};
use crate::types::{Access, TypeRef};

use super::RECEIVER_FIELD;

const MODULE: &str = "updater";

/// Everything the updater module produces for one goal.
#[derive(Debug, Clone)]
pub struct UpdaterOutput {
    /// The flat contract exposing every setter.
    pub contract:   TypeDef,
    /// The implementation type.
    pub impl_type:  TypeDef,
    /// The `<goal_name>_updater` entry function.
    pub entry:      MethodDef,
    /// Cache slot descriptor, present under `ReuseInstances`.
    pub cache_slot: Option<FieldDef>,
}

/// Synthesizes the updater surface for one projected goal.
pub fn synthesize_updater(goal: &ProjectedDescription, unit: &GenerationUnit) -> Result<UpdaterOutput> {
    match goal {
        ProjectedDescription::Regular(goal) => Ok(regular_updater(goal, unit)),
        ProjectedDescription::Bean(goal) => Ok(bean_updater(goal, unit)),
    }
}

fn regular_updater(goal: &ProjectedGoal, unit: &GenerationUnit) -> UpdaterOutput {
    let impl_name = naming::impl_type(&goal.name, MODULE, "");
    let contract_name = naming::updater_contract(&goal.name);

    let setters: Vec<MethodDef> = goal
        .parameters
        .iter()
        .map(|projected| setter_method(&projected.parameter))
        .collect();
    let done = done_method(goal, unit);

    let mut fields: Vec<FieldDef> = goal
        .parameters
        .iter()
        .map(|projected| {
            let ty = &projected.parameter.ty;
            FieldDef::new(projected.parameter.name.clone(), quote!(#ty))
        })
        .collect();
    if let Some(receiver) = goal.receiver() {
        fields.push(FieldDef::new(RECEIVER_FIELD.as_ident(), quote!(#receiver)));
    }
    if unit.lifecycle.reuses() {
        fields.push(lifecycle::in_use_field());
    }

    UpdaterOutput {
        contract:   TypeDef {
            name:   contract_name.clone(),
            access: goal.access,
            kind:   TypeKind::Contract {
                methods: setters.clone(),
            },
        },
        impl_type:  TypeDef {
            name:   impl_name.clone(),
            access: goal.access,
            kind:   TypeKind::Implementation {
                fields,
                impls: vec![
                    ImplBlock {
                        contract: Some(contract_name),
                        methods:  setters,
                    },
                    ImplBlock {
                        contract: None,
                        methods:  vec![done],
                    },
                ],
                recycle: unit.lifecycle.reuses(),
            },
        },
        entry:      regular_entry(goal, unit, &impl_name),
        cache_slot: unit.lifecycle.reuses().then(|| lifecycle::cache_slot(&impl_name)),
    }
}

/// One flat setter: overwrite the field, return the updater.
fn setter_method(parameter: &Parameter) -> MethodDef {
    let name = parameter.name.clone();
    let ty = &parameter.ty;
    MethodDef {
        name:     name.clone(),
        access:   Access::Public,
        receiver: ReceiverKind::RefMutSelf,
        params:   vec![ParamDef::new(name.clone(), quote!(#ty))],
        ret:      Some(quote!(&mut Self)),
        body:     vec![
            Instr::Assign {
                place: Place::SelfField(name.clone()),
                expr:  Expr::Var(name),
            },
            Instr::Return {
                expr: Some(Expr::SelfRef),
            },
        ],
        throws:   vec![],
    }
}

/// `done()`: free the cached instance, re-invoke the goal with the
/// current field values, reset reference fields, return the result.
fn done_method(goal: &ProjectedGoal, unit: &GenerationUnit) -> MethodDef {
    let mut body = Vec::new();
    if unit.lifecycle.reuses() {
        body.push(lifecycle::mark_free());
    }
    let invocation = invoke::invocation(unit, goal, |parameter| {
        Expr::SelfField(parameter.name.clone())
    });
    let mut clears = lifecycle::clear_fields(
        goal.parameters.iter().map(|projected| &projected.parameter),
    );
    if goal.receiver().is_some() {
        clears.push(Instr::Assign {
            place: Place::SelfField(RECEIVER_FIELD.as_ident()),
            expr:  Expr::DefaultValue,
        });
    }
    body.extend(invoke::finish(&goal.goal_type, invocation, clears));

    let goal_type = &goal.goal_type;
    MethodDef {
        name: "done".as_ident(),
        access: Access::Public,
        receiver: ReceiverKind::RefMutSelf,
        params: vec![],
        ret: (!goal.goal_type.is_unit()).then(|| quote!(#goal_type)),
        body,
        throws: goal.thrown.clone(),
    }
}

fn regular_entry(goal: &ProjectedGoal, unit: &GenerationUnit, impl_name: &Ident) -> MethodDef {
    let existing = existing_var(&goal.goal_type);
    let updater = "updater".as_ident();

    let mut params = Vec::new();
    if unit.lifecycle.reuses() {
        params.push(lifecycle::ctx_param());
    }
    if let Some(receiver) = goal.receiver() {
        params.push(ParamDef::new(RECEIVER_FIELD.as_ident(), quote!(#receiver)));
    }
    let goal_type = &goal.goal_type;
    params.push(ParamDef::new(existing.clone(), quote!(#goal_type)));

    let mut body = Vec::new();
    // Null-checks run against the projections before anything is
    // copied; values validated here are not re-checked later.
    for projected in &goal.parameters {
        if projected.parameter.checks_null() {
            body.push(Instr::NullCheck {
                parameter: projected.parameter.name.clone(),
                subject:   projection_expr(&existing, &projected.projection),
            });
        }
    }
    body.push(lifecycle::entry_acquire(unit, impl_name, &updater));
    for projected in &goal.parameters {
        body.push(Instr::Assign {
            place: Place::FieldOf {
                base: updater.clone(),
                name: projected.parameter.name.clone(),
            },
            expr:  projection_expr(&existing, &projected.projection),
        });
    }
    if goal.receiver().is_some() {
        body.push(Instr::Assign {
            place: Place::FieldOf {
                base: updater.clone(),
                name: RECEIVER_FIELD.as_ident(),
            },
            expr:  Expr::Var(RECEIVER_FIELD.as_ident()),
        });
    }
    body.push(Instr::Return {
        expr: Some(Expr::Var(updater)),
    });

    MethodDef {
        name: naming::entry_method(&goal.name, MODULE),
        access: goal.access,
        receiver: ReceiverKind::Function,
        params,
        ret: Some(updater_ret(impl_name, unit)),
        body,
        throws: thrown_by_projections(goal),
    }
}

/// Reads one parameter's current value off the existing instance.
fn projection_expr(existing: &Ident, projection: &Projection) -> Expr {
    match projection {
        Projection::Method { name, .. } => Expr::MethodCall {
            recv:   Box::new(Expr::Var(existing.clone())),
            method: name.clone(),
            args:   vec![],
        },
        Projection::Field { name } => Expr::FieldOf {
            base: existing.clone(),
            name: name.clone(),
        },
    }
}

/// Exception types any projection read may raise, deduplicated.
fn thrown_by_projections(goal: &ProjectedGoal) -> Vec<TypeRef> {
    goal.parameters
        .iter()
        .flat_map(|projected| projected.projection.thrown().iter().cloned())
        .unique_by(|ty| ty.to_token_stream().to_string())
        .collect()
}

fn bean_updater(goal: &BeanGoal, unit: &GenerationUnit) -> UpdaterOutput {
    let impl_name = naming::impl_type(&goal.name, MODULE, "");
    let contract_name = naming::updater_contract(&goal.name);
    let bean = goal
        .goal_type
        .simple_name()
        .map_or_else(|| "bean".to_string(), |name| name.downcased())
        .as_ident();

    // Only settable properties appear on the contract; live collections
    // are copied at entry and stay reachable through the bean.
    let setters: Vec<MethodDef> = goal
        .properties
        .iter()
        .filter_map(|property| {
            property
                .setter
                .as_ref()
                .map(|setter| bean_setter_method(&property.parameter, setter, &bean))
        })
        .collect();
    let done = bean_done_method(goal, unit, &bean);

    let goal_type = &goal.goal_type;
    let mut fields = vec![FieldDef::new(bean.clone(), quote!(#goal_type))];
    if unit.lifecycle.reuses() {
        fields.push(lifecycle::in_use_field());
    }

    UpdaterOutput {
        contract:   TypeDef {
            name:   contract_name.clone(),
            access: goal.access,
            kind:   TypeKind::Contract {
                methods: setters.clone(),
            },
        },
        impl_type:  TypeDef {
            name:   impl_name.clone(),
            access: goal.access,
            kind:   TypeKind::Implementation {
                fields,
                impls: vec![
                    ImplBlock {
                        contract: Some(contract_name),
                        methods:  setters,
                    },
                    ImplBlock {
                        contract: None,
                        methods:  vec![done],
                    },
                ],
                recycle: unit.lifecycle.reuses(),
            },
        },
        entry:      bean_entry(goal, unit, &impl_name, &bean),
        cache_slot: unit.lifecycle.reuses().then(|| lifecycle::cache_slot(&impl_name)),
    }
}

fn bean_setter_method(parameter: &Parameter, setter: &Ident, bean: &Ident) -> MethodDef {
    let name = parameter.name.clone();
    let ty = &parameter.ty;
    MethodDef {
        name:     name.clone(),
        access:   Access::Public,
        receiver: ReceiverKind::RefMutSelf,
        params:   vec![ParamDef::new(name.clone(), quote!(#ty))],
        ret:      Some(quote!(&mut Self)),
        body:     vec![
            Instr::Eval {
                expr: Expr::MethodCall {
                    recv:   Box::new(Expr::SelfField(bean.clone())),
                    method: setter.clone(),
                    args:   vec![Expr::Var(name)],
                },
            },
            Instr::Return {
                expr: Some(Expr::SelfRef),
            },
        ],
        throws:   vec![],
    }
}

fn bean_done_method(goal: &BeanGoal, unit: &GenerationUnit, bean: &Ident) -> MethodDef {
    let mut body = Vec::new();
    if unit.lifecycle.reuses() {
        body.push(lifecycle::mark_free());
    }
    body.push(Instr::Return {
        expr: Some(Expr::SelfField(bean.clone())),
    });
    let goal_type = &goal.goal_type;
    MethodDef {
        name: "done".as_ident(),
        access: Access::Public,
        receiver: ReceiverKind::RefMutSelf,
        params: vec![],
        ret: Some(quote!(#goal_type)),
        body,
        throws: vec![],
    }
}

fn bean_entry(goal: &BeanGoal, unit: &GenerationUnit, impl_name: &Ident, bean: &Ident) -> MethodDef {
    let existing = existing_var(&goal.goal_type);
    let updater = "updater".as_ident();

    let params = {
        let goal_type = &goal.goal_type;
        let mut params = Vec::new();
        if unit.lifecycle.reuses() {
            params.push(lifecycle::ctx_param());
        }
        params.push(ParamDef::new(existing.clone(), quote!(#goal_type)));
        params
    };

    let mut body = Vec::new();
    for property in &goal.properties {
        if property.parameter.checks_null() {
            body.push(Instr::NullCheck {
                parameter: property.parameter.name.clone(),
                subject:   Expr::MethodCall {
                    recv:   Box::new(Expr::Var(existing.clone())),
                    method: property.getter.clone(),
                    args:   vec![],
                },
            });
        }
    }
    body.push(lifecycle::entry_acquire(unit, impl_name, &updater));
    body.push(Instr::Assign {
        place: Place::FieldOf {
            base: updater.clone(),
            name: bean.clone(),
        },
        expr:  Expr::New {
            ty:   goal.goal_type.clone(),
            args: vec![],
        },
    });
    for property in &goal.properties {
        let current = Expr::MethodCall {
            recv:   Box::new(Expr::Var(existing.clone())),
            method: property.getter.clone(),
            args:   vec![],
        };
        let copy = match &property.setter {
            Some(setter) => Expr::MethodCall {
                recv:   Box::new(Expr::FieldOf {
                    base: updater.clone(),
                    name: bean.clone(),
                }),
                method: setter.clone(),
                args:   vec![current],
            },
            // Live collection: append the existing contents into the
            // fresh bean's collection through its getter.
            None => Expr::MethodCall {
                recv:   Box::new(Expr::MethodCall {
                    recv:   Box::new(Expr::FieldOf {
                        base: updater.clone(),
                        name: bean.clone(),
                    }),
                    method: property.getter.clone(),
                    args:   vec![],
                }),
                method: "extend".as_ident(),
                args:   vec![current],
            },
        };
        body.push(Instr::Eval { expr: copy });
    }
    body.push(Instr::Return {
        expr: Some(Expr::Var(updater)),
    });

    MethodDef {
        name: naming::entry_method(&goal.name, MODULE),
        access: goal.access,
        receiver: ReceiverKind::Function,
        params,
        ret: Some(updater_ret(impl_name, unit)),
        body,
        throws: vec![],
    }
}

fn existing_var(goal_type: &TypeRef) -> Ident {
    goal_type
        .simple_name()
        .map_or_else(|| "existing".to_string(), |name| name.downcased())
        .as_ident()
}

fn updater_ret(impl_name: &Ident, unit: &GenerationUnit) -> TokenStream {
    if unit.lifecycle.reuses() {
        quote!(&mut #impl_name)
    } else {
        quote!(#impl_name)
    }
}
