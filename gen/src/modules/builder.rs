//! Builder module: chained step contracts and their implementation
//!
//! For each goal this synthesizes one contract per step, a private
//! implementation type that fills fields step-by-step, and the entry
//! function returning the first step. The terminal step performs the
//! goal invocation with arguments in declaration order; nothing else on
//! the generated types is observable to callers.

use proc_macro2::TokenStream;
use quote::quote;
use syn::Ident;

use crate::error::Result;
use crate::goal::{BeanGoal, GenerationUnit, GoalDescription, RegularGoal};
use crate::lifecycle;
use crate::modules::invoke;
use crate::naming::{self, NamingExt};
use crate::output::{
    Expr, FieldDef, ImplBlock, Instr, MethodDef, ParamDef, Place, ReceiverKind, TypeDef, TypeKind,
};
use crate::step::{SetterSource, Step, StepType, build_steps};
use crate::types::Access;

use super::RECEIVER_FIELD;

const MODULE: &str = "builder";

/// Everything the builder module produces for one goal.
#[derive(Debug, Clone)]
pub struct BuilderOutput {
    /// One step contract per chain position.
    pub contracts:  Vec<TypeDef>,
    /// The implementation type behind every contract.
    pub impl_type:  TypeDef,
    /// The `<goal_name>_builder` entry function.
    pub entry:      MethodDef,
    /// Cache slot descriptor, present under `ReuseInstances`.
    pub cache_slot: Option<FieldDef>,
}

/// Synthesizes the step-builder surface for one goal.
pub fn synthesize_builder(goal: &GoalDescription, unit: &GenerationUnit) -> Result<BuilderOutput> {
    match goal {
        GoalDescription::Regular(goal) => regular_builder(goal, unit),
        GoalDescription::Bean(goal) => bean_builder(goal, unit),
    }
}

fn regular_builder(goal: &RegularGoal, unit: &GenerationUnit) -> Result<BuilderOutput> {
    let chain: Vec<_> = goal
        .chain_order()?
        .into_iter()
        .map(|parameter| (parameter.clone(), SetterSource::Explicit))
        .collect();
    let steps = build_steps(&goal.name, MODULE, &chain, goal.goal_type.clone())?;
    let impl_name = naming::impl_type(&goal.name, MODULE, "Impl");

    let mut blocks = Vec::with_capacity(steps.len());
    for step in &steps {
        let mut methods = Vec::new();
        if step.has_setter() {
            methods.push(setter_method(step, goal, unit));
        }
        if let Some(shortcut) = &step.collection_shortcut {
            methods.push(shortcut_method(step, shortcut.name.clone(), goal, unit));
        }
        blocks.push(ImplBlock {
            contract: Some(step.this_type.clone()),
            methods,
        });
    }

    let contracts = contracts_from(&blocks, goal.access);
    let mut fields: Vec<FieldDef> = steps
        .iter()
        .take(steps.len() - 1)
        .map(|step| {
            let ty = &step.parameter.ty;
            FieldDef::new(step.parameter.name.clone(), quote!(#ty))
        })
        .collect();
    if let Some(receiver) = goal.receiver() {
        fields.push(FieldDef::new(RECEIVER_FIELD.as_ident(), quote!(#receiver)));
    }
    if unit.lifecycle.reuses() {
        fields.push(lifecycle::in_use_field());
    }

    let entry = regular_entry(goal, unit, &impl_name, &steps);
    Ok(BuilderOutput {
        contracts,
        impl_type: TypeDef {
            name:   impl_name.clone(),
            access: Access::Private,
            kind:   TypeKind::Implementation {
                fields,
                impls: blocks,
                recycle: unit.lifecycle.reuses(),
            },
        },
        entry,
        cache_slot: unit.lifecycle.reuses().then(|| lifecycle::cache_slot(&impl_name)),
    })
}

/// A step's argument-taking setter, with its body.
fn setter_method(step: &Step, goal: &RegularGoal, unit: &GenerationUnit) -> MethodDef {
    let parameter = &step.parameter;
    let name = parameter.name.clone();
    let ty = &parameter.ty;
    let mut body = Vec::new();
    if parameter.checks_null() {
        body.push(Instr::NullCheck {
            parameter: name.clone(),
            subject:   Expr::Var(name.clone()),
        });
    }
    if step.is_terminal() {
        body.extend(terminal_tail(goal, unit, &name, Expr::Var(name.clone())));
    } else {
        body.push(Instr::Assign {
            place: Place::SelfField(name.clone()),
            expr:  Expr::Var(name.clone()),
        });
        body.push(Instr::Return {
            expr: Some(Expr::SelfRef),
        });
    }
    MethodDef {
        name:     name.clone(),
        access:   Access::Public,
        receiver: ReceiverKind::RefMutSelf,
        params:   vec![ParamDef::new(name, quote!(#ty))],
        ret:      next_type_tokens(step),
        body,
        throws:   if step.is_terminal() { goal.thrown.clone() } else { vec![] },
    }
}

/// A step's zero-argument collection shortcut.
fn shortcut_method(step: &Step, name: Ident, goal: &RegularGoal, unit: &GenerationUnit) -> MethodDef {
    let parameter = &step.parameter;
    let kind = step
        .collection_shortcut
        .as_ref()
        .map(|shortcut| shortcut.kind);
    let mut body = Vec::new();
    match kind {
        Some(kind) if step.is_terminal() => {
            // Bind the empty instance locally; the invocation consumes
            // it like a just-received argument.
            body.push(Instr::Bind {
                name: parameter.name.clone(),
                expr: Expr::EmptyCollection(kind),
            });
            body.extend(terminal_tail(goal, unit, &parameter.name, Expr::Var(parameter.name.clone())));
        }
        Some(kind) => {
            body.push(Instr::Assign {
                place: Place::SelfField(parameter.name.clone()),
                expr:  Expr::EmptyCollection(kind),
            });
            body.push(Instr::Return {
                expr: Some(Expr::SelfRef),
            });
        }
        None => {}
    }
    MethodDef {
        name,
        access: Access::Public,
        receiver: ReceiverKind::RefMutSelf,
        params: vec![],
        ret: next_type_tokens(step),
        body,
        throws: vec![],
    }
}

/// Free (under reuse), invoke in declaration order, clear, return.
fn terminal_tail(
    goal: &RegularGoal,
    unit: &GenerationUnit,
    last: &Ident,
    last_value: Expr,
) -> Vec<Instr> {
    let mut tail = Vec::new();
    if unit.lifecycle.reuses() {
        tail.push(lifecycle::mark_free());
    }
    let invocation = invoke::invocation(unit, goal, |parameter| {
        if &parameter.name == last {
            last_value.clone()
        } else {
            Expr::SelfField(parameter.name.clone())
        }
    });
    let clears = if unit.lifecycle.reuses() {
        let mut clears = lifecycle::clear_fields(
            goal.parameters.iter().filter(|parameter| &parameter.name != last),
        );
        if goal.receiver().is_some() {
            clears.push(Instr::Assign {
                place: Place::SelfField(RECEIVER_FIELD.as_ident()),
                expr:  Expr::DefaultValue,
            });
        }
        clears
    } else {
        vec![]
    };
    tail.extend(invoke::finish(&goal.goal_type, invocation, clears));
    tail
}

fn regular_entry(
    goal: &RegularGoal,
    unit: &GenerationUnit,
    impl_name: &Ident,
    steps: &[Step],
) -> MethodDef {
    let builder = "builder".as_ident();
    let mut params = Vec::new();
    if unit.lifecycle.reuses() {
        params.push(lifecycle::ctx_param());
    }
    if let Some(receiver) = goal.receiver() {
        params.push(ParamDef::new(RECEIVER_FIELD.as_ident(), quote!(#receiver)));
    }
    let mut body = vec![lifecycle::entry_acquire(unit, impl_name, &builder)];
    if goal.receiver().is_some() {
        body.push(Instr::Assign {
            place: Place::FieldOf {
                base: builder.clone(),
                name: RECEIVER_FIELD.as_ident(),
            },
            expr:  Expr::Var(RECEIVER_FIELD.as_ident()),
        });
    }
    body.push(Instr::Return {
        expr: Some(Expr::Var(builder)),
    });
    MethodDef {
        name: naming::entry_method(&goal.name, MODULE),
        access: goal.access,
        receiver: ReceiverKind::Function,
        params,
        ret: Some(first_step_tokens(&steps[0].this_type, unit)),
        body,
        throws: vec![],
    }
}

fn bean_builder(goal: &BeanGoal, unit: &GenerationUnit) -> Result<BuilderOutput> {
    let parameters = goal.step_parameters();
    let steps = build_steps(&goal.name, MODULE, &parameters, goal.goal_type.clone())?;
    let impl_name = naming::impl_type(&goal.name, MODULE, "Impl");
    let bean = bean_field(goal);

    let mut blocks = Vec::with_capacity(steps.len());
    for (step, property) in steps.iter().zip(&goal.properties) {
        let mut methods = Vec::new();
        if let Some(setter) = &property.setter {
            methods.push(bean_setter_method(step, setter, &bean, unit));
        }
        if let Some(shortcut) = &step.collection_shortcut {
            methods.push(bean_shortcut_method(
                step,
                shortcut.name.clone(),
                property.setter.as_ref(),
                &bean,
                unit,
            ));
        }
        blocks.push(ImplBlock {
            contract: Some(step.this_type.clone()),
            methods,
        });
    }

    let contracts = contracts_from(&blocks, goal.access);
    let goal_type = &goal.goal_type;
    let mut fields = vec![FieldDef::new(bean.clone(), quote!(#goal_type))];
    if unit.lifecycle.reuses() {
        fields.push(lifecycle::in_use_field());
    }

    let entry = bean_entry(goal, unit, &impl_name, &steps, &bean);
    Ok(BuilderOutput {
        contracts,
        impl_type: TypeDef {
            name:   impl_name.clone(),
            access: Access::Private,
            kind:   TypeKind::Implementation {
                fields,
                impls: blocks,
                recycle: unit.lifecycle.reuses(),
            },
        },
        entry,
        cache_slot: unit.lifecycle.reuses().then(|| lifecycle::cache_slot(&impl_name)),
    })
}

/// A bean step's setter: invoke the property setter on the bean field.
fn bean_setter_method(step: &Step, setter: &Ident, bean: &Ident, unit: &GenerationUnit) -> MethodDef {
    let parameter = &step.parameter;
    let name = parameter.name.clone();
    let ty = &parameter.ty;
    let mut body = Vec::new();
    if parameter.checks_null() {
        body.push(Instr::NullCheck {
            parameter: name.clone(),
            subject:   Expr::Var(name.clone()),
        });
    }
    if step.is_terminal() && unit.lifecycle.reuses() {
        body.push(lifecycle::mark_free());
    }
    body.push(Instr::Eval {
        expr: Expr::MethodCall {
            recv:   Box::new(Expr::SelfField(bean.clone())),
            method: setter.clone(),
            args:   vec![Expr::Var(name.clone())],
        },
    });
    body.push(bean_step_return(step, bean));
    MethodDef {
        name: name.clone(),
        access: Access::Public,
        receiver: ReceiverKind::RefMutSelf,
        params: vec![ParamDef::new(name, quote!(#ty))],
        ret: next_type_tokens(step),
        body,
        throws: vec![],
    }
}

/// A bean step's shortcut: supply the empty collection without an
/// argument. A setterless property needs nothing at all: the live
/// collection behind its getter starts out empty.
fn bean_shortcut_method(
    step: &Step,
    name: Ident,
    setter: Option<&Ident>,
    bean: &Ident,
    unit: &GenerationUnit,
) -> MethodDef {
    let kind = step
        .collection_shortcut
        .as_ref()
        .map(|shortcut| shortcut.kind);
    let mut body = Vec::new();
    if step.is_terminal() && unit.lifecycle.reuses() {
        body.push(lifecycle::mark_free());
    }
    if let (Some(setter), Some(kind)) = (setter, kind) {
        body.push(Instr::Eval {
            expr: Expr::MethodCall {
                recv:   Box::new(Expr::SelfField(bean.clone())),
                method: setter.clone(),
                args:   vec![Expr::EmptyCollection(kind)],
            },
        });
    }
    body.push(bean_step_return(step, bean));
    MethodDef {
        name,
        access: Access::Public,
        receiver: ReceiverKind::RefMutSelf,
        params: vec![],
        ret: next_type_tokens(step),
        body,
        throws: vec![],
    }
}

fn bean_step_return(step: &Step, bean: &Ident) -> Instr {
    if step.is_terminal() {
        Instr::Return {
            expr: Some(Expr::SelfField(bean.clone())),
        }
    } else {
        Instr::Return {
            expr: Some(Expr::SelfRef),
        }
    }
}

fn bean_entry(
    goal: &BeanGoal,
    unit: &GenerationUnit,
    impl_name: &Ident,
    steps: &[Step],
    bean: &Ident,
) -> MethodDef {
    let builder = "builder".as_ident();
    let params = if unit.lifecycle.reuses() {
        vec![lifecycle::ctx_param()]
    } else {
        vec![]
    };
    // A fresh bean per entry call keeps recycled implementations from
    // leaking state across chains.
    let body = vec![
        lifecycle::entry_acquire(unit, impl_name, &builder),
        Instr::Assign {
            place: Place::FieldOf {
                base: builder.clone(),
                name: bean.clone(),
            },
            expr:  Expr::New {
                ty:   goal.goal_type.clone(),
                args: vec![],
            },
        },
        Instr::Return {
            expr: Some(Expr::Var(builder)),
        },
    ];
    MethodDef {
        name: naming::entry_method(&goal.name, MODULE),
        access: goal.access,
        receiver: ReceiverKind::Function,
        params,
        ret: Some(first_step_tokens(&steps[0].this_type, unit)),
        body,
        throws: vec![],
    }
}

fn bean_field(goal: &BeanGoal) -> Ident {
    goal.goal_type
        .simple_name()
        .map_or_else(|| "bean".to_string(), |name| name.downcased())
        .as_ident()
}

/// Contract trait per step, sharing the impl blocks' method shapes.
fn contracts_from(blocks: &[ImplBlock], access: Access) -> Vec<TypeDef> {
    blocks
        .iter()
        .filter_map(|block| {
            block.contract.as_ref().map(|contract| TypeDef {
                name:   contract.clone(),
                access,
                kind:   TypeKind::Contract {
                    methods: block.methods.clone(),
                },
            })
        })
        .collect()
}

fn next_type_tokens(step: &Step) -> Option<TokenStream> {
    match &step.next_type {
        StepType::Contract(contract) => Some(quote!(&mut dyn #contract)),
        StepType::Terminal(ty) if ty.is_unit() => None,
        StepType::Terminal(ty) => Some(quote!(#ty)),
    }
}

fn first_step_tokens(contract: &Ident, unit: &GenerationUnit) -> TokenStream {
    if unit.lifecycle.reuses() {
        quote!(&mut dyn #contract)
    } else {
        quote!(impl #contract)
    }
}

#[cfg(test)]
mod tests {
    use quote::ToTokens;

    use super::*;
    use crate::goal::{BeanProperty, RegularKind};
    use crate::lifecycle::LifecyclePolicy;
    use crate::param::Parameter;
    use crate::types::TypeRef;

    fn unit(lifecycle: LifecyclePolicy) -> GenerationUnit {
        GenerationUnit::new("Point", TypeRef::new(syn::parse_quote!(Point)), lifecycle)
    }

    fn point_goal() -> GoalDescription {
        GoalDescription::Regular(RegularGoal {
            name:       "point".to_string(),
            goal_type:  TypeRef::new(syn::parse_quote!(Point)),
            kind:       RegularKind::Constructor,
            parameters: vec![
                Parameter::new("x".as_ident(), TypeRef::new(syn::parse_quote!(i32))),
                Parameter::new("y".as_ident(), TypeRef::new(syn::parse_quote!(i32))),
            ],
            step_order: None,
            thrown:     vec![],
            access:     Access::Public,
        })
    }

    #[test]
    fn test_two_primitive_parameters_make_a_two_step_chain() {
        let output = synthesize_builder(&point_goal(), &unit(LifecyclePolicy::NewInstance)).unwrap();

        assert_eq!(output.contracts.len(), 2);
        assert_eq!(output.contracts[0].name.to_string(), "PointBuilderX");
        assert_eq!(output.contracts[1].name.to_string(), "PointBuilderY");
        assert_eq!(output.entry.name.to_string(), "point_builder");
        assert!(output.cache_slot.is_none());

        // Only the first parameter is stored; the last is consumed by
        // the invocation directly.
        let TypeKind::Implementation { fields, .. } = &output.impl_type.kind else {
            panic!("implementation expected");
        };
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name.to_string(), "x");

        let rendered = output.impl_type.to_token_stream().to_string();
        assert!(rendered.contains("Point :: new (self . x , y)"));
        // Primitive parameters never get a null-check.
        assert!(!rendered.contains("check_required"));
    }

    #[test]
    fn test_null_check_follows_policy_and_primitiveness() {
        let goal = GoalDescription::Regular(RegularGoal {
            name:       "label".to_string(),
            goal_type:  TypeRef::new(syn::parse_quote!(Label)),
            kind:       RegularKind::Constructor,
            parameters: vec![
                Parameter::new("text".as_ident(), TypeRef::new(syn::parse_quote!(String))),
                Parameter::nullable("hint".as_ident(), TypeRef::new(syn::parse_quote!(String))),
                Parameter::new("size".as_ident(), TypeRef::new(syn::parse_quote!(u32))),
            ],
            step_order: None,
            thrown:     vec![],
            access:     Access::Public,
        });
        let output = synthesize_builder(&goal, &unit(LifecyclePolicy::NewInstance)).unwrap();
        let TypeKind::Implementation { impls, .. } = &output.impl_type.kind else {
            panic!("implementation expected");
        };

        let has_check = |block: &ImplBlock, name: &str| {
            block.methods[0]
                .body
                .iter()
                .any(|instr| instr.is_null_check_for(name))
        };
        assert!(has_check(&impls[0], "text"));
        assert!(!has_check(&impls[1], "hint"));
        assert!(!has_check(&impls[2], "size"));
    }

    #[test]
    fn test_reusing_instance_goal_threads_the_worker_context() {
        let goal = GoalDescription::Regular(RegularGoal {
            name:       "sum".to_string(),
            goal_type:  TypeRef::new(syn::parse_quote!(i32)),
            kind:       RegularKind::InstanceMethod {
                method:   "sum".as_ident(),
                receiver: TypeRef::new(syn::parse_quote!(Sum)),
            },
            parameters: vec![Parameter::new("b".as_ident(), TypeRef::new(syn::parse_quote!(i32)))],
            step_order: None,
            thrown:     vec![],
            access:     Access::Public,
        });
        let reuse = GenerationUnit::new(
            "Sum",
            TypeRef::new(syn::parse_quote!(Sum)),
            LifecyclePolicy::ReuseInstances,
        );
        let output = synthesize_builder(&goal, &reuse).unwrap();

        assert_eq!(output.entry.params[0].name.to_string(), "ctx");
        assert_eq!(output.entry.params[1].name.to_string(), "receiver");
        let entry = output.entry.to_token_stream().to_string();
        assert!(entry.contains("stepgen_runtime :: acquire"));
        assert!(entry.contains("builder . receiver = receiver"));

        let slot = output.cache_slot.unwrap();
        assert_eq!(slot.name.to_string(), "sum_builder_impl");

        // Terminal: free first, invoke through the receiver, then drop
        // the stored receiver reference.
        let rendered = output.impl_type.to_token_stream().to_string();
        assert!(rendered.contains("self . currently_in_use = false"));
        assert!(rendered.contains("self . receiver . sum (b)"));
        assert!(rendered.contains("self . receiver = :: core :: default :: Default :: default ()"));
        assert!(rendered.contains("impl :: stepgen_runtime :: Recycle for SumBuilderImpl"));
    }

    #[test]
    fn test_setterless_collection_property_is_shortcut_only() {
        let goal = GoalDescription::Bean(BeanGoal {
            name:       "employee".to_string(),
            goal_type:  TypeRef::new(syn::parse_quote!(Employee)),
            properties: vec![
                BeanProperty {
                    parameter: Parameter::new("name".as_ident(), TypeRef::new(syn::parse_quote!(String))),
                    getter:    "name".as_ident(),
                    setter:    Some("set_name".as_ident()),
                },
                BeanProperty {
                    parameter: Parameter::new(
                        "notes".as_ident(),
                        TypeRef::new(syn::parse_quote!(Vec<String>)),
                    ),
                    getter:    "notes".as_ident(),
                    setter:    None,
                },
            ],
            access:     Access::Public,
        });
        let output = synthesize_builder(&goal, &unit(LifecyclePolicy::NewInstance)).unwrap();

        // The setterless collection step exposes the shortcut only.
        let TypeKind::Contract { methods } = &output.contracts[1].kind else {
            panic!("contract expected");
        };
        assert_eq!(methods.len(), 1);
        assert_eq!(methods[0].name.to_string(), "empty_notes");

        // The shortcut leaves the live collection untouched; the step
        // setter for `name` goes through the bean's setter.
        let rendered = output.impl_type.to_token_stream().to_string();
        assert!(rendered.contains("self . employee . set_name (name)"));
        assert!(rendered.contains("fn empty_notes (& mut self) -> Employee { return self . employee ; }"));

        // Entry allocates the bean fresh.
        let entry = output.entry.to_token_stream().to_string();
        assert!(entry.contains("builder . employee = Employee :: new ()"));
    }
}
