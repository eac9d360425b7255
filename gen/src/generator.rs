//! Per-unit driver: runs the modules and assembles the generated module
//!
//! One generation unit corresponds to one annotated source type. Each
//! of its goals is synthesized independently (a goal that fails is
//! skipped with a warning and does not affect its siblings) and the
//! surviving outputs are folded into a single [`GeneratedUnit`]: the
//! enclosing module, every contract and implementation type, the entry
//! functions, and the shared cache struct when instances are reused.

use crate::goal::{BeanGoal, GenerationUnit, GoalDescription, ProjectedDescription, RegularGoal, RegularKind};
use crate::lifecycle;
use crate::modules::{RECEIVER_FIELD, synthesize_builder, synthesize_updater};
use crate::naming::{self, NamingExt};
use crate::output::{Expr, FieldDef, GeneratedUnit, Instr, MethodDef, ParamDef, ReceiverKind, TypeDef};
use crate::types::Access;

/// One goal plus the module that should process it.
#[derive(Debug, Clone)]
pub enum GoalInput {
    /// Synthesize the chained step builder.
    Builder(GoalDescription),
    /// Synthesize the flat updater.
    Updater(ProjectedDescription),
}

impl GoalInput {
    fn name(&self) -> &str {
        match self {
            Self::Builder(goal) => goal.name(),
            Self::Updater(goal) => goal.name(),
        }
    }
}

/// Synthesizes every goal of a unit and assembles the generated module.
///
/// Generation is deterministic and idempotent per goal description; a
/// failing goal aborts only its own synthesis.
pub fn generate(unit: &GenerationUnit, goals: &[GoalInput]) -> GeneratedUnit {
    let mut types = Vec::new();
    let mut entries = Vec::new();
    let mut slots: Vec<FieldDef> = Vec::new();

    for input in goals {
        match synthesize(input, unit) {
            Ok(output) => {
                tracing::debug!(goal = input.name(), "goal synthesized");
                types.extend(output.types);
                entries.push(output.entry);
                slots.extend(output.cache_slot);
            }
            Err(report) => {
                tracing::warn!(goal = input.name(), error = ?report, "skipping goal");
            }
        }
    }

    let cache = (unit.lifecycle.reuses() && !slots.is_empty())
        .then(|| lifecycle::cache_struct(unit, slots));
    GeneratedUnit {
        module_name: unit.module_name.clone(),
        access: Access::Public,
        types,
        entries,
        cache,
    }
}

struct GoalOutput {
    types:      Vec<TypeDef>,
    entry:      MethodDef,
    cache_slot: Option<FieldDef>,
}

fn synthesize(input: &GoalInput, unit: &GenerationUnit) -> crate::error::Result<GoalOutput> {
    match input {
        GoalInput::Builder(goal) => {
            // A goal without parameters has no chain to build; it
            // degenerates to a direct-invocation factory.
            if let Some(factory) = direct_factory(goal, unit) {
                return Ok(GoalOutput {
                    types:      vec![],
                    entry:      factory,
                    cache_slot: None,
                });
            }
            let output = synthesize_builder(goal, unit)?;
            let mut types = output.contracts;
            types.push(output.impl_type);
            Ok(GoalOutput {
                types,
                entry: output.entry,
                cache_slot: output.cache_slot,
            })
        }
        GoalInput::Updater(goal) => {
            if updater_parameters(goal) == 0 {
                return Err(crate::error::Error::configuration(
                    goal.name(),
                    "an updater needs at least one projected parameter",
                )
                .into());
            }
            let output = synthesize_updater(goal, unit)?;
            Ok(GoalOutput {
                types:      vec![output.contract, output.impl_type],
                entry:      output.entry,
                cache_slot: output.cache_slot,
            })
        }
    }
}

fn updater_parameters(goal: &ProjectedDescription) -> usize {
    match goal {
        ProjectedDescription::Regular(goal) => goal.parameters.len(),
        ProjectedDescription::Bean(goal) => goal.properties.len(),
    }
}

/// The degenerate form of a zero-parameter goal: a plain factory
/// function, no step types.
fn direct_factory(goal: &GoalDescription, unit: &GenerationUnit) -> Option<MethodDef> {
    match goal {
        GoalDescription::Regular(goal) if goal.parameters.is_empty() => {
            Some(regular_factory(goal, unit))
        }
        GoalDescription::Bean(goal) if goal.properties.is_empty() => Some(bean_factory(goal)),
        _ => None,
    }
}

fn regular_factory(goal: &RegularGoal, unit: &GenerationUnit) -> MethodDef {
    let mut params = Vec::new();
    let invocation = match &goal.kind {
        RegularKind::Constructor => Expr::New {
            ty:   goal.goal_type.clone(),
            args: vec![],
        },
        RegularKind::StaticMethod { method } => Expr::StaticCall {
            ty:     unit.source_type.clone(),
            method: method.clone(),
            args:   vec![],
        },
        RegularKind::InstanceMethod { method, receiver } => {
            params.push(ParamDef::new(RECEIVER_FIELD.as_ident(), quote::quote!(#receiver)));
            Expr::MethodCall {
                recv:   Box::new(Expr::Var(RECEIVER_FIELD.as_ident())),
                method: method.clone(),
                args:   vec![],
            }
        }
    };
    let body = if goal.goal_type.is_unit() {
        vec![Instr::Eval { expr: invocation }, Instr::Return { expr: None }]
    } else {
        vec![Instr::Return {
            expr: Some(invocation),
        }]
    };
    let goal_type = &goal.goal_type;
    MethodDef {
        name: naming::entry_method(&goal.name, "factory"),
        access: goal.access,
        receiver: ReceiverKind::Function,
        params,
        ret: (!goal.goal_type.is_unit()).then(|| quote::quote!(#goal_type)),
        body,
        throws: goal.thrown.clone(),
    }
}

fn bean_factory(goal: &BeanGoal) -> MethodDef {
    let goal_type = &goal.goal_type;
    MethodDef {
        name:     naming::entry_method(&goal.name, "factory"),
        access:   goal.access,
        receiver: ReceiverKind::Function,
        params:   vec![],
        ret:      Some(quote::quote!(#goal_type)),
        body:     vec![Instr::Return {
            expr: Some(Expr::New {
                ty:   goal.goal_type.clone(),
                args: vec![],
            }),
        }],
        throws:   vec![],
    }
}
