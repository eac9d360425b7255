//! Invocation synthesis shared by the builder and updater modules
//!
//! The terminal step of a builder and the `done` method of an updater
//! end in the same expression: the goal's invocation, with arguments in
//! original parameter declaration order regardless of the order the
//! caller visited the steps in.

use crate::goal::{AsParameter, GenerationUnit, RegularGoal, RegularKind};
use crate::naming::NamingExt;
use crate::output::{Expr, Instr};
use crate::param::Parameter;
use crate::types::TypeRef;

use super::RECEIVER_FIELD;

/// Synthesizes the invocation expression for a regular goal.
///
/// `value_of` supplies the expression for each parameter (stored field
/// vs. just-received argument); arguments are passed in declaration
/// order.
pub fn invocation<P: AsParameter>(
    unit: &GenerationUnit,
    goal: &RegularGoal<P>,
    mut value_of: impl FnMut(&Parameter) -> Expr,
) -> Expr {
    let args: Vec<Expr> = goal
        .parameters
        .iter()
        .map(|parameter| value_of(parameter.as_parameter()))
        .collect();
    match &goal.kind {
        RegularKind::Constructor => Expr::New {
            ty: goal.goal_type.clone(),
            args,
        },
        RegularKind::StaticMethod { method } => Expr::StaticCall {
            ty: unit.source_type.clone(),
            method: method.clone(),
            args,
        },
        RegularKind::InstanceMethod { method, .. } => Expr::MethodCall {
            recv: Box::new(Expr::SelfField(RECEIVER_FIELD.as_ident())),
            method: method.clone(),
            args,
        },
    }
}

/// Sequences the tail of a terminal method: evaluate the invocation,
/// run the field resets, return the result.
///
/// A void goal evaluates for effect and returns nothing; with no resets
/// the invocation returns directly.
pub fn finish(goal_type: &TypeRef, invocation: Expr, clears: Vec<Instr>) -> Vec<Instr> {
    if goal_type.is_unit() {
        let mut tail = vec![Instr::Eval { expr: invocation }];
        tail.extend(clears);
        tail.push(Instr::Return { expr: None });
        return tail;
    }
    if clears.is_empty() {
        return vec![Instr::Return {
            expr: Some(invocation),
        }];
    }
    let result = "result".as_ident();
    let mut tail = vec![Instr::Bind {
        name: result.clone(),
        expr: invocation,
    }];
    tail.extend(clears);
    tail.push(Instr::Return {
        expr: Some(Expr::Var(result)),
    });
    tail
}
