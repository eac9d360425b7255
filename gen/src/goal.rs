//! Goal model: what a builder or updater is generated for
//!
//! A goal is a constructor, static method, instance method, or a
//! bean-style mutable object to populate. The kinds form a tagged union
//! dispatched by exhaustive `match` throughout the synthesis modules;
//! there is no visitor indirection.

use syn::Ident;

use crate::error::{Error, Result};
use crate::lifecycle::LifecyclePolicy;
use crate::naming;
use crate::param::{Parameter, ProjectedParameter};
use crate::step::SetterSource;
use crate::types::{Access, TypeRef};

/// The invocation shape of a regular (non-bean) goal.
#[derive(Debug, Clone)]
pub enum RegularKind {
    /// `GoalType::new(args...)`; the method name is empty in the
    /// source description.
    Constructor,
    /// `GoalType::method(args...)`.
    StaticMethod {
        /// Name of the static method.
        method: Ident,
    },
    /// `receiver.method(args...)`; the enclosing instance is threaded
    /// through the generated implementation.
    InstanceMethod {
        /// Name of the instance method.
        method:   Ident,
        /// Type of the enclosing instance.
        receiver: TypeRef,
    },
}

impl RegularKind {
    /// Whether this goal needs a receiver instance to invoke.
    #[must_use]
    pub const fn is_instance(&self) -> bool {
        matches!(self, Self::InstanceMethod { .. })
    }
}

/// View of a goal parameter shared between plain and projected goals.
pub trait AsParameter {
    /// The underlying parameter.
    fn as_parameter(&self) -> &Parameter;
}

impl AsParameter for Parameter {
    fn as_parameter(&self) -> &Parameter {
        self
    }
}

impl AsParameter for ProjectedParameter {
    fn as_parameter(&self) -> &Parameter {
        &self.parameter
    }
}

/// A constructor, static-method or instance-method goal.
///
/// `parameters` is kept in original declaration order, which is the
/// order the synthesized invocation passes arguments in, always. An
/// explicit `step_order` reorders only the chain of steps a caller
/// walks.
#[derive(Debug, Clone)]
pub struct RegularGoal<P = Parameter> {
    /// Goal name; also the stem of every generated name.
    pub name:       String,
    /// Constructed / returned type. Unit for void method goals.
    pub goal_type:  TypeRef,
    /// Invocation shape.
    pub kind:       RegularKind,
    /// Parameters in declaration order.
    pub parameters: Vec<P>,
    /// Explicit chain-order override, by parameter name.
    pub step_order: Option<Vec<Ident>>,
    /// Exception types declared by the goal itself.
    pub thrown:     Vec<TypeRef>,
    /// Visibility of the entry function and generated types.
    pub access:     Access,
}

/// A regular goal whose parameters carry projections (updater input).
pub type ProjectedGoal = RegularGoal<ProjectedParameter>;

impl<P: AsParameter> RegularGoal<P> {
    /// Parameters in chain (visitation) order, resolving the explicit
    /// override if one is present.
    pub fn chain_order(&self) -> Result<Vec<&P>> {
        let Some(order) = &self.step_order else {
            return Ok(self.parameters.iter().collect());
        };
        if order.len() != self.parameters.len() {
            return Err(Error::configuration(&self.name, "step order must cover every parameter").into());
        }
        let mut chain = Vec::with_capacity(order.len());
        for name in order {
            let Some(parameter) = self.parameters.iter().find(|p| &p.as_parameter().name == name)
            else {
                return Err(Error::configuration(
                    &self.name,
                    format!("step order names unknown parameter '{name}'"),
                )
                .into());
            };
            chain.push(parameter);
        }
        Ok(chain)
    }

    /// The receiver type, for instance-method goals.
    #[must_use]
    pub const fn receiver(&self) -> Option<&TypeRef> {
        match &self.kind {
            RegularKind::InstanceMethod { receiver, .. } => Some(receiver),
            _ => None,
        }
    }
}

/// One settable bean property, derived from a getter/setter pair.
///
/// `Ignore`-marked and unusable properties are excluded by the
/// discovery collaborator before the description reaches this model; a
/// setterless property survives only if its type is a recognized
/// collection, in which case its step is collection-shortcut-only.
#[derive(Debug, Clone)]
pub struct BeanProperty {
    /// The property viewed as a goal parameter.
    pub parameter: Parameter,
    /// Accessor the projection reads through.
    pub getter:    Ident,
    /// Setter, absent for live-collection properties.
    pub setter:    Option<Ident>,
}

/// A bean-population goal.
#[derive(Debug, Clone)]
pub struct BeanGoal {
    /// Goal name; also the stem of every generated name.
    pub name:       String,
    /// The bean class.
    pub goal_type:  TypeRef,
    /// Properties in declaration order.
    pub properties: Vec<BeanProperty>,
    /// Visibility of the entry function and generated types.
    pub access:     Access,
}

impl BeanGoal {
    /// Properties as step-chain input.
    #[must_use]
    pub fn step_parameters(&self) -> Vec<(Parameter, SetterSource)> {
        self.properties
            .iter()
            .map(|property| {
                let source = if property.setter.is_some() {
                    SetterSource::Explicit
                } else {
                    SetterSource::Setterless
                };
                (property.parameter.clone(), source)
            })
            .collect()
    }
}

/// Tagged union of goal kinds, as delivered by the discovery
/// collaborator.
#[derive(Debug, Clone)]
pub enum GoalDescription {
    /// Constructor, static-method or instance-method goal.
    Regular(RegularGoal),
    /// Bean-population goal.
    Bean(BeanGoal),
}

impl GoalDescription {
    /// The goal name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Regular(goal) => &goal.name,
            Self::Bean(goal) => &goal.name,
        }
    }

    /// Visibility of the generated surface.
    #[must_use]
    pub const fn access(&self) -> Access {
        match self {
            Self::Regular(goal) => goal.access,
            Self::Bean(goal) => goal.access,
        }
    }
}

/// Updater input: a goal whose current values can be projected out of
/// an existing instance.
#[derive(Debug, Clone)]
pub enum ProjectedDescription {
    /// Regular goal with per-parameter projections.
    Regular(ProjectedGoal),
    /// Bean goal; getters are the projections.
    Bean(BeanGoal),
}

impl ProjectedDescription {
    /// The goal name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Regular(goal) => &goal.name,
            Self::Bean(goal) => &goal.name,
        }
    }
}

/// The per-source-type "builders context": one generation unit produces
/// one generated module, and owns one cache slot per reusable
/// implementation type.
#[derive(Debug, Clone)]
pub struct GenerationUnit {
    /// The annotated source type the goals belong to.
    pub source_type: TypeRef,
    /// Name of the generated enclosing module.
    pub module_name: Ident,
    /// Name of the unit's cache struct (`ReuseInstances` only).
    pub cache_type:  Ident,
    /// Allocation policy for every goal in this unit.
    pub lifecycle:   LifecyclePolicy,
}

impl GenerationUnit {
    /// Derives the generated names for a source type.
    #[must_use]
    pub fn new(source_name: &str, source_type: TypeRef, lifecycle: LifecyclePolicy) -> Self {
        Self {
            source_type,
            module_name: naming::unit_module(source_name),
            cache_type: naming::unit_cache_type(source_name),
            lifecycle,
        }
    }
}
