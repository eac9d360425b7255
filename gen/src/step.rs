//! Step chain builder
//!
//! Converts a goal's ordered parameter list into the chain of steps the
//! builder module synthesizes contracts from. Steps live in a flat
//! ordered `Vec`; a step's successor is the next index, so the chain
//! carries no back-references and is computed once, up front.

use syn::Ident;

use crate::error::{Error, Result};
use crate::naming::{self, NamingExt};
use crate::param::Parameter;
use crate::types::{CollectionKind, TypeRef};

/// The type a step's setter returns: the next step's contract, or the
/// terminal build type for the last step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepType {
    /// Contract trait of the following step.
    Contract(Ident),
    /// Terminal return type of the whole chain.
    Terminal(TypeRef),
}

/// Zero-argument method that assigns an empty collection instead of
/// requiring an explicit argument.
#[derive(Debug, Clone)]
pub struct CollectionShortcut {
    /// Method name (`empty_notes`).
    pub name:        Ident,
    /// Which empty instance the shortcut supplies.
    pub kind:        CollectionKind,
    /// When set, the step exposes no argument-taking setter at all
    /// (setterless bean collections).
    pub only_method: bool,
}

/// One position in the ordered parameter-assignment chain.
#[derive(Debug, Clone)]
pub struct Step {
    /// Contract trait implemented by the builder at this position.
    pub this_type:           Ident,
    /// Type returned by this step's setter.
    pub next_type:           StepType,
    /// The parameter this step assigns.
    pub parameter:           Parameter,
    /// Present only for recognized collection types.
    pub collection_shortcut: Option<CollectionShortcut>,
}

impl Step {
    /// Whether this is the last step of its chain.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self.next_type, StepType::Terminal(_))
    }

    /// Whether the step exposes an argument-taking setter.
    #[must_use]
    pub fn has_setter(&self) -> bool {
        !self
            .collection_shortcut
            .as_ref()
            .is_some_and(|shortcut| shortcut.only_method)
    }
}

/// Marks parameters that have no explicit setter in their source
/// (setterless bean collections); their steps expose the shortcut only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetterSource {
    /// Regular parameter or bean property with a setter.
    Explicit,
    /// Bean property whose only write path is its live collection.
    Setterless,
}

/// Builds the step chain for a goal, linking each step to the next by
/// type.
///
/// Parameters are processed in reverse order: each step's `next_type`
/// is the `this_type` computed for the previously processed (i.e.
/// next-in-original-order) step, seeded with `terminal`. The chain
/// invariant (step *i* hands off to step *i + 1*'s contract, the last
/// step to the terminal type) holds by construction, in linear time.
pub fn build_steps(
    goal: &str,
    module: &str,
    parameters: &[(Parameter, SetterSource)],
    terminal: TypeRef,
) -> Result<Vec<Step>> {
    if parameters.is_empty() {
        return Err(Error::invariant(goal, "step chain requested for an empty parameter list").into());
    }

    let mut next = StepType::Terminal(terminal);
    let mut steps = Vec::with_capacity(parameters.len());
    for (parameter, source) in parameters.iter().rev() {
        let this_type = naming::step_contract(goal, module, &parameter.name.to_string());
        let collection_shortcut = shortcut_for(parameter, *source)?;
        steps.push(Step {
            this_type: this_type.clone(),
            next_type: next,
            parameter: parameter.clone(),
            collection_shortcut,
        });
        next = StepType::Contract(this_type);
    }
    steps.reverse();
    Ok(steps)
}

fn shortcut_for(parameter: &Parameter, source: SetterSource) -> Result<Option<CollectionShortcut>> {
    let kind = parameter.ty.collection_kind();
    match (kind, source) {
        (Some(kind), _) => Ok(Some(CollectionShortcut {
            name: format!("empty_{}", parameter.name).as_ident(),
            kind,
            only_method: source == SetterSource::Setterless,
        })),
        // A setterless property without a recognized collection type has
        // no write path at all.
        (None, SetterSource::Setterless) => {
            Err(Error::unsupported_collection(parameter.ty.as_type()).into())
        }
        (None, SetterSource::Explicit) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::NamingExt;

    fn param(name: &str, ty: syn::Type) -> (Parameter, SetterSource) {
        (Parameter::new(name.as_ident(), TypeRef::new(ty)), SetterSource::Explicit)
    }

    #[test]
    fn test_chain_links_by_type() {
        let parameters = vec![
            param("x", syn::parse_quote!(i32)),
            param("y", syn::parse_quote!(i32)),
            param("label", syn::parse_quote!(String)),
        ];
        let terminal = TypeRef::new(syn::parse_quote!(Point));
        let steps = build_steps("point", "builder", &parameters, terminal.clone()).unwrap();

        assert_eq!(steps.len(), 3);
        for window in steps.windows(2) {
            assert_eq!(window[0].next_type, StepType::Contract(window[1].this_type.clone()));
        }
        assert_eq!(steps[2].next_type, StepType::Terminal(terminal));
        assert_eq!(steps[0].this_type.to_string(), "PointBuilderX");
    }

    #[test]
    fn test_empty_parameter_list_is_an_invariant_violation() {
        let result = build_steps("point", "builder", &[], TypeRef::new(syn::parse_quote!(Point)));
        assert!(result.is_err());
    }

    #[test]
    fn test_collection_parameter_gets_a_shortcut() {
        let parameters = vec![
            param("name", syn::parse_quote!(String)),
            param("notes", syn::parse_quote!(Vec<String>)),
        ];
        let steps =
            build_steps("employee", "builder", &parameters, TypeRef::new(syn::parse_quote!(Employee)))
                .unwrap();

        assert!(steps[0].collection_shortcut.is_none());
        let shortcut = steps[1].collection_shortcut.as_ref().unwrap();
        assert_eq!(shortcut.name.to_string(), "empty_notes");
        assert_eq!(shortcut.kind, CollectionKind::Vec);
        assert!(steps[1].has_setter());
    }

    #[test]
    fn test_setterless_collection_is_shortcut_only() {
        let parameters = vec![(
            Parameter::new("notes".as_ident(), TypeRef::new(syn::parse_quote!(Vec<String>))),
            SetterSource::Setterless,
        )];
        let steps =
            build_steps("employee", "builder", &parameters, TypeRef::new(syn::parse_quote!(Employee)))
                .unwrap();
        assert!(!steps[0].has_setter());
        assert!(steps[0].is_terminal());
    }

    #[test]
    fn test_setterless_non_collection_is_rejected() {
        let parameters = vec![(
            Parameter::new("name".as_ident(), TypeRef::new(syn::parse_quote!(String))),
            SetterSource::Setterless,
        )];
        let result =
            build_steps("employee", "builder", &parameters, TypeRef::new(syn::parse_quote!(Employee)));
        assert!(result.is_err());
    }
}
