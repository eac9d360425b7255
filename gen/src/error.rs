use thiserror::Error;

/// Result type for the `stepgen` library
pub type Result<T> = core::result::Result<T, error_stack::Report<Error>>;

/// Failure taxonomy of the synthesis core.
///
/// Goal descriptions arrive pre-validated from the discovery
/// collaborator, so `Configuration` only covers the few shapes the core
/// must still refuse to touch. `Invariant` marks internal
/// contradictions that valid input can never produce; synthesis for the
/// offending goal is aborted rather than emitting partially-correct
/// definitions.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed goal description: {0}")]
    Configuration(String),

    #[error("generation invariant violated: {0}")]
    Invariant(String),

    #[error("no collection shortcut for type: {type_name}")]
    UnsupportedCollection { type_name: String },
}

impl Error {
    /// Create a configuration error for a specific goal.
    pub fn configuration(goal: &str, details: impl std::fmt::Display) -> Self {
        Self::Configuration(format!("goal '{goal}': {details}"))
    }

    /// Create an invariant-violation error for a specific goal.
    pub fn invariant(goal: &str, details: impl std::fmt::Display) -> Self {
        Self::Invariant(format!("goal '{goal}': {details}"))
    }

    /// Create an unsupported-collection error from the offending type.
    pub fn unsupported_collection(ty: &syn::Type) -> Self {
        Self::UnsupportedCollection {
            type_name: quote::quote!(#ty).to_string(),
        }
    }
}
