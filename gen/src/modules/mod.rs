//! Synthesis modules: one per generated artifact flavor
//!
//! The builder module synthesizes the chained step contracts and their
//! implementation; the updater module synthesizes the flat,
//! pre-populated updater. Both share the invocation synthesis in
//! [`invoke`] and consume the lifecycle policy as a cross-cutting
//! concern.

pub mod builder;
mod invoke;
pub mod updater;

pub use builder::{BuilderOutput, synthesize_builder};
pub use updater::{UpdaterOutput, synthesize_updater};

/// Field of generated implementation structs holding the enclosing
/// instance of an instance-method goal.
pub(crate) const RECEIVER_FIELD: &str = "receiver";
