//! Runtime support for stepgen-generated step builders and updaters
//!
//! Code synthesized by the `stepgen` crate links against two small pieces
//! of runtime machinery that cannot live in the generated output itself:
//!
//! - [`WorkerContext`]: the per-worker cache that backs the
//!   `ReuseInstances` lifecycle. One context exists per logical thread of
//!   execution and is passed explicitly into generated entry functions;
//!   there is no ambient global state and no locking.
//! - [`RequiredArgumentMissing`] and [`check_required`]: the failure
//!   raised by generated null-checks when a required reference argument
//!   is absent.
//!
//! Generated code under the `NewInstance` lifecycle uses neither; it
//! allocates a fresh implementation value per entry call.

mod cache;
mod missing;

pub use cache::{Recycle, WorkerContext, acquire, release};
pub use missing::{MaybeMissing, RequiredArgumentMissing, check_required, missing_argument};
