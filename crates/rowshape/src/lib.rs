//! ## Crate layout
//! - `core`: values, entity model, row-source contracts, shape plans, stitching
//!   and the blocking/suspending enumerators.
//!
//! The `prelude` module carries what a caller needs to compile a plan and
//! drive it over a row source.

pub use rowshape_core as core;

/// re-exports
///
/// callers cancel suspending queries with this token type without adding
/// tokio-util to their own manifest
pub mod __reexports {
    pub use tokio_util;
}

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use crate::core::error::MaterializeError as Error;

///
/// Prelude
///

pub mod prelude {
    pub use crate::core::{
        error::{ErrorClass, MaterializeError},
        obs::{DiagnosticsSink, IterationFailure},
        prelude::*,
        source::MemoryRowSource,
    };
    pub use tokio_util::sync::CancellationToken;
}
