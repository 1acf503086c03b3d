//! SPMD canonicalization passes over HLO modules.
//!
//! The main entry point is [`CanonicalizeAllGatherForCse`], which rewrites all-gathers operating
//! on data that was only reshaped to carry extra unit dimensions, so that equivalent all-gathers
//! become structurally identical and can be merged by common subexpression elimination. Passes
//! are usually driven through a [`PassPipeline`], configured with [`settings::Flags`].
#![deny(missing_docs)]

pub use hlo_ir as ir;

/// Even when trace logging is disabled, the trace macro has a significant performance cost so we
/// disable it by default.
macro_rules! trace {
    ($($tt:tt)*) => {
        if cfg!(any(feature = "trace-log", debug_assertions)) {
            ::log::trace!($($tt)*);
        }
    };
}

pub mod settings;
pub mod timing;

mod canonicalize_all_gather;
mod degenerate;
mod pass;
mod result;

pub use crate::canonicalize_all_gather::CanonicalizeAllGatherForCse;
pub use crate::degenerate::is_degenerate_reshape;
pub use crate::pass::{ModulePass, PassPipeline};
pub use crate::result::{PassError, PassResult};
