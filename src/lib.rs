//! HLO module passes for SPMD-partitioned programs.
//!
//! This crate re-exports the IR crate as [`ir`] and the passes as [`spmd`].

pub use hlo_ir as ir;
pub use hlo_spmd as spmd;

pub use hlo_spmd::settings;
pub use hlo_spmd::{CanonicalizeAllGatherForCse, ModulePass, PassError, PassPipeline, PassResult};
