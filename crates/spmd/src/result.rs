//! Result and error types representing the outcome of running a pass.

use hlo_ir::verifier::VerifierErrors;
use hlo_ir::{Inst, IrError, Shape};
use thiserror::Error;

/// A pass error.
///
/// None of these can be caused by the user: they are raised when the IR handed to a pass breaks
/// an invariant that earlier passes must maintain, or when a graph mutation fails. The module may
/// be left partially rewritten.
#[derive(Error, Debug)]
pub enum PassError {
    /// The gather dimension of an all-gather doesn't exist in its operand's shape.
    #[error("{inst}: gather dimension {dimension} is out of range for {shape}")]
    GatherDimensionOutOfRange {
        /// The all-gather.
        inst: Inst,
        /// Its gather dimension.
        dimension: usize,
        /// The shape of its operand.
        shape: Shape,
    },

    /// The gathered size isn't a whole number of copies of the operand's size.
    #[error("{inst}: gathered size {gathered} is not a multiple of operand size {size}")]
    GatherSizeNotDivisible {
        /// The all-gather.
        inst: Inst,
        /// Size of the gather dimension in the result.
        gathered: u64,
        /// Size of the gather dimension in the operand.
        size: u64,
    },

    /// Looking through reshapes, no dimension of the reshaped data starts where the gather
    /// dimension did.
    #[error("{inst}: no dimension of {shape} follows exactly {major_elements} major elements")]
    GatherDimensionNotFound {
        /// The all-gather.
        inst: Inst,
        /// The shape of the data found under the reshapes.
        shape: Shape,
        /// Number of elements preceding the gather dimension in the operand.
        major_elements: u64,
    },

    /// A graph mutation failed.
    #[error(transparent)]
    Ir(#[from] IrError),

    /// The verifier rejected the module.
    #[error("Verifier errors:\n{0}")]
    Verifier(#[from] VerifierErrors),
}

/// A convenient alias for a `Result` that uses `PassError` as the error type.
pub type PassResult<T> = Result<T, PassError>;
