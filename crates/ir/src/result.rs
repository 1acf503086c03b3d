//! Errors raised by graph mutations.

use crate::entities::Inst;
use crate::shape::Shape;
use thiserror::Error;

/// A graph mutation that would leave a computation inconsistent.
///
/// These always represent a bug in the code mutating the IR.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum IrError {
    /// The instruction reference does not belong to the computation.
    #[error("{0} does not exist")]
    UnknownInstruction(Inst),

    /// The instruction has already been removed from the computation.
    #[error("{0} has been removed")]
    RemovedInstruction(Inst),

    /// An instruction can't be removed while other instructions use it.
    #[error("{inst} still has {users} user(s)")]
    HasUsers {
        /// The instruction being removed.
        inst: Inst,
        /// Number of remaining users.
        users: usize,
    },

    /// The root of a computation can't be removed.
    #[error("{0} is the root of its computation")]
    RemovingRoot(Inst),

    /// Users can only be rewired to an instruction producing the same shape.
    #[error("can't replace {old} with {new}: incompatible shapes")]
    ShapeMismatch {
        /// Shape of the replaced instruction.
        old: Shape,
        /// Shape of the replacement.
        new: Shape,
    },

    /// The computation has no root instruction.
    #[error("computation `{0}` has no root")]
    NoRoot(String),
}

/// A convenient alias for a `Result` that uses `IrError` as the error type.
pub type IrResult<T> = Result<T, IrError>;
