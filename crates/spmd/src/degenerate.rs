//! Recognizing reshapes which only add unit dimensions.

use hlo_ir::{Computation, Inst, InstructionData, dimensions_unmodified_by_reshape};

/// Is `inst` a reshape or bitcast which only inserts dimensions of size 1 into the shape of its
/// operand, like going from `[X,Y]` to `[1,X,Y,1]`?
///
/// Every dimension of the operand must appear unchanged, and in the same order, in the result.
pub fn is_degenerate_reshape(comp: &Computation, inst: Inst) -> bool {
    if !matches!(
        comp.inst_data(inst),
        InstructionData::Reshape | InstructionData::Bitcast
    ) {
        return false;
    }
    let [operand] = *comp.operands(inst) else {
        return false;
    };
    let in_shape = comp.shape(operand);
    let out_shape = comp.shape(inst);
    in_shape.is_array()
        && out_shape.is_array()
        && in_shape.elements() == out_shape.elements()
        && dimensions_unmodified_by_reshape(in_shape, out_shape).len() == in_shape.rank()
}
