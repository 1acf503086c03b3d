//! Canonicalize all-gathers of reshaped data so that common subexpression elimination can merge
//! them.
//!
//! Two all-gathers of the same data are structurally different when one of them gathers the data
//! directly and the other gathers it after a reshape adding unit dimensions, like `[X,Y]` to
//! `[1,X,Y]`. This pass looks through such reshapes and gathers the underlying data instead,
//! followed by a reshape back to the original result shape:
//!
//! ```text
//! inst1 = f32[1,4,8] reshape(inst0)
//! inst2 = f32[1,16,8] all-gather(inst1), dimensions={1}
//! ```
//!
//! becomes
//!
//! ```text
//! inst3 = f32[16,8] all-gather(inst0), dimensions={0}
//! inst4 = f32[1,16,8] reshape(inst3)
//! ```
//!
//! Only all-gathers with a single operand are rewritten.

use crate::degenerate::is_degenerate_reshape;
use crate::result::{PassError, PassResult};
use crate::timing::{self, Pass};
use hlo_ir::{
    AllGather, ChannelId, ChannelIdAllocator, Computation, Inst, InstructionData, Module, Shape,
};

/// The all-gather canonicalization pass.
///
/// The pass owns the allocator handing out channel ids for the all-gathers it creates. It is
/// reseeded from the module at the start of every [`run`](Self::run).
#[derive(Debug, Default)]
pub struct CanonicalizeAllGatherForCse {
    channel_ids: ChannelIdAllocator,
}

impl CanonicalizeAllGatherForCse {
    /// Create the pass.
    pub fn new() -> Self {
        Self::default()
    }

    /// The channel id the next rewritten all-gather with a channel id will get.
    pub fn next_channel_id(&self) -> ChannelId {
        self.channel_ids.peek()
    }

    /// Run the pass on every computation of `module`, and return whether anything changed.
    pub fn run(&mut self, module: &mut Module) -> PassResult<bool> {
        let _tt = timing::start(Pass::CanonicalizeAllGather);
        self.channel_ids = ChannelIdAllocator::for_module(module);
        log::debug!(
            "canonicalizing all-gathers in `{}`, next channel id {}",
            module.name(),
            self.channel_ids.peek()
        );

        let mut changed = false;
        for (_, comp) in module.computations_mut() {
            changed |= self.run_on_computation(comp)?;
        }
        Ok(changed)
    }

    /// Run the pass on a single computation, and return whether it changed.
    ///
    /// Channel ids are allocated from the state left by the last [`run`](Self::run), so running
    /// on a computation of a module without going through `run` first may produce channel ids
    /// already used by that module.
    pub fn run_on_computation(&mut self, comp: &mut Computation) -> PassResult<bool> {
        let mut changed = false;
        // Instructions created by the rewrites are not in this snapshot, and removed ones are
        // skipped.
        for inst in comp.post_order() {
            if !comp.is_live(inst) {
                continue;
            }
            changed |= self.canonicalize(comp, inst)?;
        }
        Ok(changed)
    }

    fn canonicalize(&mut self, comp: &mut Computation, ag: Inst) -> PassResult<bool> {
        let gather = match comp.inst_data(ag) {
            InstructionData::AllGather(gather) => gather.clone(),
            _ => return Ok(false),
        };
        let [operand] = *comp.operands(ag) else {
            trace!(
                "{ag}: skipping all-gather with {} operands",
                comp.operands(ag).len()
            );
            return Ok(false);
        };

        let in_shape = comp.shape(operand);
        let out_shape = comp.shape(ag);
        let dim = gather.gather_dimension;
        if !in_shape.is_array() || dim >= in_shape.rank() || dim >= out_shape.rank() {
            return Err(PassError::GatherDimensionOutOfRange {
                inst: ag,
                dimension: dim,
                shape: in_shape.clone(),
            });
        }

        let mut real_data = operand;
        while is_degenerate_reshape(comp, real_data) {
            real_data = comp.operands(real_data)[0];
        }
        if real_data == operand {
            trace!("{ag}: operand {operand} is not a unit-dimension reshape");
            return Ok(false);
        }

        // The number of elements before the gather dimension, and the number of participants,
        // are taken from the operand of the all-gather, not from the data under the reshapes.
        let major_elements: u64 = in_shape.dimensions()[..dim].iter().product();
        let size = in_shape.dimension(dim);
        let gathered = out_shape.dimension(dim);
        if size == 0 && gathered == 0 {
            trace!("{ag}: nothing to gather along empty dimension {dim}");
            return Ok(false);
        }
        if size == 0 || gathered % size != 0 {
            return Err(PassError::GatherSizeNotDivisible {
                inst: ag,
                gathered,
                size,
            });
        }
        let participants = gathered / size;

        let real_shape = comp.shape(real_data);
        let new_dim = match gather_dimension_after(real_shape, major_elements) {
            Some(new_dim) => new_dim,
            None => {
                return Err(PassError::GatherDimensionNotFound {
                    inst: ag,
                    shape: real_shape.clone(),
                    major_elements,
                });
            }
        };
        if new_dim >= real_shape.rank() {
            // Gathering along a trailing unit dimension that `real_data` doesn't have.
            trace!("{ag}: {real_shape} has no dimension {new_dim} to gather along");
            return Ok(false);
        }

        let mut new_shape = real_shape.clone();
        new_shape.set_dimension(new_dim, participants * real_shape.dimension(new_dim));
        let result_shape = out_shape.clone();
        let channel_id = gather.channel_id.map(|_| self.channel_ids.allocate());

        let new_ag = comp.add_instruction(
            InstructionData::AllGather(AllGather {
                gather_dimension: new_dim,
                channel_id,
                ..gather
            }),
            new_shape,
            &[real_data],
        )?;
        let formatting = comp.add_instruction(InstructionData::Reshape, result_shape, &[new_ag])?;
        comp.replace_all_uses_with(ag, formatting)?;
        comp.remove_instruction_and_unused_operands(ag)?;

        log::debug!(
            "{ag}: gathering {real_data} along dimension {new_dim} as {new_ag}, reshaped by {formatting}"
        );
        Ok(true)
    }
}

/// Find the dimension of `shape` preceded by exactly `major_elements` elements.
///
/// Returns the rank of `shape` when all of its dimensions are needed, and `None` when no
/// dimension boundary falls on `major_elements`.
fn gather_dimension_after(shape: &Shape, mut major_elements: u64) -> Option<usize> {
    let mut dim = 0;
    while major_elements > 1 {
        let size = *shape.dimensions().get(dim)?;
        if size == 0 || major_elements % size != 0 {
            return None;
        }
        major_elements /= size;
        dim += 1;
    }
    Some(dim)
}
