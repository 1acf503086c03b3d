//! Convenience builder for computations.

use crate::computation::Computation;
use crate::entities::{ChannelId, Inst};
use crate::instructions::{AllGather, BinaryOp, InstructionData, ReplicaGroups, UnaryOp};
use crate::result::IrResult;
use crate::shape::Shape;

/// Appends instructions to a computation through typed helpers.
///
/// ```ignore
/// let mut b = ComputationBuilder::new("main");
/// let p = b.parameter(0, Shape::array(ElementType::F32, &[4, 8]))?;
/// let r = b.reshape(p, Shape::array(ElementType::F32, &[1, 4, 8]))?;
/// let comp = b.finish(r)?;
/// ```
pub struct ComputationBuilder {
    comp: Computation,
}

impl ComputationBuilder {
    /// Start building a computation called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            comp: Computation::new(name),
        }
    }

    /// The computation built so far.
    pub fn computation(&self) -> &Computation {
        &self.comp
    }

    /// Append an arbitrary instruction.
    pub fn add(&mut self, data: InstructionData, shape: Shape, operands: &[Inst]) -> IrResult<Inst> {
        self.comp.add_instruction(data, shape, operands)
    }

    /// Parameter `number` of shape `shape`.
    pub fn parameter(&mut self, number: usize, shape: Shape) -> IrResult<Inst> {
        self.add(InstructionData::Parameter { number }, shape, &[])
    }

    /// Reshape `operand` to `shape`.
    pub fn reshape(&mut self, operand: Inst, shape: Shape) -> IrResult<Inst> {
        self.add(InstructionData::Reshape, shape, &[operand])
    }

    /// Bitcast `operand` to `shape`.
    pub fn bitcast(&mut self, operand: Inst, shape: Shape) -> IrResult<Inst> {
        self.add(InstructionData::Bitcast, shape, &[operand])
    }

    /// All-gather of a single operand along `gather_dimension`.
    pub fn all_gather(
        &mut self,
        operand: Inst,
        shape: Shape,
        gather_dimension: usize,
        replica_groups: ReplicaGroups,
        channel_id: Option<ChannelId>,
    ) -> IrResult<Inst> {
        self.all_gather_multi(&[operand], shape, gather_dimension, replica_groups, channel_id)
    }

    /// All-gather of several operands at once, producing a tuple.
    pub fn all_gather_multi(
        &mut self,
        operands: &[Inst],
        shape: Shape,
        gather_dimension: usize,
        replica_groups: ReplicaGroups,
        channel_id: Option<ChannelId>,
    ) -> IrResult<Inst> {
        let data = InstructionData::AllGather(AllGather {
            gather_dimension,
            replica_groups,
            constrain_layout: false,
            channel_id,
            use_global_device_ids: channel_id.is_some(),
        });
        self.add(data, shape, operands)
    }

    /// All-reduce of `operand`.
    ///
    /// The result has the shape of `operand`, which must be live.
    pub fn all_reduce(
        &mut self,
        operand: Inst,
        replica_groups: ReplicaGroups,
        channel_id: Option<ChannelId>,
    ) -> IrResult<Inst> {
        let shape = self.comp.shape(operand).clone();
        let data = InstructionData::AllReduce {
            replica_groups,
            channel_id,
            use_global_device_ids: channel_id.is_some(),
        };
        self.add(data, shape, &[operand])
    }

    /// Element-wise unary operation. Panics if `operand` isn't live.
    pub fn unary(&mut self, op: UnaryOp, operand: Inst) -> IrResult<Inst> {
        let shape = self.comp.shape(operand).clone();
        self.add(InstructionData::Unary(op), shape, &[operand])
    }

    /// Element-wise binary operation, shaped like `lhs`.
    pub fn binary(&mut self, op: BinaryOp, lhs: Inst, rhs: Inst) -> IrResult<Inst> {
        let shape = self.comp.shape(lhs).clone();
        self.add(InstructionData::Binary(op), shape, &[lhs, rhs])
    }

    /// Finish the computation with `root` as its result.
    pub fn finish(mut self, root: Inst) -> IrResult<Computation> {
        self.comp.set_root(root)?;
        Ok(self.comp)
    }
}
