//! Instruction kinds and their immediate data.
//!
//! The operands of an instruction are not part of its data: they are edges of the dataflow graph
//! and are owned by the [`Computation`](crate::Computation) holding the instruction.

use crate::entities::ChannelId;
use core::fmt;
#[cfg(feature = "enable-serde")]
use serde_derive::{Deserialize, Serialize};

/// Partition of the replica set into the groups participating together in one instance of a
/// collective. An empty list means a single group containing every replica.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct ReplicaGroups(Vec<Vec<u64>>);

impl ReplicaGroups {
    /// Create replica groups from explicit replica id lists.
    pub fn new(groups: Vec<Vec<u64>>) -> Self {
        Self(groups)
    }

    /// The replica groups; empty when all replicas form a single group.
    pub fn groups(&self) -> &[Vec<u64>] {
        &self.0
    }

    /// Is this the implicit single group of all replicas?
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ReplicaGroups {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;
        for (i, group) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{{")?;
            for (k, replica) in group.iter().enumerate() {
                if k > 0 {
                    write!(f, ",")?;
                }
                write!(f, "{replica}")?;
            }
            write!(f, "}}")?;
        }
        write!(f, "}}")
    }
}

/// Immediate data of an all-gather.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct AllGather {
    /// Dimension of the operand shape along which the replicas' data is concatenated.
    pub gather_dimension: usize,
    /// Groups of replicas gathering together.
    pub replica_groups: ReplicaGroups,
    /// Whether the layout of the result is constrained.
    pub constrain_layout: bool,
    /// Cross-partition channel; absent when the gather only communicates within replica groups.
    pub channel_id: Option<ChannelId>,
    /// Whether `replica_groups` holds global device ids rather than replica ids.
    pub use_global_device_ids: bool,
}

/// Element-wise operations on a single operand.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum UnaryOp {
    /// `-x`
    Negate,
    /// `|x|`
    Abs,
    /// Identity copy.
    Copy,
}

/// Element-wise operations on two operands of the same shape.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum BinaryOp {
    /// `x + y`
    Add,
    /// `x * y`
    Multiply,
}

/// The kind of an instruction together with its immediate data.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub enum InstructionData {
    /// Computation parameter `number`.
    Parameter {
        /// Position in the computation's parameter list.
        number: usize,
    },
    /// Collective concatenation of every replica's operand along one dimension.
    AllGather(AllGather),
    /// Collective element-wise sum of every replica's operand.
    AllReduce {
        /// Groups of replicas reducing together.
        replica_groups: ReplicaGroups,
        /// Cross-partition channel, if any.
        channel_id: Option<ChannelId>,
        /// Whether `replica_groups` holds global device ids.
        use_global_device_ids: bool,
    },
    /// Reinterpretation of the operand's elements, in row-major order, under a new shape.
    Reshape,
    /// A reshape known not to move any data.
    Bitcast,
    /// Element-wise unary operation.
    Unary(UnaryOp),
    /// Element-wise binary operation.
    Binary(BinaryOp),
}

impl InstructionData {
    /// The opcode of this instruction.
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Parameter { .. } => Opcode::Parameter,
            Self::AllGather(_) => Opcode::AllGather,
            Self::AllReduce { .. } => Opcode::AllReduce,
            Self::Reshape => Opcode::Reshape,
            Self::Bitcast => Opcode::Bitcast,
            Self::Unary(UnaryOp::Negate) => Opcode::Negate,
            Self::Unary(UnaryOp::Abs) => Opcode::Abs,
            Self::Unary(UnaryOp::Copy) => Opcode::Copy,
            Self::Binary(BinaryOp::Add) => Opcode::Add,
            Self::Binary(BinaryOp::Multiply) => Opcode::Multiply,
        }
    }

    /// The channel id of a communicating instruction.
    pub fn channel_id(&self) -> Option<ChannelId> {
        match self {
            Self::AllGather(ag) => ag.channel_id,
            Self::AllReduce { channel_id, .. } => *channel_id,
            _ => None,
        }
    }

    /// Get the all-gather data, if this is an all-gather.
    pub fn as_all_gather(&self) -> Option<&AllGather> {
        match self {
            Self::AllGather(ag) => Some(ag),
            _ => None,
        }
    }
}

/// Operation kind of an instruction.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// `parameter`
    Parameter,
    /// `all-gather`
    AllGather,
    /// `all-reduce`
    AllReduce,
    /// `reshape`
    Reshape,
    /// `bitcast`
    Bitcast,
    /// `negate`
    Negate,
    /// `abs`
    Abs,
    /// `copy`
    Copy,
    /// `add`
    Add,
    /// `multiply`
    Multiply,
}

impl Opcode {
    /// Name of the opcode in the text format.
    pub fn name(self) -> &'static str {
        match self {
            Self::Parameter => "parameter",
            Self::AllGather => "all-gather",
            Self::AllReduce => "all-reduce",
            Self::Reshape => "reshape",
            Self::Bitcast => "bitcast",
            Self::Negate => "negate",
            Self::Abs => "abs",
            Self::Copy => "copy",
            Self::Add => "add",
            Self::Multiply => "multiply",
        }
    }

    /// Does this opcode communicate across replicas?
    pub fn is_collective(self) -> bool {
        matches!(self, Self::AllGather | Self::AllReduce)
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}
