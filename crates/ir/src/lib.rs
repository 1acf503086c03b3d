//! HLO intermediate representation.
//!
//! A [`Module`] owns a set of [`Computation`]s. Each computation is an arena of instructions
//! addressed by [`Inst`] entity references; operand and user edges are recorded by reference, so
//! rewriting a computation never follows or frees pointers. The representation supports the graph
//! mutations needed by module passes: appending instructions, rewiring all users of one
//! instruction to another, and removing an instruction together with the operands it leaves
//! unused.
#![deny(missing_docs)]

pub use cranelift_entity as entity;

pub mod builder;
pub mod computation;
pub mod entities;
pub mod instructions;
pub mod module;
pub mod shape;
pub mod verifier;
pub mod write;

mod result;

pub use crate::builder::ComputationBuilder;
pub use crate::computation::Computation;
pub use crate::entities::{ChannelId, Comp, Inst};
pub use crate::instructions::{
    AllGather, BinaryOp, InstructionData, Opcode, ReplicaGroups, UnaryOp,
};
pub use crate::module::{ChannelIdAllocator, Module};
pub use crate::result::{IrError, IrResult};
pub use crate::shape::{ElementType, Shape, dimensions_unmodified_by_reshape};
pub use crate::verifier::{verify_computation, verify_module};
pub use crate::write::{write_computation, write_module};
