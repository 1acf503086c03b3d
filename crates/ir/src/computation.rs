//! Computations: arenas of instructions forming a dataflow graph.

use crate::entities::Inst;
use crate::entity::{EntitySet, PrimaryMap};
use crate::instructions::InstructionData;
use crate::result::{IrError, IrResult};
use crate::shape::Shape;
use smallvec::SmallVec;
#[cfg(feature = "enable-serde")]
use serde_derive::{Deserialize, Serialize};

/// An instruction and its dataflow edges.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
struct InstNode {
    data: InstructionData,
    shape: Shape,
    /// Operands in order; may repeat.
    operands: SmallVec<[Inst; 2]>,
    /// Distinct instructions having this one as an operand, in the order they started using it.
    users: SmallVec<[Inst; 2]>,
}

/// A computation owns an ordered collection of instructions.
///
/// Instructions are kept in insertion order. Removing an instruction frees its arena slot and
/// drops all of its edges; the `Inst` reference is never handed out again.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "enable-serde", derive(Serialize, Deserialize))]
pub struct Computation {
    name: String,
    insts: PrimaryMap<Inst, Option<InstNode>>,
    root: Option<Inst>,
}

impl Computation {
    /// Create a new empty computation.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            insts: PrimaryMap::new(),
            root: None,
        }
    }

    /// The name of this computation.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The instruction producing the result of this computation.
    pub fn root(&self) -> Option<Inst> {
        self.root
    }

    /// Make `inst` the root of this computation.
    pub fn set_root(&mut self, inst: Inst) -> IrResult<()> {
        self.node(inst)?;
        self.root = Some(inst);
        Ok(())
    }

    /// Number of live instructions.
    pub fn len(&self) -> usize {
        self.insts.values().filter(|node| node.is_some()).count()
    }

    /// Does this computation have no instructions?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Is `inst` an instruction of this computation which has not been removed?
    pub fn is_live(&self, inst: Inst) -> bool {
        matches!(self.insts.get(inst), Some(Some(_)))
    }

    /// Iterate over the live instructions in insertion order.
    pub fn instructions(&self) -> impl Iterator<Item = Inst> + '_ {
        self.insts
            .iter()
            .filter_map(|(inst, node)| node.as_ref().map(|_| inst))
    }

    /// Find the parameter instruction with the given number.
    pub fn parameter(&self, number: usize) -> Option<Inst> {
        self.instructions().find(|&inst| {
            matches!(self.inst_data(inst), InstructionData::Parameter { number: n } if *n == number)
        })
    }

    /// The data of `inst`.
    ///
    /// Panics if `inst` is not live.
    pub fn inst_data(&self, inst: Inst) -> &InstructionData {
        &self.live(inst).data
    }

    /// The shape of the value produced by `inst`.
    ///
    /// Panics if `inst` is not live.
    pub fn shape(&self, inst: Inst) -> &Shape {
        &self.live(inst).shape
    }

    /// The operands of `inst`, in order.
    ///
    /// Panics if `inst` is not live.
    pub fn operands(&self, inst: Inst) -> &[Inst] {
        &self.live(inst).operands
    }

    /// The distinct instructions using `inst` as an operand.
    ///
    /// Panics if `inst` is not live.
    pub fn users(&self, inst: Inst) -> &[Inst] {
        &self.live(inst).users
    }

    fn live(&self, inst: Inst) -> &InstNode {
        match self.node(inst) {
            Ok(node) => node,
            Err(err) => panic!("{err} in computation `{}`", self.name),
        }
    }

    fn node(&self, inst: Inst) -> IrResult<&InstNode> {
        match self.insts.get(inst) {
            Some(Some(node)) => Ok(node),
            Some(None) => Err(IrError::RemovedInstruction(inst)),
            None => Err(IrError::UnknownInstruction(inst)),
        }
    }

    fn node_mut(&mut self, inst: Inst) -> IrResult<&mut InstNode> {
        match self.insts.get_mut(inst) {
            Some(Some(node)) => Ok(node),
            Some(None) => Err(IrError::RemovedInstruction(inst)),
            None => Err(IrError::UnknownInstruction(inst)),
        }
    }

    /// Append a new instruction using `operands`, and return a reference to it.
    pub fn add_instruction(
        &mut self,
        data: InstructionData,
        shape: Shape,
        operands: &[Inst],
    ) -> IrResult<Inst> {
        for &operand in operands {
            self.node(operand)?;
        }
        let inst = self.insts.push(Some(InstNode {
            data,
            shape,
            operands: SmallVec::from_slice(operands),
            users: SmallVec::new(),
        }));
        for &operand in operands {
            let users = &mut self.node_mut(operand)?.users;
            if !users.contains(&inst) {
                users.push(inst);
            }
        }
        Ok(inst)
    }

    /// Rewire every user of `old` to use `new` instead.
    ///
    /// If `new` itself uses `old`, that use is left alone. If `old` is the root of the
    /// computation, `new` becomes the root.
    pub fn replace_all_uses_with(&mut self, old: Inst, new: Inst) -> IrResult<()> {
        let old_shape = self.node(old)?.shape.clone();
        let new_shape = &self.node(new)?.shape;
        if !old_shape.compatible(new_shape) {
            return Err(IrError::ShapeMismatch {
                old: old_shape,
                new: new_shape.clone(),
            });
        }

        let users: SmallVec<[Inst; 2]> = self.node(old)?.users.clone();
        for &user in users.iter().filter(|&&user| user != new) {
            for operand in self.node_mut(user)?.operands.iter_mut() {
                if *operand == old {
                    *operand = new;
                }
            }
            let new_users = &mut self.node_mut(new)?.users;
            if !new_users.contains(&user) {
                new_users.push(user);
            }
        }
        self.node_mut(old)?.users.retain(|user| *user == new);

        if self.root == Some(old) {
            self.root = Some(new);
        }
        Ok(())
    }

    /// Remove `inst`, which must have no users and must not be the root.
    pub fn remove_instruction(&mut self, inst: Inst) -> IrResult<()> {
        let node = self.node(inst)?;
        if !node.users.is_empty() {
            return Err(IrError::HasUsers {
                inst,
                users: node.users.len(),
            });
        }
        if self.root == Some(inst) {
            return Err(IrError::RemovingRoot(inst));
        }

        let operands = node.operands.clone();
        for operand in operands {
            self.node_mut(operand)?.users.retain(|user| *user != inst);
        }
        log::trace!("removing {inst} from `{}`", self.name);
        self.insts[inst] = None;
        Ok(())
    }

    /// Remove `inst` and, transitively, every operand left without users.
    ///
    /// Parameters and the root are never removed as a consequence of losing their last user.
    pub fn remove_instruction_and_unused_operands(&mut self, inst: Inst) -> IrResult<()> {
        let mut worklist = vec![inst];
        let mut first = true;
        while let Some(inst) = worklist.pop() {
            if !first {
                // The same operand may be queued once per user removed.
                let node = match self.node(inst) {
                    Ok(node) => node,
                    Err(_) => continue,
                };
                if !node.users.is_empty()
                    || self.root == Some(inst)
                    || matches!(node.data, InstructionData::Parameter { .. })
                {
                    continue;
                }
            }
            first = false;
            worklist.extend(self.node(inst)?.operands.iter().copied());
            self.remove_instruction(inst)?;
        }
        Ok(())
    }

    /// Compute a post-order of the live instructions: every instruction appears after all of its
    /// operands.
    ///
    /// Instructions without users are used as starting points in insertion order, and operands are
    /// explored in order, so the result only depends on the structure of the computation. The
    /// returned vector is a snapshot; mutating the computation does not affect it.
    pub fn post_order(&self) -> Vec<Inst> {
        let mut order = Vec::with_capacity(self.insts.len());
        let mut visited = EntitySet::with_capacity(self.insts.len());
        let mut stack: Vec<(Inst, bool)> = Vec::new();

        for sink in self.instructions().filter(|&inst| self.users(inst).is_empty()) {
            stack.push((sink, false));
            while let Some((inst, operands_done)) = stack.pop() {
                if operands_done {
                    order.push(inst);
                    continue;
                }
                if !visited.insert(inst) {
                    continue;
                }
                stack.push((inst, true));
                for &operand in self.operands(inst).iter().rev() {
                    if !visited.contains(operand) {
                        stack.push((operand, false));
                    }
                }
            }
        }
        order
    }
}
