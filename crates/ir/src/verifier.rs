//! A verifier for ensuring that HLO IR is well formed.
//!
//! The verifier checks:
//!
//! Dataflow graph
//!
//! - Every operand of a live instruction is live, and lists the instruction among its users.
//! - Every user of a live instruction is live, and lists the instruction among its operands.
//! - The computation has a root, and the root is live.
//!
//! Instruction shapes
//!
//! - Reshapes and bitcasts take one array and preserve its element count and type.
//! - A single-operand all-gather has an array result of the operand's rank whose gather
//!   dimension is an exact multiple of the operand's, with all other dimensions unchanged. A
//!   multi-operand all-gather produces a tuple with one such result per operand.
//! - Element-wise operations produce the shape of their operands.
//!
//! Module
//!
//! - Channel ids of all-gathers and all-reduces are unique within the module.

use crate::computation::Computation;
use crate::entities::{ChannelId, Inst};
use crate::instructions::InstructionData;
use crate::module::Module;
use crate::shape::Shape;
use core::fmt;
use std::collections::HashMap;

/// A verifier error.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct VerifierError {
    /// The computation containing the error.
    pub computation: String,
    /// The instruction the error is about, if any.
    pub inst: Option<Inst>,
    /// The error message.
    pub message: String,
}

impl std::error::Error for VerifierError {}

impl fmt::Display for VerifierError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.inst {
            Some(inst) => write!(f, "{}/{}: {}", self.computation, inst, self.message),
            None => write!(f, "{}: {}", self.computation, self.message),
        }
    }
}

/// Result of a step in the verification process.
///
/// Functions that return `VerifierStepResult` should also take a mutable reference to
/// `VerifierErrors` as argument in order to report errors.
///
/// Here, `Ok` represents a step that **did not lead to a fatal error**, meaning that the
/// verification process may continue. However, other (non-fatal) errors might have been
/// reported through the previously mentioned `VerifierErrors` argument.
pub type VerifierStepResult = Result<(), ()>;

/// Result of a verification operation.
///
/// Unlike `VerifierStepResult` which may be `Ok` while still having reported errors, this type
/// always returns `Err` if an error (fatal or not) was reported.
pub type VerifierResult<T> = Result<T, VerifierErrors>;

/// List of verifier errors.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct VerifierErrors(pub Vec<VerifierError>);

impl std::error::Error for VerifierErrors {}

impl VerifierErrors {
    /// Return a new `VerifierErrors` struct.
    #[inline]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Return whether no errors were reported.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Return whether one or more errors were reported.
    #[inline]
    pub fn has_error(&self) -> bool {
        !self.0.is_empty()
    }

    /// Return a `VerifierStepResult` that is fatal if at least one error was reported,
    /// and non-fatal otherwise.
    #[inline]
    pub fn as_result(&self) -> VerifierStepResult {
        if self.is_empty() { Ok(()) } else { Err(()) }
    }

    /// Report an error, adding it to the list of errors.
    pub fn report(&mut self, error: VerifierError) {
        self.0.push(error);
    }

    /// Report a fatal error and return `Err`.
    pub fn fatal(&mut self, error: VerifierError) -> VerifierStepResult {
        self.report(error);
        Err(())
    }

    /// Report a non-fatal error and return `Ok`.
    pub fn nonfatal(&mut self, error: VerifierError) -> VerifierStepResult {
        self.report(error);
        Ok(())
    }
}

impl From<Vec<VerifierError>> for VerifierErrors {
    fn from(v: Vec<VerifierError>) -> Self {
        VerifierErrors(v)
    }
}

impl fmt::Display for VerifierErrors {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for err in &self.0 {
            writeln!(f, "- {err}")?;
        }
        Ok(())
    }
}

/// Verify `comp`.
pub fn verify_computation(comp: &Computation) -> VerifierResult<()> {
    let mut errors = VerifierErrors::default();
    let _ = Verifier::new(comp).run(&mut errors);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Verify every computation of `module`, and the module-wide channel id constraints.
pub fn verify_module(module: &Module) -> VerifierResult<()> {
    let mut errors = VerifierErrors::default();
    let mut channels: HashMap<ChannelId, (&str, Inst)> = HashMap::new();
    for (_, comp) in module.computations() {
        let _ = Verifier::new(comp).run(&mut errors);
        for inst in comp.instructions() {
            let Some(channel_id) = comp.inst_data(inst).channel_id() else {
                continue;
            };
            if let Some((other_comp, other)) = channels.insert(channel_id, (comp.name(), inst)) {
                errors.report(VerifierError {
                    computation: comp.name().to_string(),
                    inst: Some(inst),
                    message: format!(
                        "channel_id={channel_id} is also used by {other_comp}/{other}"
                    ),
                });
            }
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

struct Verifier<'a> {
    comp: &'a Computation,
}

impl<'a> Verifier<'a> {
    fn new(comp: &'a Computation) -> Self {
        Self { comp }
    }

    fn error(&self, inst: Option<Inst>, message: impl Into<String>) -> VerifierError {
        VerifierError {
            computation: self.comp.name().to_string(),
            inst,
            message: message.into(),
        }
    }

    fn run(&self, errors: &mut VerifierErrors) -> VerifierStepResult {
        match self.comp.root() {
            None => errors.nonfatal(self.error(None, "no root instruction"))?,
            Some(root) if !self.comp.is_live(root) => {
                errors.nonfatal(self.error(Some(root), "root has been removed"))?
            }
            Some(_) => {}
        }
        for inst in self.comp.instructions() {
            self.verify_edges(inst, errors)?;
            self.verify_shapes(inst, errors)?;
        }
        errors.as_result()
    }

    fn verify_edges(&self, inst: Inst, errors: &mut VerifierErrors) -> VerifierStepResult {
        let comp = self.comp;
        for &operand in comp.operands(inst) {
            if !comp.is_live(operand) {
                return errors.fatal(self.error(
                    Some(inst),
                    format!("uses {operand}, which has been removed"),
                ));
            }
            if !comp.users(operand).contains(&inst) {
                errors.nonfatal(self.error(
                    Some(inst),
                    format!("uses {operand}, which doesn't list it as a user"),
                ))?;
            }
        }
        for &user in comp.users(inst) {
            if !comp.is_live(user) {
                return errors.fatal(self.error(
                    Some(inst),
                    format!("is used by {user}, which has been removed"),
                ));
            }
            if !comp.operands(user).contains(&inst) {
                errors.nonfatal(self.error(
                    Some(inst),
                    format!("lists {user} as a user, but isn't one of its operands"),
                ))?;
            }
        }
        Ok(())
    }

    fn verify_shapes(&self, inst: Inst, errors: &mut VerifierErrors) -> VerifierStepResult {
        let comp = self.comp;
        let shape = comp.shape(inst);
        let operands = comp.operands(inst);
        let operand_shapes: Vec<&Shape> = operands.iter().map(|&op| comp.shape(op)).collect();

        match comp.inst_data(inst) {
            InstructionData::Parameter { .. } => {
                if !operands.is_empty() {
                    return errors.nonfatal(self.error(Some(inst), "parameter with operands"));
                }
            }
            InstructionData::Reshape | InstructionData::Bitcast => {
                let [operand_shape] = operand_shapes[..] else {
                    return errors.nonfatal(self.error(
                        Some(inst),
                        format!("expected 1 operand, got {}", operands.len()),
                    ));
                };
                if !operand_shape.is_array() || !shape.is_array() {
                    return errors.nonfatal(self.error(Some(inst), "reshape of a tuple"));
                }
                if operand_shape.element_type() != shape.element_type()
                    || operand_shape.elements() != shape.elements()
                {
                    return errors.nonfatal(self.error(
                        Some(inst),
                        format!("can't reshape {operand_shape} to {shape}"),
                    ));
                }
            }
            InstructionData::AllGather(ag) => match operand_shapes[..] {
                [] => return errors.nonfatal(self.error(Some(inst), "all-gather without operands")),
                [operand_shape] => {
                    self.verify_gather(inst, operand_shape, shape, ag.gather_dimension, errors)?;
                }
                _ => {
                    if !shape.is_tuple() || shape.tuple_shapes().len() != operands.len() {
                        return errors.nonfatal(self.error(
                            Some(inst),
                            format!(
                                "all-gather of {} operands must produce a tuple of {} arrays",
                                operands.len(),
                                operands.len()
                            ),
                        ));
                    }
                    for (operand_shape, result) in operand_shapes.iter().zip(shape.tuple_shapes())
                    {
                        self.verify_gather(inst, operand_shape, result, ag.gather_dimension, errors)?;
                    }
                }
            },
            InstructionData::AllReduce { .. } | InstructionData::Unary(_) => {
                if operand_shapes.len() != 1 || !operand_shapes[0].compatible(shape) {
                    return errors.nonfatal(self.error(
                        Some(inst),
                        "element-wise operation must preserve the shape of its operand",
                    ));
                }
            }
            InstructionData::Binary(_) => {
                if operand_shapes.len() != 2 || operand_shapes.iter().any(|s| !s.compatible(shape)) {
                    return errors.nonfatal(self.error(
                        Some(inst),
                        "binary operation must combine two operands of its own shape",
                    ));
                }
            }
        }
        Ok(())
    }

    fn verify_gather(
        &self,
        inst: Inst,
        operand: &Shape,
        result: &Shape,
        dim: usize,
        errors: &mut VerifierErrors,
    ) -> VerifierStepResult {
        if !operand.is_array() || !result.is_array() {
            return errors.nonfatal(self.error(Some(inst), "all-gather of a tuple"));
        }
        if operand.rank() != result.rank() || operand.element_type() != result.element_type() {
            return errors.nonfatal(self.error(
                Some(inst),
                format!("all-gather can't produce {result} from {operand}"),
            ));
        }
        if dim >= operand.rank() {
            return errors.nonfatal(self.error(
                Some(inst),
                format!("gather dimension {dim} out of range for {operand}"),
            ));
        }
        for (d, (&a, &b)) in operand.dimensions().iter().zip(result.dimensions()).enumerate() {
            let ok = if d == dim {
                if a == 0 { b == 0 } else { b % a == 0 }
            } else {
                a == b
            };
            if !ok {
                return errors.nonfatal(self.error(
                    Some(inst),
                    format!("all-gather along {dim} can't produce {result} from {operand}"),
                ));
            }
        }
        Ok(())
    }
}
