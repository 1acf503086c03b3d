//! Converting HLO IR to text.
//!
//! The `write` module provides `write_computation` and `write_module`, which render the IR in a
//! compact textual form, one instruction per line in insertion order. The text is stable: two
//! structurally identical computations print identically, which tests rely on.

use crate::computation::Computation;
use crate::entities::Inst;
use crate::instructions::InstructionData;
use crate::module::Module;
use core::fmt::{self, Write};

/// Write `comp` to `w` as text.
pub fn write_computation(w: &mut dyn Write, comp: &Computation) -> fmt::Result {
    writeln!(w, "computation {} {{", comp.name())?;
    for inst in comp.instructions() {
        write_instruction(w, comp, inst, 1)?;
    }
    writeln!(w, "}}")
}

/// Write every computation of `module` to `w` as text.
pub fn write_module(w: &mut dyn Write, module: &Module) -> fmt::Result {
    write!(w, "module {}", module.name())?;
    if let Some(entry) = module.entry() {
        write!(w, ", entry={}", module.computation(entry).name())?;
    }
    writeln!(w)?;
    for (_, comp) in module.computations() {
        writeln!(w)?;
        write_computation(w, comp)?;
    }
    Ok(())
}

/// Write a single instruction of `comp`, without any trailing newline.
pub fn write_operation(w: &mut dyn Write, comp: &Computation, inst: Inst) -> fmt::Result {
    let data = comp.inst_data(inst);
    write!(w, "{inst} = {} {}(", comp.shape(inst), data.opcode())?;
    match data {
        InstructionData::Parameter { number } => write!(w, "{number}")?,
        _ => {
            for (i, operand) in comp.operands(inst).iter().enumerate() {
                if i > 0 {
                    write!(w, ", ")?;
                }
                write!(w, "{operand}")?;
            }
        }
    }
    write!(w, ")")?;

    match data {
        InstructionData::AllGather(ag) => {
            write!(
                w,
                ", dimensions={{{}}}, replica_groups={}",
                ag.gather_dimension, ag.replica_groups
            )?;
            if ag.constrain_layout {
                write!(w, ", constrain_layout=true")?;
            }
            if let Some(channel_id) = ag.channel_id {
                write!(w, ", channel_id={channel_id}")?;
            }
            if ag.use_global_device_ids {
                write!(w, ", use_global_device_ids=true")?;
            }
        }
        InstructionData::AllReduce {
            replica_groups,
            channel_id,
            use_global_device_ids,
        } => {
            write!(w, ", replica_groups={replica_groups}")?;
            if let Some(channel_id) = channel_id {
                write!(w, ", channel_id={channel_id}")?;
            }
            if *use_global_device_ids {
                write!(w, ", use_global_device_ids=true")?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn write_instruction(
    w: &mut dyn Write,
    comp: &Computation,
    inst: Inst,
    indent: usize,
) -> fmt::Result {
    write!(w, "{:1$}", "", indent * 2)?;
    if comp.root() == Some(inst) {
        write!(w, "ROOT ")?;
    }
    write_operation(w, comp, inst)?;
    writeln!(w)
}

/// Wrapper type capable of displaying a `Computation`.
pub struct DisplayComputation<'a>(&'a Computation);

impl fmt::Display for DisplayComputation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_computation(f, self.0)
    }
}

/// Wrapper type capable of displaying a `Module`.
pub struct DisplayModule<'a>(&'a Module);

impl fmt::Display for DisplayModule<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_module(f, self.0)
    }
}

/// Wrapper type capable of displaying a single instruction.
pub struct DisplayInst<'a>(&'a Computation, Inst);

impl fmt::Display for DisplayInst<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write_operation(f, self.0, self.1)
    }
}

impl Computation {
    /// Return an object that can display this computation.
    pub fn display(&self) -> DisplayComputation<'_> {
        DisplayComputation(self)
    }

    /// Return an object that can display `inst`.
    pub fn display_inst(&self, inst: Inst) -> DisplayInst<'_> {
        DisplayInst(self, inst)
    }
}

impl Module {
    /// Return an object that can display this module.
    pub fn display(&self) -> DisplayModule<'_> {
        DisplayModule(self)
    }
}
