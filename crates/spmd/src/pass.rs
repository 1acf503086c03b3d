//! Running passes over a module.

use crate::canonicalize_all_gather::CanonicalizeAllGatherForCse;
use crate::result::PassResult;
use crate::settings::Flags;
use crate::timing::{self, Pass};
use hlo_ir::{Module, verify_module};

/// A transformation of a whole module.
pub trait ModulePass {
    /// Short name of the pass, used in logs.
    fn name(&self) -> &'static str;

    /// Run the pass on `module`, and return whether it changed anything.
    fn run(&mut self, module: &mut Module) -> PassResult<bool>;
}

impl ModulePass for CanonicalizeAllGatherForCse {
    fn name(&self) -> &'static str {
        "canonicalize-all-gather-for-cse"
    }

    fn run(&mut self, module: &mut Module) -> PassResult<bool> {
        CanonicalizeAllGatherForCse::run(self, module)
    }
}

/// An ordered sequence of passes sharing one set of flags.
///
/// When the verifier is enabled, the module is verified before the first pass and after every
/// pass reporting a change. The first error stops the pipeline; changes made by the passes that
/// already ran are kept.
pub struct PassPipeline {
    flags: Flags,
    passes: Vec<Box<dyn ModulePass>>,
}

impl PassPipeline {
    /// Create an empty pipeline.
    pub fn new(flags: Flags) -> Self {
        Self {
            flags,
            passes: Vec::new(),
        }
    }

    /// The flags of this pipeline.
    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    /// Append `pass` to the pipeline.
    pub fn add_pass(&mut self, pass: impl ModulePass + 'static) -> &mut Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Names of the passes, in the order they run.
    pub fn pass_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.passes.iter().map(|pass| pass.name())
    }

    /// Run every pass in order, and return whether any of them changed the module.
    pub fn run(&mut self, module: &mut Module) -> PassResult<bool> {
        let _tt = timing::start(Pass::Pipeline);
        verify_if(&self.flags, module)?;

        let mut changed = false;
        for pass in &mut self.passes {
            if self.flags.dump_ir() {
                log::debug!("IR before {}:\n{}", pass.name(), module.display());
            }
            let pass_changed = pass.run(module)?;
            if pass_changed {
                log::debug!("{} changed `{}`", pass.name(), module.name());
                if self.flags.dump_ir() {
                    log::debug!("IR after {}:\n{}", pass.name(), module.display());
                }
                verify_if(&self.flags, module)?;
            } else {
                log::debug!("{} left `{}` unchanged", pass.name(), module.name());
            }
            changed |= pass_changed;
        }
        Ok(changed)
    }
}

/// Run the verifier if the `enable_verifier` setting is true.
fn verify_if(flags: &Flags, module: &Module) -> PassResult<()> {
    if flags.enable_verifier() {
        let _tt = timing::start(Pass::VerifyModule);
        verify_module(module)?;
    }
    Ok(())
}
