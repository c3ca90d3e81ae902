use crate::error::CoreError;
use crate::ir::Program;

/// A whole-program analysis pass.
///
/// Structuring passes annotate procedures in place, so a pass borrows the
/// program mutably rather than consuming it. A failing pass aborts the
/// run; the program keeps whatever annotations were written before the
/// failure, and callers treat it as dead.
pub trait Pass {
    /// Name used to attribute failures.
    fn name(&self) -> &str;

    fn apply(&self, program: &mut Program) -> Result<(), CoreError>;
}

/// Runs passes over a program in registration order.
///
/// Stage order is load-bearing for structuring (dominators feed the case
/// and loop passes, which feed the if pass), so there is no reordering or
/// fixpoint machinery — the pipeline is the order it was built in.
pub struct PassPipeline {
    passes: Vec<Box<dyn Pass>>,
}

impl PassPipeline {
    pub fn new() -> Self {
        PassPipeline { passes: Vec::new() }
    }

    /// Append a pass; chains so pipelines read in execution order.
    pub fn with(mut self, pass: Box<dyn Pass>) -> Self {
        self.passes.push(pass);
        self
    }

    /// Run every pass, wrapping any failure with the pass that raised it.
    pub fn run(&self, program: &mut Program) -> Result<(), CoreError> {
        for pass in &self.passes {
            pass.apply(program).map_err(|err| CoreError::Pass {
                pass: pass.name().to_string(),
                source: Box::new(err),
            })?;
        }
        Ok(())
    }
}

impl Default for PassPipeline {
    fn default() -> Self {
        Self::new()
    }
}
