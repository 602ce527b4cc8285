//! Runner abstraction for brew invocations.
//!
//! The [`Runner`] trait executes one [`Invocation`] to completion, allowing
//! for different implementations (real processes, dry runs, recording
//! doubles in tests).

pub mod process;

use crate::command::Invocation;
use crate::error::Result;

pub use process::ProcessRunner;

/// Executes brew invocations.
///
/// Implementations must block until the invocation has finished. A
/// non-zero exit is an error.
pub trait Runner {
    /// Run one invocation to completion.
    fn run(&self, invocation: &Invocation) -> Result<()>;
}

impl<R: Runner + ?Sized> Runner for &R {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        (**self).run(invocation)
    }
}

impl<R: Runner + ?Sized> Runner for Box<R> {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        (**self).run(invocation)
    }
}

/// Runner that only logs what would be executed.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunRunner;

impl Runner for DryRunRunner {
    fn run(&self, invocation: &Invocation) -> Result<()> {
        log::info!(
            "[dry-run] {} (in {})",
            invocation,
            invocation.working_dir().display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandBuilder, Operation};
    use crate::types::Category;

    #[test]
    fn test_dry_run_never_spawns() {
        // The root does not exist, so a real spawn would fail.
        let builder = CommandBuilder::new("/nonexistent/brewkit-root");
        let inv = builder.build(&Operation::Install("git".into()), Category::Formula);
        assert!(DryRunRunner.run(&inv).is_ok());
    }

    #[test]
    fn test_boxed_runner() {
        let runner: Box<dyn Runner> = Box::new(DryRunRunner);
        let inv = CommandBuilder::new("/opt/homebrew").build(&Operation::UpdateSelf, Category::Formula);
        assert!(runner.run(&inv).is_ok());
    }
}
