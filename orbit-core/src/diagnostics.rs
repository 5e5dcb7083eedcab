//! Diagnostics for users of the engine
//!
//! Turns engine and kernel errors into the one-line messages the
//! presentation layer shows.

use crate::engine::EngineError;
use crate::integrator::IntegratorError;
use crate::kernel::KernelError;

/// Message for a failed tick or rejected request, with a hint on what to do
pub fn format_engine_error(error: &EngineError) -> String {
    let hint = match error {
        EngineError::Config(_) => "nothing was changed",
        EngineError::UnknownBody(_) => "the body may already have been removed",
        EngineError::Integrator(IntegratorError::Unstable { .. })
        | EngineError::Integrator(IntegratorError::TooManySubsteps { .. }) => {
            "the previous state was kept; try a larger tolerance, step size or a shorter tick"
        }
        EngineError::Integrator(_) | EngineError::Energy(_) => "the previous state was kept",
    };
    format!("Error: {error} ({hint})")
}

/// Question asked when the native kernel cannot be used
pub fn format_fallback_prompt(error: &KernelError) -> String {
    format!("Loading the native kernel failed: {error}\nContinue with the portable kernel?")
}
