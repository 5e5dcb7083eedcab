pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod integrator;
pub mod kernel;
pub mod launch;
pub mod monitor;
pub mod registry;
pub mod scenario;
pub mod state;

pub use config::{Algorithm, ConfigError, IntegratorConfig, G};
pub use diagnostics::{format_engine_error, format_fallback_prompt};
pub use engine::{Engine, EngineError, EngineState, StepReport};
pub use integrator::{AdvanceReport, Integrator, IntegratorError};
pub use kernel::{Backend, BackendPreference, Kernel, KernelError};
pub use monitor::{DivergenceNotice, EnergyMonitor};
pub use registry::{Body, BodyId, BodyRegistry};
pub use scenario::{BodySeed, Scenario};
pub use state::PhaseState;
