mod action;
mod context;
mod error;
mod events;
mod pacing;
mod process;
mod run;
mod runner;
mod state;
mod step;

pub use action::{ActionSequence, DemoAction, FnAction, RemovePaths, SharedAction, ShellAction};
pub use context::{DemoVars, UnknownVariable};
pub use error::{InvalidStep, RegistryError, RunError, StepError};
pub use events::{DemoEvent, OutputStream};
pub use pacing::{Pacer, Pacing};
pub use run::Run;
pub use runner::{ExecuteOptions, RunExecutor};
pub use state::{BatchReport, RunFailure, RunReport, RunState, StepOutcome, StepReport};
pub use step::Step;
