//! Multi-step wizard framework for creation flows.
//!
//! A wizard collects input through an ordered list of prompt steps, then
//! applies it through priority-ordered execute steps. Steps communicate via
//! a shared [`WizardContext`] property bag; back-navigation restores the bag
//! to the state it had when the step being returned to first ran.

pub mod context;
pub mod error;
pub mod runner;
pub mod step;

pub use context::{ContextSnapshot, WizardContext};
pub use error::WizardError;
pub use runner::Wizard;
pub use step::{ExecuteStep, PickItem, PromptOutcome, PromptStep, Prompter, SubWizard};
