//! Error and flow-control types for the wizard stepper.

use thiserror::Error;

/// Errors raised while running a wizard.
///
/// `GoBack` and `UserCancelled` are flow-control signals rather than
/// failures: the runner consumes `GoBack` to rewind one prompted step, and
/// the reporting wrapper treats `UserCancelled` as benign.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WizardError {
    /// The user asked to return to the previous prompted step.
    #[error("user navigated back")]
    GoBack,

    /// The user dismissed the flow.
    #[error("user cancelled")]
    UserCancelled,

    /// Entered input failed validation.
    #[error("validation failed: {message}")]
    Validation {
        /// Why the input was rejected.
        message: String,
    },

    /// A context value could not be serialised or deserialised.
    #[error("context value error: {message}")]
    Value {
        /// Serialisation error detail.
        message: String,
    },

    /// A step failed while applying its effect.
    #[error("step `{step}` failed: {message}")]
    Step {
        /// Name of the failing step.
        step: String,
        /// Failure detail.
        message: String,
    },
}
