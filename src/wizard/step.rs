//! Step traits and the prompter abstraction.
//!
//! A wizard is an ordered list of prompt steps (collect input) followed by
//! execute steps (apply it). The host editor's quick-pick and input-box
//! widgets sit behind the [`Prompter`] trait so flows run identically under
//! tests and real hosts.

use async_trait::async_trait;
use serde_json::Value;

use super::context::WizardContext;
use super::error::WizardError;

/// One selectable entry in a pick prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickItem {
    /// Primary label shown to the user.
    pub label: String,
    /// Optional secondary text.
    pub description: Option<String>,
}

impl PickItem {
    /// Creates an item with just a label.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: None,
        }
    }

    /// Adds a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Host-facing input surface: quick pick and input box.
///
/// Either call may resolve to [`WizardError::GoBack`] (the user pressed the
/// back affordance) or [`WizardError::UserCancelled`].
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Asks the user to choose one of `items`, returning its index.
    async fn pick(&self, prompt: &str, items: &[PickItem]) -> Result<usize, WizardError>;

    /// Asks the user for free-form text, optionally pre-filled with `default`.
    async fn input(&self, prompt: &str, default: Option<&str>) -> Result<String, WizardError>;
}

/// Extra steps a prompt step can inject into the running wizard.
///
/// Prompt steps splice in immediately after the returning step; execute
/// steps join the execute pool and are ordered by priority with the rest.
#[derive(Default)]
pub struct SubWizard {
    /// Prompt steps to run next.
    pub prompt_steps: Vec<Box<dyn PromptStep>>,
    /// Execute steps to add to the pool.
    pub execute_steps: Vec<Box<dyn ExecuteStep>>,
}

/// Result of a completed prompt.
#[derive(Default)]
pub struct PromptOutcome {
    /// The value the user entered, remembered as the default if the user
    /// later navigates back to this step.
    pub entered: Option<Value>,
    /// Steps to splice into the wizard.
    pub sub_wizard: Option<SubWizard>,
}

impl PromptOutcome {
    /// An outcome with no remembered value and no sub-wizard.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Records the entered value for back-navigation defaults.
    #[must_use]
    pub fn remembering(value: Value) -> Self {
        Self {
            entered: Some(value),
            sub_wizard: None,
        }
    }

    /// Attaches a sub-wizard to splice in.
    #[must_use]
    pub fn with_sub_wizard(mut self, sub_wizard: SubWizard) -> Self {
        self.sub_wizard = Some(sub_wizard);
        self
    }
}

/// A step that collects input into the context.
#[async_trait]
pub trait PromptStep: Send + Sync {
    /// Stable name used in logs and step errors.
    fn name(&self) -> &str;

    /// Whether the step needs to prompt. Steps whose fields are already
    /// populated return false and are skipped.
    fn should_prompt(&self, ctx: &WizardContext) -> bool;

    /// Collects input, writing fields into the context.
    ///
    /// `default` carries the value entered the last time this step ran, when
    /// the user has navigated back to it.
    async fn prompt(
        &self,
        ctx: &mut WizardContext,
        prompter: &dyn Prompter,
        default: Option<&Value>,
    ) -> Result<PromptOutcome, WizardError>;
}

/// A step that applies collected input.
#[async_trait]
pub trait ExecuteStep: Send + Sync {
    /// Stable name used in logs and step errors.
    fn name(&self) -> &str;

    /// Execute steps run in ascending priority order.
    fn priority(&self) -> u32 {
        100
    }

    /// Re-checked before every run so re-running a wizard stays idempotent.
    fn should_execute(&self, ctx: &WizardContext) -> bool {
        let _ = ctx;
        true
    }

    /// Applies the step's effect.
    async fn execute(&self, ctx: &mut WizardContext) -> Result<(), WizardError>;
}
