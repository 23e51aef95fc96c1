//! Behavioural tests for wizard flows built from the public API.
//!
//! Models a small triage-setup flow: pick a policy preset, optionally
//! splice in custom threshold prompts, then apply the collected values.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use mothball::wizard::{
    ExecuteStep, PickItem, PromptOutcome, PromptStep, Prompter, SubWizard, Wizard, WizardContext,
    WizardError,
};
use serde_json::Value;

enum Response {
    Pick(usize),
    Input(String),
    Back,
}

/// Replays a scripted sequence of prompter responses.
struct ScriptedPrompter {
    responses: Mutex<VecDeque<Response>>,
}

impl ScriptedPrompter {
    fn new(responses: impl IntoIterator<Item = Response>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
        }
    }

    fn next(&self) -> Option<Response> {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn pick(&self, _prompt: &str, _items: &[PickItem]) -> Result<usize, WizardError> {
        match self.next() {
            Some(Response::Pick(index)) => Ok(index),
            Some(Response::Back) => Err(WizardError::GoBack),
            _ => Err(WizardError::UserCancelled),
        }
    }

    async fn input(&self, _prompt: &str, _default: Option<&str>) -> Result<String, WizardError> {
        match self.next() {
            Some(Response::Input(text)) => Ok(text),
            Some(Response::Back) => Err(WizardError::GoBack),
            _ => Err(WizardError::UserCancelled),
        }
    }
}

/// Picks a policy preset; the custom preset splices threshold prompts.
struct PresetStep;

#[async_trait]
impl PromptStep for PresetStep {
    fn name(&self) -> &str {
        "preset"
    }

    fn should_prompt(&self, ctx: &WizardContext) -> bool {
        !ctx.contains("preset")
    }

    async fn prompt(
        &self,
        ctx: &mut WizardContext,
        prompter: &dyn Prompter,
        _default: Option<&Value>,
    ) -> Result<PromptOutcome, WizardError> {
        let items = [PickItem::new("default"), PickItem::new("custom")];
        let index = prompter.pick("Select a policy preset", &items).await?;
        if index == 1 {
            ctx.set("preset", "custom")?;
            let sub = SubWizard {
                prompt_steps: vec![Box::new(ThresholdStep)],
                execute_steps: Vec::new(),
            };
            return Ok(PromptOutcome::remembering(Value::from(1_u64)).with_sub_wizard(sub));
        }
        ctx.set("preset", "default")?;
        ctx.set("close_days", 7)?;
        Ok(PromptOutcome::remembering(Value::from(0_u64)))
    }
}

/// Collects the custom close threshold.
struct ThresholdStep;

#[async_trait]
impl PromptStep for ThresholdStep {
    fn name(&self) -> &str {
        "threshold"
    }

    fn should_prompt(&self, ctx: &WizardContext) -> bool {
        !ctx.contains("close_days")
    }

    async fn prompt(
        &self,
        ctx: &mut WizardContext,
        prompter: &dyn Prompter,
        default: Option<&Value>,
    ) -> Result<PromptOutcome, WizardError> {
        let previous = default.and_then(Value::as_str).map(str::to_owned);
        let text = prompter
            .input("Days until close", previous.as_deref())
            .await?;
        let days: u32 = text.parse().map_err(|_| WizardError::Validation {
            message: format!("`{text}` is not a number of days"),
        })?;
        ctx.set("close_days", days)?;
        Ok(PromptOutcome::remembering(Value::from(text)))
    }
}

/// Records the resolved threshold under a separate key.
struct ApplyStep;

#[async_trait]
impl ExecuteStep for ApplyStep {
    fn name(&self) -> &str {
        "apply"
    }

    async fn execute(&self, ctx: &mut WizardContext) -> Result<(), WizardError> {
        let days: u32 = ctx.get("close_days").ok_or_else(|| WizardError::Step {
            step: "apply".to_owned(),
            message: "close_days missing from context".to_owned(),
        })?;
        ctx.set("applied_close_days", days)
    }
}

fn wizard() -> Wizard {
    Wizard::new("Configure triage")
        .with_prompt_step(Box::new(PresetStep))
        .with_execute_step(Box::new(ApplyStep))
}

#[tokio::test]
async fn custom_preset_splices_threshold_prompt() {
    let prompter = ScriptedPrompter::new([Response::Pick(1), Response::Input("14".to_owned())]);
    let mut ctx = WizardContext::default();

    wizard()
        .run(&mut ctx, &prompter)
        .await
        .expect("wizard should finish");

    assert_eq!(ctx.get::<String>("preset"), Some("custom".to_owned()));
    assert_eq!(ctx.get::<u32>("applied_close_days"), Some(14));
}

#[tokio::test]
async fn backing_out_of_spliced_step_reprompts_the_preset() {
    // Choose custom, back out of the threshold prompt, then settle on the
    // default preset. The spliced step must not run again.
    let prompter =
        ScriptedPrompter::new([Response::Pick(1), Response::Back, Response::Pick(0)]);
    let mut ctx = WizardContext::default();

    wizard()
        .run(&mut ctx, &prompter)
        .await
        .expect("wizard should finish");

    assert_eq!(ctx.get::<String>("preset"), Some("default".to_owned()));
    assert_eq!(ctx.get::<u32>("applied_close_days"), Some(7));
}

#[tokio::test]
async fn prepopulated_context_skips_the_prompt() {
    let prompter = ScriptedPrompter::new([]);
    let mut ctx = WizardContext::default();
    ctx.set("preset", "default").expect("set should succeed");
    ctx.set("close_days", 3).expect("set should succeed");

    wizard()
        .run(&mut ctx, &prompter)
        .await
        .expect("wizard should finish without prompting");

    assert_eq!(ctx.get::<u32>("applied_close_days"), Some(3));
}
