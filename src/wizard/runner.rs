//! Wizard execution: prompt ordering, splicing, and back-navigation.

use std::collections::VecDeque;

use serde_json::Value;

use super::context::{ContextSnapshot, WizardContext};
use super::error::WizardError;
use super::step::{ExecuteStep, PromptStep, Prompter};

/// Bookkeeping for a step that has been passed, prompted or skipped.
struct FinishedStep {
    step: Box<dyn PromptStep>,
    /// Context state before the step first ran.
    snapshot: ContextSnapshot,
    /// Prompt steps the step spliced in, still sitting at the front of the
    /// pending queue when this frame is unwound.
    spliced_prompts: usize,
    /// Execute pool length before the step added sub-wizard execute steps.
    exec_len_before: usize,
    /// Value the user entered, offered as the default on re-prompt.
    entered: Option<Value>,
    /// False when the step was skipped by its `should_prompt` gate.
    prompted: bool,
}

/// An ordered wizard of prompt steps followed by execute steps.
///
/// Prompt steps run in order, may be skipped by their `should_prompt` gate,
/// and may splice in sub-wizards. Going back pops the most recently
/// *prompted* step, restores the context captured when that step first ran,
/// and removes anything the step spliced in. Execute steps then run in
/// ascending priority order, each re-gated by `should_execute`.
#[derive(Default)]
pub struct Wizard {
    title: String,
    prompt_steps: Vec<Box<dyn PromptStep>>,
    execute_steps: Vec<Box<dyn ExecuteStep>>,
}

impl Wizard {
    /// Creates an empty wizard with a title used in logs.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            prompt_steps: Vec::new(),
            execute_steps: Vec::new(),
        }
    }

    /// Appends a prompt step.
    #[must_use]
    pub fn with_prompt_step(mut self, step: Box<dyn PromptStep>) -> Self {
        self.prompt_steps.push(step);
        self
    }

    /// Appends an execute step.
    #[must_use]
    pub fn with_execute_step(mut self, step: Box<dyn ExecuteStep>) -> Self {
        self.execute_steps.push(step);
        self
    }

    /// Runs the wizard to completion.
    ///
    /// # Errors
    ///
    /// Returns [`WizardError::UserCancelled`] when the user cancels or backs
    /// out of the first prompted step, and propagates validation or step
    /// failures. [`WizardError::GoBack`] never escapes; the runner consumes
    /// it.
    pub async fn run(
        self,
        ctx: &mut WizardContext,
        prompter: &dyn Prompter,
    ) -> Result<(), WizardError> {
        let Self {
            title,
            prompt_steps,
            execute_steps,
        } = self;
        tracing::debug!(wizard = %title, steps = prompt_steps.len(), "starting wizard");

        let mut pending: VecDeque<Box<dyn PromptStep>> = prompt_steps.into();
        let mut executes = execute_steps;
        let mut finished: Vec<FinishedStep> = Vec::new();
        let mut back_default: Option<Value> = None;

        while let Some(step) = pending.pop_front() {
            if !step.should_prompt(ctx) {
                tracing::debug!(step = step.name(), "prompt step skipped");
                finished.push(FinishedStep {
                    snapshot: ctx.snapshot(),
                    spliced_prompts: 0,
                    exec_len_before: executes.len(),
                    entered: None,
                    prompted: false,
                    step,
                });
                continue;
            }

            let snapshot = ctx.snapshot();
            let default = back_default.take();
            match step.prompt(ctx, prompter, default.as_ref()).await {
                Ok(outcome) => {
                    let exec_len_before = executes.len();
                    let mut spliced_prompts = 0;
                    if let Some(sub_wizard) = outcome.sub_wizard {
                        spliced_prompts = sub_wizard.prompt_steps.len();
                        for sub_step in sub_wizard.prompt_steps.into_iter().rev() {
                            pending.push_front(sub_step);
                        }
                        executes.extend(sub_wizard.execute_steps);
                    }
                    finished.push(FinishedStep {
                        snapshot,
                        spliced_prompts,
                        exec_len_before,
                        entered: outcome.entered,
                        prompted: true,
                        step,
                    });
                }
                Err(WizardError::GoBack) => {
                    ctx.restore(&snapshot);
                    pending.push_front(step);
                    back_default = rewind(&mut pending, &mut finished, &mut executes, ctx)?;
                }
                Err(error) => return Err(error),
            }
        }

        run_execute_steps(executes, ctx).await
    }
}

/// Unwinds finished frames until the most recently prompted step is back at
/// the front of the pending queue.
///
/// Each popped frame has its spliced prompt steps removed from the queue,
/// its sub-wizard execute steps dropped from the pool, and its pre-step
/// context restored. Returns the value the target step previously entered.
fn rewind(
    pending: &mut VecDeque<Box<dyn PromptStep>>,
    finished: &mut Vec<FinishedStep>,
    executes: &mut Vec<Box<dyn ExecuteStep>>,
    ctx: &mut WizardContext,
) -> Result<Option<Value>, WizardError> {
    loop {
        let Some(frame) = finished.pop() else {
            // Backing out of the first prompted step dismisses the wizard.
            return Err(WizardError::UserCancelled);
        };

        for _ in 0..frame.spliced_prompts {
            pending.pop_front();
        }
        executes.truncate(frame.exec_len_before);
        ctx.restore(&frame.snapshot);

        let prompted = frame.prompted;
        let entered = frame.entered.clone();
        tracing::debug!(step = frame.step.name(), prompted, "rewound past step");
        pending.push_front(frame.step);

        if prompted {
            return Ok(entered);
        }
    }
}

async fn run_execute_steps(
    steps: Vec<Box<dyn ExecuteStep>>,
    ctx: &mut WizardContext,
) -> Result<(), WizardError> {
    let mut ordered: Vec<(usize, Box<dyn ExecuteStep>)> = steps.into_iter().enumerate().collect();
    ordered.sort_by_key(|(index, step)| (step.priority(), *index));

    for (_, step) in ordered {
        if step.should_execute(ctx) {
            tracing::debug!(step = step.name(), "running execute step");
            step.execute(ctx).await?;
        } else {
            tracing::debug!(step = step.name(), "execute step skipped");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use serde_json::Value;

    use super::Wizard;
    use crate::wizard::context::WizardContext;
    use crate::wizard::error::WizardError;
    use crate::wizard::step::{
        ExecuteStep, PickItem, PromptOutcome, PromptStep, Prompter, SubWizard,
    };

    /// Scripted prompter responses.
    #[derive(Debug, Clone)]
    enum Response {
        Pick(usize),
        Input(String),
        Back,
        Cancel,
    }

    /// Prompter that replays a fixed script and records the defaults it was
    /// offered.
    #[derive(Default)]
    struct ScriptedPrompter {
        script: Mutex<VecDeque<Response>>,
        seen_defaults: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedPrompter {
        fn with_script(responses: Vec<Response>) -> Self {
            Self {
                script: Mutex::new(responses.into()),
                seen_defaults: Mutex::new(Vec::new()),
            }
        }

        fn next(&self) -> Response {
            self.script
                .lock()
                .expect("script mutex should be available")
                .pop_front()
                .expect("script should not be exhausted")
        }

        fn defaults(&self) -> Vec<Option<String>> {
            self.seen_defaults
                .lock()
                .expect("defaults mutex should be available")
                .clone()
        }
    }

    #[async_trait]
    impl Prompter for ScriptedPrompter {
        async fn pick(&self, _prompt: &str, items: &[PickItem]) -> Result<usize, WizardError> {
            match self.next() {
                Response::Pick(index) => {
                    assert!(index < items.len(), "scripted pick out of range");
                    Ok(index)
                }
                Response::Back => Err(WizardError::GoBack),
                Response::Cancel => Err(WizardError::UserCancelled),
                Response::Input(_) => panic!("script expected a pick"),
            }
        }

        async fn input(
            &self,
            _prompt: &str,
            default: Option<&str>,
        ) -> Result<String, WizardError> {
            self.seen_defaults
                .lock()
                .expect("defaults mutex should be available")
                .push(default.map(ToOwned::to_owned));
            match self.next() {
                Response::Input(value) => Ok(value),
                Response::Back => Err(WizardError::GoBack),
                Response::Cancel => Err(WizardError::UserCancelled),
                Response::Pick(_) => panic!("script expected an input"),
            }
        }
    }

    /// Prompt step writing one free-form field.
    struct InputStep {
        key: &'static str,
    }

    #[async_trait]
    impl PromptStep for InputStep {
        fn name(&self) -> &str {
            self.key
        }

        fn should_prompt(&self, ctx: &WizardContext) -> bool {
            !ctx.contains(self.key)
        }

        async fn prompt(
            &self,
            ctx: &mut WizardContext,
            prompter: &dyn Prompter,
            default: Option<&Value>,
        ) -> Result<PromptOutcome, WizardError> {
            let default_text = default.and_then(Value::as_str);
            let value = prompter.input(self.key, default_text).await?;
            ctx.set(self.key, &value)?;
            Ok(PromptOutcome::remembering(Value::String(value)))
        }
    }

    /// Prompt step that splices a sub-wizard when "advanced" is chosen.
    struct ModeStep;

    #[async_trait]
    impl PromptStep for ModeStep {
        fn name(&self) -> &str {
            "mode"
        }

        fn should_prompt(&self, ctx: &WizardContext) -> bool {
            !ctx.contains("mode")
        }

        async fn prompt(
            &self,
            ctx: &mut WizardContext,
            prompter: &dyn Prompter,
            _default: Option<&Value>,
        ) -> Result<PromptOutcome, WizardError> {
            let items = [PickItem::new("basic"), PickItem::new("advanced")];
            let index = prompter.pick("mode", &items).await?;
            let chosen = items.get(index).map_or("basic", |item| item.label.as_str());
            ctx.set("mode", chosen)?;

            let outcome = PromptOutcome::empty();
            if chosen == "advanced" {
                let sub = SubWizard {
                    prompt_steps: vec![Box::new(InputStep { key: "extra" })],
                    execute_steps: Vec::new(),
                };
                return Ok(outcome.with_sub_wizard(sub));
            }
            Ok(outcome)
        }
    }

    /// Execute step appending its name to a shared log.
    struct LoggingExecute {
        name: &'static str,
        priority: u32,
        enabled_key: Option<&'static str>,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    #[async_trait]
    impl ExecuteStep for LoggingExecute {
        fn name(&self) -> &str {
            self.name
        }

        fn priority(&self) -> u32 {
            self.priority
        }

        fn should_execute(&self, ctx: &WizardContext) -> bool {
            self.enabled_key.is_none_or(|key| ctx.contains(key))
        }

        async fn execute(&self, _ctx: &mut WizardContext) -> Result<(), WizardError> {
            self.log
                .lock()
                .expect("log mutex should be available")
                .push(self.name);
            Ok(())
        }
    }

    fn input_wizard(keys: &[&'static str]) -> Wizard {
        keys.iter().fold(Wizard::new("test"), |wizard, key| {
            wizard.with_prompt_step(Box::new(InputStep { key }))
        })
    }

    #[tokio::test]
    async fn linear_flow_collects_fields_in_order() {
        let prompter = ScriptedPrompter::with_script(vec![
            Response::Input("alpha".to_owned()),
            Response::Input("beta".to_owned()),
        ]);
        let mut ctx = WizardContext::new();

        input_wizard(&["first", "second"])
            .run(&mut ctx, &prompter)
            .await
            .expect("wizard should complete");

        assert_eq!(ctx.get::<String>("first").as_deref(), Some("alpha"));
        assert_eq!(ctx.get::<String>("second").as_deref(), Some("beta"));
    }

    #[tokio::test]
    async fn populated_fields_skip_their_steps() {
        let prompter =
            ScriptedPrompter::with_script(vec![Response::Input("beta".to_owned())]);
        let mut ctx = WizardContext::new();
        ctx.set("first", "preset").expect("value should serialise");

        input_wizard(&["first", "second"])
            .run(&mut ctx, &prompter)
            .await
            .expect("wizard should complete");

        assert_eq!(ctx.get::<String>("first").as_deref(), Some("preset"));
        assert_eq!(ctx.get::<String>("second").as_deref(), Some("beta"));
    }

    #[tokio::test]
    async fn going_back_reprompts_with_previous_value_and_clears_later_fields() {
        let prompter = ScriptedPrompter::with_script(vec![
            Response::Input("alpha".to_owned()),
            Response::Back,
            Response::Input("alpha-2".to_owned()),
            Response::Input("beta".to_owned()),
        ]);
        let mut ctx = WizardContext::new();

        input_wizard(&["first", "second"])
            .run(&mut ctx, &prompter)
            .await
            .expect("wizard should complete");

        assert_eq!(ctx.get::<String>("first").as_deref(), Some("alpha-2"));
        assert_eq!(ctx.get::<String>("second").as_deref(), Some("beta"));
        // The re-prompt of "first" must offer the value entered before.
        assert_eq!(
            prompter.defaults(),
            vec![None, None, Some("alpha".to_owned()), None]
        );
    }

    #[tokio::test]
    async fn backing_out_of_first_step_cancels() {
        let prompter = ScriptedPrompter::with_script(vec![Response::Back]);
        let mut ctx = WizardContext::new();

        let error = input_wizard(&["first"])
            .run(&mut ctx, &prompter)
            .await
            .expect_err("backing out of the first step should cancel");
        assert_eq!(error, WizardError::UserCancelled);
    }

    #[tokio::test]
    async fn sub_wizard_steps_are_spliced_and_resplice_on_back() {
        // Choose advanced (splices "extra"), back out of "extra", then choose
        // basic: the spliced step must disappear with its parent choice.
        let prompter = ScriptedPrompter::with_script(vec![
            Response::Pick(1),
            Response::Back,
            Response::Pick(0),
            Response::Input("done".to_owned()),
        ]);
        let mut ctx = WizardContext::new();

        Wizard::new("test")
            .with_prompt_step(Box::new(ModeStep))
            .with_prompt_step(Box::new(InputStep { key: "tail" }))
            .run(&mut ctx, &prompter)
            .await
            .expect("wizard should complete");

        assert_eq!(ctx.get::<String>("mode").as_deref(), Some("basic"));
        assert!(!ctx.contains("extra"));
        assert_eq!(ctx.get::<String>("tail").as_deref(), Some("done"));
    }

    #[tokio::test]
    async fn execute_steps_run_by_priority_and_respect_their_gate() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let prompter =
            ScriptedPrompter::with_script(vec![Response::Input("alpha".to_owned())]);
        let mut ctx = WizardContext::new();

        input_wizard(&["first"])
            .with_execute_step(Box::new(LoggingExecute {
                name: "late",
                priority: 200,
                enabled_key: None,
                log: Arc::clone(&log),
            }))
            .with_execute_step(Box::new(LoggingExecute {
                name: "early",
                priority: 50,
                enabled_key: None,
                log: Arc::clone(&log),
            }))
            .with_execute_step(Box::new(LoggingExecute {
                name: "gated-off",
                priority: 10,
                enabled_key: Some("absent-field"),
                log: Arc::clone(&log),
            }))
            .run(&mut ctx, &prompter)
            .await
            .expect("wizard should complete");

        let recorded = log.lock().expect("log mutex should be available").clone();
        assert_eq!(recorded, vec!["early", "late"]);
    }
}
