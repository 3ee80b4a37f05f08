//! Action execution
//!
//! The runner drives one action at a time: builtin variables are seeded
//! once, then each step runs in order against the injected collaborators,
//! extending the shared variable environment. A step either continues the
//! chain or cancels it; cancellation is a control signal, not an error.
//! Any error escaping a step is caught once here, logged, and reported with
//! the action's name; it never propagates to the host.

pub mod insert;

use crate::action::{Action, Step};
use crate::config::ModelConfig;
use crate::error::Result;
use crate::interaction::{Interaction, TaskEntry};
use crate::llm::{self, GenerationTransport};
use crate::secrets::SecretStore;
use crate::section::find_heading_line;
use crate::template::{resolve, resolve_path_safe};
use crate::vars::{builtin_vars, VarMap};
use crate::vault::{ensure_extension, Vault};
use crate::workspace::Workspace;
use chrono::Local;
use self::insert::{insert_in_section, SectionInsert};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Whether the action proceeds past a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Continue,
    Cancelled,
}

/// Terminal state of one action invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
    Failed,
}

pub struct ActionRunner {
    vault: Arc<dyn Vault>,
    interaction: Arc<dyn Interaction>,
    workspace: Arc<dyn Workspace>,
    secrets: Arc<dyn SecretStore>,
    transport: Arc<dyn GenerationTransport>,
    task_entry: Option<Arc<dyn TaskEntry>>,
    models: Vec<ModelConfig>,
}

impl ActionRunner {
    pub fn new(
        vault: Arc<dyn Vault>,
        interaction: Arc<dyn Interaction>,
        workspace: Arc<dyn Workspace>,
        secrets: Arc<dyn SecretStore>,
        transport: Arc<dyn GenerationTransport>,
        models: Vec<ModelConfig>,
    ) -> Self {
        Self {
            vault,
            interaction,
            workspace,
            secrets,
            transport,
            task_entry: None,
            models,
        }
    }

    /// Attach an external task-entry capability.
    pub fn with_task_entry(mut self, task_entry: Arc<dyn TaskEntry>) -> Self {
        self.task_entry = Some(task_entry);
        self
    }

    /// Run an action to completion, cancellation, or failure. This is the
    /// single error boundary: nothing escapes past it.
    pub async fn run(&self, action: &Action) -> RunOutcome {
        match self.run_steps(action).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(action = %action.name, error = %e, "action failed");
                self.interaction
                    .notify(&format!("Action \"{}\" failed: {e}", action.name));
                RunOutcome::Failed
            }
        }
    }

    async fn run_steps(&self, action: &Action) -> Result<RunOutcome> {
        let mut vars = builtin_vars(Local::now());
        for step in &action.steps {
            if self.execute_step(step, &mut vars).await? == StepOutcome::Cancelled {
                debug!(action = %action.name, "action cancelled");
                return Ok(RunOutcome::Cancelled);
            }
        }
        Ok(RunOutcome::Completed)
    }

    async fn execute_step(&self, step: &Step, vars: &mut VarMap) -> Result<StepOutcome> {
        match step {
            Step::Prompt {
                variable,
                label,
                multiline,
            } => match self.interaction.prompt_text(label, *multiline).await? {
                Some(value) if !value.is_empty() => {
                    vars.insert(variable.clone(), value);
                    Ok(StepOutcome::Continue)
                }
                _ => Ok(StepOutcome::Cancelled),
            },

            Step::FilePicker { variable, folder } => {
                let folder = resolve(folder, vars);
                let mut candidates: Vec<_> = self
                    .vault
                    .list()
                    .await?
                    .into_iter()
                    .filter(|d| d.path.starts_with(&folder))
                    .collect();
                candidates.sort_by(|a, b| a.basename.cmp(&b.basename));
                if candidates.is_empty() {
                    self.interaction
                        .notify(&format!("No files found in \"{folder}\""));
                    return Ok(StepOutcome::Cancelled);
                }
                match self.interaction.pick_file(&candidates).await? {
                    Some(path) => {
                        vars.insert(variable.clone(), path);
                        Ok(StepOutcome::Continue)
                    }
                    None => {
                        self.interaction.notify("File selection cancelled");
                        Ok(StepOutcome::Cancelled)
                    }
                }
            }

            Step::TasksModal { variable } => {
                let Some(task_entry) = &self.task_entry else {
                    self.interaction.notify("Task entry not available");
                    return Ok(StepOutcome::Cancelled);
                };
                match task_entry.task_line().await? {
                    Some(line) => {
                        vars.insert(variable.clone(), line);
                        Ok(StepOutcome::Continue)
                    }
                    None => Ok(StepOutcome::Cancelled),
                }
            }

            Step::Choice {
                variable,
                label,
                options,
            } => match self.interaction.pick_choice(label, options).await? {
                Some(value) => {
                    vars.insert(variable.clone(), value);
                    Ok(StepOutcome::Continue)
                }
                None => Ok(StepOutcome::Cancelled),
            },

            Step::CreateFile { path, content } => {
                let path = ensure_extension(&resolve_path_safe(path, vars));
                let content = resolve(content, vars);
                if self.vault.exists(&path).await? {
                    self.interaction
                        .notify(&format!("File already exists: {path}"));
                    return Ok(StepOutcome::Continue);
                }
                self.vault.create(&path, &content).await?;
                self.interaction.notify(&format!("Created {path}"));
                Ok(StepOutcome::Continue)
            }

            Step::OpenFile { target, section } => {
                let path = ensure_extension(&resolve(target, vars));
                if !self.vault.exists(&path).await? {
                    self.interaction.notify(&format!("File not found: {path}"));
                    return Ok(StepOutcome::Continue);
                }
                let mut line = None;
                let section = resolve(section, vars);
                if !section.is_empty() {
                    let content = self.vault.read(&path).await?;
                    let lines: Vec<&str> = content.split('\n').collect();
                    let bare = section.trim_start_matches('#').trim();
                    // A heading that doesn't exist is ignored; the document
                    // still opens at the top.
                    line = find_heading_line(&lines, bare);
                }
                if let Err(e) = self.workspace.open(&path, line) {
                    warn!(path = %path, error = %e, "failed to open document");
                    self.interaction.notify(&format!("Failed to open {path}"));
                }
                Ok(StepOutcome::Continue)
            }

            Step::InsertInSection {
                target,
                section,
                position,
                format,
                create_if_missing,
                template_path,
            } => {
                let request = SectionInsert {
                    target: resolve(target, vars),
                    section: resolve(section, vars),
                    position: *position,
                    text: resolve(format, vars),
                    create_if_missing: *create_if_missing,
                    template_path: resolve(template_path, vars),
                };
                insert_in_section(self.vault.as_ref(), self.interaction.as_ref(), request)
                    .await?;
                Ok(StepOutcome::Continue)
            }

            Step::Llm {
                variable,
                model,
                system_prompt,
                user_prompt,
            } => {
                let system_prompt = resolve(system_prompt, vars);
                let user_prompt = resolve(user_prompt, vars);
                let config = if model.is_empty() {
                    self.models.first()
                } else {
                    self.models.iter().find(|m| m.name == *model)
                };
                let Some(config) = config else {
                    self.interaction.notify("No LLM model configured");
                    return Ok(StepOutcome::Cancelled);
                };
                let Some(api_key) = self.secrets.get(&config.secret_id) else {
                    self.interaction
                        .notify(&format!("API key secret not found: {}", config.secret_id));
                    return Ok(StepOutcome::Cancelled);
                };
                match llm::generate(
                    self.transport.as_ref(),
                    config,
                    &api_key,
                    &system_prompt,
                    &user_prompt,
                )
                .await
                {
                    Ok(text) => {
                        vars.insert(variable.clone(), text);
                        Ok(StepOutcome::Continue)
                    }
                    Err(e) => {
                        warn!(model = %config.name, error = %e, "generation failed");
                        self.interaction
                            .notify(&format!("Text generation failed: {e}"));
                        Ok(StepOutcome::Cancelled)
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::StepKind;
    use crate::config::Provider;
    use crate::section::Position;
    use crate::testing::{
        MemoryVault, RecordingWorkspace, ScriptedInteraction, StaticSecrets, StubReply,
        StubTaskEntry, StubTransport,
    };
    use serde_json::json;

    struct Fixture {
        vault: Arc<MemoryVault>,
        interaction: Arc<ScriptedInteraction>,
        workspace: Arc<RecordingWorkspace>,
        transport: Arc<StubTransport>,
        runner: ActionRunner,
    }

    fn fixture(docs: &[(&str, &str)], models: Vec<ModelConfig>) -> Fixture {
        let vault = Arc::new(MemoryVault::with_docs(docs));
        let interaction = Arc::new(ScriptedInteraction::new());
        let workspace = Arc::new(RecordingWorkspace::new());
        let transport = Arc::new(StubTransport::new());
        let secrets = Arc::new(StaticSecrets::new(&[("KEY", "sk-test")]));
        let runner = ActionRunner::new(
            vault.clone(),
            interaction.clone(),
            workspace.clone(),
            secrets,
            transport.clone(),
            models,
        );
        Fixture {
            vault,
            interaction,
            workspace,
            transport,
            runner,
        }
    }

    fn action(steps: Vec<Step>) -> Action {
        let mut action = Action::new("Test action");
        action.steps = steps;
        action
    }

    fn sonnet() -> ModelConfig {
        ModelConfig {
            name: "Sonnet".to_string(),
            provider: Provider::Anthropic,
            model: "claude-sonnet-4-5".to_string(),
            secret_id: "KEY".to_string(),
        }
    }

    #[tokio::test]
    async fn test_prompt_feeds_later_steps() {
        let f = fixture(&[], vec![]);
        f.interaction.push_text(Some("milk"));

        let outcome = f
            .runner
            .run(&action(vec![
                Step::Prompt {
                    variable: "item".to_string(),
                    label: "Item:".to_string(),
                    multiline: false,
                },
                Step::CreateFile {
                    path: "Inbox/{{item}}".to_string(),
                    content: "- {{item}}".to_string(),
                },
            ]))
            .await;

        assert_eq!(outcome, RunOutcome::Completed);
        assert_eq!(f.vault.content("Inbox/milk.md").unwrap(), "- milk");
    }

    #[tokio::test]
    async fn test_cancelled_prompt_short_circuits() {
        let f = fixture(&[], vec![]);
        f.interaction.push_text(None);

        let outcome = f
            .runner
            .run(&action(vec![
                Step::Prompt {
                    variable: "item".to_string(),
                    label: "Item:".to_string(),
                    multiline: false,
                },
                Step::CreateFile {
                    path: "never".to_string(),
                    content: String::new(),
                },
            ]))
            .await;

        assert_eq!(outcome, RunOutcome::Cancelled);
        assert!(f.vault.paths().is_empty());
    }

    #[tokio::test]
    async fn test_empty_prompt_counts_as_cancellation() {
        let f = fixture(&[], vec![]);
        f.interaction.push_text(Some(""));

        let outcome = f
            .runner
            .run(&action(vec![Step::Prompt {
                variable: "item".to_string(),
                label: "Item:".to_string(),
                multiline: false,
            }]))
            .await;

        assert_eq!(outcome, RunOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_file_picker_filters_and_sorts_candidates() {
        let f = fixture(
            &[
                ("Tasks/beta.md", ""),
                ("Tasks/alpha.md", ""),
                ("Other/skip.md", ""),
            ],
            vec![],
        );
        f.interaction.push_file(Some("Tasks/alpha.md"));

        let outcome = f
            .runner
            .run(&action(vec![Step::FilePicker {
                variable: "file".to_string(),
                folder: "Tasks/".to_string(),
            }]))
            .await;

        assert_eq!(outcome, RunOutcome::Completed);
        assert_eq!(
            f.interaction.file_candidates(),
            vec![vec!["Tasks/alpha.md".to_string(), "Tasks/beta.md".to_string()]]
        );
    }

    #[tokio::test]
    async fn test_file_picker_empty_folder_cancels_with_report() {
        let f = fixture(&[], vec![]);

        let outcome = f
            .runner
            .run(&action(vec![Step::FilePicker {
                variable: "file".to_string(),
                folder: "Tasks/".to_string(),
            }]))
            .await;

        assert_eq!(outcome, RunOutcome::Cancelled);
        assert_eq!(
            f.interaction.notifications(),
            vec!["No files found in \"Tasks/\""]
        );
    }

    #[tokio::test]
    async fn test_file_picker_dismissal_cancels() {
        let f = fixture(&[("Tasks/a.md", "")], vec![]);
        f.interaction.push_file(None);

        let outcome = f
            .runner
            .run(&action(vec![Step::FilePicker {
                variable: "file".to_string(),
                folder: String::new(),
            }]))
            .await;

        assert_eq!(outcome, RunOutcome::Cancelled);
    }

    #[tokio::test]
    async fn test_tasks_modal_without_capability_cancels() {
        let f = fixture(&[], vec![]);

        let outcome = f
            .runner
            .run(&action(vec![Step::default_for(StepKind::TasksModal)]))
            .await;

        assert_eq!(outcome, RunOutcome::Cancelled);
        assert_eq!(f.interaction.notifications(), vec!["Task entry not available"]);
    }

    #[tokio::test]
    async fn test_tasks_modal_stores_produced_line() {
        let f = fixture(&[], vec![]);
        let runner = ActionRunner::new(
            f.vault.clone(),
            f.interaction.clone(),
            f.workspace.clone(),
            Arc::new(StaticSecrets::default()),
            f.transport.clone(),
            vec![],
        )
        .with_task_entry(Arc::new(StubTaskEntry(Some("- [ ] task".to_string()))));

        let outcome = runner
            .run(&action(vec![
                Step::TasksModal {
                    variable: "task".to_string(),
                },
                Step::CreateFile {
                    path: "out".to_string(),
                    content: "{{task}}".to_string(),
                },
            ]))
            .await;

        assert_eq!(outcome, RunOutcome::Completed);
        assert_eq!(f.vault.content("out.md").unwrap(), "- [ ] task");
    }

    #[tokio::test]
    async fn test_choice_selection_continues() {
        let f = fixture(&[], vec![]);
        f.interaction.push_choice(Some("high"));

        let outcome = f
            .runner
            .run(&action(vec![Step::Choice {
                variable: "priority".to_string(),
                label: "Priority:".to_string(),
                options: vec!["high".to_string(), "low".to_string()],
            }]))
            .await;

        assert_eq!(outcome, RunOutcome::Completed);
    }

    #[tokio::test]
    async fn test_create_file_is_idempotent() {
        let f = fixture(&[], vec![]);
        let step = Step::CreateFile {
            path: "notes".to_string(),
            content: "first".to_string(),
        };

        assert_eq!(f.runner.run(&action(vec![step.clone()])).await, RunOutcome::Completed);
        // Second run must not overwrite.
        let step2 = Step::CreateFile {
            path: "notes".to_string(),
            content: "second".to_string(),
        };
        assert_eq!(f.runner.run(&action(vec![step2])).await, RunOutcome::Completed);

        assert_eq!(f.vault.content("notes.md").unwrap(), "first");
        assert_eq!(
            f.interaction.notifications(),
            vec!["Created notes.md", "File already exists: notes.md"]
        );
    }

    #[tokio::test]
    async fn test_create_file_scrubs_separators_from_variables() {
        let f = fixture(&[], vec![]);
        f.interaction.push_text(Some("a/b"));

        f.runner
            .run(&action(vec![
                Step::Prompt {
                    variable: "title".to_string(),
                    label: "Title:".to_string(),
                    multiline: false,
                },
                Step::CreateFile {
                    path: "Inbox/{{title}}".to_string(),
                    content: String::new(),
                },
            ]))
            .await;

        assert_eq!(f.vault.paths(), vec!["Inbox/a-b.md"]);
    }

    #[tokio::test]
    async fn test_open_file_scrolls_to_heading() {
        let f = fixture(&[("note.md", "# Title\n\n## Log\n- a")], vec![]);

        let outcome = f
            .runner
            .run(&action(vec![Step::OpenFile {
                target: "note".to_string(),
                section: "## Log".to_string(),
            }]))
            .await;

        assert_eq!(outcome, RunOutcome::Completed);
        assert_eq!(f.workspace.opened(), vec![("note.md".to_string(), Some(2))]);
    }

    #[tokio::test]
    async fn test_open_file_missing_heading_opens_at_top() {
        let f = fixture(&[("note.md", "# Title")], vec![]);

        f.runner
            .run(&action(vec![Step::OpenFile {
                target: "note".to_string(),
                section: "## Absent".to_string(),
            }]))
            .await;

        assert_eq!(f.workspace.opened(), vec![("note.md".to_string(), None)]);
        assert!(f.interaction.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_open_file_missing_document_continues() {
        let f = fixture(&[], vec![]);

        let outcome = f
            .runner
            .run(&action(vec![
                Step::OpenFile {
                    target: "absent".to_string(),
                    section: String::new(),
                },
                Step::CreateFile {
                    path: "after".to_string(),
                    content: String::new(),
                },
            ]))
            .await;

        assert_eq!(outcome, RunOutcome::Completed);
        assert_eq!(
            f.interaction.notifications(),
            vec!["File not found: absent.md", "Created after.md"]
        );
        assert!(f.workspace.opened().is_empty());
    }

    #[tokio::test]
    async fn test_insert_step_threads_variables() {
        let f = fixture(&[("Journal/D-2025-01-15.md", "## Log\n- a\n\n## Next")], vec![]);
        f.interaction.push_text(Some("wrote tests"));

        let outcome = f
            .runner
            .run(&action(vec![
                Step::Prompt {
                    variable: "entry".to_string(),
                    label: "Entry:".to_string(),
                    multiline: false,
                },
                Step::InsertInSection {
                    target: "Journal/D-2025-01-15".to_string(),
                    section: "## Log".to_string(),
                    position: Position::End,
                    format: "- {{entry}}".to_string(),
                    create_if_missing: false,
                    template_path: String::new(),
                },
            ]))
            .await;

        assert_eq!(outcome, RunOutcome::Completed);
        assert_eq!(
            f.vault.content("Journal/D-2025-01-15.md").unwrap(),
            "## Log\n- a\n- wrote tests\n\n## Next"
        );
    }

    #[tokio::test]
    async fn test_llm_stores_generated_text() {
        let f = fixture(&[], vec![sonnet()]);
        f.interaction.push_text(Some("summarize this"));
        f.transport.push_reply(StubReply::Json(
            json!({"content": [{"type": "text", "text": "a summary"}]}),
        ));

        let outcome = f
            .runner
            .run(&action(vec![
                Step::Prompt {
                    variable: "input".to_string(),
                    label: "Input:".to_string(),
                    multiline: false,
                },
                Step::Llm {
                    variable: "summary".to_string(),
                    model: String::new(),
                    system_prompt: "Be brief".to_string(),
                    user_prompt: "{{input}}".to_string(),
                },
                Step::CreateFile {
                    path: "out".to_string(),
                    content: "{{summary}}".to_string(),
                },
            ]))
            .await;

        assert_eq!(outcome, RunOutcome::Completed);
        assert_eq!(f.vault.content("out.md").unwrap(), "a summary");

        let requests = f.transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].2["messages"][0]["content"], "summarize this");
    }

    #[tokio::test]
    async fn test_llm_selects_named_model() {
        let other = ModelConfig {
            name: "Mini".to_string(),
            provider: Provider::Openai,
            model: "gpt-4o-mini".to_string(),
            secret_id: "KEY".to_string(),
        };
        let f = fixture(&[], vec![sonnet(), other]);
        f.transport.push_reply(StubReply::Json(
            json!({"choices": [{"message": {"content": "ok"}}]}),
        ));

        let outcome = f
            .runner
            .run(&action(vec![Step::Llm {
                variable: "out".to_string(),
                model: "Mini".to_string(),
                system_prompt: String::new(),
                user_prompt: "hi".to_string(),
            }]))
            .await;

        assert_eq!(outcome, RunOutcome::Completed);
        assert_eq!(
            f.transport.requests()[0].0,
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[tokio::test]
    async fn test_llm_without_model_cancels() {
        let f = fixture(&[], vec![]);

        let outcome = f
            .runner
            .run(&action(vec![Step::default_for(StepKind::Llm)]))
            .await;

        assert_eq!(outcome, RunOutcome::Cancelled);
        assert_eq!(f.interaction.notifications(), vec!["No LLM model configured"]);
    }

    #[tokio::test]
    async fn test_llm_without_secret_cancels() {
        let mut model = sonnet();
        model.secret_id = "MISSING".to_string();
        let f = fixture(&[], vec![model]);

        let outcome = f
            .runner
            .run(&action(vec![Step::Llm {
                variable: "out".to_string(),
                model: String::new(),
                system_prompt: String::new(),
                user_prompt: "hi".to_string(),
            }]))
            .await;

        assert_eq!(outcome, RunOutcome::Cancelled);
        assert_eq!(
            f.interaction.notifications(),
            vec!["API key secret not found: MISSING"]
        );
    }

    #[tokio::test]
    async fn test_llm_transport_failure_cancels_action() {
        let f = fixture(&[], vec![sonnet()]);
        f.transport
            .push_reply(StubReply::Fail("rate limited".to_string()));

        let outcome = f
            .runner
            .run(&action(vec![
                Step::Llm {
                    variable: "out".to_string(),
                    model: String::new(),
                    system_prompt: String::new(),
                    user_prompt: "hi".to_string(),
                },
                Step::CreateFile {
                    path: "never".to_string(),
                    content: String::new(),
                },
            ]))
            .await;

        assert_eq!(outcome, RunOutcome::Cancelled);
        assert!(f.vault.paths().is_empty());
    }

    #[tokio::test]
    async fn test_step_error_reported_with_action_name() {
        // An unscripted interaction is a hard error; it must surface as a
        // Failed outcome with a notification naming the action.
        let f = fixture(&[], vec![]);

        let outcome = f
            .runner
            .run(&action(vec![Step::Prompt {
                variable: "x".to_string(),
                label: "X:".to_string(),
                multiline: false,
            }]))
            .await;

        assert_eq!(outcome, RunOutcome::Failed);
        let notifications = f.interaction.notifications();
        assert_eq!(notifications.len(), 1);
        assert!(notifications[0].starts_with("Action \"Test action\" failed:"));
    }

    #[tokio::test]
    async fn test_builtin_variables_resolve_in_templates() {
        let f = fixture(&[], vec![]);

        f.runner
            .run(&action(vec![Step::CreateFile {
                path: "stamp-{{timestamp}}".to_string(),
                content: "{{date}} {{time}}".to_string(),
            }]))
            .await;

        let paths = f.vault.paths();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].starts_with("stamp-20"));
        assert!(!f.vault.content(&paths[0]).unwrap().contains("{{"));
    }
}
