//! Actions and their step variants
//!
//! An action is a named, ordered list of steps invocable as a single
//! command. Steps are a closed tagged union; dispatch over them is an
//! exhaustive `match`, so adding a kind forces every dispatcher (the
//! interpreter, the default factory, the labels) to be updated together.

use crate::section::Position;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One unit of work within an action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    /// Ask the user for a line (or block) of text.
    Prompt {
        variable: String,
        label: String,
        #[serde(default)]
        multiline: bool,
    },
    /// Pick a vault document under a folder prefix.
    FilePicker {
        variable: String,
        #[serde(default)]
        folder: String,
    },
    /// Delegate to an external task-entry capability, if the host has one.
    TasksModal { variable: String },
    /// Insert a formatted line into a heading-delimited section.
    InsertInSection {
        target: String,
        section: String,
        #[serde(default = "default_position")]
        position: Position,
        format: String,
        #[serde(default)]
        create_if_missing: bool,
        #[serde(default)]
        template_path: String,
    },
    /// Create a document unless it already exists.
    CreateFile {
        path: String,
        #[serde(default)]
        content: String,
    },
    /// Pick one of a fixed list of options.
    Choice {
        variable: String,
        label: String,
        #[serde(default)]
        options: Vec<String>,
    },
    /// Open a document in the host view, optionally scrolled to a heading.
    OpenFile {
        target: String,
        #[serde(default)]
        section: String,
    },
    /// Generate text with a configured remote model.
    Llm {
        variable: String,
        #[serde(default)]
        model: String,
        #[serde(default)]
        system_prompt: String,
        #[serde(default)]
        user_prompt: String,
    },
}

fn default_position() -> Position {
    Position::End
}

/// Discriminant for [`Step`], used by the default-step factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    Prompt,
    FilePicker,
    TasksModal,
    InsertInSection,
    CreateFile,
    Choice,
    OpenFile,
    Llm,
}

impl Step {
    /// Canonical default field values for each step kind.
    pub fn default_for(kind: StepKind) -> Step {
        match kind {
            StepKind::Prompt => Step::Prompt {
                variable: "input".to_string(),
                label: "Input:".to_string(),
                multiline: false,
            },
            StepKind::FilePicker => Step::FilePicker {
                variable: "file".to_string(),
                folder: String::new(),
            },
            StepKind::TasksModal => Step::TasksModal {
                variable: "task".to_string(),
            },
            StepKind::InsertInSection => Step::InsertInSection {
                target: String::new(),
                section: String::new(),
                position: Position::End,
                format: String::new(),
                create_if_missing: false,
                template_path: String::new(),
            },
            StepKind::CreateFile => Step::CreateFile {
                path: String::new(),
                content: String::new(),
            },
            StepKind::Choice => Step::Choice {
                variable: "choice".to_string(),
                label: "Choose:".to_string(),
                options: Vec::new(),
            },
            StepKind::OpenFile => Step::OpenFile {
                target: String::new(),
                section: String::new(),
            },
            StepKind::Llm => Step::Llm {
                variable: "llm_response".to_string(),
                model: String::new(),
                system_prompt: String::new(),
                user_prompt: String::new(),
            },
        }
    }

    pub fn kind(&self) -> StepKind {
        match self {
            Step::Prompt { .. } => StepKind::Prompt,
            Step::FilePicker { .. } => StepKind::FilePicker,
            Step::TasksModal { .. } => StepKind::TasksModal,
            Step::InsertInSection { .. } => StepKind::InsertInSection,
            Step::CreateFile { .. } => StepKind::CreateFile,
            Step::Choice { .. } => StepKind::Choice,
            Step::OpenFile { .. } => StepKind::OpenFile,
            Step::Llm { .. } => StepKind::Llm,
        }
    }

    /// Display label for listings.
    pub fn label(&self) -> &'static str {
        match self {
            Step::Prompt { .. } => "Prompt",
            Step::FilePicker { .. } => "File Picker",
            Step::TasksModal { .. } => "Tasks Modal",
            Step::InsertInSection { .. } => "Insert in Section",
            Step::CreateFile { .. } => "Create File",
            Step::Choice { .. } => "Choice",
            Step::OpenFile { .. } => "Open File",
            Step::Llm { .. } => "LLM",
        }
    }
}

/// A named, ordered sequence of steps.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Action {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Action {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            steps: Vec::new(),
        }
    }
}

/// "Prompt -> Insert in Section" style summary for action listings.
pub fn step_summary(steps: &[Step]) -> String {
    steps
        .iter()
        .map(Step::label)
        .collect::<Vec<_>>()
        .join(" -> ")
}
