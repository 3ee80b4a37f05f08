//! Settings persistence
//!
//! Actions and model configurations live in one JSON settings file. Loading
//! is shallow merge with defaults: missing fields fall back via
//! `#[serde(default)]`, and a missing file is an empty settings set. No
//! versioning or migrations.

use crate::action::{Action, Step, StepKind};
use crate::error::{Error, Result};
use crate::section::Position;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Supported remote text-generation services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Anthropic,
    Openai,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Anthropic => "anthropic",
            Provider::Openai => "openai",
        }
    }
}

/// One configured model: a lookup name, the provider it runs on, the
/// provider-side model id, and a reference to an externally stored API key.
/// Read-only during a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    pub name: String,
    pub provider: Provider,
    pub model: String,
    #[serde(default)]
    pub secret_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub actions: Vec<Action>,
    pub models: Vec<ModelConfig>,
}

impl Settings {
    /// Load settings from `path`, falling back to defaults when the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "settings file missing, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// First action with the given display name.
    pub fn find_action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// A starter settings set for `init`: one journal-logging action built
    /// from the default steps.
    pub fn starter() -> Self {
        let mut prompt = Step::default_for(StepKind::Prompt);
        if let Step::Prompt { variable, label, .. } = &mut prompt {
            *variable = "entry".to_string();
            *label = "Entry:".to_string();
        }
        let mut insert = Step::default_for(StepKind::InsertInSection);
        if let Step::InsertInSection {
            target,
            section,
            position,
            format,
            create_if_missing,
            ..
        } = &mut insert
        {
            *target = "Journal/Daily/D-{{date}}".to_string();
            *section = "## Log".to_string();
            *position = Position::End;
            *format = "- ({{time}}) {{entry}}".to_string();
            *create_if_missing = true;
        }

        let mut action = Action::new("Log entry");
        action.steps = vec![prompt, insert];

        Settings {
            actions: vec![action],
            models: Vec::new(),
        }
    }
}

/// Default settings location under the platform config directory.
pub fn default_settings_path() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| Error::Config("could not determine config directory".to_string()))?;
    Ok(base.join("noteflow").join("settings.json"))
}
