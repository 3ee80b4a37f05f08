//! Test doubles for the collaborator seams
//!
//! Scripted, in-memory implementations of the vault, interaction layer,
//! secret store, workspace, task entry, and generation transport. Used by
//! unit tests throughout the crate and by integration tests.

use crate::error::{Error, Result};
use crate::interaction::{Interaction, TaskEntry};
use crate::llm::GenerationTransport;
use crate::secrets::SecretStore;
use crate::vault::{display_name, DocumentInfo, Vault};
use crate::workspace::Workspace;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;

/// In-memory document store.
#[derive(Default)]
pub struct MemoryVault {
    docs: Mutex<BTreeMap<String, String>>,
}

impl MemoryVault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_docs(docs: &[(&str, &str)]) -> Self {
        let vault = Self::new();
        {
            let mut map = vault.docs.lock().unwrap();
            for (path, text) in docs {
                map.insert(path.to_string(), text.to_string());
            }
        }
        vault
    }

    pub fn content(&self, path: &str) -> Option<String> {
        self.docs.lock().unwrap().get(path).cloned()
    }

    pub fn paths(&self) -> Vec<String> {
        self.docs.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl Vault for MemoryVault {
    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.docs.lock().unwrap().contains_key(path))
    }

    async fn read(&self, path: &str) -> Result<String> {
        self.docs
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }

    async fn create(&self, path: &str, text: &str) -> Result<()> {
        let mut docs = self.docs.lock().unwrap();
        if docs.contains_key(path) {
            return Err(Error::AlreadyExists(path.to_string()));
        }
        docs.insert(path.to_string(), text.to_string());
        Ok(())
    }

    async fn write(&self, path: &str, text: &str) -> Result<()> {
        self.docs
            .lock()
            .unwrap()
            .insert(path.to_string(), text.to_string());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<DocumentInfo>> {
        Ok(self
            .docs
            .lock()
            .unwrap()
            .keys()
            .filter(|path| path.ends_with(".md"))
            .map(|path| DocumentInfo {
                path: path.clone(),
                basename: display_name(path).to_string(),
            })
            .collect())
    }
}

/// Interaction layer answering from pre-loaded scripts. `None` entries model
/// dismissal. Notifications and file-picker candidate lists are recorded for
/// assertions.
#[derive(Default)]
pub struct ScriptedInteraction {
    text_responses: Mutex<VecDeque<Option<String>>>,
    file_responses: Mutex<VecDeque<Option<String>>>,
    choice_responses: Mutex<VecDeque<Option<String>>>,
    notifications: Mutex<Vec<String>>,
    file_candidates: Mutex<Vec<Vec<String>>>,
}

impl ScriptedInteraction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&self, response: Option<&str>) {
        self.text_responses
            .lock()
            .unwrap()
            .push_back(response.map(str::to_string));
    }

    pub fn push_file(&self, response: Option<&str>) {
        self.file_responses
            .lock()
            .unwrap()
            .push_back(response.map(str::to_string));
    }

    pub fn push_choice(&self, response: Option<&str>) {
        self.choice_responses
            .lock()
            .unwrap()
            .push_back(response.map(str::to_string));
    }

    pub fn notifications(&self) -> Vec<String> {
        self.notifications.lock().unwrap().clone()
    }

    /// Candidate paths offered by each `pick_file` call, in order.
    pub fn file_candidates(&self) -> Vec<Vec<String>> {
        self.file_candidates.lock().unwrap().clone()
    }
}

fn pop_scripted(queue: &Mutex<VecDeque<Option<String>>>, kind: &str) -> Result<Option<String>> {
    queue
        .lock()
        .unwrap()
        .pop_front()
        .ok_or_else(|| Error::Other(format!("no scripted {kind} response")))
}

#[async_trait]
impl Interaction for ScriptedInteraction {
    async fn prompt_text(&self, _label: &str, _multiline: bool) -> Result<Option<String>> {
        pop_scripted(&self.text_responses, "text")
    }

    async fn pick_file(&self, candidates: &[DocumentInfo]) -> Result<Option<String>> {
        self.file_candidates
            .lock()
            .unwrap()
            .push(candidates.iter().map(|d| d.path.clone()).collect());
        pop_scripted(&self.file_responses, "file")
    }

    async fn pick_choice(&self, _label: &str, _options: &[String]) -> Result<Option<String>> {
        pop_scripted(&self.choice_responses, "choice")
    }

    fn notify(&self, message: &str) {
        self.notifications.lock().unwrap().push(message.to_string());
    }
}

/// Task-entry capability producing a fixed line (or dismissal).
pub struct StubTaskEntry(pub Option<String>);

#[async_trait]
impl TaskEntry for StubTaskEntry {
    async fn task_line(&self) -> Result<Option<String>> {
        Ok(self.0.clone())
    }
}

/// Secret store over a fixed map.
#[derive(Default)]
pub struct StaticSecrets {
    secrets: HashMap<String, String>,
}

impl StaticSecrets {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            secrets: pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

impl SecretStore for StaticSecrets {
    fn get(&self, id: &str) -> Option<String> {
        self.secrets.get(id).cloned()
    }
}

/// Workspace recording every open call.
#[derive(Default)]
pub struct RecordingWorkspace {
    opened: Mutex<Vec<(String, Option<usize>)>>,
}

impl RecordingWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened(&self) -> Vec<(String, Option<usize>)> {
        self.opened.lock().unwrap().clone()
    }
}

impl Workspace for RecordingWorkspace {
    fn open(&self, path: &str, line: Option<usize>) -> Result<()> {
        self.opened
            .lock()
            .unwrap()
            .push((path.to_string(), line));
        Ok(())
    }
}

/// Scripted reply for [`StubTransport`].
pub enum StubReply {
    Json(Value),
    Fail(String),
}

/// Generation transport answering from scripted replies and recording each
/// posted request.
#[derive(Default)]
pub struct StubTransport {
    replies: Mutex<VecDeque<StubReply>>,
    requests: Mutex<Vec<(String, Vec<(String, String)>, Value)>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_reply(&self, reply: StubReply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn requests(&self) -> Vec<(String, Vec<(String, String)>, Value)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationTransport for StubTransport {
    async fn post(&self, url: &str, headers: &[(String, String)], body: &Value) -> Result<Value> {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), headers.to_vec(), body.clone()));
        match self.replies.lock().unwrap().pop_front() {
            Some(StubReply::Json(value)) => Ok(value),
            Some(StubReply::Fail(message)) => Err(Error::External(message)),
            None => Err(Error::Other("no scripted transport reply".to_string())),
        }
    }
}
