//! Host view abstraction
//!
//! `open_file` steps hand a document (and optionally a heading line to
//! scroll to) to the host view. Opening is best-effort and never drives
//! control flow.

use crate::error::Result;
use std::path::PathBuf;
use tracing::debug;

pub trait Workspace: Send + Sync {
    /// Open a vault-relative document, scrolled to `line` when the host
    /// view supports it.
    fn open(&self, path: &str, line: Option<usize>) -> Result<()>;
}

/// Opens documents with the platform's default handler. The system viewer
/// cannot scroll, so the target line is only logged.
pub struct SystemWorkspace {
    root: PathBuf,
}

impl SystemWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl Workspace for SystemWorkspace {
    fn open(&self, path: &str, line: Option<usize>) -> Result<()> {
        if let Some(line) = line {
            debug!(path, line, "opening document at heading line");
        }
        open::that(self.root.join(path))?;
        Ok(())
    }
}
