//! Document repository abstraction
//!
//! The runner reads and writes documents through the [`Vault`] trait so the
//! engine can be exercised against an in-memory store in tests. The
//! production implementation is a directory of Markdown files; paths are
//! vault-relative with `/` separators.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

/// Path plus display metadata for one vault document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    /// Vault-relative path, `/`-separated.
    pub path: String,
    /// File name without directory or extension.
    pub basename: String,
}

#[async_trait]
pub trait Vault: Send + Sync {
    async fn exists(&self, path: &str) -> Result<bool>;

    async fn read(&self, path: &str) -> Result<String>;

    /// Create a new document. Fails with [`Error::AlreadyExists`] if the
    /// path is taken.
    async fn create(&self, path: &str, text: &str) -> Result<()>;

    /// Replace a document's entire content in one call.
    async fn write(&self, path: &str, text: &str) -> Result<()>;

    /// All Markdown documents in the vault.
    async fn list(&self) -> Result<Vec<DocumentInfo>>;
}

/// Append `.md` when the base name carries no extension.
///
/// Any dot in the base name suppresses the suffix, so `"foo.bar"` stays
/// untouched.
pub fn ensure_extension(path: &str) -> String {
    let base = path.rsplit('/').next().unwrap_or(path);
    if base.contains('.') {
        path.to_string()
    } else {
        format!("{path}.md")
    }
}

/// Base name without directory or extension, for user-facing messages.
pub fn display_name(path: &str) -> &str {
    let base = path.rsplit('/').next().unwrap_or(path);
    match base.rfind('.') {
        Some(idx) if idx > 0 => &base[..idx],
        _ => base,
    }
}

/// Filesystem-backed vault rooted at a directory.
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }

    fn relative_path(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        Some(relative.to_string_lossy().replace('\\', "/"))
    }
}

#[async_trait]
impl Vault for FsVault {
    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(fs::metadata(self.full_path(path)).await.is_ok())
    }

    async fn read(&self, path: &str) -> Result<String> {
        Ok(fs::read_to_string(self.full_path(path)).await?)
    }

    async fn create(&self, path: &str, text: &str) -> Result<()> {
        let full = self.full_path(path);
        if fs::metadata(&full).await.is_ok() {
            return Err(Error::AlreadyExists(path.to_string()));
        }
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(full, text).await?;
        Ok(())
    }

    async fn write(&self, path: &str, text: &str) -> Result<()> {
        fs::write(self.full_path(path), text).await?;
        Ok(())
    }

    async fn list(&self) -> Result<Vec<DocumentInfo>> {
        let mut documents = Vec::new();
        for entry in WalkDir::new(&self.root).into_iter().filter_map(|e| e.ok()) {
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            if let Some(path) = self.relative_path(entry.path()) {
                let basename = display_name(&path).to_string();
                documents.push(DocumentInfo { path, basename });
            }
        }
        Ok(documents)
    }
}
