//! User interaction seams
//!
//! Every interactive step goes through the [`Interaction`] trait: a text
//! prompt, a file picker, a choice list, and the fire-and-forget
//! notification sink. Dismissal is an explicit outcome (`Ok(None)`), never
//! an error, so the interpreter can translate it into action cancellation.

use crate::error::Result;
use crate::vault::DocumentInfo;
use async_trait::async_trait;
use std::io::{self, BufRead, Write};

#[async_trait]
pub trait Interaction: Send + Sync {
    /// Prompt for a line of text, or a block when `multiline` is set.
    /// `None` means the user dismissed the prompt.
    async fn prompt_text(&self, label: &str, multiline: bool) -> Result<Option<String>>;

    /// Pick one document from `candidates`, returning its path.
    async fn pick_file(&self, candidates: &[DocumentInfo]) -> Result<Option<String>>;

    /// Pick one of a fixed list of options.
    async fn pick_choice(&self, label: &str, options: &[String]) -> Result<Option<String>>;

    /// Fire-and-forget user feedback; never affects control flow.
    fn notify(&self, message: &str);
}

/// Optional external task-entry capability. The terminal host has none; a
/// host that does provides a line of task text or a dismissal.
#[async_trait]
pub trait TaskEntry: Send + Sync {
    async fn task_line(&self) -> Result<Option<String>>;
}

/// Terminal implementation over stdin/stdout.
pub struct TerminalInteraction;

impl Default for TerminalInteraction {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalInteraction {
    pub fn new() -> Self {
        Self
    }

    /// Read one line; `None` on end of input.
    fn read_line() -> Result<Option<String>> {
        let mut input = String::new();
        let read = io::stdin().lock().read_line(&mut input)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(input.trim_end_matches(['\n', '\r']).to_string()))
    }

    fn pick_indexed(label: &str, items: &[String]) -> Result<Option<usize>> {
        println!("{label}");
        for (i, item) in items.iter().enumerate() {
            println!("  {}. {}", i + 1, item);
        }
        loop {
            print!("Enter choice (1-{}), empty to cancel: ", items.len());
            io::stdout().flush()?;
            let Some(input) = Self::read_line()? else {
                return Ok(None);
            };
            if input.is_empty() {
                return Ok(None);
            }
            match input.parse::<usize>() {
                Ok(n) if n >= 1 && n <= items.len() => return Ok(Some(n - 1)),
                _ => println!("Invalid choice."),
            }
        }
    }
}

#[async_trait]
impl Interaction for TerminalInteraction {
    async fn prompt_text(&self, label: &str, multiline: bool) -> Result<Option<String>> {
        if multiline {
            println!("{label} (finish with an empty line)");
            let mut lines = Vec::new();
            loop {
                match Self::read_line()? {
                    None => break,
                    Some(line) if line.is_empty() => break,
                    Some(line) => lines.push(line),
                }
            }
            Ok(Some(lines.join("\n")))
        } else {
            print!("{label} ");
            io::stdout().flush()?;
            Self::read_line()
        }
    }

    async fn pick_file(&self, candidates: &[DocumentInfo]) -> Result<Option<String>> {
        let names: Vec<String> = candidates.iter().map(|d| d.basename.clone()).collect();
        Ok(Self::pick_indexed("Select a file:", &names)?
            .map(|i| candidates[i].path.clone()))
    }

    async fn pick_choice(&self, label: &str, options: &[String]) -> Result<Option<String>> {
        Ok(Self::pick_indexed(label, options)?.map(|i| options[i].clone()))
    }

    fn notify(&self, message: &str) {
        println!("{message}");
    }
}
