//! # noteflow
//!
//! Run user-configured, multi-step actions against a vault of Markdown
//! notes. An action is an ordered list of steps (prompt for input, pick a
//! file, insert a line into a document section, create or open a file, call
//! a remote text-generation service) threaded through a shared
//! `{{variable}}` environment.
//!
//! ## Modules
//!
//! - `action` - Actions and the tagged step variants they are built from
//! - `config` - Settings persistence (actions + model registry)
//! - `interaction` - User interaction seams (prompts, pickers, notifications)
//! - `llm` - Remote text-generation providers over an abstract transport
//! - `runner` - The step-execution engine
//! - `secrets` - API key lookup
//! - `section` - Section location and insertion planning
//! - `template` - `{{variable}}` substitution
//! - `testing` - Test doubles for the collaborator seams
//! - `vars` - The run-scoped variable environment
//! - `vault` - Document repository abstraction
//! - `workspace` - Host view abstraction for opening documents

pub mod action;
pub mod config;
pub mod error;
pub mod interaction;
pub mod llm;
pub mod runner;
pub mod secrets;
pub mod section;
pub mod template;
pub mod testing;
pub mod vars;
pub mod vault;
pub mod workspace;
