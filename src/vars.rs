//! Run-scoped variable environment
//!
//! Each action invocation owns one mutable name -> value mapping. It is
//! seeded once with time-derived builtins and extended additively by steps;
//! keys are never removed, and a later step may overwrite a builtin
//! (last write wins).

use chrono::{DateTime, Local};
use std::collections::HashMap;

/// The variable mapping threaded through a step sequence.
pub type VarMap = HashMap<String, String>;

pub const VAR_DATE: &str = "date";
pub const VAR_TIME: &str = "time";
pub const VAR_TIMESTAMP: &str = "timestamp";

/// Builtin variables derived from one wall-clock instant, fixed for the
/// whole run. The instant is a parameter so tests can pin it.
pub fn builtin_vars(now: DateTime<Local>) -> VarMap {
    let mut vars = VarMap::new();
    vars.insert(VAR_DATE.to_string(), now.format("%Y-%m-%d").to_string());
    vars.insert(VAR_TIME.to_string(), now.format("%H:%M").to_string());
    vars.insert(
        VAR_TIMESTAMP.to_string(),
        now.format("%Y%m%d%H%M%S").to_string(),
    );
    vars
}
