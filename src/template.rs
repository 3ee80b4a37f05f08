//! Variable substitution for step templates
//!
//! Templates use a single flat `{{name}}` token scheme: no escaping, no
//! nesting, no conditionals. Unknown tokens are left in place, braces
//! included, so a missing variable is visible in the output instead of
//! silently disappearing.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::collections::HashMap;

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("Invalid regex pattern"));

/// Substitute `{{name}}` tokens from `vars` into `template`.
///
/// Substitution is raw: values are inserted verbatim and never re-scanned
/// for further tokens.
pub fn resolve(template: &str, vars: &HashMap<String, String>) -> String {
    TOKEN
        .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Path-safe variant of [`resolve`] for building file paths from
/// user-entered values.
///
/// Any `/` or `\` inside a substituted value becomes `-`, so a variable
/// cannot introduce extra path segments. Separators written literally in the
/// template are preserved.
pub fn resolve_path_safe(template: &str, vars: &HashMap<String, String>) -> String {
    TOKEN
        .replace_all(template, |caps: &Captures| match vars.get(&caps[1]) {
            Some(value) => value.replace(['/', '\\'], "-"),
            None => caps[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_substitutes_known_variables() {
        let vars = vars(&[("entry", "did the thing"), ("time", "09:30")]);
        assert_eq!(
            resolve("- ({{time}}) {{entry}}", &vars),
            "- (09:30) did the thing"
        );
    }

    #[test]
    fn test_unknown_token_left_byte_identical() {
        let vars = vars(&[("known", "x")]);
        assert_eq!(
            resolve("{{known}} and {{unknown}}", &vars),
            "x and {{unknown}}"
        );
    }

    #[test]
    fn test_no_tokens_round_trips_unchanged() {
        let vars = vars(&[("a", "b")]);
        assert_eq!(resolve("plain text, no tokens", &vars), "plain text, no tokens");
    }

    #[test]
    fn test_no_recursive_resolution() {
        let vars = vars(&[("a", "{{b}}"), ("b", "deep")]);
        assert_eq!(resolve("{{a}}", &vars), "{{b}}");
    }

    #[test]
    fn test_repeated_token_substituted_everywhere() {
        let vars = vars(&[("name", "note")]);
        assert_eq!(resolve("{{name}}/{{name}}.md", &vars), "note/note.md");
    }

    #[test]
    fn test_path_safe_scrubs_separators_from_values() {
        let vars = vars(&[("title", "a/b\\c")]);
        assert_eq!(
            resolve_path_safe("Inbox/{{title}}.md", &vars),
            "Inbox/a-b-c.md"
        );
    }

    #[test]
    fn test_path_safe_preserves_literal_separators() {
        let vars = vars(&[("date", "2025-01-15")]);
        assert_eq!(
            resolve_path_safe("Journal/Daily/D-{{date}}", &vars),
            "Journal/Daily/D-2025-01-15"
        );
    }

    #[test]
    fn test_path_safe_leaves_unknown_tokens() {
        let vars = HashMap::new();
        assert_eq!(resolve_path_safe("Inbox/{{title}}", &vars), "Inbox/{{title}}");
    }
}
