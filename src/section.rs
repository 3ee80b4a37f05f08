//! Section location and insertion planning
//!
//! Pure line-index functions over a `\n`-split document. A section is a
//! heading line plus the content below it, bounded by the next heading of
//! the same or higher level (fewer or equal `#` markers) or the end of the
//! document. All functions here are effect-free; the read-modify-write
//! around them lives in the runner.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(#+)\s").expect("Invalid regex pattern"));

/// Where inserted text lands relative to a section's content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    /// Immediately after the heading line.
    Beginning,
    /// After the section's last non-blank content line.
    End,
}

/// Heading depth as the count of leading `#` markers.
///
/// A line with no markers counts as level 1 so that an unmarked section
/// heading still bounds against top-level headings.
pub fn heading_level(heading: &str) -> usize {
    heading.chars().take_while(|c| *c == '#').count().max(1)
}

/// Index of the first line whose trailing-whitespace-trimmed text equals
/// `heading` verbatim. Leading whitespace and heading text must match
/// exactly.
pub fn find_section(lines: &[&str], heading: &str) -> Option<usize> {
    lines.iter().position(|line| line.trim_end() == heading)
}

/// Compute the line index at which new text is inserted into the section
/// starting at `section_index`.
///
/// For [`Position::End`] the boundary is the first subsequent heading with
/// level <= `level`, or the end of the document, then walked backward over
/// blank lines so the insertion lands right after the last non-blank content
/// line. The walk never passes the heading line itself, and it only moves
/// the insertion point: existing blank lines are kept.
pub fn insertion_index(lines: &[&str], section_index: usize, level: usize, position: Position) -> usize {
    match position {
        Position::Beginning => section_index + 1,
        Position::End => {
            let mut index = lines.len();
            for (i, line) in lines.iter().enumerate().skip(section_index + 1) {
                if let Some(caps) = HEADING.captures(line) {
                    if caps[1].len() <= level {
                        index = i;
                        break;
                    }
                }
            }
            while index > section_index + 1 && lines[index - 1].trim().is_empty() {
                index -= 1;
            }
            index
        }
    }
}

/// Scan the document's headings for one whose bare text (markers stripped,
/// trimmed) equals `bare_text` exactly. Returns the matching line index.
///
/// Used to scroll an opened document to a heading; depth is ignored, only
/// the text has to match.
pub fn find_heading_line(lines: &[&str], bare_text: &str) -> Option<usize> {
    lines.iter().position(|line| {
        HEADING
            .captures(line)
            .is_some_and(|caps| line[caps[1].len()..].trim() == bare_text)
    })
}
