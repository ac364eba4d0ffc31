//! Card rendering data derived from a record and its expanded flag.

use std::fmt::Write;

use crate::models::Todo;

/// Lines of detail shown while a card is collapsed.
pub const MAX_DISPLAY_LINES: usize = 4;

const ELLIPSIS: char = '…';

/// Everything needed to draw one card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub id: i64,
    /// "{topic} of {name}"
    pub title: String,
    pub image: String,
    /// Detail as displayed, clamped when collapsed.
    pub detail: String,
    /// True when the displayed detail hides some of the record's lines.
    pub truncated: bool,
    /// Done cards are drawn de-emphasised but stay in place.
    pub dimmed: bool,
    pub expanded: bool,
    pub expand_label: &'static str,
    pub done_label: &'static str,
}

impl CardView {
    pub fn derive(todo: &Todo, expanded: bool) -> Self {
        let (detail, truncated) = if expanded {
            (todo.detail.clone(), false)
        } else {
            clamp_lines(&todo.detail, MAX_DISPLAY_LINES)
        };

        Self {
            id: todo.id,
            title: format!("{} of {}", todo.topic, todo.name),
            image: todo.url.clone(),
            detail,
            truncated,
            dimmed: todo.done,
            expanded,
            expand_label: if expanded { "Show Less" } else { "Show More" },
            done_label: if todo.done { "Undo" } else { "Done" },
        }
    }
}

/// Keep at most `max` lines of `text`, marking the cut with an ellipsis.
pub fn clamp_lines(text: &str, max: usize) -> (String, bool) {
    let lines: Vec<&str> = text.lines().collect();
    if lines.len() <= max {
        return (text.to_string(), false);
    }

    let mut clamped = lines[..max].join("\n");
    clamped.push(ELLIPSIS);
    (clamped, true)
}

/// Plain-text card used by the shell.
pub fn render(card: &CardView) -> String {
    let mut out = String::new();
    let status = if card.dimmed { "  (done)" } else { "" };
    let _ = writeln!(out, "[#{}] {}{}", card.id, card.title, status);
    let _ = writeln!(out, "  image: {}", card.image);
    for line in card.detail.lines() {
        let _ = writeln!(out, "  {}", line);
    }
    let _ = write!(
        out,
        "  [{}] [{}] [Delete]",
        card.expand_label, card.done_label
    );
    out
}
