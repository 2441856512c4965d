//! Ordered turn history of a single session.

use crate::turn::Turn;
use serde::{Deserialize, Serialize};

/// Separator placed between rendered turns.
const TURN_SEPARATOR: &str = "\n\n";

/// The append-only, insertion-ordered turns of one session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionHistory {
    turns: Vec<Turn>,
    /// Maximum number of turns retained; `None` keeps everything.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    max_turns: Option<usize>,
}

impl SessionHistory {
    /// Creates an empty, unbounded history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty history retaining at most `max_turns` turns.
    #[must_use]
    pub fn with_max_turns(max_turns: Option<usize>) -> Self {
        Self {
            turns: Vec::new(),
            max_turns,
        }
    }

    /// Appends a turn, dropping the oldest turns when over capacity.
    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
        if let Some(max) = self.max_turns
            && self.turns.len() > max
        {
            let excess = self.turns.len() - max;
            self.turns.drain(..excess);
        }
    }

    /// Returns the turns in insertion order.
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Renders the transcript as `"<Role>: <text>"` blocks separated by a
    /// blank line. Returns the empty string when there are no turns.
    #[must_use]
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(TURN_SEPARATOR)
    }

    /// Removes every turn.
    pub fn clear(&mut self) {
        self.turns.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_renders_empty_string() {
        assert_eq!(SessionHistory::new().render(), "");
    }

    #[test]
    fn render_joins_with_blank_line() {
        let mut history = SessionHistory::new();
        history.push(Turn::user("Bonjour"));
        history.push(Turn::assistant("Salut!"));
        assert_eq!(history.render(), "User: Bonjour\n\nAssistant: Salut!");
    }

    #[test]
    fn render_preserves_inner_whitespace() {
        let mut history = SessionHistory::new();
        history.push(Turn::user("line one\nline two"));
        assert_eq!(history.render(), "User: line one\nline two");
    }

    #[test]
    fn clear_empties_history() {
        let mut history = SessionHistory::new();
        history.push(Turn::user("a"));
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.render(), "");
    }

    #[test]
    fn cap_drops_oldest_turns() {
        let mut history = SessionHistory::with_max_turns(Some(2));
        history.push(Turn::user("one"));
        history.push(Turn::assistant("two"));
        history.push(Turn::user("three"));

        assert_eq!(history.len(), 2);
        assert_eq!(history.render(), "Assistant: two\n\nUser: three");
    }

    #[test]
    fn unbounded_history_keeps_everything() {
        let mut history = SessionHistory::new();
        for i in 0..50 {
            history.push(Turn::user(i.to_string()));
        }
        assert_eq!(history.len(), 50);
        assert_eq!(history.turns()[0].content(), "0");
    }
}
