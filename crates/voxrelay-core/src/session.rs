//! Session model — credentials, language choice, and exchange history.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::credentials::Credentials;
use crate::language::LanguageSelection;
use crate::types::{HistoryEntry, PipelineMode};

/// Append-only, insertion-ordered record of exchanges.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, user_text: impl Into<String>, reply_text: impl Into<String>) {
        self.entries.push(HistoryEntry {
            user_text: user_text.into(),
            reply_text: reply_text.into(),
            timestamp: Utc::now(),
        });
    }

    /// All entries, oldest first.
    pub fn render_all(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Everything a pipeline run needs that outlives a single run.
#[derive(Debug, Default)]
pub struct SessionContext {
    pub credentials: Credentials,
    pub languages: LanguageSelection,
    pub mode: PipelineMode,
    pub history: History,
}

impl SessionContext {
    pub fn new(credentials: Credentials, languages: LanguageSelection, mode: PipelineMode) -> Self {
        Self {
            credentials,
            languages,
            mode,
            history: History::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_preserves_insertion_order() {
        let mut history = History::new();
        for i in 0..5 {
            history.append(format!("q{i}"), format!("a{i}"));
        }
        assert_eq!(history.len(), 5);
        let users: Vec<&str> = history
            .render_all()
            .iter()
            .map(|e| e.user_text.as_str())
            .collect();
        assert_eq!(users, ["q0", "q1", "q2", "q3", "q4"]);
    }

    #[test]
    fn test_history_keeps_duplicates() {
        let mut history = History::new();
        history.append("same", "same");
        history.append("same", "same");
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_history_serializes_as_array() {
        let mut history = History::new();
        history.append("hello", "hi");
        let json = serde_json::to_value(&history).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["user"], "hello");
        assert_eq!(json[0]["llm"], "hi");
    }
}
