//! Plain-text rendering of runs and history for terminals.

use std::fmt::Write;

use voxrelay_core::types::{HistoryEntry, Processor};

use crate::RunOutcome;

const SEPARATOR: &str = "---";

/// Render history oldest-first as `You:` / `LLM:` pairs.
pub fn history_text(entries: &[HistoryEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        let _ = writeln!(out, "You: {}", entry.user_text);
        let _ = writeln!(out, "LLM: {}", entry.reply_text);
        let _ = writeln!(out, "{SEPARATOR}");
    }
    out
}

/// Render what a run produced, in stage order.
pub fn outcome_text(outcome: &RunOutcome) -> String {
    let mut out = String::new();
    for message in &outcome.messages {
        let _ = writeln!(out, "{message}");
    }
    if let Some(transcript) = &outcome.transcript {
        let _ = writeln!(out, "Your speech: {}", transcript.text);
    }
    if let Some(reply) = &outcome.reply {
        let label = match reply.processor {
            Processor::Translation => "Translation",
            Processor::LanguageModel => "LLM reply",
        };
        let _ = writeln!(out, "{label}: {}", reply.text);
    }
    for failure in &outcome.errors {
        let _ = writeln!(out, "[{}] {}", failure.service, failure.error.message);
    }
    out
}
