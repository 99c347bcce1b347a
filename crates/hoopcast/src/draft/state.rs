// Draft state: the user's roster and pick number, plus the conversation log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::extract::Extraction;
use super::serpentine::LEAGUE_SIZE;

/// What the assistant believes about the user's draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftState {
    /// The user's roster in draft order. Replaced wholesale whenever an
    /// utterance restates it; duplicates are kept.
    pub drafted_players: Vec<String>,
    /// Absolute 1-based pick number. `None` until the first pick-bearing
    /// utterance; never reset afterwards.
    pub current_pick: Option<u32>,
}

impl DraftState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a pick number has been learned yet.
    pub fn pick_known(&self) -> bool {
        self.current_pick.is_some()
    }

    /// Merge an extraction into the state.
    ///
    /// A non-empty drafted list replaces the roster. A resolved pick replaces
    /// the current pick. Fields the utterance did not address are left alone.
    pub fn apply(&mut self, extraction: &Extraction) {
        let drafted = extraction.drafted();
        if !drafted.is_empty() {
            debug!(players = ?drafted, "replacing drafted players");
            self.drafted_players = drafted;
        }
        if let Some(pick) = extraction.resolved_pick() {
            debug!(pick, "current pick set from utterance");
            self.current_pick = Some(pick);
        }
    }

    /// Move the current pick forward one full round. No-op when the pick is
    /// unknown.
    pub fn advance_one_round(&mut self) {
        if let Some(pick) = self.current_pick.as_mut() {
            *pick = pick.saturating_add(LEAGUE_SIZE);
        }
    }

    /// Pick number as rendered in the prompt: the number, or `unknown`.
    pub fn pick_label(&self) -> String {
        match self.current_pick {
            Some(pick) => pick.to_string(),
            None => "unknown".to_string(),
        }
    }

    /// Roster as rendered in the prompt: comma-joined, or `None`.
    pub fn drafted_label(&self) -> String {
        if self.drafted_players.is_empty() {
            "None".to_string()
        } else {
            self.drafted_players.join(", ")
        }
    }
}

// ---------------------------------------------------------------------------
// Conversation log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry in the conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

/// Append-only conversation log. Never replayed into the prompt.
///
/// With a non-zero cap the oldest turns are dropped; order is preserved.
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    turns: Vec<ConversationTurn>,
    max_turns: usize,
}

impl ConversationLog {
    /// Create a log keeping at most `max_turns` entries (0 keeps all).
    pub fn new(max_turns: usize) -> Self {
        ConversationLog {
            turns: Vec::new(),
            max_turns,
        }
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        self.turns.push(ConversationTurn {
            role,
            content: content.into(),
            at: Utc::now(),
        });
        if self.max_turns > 0 && self.turns.len() > self.max_turns {
            let excess = self.turns.len() - self.max_turns;
            self.turns.drain(..excess);
        }
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
