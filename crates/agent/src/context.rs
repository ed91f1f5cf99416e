use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::types::Timestamp;

pub const DEFAULT_HISTORY_WINDOW: usize = 20;

/// Standing guidance available to every skill in a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub content: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
    /// Output of a plan step, labelled with the agent that produced it
    Agent(String),
}

impl TurnRole {
    fn label(&self) -> &str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
            TurnRole::Agent(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub at: Timestamp,
}

#[derive(Debug, Default)]
struct ContextState {
    memories: Vec<MemoryEntry>,
    turns: Vec<Turn>,
}

/// Conversation and memory shared by reference across one orchestration run.
///
/// Cloning is cheap and every clone sees the same state. The caller owns the
/// lifetime: reuse a handle to carry history between requests, or drop it.
#[derive(Debug)]
pub struct SharedContext {
    state: Arc<RwLock<ContextState>>,
    history_window: usize,
}

impl SharedContext {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(ContextState::default())),
            history_window: DEFAULT_HISTORY_WINDOW,
        }
    }

    /// Only the most recent `window` turns are rendered for skills
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    pub async fn remember(&self, content: impl Into<String>) {
        self.state.write().await.memories.push(MemoryEntry {
            content: content.into(),
            created_at: Timestamp::now(),
        });
    }

    pub async fn record(&self, role: TurnRole, content: impl Into<String>) {
        self.state.write().await.turns.push(Turn {
            role,
            content: content.into(),
            at: Timestamp::now(),
        });
    }

    pub async fn memories(&self) -> Vec<MemoryEntry> {
        self.state.read().await.memories.clone()
    }

    pub async fn history(&self) -> Vec<Turn> {
        self.state.read().await.turns.clone()
    }

    pub async fn clear_history(&self) {
        self.state.write().await.turns.clear();
    }

    pub async fn is_empty(&self) -> bool {
        let state = self.state.read().await;
        state.memories.is_empty() && state.turns.is_empty()
    }

    /// Plain-text rendering: every memory, then the recent conversation.
    /// Empty when there is nothing to say.
    pub async fn render(&self) -> String {
        self.render_where(|_| true).await
    }

    /// Like [`render`](Self::render) but without agent turns, leaving
    /// memories and the user/assistant exchange.
    pub async fn render_dialogue(&self) -> String {
        self.render_where(|turn| !matches!(turn.role, TurnRole::Agent(_)))
            .await
    }

    async fn render_where(&self, keep: impl Fn(&Turn) -> bool) -> String {
        let state = self.state.read().await;
        let mut out = String::new();

        if !state.memories.is_empty() {
            out.push_str("Memory:\n");
            for memory in &state.memories {
                let _ = writeln!(out, "{}", memory.content.trim_end());
            }
        }

        let kept: Vec<&Turn> = state.turns.iter().filter(|&t| keep(t)).collect();
        let recent = &kept[kept.len().saturating_sub(self.history_window)..];
        if !recent.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str("Conversation:\n");
            for turn in recent {
                let _ = writeln!(out, "{}: {}", turn.role.label(), turn.content.trim_end());
            }
        }

        out
    }
}

impl Default for SharedContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SharedContext {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            history_window: self.history_window,
        }
    }
}
