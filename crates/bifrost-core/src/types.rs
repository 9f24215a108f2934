use serde::{Deserialize, Serialize};

use crate::id;

/// Attributed speaker of an extracted message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Unknown,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// One full-text export of the conversation. The source only ever offers
/// "export everything"; there is no incremental read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptSnapshot {
    pub text: String,
    pub captured_at: String,
}

impl TranscriptSnapshot {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            captured_at: id::now_rfc3339(),
        }
    }

    /// Transcript length in bytes. Diffs are computed as byte offsets.
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// The snapshot designated as "already synchronized". Replaced wholesale on
/// every successful sync cycle, never merged or appended to.
pub type Baseline = TranscriptSnapshot;

/// A discrete, role-tagged message cut out of raw transcript text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedMessage {
    /// `msg_<ulid>`
    pub id: String,
    pub role: Role,
    /// Cleaned message body. Never empty.
    pub content: String,
    /// The transcript line that opened this message, verbatim.
    pub raw_line: String,
    pub ts: String,
}

impl ExtractedMessage {
    pub fn new(role: Role, content: impl Into<String>, raw_line: impl Into<String>) -> Self {
        Self {
            id: id::message_id(),
            role,
            content: content.into(),
            raw_line: raw_line.into(),
            ts: id::now_rfc3339(),
        }
    }
}

/// Terminal and non-terminal states of a synchronization session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    Stabilized,
    TimedOut,
    Failed,
}

/// One synchronization session: a prompt, the baseline it started from,
/// and where the session ended up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSession {
    /// `ses_<ulid>`
    pub session_id: String,
    pub original_prompt: String,
    pub baseline: Baseline,
    pub started_at: String,
    pub status: SessionStatus,
}

impl SyncSession {
    pub fn new(original_prompt: impl Into<String>, baseline: Baseline) -> Self {
        Self {
            session_id: id::session_id(),
            original_prompt: original_prompt.into(),
            baseline,
            started_at: id::now_rfc3339(),
            status: SessionStatus::Running,
        }
    }
}
