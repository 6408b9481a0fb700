use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How long an unlocked session lasts.
pub const SESSION_DURATION: Duration = Duration::from_secs(60 * 60);

/// Key of the session record in the key-value store.
pub const SESSION_KEY: &str = "manveer_session";

pub(crate) const SESSION_DURATION_MS: i64 = SESSION_DURATION.as_millis() as i64;

/// The persisted session record.
///
/// Serialized as `{"startTime": <epoch ms>, "isActive": true}`. Both fields
/// are required; a record missing either is treated as corrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub start_time: i64,
    pub is_active: bool,
}

impl SessionRecord {
    pub fn started_at(start_time: i64) -> Self {
        Self {
            start_time,
            is_active: true,
        }
    }

    pub fn expires_at(&self) -> i64 {
        self.start_time.saturating_add(SESSION_DURATION_MS)
    }

    pub fn elapsed_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.start_time)
    }

    /// Milliseconds left at `now_ms`, never below zero.
    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        (SESSION_DURATION_MS - self.elapsed_ms(now_ms)).max(0)
    }

    /// Strict `<`: a record exactly one duration old is expired.
    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        self.is_active && self.elapsed_ms(now_ms) < SESSION_DURATION_MS
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    Locked,
    Unlocked,
}

impl GateState {
    pub fn is_unlocked(self) -> bool {
        self == GateState::Unlocked
    }
}

impl std::fmt::Display for GateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateState::Locked => write!(f, "locked"),
            GateState::Unlocked => write!(f, "unlocked"),
        }
    }
}
