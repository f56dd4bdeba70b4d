//! Status tags carried by client events

use serde::{Deserialize, Serialize};

/// Outcome tag of an optimistic write
///
/// The local value is applied before the request. `Failed` means the local
/// value now diverges from the server until the next refetch.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum WriteState {
    #[default]
    Confirmed,
    Pending,
    Failed(String),
}

impl WriteState {
    pub fn is_failed(&self) -> bool {
        matches!(self, WriteState::Failed(_))
    }
}

/// Authentication status as last observed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Unknown,
    Authenticated,
    Expired,
}
