//! Lending history entity definitions.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Kind of lending event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LendingAction {
    /// An item was reserved.
    Reserved,
    /// A reservation was cancelled.
    ReservationCancelled,
    /// An item was lent.
    Lent,
    /// A lent item came back.
    Returned,
}

/// A single entry in the lending history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LendingHistoryEntry {
    /// Identifier of the affected item.
    pub medium_id: String,
    /// User involved, if known.
    pub user: Option<String>,
    /// When the event happened.
    pub at: DateTime<FixedOffset>,
    /// What happened.
    pub action: LendingAction,
}

impl LendingHistoryEntry {
    /// Creates a new history entry.
    pub fn new(
        medium_id: impl Into<String>,
        user: Option<String>,
        at: DateTime<FixedOffset>,
        action: LendingAction,
    ) -> Self {
        Self {
            medium_id: medium_id.into(),
            user,
            at,
            action,
        }
    }
}
