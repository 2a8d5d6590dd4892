//! Client projects as seen by the chat subsystem.
//!
//! The chat core only needs a project's owner, title and status: the status
//! decides whether a conversation should exist.

use std::fmt;
use std::str::FromStr;

use crate::domain::{ProjectId, UserId};

/// Lifecycle state of a client project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectStatus {
    Draft,
    PendingPayment,
    Planning,
    Development,
    Review,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 7] = [
        Self::Draft,
        Self::PendingPayment,
        Self::Planning,
        Self::Development,
        Self::Review,
        Self::Completed,
        Self::Cancelled,
    ];

    /// Wire and storage representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingPayment => "pending_payment",
            Self::Planning => "planning",
            Self::Development => "development",
            Self::Review => "review",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Statuses in which the client and staff converse.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Development | Self::Review)
    }

    /// Terminal statuses; the conversation is archived.
    pub const fn is_concluded(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a status string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown project status: {0}")]
pub struct UnknownProjectStatus(pub String);

impl FromStr for ProjectStatus {
    type Err = UnknownProjectStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownProjectStatus(s.to_owned()))
    }
}

/// Project record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub id: ProjectId,
    pub owner_id: UserId,
    pub title: String,
    pub status: ProjectStatus,
}

/// Effect a status change has on the project's conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationTransition {
    /// Create the conversation or reopen an archived one.
    Ensure,
    /// Archive the conversation if one exists.
    Archive,
    /// Leave the conversation untouched.
    Keep,
}

impl ConversationTransition {
    /// Decide the conversation effect of entering `status`.
    pub const fn for_status(status: ProjectStatus) -> Self {
        if status.is_active() {
            Self::Ensure
        } else if status.is_concluded() {
            Self::Archive
        } else {
            Self::Keep
        }
    }
}
