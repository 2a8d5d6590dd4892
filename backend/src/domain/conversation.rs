//! Conversations and the numeric identifiers shared by the chat domain.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::UserId;

macro_rules! define_numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wrap a raw database identifier.
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Raw identifier value.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

define_numeric_id!(
    /// Identifier of a project conversation.
    ConversationId
);
define_numeric_id!(
    /// Identifier of a chat message.
    MessageId
);
define_numeric_id!(
    /// Identifier of a message attachment.
    AttachmentId
);
define_numeric_id!(
    /// Identifier of a client project.
    ProjectId
);

/// Persistent message thread tied one-to-one to a project.
///
/// Conversations are archived rather than deleted once the project concludes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    pub id: ConversationId,
    pub project_id: ProjectId,
    pub is_archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Conversation enriched with per-viewer read state for listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub conversation: Conversation,
    pub project_title: String,
    pub unread_count: u64,
}

/// Conversation joined with the project facts needed for access checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationRecord {
    pub conversation: Conversation,
    pub project_title: String,
    pub owner_id: UserId,
}

/// Authenticated caller as seen by chat access rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: UserId,
    pub is_staff: bool,
}

impl Viewer {
    /// Participants are the project owner plus every staff user.
    pub fn participates_in(&self, record: &ConversationRecord) -> bool {
        self.is_staff || record.owner_id == self.user_id
    }
}
