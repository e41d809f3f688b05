pub mod error;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An email as returned by the list endpoint
///
/// Immutable once fetched; the whole collection is replaced on refetch and
/// entries are removed on delete or move.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Email {
    pub id: String,
    pub subject: String,
    pub sender: String,
    pub preview: String,
    pub date: DateTime<Utc>,
    #[serde(rename = "isRead")]
    pub is_read: bool,
}

/// A user-created folder, persisted locally only
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomFolder {
    pub id: String,
    pub name: String,
}

/// The four fixed system mailboxes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mailbox {
    Inbox,
    Sent,
    Drafts,
    Trash,
}

impl Mailbox {
    pub const ALL: [Mailbox; 4] = [
        Mailbox::Inbox,
        Mailbox::Sent,
        Mailbox::Drafts,
        Mailbox::Trash,
    ];

    /// Display name for the sidebar
    pub fn title(&self) -> &'static str {
        match self {
            Mailbox::Inbox => "Inbox",
            Mailbox::Sent => "Sent",
            Mailbox::Drafts => "Drafts",
            Mailbox::Trash => "Trash",
        }
    }

    /// Lowercase path segment for the list endpoint
    pub fn segment(&self) -> &'static str {
        match self {
            Mailbox::Inbox => "inbox",
            Mailbox::Sent => "sent",
            Mailbox::Drafts => "drafts",
            Mailbox::Trash => "trash",
        }
    }

    /// Sidebar glyph
    pub fn glyph(&self) -> &'static str {
        match self {
            Mailbox::Inbox => "📥",
            Mailbox::Sent => "📤",
            Mailbox::Drafts => "📝",
            Mailbox::Trash => "🗑",
        }
    }
}

/// Response body of the list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailListResponse {
    pub emails: Vec<Email>,
}

/// Request body of the send endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
}
