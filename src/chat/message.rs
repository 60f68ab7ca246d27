use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageAuthor {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "ai")]
    Ai,
}

/// Creation-ordered message identifier, assigned by the conversation store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

/// Metadata of a file attached to a user message. Only the name and MIME
/// type are kept on the message; the file bytes travel with the submission
/// and are never retained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    pub name: String,
    pub mime: String,
}

/// One entry of the conversation. After it is appended, only `text`,
/// `is_loading` and `image_url` may change, and only in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub author: MessageAuthor,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_loading: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attached_file: Option<FileMeta>,
    pub created_at: DateTime<Local>,
}

impl Message {
    pub fn new(id: MessageId, author: MessageAuthor, text: String) -> Self {
        Self {
            id,
            author,
            text,
            image_url: None,
            is_loading: false,
            attached_file: None,
            created_at: Local::now(),
        }
    }

    /// A user message, optionally carrying attached-file metadata.
    pub fn user(id: MessageId, text: String, attached_file: Option<FileMeta>) -> Self {
        let mut msg = Self::new(id, MessageAuthor::User, text);
        msg.attached_file = attached_file;
        msg
    }

    /// The in-flight AI response: empty text, loading indicator on.
    pub fn ai_placeholder(id: MessageId) -> Self {
        let mut msg = Self::new(id, MessageAuthor::Ai, String::new());
        msg.is_loading = true;
        msg
    }
}
