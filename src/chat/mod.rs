pub mod attachment;
pub mod conversation;
pub mod message;

pub use attachment::AttachedFile;
pub use conversation::Conversation;
pub use message::{FileMeta, Message, MessageAuthor, MessageId};
