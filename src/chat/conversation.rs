use crate::chat::message::{FileMeta, Message, MessageAuthor, MessageId};

/// Ordered, append-only store of chat messages. Insertion order is display
/// order. Once appended, a message is addressed by id and only its `text`,
/// `is_loading` and `image_url` fields are ever mutated; messages are never
/// reordered or deleted.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<Message>,
    next_id: u64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn allocate_id(&mut self) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Append a user message. The attached-file metadata is name/MIME only;
    /// the content never enters the store.
    pub fn push_user(&mut self, text: String, attached_file: Option<FileMeta>) -> MessageId {
        let id = self.allocate_id();
        self.messages.push(Message::user(id, text, attached_file));
        id
    }

    /// Append the AI placeholder for an in-flight response. At most one AI
    /// message may be loading at a time.
    pub fn push_ai_placeholder(&mut self) -> MessageId {
        debug_assert!(
            !self
                .messages
                .iter()
                .any(|m| m.author == MessageAuthor::Ai && m.is_loading),
            "a second AI response placeholder was appended while one was still loading"
        );
        let id = self.allocate_id();
        self.messages.push(Message::ai_placeholder(id));
        id
    }

    fn get_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    /// Append one streamed fragment to a message, keeping it loading.
    pub fn append_text(&mut self, id: MessageId, fragment: &str) {
        if let Some(msg) = self.get_mut(id) {
            msg.text.push_str(fragment);
        }
    }

    /// Mark a streamed response as complete.
    pub fn finish(&mut self, id: MessageId) {
        if let Some(msg) = self.get_mut(id) {
            msg.is_loading = false;
        }
    }

    /// Resolve a placeholder with a generated image and its caption.
    pub fn set_image(&mut self, id: MessageId, caption: String, image_url: String) {
        if let Some(msg) = self.get_mut(id) {
            msg.text = caption;
            msg.image_url = Some(image_url);
            msg.is_loading = false;
        }
    }

    /// Resolve a placeholder with a human-readable error. The conversation
    /// continues; the user may submit again.
    pub fn fail(&mut self, id: MessageId, error: &str) {
        if let Some(msg) = self.get_mut(id) {
            msg.text = format!("Error: {error}");
            msg.is_loading = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_creation_ordered() {
        let mut conv = Conversation::new();
        let a = conv.push_user("one".into(), None);
        let b = conv.push_ai_placeholder();
        conv.finish(b);
        let c = conv.push_user("two".into(), None);
        assert!(a < b && b < c);
        let ids: Vec<_> = conv.messages().iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![a, b, c]);
    }

    #[test]
    fn placeholder_streams_and_finishes_in_place() {
        let mut conv = Conversation::new();
        conv.push_user("hi".into(), None);
        let id = conv.push_ai_placeholder();
        assert!(conv.messages()[1].is_loading);
        assert_eq!(conv.messages()[1].text, "");

        conv.append_text(id, "Hel");
        conv.append_text(id, "lo");
        assert!(conv.messages()[1].is_loading);
        conv.finish(id);

        assert_eq!(conv.messages().len(), 2);
        assert_eq!(conv.messages()[1].text, "Hello");
        assert!(!conv.messages()[1].is_loading);
    }

    #[test]
    fn set_image_replaces_text_and_clears_loading() {
        let mut conv = Conversation::new();
        let id = conv.push_ai_placeholder();
        conv.set_image(
            id,
            "Image generated for: \"a red fox\"".into(),
            "data:image/jpeg;base64,abcd".into(),
        );
        let msg = &conv.messages()[0];
        assert_eq!(msg.text, "Image generated for: \"a red fox\"");
        assert_eq!(msg.image_url.as_deref(), Some("data:image/jpeg;base64,abcd"));
        assert!(!msg.is_loading);
    }

    #[test]
    fn fail_writes_error_prefix_and_keeps_message() {
        let mut conv = Conversation::new();
        let id = conv.push_ai_placeholder();
        conv.fail(id, "quota exceeded");
        let msg = &conv.messages()[0];
        assert_eq!(msg.text, "Error: quota exceeded");
        assert!(msg.image_url.is_none());
        assert!(!msg.is_loading);
        assert_eq!(conv.messages().len(), 1);
    }

    #[test]
    fn user_message_keeps_file_metadata_only() {
        let mut conv = Conversation::new();
        conv.push_user(
            "".into(),
            Some(FileMeta {
                name: "doc.pdf".into(),
                mime: "application/pdf".into(),
            }),
        );
        let meta = conv.messages()[0].attached_file.as_ref().unwrap();
        assert_eq!(meta.name, "doc.pdf");
        assert_eq!(meta.mime, "application/pdf");
    }
}
