use crate::chat::{AttachedFile, Conversation, MessageId};
use crate::gemini::{ChatGateway, ChatSession};
use crate::tui::input::{self, InputCommand, InputState};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Outcome of an in-flight submission, delivered to the UI thread over the
/// event channel. Fragments arrive in order; exactly one terminal event
/// (`Completed`, `ImageReady` or `Failed`) follows per submission.
#[derive(Debug)]
pub enum ResponseEvent {
    Chunk {
        id: MessageId,
        text: String,
    },
    Completed {
        id: MessageId,
    },
    ImageReady {
        id: MessageId,
        caption: String,
        url: String,
    },
    Failed {
        id: MessageId,
        error: String,
    },
}

/// Application state: the conversation store, the input state and the
/// submission orchestration. All mutation happens on the UI thread; the
/// spawned request tasks only send events back.
pub struct ChartyApp {
    conversation: Conversation,
    pub input: InputState,
    gateway: Arc<dyn ChatGateway>,
    session: Option<Arc<ChatSession>>,
    busy: bool,
    notice: Option<String>,
    text_model: String,
    image_model: String,
    tx: mpsc::UnboundedSender<ResponseEvent>,
    rx: mpsc::UnboundedReceiver<ResponseEvent>,
    scroll_offset: u16,
    auto_scroll: bool,
    max_scroll: u16,
}

impl ChartyApp {
    pub fn new(gateway: Arc<dyn ChatGateway>, text_model: String, image_model: String) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            conversation: Conversation::new(),
            input: InputState::new(),
            gateway,
            session: None,
            busy: false,
            notice: None,
            text_model,
            image_model,
            tx,
            rx,
            scroll_offset: 0,
            auto_scroll: true,
            max_scroll: 0,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn text_model(&self) -> &str {
        &self.text_model
    }

    pub fn image_model(&self) -> &str {
        &self.image_model
    }

    /// Enter pressed: run an input command if the draft is one, otherwise
    /// submit. Ignored entirely while a submission is in flight.
    pub fn on_enter(&mut self) {
        if self.busy {
            return;
        }
        if let Some(command) = input::parse_command(self.input.draft()) {
            match command {
                InputCommand::Attach(path) => match AttachedFile::from_path(&path) {
                    Ok(file) => {
                        self.notice = Some(format!("Attached {}", file.name));
                        self.input.attach(file);
                    }
                    Err(err) => self.notice = Some(err.to_string()),
                },
                InputCommand::Detach => {
                    self.input.detach();
                    self.notice = None;
                }
            }
            self.input.clear_draft();
            return;
        }
        self.submit();
    }

    /// One submission: append the user message and the AI placeholder, then
    /// dispatch the request task. A no-op while busy or when both prompt
    /// and file are empty.
    pub fn submit(&mut self) {
        if self.busy || !self.input.has_content() {
            return;
        }
        let (prompt, file) = self.input.take();
        self.busy = true;
        self.notice = None;
        self.auto_scroll = true;

        self.conversation
            .push_user(prompt.clone(), file.as_ref().map(|f| f.meta()));
        let id = self.conversation.push_ai_placeholder();

        if prompt.to_lowercase().starts_with("/image") {
            self.spawn_image_request(id, prompt["/image".len()..].trim().to_string());
        } else {
            self.spawn_chat_request(id, prompt, file);
        }
    }

    fn spawn_image_request(&self, id: MessageId, image_prompt: String) {
        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let event = match gateway.generate_image(&image_prompt).await {
                Ok(url) => ResponseEvent::ImageReady {
                    id,
                    caption: format!("Image generated for: \"{image_prompt}\""),
                    url,
                },
                Err(err) => ResponseEvent::Failed {
                    id,
                    error: err.to_string(),
                },
            };
            let _ = tx.send(event);
        });
    }

    fn spawn_chat_request(&mut self, id: MessageId, prompt: String, file: Option<AttachedFile>) {
        // Created lazily on the first chat turn, then reused for the rest
        // of the process.
        let session = match &self.session {
            Some(session) => Arc::clone(session),
            None => {
                let session = Arc::new(self.gateway.init_chat());
                self.session = Some(Arc::clone(&session));
                session
            }
        };

        let gateway = Arc::clone(&self.gateway);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let mut on_chunk = {
                let tx = tx.clone();
                move |fragment: &str| {
                    let _ = tx.send(ResponseEvent::Chunk {
                        id,
                        text: fragment.to_string(),
                    });
                }
            };
            let event = match gateway
                .stream_chat_response(&session, &prompt, file.as_ref(), &mut on_chunk)
                .await
            {
                Ok(()) => ResponseEvent::Completed { id },
                Err(err) => ResponseEvent::Failed {
                    id,
                    error: err.to_string(),
                },
            };
            let _ = tx.send(event);
        });
    }

    /// Drain pending response events; called once per UI tick.
    pub fn poll_events(&mut self) {
        while let Ok(event) = self.rx.try_recv() {
            self.apply_event(event);
        }
    }

    pub fn apply_event(&mut self, event: ResponseEvent) {
        // Every store mutation snaps the view back to the newest line.
        self.auto_scroll = true;
        match event {
            ResponseEvent::Chunk { id, text } => {
                self.conversation.append_text(id, &text);
            }
            ResponseEvent::Completed { id } => {
                self.conversation.finish(id);
                self.busy = false;
            }
            ResponseEvent::ImageReady { id, caption, url } => {
                self.conversation.set_image(id, caption, url);
                self.busy = false;
            }
            ResponseEvent::Failed { id, error } => {
                tracing::warn!(%error, "submission failed");
                self.conversation.fail(id, &error);
                self.busy = false;
            }
        }
    }

    pub fn scroll_up(&mut self) {
        self.auto_scroll = false;
        self.scroll_offset = self.effective_scroll().saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.scroll_offset = self
            .effective_scroll()
            .saturating_add(1)
            .min(self.max_scroll);
        if self.scroll_offset >= self.max_scroll {
            self.auto_scroll = true;
        }
    }

    /// The renderer reports how far the transcript can scroll for the
    /// current viewport.
    pub fn set_max_scroll(&mut self, max: u16) {
        self.max_scroll = max;
    }

    /// Scroll position to render, pinned to the bottom while auto-scroll is
    /// on.
    pub fn effective_scroll(&self) -> u16 {
        if self.auto_scroll {
            self.max_scroll
        } else {
            self.scroll_offset.min(self.max_scroll)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::MessageAuthor;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordedCall {
        prompt: String,
        file_name: Option<String>,
    }

    #[derive(Default)]
    struct StubGateway {
        fragments: Vec<String>,
        fail_with: Option<String>,
        chat_calls: Mutex<Vec<RecordedCall>>,
        image_prompts: Mutex<Vec<String>>,
        init_calls: Mutex<usize>,
    }

    impl StubGateway {
        fn streaming(fragments: &[&str]) -> Self {
            Self {
                fragments: fragments.iter().map(|f| f.to_string()).collect(),
                ..Self::default()
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                fail_with: Some(message.to_string()),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl ChatGateway for StubGateway {
        fn init_chat(&self) -> ChatSession {
            *self.init_calls.lock().unwrap() += 1;
            ChatSession::new("stub-model".into(), "stub instruction".into())
        }

        async fn stream_chat_response(
            &self,
            _session: &ChatSession,
            prompt: &str,
            file: Option<&AttachedFile>,
            on_chunk: &mut (dyn for<'a> FnMut(&'a str) + Send),
        ) -> Result<()> {
            self.chat_calls.lock().unwrap().push(RecordedCall {
                prompt: prompt.to_string(),
                file_name: file.map(|f| f.name.clone()),
            });
            if let Some(message) = &self.fail_with {
                anyhow::bail!("{message}");
            }
            for fragment in &self.fragments {
                // Fragments reach the sink as borrows that end with the
                // call, like the decoded stream payloads in production.
                let piece = fragment.clone();
                on_chunk(&piece);
            }
            Ok(())
        }

        async fn generate_image(&self, prompt: &str) -> Result<String> {
            self.image_prompts.lock().unwrap().push(prompt.to_string());
            if prompt.is_empty() {
                anyhow::bail!("An image description is required.");
            }
            if let Some(message) = &self.fail_with {
                anyhow::bail!("{message}");
            }
            Ok("data:image/jpeg;base64,ZmFrZQ==".to_string())
        }
    }

    fn app_with(stub: Arc<StubGateway>) -> ChartyApp {
        ChartyApp::new(stub, "gemini-test".into(), "imagen-test".into())
    }

    fn type_text(app: &mut ChartyApp, text: &str) {
        for c in text.chars() {
            app.input.push_char(c);
        }
    }

    async fn pump_until_idle(app: &mut ChartyApp) {
        while app.is_busy() {
            let event = app.rx.recv().await.expect("event channel closed");
            app.apply_event(event);
        }
    }

    #[tokio::test]
    async fn empty_submission_is_a_no_op() {
        let stub = Arc::new(StubGateway::streaming(&["hi"]));
        let mut app = app_with(stub.clone());
        app.on_enter();
        assert!(app.conversation().is_empty());
        assert!(!app.is_busy());
        assert!(stub.chat_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn chat_submission_streams_fragments_in_order() {
        let stub = Arc::new(StubGateway::streaming(&["Hel", "lo ", "world"]));
        let mut app = app_with(stub.clone());
        type_text(&mut app, "Hello");
        app.on_enter();

        assert!(app.is_busy());
        assert_eq!(app.conversation().messages().len(), 2);
        let messages = app.conversation().messages();
        assert_eq!(messages[0].author, MessageAuthor::User);
        assert_eq!(messages[0].text, "Hello");
        assert_eq!(messages[1].author, MessageAuthor::Ai);
        assert!(messages[1].is_loading);

        pump_until_idle(&mut app).await;

        let reply = &app.conversation().messages()[1];
        assert_eq!(reply.text, "Hello world");
        assert!(!reply.is_loading);
        assert!(!app.is_busy());
        assert_eq!(app.input.draft(), "");
    }

    #[tokio::test]
    async fn second_submission_while_busy_is_rejected() {
        let stub = Arc::new(StubGateway::streaming(&["x"]));
        let mut app = app_with(stub.clone());
        type_text(&mut app, "first");
        app.on_enter();
        assert_eq!(app.conversation().messages().len(), 2);

        type_text(&mut app, "second");
        app.on_enter();
        assert_eq!(app.conversation().messages().len(), 2);

        pump_until_idle(&mut app).await;
        assert_eq!(stub.chat_calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn image_submission_sets_caption_and_url() {
        let stub = Arc::new(StubGateway::default());
        let mut app = app_with(stub.clone());
        type_text(&mut app, "/image a red fox");
        app.on_enter();
        pump_until_idle(&mut app).await;

        let messages = app.conversation().messages();
        assert_eq!(messages[0].text, "/image a red fox");
        assert_eq!(messages[1].text, "Image generated for: \"a red fox\"");
        assert!(messages[1]
            .image_url
            .as_deref()
            .unwrap()
            .starts_with("data:image/"));
        assert!(!messages[1].is_loading);
        assert_eq!(stub.image_prompts.lock().unwrap()[0], "a red fox");
    }

    #[tokio::test]
    async fn image_prefix_is_case_insensitive_and_remainder_trimmed() {
        let stub = Arc::new(StubGateway::default());
        let mut app = app_with(stub.clone());
        type_text(&mut app, "/IMAGE   a red fox  ");
        app.on_enter();
        pump_until_idle(&mut app).await;

        assert_eq!(stub.image_prompts.lock().unwrap()[0], "a red fox");
        assert!(app.conversation().messages()[1].image_url.is_some());
    }

    #[tokio::test]
    async fn empty_image_remainder_surfaces_an_error() {
        let stub = Arc::new(StubGateway::default());
        let mut app = app_with(stub.clone());
        type_text(&mut app, "/image");
        app.on_enter();
        pump_until_idle(&mut app).await;

        let reply = &app.conversation().messages()[1];
        assert_eq!(reply.text, "Error: An image description is required.");
        assert!(reply.image_url.is_none());
        assert!(!app.is_busy());
    }

    #[tokio::test]
    async fn attached_file_alone_is_submitted_with_empty_prompt() {
        let stub = Arc::new(StubGateway::streaming(&["Summary."]));
        let mut app = app_with(stub.clone());
        app.input.attach(AttachedFile {
            name: "doc.pdf".into(),
            mime: "application/pdf".into(),
            content: "data:application/pdf;base64,aGVsbG8=".into(),
        });
        app.on_enter();
        pump_until_idle(&mut app).await;

        let user = &app.conversation().messages()[0];
        assert_eq!(user.text, "");
        assert_eq!(user.attached_file.as_ref().unwrap().name, "doc.pdf");

        let calls = stub.chat_calls.lock().unwrap();
        assert_eq!(calls[0].prompt, "");
        assert_eq!(calls[0].file_name.as_deref(), Some("doc.pdf"));
        // The pending file is consumed by the submission.
        assert!(app.input.pending_file().is_none());
    }

    #[tokio::test]
    async fn stream_failure_is_written_into_the_placeholder() {
        let stub = Arc::new(StubGateway::failing("network down"));
        let mut app = app_with(stub.clone());
        type_text(&mut app, "Hello");
        app.on_enter();
        pump_until_idle(&mut app).await;

        let reply = &app.conversation().messages()[1];
        assert!(reply.text.starts_with("Error: "));
        assert!(reply.text.contains("network down"));
        assert!(!reply.is_loading);
        assert!(!app.is_busy());
    }

    #[tokio::test]
    async fn chat_session_is_created_once_and_reused() {
        let stub = Arc::new(StubGateway::streaming(&["ok"]));
        let mut app = app_with(stub.clone());
        for prompt in ["first", "second"] {
            type_text(&mut app, prompt);
            app.on_enter();
            pump_until_idle(&mut app).await;
        }
        assert_eq!(*stub.init_calls.lock().unwrap(), 1);
        assert_eq!(stub.chat_calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn attach_command_stages_a_file_without_submitting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();

        let stub = Arc::new(StubGateway::default());
        let mut app = app_with(stub.clone());
        type_text(&mut app, &format!("/attach {}", path.display()));
        app.on_enter();

        assert!(app.conversation().is_empty());
        assert_eq!(app.input.pending_file().unwrap().name, "notes.txt");
        assert_eq!(app.input.draft(), "");
        assert!(app.notice().unwrap().contains("notes.txt"));

        type_text(&mut app, "/detach");
        app.on_enter();
        assert!(app.input.pending_file().is_none());
    }

    #[tokio::test]
    async fn unreadable_attach_path_sets_a_notice() {
        let stub = Arc::new(StubGateway::default());
        let mut app = app_with(stub.clone());
        type_text(&mut app, "/attach /no/such/file.bin");
        app.on_enter();

        assert!(app.conversation().is_empty());
        assert!(app.notice().unwrap().contains("Failed to read file"));
        assert!(app.input.pending_file().is_none());
    }
}
