use crate::chat::AttachedFile;
use std::path::PathBuf;

/// Input-layer commands handled before a submission is built. `/attach` is
/// the terminal stand-in for a file picker; `/detach` dismisses the pending
/// file.
#[derive(Debug, PartialEq, Eq)]
pub enum InputCommand {
    Attach(PathBuf),
    Detach,
}

pub fn parse_command(draft: &str) -> Option<InputCommand> {
    let trimmed = draft.trim();
    if trimmed.eq_ignore_ascii_case("/detach") {
        return Some(InputCommand::Detach);
    }
    let rest = trimmed.strip_prefix("/attach")?;
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    Some(InputCommand::Attach(PathBuf::from(rest.trim())))
}

/// The draft prompt plus at most one pending attached file.
#[derive(Default)]
pub struct InputState {
    draft: String,
    pending_file: Option<AttachedFile>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn pending_file(&self) -> Option<&AttachedFile> {
        self.pending_file.as_ref()
    }

    pub fn push_char(&mut self, c: char) {
        self.draft.push(c);
    }

    pub fn pop_char(&mut self) {
        self.draft.pop();
    }

    pub fn newline(&mut self) {
        self.draft.push('\n');
    }

    pub fn clear_draft(&mut self) {
        self.draft.clear();
    }

    /// Stage a file for the next submission, replacing any earlier one.
    pub fn attach(&mut self, file: AttachedFile) {
        self.pending_file = Some(file);
    }

    pub fn detach(&mut self) {
        self.pending_file = None;
    }

    /// Whether there is anything to submit.
    pub fn has_content(&self) -> bool {
        !self.draft.trim().is_empty() || self.pending_file.is_some()
    }

    /// Hand the draft and pending file off to the orchestrator, clearing
    /// both.
    pub fn take(&mut self) -> (String, Option<AttachedFile>) {
        let draft = std::mem::take(&mut self.draft);
        let file = self.pending_file.take();
        (draft, file)
    }
}
