use crate::chat::FileMeta;
use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;

/// A file staged for the next submission. The content is a base64 data URL
/// of the full file bytes; the attachment lives only from selection until
/// the submission that consumes it.
#[derive(Debug, Clone)]
pub struct AttachedFile {
    pub name: String,
    pub mime: String,
    pub content: String,
}

impl AttachedFile {
    /// Read a file from disk and encode it as a base64 data URL. The MIME
    /// type is inferred from the extension; no format validation is done.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let mime = mime_for_extension(path).to_string();
        let content = format!("data:{};base64,{}", mime, STANDARD.encode(bytes));
        Ok(Self {
            name,
            mime,
            content,
        })
    }

    /// The raw base64 payload, with the `data:` prefix stripped if present.
    pub fn inline_base64(&self) -> &str {
        match self.content.split_once(',') {
            Some((prefix, data)) if prefix.starts_with("data:") => data,
            _ => &self.content,
        }
    }

    /// The metadata that is kept on the user message.
    pub fn meta(&self) -> FileMeta {
        FileMeta {
            name: self.name.clone(),
            mime: self.mime.clone(),
        }
    }
}

fn mime_for_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "txt" | "md" => "text/plain",
        "pdf" => "application/pdf",
        "json" => "application/json",
        "csv" => "text/csv",
        "html" | "htm" => "text/html",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}
