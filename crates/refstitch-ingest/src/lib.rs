use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use refstitch_core::{CoreError, Document};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("document not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("unsupported document format: {0:?}")]
    UnsupportedFormat(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Core(#[from] CoreError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Failure inside an extraction backend.
#[derive(Error, Debug)]
#[error("text extraction failed: {0}")]
pub struct ExtractError(pub String);

/// Toggles passed through to extraction backends.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenOptions {
    pub parse_meta: bool,
    pub parse_info: bool,
}

/// Text produced by an extraction backend, plus optional side-channel
/// metadata the core attaches opaquely.
#[derive(Debug, Clone, Default)]
pub struct ExtractedText {
    pub text: String,
    pub meta: Option<serde_json::Value>,
    pub info: Option<serde_json::Value>,
}

/// Backend seam for binary formats the core cannot read itself (PDF and
/// friends). Implementations live outside this workspace; the core only
/// consumes the extracted string.
pub trait TextExtractor {
    fn extract(&self, path: &Path, opts: &OpenOptions) -> Result<ExtractedText, ExtractError>;
}

/// Open a document by file extension.
///
/// `.ttx` is the tagged-text interchange format; `.txt` is plain extracted
/// text. Anything else needs a backend — see [`open_with_backend`].
pub fn open(path: impl AsRef<Path>) -> Result<Document, IngestError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(IngestError::NotFound(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    let tagged = match ext.as_str() {
        "ttx" => true,
        "txt" => false,
        other => return Err(IngestError::UnsupportedFormat(other.to_string())),
    };

    let text = fs::read_to_string(path)?;
    let doc = Document::parse(&text, tagged)?.with_path(path);
    tracing::debug!(path = %path.display(), tagged, lines = doc.len(), "opened document");
    Ok(doc)
}

/// Open a binary document through an extraction backend.
///
/// The backend's optional `meta`/`info` payloads are attached to the document
/// without interpretation.
pub fn open_with_backend(
    path: impl AsRef<Path>,
    backend: &dyn TextExtractor,
    opts: &OpenOptions,
) -> Result<Document, IngestError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(IngestError::NotFound(path.to_path_buf()));
    }

    let extracted = backend.extract(path, opts)?;
    let mut doc = Document::parse(&extracted.text, false)?.with_path(path);
    if let Some(meta) = extracted.meta {
        doc = doc.with_meta(meta);
    }
    if let Some(info) = extracted.info {
        doc = doc.with_info(info);
    }
    tracing::debug!(path = %path.display(), lines = doc.len(), "extracted document via backend");
    Ok(doc)
}
