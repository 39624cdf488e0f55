use thiserror::Error;

pub mod document;
pub mod join;
pub mod line;
pub mod page;
pub mod section;

pub use document::{Document, LabelSource, Labeling, Summary};
pub use join::{JoinConfig, Joiner};
pub use line::{Line, Observations};
pub use page::Page;
pub use section::{Section, Sections};

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("malformed tagged record on line {line}: missing label separator")]
    Format { line: usize },
    #[error("label source has {actual} entries but the document has {expected} lines")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Reconstruct logical reference strings from labeled text.
///
/// Pipeline:
/// 1. Parse `text` into a labeled line sequence (tagged format or plain)
/// 2. Fold "ref"-labeled lines into logical entries via the join heuristic
pub fn reconstruct_references(text: &str, tagged: bool) -> Result<Vec<String>, CoreError> {
    Ok(Document::parse(text, tagged)?.references())
}
