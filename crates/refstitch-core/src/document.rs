use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use once_cell::unsync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::CoreError;
use crate::join::{JoinConfig, Joiner};
use crate::line::{Line, Observations};
use crate::page::Page;
use crate::section::Sections;

/// Default record delimiter: any line ending, CR optional.
static LINE_DELIMITER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r?\n").unwrap());

/// Separator between the label field and the content of a tagged record.
static LABEL_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\| ").unwrap());

/// Ordered, labeled line sequence with derived page, section, and reference
/// views.
///
/// Constructed whole from text (or from re-labeling another document) and
/// never mutated line-by-line afterwards; operations that change labels
/// produce a new `Document`. `meta` and `info` are opaque pass-through
/// payloads from the extraction collaborator.
#[derive(Debug, Clone, Default)]
pub struct Document {
    tokens: Vec<Line>,
    path: Option<PathBuf>,
    meta: Option<serde_json::Value>,
    info: Option<serde_json::Value>,
    // Derived view, computed once per instance. Re-labeling constructs a new
    // Document, which is what invalidates this cache.
    pages: OnceCell<Vec<Page>>,
}

impl Document {
    pub fn new(tokens: Vec<Line>) -> Self {
        Self {
            tokens,
            ..Default::default()
        }
    }

    /// Parse text into a document, splitting records on `\r?\n`.
    ///
    /// When `tagged` is true each record must be `LABEL| CONTENT`; a record
    /// whose label field is blank inherits the most recently seen non-empty
    /// label (the serializer's label-compression convention). A tagged record
    /// with no separator at all fails with [`CoreError::Format`]. Untagged
    /// parsing never fails: every line simply gets an empty label.
    pub fn parse(text: &str, tagged: bool) -> Result<Self, CoreError> {
        Self::parse_with_delimiter(text, &LINE_DELIMITER, tagged)
    }

    pub fn parse_with_delimiter(
        text: &str,
        delimiter: &Regex,
        tagged: bool,
    ) -> Result<Self, CoreError> {
        let mut records: Vec<&str> = delimiter.split(text).collect();
        while records.last().is_some_and(|r| r.is_empty()) {
            records.pop();
        }

        let mut tokens = Vec::with_capacity(records.len());
        // Label carry is an explicit local accumulator threaded through the
        // loop, never shared state.
        let mut current_label = String::new();

        for (idx, record) in records.into_iter().enumerate() {
            let value = if tagged {
                let sep = LABEL_SEPARATOR
                    .find(record)
                    .ok_or(CoreError::Format { line: idx + 1 })?;
                let label = &record[..sep.start()];
                if !label.is_empty() {
                    current_label = label.to_string();
                }
                &record[sep.end()..]
            } else {
                record
            };
            tokens.push(Line::labeled(value, current_label.clone()));
        }

        tracing::debug!(lines = tokens.len(), tagged, "parsed document");
        Ok(Self::new(tokens))
    }

    // ── construction pass-throughs ──

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_meta(mut self, meta: serde_json::Value) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn with_info(mut self, info: serde_json::Value) -> Self {
        self.info = Some(info);
        self
    }

    // ── accessors ──

    pub fn lines(&self) -> &[Line] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn meta(&self) -> Option<&serde_json::Value> {
        self.meta.as_ref()
    }

    pub fn info(&self) -> Option<&serde_json::Value> {
        self.info.as_ref()
    }

    // ── derived views ──

    /// Page partition of the line sequence, computed on first access and
    /// cached for this instance's lifetime.
    pub fn pages(&self) -> &[Page] {
        self.pages.get_or_init(|| Page::split(&self.tokens))
    }

    /// Lazy iterator over ref/text sections bounded by title lines.
    pub fn sections(&self) -> Sections<'_> {
        Sections::new(&self.tokens)
    }

    /// Joined text of the first maximal run of "title"-labeled lines, or an
    /// empty string when there is none. A later title run (a running header
    /// repeated mid-document) is ignored.
    pub fn title(&self) -> String {
        self.title_with(" ")
    }

    pub fn title_with(&self, separator: &str) -> String {
        self.tokens
            .iter()
            .skip_while(|ln| ln.label() != "title")
            .take_while(|ln| ln.label() == "title")
            .map(|ln| ln.value().trim())
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Reconstructed logical reference strings.
    pub fn references(&self) -> Vec<String> {
        self.references_with(&JoinConfig::default())
    }

    pub fn references_with(&self, config: &JoinConfig) -> Vec<String> {
        Joiner::with_config(config.clone()).parse(&self.tokens)
    }

    /// Serializable digest of the document's derived views.
    pub fn summary(&self) -> Summary {
        Summary {
            title: self.title(),
            references: self.references(),
            sections: self.sections().map(|s| s.len()).collect(),
            pages: self.pages().len(),
        }
    }

    // ── re-labeling ──

    /// New document with identical line values but labels and observations
    /// copied positionally from `source`. Fails with
    /// [`CoreError::LengthMismatch`] when the lengths differ; this document
    /// is untouched either way.
    pub fn relabel(&self, source: &dyn LabelSource) -> Result<Document, CoreError> {
        if source.len() != self.tokens.len() {
            return Err(CoreError::LengthMismatch {
                expected: self.tokens.len(),
                actual: source.len(),
            });
        }

        let tokens = self
            .tokens
            .iter()
            .enumerate()
            .map(|(idx, ln)| {
                Line::with_observations(
                    ln.value(),
                    source.label(idx),
                    source.observations(idx).clone(),
                )
            })
            .collect();

        Ok(Document {
            tokens,
            path: self.path.clone(),
            meta: self.meta.clone(),
            info: self.info.clone(),
            pages: OnceCell::new(),
        })
    }

    // ── serialization ──

    /// Serialize with the platform-neutral `\n` delimiter.
    ///
    /// In tagged mode each record is `LABEL| CONTENT` with the label field
    /// left-justified in 14 characters and emitted only when it differs from
    /// the previous record's label. Inverse of [`Document::parse`]: the
    /// `(value, label)` sequence round-trips exactly.
    ///
    /// One representational limit: a blank label field means "unchanged", so
    /// the tagged format cannot express a transition *to* the empty label.
    /// An unlabeled line that follows a labeled one is re-parsed with the
    /// inherited label; leading unlabeled lines are unaffected.
    pub fn serialize(&self, tagged: bool) -> String {
        self.serialize_with_delimiter("\n", tagged)
    }

    pub fn serialize_with_delimiter(&self, delimiter: &str, tagged: bool) -> String {
        if !tagged {
            return self
                .tokens
                .iter()
                .map(Line::value)
                .collect::<Vec<_>>()
                .join(delimiter);
        }

        let mut records = Vec::with_capacity(self.tokens.len());
        let mut prev_label: Option<&str> = None;
        for ln in &self.tokens {
            let label = if prev_label == Some(ln.label()) {
                ""
            } else {
                ln.label()
            };
            prev_label = Some(ln.label());
            records.push(format!("{:<14.14}| {}", label, ln.value()));
        }
        records.join(delimiter)
    }
}

/// Plain dump: the raw line values joined by newlines, no label information.
impl std::fmt::Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.serialize(false))
    }
}

/// Ordered sequence of `(label, observations)` pairs consumed positionally by
/// [`Document::relabel`]. The contract the statistical labeling collaborator
/// fulfills: same length as the target document, one pair per line.
pub trait LabelSource {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn label(&self, index: usize) -> &str;

    fn observations(&self, index: usize) -> &Observations;
}

impl LabelSource for Document {
    fn len(&self) -> usize {
        self.tokens.len()
    }

    fn label(&self, index: usize) -> &str {
        self.tokens[index].label()
    }

    fn observations(&self, index: usize) -> &Observations {
        self.tokens[index].observations()
    }
}

/// One `(label, observations)` pair, the unit a labeling collaborator emits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Labeling {
    pub label: String,
    #[serde(default)]
    pub observations: Observations,
}

impl Labeling {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            observations: Observations::new(),
        }
    }
}

impl LabelSource for [Labeling] {
    fn len(&self) -> usize {
        <[Labeling]>::len(self)
    }

    fn label(&self, index: usize) -> &str {
        &self[index].label
    }

    fn observations(&self, index: usize) -> &Observations {
        &self[index].observations
    }
}

impl LabelSource for Vec<Labeling> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn label(&self, index: usize) -> &str {
        &self[index].label
    }

    fn observations(&self, index: usize) -> &Observations {
        &self[index].observations
    }
}

/// Digest of a document's derived views, emitted by [`Document::summary`].
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub title: String,
    pub references: Vec<String>,
    /// Line count of each section, in order.
    pub sections: Vec<usize>,
    pub pages: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(doc: &Document) -> Vec<(String, String)> {
        doc.lines()
            .iter()
            .map(|l| (l.value().to_string(), l.label().to_string()))
            .collect()
    }

    // ── parsing ──

    #[test]
    fn test_parse_plain() {
        let doc = Document::parse("one\ntwo\r\nthree", false).unwrap();
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.lines()[1].value(), "two");
        assert!(doc.lines().iter().all(Line::is_unlabeled));
    }

    #[test]
    fn test_parse_drops_trailing_newline_record() {
        let doc = Document::parse("one\ntwo\n", false).unwrap();
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_parse_tagged_with_label_inheritance() {
        let text = "title         | Deep Learning\n\
                    ref           | Smith, J. A paper.\n\
                    \u{20}             | continuation of the same run\n\
                    text          | Body.";
        let doc = Document::parse(text, true).unwrap();
        assert_eq!(
            pairs(&doc),
            vec![
                ("Deep Learning".into(), "title".into()),
                ("Smith, J. A paper.".into(), "ref".into()),
                ("continuation of the same run".into(), "ref".into()),
                ("Body.".into(), "text".into()),
            ]
        );
    }

    #[test]
    fn test_parse_tagged_missing_separator_fails() {
        let err = Document::parse("ref           | ok\nno separator here", true).unwrap_err();
        match err {
            CoreError::Format { line } => assert_eq!(line, 2),
            other => panic!("expected Format, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_tagged_content_may_contain_pipe() {
        let doc = Document::parse("ref           | a | b", true).unwrap();
        assert_eq!(doc.lines()[0].value(), "a | b");
        assert_eq!(doc.lines()[0].label(), "ref");
    }

    #[test]
    fn test_parse_custom_delimiter() {
        let delim = Regex::new(r";").unwrap();
        let doc = Document::parse_with_delimiter("a;b;c", &delim, false).unwrap();
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn test_parse_empty_text() {
        let doc = Document::parse("", false).unwrap();
        assert!(doc.is_empty());
    }

    // ── serialization & round trip ──

    #[test]
    fn test_serialize_plain() {
        let doc = Document::new(vec![Line::new("a"), Line::new("b")]);
        assert_eq!(doc.serialize(false), "a\nb");
        assert_eq!(doc.serialize_with_delimiter("\r\n", false), "a\r\nb");
    }

    #[test]
    fn test_display_is_plain_dump() {
        let doc = Document::new(vec![
            Line::labeled("A Title", "title"),
            Line::labeled("Smith, J. 2020.", "ref"),
        ]);
        assert_eq!(doc.to_string(), "A Title\nSmith, J. 2020.");
    }

    #[test]
    fn test_label_compression_emits_label_once_per_run() {
        let doc = Document::new(vec![
            Line::labeled("A", "ref"),
            Line::labeled("B", "ref"),
            Line::labeled("C", "ref"),
            Line::labeled("D", "text"),
        ]);
        let out = doc.serialize(true);
        let lines: Vec<&str> = out.split('\n').collect();
        assert_eq!(lines[0], "ref           | A");
        assert_eq!(lines[1], "              | B");
        assert_eq!(lines[2], "              | C");
        assert_eq!(lines[3], "text          | D");
    }

    #[test]
    fn test_long_label_truncated_to_field_width() {
        let doc = Document::new(vec![Line::labeled("X", "a-very-long-label-name")]);
        let out = doc.serialize(true);
        assert_eq!(out, "a-very-long-la| X");
    }

    #[test]
    fn test_tagged_round_trip() {
        let doc = Document::new(vec![
            Line::labeled("unlabeled leader", ""),
            Line::labeled("Deep Learning", "title"),
            Line::labeled("  Smith, J. et al. A wrapped", "ref"),
            Line::labeled("  citation line.", "ref"),
            Line::labeled("Body text.", "text"),
        ]);
        let round = Document::parse(&doc.serialize(true), true).unwrap();
        assert_eq!(pairs(&round), pairs(&doc));
    }

    #[test]
    fn test_blank_label_field_means_unchanged() {
        // A blank field inherits the previous label, so an unlabeled line
        // after a labeled one is outside the tagged format's representable
        // domain: it comes back carrying the inherited label.
        let doc = Document::new(vec![
            Line::labeled("Body text.", "text"),
            Line::labeled("unlabeled trailer", ""),
        ]);
        let out = doc.serialize(true);
        let lines: Vec<&str> = out.split('\n').collect();
        assert_eq!(lines[1], "              | unlabeled trailer");
        let round = Document::parse(&out, true).unwrap();
        assert_eq!(round.lines()[1].label(), "text");
    }

    #[test]
    fn test_tagged_round_trip_empty_values() {
        let doc = Document::new(vec![Line::labeled("", "ref"), Line::labeled("x", "ref")]);
        let round = Document::parse(&doc.serialize(true), true).unwrap();
        assert_eq!(pairs(&round), pairs(&doc));
    }

    // ── title ──

    #[test]
    fn test_title_joins_first_run() {
        let doc = Document::new(vec![
            Line::labeled("Deep", "title"),
            Line::labeled("Learning", "title"),
            Line::labeled("X", "ref"),
            Line::labeled("Running header", "title"),
        ]);
        assert_eq!(doc.title(), "Deep Learning");
        assert_eq!(doc.title_with(" / "), "Deep / Learning");
    }

    #[test]
    fn test_title_skips_leading_non_title_lines() {
        let doc = Document::new(vec![
            Line::labeled("meta junk", "meta"),
            Line::labeled("The Title", "title"),
        ]);
        assert_eq!(doc.title(), "The Title");
    }

    #[test]
    fn test_title_empty_when_absent() {
        let doc = Document::new(vec![Line::labeled("X", "ref")]);
        assert_eq!(doc.title(), "");
    }

    // ── pages cache ──

    #[test]
    fn test_pages_cached_per_instance() {
        let doc = Document::new(vec![
            Line::new("a"),
            Line::new("\u{000C}"),
            Line::new("b"),
        ]);
        let first = doc.pages().as_ptr();
        let second = doc.pages().as_ptr();
        assert_eq!(first, second);
        assert_eq!(doc.pages().len(), 2);
    }

    // ── relabel ──

    #[test]
    fn test_relabel_copies_labels_and_observations() {
        let doc = Document::new(vec![Line::new("a"), Line::new("b")]);
        let mut obs = Observations::new();
        obs.insert("weight".into(), serde_json::json!(1.5));
        let labels = vec![
            Labeling::new("title"),
            Labeling {
                label: "ref".into(),
                observations: obs.clone(),
            },
        ];

        let relabeled = doc.relabel(&labels).unwrap();
        assert_eq!(relabeled.lines()[0].label(), "title");
        assert_eq!(relabeled.lines()[1].label(), "ref");
        assert_eq!(relabeled.lines()[1].observations(), &obs);
        // Values are untouched, as is the original document.
        assert_eq!(relabeled.lines()[0].value(), "a");
        assert!(doc.lines().iter().all(Line::is_unlabeled));
    }

    #[test]
    fn test_relabel_from_another_document() {
        let doc = Document::new(vec![Line::new("a"), Line::new("b")]);
        let other = Document::new(vec![Line::labeled("x", "title"), Line::labeled("y", "ref")]);
        let relabeled = doc.relabel(&other).unwrap();
        assert_eq!(relabeled.lines()[0].label(), "title");
        assert_eq!(relabeled.lines()[0].value(), "a");
    }

    #[test]
    fn test_relabel_length_mismatch() {
        let doc = Document::new(vec![Line::new("a"), Line::new("b")]);
        let short = vec![Labeling::new("ref")];
        match doc.relabel(&short).unwrap_err() {
            CoreError::LengthMismatch { expected, actual } => {
                assert_eq!((expected, actual), (2, 1));
            }
            other => panic!("expected LengthMismatch, got {other:?}"),
        }
        let long = vec![Labeling::new("ref"); 3];
        assert!(doc.relabel(&long).is_err());
        // Original untouched.
        assert!(doc.lines().iter().all(Line::is_unlabeled));
    }

    // ── references & summary ──

    #[test]
    fn test_references_delegate() {
        let doc = Document::new(vec![
            Line::labeled("References", "title"),
            Line::labeled("Smith, J. A study of something", "ref"),
            Line::labeled("   long enough to wrap. 2020.", "ref"),
            Line::labeled("Jones, B. Another study. 2019.", "ref"),
        ]);
        let refs = doc.references();
        assert_eq!(refs.len(), 2);
        assert!(refs[0].ends_with("wrap. 2020."));
    }

    #[test]
    fn test_summary() {
        let doc = Document::new(vec![
            Line::labeled("A Title", "title"),
            Line::labeled("Smith, J. A cited work. 2020.", "ref"),
        ]);
        let summary = doc.summary();
        assert_eq!(summary.title, "A Title");
        assert_eq!(summary.references.len(), 1);
        assert_eq!(summary.sections, vec![1]);
        assert_eq!(summary.pages, 1);
        // Summary is serializable for the CLI's JSON mode.
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["title"], "A Title");
    }
}
