use once_cell::sync::Lazy;
use regex::Regex;

use crate::line::Line;

/// Markers that begin a new entry regardless of line shape: "[12]", "(3)",
/// "7. ", and common bullets.
static NEW_ENTRY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:\[\d+\]|\(\d+\)|\d{1,3}\.\s|[•▪‣*]\s)").unwrap());

/// Terminal punctuation at the end of a completed entry, optionally followed
/// by a closing quote or bracket.
static TERMINAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[.!?]['"”’)\]]?$"#).unwrap());

/// Tunable thresholds for the join decision.
///
/// Calibrated against the `ref-join.json` fixture corpus; adjust via the
/// chainable setters rather than editing the decision logic.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinConfig {
    pub(crate) hanging_indent: f64,
    pub(crate) max_delta: f64,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            hanging_indent: 2.0,
            max_delta: 16.0,
        }
    }
}

impl JoinConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Leading-whitespace width at or above which a line is treated as the
    /// hanging indent of a wrapped entry (default: 2).
    pub fn hanging_indent(mut self, width: f64) -> Self {
        self.hanging_indent = width;
        self
    }

    /// Largest absolute line-shape change still treated as a same-entry wrap
    /// when the previous line did not end with terminal punctuation
    /// (default: 16).
    pub fn max_delta(mut self, delta: f64) -> Self {
        self.max_delta = delta;
        self
    }
}

/// Folds a labeled line sequence into reconstructed reference strings.
#[derive(Debug, Clone, Default)]
pub struct Joiner {
    config: JoinConfig,
}

impl Joiner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: JoinConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &JoinConfig {
        &self.config
    }

    /// Decide whether `b` is a physical continuation of the entry whose text
    /// so far is `a`.
    ///
    /// `delta` is the signed change in line shape between the entry's last
    /// physical line and `b` (previous trimmed width minus `b`'s trimmed
    /// width); `indent` is `b`'s leading-whitespace width. Pure and total:
    /// no lookahead, no hidden state, a boolean for every input.
    pub fn join(&self, a: &str, b: &str, delta: f64, indent: f64) -> bool {
        let a = a.trim_end();
        let b_trim = b.trim();

        if b_trim.is_empty() || a.is_empty() {
            return false;
        }
        // Explicit entry markers always split, even when indented.
        if NEW_ENTRY_RE.is_match(b) {
            return false;
        }
        // A trailing hyphen is a word broken across lines.
        if a.ends_with('-') {
            return true;
        }
        // Hanging indent of wrapped citation text.
        if indent >= self.config.hanging_indent {
            return true;
        }
        // A continuation rarely starts with an uppercase letter or digit.
        if b_trim.chars().next().is_some_and(char::is_lowercase) {
            return true;
        }
        // The previous line broke mid-sentence without drifting far from the
        // margin: still the same entry.
        !TERMINAL_RE.is_match(a) && delta.abs() <= self.config.max_delta
    }

    /// Reconstruct logical reference strings from the "ref"-labeled lines of
    /// an ordered sequence.
    ///
    /// Maintains a current-entry accumulator; each incoming line is compared
    /// against the accumulator's last physical line and either appended (with
    /// a single space, or nothing after a hyphen break) or closed out as a
    /// completed entry. Order-preserving; never fails.
    pub fn parse(&self, lines: &[Line]) -> Vec<String> {
        let mut refs: Vec<String> = Vec::new();
        let mut current: Option<String> = None;
        let mut last_width = 0.0;

        for line in lines {
            if line.label() != "ref" {
                continue;
            }
            let value = line.value().trim();
            if value.is_empty() {
                continue;
            }
            let width = line.width() as f64;
            let indent = line.indent() as f64;

            match current.as_mut() {
                Some(entry) => {
                    let delta = last_width - width;
                    if self.join(entry, line.value(), delta, indent) {
                        if !entry.ends_with('-') {
                            entry.push(' ');
                        }
                        entry.push_str(value);
                    } else {
                        refs.push(std::mem::replace(entry, value.to_string()));
                    }
                }
                None => current = Some(value.to_string()),
            }
            last_width = width;
        }

        if let Some(entry) = current {
            refs.push(entry);
        }

        tracing::debug!(entries = refs.len(), "reconstructed references");
        refs
    }
}
