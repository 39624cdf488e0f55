use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Open mapping attached to a line by the labeling collaborator.
///
/// The core never interprets its contents; it only copies the mapping
/// verbatim when a document is re-labeled.
pub type Observations = BTreeMap<String, serde_json::Value>;

/// One unit of text with an associated structural label.
///
/// Immutable once constructed. An empty label means "unlabeled".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    value: String,
    #[serde(default)]
    label: String,
    #[serde(default, skip_serializing_if = "Observations::is_empty")]
    observations: Observations,
}

impl Line {
    /// An unlabeled line.
    pub fn new(value: impl Into<String>) -> Self {
        Self::labeled(value, "")
    }

    pub fn labeled(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            observations: Observations::new(),
        }
    }

    pub fn with_observations(
        value: impl Into<String>,
        label: impl Into<String>,
        observations: Observations,
    ) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            observations,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn observations(&self) -> &Observations {
        &self.observations
    }

    pub fn is_unlabeled(&self) -> bool {
        self.label.is_empty()
    }

    /// Leading-whitespace width of the raw value, in characters.
    pub fn indent(&self) -> usize {
        self.value
            .chars()
            .take_while(|c| c.is_whitespace())
            .count()
    }

    /// Character width of the value with trailing whitespace removed.
    pub fn width(&self) -> usize {
        self.value.trim_end().chars().count()
    }
}
