use crate::line::Line;

/// The page-break marker emitted by text extractors between pages.
pub const PAGE_BREAK: char = '\u{000C}';

/// Contiguous run of lines corresponding to one extracted page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    index: usize,
    lines: Vec<Line>,
}

impl Page {
    /// Zero-based page index.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Partition an ordered line sequence into pages on form-feed sentinels.
    ///
    /// A sentinel is a line whose value is whitespace containing at least one
    /// form feed and nothing else. Sentinels are dropped; concatenating the
    /// pages' lines reproduces the remaining input order exactly. Zero
    /// sentinels yield a single page; consecutive sentinels never yield an
    /// empty page.
    pub fn split(lines: &[Line]) -> Vec<Page> {
        let mut pages = Vec::new();
        let mut current: Vec<Line> = Vec::new();

        for line in lines {
            if is_page_break(line.value()) {
                if !current.is_empty() {
                    pages.push(Page {
                        index: pages.len(),
                        lines: std::mem::take(&mut current),
                    });
                }
            } else {
                current.push(line.clone());
            }
        }

        if !current.is_empty() {
            pages.push(Page {
                index: pages.len(),
                lines: current,
            });
        }

        tracing::debug!(pages = pages.len(), "segmented pages");
        pages
    }
}

fn is_page_break(value: &str) -> bool {
    value.contains(PAGE_BREAK) && value.chars().all(char::is_whitespace)
}
