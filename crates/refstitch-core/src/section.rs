use crate::line::Line;

/// Contiguous run of ref/text lines bounded by title lines.
///
/// Ephemeral: sections borrow the document's lines and are yielded by
/// [`Sections`], never stored on the document itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Section<'a> {
    lines: Vec<&'a Line>,
}

impl<'a> Section<'a> {
    pub fn lines(&self) -> &[&'a Line] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn values(&self) -> Vec<&'a str> {
        self.lines.iter().map(|l| l.value()).collect()
    }

    /// Joined text of the section's lines.
    pub fn text(&self, separator: &str) -> String {
        self.lines
            .iter()
            .map(|l| l.value().trim())
            .collect::<Vec<_>>()
            .join(separator)
    }
}

/// Lazy iterator over a document's sections.
///
/// Single pass over the line sequence: "title" lines flush the pending
/// buffer (the title itself is a boundary, not content), "ref"/"text" lines
/// accumulate, anything else is ignored. The final buffer is flushed after
/// the last line. Restartable only by asking the document for a fresh
/// iterator.
pub struct Sections<'a> {
    rest: std::slice::Iter<'a, Line>,
    buffer: Vec<&'a Line>,
}

impl<'a> Sections<'a> {
    pub(crate) fn new(lines: &'a [Line]) -> Self {
        Self {
            rest: lines.iter(),
            buffer: Vec::new(),
        }
    }
}

impl<'a> Iterator for Sections<'a> {
    type Item = Section<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        for line in self.rest.by_ref() {
            match line.label() {
                "title" => {
                    if !self.buffer.is_empty() {
                        return Some(Section {
                            lines: std::mem::take(&mut self.buffer),
                        });
                    }
                }
                "ref" | "text" => self.buffer.push(line),
                _ => {}
            }
        }

        if self.buffer.is_empty() {
            None
        } else {
            Some(Section {
                lines: std::mem::take(&mut self.buffer),
            })
        }
    }
}

impl std::iter::FusedIterator for Sections<'_> {}
