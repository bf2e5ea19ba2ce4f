//! Physical line supply with push-back.
//!
//! The reader builds logical lines out of physical ones and sometimes has
//! to look one line ahead; structural handlers pull whole blocks. Both go
//! through [`LineSource`], a buffered iterator with a push-back stack, so
//! embedders can substitute their own supply by wrapping one.

use crate::error::SourceRef;

/// Pull-based supply of physical lines. Lines carry no trailing newline.
pub trait LineSource {
    /// Next physical line, or `None` at end of input.
    fn shift(&mut self) -> Option<(String, SourceRef)>;

    /// Put a line back; it is returned by the next `shift` call. May be
    /// called repeatedly, stack-wise.
    fn unshift(&mut self, line: String, reference: SourceRef);
}

/// In-memory document split into physical lines up front.
#[derive(Debug)]
pub struct DocumentSource {
    /// Remaining lines, stored in reverse so `shift` pops from the end.
    lines: Vec<(String, SourceRef)>,
    /// Push-back stack, popped before `lines`.
    pushed: Vec<(String, SourceRef)>,
    /// Full document text, kept for sentinel selection.
    text: String,
}

impl DocumentSource {
    pub fn from_str(path: &str, text: &str) -> Self {
        let mut lines: Vec<(String, SourceRef)> = text
            .lines()
            .enumerate()
            .map(|(i, l)| (l.to_string(), SourceRef::new(path, i as u32 + 1)))
            .collect();
        lines.reverse();
        Self {
            lines,
            pushed: Vec::new(),
            text: text.to_string(),
        }
    }

    /// True if the literal occurs anywhere in the document. Used to pick
    /// the non-breaking-space sentinel, which must never collide with
    /// real input.
    pub fn contains(&self, needle: &str) -> bool {
        self.text.contains(needle)
    }
}

impl LineSource for DocumentSource {
    fn shift(&mut self) -> Option<(String, SourceRef)> {
        self.pushed.pop().or_else(|| self.lines.pop())
    }

    fn unshift(&mut self, line: String, reference: SourceRef) {
        self.pushed.push((line, reference));
    }
}
