//! Paragraph buffering state: the text accumulator, the wrap mode and
//! the two comment queues.

use crate::error::SourceRef;

/// Whether the catalog may reflow the paragraph being collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WrapMode {
    /// Reflow permitted.
    #[default]
    Yes,
    /// A leading-whitespace line was seen; wrap is off for this
    /// paragraph only.
    No,
    /// Inside a no-wrap region (`.nf` and friends); persists across
    /// paragraphs until an end macro.
    MacroNo,
}

impl WrapMode {
    pub fn allows_wrap(self) -> bool {
        self == WrapMode::Yes
    }

    /// `No` reverts at paragraph boundaries; `MacroNo` survives them.
    pub fn after_flush(self) -> Self {
        match self {
            WrapMode::No => WrapMode::Yes,
            other => other,
        }
    }
}

/// The paragraph being accumulated, with the reference of its first line.
#[derive(Debug, Default)]
pub struct ParagraphBuffer {
    text: String,
    reference: Option<SourceRef>,
}

impl ParagraphBuffer {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Append one logical line (newline included).
    pub fn push_line(&mut self, line: &str, reference: &SourceRef) {
        if self.reference.is_none() {
            self.reference = Some(reference.clone());
        }
        self.text.push_str(line);
    }

    /// Append text to the tail of the buffer without starting a line.
    pub fn push_str(&mut self, chunk: &str, reference: &SourceRef) {
        if self.reference.is_none() {
            self.reference = Some(reference.clone());
        }
        self.text.push_str(chunk);
    }

    /// Drain the buffer, normalizing the tail to exactly one newline.
    pub fn take(&mut self) -> Option<(String, SourceRef)> {
        if self.text.is_empty() {
            self.reference = None;
            return None;
        }
        let mut text = std::mem::take(&mut self.text);
        while text.ends_with('\n') {
            text.pop();
        }
        text.push('\n');
        let reference = self
            .reference
            .take()
            .unwrap_or_else(|| SourceRef::new("", 0));
        Some((text, reference))
    }
}

/// Source comments waiting for a place in the output.
#[derive(Debug, Default)]
pub struct CommentBuffers {
    /// Comments found on lines of the paragraph being collected.
    attached: Vec<String>,
    /// Comments from macro-only or blank lines; they belong to whatever
    /// paragraph comes next.
    pending: Vec<String>,
}

impl CommentBuffers {
    pub fn attach(&mut self, comment: &str) {
        self.attached.push(comment.to_string());
    }

    pub fn push_pending(&mut self, comment: &str) {
        self.pending.push(comment.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.attached.is_empty() && self.pending.is_empty()
    }

    /// Every comment owed to the paragraph being flushed, oldest first:
    /// the pending ones collected before it started, then the attached
    /// ones. Each comment leaves the buffers exactly once.
    pub fn drain(&mut self) -> Vec<String> {
        let mut all = std::mem::take(&mut self.pending);
        all.append(&mut self.attached);
        all
    }
}
