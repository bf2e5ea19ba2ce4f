//! Font-state tracking and the surface-markup rewrite.
//!
//! Three slots: the current font, the previous one (for `\fP`) and the
//! regular font of the enclosing context (`R` in running text, `B`
//! inside section headings). [`FontStack::do_fonts`] rewrites a whole
//! paragraph, replacing `\f` escapes for the well-known fonts with the
//! translator-visible `B<…>`, `I<…>`, `R<…>` and `CW<…>` forms.

use tracing::debug;

/// Fonts whose runs are shown to translators as `X<…>` markup.
const SURFACE_FONTS: &[(&str, &str)] = &[("B", "B"), ("I", "I"), ("R", "R"), ("(CW", "CW")];

#[derive(Debug, Clone)]
pub struct FontStack {
    current: String,
    previous: String,
    regular: String,
}

impl Default for FontStack {
    fn default() -> Self {
        Self {
            current: "R".to_string(),
            previous: "R".to_string(),
            regular: "R".to_string(),
        }
    }
}

impl FontStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn regular(&self) -> &str {
        &self.regular
    }

    /// Decode one `\f` selector (everything after the `\f`) into a
    /// normalized font name.
    fn decode(&self, selector: &str) -> String {
        match selector {
            "P" | "[]" | "[P]" => self.previous.clone(),
            "1" => "R".to_string(),
            "2" => "I".to_string(),
            "3" => "B".to_string(),
            "4" => "(BI".to_string(),
            // Two bare letters (a `.ft CW` argument) name the same font
            // the `\f(XX` escape does.
            other if other.len() == 2 && !other.starts_with(['(', '[']) => format!("({other}"),
            other => other.to_string(),
        }
    }

    /// Apply one selector to the stack.
    pub fn set_font(&mut self, selector: &str) {
        let name = self.decode(selector);
        self.previous = std::mem::replace(&mut self.current, name);
        debug!(target: "mantran::fonts", current = %self.current, previous = %self.previous, "font change");
    }

    /// Change the regular font of the surrounding context (headings set
    /// `B`, everything else `R`).
    pub fn set_regular(&mut self, selector: &str) {
        self.set_font(selector);
        self.regular = self.current.clone();
        debug!(target: "mantran::fonts", regular = %self.regular, "regular font change");
    }

    /// Drop back to the regular font, as paragraph-reset macros do.
    pub fn reset_to_regular(&mut self) {
        let regular = self.regular.clone();
        self.set_font(&regular);
    }

    /// Surface name for a font, if it is one the translator sees as
    /// markup and it is not the ambient regular font.
    fn surface_name(&self, font: &str) -> Option<&'static str> {
        if font == self.regular {
            return None;
        }
        SURFACE_FONTS
            .iter()
            .find(|(internal, _)| *internal == font)
            .map(|(_, surface)| *surface)
    }

    /// Rewrite the font escapes of one paragraph into surface markup.
    ///
    /// The carried-over state is prepended as two synthetic selectors so
    /// the scan below starts from the right font; duplicate selectors
    /// collapse, selectors with no text in between are elided, and the
    /// paragraph is guaranteed to end back in the regular font.
    pub fn do_fonts(&mut self, text: &str) -> String {
        let prefixed = format!("\\f{}\\f{}{}", self.previous, self.current, text);

        // Each piece after the first starts with a selector.
        let mut runs: Vec<(String, String)> = Vec::new();
        let mut pieces = prefixed.split("\\f");
        let head = pieces.next().unwrap_or_default();
        debug_assert!(head.is_empty());

        for piece in pieces {
            let (selector, rest) = split_selector(piece);
            if selector.is_empty() {
                continue;
            }
            self.set_font(selector);
            if rest.is_empty() {
                continue;
            }
            match runs.last_mut() {
                Some((font, chunk)) if *font == self.current => chunk.push_str(rest),
                _ => runs.push((self.current.clone(), rest.to_string())),
            }
        }

        let mut out = String::with_capacity(text.len());
        let mut open_escape = false;
        for (font, chunk) in &runs {
            if *font == self.regular {
                if open_escape {
                    out.push_str(&format!("\\f{}", self.regular));
                    open_escape = false;
                }
                out.push_str(chunk);
            } else if let Some(surface) = self.surface_name(font) {
                if open_escape {
                    out.push_str(&format!("\\f{}", self.regular));
                    open_escape = false;
                }
                out.push_str(surface);
                out.push('<');
                out.push_str(chunk);
                out.push('>');
            } else {
                out.push_str(&format!("\\f{font}"));
                out.push_str(chunk);
                open_escape = true;
            }
        }
        if open_escape {
            out.push_str(&format!("\\f{}", self.regular));
        }

        let regular = self.regular.clone();
        self.set_font(&regular);
        debug!(target: "mantran::fonts", input = text, output = %out, "font rewrite");
        out
    }
}

/// Split one `\f`-introduced piece into selector and following text.
fn split_selector(piece: &str) -> (&str, &str) {
    if let Some(rest) = piece.strip_prefix('(') {
        let len = rest.chars().take(2).map(char::len_utf8).sum::<usize>();
        piece.split_at(1 + len)
    } else if piece.starts_with('[') {
        match piece.find(']') {
            Some(end) => piece.split_at(end + 1),
            None => (piece, ""),
        }
    } else {
        match piece.chars().next() {
            Some(c) => piece.split_at(c.len_utf8()),
            None => ("", ""),
        }
    }
}
