//! Logical-line assembly.
//!
//! Physical lines are normalized, stripped of comments, and merged:
//! trailing backslashes continue a line, and an orphan `.B`/`.I` adopts
//! whatever follows it according to what that turns out to be.

use std::sync::LazyLock;

use regex::Regex;
use tracing::warn;

use super::Parser;
use super::escape::{self, CommentKind, GeneratorMarker};
use super::source::LineSource;
use crate::error::{ParseError, SourceRef};
use crate::macros::parse_invocation;

/// Conditionals and definitions pass through raw; their bodies are
/// arbitrary groff code the structural handlers collect themselves.
static RAW_PASSTHROUGH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[.'][ \t]*(if|ie|de)([ \t]|$)").unwrap());

/// A font escape carrying leading whitespace hides a paragraph-start
/// indent; the whitespace must come first. Group 1 is the whole escape
/// (group 2 its selector, from the embedded pattern), group 3 the
/// whitespace run.
static LEADING_FONT_WS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^({})([ \t]+)", escape::FONT_RE.as_str())).unwrap()
});

/// One assembled line, newline included, with the reference of its
/// first physical line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalLine {
    pub text: String,
    pub reference: SourceRef,
}

const SINGLE_FONT_MACROS: [&str; 2] = ["B", "I"];
const DOUBLE_FONT_MACROS: [&str; 6] = ["BI", "BR", "IB", "IR", "RB", "RI"];
const SECTION_BREAK_MACROS: [&str; 5] = ["SH", "TP", "P", "PP", "LP"];

impl Parser {
    /// Produce the next logical line, or `None` at end of input.
    pub(crate) fn next_logical(
        &mut self,
        source: &mut dyn LineSource,
    ) -> Result<Option<LogicalLine>, ParseError> {
        'fresh: loop {
            let Some((raw, reference)) = source.shift() else {
                return Ok(None);
            };
            if RAW_PASSTHROUGH_RE.is_match(&raw) {
                return Ok(Some(LogicalLine {
                    text: format!("{raw}\n"),
                    reference,
                }));
            }
            let is_macro = escape::opens_macro(&raw);
            let Some(mut line) = self.process_physical(&raw, is_macro, &reference)? else {
                continue;
            };

            loop {
                if line.ends_with('\\') {
                    line.pop();
                    let Some((raw2, ref2)) = source.shift() else {
                        break;
                    };
                    if let Some(code) = self.process_physical(&raw2, false, &ref2)? {
                        line.push_str(&code);
                    }
                    continue;
                }

                let letter = match line.trim_end() {
                    ".B" => 'B',
                    ".I" => 'I',
                    _ => break,
                };
                let Some((raw2, ref2)) = source.shift() else {
                    return Err(ParseError::DanglingFontModifier {
                        font_macro: letter.to_string(),
                        reference,
                    });
                };
                let next_is_macro = escape::opens_macro(&raw2);
                let Some(code2) = self.process_physical(&raw2, next_is_macro, &ref2)? else {
                    continue;
                };

                if !next_is_macro {
                    // Plain text: make it the single quoted argument of
                    // the font macro.
                    let quoted = code2.replace('"', "\\(dq");
                    line = format!(".{letter} \"{quoted}\"");
                    continue;
                }

                let (name2, rest2) = parse_invocation(&code2);
                if SINGLE_FONT_MACROS.contains(&name2) {
                    // The adopted macro keeps the font of its own
                    // arguments; the orphan's font stacks behind it.
                    line = if name2 == letter.to_string() {
                        code2.clone()
                    } else if rest2.is_empty() {
                        format!(".{name2}{letter}")
                    } else {
                        format!(".{name2}{letter} {rest2}")
                    };
                } else if DOUBLE_FONT_MACROS.contains(&name2) {
                    line = code2.clone();
                } else if SECTION_BREAK_MACROS.contains(&name2) {
                    let modified = format!(".{name2} \\f{letter}{rest2}");
                    source.unshift(modified, ref2);
                    continue 'fresh;
                } else if name2 == "IP" {
                    let modified = match rest2.strip_prefix('"') {
                        Some(tail) => format!(".IP \"\\f{letter}{tail}"),
                        None => format!(".IP \\f{letter}{rest2}"),
                    };
                    source.unshift(modified, ref2);
                    continue 'fresh;
                } else {
                    return Err(ParseError::FontModifierBeforeMacro {
                        font_macro: letter.to_string(),
                        next_macro: name2.to_string(),
                        reference: ref2,
                    });
                }
            }

            if !is_macro {
                line = LEADING_FONT_WS_RE.replace(&line, "${3}${1}").into_owned();
            }
            line.push('\n');
            return Ok(Some(LogicalLine { text: line, reference }));
        }
    }

    /// Normalize one physical line and route its comment. Returns `None`
    /// when nothing but a comment (or a bare `.`/`'`) was on the line.
    fn process_physical(
        &mut self,
        raw: &str,
        is_macro: bool,
        reference: &SourceRef,
    ) -> Result<Option<String>, ParseError> {
        let normalized = escape::normalize(raw, is_macro);
        let (code, comment) = escape::split_comment(&normalized);
        let mut kept: Option<&str> = None;
        if let Some((kind, text)) = comment {
            if let Some(marker) = escape::detect_generator(text) {
                match marker {
                    GeneratorMarker::Reject(generator) => {
                        return Err(ParseError::GeneratedFile {
                            generator: generator.to_string(),
                            reference: reference.clone(),
                        });
                    }
                    GeneratorMarker::Suspicious(generator) => {
                        warn!(
                            reference = %reference,
                            "input looks generated by {generator}; the original source would translate better"
                        );
                    }
                }
            }
            if kind == CommentKind::Kept {
                kept = Some(text);
            }
        }

        let bare = code.trim();
        if bare.is_empty() || bare == "." || bare == "'" {
            if let Some(text) = kept
                && !text.trim().is_empty()
            {
                self.comments.push_pending(text);
            }
            return Ok(None);
        }
        if let Some(text) = kept {
            if is_macro {
                self.comments.push_pending(text);
            } else {
                self.comments.attach(text);
            }
        }
        Ok(Some(code.to_string()))
    }
}
