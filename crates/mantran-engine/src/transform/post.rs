//! Translator surface form → nroff.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::{MACRO_LINE_MARK, TransformContext};
use crate::error::ParseError;

/// Surface markers and the fonts they expand to.
const FONT_TOKENS: &[(&str, &str)] = &[("B<", "B"), ("I<", "I"), ("R<", "R"), ("CW<", "(CW")];

static E_INLINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"E<\.[^>]*>").unwrap());

static E_MACRO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]*E<\.([^>]*)>([.,;:)\]])?([ \t]*)(\n)?").unwrap());

/// Font escapes at the head of a line, with a control character behind
/// them that needs the zero-width guard.
static FONT_THEN_DOT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^((?:\\f(?:\(..|\[[^\]]*\]|.))+)([.'])").unwrap());

/// Convert a translated message back into nroff.
pub fn post_translate(ctx: &mut TransformContext<'_>, text: &str) -> Result<String, ParseError> {
    let mut s = escape_hyphens(&text.replace("\\-", "-"));

    // Newlines inside an inline macro would split its invocation.
    s = E_INLINE_RE
        .replace_all(&s, |c: &regex::Captures<'_>| c[0].replace('\n', " "))
        .into_owned();

    s = expand_font_markup(&s, 0, ctx)?;

    let mdoc = ctx.mdoc;
    s = E_MACRO_RE
        .replace_all(&s, |c: &regex::Captures<'_>| {
            let args = &c[1];
            match (mdoc, c.get(2)) {
                // mdoc macros take trailing punctuation as an argument.
                (true, Some(p)) => format!("\n{MACRO_LINE_MARK}.{args} {}\n", p.as_str()),
                // Elsewhere the punctuation is plain text; it keeps its
                // spacing and starts the continuation line.
                (false, Some(p)) => format!(
                    "\n{MACRO_LINE_MARK}.{args}\n{}{}{}",
                    p.as_str(),
                    &c[3],
                    c.get(4).map_or("", |m| m.as_str()),
                ),
                (_, None) => format!("\n{MACRO_LINE_MARK}.{args}\n"),
            }
        })
        .into_owned();
    // The marker may have landed right after an existing line break.
    let doubled = format!("\n\n{MACRO_LINE_MARK}");
    let single = format!("\n{MACRO_LINE_MARK}");
    s = s.replace(&doubled, &single);

    s = s.replace("E<gt>", ">").replace("E<lt>", "<");
    if !ctx.mdoc {
        s = s.replace("``", "\\*(lq").replace("''", "\\*(rq");
    }

    s = guard_first_column(&s);

    s = s.replace('\u{00A0}', "\\ ");
    if !ctx.nbs.is_empty() {
        s = s.replace(ctx.nbs, "\\ ");
    }
    s = s.replace("\\ \n", "\\ ");

    debug!(target: "mantran::postrans", input = text, output = %s, "post-transform");
    Ok(s)
}

/// Re-escape hyphens, leaving alone the contexts where a dash is part of
/// an escape: font sizes (`\s-1`), glyph names (`\(em`), horizontal
/// motions (`\h'-3'`) and anything directly behind a backslash.
fn escape_hyphens(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '-' {
            out.push_str("\\-");
            continue;
        }
        if c != '\\' {
            out.push(c);
            continue;
        }
        out.push('\\');
        match chars.next() {
            Some('s') => {
                out.push('s');
                if matches!(chars.peek(), Some('+' | '-')) {
                    out.push(chars.next().unwrap());
                }
                while matches!(chars.peek(), Some(d) if d.is_ascii_digit()) {
                    out.push(chars.next().unwrap());
                }
            }
            Some('(') => {
                out.push('(');
                for _ in 0..2 {
                    if let Some(g) = chars.next() {
                        out.push(g);
                    }
                }
            }
            Some('h') => {
                out.push('h');
                if chars.peek() == Some(&'\'') {
                    out.push(chars.next().unwrap());
                    for q in chars.by_ref() {
                        out.push(q);
                        if q == '\'' {
                            break;
                        }
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Expand `B<…>`, `I<…>`, `R<…>` and `CW<…>` into font escapes. Nesting
/// is tracked with a bracket counter; the innermost close restores the
/// previous font, the outermost the regular one.
fn expand_font_markup(
    s: &str,
    depth: usize,
    ctx: &TransformContext<'_>,
) -> Result<String, ParseError> {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    loop {
        let mut earliest: Option<(usize, &str, &str)> = None;
        for (token, font) in FONT_TOKENS {
            if let Some(pos) = rest.find(token)
                && earliest.is_none_or(|(best, _, _)| pos < best)
            {
                earliest = Some((pos, token, font));
            }
        }
        let Some((pos, token, font)) = earliest else {
            out.push_str(rest);
            return Ok(out);
        };
        out.push_str(&rest[..pos]);
        let after = &rest[pos + token.len()..];

        let mut level = 1u32;
        let mut close = None;
        for (i, c) in after.char_indices() {
            match c {
                '<' => level += 1,
                '>' => {
                    level -= 1;
                    if level == 0 {
                        close = Some(i);
                        break;
                    }
                }
                _ => {}
            }
        }
        let Some(close) = close else {
            return Err(ParseError::UnbalancedMarkup {
                message: s.to_string(),
                reference: ctx.reference.clone(),
            });
        };

        let inner = expand_font_markup(&after[..close], depth + 1, ctx)?;
        out.push_str("\\f");
        out.push_str(font);
        out.push_str(&inner);
        if depth == 0 {
            out.push_str("\\f");
            out.push_str(ctx.fonts.regular());
        } else {
            out.push_str("\\fP");
        }
        rest = &after[close + 1..];
    }
}

/// Prefix `\&` to lines that would otherwise open a request by accident.
/// On a continuation line the zero-width escape cannot be used; a space
/// is inserted instead, which renders slightly differently.
fn guard_first_column(s: &str) -> String {
    let mut out = Vec::new();
    let mut prev_continues = false;
    for line in s.split('\n') {
        let guarded = if let Some(stripped) = line.strip_prefix(MACRO_LINE_MARK) {
            stripped.to_string()
        } else if line.starts_with('.') || line.starts_with('\'') {
            if prev_continues {
                format!(" {line}")
            } else {
                format!("\\&{line}")
            }
        } else {
            FONT_THEN_DOT_RE
                .replace(line, "${1}\\&${2}")
                .into_owned()
        };
        prev_continues = guarded.ends_with('\\') && !guarded.ends_with("\\\\");
        out.push(guarded);
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceRef;
    use crate::parsing::fonts::FontStack;
    use pretty_assertions::assert_eq;

    fn run(text: &str, mdoc: bool) -> Result<String, ParseError> {
        let mut fonts = FontStack::new();
        let reference = SourceRef::new("t.1", 1);
        let mut ctx = TransformContext {
            fonts: &mut fonts,
            mdoc,
            nbs: "\u{00A0}",
            reference: &reference,
        };
        post_translate(&mut ctx, text)
    }

    fn post(text: &str) -> String {
        run(text, false).unwrap()
    }

    #[test]
    fn bold_markup_expands_and_closes_to_regular() {
        assert_eq!(post("B<bonjour monde>"), "\\fBbonjour monde\\fR");
    }

    #[test]
    fn alternating_markup_expands_run_by_run() {
        assert_eq!(
            post("B<foo>I<bar>B<baz>"),
            "\\fBfoo\\fR\\fIbar\\fR\\fBbaz\\fR"
        );
    }

    #[test]
    fn nested_markup_restores_previous_font() {
        assert_eq!(post("B<a I<b> c>"), "\\fBa \\fIb\\fP c\\fR");
    }

    #[test]
    fn cw_markup_uses_paren_font() {
        assert_eq!(post("CW<code>"), "\\f(CWcode\\fR");
    }

    #[test]
    fn unbalanced_markup_is_fatal() {
        let err = run("B<oops", false).unwrap_err();
        assert!(matches!(err, ParseError::UnbalancedMarkup { .. }));
    }

    #[test]
    fn hyphens_are_reescaped() {
        assert_eq!(post("opt -f"), "opt \\-f");
        // Translator-typed \- does not double up.
        assert_eq!(post("opt \\-f"), "opt \\-f");
    }

    #[test]
    fn hyphens_in_escape_contexts_stay_plain() {
        assert_eq!(post("\\s-2small\\s0 a-b"), "\\s-2small\\s0 a\\-b");
        assert_eq!(post("\\(em dash-like"), "\\(em dash\\-like");
        assert_eq!(post("\\h'-3'x-y"), "\\h'-3'x\\-y");
    }

    #[test]
    fn angle_bracket_entities_decode_last() {
        assert_eq!(post("a E<lt>tagE<gt> b"), "a <tag> b");
    }

    #[test]
    fn ascii_quotes_return_to_glyphs() {
        assert_eq!(post("``quoted''"), "\\*(lqquoted\\*(rq");
        assert_eq!(run("``quoted''", true).unwrap(), "``quoted''");
    }

    #[test]
    fn inline_macro_moves_to_its_own_line() {
        assert_eq!(post("see E<.Xr ls 1> now"), "see\n.Xr ls 1\nnow");
    }

    #[test]
    fn inline_macro_newline_is_collapsed() {
        assert_eq!(post("see E<.Xr\nls 1> now"), "see\n.Xr ls 1\nnow");
    }

    #[test]
    fn mdoc_punctuation_returns_into_the_macro_line() {
        assert_eq!(run("see E<.Xr ls 1>,\nmore", true).unwrap(), "see\n.Xr ls 1 ,\nmore");
    }

    #[test]
    fn first_column_dot_gets_zero_width_guard() {
        assert_eq!(post("ok\n.rm is dangerous"), "ok\n\\&.rm is dangerous");
        assert_eq!(post("'quote start"), "\\&'quote start");
    }

    #[test]
    fn dot_behind_leading_font_escape_is_guarded() {
        assert_eq!(post("I<.conf>\nrest"), "\\fI\\&.conf\\fR\nrest");
    }

    #[test]
    fn continuation_line_uses_degraded_space_guard() {
        assert_eq!(post("one\\\n.two"), "one\\\n .two");
    }

    #[test]
    fn non_breaking_spaces_encode_and_absorb_newline() {
        assert_eq!(post("a\u{00A0}b"), "a\\ b");
        assert_eq!(post("a\\ \nb"), "a\\ b");
    }
}
