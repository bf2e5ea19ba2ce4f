//! Backslash canonicalization and comment handling.
//!
//! All escape knowledge lives here: the font-escape pattern, the
//! `\\` / `\.` normalization applied to every physical line, and the
//! splitting of trailing `\"` / `\#` comments together with the
//! generator-tool markers hiding in them.

use std::sync::LazyLock;

use regex::Regex;

/// One inline font escape: `\fX`, `\f(XX`, `\f[name]`, `\fP`, `\f[]`,
/// `\f1`..`\f4`. The capture holds everything after `\f`.
pub static FONT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\f(\[[^\]]*\]|\(..|.)").unwrap());

/// Canonicalize the backslashes of one physical line.
///
/// On macro lines one level of doubling is collapsed first (the request
/// parser already consumed one backslash). Everywhere `\\` becomes `\e`
/// so later passes can treat every remaining backslash as an escape
/// opener, and `\.` becomes a plain dot.
pub fn normalize(line: &str, opens_macro: bool) -> String {
    let mut s = if opens_macro {
        line.replace("\\\\", "\\")
    } else {
        line.to_string()
    };
    s = s.replace("\\\\", "\\e");
    s.replace("\\.", ".")
}

/// Does the first column open a request?
pub fn opens_macro(line: &str) -> bool {
    line.starts_with('.') || line.starts_with('\'')
}

/// What introduced a trailing comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentKind {
    /// `\"` — kept, re-emitted with the paragraph it belongs to.
    Kept,
    /// `\#` — groff's no-output comment, dropped.
    Dropped,
}

/// Split a trailing comment off a normalized line. Returns the code
/// portion and the comment, if any. Normalization has already collapsed
/// `\\` into `\e`, so every remaining `\"` / `\#` really is a comment.
pub fn split_comment(line: &str) -> (&str, Option<(CommentKind, &str)>) {
    let quoted = line.find("\\\"");
    let silent = line.find("\\#");
    let (pos, kind) = match (quoted, silent) {
        (Some(q), Some(s)) if s < q => (s, CommentKind::Dropped),
        (Some(q), _) => (q, CommentKind::Kept),
        (None, Some(s)) => (s, CommentKind::Dropped),
        (None, None) => return (line, None),
    };
    (&line[..pos], Some((kind, &line[pos + 2..])))
}

/// A recognized generator-tool marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeneratorMarker {
    /// The source format is translatable directly; working on the
    /// rendered man page is refused (exit 254).
    Reject(&'static str),
    /// Dubious provenance; the document is processed with a warning.
    Suspicious(&'static str),
}

const REJECTED_GENERATORS: &[&str] = &["Pod::Man", "docbook-to-man", "docbook2man", "db2man.xsl"];
const SUSPICIOUS_GENERATORS: &[&str] = &["help2man", "latex2man", "mtex2man", "DO NOT EDIT"];

/// Look for a generator marker inside a comment.
pub fn detect_generator(comment: &str) -> Option<GeneratorMarker> {
    for name in REJECTED_GENERATORS {
        if comment.contains(name) {
            return Some(GeneratorMarker::Reject(name));
        }
    }
    for name in SUSPICIOUS_GENERATORS {
        if comment.contains(name) {
            return Some(GeneratorMarker::Suspicious(name));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn doubled_backslash_becomes_e_escape() {
        assert_eq!(normalize(r"a\\b", false), r"a\eb");
    }

    #[test]
    fn macro_line_collapses_one_level_first() {
        // The request parser eats one backslash: \\ ends up plain \.
        assert_eq!(normalize(r".B a\\b", true), r".B a\b");
        // Four backslashes collapse to two, which then read as \e.
        assert_eq!(normalize(r".B a\\\\b", true), r".B a\eb");
    }

    #[test]
    fn escaped_dot_becomes_dot() {
        assert_eq!(normalize(r"foo\.conf", false), "foo.conf");
    }

    #[test]
    fn font_escape_regex_matches_all_forms() {
        for (input, sel) in [
            (r"\fB", "B"),
            (r"\fP", "P"),
            (r"\f1", "1"),
            (r"\f(CW", "(CW"),
            (r"\f[times]", "[times]"),
            (r"\f[]", "[]"),
        ] {
            let c = FONT_RE.captures(input).expect(input);
            assert_eq!(&c[1], sel, "for {input}");
        }
    }

    #[test]
    fn split_comment_finds_leftmost_marker() {
        let (code, comment) = split_comment(r#"text \" trailing note"#);
        assert_eq!(code, "text ");
        assert_eq!(comment, Some((CommentKind::Kept, " trailing note")));

        let (code, comment) = split_comment(r"text \# gone");
        assert_eq!(code, "text ");
        assert_eq!(comment, Some((CommentKind::Dropped, " gone")));

        let (code, comment) = split_comment("no comment here");
        assert_eq!(code, "no comment here");
        assert_eq!(comment, None);
    }

    #[test]
    fn literal_backslash_does_not_start_comment() {
        // \e" is a literal backslash followed by a quote, not a comment.
        let (code, comment) = split_comment(r"say \e(dq hi\e(dq now");
        assert_eq!(code, r"say \e(dq hi\e(dq now");
        assert_eq!(comment, None);
    }

    #[test]
    fn generator_markers_classify() {
        assert_eq!(
            detect_generator("Automatically generated by Pod::Man 4.14"),
            Some(GeneratorMarker::Reject("Pod::Man"))
        );
        assert_eq!(
            detect_generator("DO NOT EDIT! generated by help2man 1.48"),
            Some(GeneratorMarker::Suspicious("help2man"))
        );
        assert_eq!(detect_generator("hand written ages ago"), None);
    }
}
