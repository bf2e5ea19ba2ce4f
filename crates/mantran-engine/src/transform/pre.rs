//! nroff → translator surface form.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::{INLINE_MARK, TransformContext};
use crate::error::ParseError;

static INLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("{INLINE_MARK}:(.*?):{INLINE_MARK}")).unwrap());

/// Punctuation that mdoc macros accept as a trailing argument; it is
/// moved outside the `E<…>` marker so the translator keeps seeing it.
static MDOC_PUNCT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*) ([.,;:)\]])$").unwrap());

/// What the pre-transform produced: newlines stripped off the front go
/// straight to the output stream, the rest becomes the msgid.
#[derive(Debug, PartialEq, Eq)]
pub struct PreOutcome {
    pub emitted_prefix: String,
    pub msgid: String,
}

/// Convert one paragraph of nroff into the surface form handed to the
/// catalog. `heading` switches the regular font to bold for the duration
/// (`.SH`/`.SS` text).
pub fn pre_translate(
    ctx: &mut TransformContext<'_>,
    text: &str,
    heading: bool,
) -> Result<PreOutcome, ParseError> {
    if text.contains("\\c") {
        return Err(ParseError::ContinuationEscape {
            reference: ctx.reference.clone(),
        });
    }

    let mut s = text.replace('>', "E<gt>").replace('<', "E<lt>");
    // Replacing < hit the E<gt> tokens just inserted; undo that.
    s = s.replace("EE<lt>gt>", "E<gt>");

    let mdoc = ctx.mdoc;
    s = INLINE_RE
        .replace_all(&s, |c: &regex::Captures<'_>| {
            let inner = &c[1];
            if mdoc && let Some(m) = MDOC_PUNCT_RE.captures(inner) {
                format!("E<{}>{}", &m[1], &m[2])
            } else {
                format!("E<{inner}>")
            }
        })
        .into_owned();

    if heading {
        ctx.fonts.set_regular("B");
    }
    s = ctx.fonts.do_fonts(&s);
    if heading {
        ctx.fonts.set_regular("R");
    }

    let body_start = s.len() - s.trim_start_matches('\n').len();
    let emitted_prefix = s[..body_start].to_string();
    s = s[body_start..].to_string();

    if !ctx.mdoc {
        s = s
            .replace("\\-", "-")
            .replace("\\*(lq", "``")
            .replace("\\*(rq", "''")
            .replace("\\(dq", "\"");
    }

    if !ctx.nbs.is_empty() {
        s = s.replace(ctx.nbs, "\\ ");
    }

    debug!(target: "mantran::pretrans", input = text, msgid = %s, "pre-transform");
    Ok(PreOutcome {
        emitted_prefix,
        msgid: s,
    })
}
