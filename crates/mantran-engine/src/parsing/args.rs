//! Macro-argument splitting.
//!
//! Arguments are separated by unquoted runs of blanks. A double-quoted
//! region is one argument; `""` inside it is a literal quote, kept as
//! `\(dq` so it survives requoting. `\ ` is an escaped (non-breaking)
//! space: it joins its neighbours into one argument and is carried as
//! the document's sentinel until the argument is emitted again.

use tracing::debug;

use crate::error::{ParseError, SourceRef};

/// Split a macro's argument string.
pub fn split_args(
    input: &str,
    nbs: &str,
    reference: &SourceRef,
) -> Result<Vec<String>, ParseError> {
    let mut args: Vec<String> = Vec::new();
    let mut cur = String::new();
    // An empty quoted argument must survive even though `cur` is empty.
    let mut have_cur = false;
    let mut in_quote = false;

    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quote => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    cur.push_str("\\(dq");
                } else {
                    in_quote = false;
                }
            }
            '"' if !have_cur && cur.is_empty() => {
                in_quote = true;
                have_cur = true;
            }
            ' ' | '\t' if !in_quote => {
                if have_cur || !cur.is_empty() {
                    args.push(std::mem::take(&mut cur));
                    have_cur = false;
                }
            }
            '\\' => match chars.next() {
                Some(' ') => {
                    cur.push_str(nbs);
                    have_cur = true;
                }
                Some(next) => {
                    cur.push('\\');
                    cur.push(next);
                    have_cur = true;
                }
                None => {
                    return Err(ParseError::TrailingEscapedSpace {
                        reference: reference.clone(),
                    });
                }
            },
            _ => {
                cur.push(c);
                have_cur = true;
            }
        }
    }
    if have_cur || !cur.is_empty() {
        args.push(cur);
    }

    if let Some(last) = args.last()
        && !nbs.is_empty()
        && last.ends_with(nbs)
    {
        return Err(ParseError::TrailingEscapedSpace {
            reference: reference.clone(),
        });
    }

    debug!(target: "mantran::splitargs", input, ?args, "split macro arguments");
    Ok(args)
}

/// Requote one argument for emission on a macro line. The sentinel turns
/// back into an escaped space; arguments with blanks (or none at all)
/// get surrounding quotes.
pub fn quote_arg(arg: &str, nbs: &str) -> String {
    let restored = if nbs.is_empty() {
        arg.to_string()
    } else {
        arg.replace(nbs, "\\ ")
    };
    if restored.is_empty() {
        "\"\"".to_string()
    } else if restored.contains(' ') || restored.contains('\t') {
        format!("\"{restored}\"")
    } else {
        restored
    }
}
