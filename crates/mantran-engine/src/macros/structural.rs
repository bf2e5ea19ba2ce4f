//! Handlers for the macros that need more than a table entry.

use std::sync::LazyLock;

use regex::Regex;

use super::{Invocation, MacroHandler, expand_font_macro, parse_invocation};
use crate::catalog::{Catalog, TranslateOptions};
use crate::error::ParseError;
use crate::options::GroffCodePolicy;
use crate::parsing::Parser;
use crate::parsing::args::{quote_arg, split_args};
use crate::parsing::escape;
use crate::parsing::source::LineSource;
use crate::transform::inline_marker;

static EL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[.'][ \t]*el([ \t]|$)").unwrap());

/// `.TH title section date source manual` — the section stays
/// untranslated; the banner goes out first.
pub fn th(
    parser: &mut Parser,
    _source: &mut dyn LineSource,
    catalog: &mut dyn Catalog,
    inv: &Invocation<'_>,
) -> Result<(), ParseError> {
    parser.emit_banner(catalog);
    parser.install_man();

    let args = split_args(inv.args, &parser.nbs.clone(), &inv.reference)?;
    let mut fields = Vec::with_capacity(args.len());
    for (i, arg) in args.iter().enumerate() {
        // Field 1 is the section number or letter.
        if i == 1 || arg.is_empty() {
            fields.push(arg.clone());
        } else {
            fields.push(parser.translate_text(catalog, arg, &inv.reference, "TH", false, false)?);
        }
    }
    let quoted: Vec<String> = fields.iter().map(|f| format!("\"{f}\"")).collect();
    catalog.push_output(&format!(".TH {}\n", quoted.join(" ")));
    Ok(())
}

/// `.SH`/`.SS`, with the heading possibly on the following line.
pub fn section_heading(
    parser: &mut Parser,
    source: &mut dyn LineSource,
    catalog: &mut dyn Catalog,
    inv: &Invocation<'_>,
) -> Result<(), ParseError> {
    let args = split_args(inv.args, &parser.nbs.clone(), &inv.reference)?;
    if !args.is_empty() {
        let joined = args.join(" ");
        let translated =
            parser.translate_text(catalog, &joined, &inv.reference, inv.name, false, true)?;
        let quoted = quote_arg(&translated, &parser.nbs);
        catalog.push_output(&format!(".{} {quoted}\n", inv.name));
        return Ok(());
    }

    match parser.next_logical(source)? {
        None => catalog.push_output(&format!(".{}\n", inv.name)),
        Some(line) => {
            let body = line.text.trim_end_matches('\n');
            if escape::opens_macro(body) {
                source.unshift(body.to_string(), line.reference);
                catalog.push_output(&format!(".{}\n", inv.name));
            } else {
                let translated =
                    parser.translate_text(catalog, body, &line.reference, inv.name, false, true)?;
                let quoted = quote_arg(&translated, &parser.nbs);
                catalog.push_output(&format!(".{} {quoted}\n", inv.name));
            }
        }
    }
    Ok(())
}

/// `.TP`: the line after it (skipping `.PD`) is the tag, translated
/// without wrapping; the body flows as an ordinary paragraph.
pub fn tp(
    parser: &mut Parser,
    source: &mut dyn LineSource,
    catalog: &mut dyn Catalog,
    inv: &Invocation<'_>,
) -> Result<(), ParseError> {
    catalog.push_output(inv.raw);
    loop {
        let Some(line) = parser.next_logical(source)? else {
            break;
        };
        let body = line.text.trim_end_matches('\n').to_string();

        if escape::opens_macro(&body) {
            let (name, args) = parse_invocation(&body);
            if name == "PD" {
                catalog.push_output(&line.text);
                continue;
            }
            match parser.table.get(name).cloned() {
                Some(MacroHandler::Font { odd, even }) => {
                    let parsed = split_args(args, &parser.nbs.clone(), &line.reference)?;
                    let expanded = expand_font_macro(odd, even, &parsed);
                    let translated = parser.translate_text(
                        catalog,
                        &expanded,
                        &line.reference,
                        "TP",
                        false,
                        false,
                    )?;
                    catalog.push_output(&format!("{translated}\n"));
                }
                Some(MacroHandler::Inline) => {
                    let marked = inline_marker(&body);
                    let translated = parser.translate_text(
                        catalog,
                        &marked,
                        &line.reference,
                        "TP",
                        false,
                        false,
                    )?;
                    catalog.push_output(&format!("{translated}\n"));
                }
                _ => source.unshift(body, line.reference),
            }
        } else {
            let translated =
                parser.translate_text(catalog, &body, &line.reference, "TP", false, false)?;
            catalog.push_output(&format!("{translated}\n"));
        }
        break;
    }
    parser.fonts.reset_to_regular();
    Ok(())
}

/// `.IP tag [indent]` — the tag is translated, the indent preserved.
pub fn ip(
    parser: &mut Parser,
    _source: &mut dyn LineSource,
    catalog: &mut dyn Catalog,
    inv: &Invocation<'_>,
) -> Result<(), ParseError> {
    let args = split_args(inv.args, &parser.nbs.clone(), &inv.reference)?;
    if args.is_empty() {
        catalog.push_output(".IP\n");
        return Ok(());
    }
    let translated =
        parser.translate_text(catalog, &args[0], &inv.reference, "IP", false, false)?;
    let mut out = format!(".IP {}", quote_arg(&translated, &parser.nbs));
    if let Some(indent) = args.get(1) {
        out.push(' ');
        out.push_str(&quote_arg(indent, &parser.nbs));
    }
    out.push('\n');
    catalog.push_output(&out);
    Ok(())
}

/// `.UR url` — a lone `:` means "no URL", emitted untouched.
pub fn ur(
    parser: &mut Parser,
    _source: &mut dyn LineSource,
    catalog: &mut dyn Catalog,
    inv: &Invocation<'_>,
) -> Result<(), ParseError> {
    let args = split_args(inv.args, &parser.nbs.clone(), &inv.reference)?;
    let joined = args.join(" ");
    if joined == ":" {
        catalog.push_output(inv.raw);
        return Ok(());
    }
    let translated =
        parser.translate_text(catalog, &joined, &inv.reference, inv.name, false, false)?;
    catalog.push_output(&format!(
        ".{} {}\n",
        inv.name,
        quote_arg(&translated, &parser.nbs)
    ));
    Ok(())
}

/// `.de name` … `..` under the groff_code policy.
pub fn groff_definition(
    parser: &mut Parser,
    source: &mut dyn LineSource,
    catalog: &mut dyn Catalog,
    inv: &Invocation<'_>,
) -> Result<(), ParseError> {
    if parser.opts.groff_code == GroffCodePolicy::Fail {
        return Err(ParseError::GroffCodeForbidden {
            macro_name: inv.name.to_string(),
            reference: inv.reference.clone(),
        });
    }
    let mut block = inv.raw.to_string();
    while let Some((raw, _)) = source.shift() {
        block.push_str(&raw);
        block.push('\n');
        if raw.trim_end() == ".." {
            break;
        }
    }
    finish_groff_block(parser, catalog, &block, inv)
}

/// `.if`/`.ie` with brace-balanced bodies; `.ie` pulls its `.el`
/// counterpart into the same block.
pub fn groff_conditional(
    parser: &mut Parser,
    source: &mut dyn LineSource,
    catalog: &mut dyn Catalog,
    inv: &Invocation<'_>,
) -> Result<(), ParseError> {
    if parser.opts.groff_code == GroffCodePolicy::Fail {
        return Err(ParseError::GroffCodeForbidden {
            macro_name: inv.name.to_string(),
            reference: inv.reference.clone(),
        });
    }
    let mut block = String::new();
    collect_conditional(source, inv.raw.trim_end_matches('\n'), &mut block);
    if inv.name == "ie" {
        let Some((raw, _)) = source.shift() else {
            return Err(ParseError::MissingElseBranch {
                reference: inv.reference.clone(),
            });
        };
        if !EL_RE.is_match(&raw) {
            return Err(ParseError::MissingElseBranch {
                reference: inv.reference.clone(),
            });
        }
        collect_conditional(source, &raw, &mut block);
    }
    finish_groff_block(parser, catalog, &block, inv)
}

/// Append one conditional line plus, when it opens `\{` braces, the
/// lines up to brace balance.
fn collect_conditional(source: &mut dyn LineSource, first: &str, block: &mut String) {
    let mut balance = brace_balance(first);
    block.push_str(first);
    block.push('\n');
    while balance > 0 {
        let Some((raw, _)) = source.shift() else {
            break;
        };
        balance += brace_balance(&raw);
        block.push_str(&raw);
        block.push('\n');
    }
}

fn brace_balance(line: &str) -> i32 {
    line.matches("\\{").count() as i32 - line.matches("\\}").count() as i32
}

fn finish_groff_block(
    parser: &mut Parser,
    catalog: &mut dyn Catalog,
    block: &str,
    inv: &Invocation<'_>,
) -> Result<(), ParseError> {
    match parser.opts.groff_code {
        GroffCodePolicy::Verbatim => catalog.push_output(block),
        GroffCodePolicy::Translate => {
            // Groff code goes through untransformed: fonts and escapes
            // in there mean whatever groff says they mean.
            let translated = catalog.translate(
                block.trim_end_matches('\n'),
                &inv.reference,
                "groff code",
                TranslateOptions {
                    wrap: false,
                    comment: None,
                },
            );
            catalog.push_output(&format!("{translated}\n"));
        }
        GroffCodePolicy::Fail => unreachable!("checked by the callers"),
    }
    Ok(())
}

/// `.ds name value` — the value is translated under a type naming the
/// string, so cross-references stay findable in the catalog.
pub fn ds(
    parser: &mut Parser,
    _source: &mut dyn LineSource,
    catalog: &mut dyn Catalog,
    inv: &Invocation<'_>,
) -> Result<(), ParseError> {
    let (name, value) = match inv.args.split_once([' ', '\t']) {
        Some((name, value)) => (name, value.trim_start_matches([' ', '\t'])),
        None => (inv.args, ""),
    };
    let translated = parser.translate_text(
        catalog,
        value,
        &inv.reference,
        &format!("ds {name}"),
        false,
        false,
    )?;
    catalog.push_output(&format!(".ds {name} {translated}\n"));
    Ok(())
}

/// `.ig [name]` — everything up to the closing call passes through.
pub fn ig(
    _parser: &mut Parser,
    source: &mut dyn LineSource,
    catalog: &mut dyn Catalog,
    inv: &Invocation<'_>,
) -> Result<(), ParseError> {
    catalog.push_output(inv.raw);
    let end = inv.args.split_whitespace().next().unwrap_or("");
    let terminator = if end.is_empty() {
        "..".to_string()
    } else {
        format!(".{end}")
    };
    while let Some((raw, _)) = source.shift() {
        catalog.push_output(&format!("{raw}\n"));
        if raw.trim_end() == terminator {
            break;
        }
    }
    Ok(())
}

/// `.ta` — tab stops sometimes carry translatable text.
pub fn ta(
    _parser: &mut Parser,
    _source: &mut dyn LineSource,
    catalog: &mut dyn Catalog,
    inv: &Invocation<'_>,
) -> Result<(), ParseError> {
    let translated = catalog.translate(
        inv.args,
        &inv.reference,
        "ta",
        TranslateOptions {
            wrap: false,
            comment: None,
        },
    );
    catalog.push_output(&format!(".ta {translated}\n"));
    Ok(())
}

/// `.TS` … `.TE`: the format section passes through verbatim up to its
/// `.`-terminated last line; data cells are translated one by one.
pub fn table_block(
    parser: &mut Parser,
    source: &mut dyn LineSource,
    catalog: &mut dyn Catalog,
    inv: &Invocation<'_>,
) -> Result<(), ParseError> {
    catalog.push_output(inv.raw);
    while let Some((raw, _)) = source.shift() {
        catalog.push_output(&format!("{raw}\n"));
        if raw.trim_end().ends_with('.') {
            break;
        }
    }
    while let Some((raw, reference)) = source.shift() {
        if raw.trim_end() == ".TE" {
            catalog.push_output(&format!("{raw}\n"));
            break;
        }
        if raw.starts_with(['.', '\'']) {
            catalog.push_output(&format!("{raw}\n"));
            continue;
        }
        let row = escape::normalize(&raw, false);
        let mut cells = Vec::new();
        for cell in row.split('\t') {
            cells.push(parser.translate_text(
                catalog,
                cell,
                &reference,
                "tbl table",
                false,
                false,
            )?);
        }
        catalog.push_output(&format!("{}\n", cells.join("\t")));
    }
    Ok(())
}

/// `.so`/`.mso` — file inclusion is out of scope, and silently dropping
/// it would lose content.
pub fn inclusion(
    _parser: &mut Parser,
    _source: &mut dyn LineSource,
    _catalog: &mut dyn Catalog,
    inv: &Invocation<'_>,
) -> Result<(), ParseError> {
    Err(ParseError::Inclusion {
        macro_name: inv.name.to_string(),
        path: inv.args.split_whitespace().next().unwrap_or("").to_string(),
        reference: inv.reference.clone(),
    })
}

/// `.ft [font]` — update the stack; no argument means "previous".
pub fn ft(
    parser: &mut Parser,
    _source: &mut dyn LineSource,
    catalog: &mut dyn Catalog,
    inv: &Invocation<'_>,
) -> Result<(), ParseError> {
    match inv.args.split_whitespace().next() {
        None => parser.fonts.set_font("P"),
        Some(font) => parser.fonts.set_font(font),
    }
    catalog.push_output(inv.raw);
    Ok(())
}

/// `.ce`/`.ul`/`.cu` — a positive count means rendered-layout trickery
/// this transformer cannot reproduce.
pub fn counted_request(
    _parser: &mut Parser,
    _source: &mut dyn LineSource,
    catalog: &mut dyn Catalog,
    inv: &Invocation<'_>,
) -> Result<(), ParseError> {
    let count: i64 = inv
        .args
        .split_whitespace()
        .next()
        .map(|s| s.parse().unwrap_or(1))
        .unwrap_or(1);
    if count > 0 {
        return Err(ParseError::CountedRequest {
            macro_name: inv.name.to_string(),
            reference: inv.reference.clone(),
        });
    }
    catalog.push_output(inv.raw);
    Ok(())
}

/// `.ec` — changing the escape character would invalidate every pattern
/// in this parser.
pub fn ec(
    _parser: &mut Parser,
    _source: &mut dyn LineSource,
    catalog: &mut dyn Catalog,
    inv: &Invocation<'_>,
) -> Result<(), ParseError> {
    if inv.args.trim().is_empty() {
        catalog.push_output(inv.raw);
        return Ok(());
    }
    Err(ParseError::EscapeCharChange {
        argument: inv.args.trim().to_string(),
        reference: inv.reference.clone(),
    })
}

/// `.Dd date` — the mdoc opener: banner, dialect switch, date
/// translation.
pub fn dd(
    parser: &mut Parser,
    _source: &mut dyn LineSource,
    catalog: &mut dyn Catalog,
    inv: &Invocation<'_>,
) -> Result<(), ParseError> {
    parser.emit_banner(catalog);
    parser.install_mdoc();
    let args = split_args(inv.args, &parser.nbs.clone(), &inv.reference)?;
    if args.is_empty() {
        catalog.push_output(".Dd\n");
        return Ok(());
    }
    let joined = args.join(" ");
    let translated =
        parser.translate_text(catalog, &joined, &inv.reference, "Dd", false, false)?;
    catalog.push_output(&format!(".Dd {translated}\n"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::catalog::ExtractCatalog;
    use crate::error::ParseError;
    use crate::options::{GroffCodePolicy, Options};
    use crate::parsing::Parser;
    use pretty_assertions::assert_eq;

    fn extract_with(opts: Options, input: &str) -> Result<ExtractCatalog, ParseError> {
        let mut catalog = ExtractCatalog::new();
        let mut parser = Parser::new(opts);
        parser.process_str("test.1", input, &mut catalog)?;
        Ok(catalog)
    }

    fn extract(input: &str) -> ExtractCatalog {
        extract_with(Options::default(), input).expect("parse failure")
    }

    #[test]
    fn th_emits_banner_and_translates_all_but_the_section() {
        let cat = extract(".TH LS 1 \"March 2024\" GNU \"User Commands\"\n");
        assert!(cat.output.starts_with(".\\\"****"));
        assert!(cat.output.contains("generated with mantran"));
        assert!(
            cat.output
                .ends_with(".TH \"LS\" \"1\" \"March 2024\" \"GNU\" \"User Commands\"\n")
        );
        assert_eq!(cat.msgids(), vec!["LS", "March 2024", "GNU", "User Commands"]);
        assert_eq!(cat.output.matches("generated with mantran").count(), 1);
    }

    #[test]
    fn sh_translates_its_argument_as_a_bold_heading() {
        let cat = extract(".SH \"SEE ALSO\"\n");
        assert_eq!(cat.msgids(), vec!["SEE ALSO"]);
        assert_eq!(cat.output, ".SH \"SEE ALSO\"\n");
        assert_eq!(cat.units[0].kind, "SH");
        assert!(!cat.units[0].wrap);
    }

    #[test]
    fn sh_takes_its_heading_from_the_next_line() {
        let cat = extract(".SH\nDESCRIPTION\n");
        assert_eq!(cat.msgids(), vec!["DESCRIPTION"]);
        assert_eq!(cat.output, ".SH DESCRIPTION\n");
    }

    #[test]
    fn sh_puts_a_macro_line_back() {
        let cat = extract(".SH\n.PP\n");
        assert_eq!(cat.output, ".SH\n.PP\n");
        assert!(cat.units.is_empty());
    }

    #[test]
    fn tp_translates_the_font_macro_tag_separately_from_the_body() {
        let cat = extract(".TP\n.B \\-f\nforce the operation\n");
        assert_eq!(cat.msgids(), vec!["B<-f>", "force the operation"]);
        assert_eq!(cat.units[0].kind, "TP");
        assert!(!cat.units[0].wrap);
        assert!(cat.units[1].wrap);
        assert_eq!(cat.output, ".TP\n\\fB\\-f\\fR\nforce the operation\n");
    }

    #[test]
    fn tp_passes_pd_through_before_the_tag() {
        let cat = extract(".TP\n.PD 0\ntag text\nbody\n");
        assert_eq!(cat.msgids(), vec!["tag text", "body"]);
        assert!(cat.output.starts_with(".TP\n.PD 0\ntag text\n"));
    }

    #[test]
    fn tp_puts_other_macros_back_for_the_parser() {
        let cat = extract(".TP\n.PP\n");
        assert_eq!(cat.output, ".TP\n.PP\n");
    }

    #[test]
    fn ip_translates_tag_and_keeps_indent() {
        let cat = extract(".IP \"first step\" 4\n");
        assert_eq!(cat.msgids(), vec!["first step"]);
        assert_eq!(cat.output, ".IP \"first step\" 4\n");
    }

    #[test]
    fn ur_with_colon_stays_verbatim() {
        let cat = extract(".UR :\n.UE\n");
        assert!(cat.units.is_empty());
        assert_eq!(cat.output, ".UR :\n.UE\n");
    }

    #[test]
    fn ur_url_is_translated_joined() {
        let cat = extract(".UR https://example.org\n.UE\n");
        assert_eq!(cat.msgids(), vec!["https://example.org"]);
    }

    #[test]
    fn groff_code_fails_by_default() {
        let err = extract_with(Options::default(), ".de mymacro\n.ft B\n..\n").unwrap_err();
        assert!(matches!(err, ParseError::GroffCodeForbidden { .. }));
    }

    #[test]
    fn groff_definition_verbatim_keeps_the_block() {
        let opts = Options {
            groff_code: GroffCodePolicy::Verbatim,
            ..Options::default()
        };
        let cat = extract_with(opts, ".de mymacro\n.ft B\n\\fB\\\\$1\\fR\n..\ntext\n").unwrap();
        assert!(cat.output.starts_with(".de mymacro\n.ft B\n\\fB\\\\$1\\fR\n..\n"));
        assert_eq!(cat.msgids(), vec!["text"]);
    }

    #[test]
    fn groff_definition_translate_hands_the_block_over() {
        let opts = Options {
            groff_code: GroffCodePolicy::Translate,
            ..Options::default()
        };
        let cat = extract_with(opts, ".de mymacro\n.ft B\n..\n").unwrap();
        assert_eq!(cat.msgids(), vec![".de mymacro\n.ft B\n.."]);
        assert_eq!(cat.units[0].kind, "groff code");
        assert!(!cat.units[0].wrap);
    }

    #[test]
    fn conditional_block_collects_until_braces_balance() {
        let opts = Options {
            groff_code: GroffCodePolicy::Verbatim,
            ..Options::default()
        };
        let cat = extract_with(opts, ".if n \\{\n.ad l\n.\\}\ntext\n").unwrap();
        assert!(cat.output.starts_with(".if n \\{\n.ad l\n.\\}\n"));
        assert_eq!(cat.msgids(), vec!["text"]);
    }

    #[test]
    fn ie_pulls_its_el_branch_into_the_block() {
        let opts = Options {
            groff_code: GroffCodePolicy::Verbatim,
            ..Options::default()
        };
        let cat = extract_with(opts, ".ie n .ad l\n.el .ad b\ntext\n").unwrap();
        assert!(cat.output.starts_with(".ie n .ad l\n.el .ad b\n"));
    }

    #[test]
    fn ie_without_el_is_fatal() {
        let opts = Options {
            groff_code: GroffCodePolicy::Verbatim,
            ..Options::default()
        };
        let err = extract_with(opts, ".ie n .ad l\ntext\n").unwrap_err();
        assert!(matches!(err, ParseError::MissingElseBranch { .. }));
    }

    #[test]
    fn ds_value_is_translated_under_a_named_kind() {
        let cat = extract(".ds title The Whole Story\n");
        assert_eq!(cat.msgids(), vec!["The Whole Story"]);
        assert_eq!(cat.units[0].kind, "ds title");
        assert_eq!(cat.output, ".ds title The Whole Story\n");
    }

    #[test]
    fn ig_block_passes_through() {
        let cat = extract(".ig\nsome ignored text\n..\nvisible\n");
        assert!(cat.output.starts_with(".ig\nsome ignored text\n..\n"));
        assert_eq!(cat.msgids(), vec!["visible"]);
    }

    #[test]
    fn ig_with_name_ends_at_the_named_call() {
        let cat = extract(".ig yy\nhidden\n.yy\nshown\n");
        assert!(cat.output.starts_with(".ig yy\nhidden\n.yy\n"));
        assert_eq!(cat.msgids(), vec!["shown"]);
    }

    #[test]
    fn table_cells_are_translated_between_ts_and_te() {
        let input = ".TS\ntab(\t);\nl l.\nleft cell\tright cell\n.TE\n";
        let cat = extract(input);
        assert_eq!(cat.msgids(), vec!["left cell", "right cell"]);
        assert_eq!(cat.units[0].kind, "tbl table");
        assert!(cat.output.contains("left cell\tright cell\n.TE\n"));
    }

    #[test]
    fn so_inclusion_is_fatal() {
        let err = extract_with(Options::default(), ".so man7/other.7\n").unwrap_err();
        assert!(matches!(err, ParseError::Inclusion { .. }));
    }

    #[test]
    fn ce_with_positive_count_is_fatal_but_zero_passes() {
        let err = extract_with(Options::default(), ".ce 2\ncentered\n").unwrap_err();
        assert!(matches!(err, ParseError::CountedRequest { .. }));
        let cat = extract(".ce 0\ntext\n");
        assert!(cat.output.starts_with(".ce 0\n"));
    }

    #[test]
    fn ec_with_argument_is_fatal() {
        let err = extract_with(Options::default(), ".ec @\n").unwrap_err();
        assert!(matches!(err, ParseError::EscapeCharChange { .. }));
        let cat = extract(".ec\ntext\n");
        assert!(cat.output.starts_with(".ec\n"));
    }

    #[test]
    fn dd_switches_to_mdoc_and_folds_inline_macros() {
        let cat = extract(".Dd March 2, 2024\n.Sh NAME\nthe\n.Nm prog\ntool\n");
        assert!(cat.output.contains(".Dd March 2, 2024\n"));
        assert_eq!(
            cat.msgids(),
            vec!["March 2, 2024", "NAME", "the\nE<.Nm prog>\ntool"]
        );
        let out_tail = cat.output.split(".Sh").nth(1).unwrap();
        assert!(out_tail.contains("\n.Nm prog\n"));
    }
}
