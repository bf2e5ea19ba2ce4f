//! The parser: per-document state and the main pull loop.
//!
//! One [`Parser`] processes one document: the line reader feeds macro
//! dispatch or the paragraph accumulator, and everything a translator
//! should see funnels through pre-transform → catalog → post-transform
//! → output.

pub mod args;
pub mod escape;
pub mod fonts;
pub mod paragraph;
pub mod reader;
pub mod source;

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::catalog::{Catalog, TranslateOptions};
use crate::error::{ParseError, SourceRef};
use crate::macros::{
    self, Invocation, MacroHandler, MacroTable, expand_font_macro, parse_invocation,
};
use crate::options::Options;
use crate::transform::{TransformContext, inline_marker, post, pre};
use fonts::FontStack;
use paragraph::{CommentBuffers, ParagraphBuffer, WrapMode};
use reader::LogicalLine;
use source::{DocumentSource, LineSource};

/// Comment block emitted once, right before the first `.TH` or `.Dd`.
const BANNER: &str = "\
.\\\"*******************************************************************
.\\\"
.\\\" This file was generated with mantran. Translate the source file.
.\\\"
.\\\"*******************************************************************
";

/// Catalog kind for plain body paragraphs.
const PLAIN_TEXT: &str = "Plain text";

/// All the state of one document pass.
pub struct Parser {
    pub(crate) opts: Options,
    pub(crate) table: MacroTable,
    pub(crate) fonts: FontStack,
    pub(crate) wrap: WrapMode,
    pub(crate) paragraph: ParagraphBuffer,
    pub(crate) comments: CommentBuffers,
    pub(crate) mdoc: bool,
    /// Non-breaking-space sentinel; guaranteed absent from the input.
    pub(crate) nbs: String,
    pub(crate) no_wrap_begin: HashSet<String>,
    pub(crate) no_wrap_end: HashSet<String>,
    pub(crate) banner_done: bool,
}

impl Parser {
    pub fn new(opts: Options) -> Self {
        let (no_wrap_begin, no_wrap_end) = macros::no_wrap_sets();
        let mut parser = Self {
            opts,
            table: macros::man_table(),
            fonts: FontStack::new(),
            wrap: WrapMode::Yes,
            paragraph: ParagraphBuffer::default(),
            comments: CommentBuffers::default(),
            mdoc: false,
            nbs: "\u{00A0}".to_string(),
            no_wrap_begin,
            no_wrap_end,
            banner_done: false,
        };
        parser.apply_option_lists();
        parser
    }

    /// Process a whole document held in memory. Picks a sentinel that
    /// cannot collide with the input, then runs the pull loop.
    pub fn process_str(
        &mut self,
        path: &str,
        text: &str,
        catalog: &mut dyn Catalog,
    ) -> Result<(), ParseError> {
        let mut source = DocumentSource::from_str(path, text);
        self.nbs = choose_sentinel(&source);
        self.run(&mut source, catalog)
    }

    /// The pull loop over an arbitrary line supply. Callers going through
    /// this entry point keep the default `\u{00A0}` sentinel.
    pub fn run(
        &mut self,
        source: &mut dyn LineSource,
        catalog: &mut dyn Catalog,
    ) -> Result<(), ParseError> {
        while let Some(line) = self.next_logical(source)? {
            self.handle_line(&line, source, catalog)?;
        }
        self.flush(catalog)?;
        for comment in self.comments.drain() {
            catalog.push_output(&format!(".\\\"{comment}\n"));
        }
        Ok(())
    }

    fn handle_line(
        &mut self,
        line: &LogicalLine,
        source: &mut dyn LineSource,
        catalog: &mut dyn Catalog,
    ) -> Result<(), ParseError> {
        let text = line.text.as_str();
        let body = text.trim_end_matches('\n');

        if body.trim().is_empty() {
            self.flush(catalog)?;
            catalog.push_output(text);
            return Ok(());
        }

        if escape::opens_macro(body) {
            return self.dispatch(line, source, catalog);
        }

        // A leading-whitespace line turns wrapping off for this paragraph.
        if body.starts_with([' ', '\t']) && self.wrap == WrapMode::Yes {
            self.wrap = WrapMode::No;
        }
        self.paragraph.push_line(text, &line.reference);
        Ok(())
    }

    fn dispatch(
        &mut self,
        line: &LogicalLine,
        source: &mut dyn LineSource,
        catalog: &mut dyn Catalog,
    ) -> Result<(), ParseError> {
        let body = line.text.trim_end_matches('\n');
        let (name, args_str) = parse_invocation(body);
        let inv = Invocation {
            name,
            args: args_str,
            raw: &line.text,
            reference: line.reference.clone(),
        };
        debug!(reference = %inv.reference, name, "dispatching macro");

        if self.no_wrap_begin.contains(name) {
            self.flush(catalog)?;
            self.wrap = WrapMode::MacroNo;
            catalog.push_output(&line.text);
            return Ok(());
        }
        if self.no_wrap_end.contains(name) {
            self.flush(catalog)?;
            self.wrap = WrapMode::Yes;
            catalog.push_output(&line.text);
            return Ok(());
        }

        let handler = self.table.get(name).cloned();
        match handler {
            // Font and inline macros continue the paragraph.
            Some(MacroHandler::Font { odd, even }) => {
                let parsed = args::split_args(args_str, &self.nbs, &inv.reference)?;
                let expanded = expand_font_macro(odd, even, &parsed);
                self.paragraph
                    .push_line(&format!("{expanded}\n"), &inv.reference);
                return Ok(());
            }
            Some(MacroHandler::Inline) => {
                self.paragraph
                    .push_line(&format!("{}\n", inline_marker(body)), &inv.reference);
                return Ok(());
            }
            _ => {}
        }

        self.flush(catalog)?;
        match handler {
            Some(MacroHandler::Untranslated) => catalog.push_output(&line.text),
            Some(MacroHandler::NoArg) => {
                if !args_str.is_empty() {
                    warn!(reference = %inv.reference, "macro .{name} takes no argument, ignoring {args_str:?}");
                }
                catalog.push_output(&format!(".{name}\n"));
            }
            Some(MacroHandler::TranslateJoined) => self.translate_joined(&inv, catalog)?,
            Some(MacroHandler::TranslateEach { keep_first }) => {
                self.translate_each(&inv, keep_first, catalog)?;
            }
            Some(MacroHandler::Structural(handler)) => handler(self, source, catalog, &inv)?,
            Some(MacroHandler::Font { .. }) | Some(MacroHandler::Inline) => unreachable!(),
            None if !self.mdoc && macros::is_mdoc_name(name) => {
                return Err(ParseError::UnexpectedMdoc {
                    name: name.to_string(),
                    reference: inv.reference,
                });
            }
            None => {
                return Err(ParseError::UnknownMacro {
                    name: name.to_string(),
                    reference: inv.reference,
                });
            }
        }

        if macros::is_font_reset(name) {
            self.fonts.reset_to_regular();
        }
        Ok(())
    }

    fn translate_joined(
        &mut self,
        inv: &Invocation<'_>,
        catalog: &mut dyn Catalog,
    ) -> Result<(), ParseError> {
        let parsed = args::split_args(inv.args, &self.nbs.clone(), &inv.reference)?;
        if parsed.is_empty() {
            catalog.push_output(&format!(".{}\n", inv.name));
            return Ok(());
        }
        let joined = parsed.join(" ");
        let translated =
            self.translate_text(catalog, &joined, &inv.reference, inv.name, false, false)?;
        let quoted = args::quote_arg(&translated, &self.nbs);
        catalog.push_output(&format!(".{} {quoted}\n", inv.name));
        Ok(())
    }

    fn translate_each(
        &mut self,
        inv: &Invocation<'_>,
        keep_first: bool,
        catalog: &mut dyn Catalog,
    ) -> Result<(), ParseError> {
        let parsed = args::split_args(inv.args, &self.nbs.clone(), &inv.reference)?;
        if parsed.is_empty() {
            catalog.push_output(&format!(".{}\n", inv.name));
            return Ok(());
        }
        let mut emitted = Vec::with_capacity(parsed.len());
        for (i, arg) in parsed.iter().enumerate() {
            if i == 0 && keep_first {
                emitted.push(args::quote_arg(arg, &self.nbs));
                continue;
            }
            let translated =
                self.translate_text(catalog, arg, &inv.reference, inv.name, false, false)?;
            emitted.push(args::quote_arg(&translated, &self.nbs));
        }
        catalog.push_output(&format!(".{} {}\n", inv.name, emitted.join(" ")));
        Ok(())
    }

    /// Run one string through pre-transform → catalog → post-transform.
    pub(crate) fn translate_text(
        &mut self,
        catalog: &mut dyn Catalog,
        text: &str,
        reference: &SourceRef,
        kind: &str,
        wrap: bool,
        heading: bool,
    ) -> Result<String, ParseError> {
        self.translate_with_comment(catalog, text, reference, kind, wrap, heading, None)
    }

    fn translate_with_comment(
        &mut self,
        catalog: &mut dyn Catalog,
        text: &str,
        reference: &SourceRef,
        kind: &str,
        wrap: bool,
        heading: bool,
        comment: Option<String>,
    ) -> Result<String, ParseError> {
        let mut ctx = TransformContext {
            fonts: &mut self.fonts,
            mdoc: self.mdoc,
            nbs: &self.nbs,
            reference,
        };
        let outcome = pre::pre_translate(&mut ctx, text, heading)?;
        if !outcome.emitted_prefix.is_empty() {
            catalog.push_output(&outcome.emitted_prefix);
        }
        if outcome.msgid.is_empty() {
            return Ok(String::new());
        }
        let translated = catalog.translate(
            &outcome.msgid,
            reference,
            kind,
            TranslateOptions { wrap, comment },
        );
        let mut ctx = TransformContext {
            fonts: &mut self.fonts,
            mdoc: self.mdoc,
            nbs: &self.nbs,
            reference,
        };
        post::post_translate(&mut ctx, &translated)
    }

    /// Flush the accumulated paragraph, comments first.
    pub(crate) fn flush(&mut self, catalog: &mut dyn Catalog) -> Result<(), ParseError> {
        let Some((text, reference)) = self.paragraph.take() else {
            self.wrap = self.wrap.after_flush();
            return Ok(());
        };
        let comments = self.comments.drain();
        let comment = if comments.is_empty() {
            None
        } else {
            Some(comments.join("\n"))
        };
        for line in &comments {
            catalog.push_output(&format!(".\\\"{line}\n"));
        }
        let wrap = self.wrap.allows_wrap();
        let body = text.trim_end_matches('\n');
        let translated = self.translate_with_comment(
            catalog, body, &reference, PLAIN_TEXT, wrap, false, comment,
        )?;
        if !translated.is_empty() {
            catalog.push_output(&format!("{translated}\n"));
        }
        self.wrap = self.wrap.after_flush();
        Ok(())
    }

    /// Emit the generated-file banner, exactly once.
    pub(crate) fn emit_banner(&mut self, catalog: &mut dyn Catalog) {
        if !self.banner_done {
            catalog.push_output(BANNER);
            self.banner_done = true;
        }
    }

    /// Back to the man(7) table (a `.TH` after mdoc content).
    pub(crate) fn install_man(&mut self) {
        self.mdoc = false;
        self.table = macros::man_table();
        self.apply_option_lists();
    }

    /// Switch to the mdoc dialect: new table, `Bd`/`Ed` join the
    /// no-wrap sets, user overlays reapply.
    pub(crate) fn install_mdoc(&mut self) {
        self.mdoc = true;
        self.table = macros::mdoc::mdoc_table();
        self.no_wrap_begin.insert("Bd".to_string());
        self.no_wrap_end.insert("Ed".to_string());
        self.apply_option_lists();
        if self.opts.verbose {
            info!("switching to the mdoc dialect");
        }
    }

    /// Overlay the user macro lists onto the active table.
    fn apply_option_lists(&mut self) {
        let opts = self.opts.clone();
        for name in &opts.untranslated {
            self.table.insert(name.clone(), MacroHandler::Untranslated);
        }
        for name in &opts.noarg {
            self.table.insert(name.clone(), MacroHandler::NoArg);
        }
        for name in &opts.translate_joined {
            self.table
                .insert(name.clone(), MacroHandler::TranslateJoined);
        }
        for name in &opts.translate_each {
            self.table
                .insert(name.clone(), MacroHandler::TranslateEach { keep_first: false });
        }
        for name in &opts.inline {
            self.table.insert(name.clone(), MacroHandler::Inline);
        }
        for pair in &opts.no_wrap {
            self.no_wrap_begin.insert(pair.begin.clone());
            self.no_wrap_end.insert(pair.end.clone());
        }
    }
}

/// Pick a sentinel guaranteed not to occur in the document: the real
/// non-breaking space when possible, an improbable ASCII token grown
/// until absent otherwise.
fn choose_sentinel(source: &DocumentSource) -> String {
    if !source.contains("\u{00A0}") {
        return "\u{00A0}".to_string();
    }
    let mut token = "MANTRAN:NBSP".to_string();
    while source.contains(&token) {
        token.push('~');
    }
    token
}
