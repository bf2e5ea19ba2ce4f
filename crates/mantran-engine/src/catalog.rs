//! The translation-catalog seam.
//!
//! The engine never reads or writes message databases itself; it hands
//! every translatable unit to a [`Catalog`] and pushes finished nroff
//! lines back through it.

use crate::error::SourceRef;

/// Per-unit options passed along with a message.
#[derive(Debug, Clone, Default)]
pub struct TranslateOptions {
    /// Whether the catalog may reflow the text.
    pub wrap: bool,
    /// Extractor comment attached to the unit (source comments).
    pub comment: Option<String>,
}

/// A translation catalog as seen from the parser.
pub trait Catalog {
    /// Hand one message unit over and get its translation back. Returns
    /// the msgid unchanged when no translation exists.
    fn translate(
        &mut self,
        msgid: &str,
        reference: &SourceRef,
        kind: &str,
        opts: TranslateOptions,
    ) -> String;

    /// Append a chunk (possibly several lines) to the output document.
    fn push_output(&mut self, chunk: &str);
}

/// One recorded message unit, as collected by [`ExtractCatalog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageUnit {
    pub msgid: String,
    pub reference: SourceRef,
    pub kind: String,
    pub wrap: bool,
    pub comment: Option<String>,
}

/// Identity catalog: records every unit it is asked about and translates
/// nothing. Used by the extract mode of the CLI and throughout the tests.
#[derive(Debug, Default)]
pub struct ExtractCatalog {
    pub units: Vec<MessageUnit>,
    pub output: String,
}

impl ExtractCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded msgids, in document order.
    pub fn msgids(&self) -> Vec<&str> {
        self.units.iter().map(|u| u.msgid.as_str()).collect()
    }
}

impl Catalog for ExtractCatalog {
    fn translate(
        &mut self,
        msgid: &str,
        reference: &SourceRef,
        kind: &str,
        opts: TranslateOptions,
    ) -> String {
        self.units.push(MessageUnit {
            msgid: msgid.to_string(),
            reference: reference.clone(),
            kind: kind.to_string(),
            wrap: opts.wrap,
            comment: opts.comment,
        });
        msgid.to_string()
    }

    fn push_output(&mut self, chunk: &str) {
        self.output.push_str(chunk);
    }
}

/// Catalog backed by an in-memory `msgid -> msgstr` map; unknown units
/// pass through untranslated. Used by the inject mode of the CLI.
#[derive(Debug, Default)]
pub struct MapCatalog {
    pub entries: std::collections::HashMap<String, String>,
    pub output: String,
}

impl MapCatalog {
    pub fn new(entries: std::collections::HashMap<String, String>) -> Self {
        Self {
            entries,
            output: String::new(),
        }
    }
}

impl Catalog for MapCatalog {
    fn translate(
        &mut self,
        msgid: &str,
        _reference: &SourceRef,
        _kind: &str,
        _opts: TranslateOptions,
    ) -> String {
        self.entries
            .get(msgid)
            .cloned()
            .unwrap_or_else(|| msgid.to_string())
    }

    fn push_output(&mut self, chunk: &str) {
        self.output.push_str(chunk);
    }
}
