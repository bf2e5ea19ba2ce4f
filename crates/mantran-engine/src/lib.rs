/*!
 * # mantran engine
 *
 * Bidirectional converter between nroff/man source and a catalog of
 * translatable message units: man pages go in, every human-visible
 * segment is offered to a [`Catalog`] in a normalized surface form
 * (`B<…>`, `I<…>`, `E<lt>`, `E<.macro …>`), and the translations are
 * re-injected into a faithful nroff reproduction of the original.
 *
 * ## Architecture
 *
 * One [`Parser`] carries all per-document state and drives a pull
 * pipeline:
 *
 * - **[`parsing::source`]** — physical lines with a push-back stack
 *   ([`parsing::source::LineSource`] is the seam embedders wrap)
 * - **[`parsing::reader`]** — logical-line assembly: continuations,
 *   comment routing, orphan `.B`/`.I` adoption
 * - **[`parsing::escape`]** / **[`parsing::args`]** — backslash
 *   canonicalization and macro-argument splitting
 * - **[`parsing::fonts`]** — the current/previous/regular font stack
 *   and the `B<…>`-style surface rewrite
 * - **[`macros`]** — the man(7), groff and mdoc(7) dispatch tables plus
 *   the structural handlers (`.TH`, `.TP`, `.de`, `.TS`, …)
 * - **[`transform`]** — the pre/post transliteration pipeline between
 *   nroff and the translator surface form
 *
 * Text flows reader → dispatch/accumulator → pre-transform → catalog →
 * post-transform → output, in strict source order.
 *
 * ## Usage
 *
 * ```
 * use mantran_engine::{ExtractCatalog, Options, Parser};
 *
 * let mut catalog = ExtractCatalog::new();
 * let mut parser = Parser::new(Options::default());
 * parser
 *     .process_str("hello.1", ".B hello world\n", &mut catalog)
 *     .unwrap();
 * assert_eq!(catalog.msgids(), vec!["B<hello world>"]);
 * assert_eq!(catalog.output, "\\fBhello world\\fR\n");
 * ```
 *
 * State is per-document: process concurrent documents with one
 * `Parser` each.
 */

pub mod catalog;
pub mod error;
pub mod macros;
pub mod options;
pub mod parsing;
pub mod transform;

pub use catalog::{Catalog, ExtractCatalog, MapCatalog, MessageUnit, TranslateOptions};
pub use error::{ParseError, SourceRef};
pub use options::{GroffCodePolicy, NoWrapPair, Options};
pub use parsing::Parser;
