//! The pre/post transliteration pipeline.
//!
//! Every string a translator sees goes through [`pre::pre_translate`] on
//! the way into the catalog, and every translation comes back through
//! [`post::post_translate`] before it is emitted as nroff again.

pub mod post;
pub mod pre;

use crate::error::SourceRef;
use crate::parsing::fonts::FontStack;

/// Marker wrapped around inline macros while they travel inside a
/// paragraph; folded into `E<.name args>` by the pre-transform.
pub const INLINE_MARK: &str = "PO4A-INLINE";

/// Internal line prefix for macro lines the post-transform itself emits,
/// so the first-column guard leaves them alone. Never reaches output.
pub(crate) const MACRO_LINE_MARK: char = '\u{1}';

/// Shared state both transform directions need.
pub struct TransformContext<'a> {
    pub fonts: &'a mut FontStack,
    pub mdoc: bool,
    pub nbs: &'a str,
    pub reference: &'a SourceRef,
}

/// Wrap an inline macro invocation for embedding into a paragraph.
pub fn inline_marker(invocation: &str) -> String {
    format!("{INLINE_MARK}:{invocation}:{INLINE_MARK}")
}
