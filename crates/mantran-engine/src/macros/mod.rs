//! Macro classification and the builtin dispatch tables.
//!
//! Every request name maps to a [`MacroHandler`] variant; the tables are
//! plain data, overlaid by the user's macro-list options and swapped for
//! the mdoc table when a `.Dd` shows up.

pub mod mdoc;
pub mod structural;

use std::collections::{HashMap, HashSet};

use crate::catalog::Catalog;
use crate::error::{ParseError, SourceRef};
use crate::parsing::Parser;
use crate::parsing::source::LineSource;

/// A structural handler: full access to the parser state, the line
/// supply and the catalog.
pub type StructuralFn =
    fn(&mut Parser, &mut dyn LineSource, &mut dyn Catalog, &Invocation<'_>) -> Result<(), ParseError>;

/// What to do with one macro.
#[derive(Clone, Copy)]
pub enum MacroHandler {
    /// Emit the line verbatim.
    Untranslated,
    /// Emit `.name` alone; arguments draw a warning.
    NoArg,
    /// Translate the joined argument string as one unit.
    TranslateJoined,
    /// Translate each argument independently.
    TranslateEach {
        /// Keep the first argument (usually a tag) untranslated.
        keep_first: bool,
    },
    /// A font macro: `.B`/`.I` (one font) or the six alternating ones.
    /// Appends to the current paragraph instead of breaking it.
    Font { odd: char, even: Option<char> },
    /// Fold into the surrounding paragraph as `E<.name args>`.
    Inline,
    /// Custom behavior.
    Structural(StructuralFn),
}

impl std::fmt::Debug for MacroHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Untranslated => write!(f, "Untranslated"),
            Self::NoArg => write!(f, "NoArg"),
            Self::TranslateJoined => write!(f, "TranslateJoined"),
            Self::TranslateEach { keep_first } => {
                write!(f, "TranslateEach {{ keep_first: {keep_first} }}")
            }
            Self::Font { odd, even } => write!(f, "Font {{ odd: {odd:?}, even: {even:?} }}"),
            Self::Inline => write!(f, "Inline"),
            Self::Structural(_) => write!(f, "Structural(..)"),
        }
    }
}

pub type MacroTable = HashMap<String, MacroHandler>;

/// One parsed macro line.
#[derive(Debug)]
pub struct Invocation<'a> {
    pub name: &'a str,
    /// Raw argument text, not yet split.
    pub args: &'a str,
    /// The full logical line, newline included, for verbatim emission.
    pub raw: &'a str,
    pub reference: SourceRef,
}

/// Split a macro line (no trailing newline) into name and argument text.
pub fn parse_invocation(line: &str) -> (&str, &str) {
    let body = line[1..].trim_start_matches([' ', '\t']);
    match body.find([' ', '\t']) {
        Some(pos) => (&body[..pos], body[pos..].trim_start_matches([' ', '\t'])),
        None => (body, ""),
    }
}

/// Expand a font macro into inline escapes.
///
/// `.B`/`.I` wrap the joined arguments; the alternating macros give the
/// odd/even arguments their respective fonts with no space in between.
/// With no arguments at all, the alternate font escape is still emitted
/// so the font state stays consistent.
pub fn expand_font_macro(odd: char, even: Option<char>, args: &[String]) -> String {
    match even {
        None => format!("\\f{odd}{}\\fR", args.join(" ")),
        Some(even) => {
            if args.is_empty() {
                return format!("\\f{even}\\fR");
            }
            let mut out = String::new();
            for (i, arg) in args.iter().enumerate() {
                let font = if i % 2 == 0 { odd } else { even };
                out.push_str("\\f");
                out.push(font);
                out.push_str(arg);
            }
            out.push_str("\\fR");
            out
        }
    }
}

/// Macros that reset the font stack to the regular font.
pub fn is_font_reset(name: &str) -> bool {
    matches!(
        name,
        "P" | "PP" | "LP" | "TP" | "IP" | "SH" | "SS" | "TH" | "Dd"
    )
}

/// Names that only exist in the mdoc dialect, used to tell an
/// out-of-place mdoc page from a plain unknown macro.
pub fn is_mdoc_name(name: &str) -> bool {
    mdoc::mdoc_table().contains_key(name)
}

/// Default no-wrap begin/end sets for man pages. The sets are not
/// matched pairwise: any end macro closes any begin macro.
pub fn no_wrap_sets() -> (HashSet<String>, HashSet<String>) {
    let begin = ["nf", "EX", "EQ"].iter().map(|s| s.to_string()).collect();
    let end = ["fi", "EE", "EN"].iter().map(|s| s.to_string()).collect();
    (begin, end)
}

/// The builtin man(7) + groff request table.
pub fn man_table() -> MacroTable {
    let mut t = MacroTable::new();

    // Font macros join the surrounding paragraph.
    t.insert("B".into(), MacroHandler::Font { odd: 'B', even: None });
    t.insert("I".into(), MacroHandler::Font { odd: 'I', even: None });
    for (name, odd, even) in [
        ("BI", 'B', 'I'),
        ("BR", 'B', 'R'),
        ("IB", 'I', 'B'),
        ("IR", 'I', 'R'),
        ("RB", 'R', 'B'),
        ("RI", 'R', 'I'),
    ] {
        t.insert(name.into(), MacroHandler::Font { odd, even: Some(even) });
    }

    for name in ["P", "PP", "LP"] {
        t.insert(name.into(), MacroHandler::NoArg);
    }

    for name in ["SM", "SB"] {
        t.insert(name.into(), MacroHandler::TranslateJoined);
    }

    // Layout requests passed through untouched. nf/fi and friends also
    // sit in the no-wrap sets; their table entry only controls output.
    for name in [
        "ad", "bp", "br", "cs", "DT", "EE", "EN", "EQ", "EX", "fam", "fi", "HP", "hy", "in",
        "ll", "ls", "mk", "na", "ne", "nf", "nh", "nr", "ns", "PD", "pl", "po", "ps", "RE",
        "RS", "rm", "rn", "rr", "rs", "sp", "ss", "ti", "tm", "tr", "vs",
    ] {
        t.insert(name.into(), MacroHandler::Untranslated);
    }

    use structural as s;
    t.insert("TH".into(), MacroHandler::Structural(s::th));
    t.insert("SH".into(), MacroHandler::Structural(s::section_heading));
    t.insert("SS".into(), MacroHandler::Structural(s::section_heading));
    t.insert("TP".into(), MacroHandler::Structural(s::tp));
    // .TQ continues a .TP list with another tag line.
    t.insert("TQ".into(), MacroHandler::Structural(s::tp));
    t.insert("IP".into(), MacroHandler::Structural(s::ip));
    t.insert("UR".into(), MacroHandler::Structural(s::ur));
    t.insert("UE".into(), MacroHandler::NoArg);
    t.insert("UN".into(), MacroHandler::TranslateJoined);
    t.insert("MT".into(), MacroHandler::Structural(s::ur));
    t.insert("ME".into(), MacroHandler::NoArg);
    t.insert("de".into(), MacroHandler::Structural(s::groff_definition));
    t.insert("ie".into(), MacroHandler::Structural(s::groff_conditional));
    t.insert("if".into(), MacroHandler::Structural(s::groff_conditional));
    t.insert("ds".into(), MacroHandler::Structural(s::ds));
    t.insert("ig".into(), MacroHandler::Structural(s::ig));
    t.insert("ta".into(), MacroHandler::Structural(s::ta));
    t.insert("TS".into(), MacroHandler::Structural(s::table_block));
    t.insert("so".into(), MacroHandler::Structural(s::inclusion));
    t.insert("mso".into(), MacroHandler::Structural(s::inclusion));
    t.insert("ft".into(), MacroHandler::Structural(s::ft));
    for name in ["ce", "ul", "cu"] {
        t.insert(name.into(), MacroHandler::Structural(s::counted_request));
    }
    t.insert("ec".into(), MacroHandler::Structural(s::ec));
    t.insert("Dd".into(), MacroHandler::Structural(s::dd));

    t
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_invocation_splits_name_and_args() {
        assert_eq!(parse_invocation(".SH NAME"), ("SH", "NAME"));
        assert_eq!(parse_invocation(".TP"), ("TP", ""));
        assert_eq!(parse_invocation(". SH  a b"), ("SH", "a b"));
        assert_eq!(parse_invocation("'br"), ("br", ""));
    }

    #[test]
    fn expand_single_font_macro() {
        let args = vec!["hello".to_string(), "world".to_string()];
        assert_eq!(expand_font_macro('B', None, &args), "\\fBhello world\\fR");
    }

    #[test]
    fn expand_alternating_font_macro() {
        let args = vec!["foo".into(), "bar".into(), "baz".into()];
        assert_eq!(
            expand_font_macro('B', Some('I'), &args),
            "\\fBfoo\\fIbar\\fBbaz\\fR"
        );
    }

    #[test]
    fn expand_alternating_without_arguments() {
        assert_eq!(expand_font_macro('B', Some('I'), &[]), "\\fI\\fR");
    }

    #[test]
    fn man_table_knows_the_core_macros() {
        let t = man_table();
        assert!(matches!(t.get("TH"), Some(MacroHandler::Structural(_))));
        assert!(matches!(
            t.get("BI"),
            Some(MacroHandler::Font { odd: 'B', even: Some('I') })
        ));
        assert!(matches!(t.get("PP"), Some(MacroHandler::NoArg)));
        assert!(matches!(t.get("nf"), Some(MacroHandler::Untranslated)));
        assert!(t.get("Sh").is_none());
    }

    #[test]
    fn mdoc_names_are_recognized_for_diagnostics() {
        assert!(is_mdoc_name("Sh"));
        assert!(is_mdoc_name("Fl"));
        assert!(!is_mdoc_name("SH"));
    }
}
