//! The mdoc(7) dispatch table, installed when a `.Dd` is seen.

use super::{MacroHandler, MacroTable, structural};

/// One- and two-letter domain macros folded into the paragraph so the
/// translator sees them as `E<.name args>`.
const INLINE_MACROS: &[&str] = &[
    "Ad", "An", "Ao", "Ac", "Ap", "Aq", "Ar", "At", "Bo", "Bc", "Bq", "Brq", "Bro", "Brc",
    "Bsx", "Bx", "Cd", "Cm", "Do", "Dc", "Dq", "Dv", "Dx", "Em", "Eo", "Ec", "Er", "Ev",
    "Fa", "Fd", "Fl", "Fn", "Fo", "Fc", "Ft", "Fx", "Ic", "Li", "Lk", "Ms", "Mt", "Nm",
    "No", "Ns", "Nx", "Op", "Oo", "Oc", "Ot", "Ox", "Pa", "Pf", "Po", "Pc", "Pq", "Ql",
    "Qo", "Qc", "Qq", "Rv", "So", "Sc", "Sq", "St", "Sx", "Sy", "Tn", "Ux", "Va", "Vt",
    "Xo", "Xc", "Xr", "%A", "%B", "%C", "%D", "%I", "%J", "%N", "%O", "%P", "%Q", "%R",
    "%T", "%U", "%V",
];

/// Build the mdoc table. The groff programming requests keep their
/// structural handlers; everything else is mdoc vocabulary.
pub fn mdoc_table() -> MacroTable {
    let mut t = MacroTable::new();

    use structural as s;
    t.insert("Dd".into(), MacroHandler::Structural(s::dd));
    // A man(7) header hands control back to the man table.
    t.insert("TH".into(), MacroHandler::Structural(s::th));
    t.insert("de".into(), MacroHandler::Structural(s::groff_definition));
    t.insert("ie".into(), MacroHandler::Structural(s::groff_conditional));
    t.insert("if".into(), MacroHandler::Structural(s::groff_conditional));
    t.insert("ds".into(), MacroHandler::Structural(s::ds));
    t.insert("ig".into(), MacroHandler::Structural(s::ig));
    t.insert("so".into(), MacroHandler::Structural(s::inclusion));
    t.insert("mso".into(), MacroHandler::Structural(s::inclusion));
    t.insert("ft".into(), MacroHandler::Structural(s::ft));

    // Block macros whose argument text the translator works on.
    for name in ["Sh", "Ss", "D1", "Dl", "It", "Nd", "In", "Os"] {
        t.insert(name.into(), MacroHandler::TranslateJoined);
    }

    for name in ["Pp", "Lp", "El", "Rs", "Re"] {
        t.insert(name.into(), MacroHandler::NoArg);
    }

    // List/display machinery emitted untouched. Bd/Ed additionally join
    // the no-wrap sets when the table is installed.
    for name in ["Bl", "Bd", "Ed", "Dt", "Bk", "Ek"] {
        t.insert(name.into(), MacroHandler::Untranslated);
    }

    for name in INLINE_MACROS {
        t.insert((*name).into(), MacroHandler::Inline);
    }

    t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_classifies_the_dialect() {
        let t = mdoc_table();
        assert!(matches!(t.get("Sh"), Some(MacroHandler::TranslateJoined)));
        assert!(matches!(t.get("Pp"), Some(MacroHandler::NoArg)));
        assert!(matches!(t.get("Fl"), Some(MacroHandler::Inline)));
        assert!(matches!(t.get("%T"), Some(MacroHandler::Inline)));
        assert!(matches!(t.get("Bl"), Some(MacroHandler::Untranslated)));
        assert!(matches!(t.get("so"), Some(MacroHandler::Structural(_))));
    }
}
