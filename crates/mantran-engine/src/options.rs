//! Engine-side option set.
//!
//! `mantran-config` loads these from a TOML file; embedders can also fill
//! the struct directly.

/// Policy for `.de`, `.ie` and `.if` blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroffCodePolicy {
    /// Reject the document (default).
    #[default]
    Fail,
    /// Accumulate the block and emit it unchanged.
    Verbatim,
    /// Accumulate the block and hand it to the catalog as one
    /// unwrapped `groff code` unit.
    Translate,
}

impl GroffCodePolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "fail" => Some(Self::Fail),
            "verbatim" => Some(Self::Verbatim),
            "translate" => Some(Self::Translate),
            _ => None,
        }
    }
}

/// A user-supplied `begin:end` pair extending the no-wrap macro sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoWrapPair {
    pub begin: String,
    pub end: String,
}

/// Behavior knobs of the parser. Field names follow the option names of
/// the configuration file.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Extra diagnostic chatter on top of the tracing filter.
    pub verbose: bool,
    /// Policy for groff programming constructs.
    pub groff_code: GroffCodePolicy,
    /// Macros to emit verbatim, untranslated.
    pub untranslated: Vec<String>,
    /// Macros taking no argument (arguments draw a warning).
    pub noarg: Vec<String>,
    /// Macros whose joined argument string is one translation unit.
    pub translate_joined: Vec<String>,
    /// Macros whose arguments are translated one by one.
    pub translate_each: Vec<String>,
    /// Macros folded into the surrounding paragraph as `E<.name args>`.
    pub inline: Vec<String>,
    /// Additional `begin:end` no-wrap pairs. The sets are deliberately
    /// not matched pairwise: any end macro closes any begin macro.
    pub no_wrap: Vec<NoWrapPair>,
}

impl Options {
    /// Split a comma list as found in configuration values. Empty items
    /// are dropped so trailing commas are harmless.
    pub fn split_list(value: &str) -> Vec<String> {
        value
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Parse the `no_wrap` option value, a comma list of `begin:end`.
    pub fn parse_no_wrap(value: &str) -> Vec<NoWrapPair> {
        Self::split_list(value)
            .into_iter()
            .filter_map(|item| {
                let (begin, end) = item.split_once(':')?;
                Some(NoWrapPair {
                    begin: begin.trim().to_string(),
                    end: end.trim().to_string(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_list_trims_and_drops_empties() {
        assert_eq!(
            Options::split_list("Xy, Ab ,,Cd,"),
            vec!["Xy".to_string(), "Ab".to_string(), "Cd".to_string()]
        );
    }

    #[test]
    fn parse_no_wrap_pairs() {
        let pairs = Options::parse_no_wrap("Vb:Ve, De:En");
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].begin, "Vb");
        assert_eq!(pairs[0].end, "Ve");
        assert_eq!(pairs[1].begin, "De");
        assert_eq!(pairs[1].end, "En");
    }

    #[test]
    fn groff_code_policy_parses_known_values() {
        assert_eq!(GroffCodePolicy::parse("fail"), Some(GroffCodePolicy::Fail));
        assert_eq!(
            GroffCodePolicy::parse("verbatim"),
            Some(GroffCodePolicy::Verbatim)
        );
        assert_eq!(
            GroffCodePolicy::parse("translate"),
            Some(GroffCodePolicy::Translate)
        );
        assert_eq!(GroffCodePolicy::parse("other"), None);
    }
}
