use std::fmt;

/// Location of a physical input line, shown in every diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRef {
    pub path: String,
    pub line: u32,
}

impl SourceRef {
    pub fn new(path: impl Into<String>, line: u32) -> Self {
        Self {
            path: path.into(),
            line,
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path, self.line)
    }
}

/// Everything that can abort a document. The first error wins; no retry,
/// no partial recovery.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The input was produced by a tool whose source should be translated
    /// instead. Mapped to exit code 254 by the CLI.
    #[error(
        "{reference}: this file was generated by {generator}; translate the source document instead of its man page rendering"
    )]
    GeneratedFile {
        generator: String,
        reference: SourceRef,
    },

    #[error("{reference}: file inclusion with '.{macro_name} {path}' is not supported")]
    Inclusion {
        macro_name: String,
        path: String,
        reference: SourceRef,
    },

    #[error(
        "{reference}: '.{macro_name}' blocks are rejected by the groff_code policy; pass groff_code=verbatim or groff_code=translate to accept them"
    )]
    GroffCodeForbidden {
        macro_name: String,
        reference: SourceRef,
    },

    #[error("{reference}: '.ie' conditional without a matching '.el' branch")]
    MissingElseBranch { reference: SourceRef },

    #[error("{reference}: '.{macro_name}' with a positive count cannot be handled")]
    CountedRequest {
        macro_name: String,
        reference: SourceRef,
    },

    #[error("{reference}: changing the escape character with '.ec {argument}' is not supported")]
    EscapeCharChange {
        argument: String,
        reference: SourceRef,
    },

    #[error("{reference}: the '\\c' line-continuation escape is not handled in translatable text")]
    ContinuationEscape { reference: SourceRef },

    #[error(
        "{reference}: font modifier '.{font_macro}' directly followed by the macro '.{next_macro}'"
    )]
    FontModifierBeforeMacro {
        font_macro: String,
        next_macro: String,
        reference: SourceRef,
    },

    #[error("{reference}: unknown macro '.{name}'; register it with one of the macro list options")]
    UnknownMacro { name: String, reference: SourceRef },

    #[error("{reference}: unexpected mdoc macro '.{name}' outside an mdoc document")]
    UnexpectedMdoc { name: String, reference: SourceRef },

    #[error("{reference}: '.{font_macro}' at end of input, with no line to apply the font to")]
    DanglingFontModifier {
        font_macro: String,
        reference: SourceRef,
    },

    #[error("{reference}: argument list ends with an escaped space")]
    TrailingEscapedSpace { reference: SourceRef },

    #[error("{reference}: unbalanced '<' and '>' in translated message: {message:?}")]
    UnbalancedMarkup {
        message: String,
        reference: SourceRef,
    },
}

impl ParseError {
    /// Exit code the CLI maps this error to.
    pub fn exit_code(&self) -> i32 {
        match self {
            ParseError::GeneratedFile { .. } => 254,
            _ => 1,
        }
    }
}
