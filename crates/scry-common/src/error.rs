//! Error taxonomy for the command pipeline.
//!
//! Four stages, four error types: [`LexError`], [`SyntaxError`],
//! [`ResolutionError`], [`RuntimeError`], plus the [`ConsoleError`] sum the
//! `execute` entry point reports. Every error carries a user-facing message;
//! none of them ever crosses the entry-point boundary as a panic.

use std::fmt;

use serde::Serialize;

use crate::span::Span;

/// A lexer error with location information.
///
/// Lexing always runs to end of input before the first error is reported,
/// so token boundaries stay available to the suggestion engine even on
/// malformed input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

impl LexError {
    pub fn new(kind: LexErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LexErrorKind {
    /// A character outside the command language's alphabet.
    UnexpectedCharacter(char),
    /// A string literal was not closed before end of input.
    UnterminatedString,
    /// A char literal was not closed before end of input.
    UnterminatedChar,
    /// A closed char literal holding anything but exactly one character.
    InvalidCharLiteral,
    /// An escape sequence other than `\\ \" \b \f \n \r \t`.
    InvalidEscape(char),
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LexErrorKind::UnexpectedCharacter(c) => {
                write!(f, "unexpected character {c:?} at offset {}", self.span.start)
            }
            LexErrorKind::UnterminatedString => write!(f, "unterminated string"),
            LexErrorKind::UnterminatedChar => write!(f, "unterminated char literal"),
            LexErrorKind::InvalidCharLiteral => {
                write!(f, "char literal must hold exactly one character")
            }
            LexErrorKind::InvalidEscape(c) => write!(f, "invalid escape sequence: \\{c}"),
        }
    }
}

impl std::error::Error for LexError {}

/// A structural error from the token-tree builder.
///
/// Builder errors are deferred until the whole token stream has been
/// consumed, so the partial tree keeps maximal structure for completions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub span: Span,
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SyntaxErrorKind {
    /// `)` or `]` closing a group of the wrong kind, or with no open group.
    MismatchedClose(char),
    /// `=` below the root expression (inside an open group).
    AssignmentNotRoot,
    /// More than one `=` in a single expression.
    DuplicateAssignment,
    /// Leftover open group, dangling token, or an empty statement.
    UnexpectedEnd,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SyntaxErrorKind::MismatchedClose(c) => write!(f, "mismatched {c:?}"),
            SyntaxErrorKind::AssignmentNotRoot => {
                write!(f, "assignment can only occur in root expression")
            }
            SyntaxErrorKind::DuplicateAssignment => {
                write!(f, "only one assignment is allowed per expression")
            }
            SyntaxErrorKind::UnexpectedEnd => write!(f, "unexpected end of expression"),
        }
    }
}

impl std::error::Error for SyntaxError {}

/// A name/overload resolution failure.
///
/// The resolver probes without throwing; only the final unmatched case
/// produces one of these, naming the symbol and the type searched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ResolutionError {
    /// A `$name` that is not in the variable table.
    UnknownVariable(String),
    /// A root identifier chain matching no namespace, type, global, or
    /// variable.
    UnresolvedRoot(String),
    /// No field, property, or nested type with this name on the type.
    NoSuchMember { name: String, on: String },
    /// No declared overload (or nested-type constructor, or delegate field)
    /// structurally compatible with the arguments.
    NoMatchingOverload { name: String, on: String },
    /// No argument-compatible constructor on the type.
    NoMatchingConstructor { on: String },
    /// No compatible indexer on the type.
    NoMatchingIndexer { on: String },
    /// Assignment target not found or value not convertible.
    CannotAssign { name: String, on: String },
    /// Chaining off a void-returning call.
    VoidDereference,
    /// Suggestion/evaluation requested while the catalog is still building.
    CatalogNotReady,
    /// Empty or whitespace-only input.
    EmptyInput,
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownVariable(name) => write!(f, "unknown variable ${name}"),
            Self::UnresolvedRoot(name) => write!(f, "could not resolve `{name}`"),
            Self::NoSuchMember { name, on } => {
                write!(f, "no member `{name}` on type `{on}`")
            }
            Self::NoMatchingOverload { name, on } => {
                write!(f, "no overload of `{name}` on type `{on}` matches the arguments")
            }
            Self::NoMatchingConstructor { on } => {
                write!(f, "no constructor of `{on}` matches the arguments")
            }
            Self::NoMatchingIndexer { on } => {
                write!(f, "no indexer on type `{on}` matches the arguments")
            }
            Self::CannotAssign { name, on } => {
                write!(f, "cannot assign `{name}` on type `{on}`")
            }
            Self::VoidDereference => write!(f, "cannot dereference a void result"),
            Self::CatalogNotReady => write!(f, "type catalog is still building"),
            Self::EmptyInput => write!(f, "empty command"),
        }
    }
}

impl std::error::Error for ResolutionError {}

/// An evaluation failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RuntimeError {
    /// An instance member was dereferenced on a null current value.
    NullDereference { type_name: String },
    /// A host thunk reported a failure. The message is already unwrapped
    /// from whatever the host's invocation mechanism used internally.
    Invocation { message: String },
    /// An argument could not be converted to its parameter type at runtime.
    ConversionFailed { to: String },
    /// Array access outside the allocated extents.
    IndexOutOfRange,
    /// An array was allocated with a negative length.
    NegativeArrayLength,
    /// An array allocation exceeded the cell limit.
    ArrayTooLarge,
}

impl RuntimeError {
    /// Convenience for host thunks.
    pub fn invocation(message: impl Into<String>) -> Self {
        Self::Invocation { message: message.into() }
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NullDereference { type_name } => {
                write!(f, "null dereference of type {type_name}")
            }
            Self::Invocation { message } => write!(f, "{message}"),
            Self::ConversionFailed { to } => write!(f, "cannot convert value to `{to}`"),
            Self::IndexOutOfRange => write!(f, "index out of range"),
            Self::NegativeArrayLength => write!(f, "array length cannot be negative"),
            Self::ArrayTooLarge => write!(f, "array allocation is too large"),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// The one error an `execute` call remembers. At most one per execution,
/// even if several statements were attempted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ConsoleError {
    Lex(LexError),
    Syntax(SyntaxError),
    Resolution(ResolutionError),
    Runtime(RuntimeError),
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex(e) => write!(f, "{e}"),
            Self::Syntax(e) => write!(f, "{e}"),
            Self::Resolution(e) => write!(f, "{e}"),
            Self::Runtime(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ConsoleError {}

impl From<LexError> for ConsoleError {
    fn from(e: LexError) -> Self {
        Self::Lex(e)
    }
}

impl From<SyntaxError> for ConsoleError {
    fn from(e: SyntaxError) -> Self {
        Self::Syntax(e)
    }
}

impl From<ResolutionError> for ConsoleError {
    fn from(e: ResolutionError) -> Self {
        Self::Resolution(e)
    }
}

impl From<RuntimeError> for ConsoleError {
    fn from(e: RuntimeError) -> Self {
        Self::Runtime(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_facing_messages() {
        assert_eq!(
            LexError::new(LexErrorKind::UnterminatedString, Span::new(0, 4)).to_string(),
            "unterminated string"
        );
        assert_eq!(
            SyntaxError::new(SyntaxErrorKind::UnexpectedEnd, Span::new(0, 1)).to_string(),
            "unexpected end of expression"
        );
        assert_eq!(
            ResolutionError::UnknownVariable("x".into()).to_string(),
            "unknown variable $x"
        );
        assert_eq!(
            RuntimeError::NullDereference { type_name: "Demo.Counter".into() }.to_string(),
            "null dereference of type Demo.Counter"
        );
    }

    #[test]
    fn console_error_wraps_each_stage() {
        let e: ConsoleError = ResolutionError::VoidDereference.into();
        assert_eq!(e.to_string(), "cannot dereference a void result");
        let e: ConsoleError = RuntimeError::IndexOutOfRange.into();
        assert_eq!(e.to_string(), "index out of range");
    }
}
