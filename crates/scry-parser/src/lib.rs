// scry-parser -- token-tree builder for the scry command language.

mod builder;
mod tree;

pub use builder::{build, BuildOutput};
pub use tree::{AssignTarget, Assignment, Command, Expr, ExprNode, Group, GroupKind};

use scry_common::error::{ConsoleError, LexError, SyntaxError};
use scry_common::token::Token;

/// One command line, fully lexed and tree-built.
///
/// Both the token list and the (possibly partial) tree are always present;
/// errors are carried alongside rather than replacing the output, because
/// the suggestion engine keeps working from partial results.
#[derive(Debug, Clone)]
pub struct Parsed {
    pub tokens: Vec<Token>,
    pub command: Command,
    pub lex_error: Option<LexError>,
    pub syntax_error: Option<SyntaxError>,
}

impl Parsed {
    /// The error to report, if any. Tokenization always completes first,
    /// so a lex error takes precedence over a structural one.
    pub fn first_error(&self) -> Option<ConsoleError> {
        if let Some(e) = &self.lex_error {
            return Some(ConsoleError::Lex(e.clone()));
        }
        self.syntax_error.clone().map(ConsoleError::Syntax)
    }
}

/// Lex and tree-build one submitted command line.
pub fn parse(source: &str) -> Parsed {
    let lexed = scry_lexer::tokenize(source);
    let built = build(&lexed.tokens);
    Parsed {
        tokens: lexed.tokens,
        command: built.command,
        lex_error: lexed.error,
        syntax_error: built.error,
    }
}
