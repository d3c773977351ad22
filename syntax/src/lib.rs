pub mod ast;
mod diagnostic;
mod parser;
mod source;
mod tokens;

pub use diagnostic::{Diagnostic, DiagnosticKind, Severity};
pub use parser::parse;
pub use source::SourceFile;
pub use tokens::{Lexer, Token, TokenKind};

use std::rc::Rc;

/// Scan a whole source file into its token stream, ending with `EndOfFile`.
pub fn tokenize(source: Rc<SourceFile>) -> Vec<Token> {
  Lexer::new(source).tokenize()
}
