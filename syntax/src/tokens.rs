use crate::source::SourceFile;
use smallvec::SmallVec;
use std::rc::Rc;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
  // Keywords
  Let,
  Const,
  While,
  For,
  If,
  Else,
  Return,
  Break,
  Continue,
  Function,
  Null,
  Class,
  This,
  Super,
  New,
  Static,
  Throw,
  Try,
  Catch,
  Import,
  Export,
  As,
  From,
  Switch,
  Case,
  Default,
  Do,
  In,
  Log,

  // Values
  Identifier,
  Integer,
  Real,
  Boolean,
  String,

  // Operators
  Plus,
  Minus,
  Star,
  Slash,
  Percent,
  StarStar,
  Ampersand,
  Pipe,
  Caret,
  Tilde,
  LessLess,
  GreaterGreater,

  // Comparators
  EqualEqual,
  BangEqual,
  Less,
  Greater,
  LessEqual,
  GreaterEqual,

  // Logic
  AmpersandAmpersand,
  PipePipe,
  Bang,
  QuestionQuestion,

  // Assignment
  Equal,
  PlusEqual,
  MinusEqual,
  StarEqual,
  SlashEqual,
  PercentEqual,
  StarStarEqual,
  AmpersandEqual,
  PipeEqual,
  CaretEqual,
  TildeEqual,
  LessLessEqual,
  GreaterGreaterEqual,

  // Updates
  PlusPlus,
  MinusMinus,

  // Punctuation
  DotDotDot,
  Semicolon,
  Colon,
  Comma,
  LeftParen,
  RightParen,
  LeftBrace,
  RightBrace,
  LeftSquare,
  RightSquare,
  Dot,
  Question,
  Backtick,
  PercentBrace,

  Unknown,
  EndOfFile,
}

impl TokenKind {
  pub fn is_assignment_operator(self) -> bool {
    matches!(
      self,
      Self::PlusEqual
        | Self::MinusEqual
        | Self::StarEqual
        | Self::SlashEqual
        | Self::PercentEqual
        | Self::StarStarEqual
        | Self::AmpersandEqual
        | Self::PipeEqual
        | Self::CaretEqual
        | Self::LessLessEqual
        | Self::GreaterGreaterEqual
    )
  }

  /// The plain binary operator a compound assignment desugars to.
  pub fn assignment_base(self) -> Option<TokenKind> {
    match self {
      Self::PlusEqual => Some(Self::Plus),
      Self::MinusEqual => Some(Self::Minus),
      Self::StarEqual => Some(Self::Star),
      Self::SlashEqual => Some(Self::Slash),
      Self::PercentEqual => Some(Self::Percent),
      Self::StarStarEqual => Some(Self::StarStar),
      Self::AmpersandEqual => Some(Self::Ampersand),
      Self::PipeEqual => Some(Self::Pipe),
      Self::CaretEqual => Some(Self::Caret),
      Self::LessLessEqual => Some(Self::LessLess),
      Self::GreaterGreaterEqual => Some(Self::GreaterGreater),
      _ => None,
    }
  }
}

/// A token with its lexeme and 1-based start position. The back-reference to
/// the source file lets diagnostics print the offending line.
#[derive(Clone, Debug)]
pub struct Token {
  pub kind: TokenKind,
  pub lexeme: String,
  pub line: usize,
  pub column: usize,
  pub source: Option<Rc<SourceFile>>,
}

impl Token {
  pub fn new(
    kind: TokenKind,
    lexeme: impl Into<String>,
    line: usize,
    column: usize,
    source: Option<Rc<SourceFile>>,
  ) -> Token {
    Token {
      kind,
      lexeme: lexeme.into(),
      line,
      column,
      source,
    }
  }

  /// A token with no real location, for errors raised before any source
  /// exists (e.g. an unreadable entry file).
  pub fn synthetic(kind: TokenKind, lexeme: impl Into<String>) -> Token {
    Token::new(kind, lexeme, 0, 0, None)
  }

  pub fn file(&self) -> &str {
    match &self.source {
      Some(source) => source.name(),
      None => "<unknown>",
    }
  }

  pub fn source_line(&self) -> &str {
    match &self.source {
      Some(source) => source.line(self.line),
      None => "",
    }
  }

  /// The same location re-tagged with another kind, used when the parser
  /// synthesises operators while desugaring compound assignment.
  pub fn derived(&self, kind: TokenKind, lexeme: &str) -> Token {
    Token::new(kind, lexeme, self.line, self.column, self.source.clone())
  }
}

fn keyword(lexeme: &str) -> Option<TokenKind> {
  let kind = match lexeme {
    "let" => TokenKind::Let,
    "const" => TokenKind::Const,
    "while" => TokenKind::While,
    "for" => TokenKind::For,
    "if" => TokenKind::If,
    "else" => TokenKind::Else,
    "return" => TokenKind::Return,
    "break" => TokenKind::Break,
    "continue" => TokenKind::Continue,
    "function" | "fn" => TokenKind::Function,
    "null" => TokenKind::Null,
    "class" => TokenKind::Class,
    "this" => TokenKind::This,
    "super" => TokenKind::Super,
    "new" => TokenKind::New,
    "static" => TokenKind::Static,
    "throw" => TokenKind::Throw,
    "try" => TokenKind::Try,
    "catch" => TokenKind::Catch,
    "import" => TokenKind::Import,
    "export" => TokenKind::Export,
    "as" => TokenKind::As,
    "from" => TokenKind::From,
    "switch" => TokenKind::Switch,
    "case" => TokenKind::Case,
    "default" => TokenKind::Default,
    "do" => TokenKind::Do,
    "in" => TokenKind::In,
    "log" => TokenKind::Log,
    "true" | "false" => TokenKind::Boolean,
    _ => return None,
  };
  Some(kind)
}

fn symbol(lexeme: &str) -> Option<TokenKind> {
  let kind = match lexeme {
    "**=" => TokenKind::StarStarEqual,
    "<<=" => TokenKind::LessLessEqual,
    ">>=" => TokenKind::GreaterGreaterEqual,
    "..." => TokenKind::DotDotDot,

    "**" => TokenKind::StarStar,
    "<<" => TokenKind::LessLess,
    ">>" => TokenKind::GreaterGreater,
    "==" => TokenKind::EqualEqual,
    "!=" => TokenKind::BangEqual,
    "<=" => TokenKind::LessEqual,
    ">=" => TokenKind::GreaterEqual,
    "&&" => TokenKind::AmpersandAmpersand,
    "||" => TokenKind::PipePipe,
    "??" => TokenKind::QuestionQuestion,
    "+=" => TokenKind::PlusEqual,
    "-=" => TokenKind::MinusEqual,
    "*=" => TokenKind::StarEqual,
    "/=" => TokenKind::SlashEqual,
    "%=" => TokenKind::PercentEqual,
    "&=" => TokenKind::AmpersandEqual,
    "|=" => TokenKind::PipeEqual,
    "^=" => TokenKind::CaretEqual,
    "~=" => TokenKind::TildeEqual,
    "++" => TokenKind::PlusPlus,
    "--" => TokenKind::MinusMinus,

    "+" => TokenKind::Plus,
    "-" => TokenKind::Minus,
    "*" => TokenKind::Star,
    "/" => TokenKind::Slash,
    "%" => TokenKind::Percent,
    "&" => TokenKind::Ampersand,
    "|" => TokenKind::Pipe,
    "^" => TokenKind::Caret,
    "~" => TokenKind::Tilde,
    "=" => TokenKind::Equal,
    "<" => TokenKind::Less,
    ">" => TokenKind::Greater,
    "!" => TokenKind::Bang,
    ";" => TokenKind::Semicolon,
    ":" => TokenKind::Colon,
    "," => TokenKind::Comma,
    "(" => TokenKind::LeftParen,
    ")" => TokenKind::RightParen,
    "{" => TokenKind::LeftBrace,
    "}" => TokenKind::RightBrace,
    "[" => TokenKind::LeftSquare,
    "]" => TokenKind::RightSquare,
    "." => TokenKind::Dot,
    "?" => TokenKind::Question,
    _ => return None,
  };
  Some(kind)
}

#[derive(Clone, Copy, Default)]
struct TemplateMode {
  in_expression: bool,
  brace_depth: usize,
}

/// Single-pass scanner. Template strings are lexed with a mode stack: a
/// backtick enters literal mode, `%{` switches to expression mode until the
/// matching `}`, and templates may nest through embedded expressions.
pub struct Lexer {
  source: Rc<SourceFile>,
  position: usize,
  line: usize,
  column: usize,
  templates: SmallVec<[TemplateMode; 4]>,
}

impl Lexer {
  pub fn new(source: Rc<SourceFile>) -> Lexer {
    Lexer {
      source,
      position: 0,
      line: 1,
      column: 1,
      templates: SmallVec::new(),
    }
  }

  pub fn tokenize(mut self) -> Vec<Token> {
    let mut tokens = Vec::new();
    loop {
      let token = self.next_token();
      let done = token.kind == TokenKind::EndOfFile;
      tokens.push(token);
      if done {
        break;
      }
    }
    tokens
  }

  fn current(&self) -> u8 {
    let bytes = self.source.buffer().as_bytes();
    bytes.get(self.position).copied().unwrap_or(0)
  }

  fn peek(&self) -> u8 {
    let bytes = self.source.buffer().as_bytes();
    bytes.get(self.position + 1).copied().unwrap_or(0)
  }

  fn advance(&mut self) {
    if self.current() == b'\n' {
      self.line += 1;
      self.column = 1;
    } else {
      self.column += 1;
    }
    self.position += 1;
  }

  fn make_token(&self, kind: TokenKind, lexeme: impl Into<String>, line: usize, column: usize) -> Token {
    Token::new(kind, lexeme, line, column, Some(Rc::clone(&self.source)))
  }

  fn in_template_literal(&self) -> bool {
    matches!(self.templates.last(), Some(mode) if !mode.in_expression)
  }

  fn in_template_expression(&self) -> bool {
    matches!(self.templates.last(), Some(mode) if mode.in_expression)
  }

  fn skip_whitespace_and_comments(&mut self) {
    loop {
      match self.current() {
        b' ' | b'\t' | b'\r' | b'\n' => self.advance(),
        b'/' if self.peek() == b'/' => {
          while self.current() != b'\n' && self.current() != 0 {
            self.advance();
          }
        }
        b'/' if self.peek() == b'*' => {
          self.advance();
          self.advance();
          while self.current() != 0 && !(self.current() == b'*' && self.peek() == b'/') {
            self.advance();
          }
          if self.current() != 0 {
            self.advance();
            self.advance();
          }
        }
        _ => break,
      }
    }
  }

  pub fn next_token(&mut self) -> Token {
    if self.in_template_literal() {
      let (line, column) = (self.line, self.column);

      return match self.current() {
        0 => self.make_token(TokenKind::EndOfFile, "", line, column),
        b'`' => {
          self.templates.pop();
          self.advance();
          self.make_token(TokenKind::Backtick, "`", line, column)
        }
        b'%' if self.peek() == b'{' => {
          if let Some(mode) = self.templates.last_mut() {
            mode.in_expression = true;
          }
          self.advance();
          self.advance();
          self.make_token(TokenKind::PercentBrace, "%{", line, column)
        }
        _ => self.template_chunk(line, column),
      };
    }

    self.skip_whitespace_and_comments();
    let (line, column) = (self.line, self.column);

    if self.in_template_expression() {
      match self.current() {
        b'{' => {
          if let Some(mode) = self.templates.last_mut() {
            mode.brace_depth += 1;
          }
          self.advance();
          return self.make_token(TokenKind::LeftBrace, "{", line, column);
        }
        b'}' => {
          if let Some(mode) = self.templates.last_mut() {
            if mode.brace_depth == 0 {
              mode.in_expression = false;
            } else {
              mode.brace_depth -= 1;
            }
          }
          self.advance();
          return self.make_token(TokenKind::RightBrace, "}", line, column);
        }
        _ => {}
      }
    }

    match self.current() {
      0 => self.make_token(TokenKind::EndOfFile, "", line, column),
      b'`' => {
        self.templates.push(TemplateMode::default());
        self.advance();
        self.make_token(TokenKind::Backtick, "`", line, column)
      }
      quote @ (b'"' | b'\'') => self.string_literal(quote, line, column),
      b'r' | b'R' if matches!(self.peek(), b'"' | b'\'') => {
        self.advance();
        let quote = self.current();
        self.raw_string_literal(quote, line, column)
      }
      b'0'..=b'9' => self.number(line, column),
      b'_' | b'a'..=b'z' | b'A'..=b'Z' => self.identifier(line, column),
      _ => self.punctuator(line, column),
    }
  }

  fn identifier(&mut self, line: usize, column: usize) -> Token {
    let mut lexeme = String::new();
    while matches!(self.current(), b'_' | b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9') {
      lexeme.push(self.current() as char);
      self.advance();
    }

    match keyword(&lexeme) {
      Some(kind) => self.make_token(kind, lexeme, line, column),
      None => self.make_token(TokenKind::Identifier, lexeme, line, column),
    }
  }

  fn number(&mut self, line: usize, column: usize) -> Token {
    let mut lexeme = String::new();

    if self.current() == b'0' && matches!(self.peek(), b'x' | b'X' | b'b' | b'B' | b'o' | b'O') {
      lexeme.push('0');
      self.advance();
      let prefix = self.current();
      lexeme.push(prefix as char);
      self.advance();

      let accepts = |byte: u8| match prefix {
        b'x' | b'X' => byte.is_ascii_hexdigit(),
        b'b' | b'B' => matches!(byte, b'0' | b'1'),
        _ => matches!(byte, b'0'..=b'7'),
      };
      while accepts(self.current()) || self.current() == b'_' {
        if self.current() != b'_' {
          lexeme.push(self.current() as char);
        }
        self.advance();
      }
      return self.make_token(TokenKind::Integer, lexeme, line, column);
    }

    let mut is_real = false;
    loop {
      match self.current() {
        b'0'..=b'9' => lexeme.push(self.current() as char),
        b'_' => {}
        b'.' => {
          if is_real || !self.peek().is_ascii_digit() {
            break;
          }
          is_real = true;
          lexeme.push('.');
        }
        _ => break,
      }
      self.advance();
    }

    if matches!(self.current(), b'e' | b'E') {
      is_real = true;
      lexeme.push(self.current() as char);
      self.advance();
      if matches!(self.current(), b'+' | b'-') {
        lexeme.push(self.current() as char);
        self.advance();
      }
      while matches!(self.current(), b'0'..=b'9' | b'_') {
        if self.current() != b'_' {
          lexeme.push(self.current() as char);
        }
        self.advance();
      }
    }

    let kind = if is_real { TokenKind::Real } else { TokenKind::Integer };
    self.make_token(kind, lexeme, line, column)
  }

  fn string_literal(&mut self, delimiter: u8, line: usize, column: usize) -> Token {
    self.advance();
    let mut bytes = Vec::new();

    while self.current() != delimiter && self.current() != 0 {
      if self.current() == b'\\' {
        self.advance();
        match self.current() {
          // A backslash with nothing after it is a lexical error.
          0 => return self.make_token(TokenKind::Unknown, "\\", line, column),
          b'\\' => bytes.push(b'\\'),
          b'"' if delimiter == b'"' => bytes.push(b'"'),
          b'"' => bytes.extend_from_slice(b"\\\""),
          b'\'' if delimiter == b'\'' => bytes.push(b'\''),
          b'\'' => bytes.extend_from_slice(b"\\'"),
          b'n' => bytes.push(b'\n'),
          b't' => bytes.push(b'\t'),
          b'r' => bytes.push(b'\r'),
          b'0' => bytes.push(b'\0'),
          unknown => {
            bytes.push(b'\\');
            bytes.push(unknown);
          }
        }
      } else {
        bytes.push(self.current());
      }
      self.advance();
    }

    if self.current() == delimiter {
      self.advance();
    }

    let lexeme = String::from_utf8_lossy(&bytes).into_owned();
    self.make_token(TokenKind::String, lexeme, line, column)
  }

  fn raw_string_literal(&mut self, delimiter: u8, line: usize, column: usize) -> Token {
    self.advance();
    let mut bytes = Vec::new();
    while self.current() != delimiter && self.current() != 0 {
      bytes.push(self.current());
      self.advance();
    }
    if self.current() == delimiter {
      self.advance();
    }

    let lexeme = String::from_utf8_lossy(&bytes).into_owned();
    self.make_token(TokenKind::String, lexeme, line, column)
  }

  fn template_chunk(&mut self, line: usize, column: usize) -> Token {
    let mut bytes = Vec::new();

    while self.current() != b'`'
      && self.current() != 0
      && !(self.current() == b'%' && self.peek() == b'{')
    {
      if self.current() == b'\\' {
        self.advance();
        match self.current() {
          0 => return self.make_token(TokenKind::Unknown, "\\", line, column),
          b'\\' => bytes.push(b'\\'),
          b'`' => bytes.push(b'`'),
          b'n' => bytes.push(b'\n'),
          b't' => bytes.push(b'\t'),
          b'r' => bytes.push(b'\r'),
          b'0' => bytes.push(b'\0'),
          unknown => {
            bytes.push(b'\\');
            bytes.push(unknown);
          }
        }
      } else {
        bytes.push(self.current());
      }
      self.advance();
    }

    let lexeme = String::from_utf8_lossy(&bytes).into_owned();
    self.make_token(TokenKind::String, lexeme, line, column)
  }

  fn punctuator(&mut self, line: usize, column: usize) -> Token {
    let buffer = self.source.buffer();
    for length in (1..=3).rev() {
      let end = self.position + length;
      if end > buffer.len() || !buffer.is_char_boundary(end) {
        continue;
      }
      let lexeme = &buffer[self.position..end];
      if let Some(kind) = symbol(lexeme) {
        let lexeme = lexeme.to_string();
        for _ in 0..length {
          self.advance();
        }
        return self.make_token(kind, lexeme, line, column);
      }
    }

    let lexeme = (self.current() as char).to_string();
    self.advance();
    self.make_token(TokenKind::Unknown, lexeme, line, column)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn tokenize(source: &str) -> Vec<Token> {
    let file = Rc::new(SourceFile::from_source(source, "test"));
    Lexer::new(file).tokenize()
  }

  fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source).into_iter().map(|token| token.kind).collect()
  }

  #[test]
  fn empty_source_is_just_eof() {
    assert_eq!(kinds(""), vec![TokenKind::EndOfFile]);
    assert_eq!(kinds("   \n\t "), vec![TokenKind::EndOfFile]);
  }

  #[test]
  fn keywords_and_identifiers() {
    assert_eq!(
      kinds("let x while whale fn function"),
      vec![
        TokenKind::Let,
        TokenKind::Identifier,
        TokenKind::While,
        TokenKind::Identifier,
        TokenKind::Function,
        TokenKind::Function,
        TokenKind::EndOfFile,
      ]
    );

    let tokens = tokenize("true false");
    assert_eq!(tokens[0].kind, TokenKind::Boolean);
    assert_eq!(tokens[0].lexeme, "true");
    assert_eq!(tokens[1].lexeme, "false");
  }

  #[test]
  fn positions_are_one_based() {
    let tokens = tokenize("let a;\n  a = 1;");

    assert_eq!((tokens[0].line, tokens[0].column), (1, 1));
    assert_eq!((tokens[1].line, tokens[1].column), (1, 5));
    assert_eq!((tokens[3].line, tokens[3].column), (2, 3));
  }

  #[test]
  fn longest_symbol_wins() {
    assert_eq!(
      kinds("a **= b ** c * d"),
      vec![
        TokenKind::Identifier,
        TokenKind::StarStarEqual,
        TokenKind::Identifier,
        TokenKind::StarStar,
        TokenKind::Identifier,
        TokenKind::Star,
        TokenKind::Identifier,
        TokenKind::EndOfFile,
      ]
    );
    assert_eq!(
      kinds("<<= << <= <"),
      vec![
        TokenKind::LessLessEqual,
        TokenKind::LessLess,
        TokenKind::LessEqual,
        TokenKind::Less,
        TokenKind::EndOfFile,
      ]
    );
  }

  #[test]
  fn comments_are_skipped() {
    assert_eq!(
      kinds("1 // comment\n2 /* block\ncomment */ 3"),
      vec![
        TokenKind::Integer,
        TokenKind::Integer,
        TokenKind::Integer,
        TokenKind::EndOfFile,
      ]
    );
  }

  #[test]
  fn numbers() {
    let tokens = tokenize("42 1_000 3.5 1e3 2.5e-1 0xFF 0b1010 0o77 7.");
    assert_eq!(tokens[0].lexeme, "42");
    assert_eq!(tokens[1].lexeme, "1000");
    assert_eq!(tokens[2].lexeme, "3.5");
    assert_eq!(tokens[2].kind, TokenKind::Real);
    assert_eq!(tokens[3].kind, TokenKind::Real);
    assert_eq!(tokens[4].lexeme, "2.5e-1");
    assert_eq!(tokens[5].lexeme, "0xFF");
    assert_eq!(tokens[5].kind, TokenKind::Integer);
    assert_eq!(tokens[6].lexeme, "0b1010");
    assert_eq!(tokens[7].lexeme, "0o77");
    // no digit after the dot, so it is not part of the number
    assert_eq!(tokens[8].lexeme, "7");
    assert_eq!(tokens[9].kind, TokenKind::Dot);
  }

  #[test]
  fn string_escapes() {
    let tokens = tokenize(r#""a\nb" 'it\'s' "keep\qit""#);
    assert_eq!(tokens[0].lexeme, "a\nb");
    assert_eq!(tokens[1].lexeme, "it's");
    assert_eq!(tokens[2].lexeme, "keep\\qit");
  }

  #[test]
  fn raw_strings_keep_backslashes() {
    let tokens = tokenize(r#"r"a\nb""#);
    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].lexeme, "a\\nb");
  }

  #[test]
  fn backslash_at_end_of_file_is_an_error() {
    let tokens = tokenize("\"oops\\");
    assert_eq!(tokens[0].kind, TokenKind::Unknown);
  }

  #[test]
  fn template_strings() {
    assert_eq!(
      kinds("`a %{1} b`"),
      vec![
        TokenKind::Backtick,
        TokenKind::String,
        TokenKind::PercentBrace,
        TokenKind::Integer,
        TokenKind::RightBrace,
        TokenKind::String,
        TokenKind::Backtick,
        TokenKind::EndOfFile,
      ]
    );

    let tokens = tokenize("`a %{1} b`");
    assert_eq!(tokens[1].lexeme, "a ");
    assert_eq!(tokens[5].lexeme, " b");
  }

  #[test]
  fn template_expression_with_braces() {
    assert_eq!(
      kinds("`%{ {a: 1} }`"),
      vec![
        TokenKind::Backtick,
        TokenKind::PercentBrace,
        TokenKind::LeftBrace,
        TokenKind::Identifier,
        TokenKind::Colon,
        TokenKind::Integer,
        TokenKind::RightBrace,
        TokenKind::RightBrace,
        TokenKind::Backtick,
        TokenKind::EndOfFile,
      ]
    );
  }

  #[test]
  fn template_content_is_not_whitespace_skipped() {
    let tokens = tokenize("`  spaced  `");
    assert_eq!(tokens[1].lexeme, "  spaced  ");
  }

  #[test]
  fn unknown_characters_are_consumed() {
    assert_eq!(
      kinds("$ @"),
      vec![TokenKind::Unknown, TokenKind::Unknown, TokenKind::EndOfFile]
    );
  }
}
