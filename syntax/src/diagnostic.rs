use crate::tokens::{Token, TokenKind};
use ansi_term::{Colour, Style};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagnosticKind {
  General,
  Syntax,
  Semantic,
  Runtime,
  Logic,
  Parse,
  Interpret,
}

impl DiagnosticKind {
  fn label(self) -> &'static str {
    match self {
      Self::General => "General",
      Self::Syntax => "Syntax Error",
      Self::Semantic => "Semantic Error",
      Self::Runtime => "Runtime Error",
      Self::Logic => "Logic Error",
      Self::Parse => "Parse Error",
      Self::Interpret => "Interpret Error",
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
  Debug,
  Info,
  Warning,
  Error,
  Fatal,
}

impl Severity {
  fn label(self) -> &'static str {
    match self {
      Self::Debug => "DEBUG",
      Self::Info => "INFO",
      Self::Warning => "WARNING",
      Self::Error => "ERROR",
      Self::Fatal => "FATAL ERROR",
    }
  }

  fn colour(self) -> Colour {
    match self {
      Self::Debug => Colour::Cyan,
      Self::Info => Colour::Blue,
      Self::Warning => Colour::Yellow,
      Self::Error | Self::Fatal => Colour::Red,
    }
  }
}

/// A located error. Call sites are collected while the error unwinds through
/// nested calls, so the rendered output ends with a stack trace.
#[derive(Clone, Debug)]
pub struct Diagnostic {
  pub kind: DiagnosticKind,
  pub severity: Severity,
  pub token: Token,
  pub message: String,
  pub call_stack: Vec<Token>,
}

impl Diagnostic {
  pub fn new(
    kind: DiagnosticKind,
    severity: Severity,
    message: impl Into<String>,
    token: Token,
  ) -> Diagnostic {
    Diagnostic {
      kind,
      severity,
      token,
      message: message.into(),
      call_stack: Vec::new(),
    }
  }

  pub fn syntax(message: impl Into<String>, token: Token) -> Diagnostic {
    Self::new(DiagnosticKind::Syntax, Severity::Error, message, token)
  }

  pub fn parse(message: impl Into<String>, token: Token) -> Diagnostic {
    Self::new(DiagnosticKind::Parse, Severity::Error, message, token)
  }

  pub fn runtime(message: impl Into<String>, token: Token) -> Diagnostic {
    Self::new(DiagnosticKind::Runtime, Severity::Error, message, token)
  }

  pub fn logic(message: impl Into<String>, token: Token) -> Diagnostic {
    Self::new(DiagnosticKind::Logic, Severity::Error, message, token)
  }

  pub fn interpret(message: impl Into<String>, token: Token) -> Diagnostic {
    Self::new(DiagnosticKind::Interpret, Severity::Error, message, token)
  }

  /// A fatal error raised before any source location exists.
  pub fn fatal(message: impl Into<String>, file: impl Into<String>) -> Diagnostic {
    let token = Token::synthetic(TokenKind::EndOfFile, file.into());
    Self::new(DiagnosticKind::General, Severity::Fatal, message, token)
  }

  pub fn with_call_site(mut self, token: Token) -> Diagnostic {
    self.call_stack.push(token);
    self
  }

  /// Render with colors for the terminal: header, offending line with a
  /// caret under the lexeme, then each call site in unwind order.
  pub fn render(&self) -> String {
    let colour = self.severity.colour();
    let bold = Style::new().bold();

    let mut out = format!(
      "{} {} {}",
      bold.paint(format!(
        "{}:{}:{}",
        self.token.file(),
        self.token.line,
        self.token.column
      )),
      colour.bold().paint(format!(
        "[{}] {}:",
        self.kind.label(),
        self.severity.label()
      )),
      colour.paint(&self.message),
    );
    out.push_str(&frame(&self.token, colour));

    for site in self.call_stack.iter().rev() {
      out.push_str(&format!(
        "\n\n{}",
        colour.paint(format!(
          "Called from {}:{}:{}",
          site.file(),
          site.line,
          site.column
        ))
      ));
      out.push_str(&frame(site, colour));
    }

    out
  }
}

fn frame(token: &Token, colour: Colour) -> String {
  let line = token.source_line();
  let pad = token.column.saturating_sub(1).min(line.len());
  let width = token.lexeme.len().max(1);

  format!(
    "\n  {} {}\n  {}{}",
    colour.paint("->"),
    Style::new().bold().paint(line),
    " ".repeat(pad + 3),
    colour.paint("^".repeat(width)),
  )
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self.render())
  }
}

impl std::error::Error for Diagnostic {}
