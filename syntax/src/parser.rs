use crate::ast::{Expr, FunctionLiteral, ImportKind, Program, Stmt, SwitchCase};
use crate::diagnostic::Diagnostic;
use crate::tokens::{Token, TokenKind};
use std::rc::Rc;

#[derive(Clone, Copy, Debug, PartialOrd, PartialEq, Eq)]
enum Precedence {
  None = 1,
  Assign,       // = += -= ...
  Nullish,      // ??
  Ternary,      // ?:
  LogicalOr,    // ||
  LogicalAnd,   // &&
  BitwiseOr,    // |
  BitwiseXor,   // ^
  BitwiseAnd,   // &
  Equality,     // == !=
  Comparison,   // < > <= >=
  BitwiseShift, // << >>
  Sum,          // + -
  Product,      // * / %
  Exponent,     // **
  Unary,        // ! - ~ ++ --
  Call,         // () .
  Index,        // []
  Primary,
}

impl Precedence {
  /// One step down, for right-associative operators.
  fn lower(self) -> Self {
    match self {
      Self::None | Self::Assign => Self::None,
      Self::Nullish => Self::Assign,
      Self::Ternary => Self::Nullish,
      Self::LogicalOr => Self::Ternary,
      Self::LogicalAnd => Self::LogicalOr,
      Self::BitwiseOr => Self::LogicalAnd,
      Self::BitwiseXor => Self::BitwiseOr,
      Self::BitwiseAnd => Self::BitwiseXor,
      Self::Equality => Self::BitwiseAnd,
      Self::Comparison => Self::Equality,
      Self::BitwiseShift => Self::Comparison,
      Self::Sum => Self::BitwiseShift,
      Self::Product => Self::Sum,
      Self::Exponent => Self::Product,
      Self::Unary => Self::Exponent,
      Self::Call => Self::Unary,
      Self::Index => Self::Call,
      Self::Primary => Self::Index,
    }
  }
}

type ExpressionResult = Result<Expr, Diagnostic>;
type StatementResult = Result<Stmt, Diagnostic>;
type PrefixRule = fn(&mut Parser) -> ExpressionResult;
type InfixRule = fn(&mut Parser, Expr) -> ExpressionResult;

struct ParseRule {
  prefix: Option<PrefixRule>,
  infix: Option<InfixRule>,
  precedence: Precedence,
}

fn rule(kind: TokenKind) -> ParseRule {
  use TokenKind as T;

  let (prefix, infix, precedence): (Option<PrefixRule>, Option<InfixRule>, Precedence) = match kind
  {
    T::Integer | T::Real | T::String | T::Boolean | T::Null => {
      (Some(Parser::literal), None, Precedence::Primary)
    }
    T::Identifier => (Some(Parser::identifier), None, Precedence::Primary),
    T::LeftBrace => (Some(Parser::object_literal), None, Precedence::Primary),
    T::Backtick => (Some(Parser::template_literal), None, Precedence::Primary),
    T::Function => (Some(Parser::function_literal), None, Precedence::Primary),
    T::This => (Some(Parser::this_expression), None, Precedence::Primary),
    T::Super => (Some(Parser::super_expression), None, Precedence::Primary),
    T::New => (Some(Parser::new_expression), None, Precedence::Primary),
    T::DotDotDot => (Some(Parser::spread), None, Precedence::Primary),

    T::LeftParen => (Some(Parser::grouping), Some(Parser::call), Precedence::Call),
    T::LeftSquare => (Some(Parser::array_literal), Some(Parser::index), Precedence::Index),
    T::Dot => (None, Some(Parser::property_access), Precedence::Call),

    T::Minus => (Some(Parser::unary), Some(Parser::binary), Precedence::Sum),
    T::Bang | T::Tilde => (Some(Parser::unary), None, Precedence::Unary),
    T::PlusPlus | T::MinusMinus => (
      Some(Parser::prefix_update),
      Some(Parser::postfix_update),
      Precedence::Unary,
    ),

    T::Plus => (None, Some(Parser::binary), Precedence::Sum),
    T::Star | T::Slash | T::Percent => (None, Some(Parser::binary), Precedence::Product),
    T::StarStar => (None, Some(Parser::binary), Precedence::Exponent),
    T::PipePipe => (None, Some(Parser::binary), Precedence::LogicalOr),
    T::AmpersandAmpersand => (None, Some(Parser::binary), Precedence::LogicalAnd),
    T::QuestionQuestion => (None, Some(Parser::nullish), Precedence::Nullish),
    T::Ampersand => (None, Some(Parser::binary), Precedence::BitwiseAnd),
    T::Pipe => (None, Some(Parser::binary), Precedence::BitwiseOr),
    T::Caret => (None, Some(Parser::binary), Precedence::BitwiseXor),
    T::LessLess | T::GreaterGreater => (None, Some(Parser::binary), Precedence::BitwiseShift),
    T::EqualEqual | T::BangEqual => (None, Some(Parser::binary), Precedence::Equality),
    T::Less | T::LessEqual | T::Greater | T::GreaterEqual => {
      (None, Some(Parser::binary), Precedence::Comparison)
    }

    T::Equal => (None, Some(Parser::assignment), Precedence::Assign),
    kind if kind.is_assignment_operator() || kind == T::TildeEqual => {
      (None, Some(Parser::compound_assignment), Precedence::Assign)
    }

    T::Question => (None, Some(Parser::ternary), Precedence::Ternary),

    _ => (None, None, Precedence::None),
  };

  ParseRule {
    prefix,
    infix,
    precedence,
  }
}

/// Parse a token stream into a program. On errors the parser records a
/// diagnostic, skips to the next statement boundary and keeps going, so a
/// single pass reports as many problems as it can.
pub fn parse(tokens: Vec<Token>) -> Result<Program, Vec<Diagnostic>> {
  let mut parser = Parser::new(tokens);
  let mut statements = Vec::new();
  let mut diagnostics = Vec::new();

  while !parser.is_at_end() {
    match parser.declaration() {
      Ok(statement) => statements.push(statement),
      Err(diagnostic) => {
        diagnostics.push(diagnostic);
        parser.synchronize();
      }
    }
  }

  if diagnostics.is_empty() {
    Ok(Program { statements })
  } else {
    Err(diagnostics)
  }
}

pub struct Parser {
  tokens: Vec<Token>,
  current: usize,
}

impl Parser {
  fn new(tokens: Vec<Token>) -> Parser {
    debug_assert!(matches!(
      tokens.last(),
      Some(Token {
        kind: TokenKind::EndOfFile,
        ..
      })
    ));
    Parser { tokens, current: 0 }
  }

  fn is_at_end(&self) -> bool {
    self.peek().kind == TokenKind::EndOfFile
  }

  fn peek(&self) -> &Token {
    let index = self.current.min(self.tokens.len() - 1);
    &self.tokens[index]
  }

  fn next_kind(&self) -> TokenKind {
    let index = (self.current + 1).min(self.tokens.len() - 1);
    self.tokens[index].kind
  }

  fn previous(&self) -> &Token {
    &self.tokens[self.current.saturating_sub(1)]
  }

  fn advance(&mut self) -> Token {
    let token = self.peek().clone();
    if !self.is_at_end() {
      self.current += 1;
    }
    token
  }

  fn check(&self, kind: TokenKind) -> bool {
    self.peek().kind == kind
  }

  fn matches(&mut self, kinds: &[TokenKind]) -> bool {
    if kinds.contains(&self.peek().kind) {
      self.advance();
      true
    } else {
      false
    }
  }

  fn consume(&mut self, kind: TokenKind, message: &str) -> Result<Token, Diagnostic> {
    if self.check(kind) {
      Ok(self.advance())
    } else {
      Err(Diagnostic::parse(message, self.peek().clone()))
    }
  }

  fn synchronize(&mut self) {
    self.advance();
    while !self.is_at_end() {
      if self.previous().kind == TokenKind::Semicolon {
        return;
      }
      match self.peek().kind {
        TokenKind::If
        | TokenKind::For
        | TokenKind::While
        | TokenKind::Return
        | TokenKind::Let
        | TokenKind::Const
        | TokenKind::Class
        | TokenKind::Function => return,
        _ => {}
      }
      self.advance();
    }
  }

  // ==== Expressions ====

  fn parse_precedence(&mut self, precedence: Precedence) -> ExpressionResult {
    let prefix_token = self.advance();
    let Some(prefix) = rule(prefix_token.kind).prefix else {
      return if prefix_token.kind == TokenKind::Unknown {
        Err(Diagnostic::syntax(
          format!("Unknown character '{}'", prefix_token.lexeme),
          prefix_token,
        ))
      } else {
        Err(Diagnostic::parse("Expected an expression", prefix_token))
      };
    };

    let mut left = prefix(self)?;

    while precedence < rule(self.peek().kind).precedence {
      let Some(infix) = rule(self.peek().kind).infix else {
        break;
      };
      self.advance();
      left = infix(self, left)?;
    }

    Ok(left)
  }

  fn expression(&mut self) -> ExpressionResult {
    self.parse_precedence(Precedence::None)
  }

  fn literal(&mut self) -> ExpressionResult {
    let token = self.previous().clone();
    match token.kind {
      TokenKind::Integer => match parse_integer(&token.lexeme) {
        Some(value) => Ok(Expr::Integer { token, value }),
        None => Err(Diagnostic::parse("Invalid integer literal", token)),
      },
      TokenKind::Real => match token.lexeme.parse::<f64>() {
        Ok(value) => Ok(Expr::Real { token, value }),
        Err(_) => Err(Diagnostic::parse("Invalid number literal", token)),
      },
      TokenKind::String => {
        let value = token.lexeme.clone();
        Ok(Expr::String { token, value })
      }
      TokenKind::Boolean => {
        let value = token.lexeme == "true";
        Ok(Expr::Boolean { token, value })
      }
      TokenKind::Null => Ok(Expr::Null { token }),
      _ => Err(Diagnostic::parse("Expected a literal", token)),
    }
  }

  fn identifier(&mut self) -> ExpressionResult {
    let token = self.previous().clone();
    let name = token.lexeme.clone();
    Ok(Expr::Identifier { token, name })
  }

  fn grouping(&mut self) -> ExpressionResult {
    let expression = self.expression()?;
    self.consume(TokenKind::RightParen, "Expected ')' after expression")?;
    Ok(expression)
  }

  fn unary(&mut self) -> ExpressionResult {
    let token = self.previous().clone();
    let operator = token.kind;
    let operand = self.parse_precedence(Precedence::Unary)?;
    Ok(Expr::Unary {
      token,
      operator,
      operand: Box::new(operand),
    })
  }

  fn binary(&mut self, left: Expr) -> ExpressionResult {
    let token = self.previous().clone();
    let operator = token.kind;
    let right = self.parse_precedence(rule(operator).precedence)?;
    Ok(Expr::Binary {
      token,
      operator,
      left: Box::new(left),
      right: Box::new(right),
    })
  }

  /// `??` is right-associative: the right operand parses one level below
  /// `Nullish`, so `a ?? b ?? c` nests as `a ?? (b ?? c)`.
  fn nullish(&mut self, left: Expr) -> ExpressionResult {
    let token = self.previous().clone();
    let operator = token.kind;
    let right = self.parse_precedence(Precedence::Nullish.lower())?;
    Ok(Expr::Binary {
      token,
      operator,
      left: Box::new(left),
      right: Box::new(right),
    })
  }

  fn assignment(&mut self, left: Expr) -> ExpressionResult {
    let token = self.previous().clone();
    let value = self.parse_precedence(Precedence::Assign.lower())?;

    if !left.is_valid_assignment_target() {
      return Err(Diagnostic::parse("Invalid assignment target", token));
    }

    Ok(Expr::Assignment {
      token,
      target: Box::new(left),
      value: Box::new(value),
    })
  }

  fn compound_assignment(&mut self, left: Expr) -> ExpressionResult {
    let token = self.previous().clone();

    if !left.is_valid_assignment_target() {
      return Err(Diagnostic::parse("Invalid assignment target", token));
    }
    let Some(base) = token.kind.assignment_base() else {
      return Err(Diagnostic::parse(
        "Unsupported compound assignment operator",
        token,
      ));
    };

    let right = self.parse_precedence(Precedence::Assign.lower())?;

    let operator_token = token.derived(base, &token.lexeme);
    let combined = Expr::Binary {
      token: operator_token,
      operator: base,
      left: Box::new(left.clone()),
      right: Box::new(right),
    };

    Ok(Expr::Assignment {
      token: token.derived(TokenKind::Equal, "="),
      target: Box::new(left),
      value: Box::new(combined),
    })
  }

  fn ternary(&mut self, condition: Expr) -> ExpressionResult {
    let token = self.previous().clone();
    let then_branch = self.expression()?;
    self.consume(TokenKind::Colon, "Expected ':' in ternary expression")?;
    let else_branch = self.parse_precedence(Precedence::Ternary.lower())?;

    Ok(Expr::Ternary {
      token,
      condition: Box::new(condition),
      then_branch: Box::new(then_branch),
      else_branch: Box::new(else_branch),
    })
  }

  fn call(&mut self, callee: Expr) -> ExpressionResult {
    let mut arguments = Vec::new();
    if !self.check(TokenKind::RightParen) {
      loop {
        if self.matches(&[TokenKind::DotDotDot]) {
          let token = self.previous().clone();
          let expression = self.expression()?;
          arguments.push(Expr::Spread {
            token,
            expression: Box::new(expression),
          });
        } else {
          arguments.push(self.expression()?);
        }
        if !self.matches(&[TokenKind::Comma]) {
          break;
        }
      }
    }
    let token = self.consume(TokenKind::RightParen, "Expected ')' after arguments")?;

    Ok(Expr::Call {
      token,
      callee: Box::new(callee),
      arguments,
    })
  }

  fn index(&mut self, receiver: Expr) -> ExpressionResult {
    let index = self.expression()?;
    let token = self.consume(TokenKind::RightSquare, "Expected ']' after index")?;

    Ok(Expr::Index {
      token,
      receiver: Box::new(receiver),
      index: Box::new(index),
    })
  }

  fn property_access(&mut self, object: Expr) -> ExpressionResult {
    let token = self.previous().clone();
    let property = self.consume(TokenKind::Identifier, "Expected a property name after '.'")?;

    Ok(Expr::PropertyAccess {
      token,
      object: Box::new(object),
      property,
    })
  }

  fn array_literal(&mut self) -> ExpressionResult {
    let token = self.previous().clone();
    let mut elements = Vec::new();

    if !self.check(TokenKind::RightSquare) && !self.is_at_end() {
      loop {
        if self.matches(&[TokenKind::DotDotDot]) {
          let spread_token = self.previous().clone();
          let expression = self.expression()?;
          elements.push(Expr::Spread {
            token: spread_token,
            expression: Box::new(expression),
          });
        } else {
          elements.push(self.expression()?);
        }
        if !self.matches(&[TokenKind::Comma]) {
          break;
        }
      }
    }
    self.consume(TokenKind::RightSquare, "Expected ']' after array elements")?;

    Ok(Expr::Array { token, elements })
  }

  fn object_literal(&mut self) -> ExpressionResult {
    let token = self.previous().clone();
    let mut properties = Vec::new();

    while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
      let key = if self.matches(&[TokenKind::LeftSquare]) {
        let key = self.expression()?;
        self.consume(TokenKind::RightSquare, "Expected ']' after computed key")?;
        key
      } else {
        let key_token = self.peek().clone();
        if self.matches(&[TokenKind::Identifier, TokenKind::String]) {
          let value = key_token.lexeme.clone();
          Expr::String {
            token: key_token,
            value,
          }
        } else if self.matches(&[TokenKind::Integer]) {
          match parse_integer(&key_token.lexeme) {
            Some(value) => Expr::Integer {
              token: key_token,
              value,
            },
            None => return Err(Diagnostic::parse("Invalid integer literal", key_token)),
          }
        } else if self.matches(&[TokenKind::Boolean]) {
          let value = key_token.lexeme == "true";
          Expr::Boolean {
            token: key_token,
            value,
          }
        } else {
          return Err(Diagnostic::parse("Invalid object key", key_token));
        }
      };

      self.consume(TokenKind::Colon, "Expected ':' after object key")?;
      let value = self.expression()?;
      properties.push((key, value));

      if !self.matches(&[TokenKind::Comma]) {
        break;
      }
    }
    self.consume(TokenKind::RightBrace, "Expected '}' after object literal")?;

    Ok(Expr::Object { token, properties })
  }

  fn template_literal(&mut self) -> ExpressionResult {
    let token = self.previous().clone();
    let mut parts = Vec::new();

    while !self.check(TokenKind::Backtick) && !self.is_at_end() {
      if self.matches(&[TokenKind::String]) {
        let part = self.previous().clone();
        let value = part.lexeme.clone();
        parts.push(Expr::String { token: part, value });
      } else if self.matches(&[TokenKind::PercentBrace]) {
        parts.push(self.expression()?);
        self.consume(TokenKind::RightBrace, "Expected '}' after template expression")?;
      } else {
        break;
      }
    }
    self.consume(TokenKind::Backtick, "Expected closing '`' for template string")?;

    Ok(Expr::Template { token, parts })
  }

  fn function_literal(&mut self) -> ExpressionResult {
    let token = self.previous().clone();
    let literal = self.function_tail(token)?;
    Ok(Expr::Function(literal))
  }

  fn function_tail(&mut self, token: Token) -> Result<Rc<FunctionLiteral>, Diagnostic> {
    self.consume(TokenKind::LeftParen, "Expected '(' before parameters")?;

    let mut parameters = Vec::new();
    let mut rest_parameter = None;

    if !self.check(TokenKind::RightParen) && !self.is_at_end() {
      loop {
        if self.matches(&[TokenKind::DotDotDot]) {
          rest_parameter =
            Some(self.consume(TokenKind::Identifier, "Expected a name after '...'")?);
          break;
        }
        parameters.push(self.consume(TokenKind::Identifier, "Expected a parameter name")?);
        if !self.matches(&[TokenKind::Comma]) {
          break;
        }
      }
    }
    self.consume(TokenKind::RightParen, "Expected ')' after parameters")?;

    let body = self.declaration()?;

    Ok(Rc::new(FunctionLiteral {
      token,
      parameters,
      rest_parameter,
      body,
    }))
  }

  fn this_expression(&mut self) -> ExpressionResult {
    Ok(Expr::This {
      token: self.previous().clone(),
    })
  }

  fn super_expression(&mut self) -> ExpressionResult {
    let token = self.previous().clone();

    if self.check(TokenKind::LeftParen) {
      return Ok(Expr::Super {
        token,
        method: None,
        is_constructor_call: true,
      });
    }

    self.consume(TokenKind::Dot, "Expected '.' after 'super'")?;
    let method = self.consume(TokenKind::Identifier, "Expected a method name after '.'")?;

    Ok(Expr::Super {
      token,
      method: Some(method),
      is_constructor_call: false,
    })
  }

  fn new_expression(&mut self) -> ExpressionResult {
    let token = self.previous().clone();
    let name = self.consume(TokenKind::Identifier, "Expected a class name after 'new'")?;
    let callee = Expr::Identifier {
      name: name.lexeme.clone(),
      token: name.clone(),
    };

    let call = if self.check(TokenKind::LeftParen) {
      self.advance();
      self.call(callee)?
    } else {
      Expr::Call {
        token: name,
        callee: Box::new(callee),
        arguments: Vec::new(),
      }
    };

    Ok(Expr::New {
      token,
      call: Box::new(call),
    })
  }

  fn spread(&mut self) -> ExpressionResult {
    let token = self.previous().clone();
    let expression = self.expression()?;
    Ok(Expr::Spread {
      token,
      expression: Box::new(expression),
    })
  }

  fn prefix_update(&mut self) -> ExpressionResult {
    let token = self.previous().clone();
    let operator = token.kind;
    let operand = self.expression()?;
    Ok(Expr::PrefixUpdate {
      token,
      operator,
      operand: Box::new(operand),
    })
  }

  fn postfix_update(&mut self, operand: Expr) -> ExpressionResult {
    let token = self.previous().clone();
    let operator = token.kind;
    Ok(Expr::PostfixUpdate {
      token,
      operator,
      operand: Box::new(operand),
    })
  }

  // ==== Statements ====

  fn declaration(&mut self) -> StatementResult {
    match self.peek().kind {
      TokenKind::Let | TokenKind::Const => {
        let constant = self.peek().kind == TokenKind::Const;
        let token = self.advance();
        self.let_declaration(token, constant)
      }
      TokenKind::Function if self.next_kind() == TokenKind::Identifier => {
        let token = self.advance();
        self.function_declaration(token)
      }
      TokenKind::Class => {
        let token = self.advance();
        self.class_declaration(token)
      }
      _ => self.statement(),
    }
  }

  fn statement(&mut self) -> StatementResult {
    match self.peek().kind {
      TokenKind::If => {
        let token = self.advance();
        self.if_statement(token)
      }
      TokenKind::While => {
        let token = self.advance();
        self.while_statement(token)
      }
      TokenKind::For => {
        let token = self.advance();
        self.for_statement(token)
      }
      TokenKind::Return => {
        let token = self.advance();
        self.return_statement(token)
      }
      TokenKind::Break => {
        let token = self.advance();
        self.consume(TokenKind::Semicolon, "Expected ';' after 'break'")?;
        Ok(Stmt::Break { token })
      }
      TokenKind::Continue => {
        let token = self.advance();
        self.consume(TokenKind::Semicolon, "Expected ';' after 'continue'")?;
        Ok(Stmt::Continue { token })
      }
      TokenKind::LeftBrace => {
        let token = self.advance();
        self.block_statement(token)
      }
      TokenKind::Throw => {
        let token = self.advance();
        self.throw_statement(token)
      }
      TokenKind::Try => {
        let token = self.advance();
        self.try_statement(token)
      }
      TokenKind::Import => {
        let token = self.advance();
        self.import_statement(token)
      }
      TokenKind::Export => {
        let token = self.advance();
        self.export_statement(token)
      }
      TokenKind::Log => {
        let token = self.advance();
        self.log_statement(token)
      }
      TokenKind::Do => {
        let token = self.advance();
        self.do_while_statement(token)
      }
      TokenKind::Switch => {
        let token = self.advance();
        self.switch_statement(token)
      }
      _ => self.expression_statement(),
    }
  }

  fn let_declaration(&mut self, token: Token, constant: bool) -> StatementResult {
    let name = self.consume(TokenKind::Identifier, "Expected a variable name")?;
    let value = if self.matches(&[TokenKind::Equal]) {
      Some(self.expression()?)
    } else {
      None
    };
    self.consume(TokenKind::Semicolon, "Expected ';' after declaration")?;

    Ok(Stmt::Let {
      token,
      name,
      value,
      constant,
    })
  }

  fn function_declaration(&mut self, token: Token) -> StatementResult {
    let name = self.consume(TokenKind::Identifier, "Expected a function name")?;
    let literal = self.function_tail(token.clone())?;

    Ok(Stmt::Let {
      token,
      name,
      value: Some(Expr::Function(literal)),
      constant: false,
    })
  }

  fn class_declaration(&mut self, token: Token) -> StatementResult {
    let name = self.consume(TokenKind::Identifier, "Expected a class name")?;

    let superclass = if self.matches(&[TokenKind::Colon]) {
      Some(self.consume(TokenKind::Identifier, "Expected a superclass name after ':'")?)
    } else {
      None
    };

    self.consume(TokenKind::LeftBrace, "Expected '{' before class body")?;

    let mut methods = Vec::new();
    let mut statics = Vec::new();

    while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
      if self.matches(&[TokenKind::Static]) {
        if matches!(
          self.peek().kind,
          TokenKind::Let | TokenKind::Function | TokenKind::Class
        ) {
          statics.push(self.declaration()?);
        } else {
          return Err(Diagnostic::parse(
            "Expected a declaration after 'static'",
            self.peek().clone(),
          ));
        }
      } else {
        // the `function` keyword is optional on methods
        let method_token = if self.check(TokenKind::Function) {
          self.advance()
        } else {
          self.peek().clone()
        };
        let method_name = self.consume(TokenKind::Identifier, "Expected a method name")?;
        let literal = self.function_tail(method_token)?;
        methods.push((method_name, literal));
      }
    }
    self.consume(TokenKind::RightBrace, "Expected '}' after class body")?;

    Ok(Stmt::Class {
      token,
      name,
      superclass,
      methods,
      statics,
    })
  }

  fn if_statement(&mut self, token: Token) -> StatementResult {
    let condition = self.expression()?;
    let then_branch = Box::new(self.statement()?);
    let else_branch = if self.matches(&[TokenKind::Else]) {
      Some(Box::new(self.statement()?))
    } else {
      None
    };

    Ok(Stmt::If {
      token,
      condition,
      then_branch,
      else_branch,
    })
  }

  fn while_statement(&mut self, token: Token) -> StatementResult {
    let condition = self.expression()?;
    let body = Box::new(self.statement()?);
    Ok(Stmt::While {
      token,
      condition,
      body,
    })
  }

  fn do_while_statement(&mut self, token: Token) -> StatementResult {
    let body = Box::new(self.statement()?);
    self.consume(TokenKind::While, "Expected 'while' after 'do' body")?;
    let condition = self.expression()?;
    self.consume(TokenKind::Semicolon, "Expected ';' after do-while")?;

    Ok(Stmt::DoWhile {
      token,
      body,
      condition,
    })
  }

  fn for_statement(&mut self, token: Token) -> StatementResult {
    let has_paren = self.matches(&[TokenKind::LeftParen]);

    let is_for_in = self.check(TokenKind::Identifier)
      && matches!(self.next_kind(), TokenKind::In | TokenKind::Colon);

    if is_for_in {
      let variable = self.advance();
      self.advance(); // `in` or `:`
      let collection = self.expression()?;
      if has_paren {
        self.consume(TokenKind::RightParen, "Expected ')' after for-in header")?;
      } else {
        self.matches(&[TokenKind::RightParen]);
      }
      let body = Box::new(self.statement()?);

      return Ok(Stmt::ForIn {
        token,
        variable,
        collection,
        body,
      });
    }

    let initializer = if self.matches(&[TokenKind::Semicolon]) {
      None
    } else {
      Some(Box::new(self.declaration()?))
    };

    let condition = if self.check(TokenKind::Semicolon) {
      None
    } else {
      Some(self.expression()?)
    };
    self.consume(TokenKind::Semicolon, "Expected ';' after loop condition")?;

    let update = if self.check(TokenKind::RightParen) || self.check(TokenKind::LeftBrace) {
      None
    } else {
      Some(self.expression()?)
    };
    if has_paren {
      self.consume(TokenKind::RightParen, "Expected ')' after for clauses")?;
    } else {
      self.matches(&[TokenKind::RightParen]);
    }

    let body = Box::new(self.statement()?);

    Ok(Stmt::For {
      token,
      initializer,
      condition,
      update,
      body,
    })
  }

  fn return_statement(&mut self, token: Token) -> StatementResult {
    let value = if self.check(TokenKind::Semicolon) {
      None
    } else {
      Some(self.expression()?)
    };
    self.consume(TokenKind::Semicolon, "Expected ';' after return")?;

    Ok(Stmt::Return { token, value })
  }

  fn throw_statement(&mut self, token: Token) -> StatementResult {
    let value = if self.check(TokenKind::Semicolon) {
      None
    } else {
      Some(self.expression()?)
    };
    self.consume(TokenKind::Semicolon, "Expected ';' after throw")?;

    Ok(Stmt::Throw { token, value })
  }

  fn block_statement(&mut self, token: Token) -> StatementResult {
    let mut statements = Vec::new();
    while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
      statements.push(self.declaration()?);
    }
    self.consume(TokenKind::RightBrace, "Expected '}' after block")?;

    Ok(Stmt::Block { token, statements })
  }

  fn try_statement(&mut self, token: Token) -> StatementResult {
    let brace = self.consume(TokenKind::LeftBrace, "Expected '{' after 'try'")?;
    let try_block = Box::new(self.block_statement(brace)?);

    self.consume(TokenKind::Catch, "Expected 'catch' after try block")?;
    self.consume(TokenKind::LeftParen, "Expected '(' after 'catch'")?;
    let variable = self.consume(TokenKind::Identifier, "Expected a name for the caught value")?;
    self.consume(TokenKind::RightParen, "Expected ')' after catch variable")?;

    let catch_block = Box::new(self.statement()?);

    Ok(Stmt::Try {
      token,
      try_block,
      variable,
      catch_block,
    })
  }

  fn import_statement(&mut self, token: Token) -> StatementResult {
    let kind;
    let path;

    if self.matches(&[TokenKind::LeftBrace]) {
      let mut items = Vec::new();
      while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
        loop {
          let name = self.consume(TokenKind::Identifier, "Expected a name to import")?;
          let alias = if self.matches(&[TokenKind::As]) {
            Some(self.consume(TokenKind::Identifier, "Expected a name after 'as'")?)
          } else {
            None
          };
          items.push((name, alias));
          if !self.matches(&[TokenKind::Comma]) {
            break;
          }
        }
      }
      self.consume(TokenKind::RightBrace, "Expected '}' after import list")?;
      self.consume(TokenKind::From, "Expected 'from' after import list")?;
      path = self.expression()?;
      kind = ImportKind::Named(items);
    } else if self.matches(&[TokenKind::Star]) {
      self.consume(TokenKind::As, "Expected 'as' after '*'")?;
      let namespace = self.consume(TokenKind::Identifier, "Expected a namespace name")?;
      self.consume(TokenKind::From, "Expected 'from' after namespace name")?;
      path = self.expression()?;
      kind = ImportKind::Namespace(namespace);
    } else {
      path = self.expression()?;
      kind = ImportKind::All;
    }

    self.consume(TokenKind::Semicolon, "Expected ';' after import")?;

    Ok(Stmt::Import { token, path, kind })
  }

  fn export_statement(&mut self, token: Token) -> StatementResult {
    if matches!(
      self.peek().kind,
      TokenKind::Let | TokenKind::Const | TokenKind::Function | TokenKind::Class
    ) {
      let declaration = Some(Box::new(self.declaration()?));
      return Ok(Stmt::Export {
        token,
        declaration,
        specifiers: Vec::new(),
      });
    }

    if self.matches(&[TokenKind::LeftBrace]) {
      let mut specifiers = Vec::new();
      while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
        loop {
          specifiers.push(self.consume(TokenKind::Identifier, "Expected a name to export")?);
          if !self.matches(&[TokenKind::Comma]) {
            break;
          }
        }
      }
      self.consume(TokenKind::RightBrace, "Expected '}' after export list")?;
      self.consume(TokenKind::Semicolon, "Expected ';' after export")?;

      return Ok(Stmt::Export {
        token,
        declaration: None,
        specifiers,
      });
    }

    Err(Diagnostic::parse(
      "Invalid export statement",
      self.peek().clone(),
    ))
  }

  fn switch_statement(&mut self, token: Token) -> StatementResult {
    let subject = self.expression()?;
    self.consume(TokenKind::LeftBrace, "Expected '{' after switch subject")?;

    let mut cases = Vec::new();
    while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
      let case_token = self.peek().clone();
      let value = if self.matches(&[TokenKind::Case]) {
        Some(self.expression()?)
      } else if self.matches(&[TokenKind::Default]) {
        None
      } else {
        return Err(Diagnostic::parse(
          "Expected 'case' or 'default' inside switch",
          case_token,
        ));
      };
      self.consume(TokenKind::Colon, "Expected ':' after case value")?;

      let mut statements = Vec::new();
      while !matches!(
        self.peek().kind,
        TokenKind::RightBrace | TokenKind::Case | TokenKind::Default | TokenKind::EndOfFile
      ) {
        statements.push(self.statement()?);
      }

      cases.push(SwitchCase {
        token: case_token,
        value,
        statements,
      });
    }
    self.consume(TokenKind::RightBrace, "Expected '}' after switch cases")?;

    Ok(Stmt::Switch {
      token,
      subject,
      cases,
    })
  }

  fn log_statement(&mut self, token: Token) -> StatementResult {
    let expression = self.expression()?;
    self.consume(TokenKind::Semicolon, "Expected ';' after log")?;
    Ok(Stmt::Log { token, expression })
  }

  fn expression_statement(&mut self) -> StatementResult {
    let token = self.peek().clone();
    let expression = self.expression()?;
    self.consume(TokenKind::Semicolon, "Expected ';' after expression")?;
    Ok(Stmt::Expression { token, expression })
  }
}

fn parse_integer(lexeme: &str) -> Option<i64> {
  if let Some(digits) = lexeme.strip_prefix("0x").or_else(|| lexeme.strip_prefix("0X")) {
    i64::from_str_radix(digits, 16).ok()
  } else if let Some(digits) = lexeme.strip_prefix("0b").or_else(|| lexeme.strip_prefix("0B")) {
    i64::from_str_radix(digits, 2).ok()
  } else if let Some(digits) = lexeme.strip_prefix("0o").or_else(|| lexeme.strip_prefix("0O")) {
    i64::from_str_radix(digits, 8).ok()
  } else {
    lexeme.parse().ok()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::source::SourceFile;
  use crate::Lexer;

  fn parse_source(source: &str) -> Result<Program, Vec<Diagnostic>> {
    let file = std::rc::Rc::new(SourceFile::from_source(source, "test"));
    parse(Lexer::new(file).tokenize())
  }

  fn parse_one(source: &str) -> Stmt {
    let mut program = parse_source(source).expect("source should parse");
    assert_eq!(program.statements.len(), 1);
    program.statements.remove(0)
  }

  #[test]
  fn empty_source_is_an_empty_program() {
    let program = parse_source("").unwrap();
    assert!(program.statements.is_empty());
  }

  #[test]
  fn let_and_const() {
    assert!(matches!(
      parse_one("let a = 1;"),
      Stmt::Let {
        constant: false,
        value: Some(_),
        ..
      }
    ));
    assert!(matches!(
      parse_one("const b = 2;"),
      Stmt::Let { constant: true, .. }
    ));
    assert!(matches!(
      parse_one("let c;"),
      Stmt::Let { value: None, .. }
    ));
  }

  #[test]
  fn function_declaration_desugars_to_let() {
    let Stmt::Let { name, value, .. } = parse_one("function add(a, b) { return a + b; }") else {
      panic!("expected let");
    };
    assert_eq!(name.lexeme, "add");
    assert!(matches!(value, Some(Expr::Function(_))));
  }

  #[test]
  fn product_binds_tighter_than_sum() {
    let Stmt::Expression { expression, .. } = parse_one("1 + 2 * 3;") else {
      panic!("expected expression");
    };
    let Expr::Binary {
      operator, right, ..
    } = expression
    else {
      panic!("expected binary");
    };
    assert_eq!(operator, TokenKind::Plus);
    assert!(matches!(
      *right,
      Expr::Binary {
        operator: TokenKind::Star,
        ..
      }
    ));
  }

  #[test]
  fn assignment_is_right_associative() {
    let Stmt::Expression { expression, .. } = parse_one("a = b = 1;") else {
      panic!("expected expression");
    };
    let Expr::Assignment { value, .. } = expression else {
      panic!("expected assignment");
    };
    assert!(matches!(*value, Expr::Assignment { .. }));
  }

  #[test]
  fn compound_assignment_desugars() {
    let Stmt::Expression { expression, .. } = parse_one("a += 2;") else {
      panic!("expected expression");
    };
    let Expr::Assignment { target, value, .. } = expression else {
      panic!("expected assignment");
    };
    assert!(matches!(*target, Expr::Identifier { .. }));
    assert!(matches!(
      *value,
      Expr::Binary {
        operator: TokenKind::Plus,
        ..
      }
    ));
  }

  #[test]
  fn exponent_binds_tighter_than_product() {
    let Stmt::Expression { expression, .. } = parse_one("2 * 3 ** 4;") else {
      panic!("expected expression");
    };
    assert!(matches!(
      expression,
      Expr::Binary {
        operator: TokenKind::Star,
        ..
      }
    ));
  }

  #[test]
  fn class_with_superclass_and_statics() {
    let Stmt::Class {
      name,
      superclass,
      methods,
      statics,
      ..
    } = parse_one("class Dog : Animal { speak() { return 1; } static let legs = 4; }")
    else {
      panic!("expected class");
    };
    assert_eq!(name.lexeme, "Dog");
    assert_eq!(superclass.unwrap().lexeme, "Animal");
    assert_eq!(methods.len(), 1);
    assert_eq!(methods[0].0.lexeme, "speak");
    assert_eq!(statics.len(), 1);
  }

  #[test]
  fn method_with_function_keyword() {
    let Stmt::Class { methods, .. } = parse_one("class A { function init(n) { this.n = n; } }")
    else {
      panic!("expected class");
    };
    assert_eq!(methods[0].0.lexeme, "init");
    assert_eq!(methods[0].1.parameters.len(), 1);
  }

  #[test]
  fn for_in_both_spellings() {
    assert!(matches!(
      parse_one("for (x in xs) {}"),
      Stmt::ForIn { .. }
    ));
    assert!(matches!(parse_one("for (x : xs) {}"), Stmt::ForIn { .. }));
    assert!(matches!(parse_one("for x in xs {}"), Stmt::ForIn { .. }));
  }

  #[test]
  fn c_style_for() {
    let Stmt::For {
      initializer,
      condition,
      update,
      ..
    } = parse_one("for (let i = 0; i < 3; i = i + 1) {}")
    else {
      panic!("expected for");
    };
    assert!(initializer.is_some());
    assert!(condition.is_some());
    assert!(update.is_some());
  }

  #[test]
  fn import_forms() {
    assert!(matches!(
      parse_one("import { a, b as c } from \"m\";"),
      Stmt::Import {
        kind: ImportKind::Named(ref items),
        ..
      } if items.len() == 2 && items[1].1.is_some()
    ));
    assert!(matches!(
      parse_one("import * as m from \"m\";"),
      Stmt::Import {
        kind: ImportKind::Namespace(_),
        ..
      }
    ));
    assert!(matches!(
      parse_one("import \"m\";"),
      Stmt::Import {
        kind: ImportKind::All,
        ..
      }
    ));
  }

  #[test]
  fn switch_cases() {
    let Stmt::Switch { cases, .. } =
      parse_one("switch x { case 1: break; default: log 2; case 2: }")
    else {
      panic!("expected switch");
    };
    assert_eq!(cases.len(), 3);
    assert!(cases[0].value.is_some());
    assert!(cases[1].value.is_none());
  }

  #[test]
  fn template_string_parts() {
    let Stmt::Expression { expression, .. } = parse_one("`a %{1 + 2} b`;") else {
      panic!("expected expression");
    };
    let Expr::Template { parts, .. } = expression else {
      panic!("expected template");
    };
    assert_eq!(parts.len(), 3);
    assert!(matches!(parts[1], Expr::Binary { .. }));
  }

  #[test]
  fn error_recovery_reports_each_statement() {
    let diagnostics = parse_source("let = 1; let b = 2 let c;").unwrap_err();
    assert_eq!(diagnostics.len(), 2);
  }

  #[test]
  fn missing_semicolon_is_a_parse_error() {
    assert!(parse_source("log 1").is_err());
  }

  #[test]
  fn ternary_and_nullish_are_right_associative() {
    let Stmt::Expression { expression, .. } = parse_one("a ?? b ?? c;") else {
      panic!("expected expression");
    };
    let Expr::Binary { right, .. } = expression else {
      panic!("expected binary");
    };
    assert!(matches!(
      *right,
      Expr::Binary {
        operator: TokenKind::QuestionQuestion,
        ..
      }
    ));
  }

  #[test]
  fn new_with_and_without_arguments() {
    assert!(matches!(
      parse_one("new Dog(\"rex\");"),
      Stmt::Expression {
        expression: Expr::New { .. },
        ..
      }
    ));
    assert!(matches!(
      parse_one("new Dog;"),
      Stmt::Expression {
        expression: Expr::New { .. },
        ..
      }
    ));
  }

  #[test]
  fn unknown_character_is_a_syntax_error() {
    let diagnostics = parse_source("let a = $;").unwrap_err();
    assert_eq!(diagnostics[0].kind, crate::DiagnosticKind::Syntax);
  }
}
