use super::statement::Stmt;
use crate::tokens::{Token, TokenKind};
use std::rc::Rc;

/// A function literal. `Rc`-shared so the closure values created at runtime
/// and the class method tables can all point at one parsed body.
#[derive(Debug)]
pub struct FunctionLiteral {
  pub token: Token,
  pub parameters: Vec<Token>,
  pub rest_parameter: Option<Token>,
  pub body: Stmt,
}

#[derive(Clone, Debug)]
pub enum Expr {
  Integer {
    token: Token,
    value: i64,
  },
  Real {
    token: Token,
    value: f64,
  },
  String {
    token: Token,
    value: String,
  },
  Boolean {
    token: Token,
    value: bool,
  },
  Null {
    token: Token,
  },
  Array {
    token: Token,
    elements: Vec<Expr>,
  },
  Object {
    token: Token,
    properties: Vec<(Expr, Expr)>,
  },
  Function(Rc<FunctionLiteral>),
  Template {
    token: Token,
    parts: Vec<Expr>,
  },
  Identifier {
    token: Token,
    name: String,
  },
  Binary {
    token: Token,
    operator: TokenKind,
    left: Box<Expr>,
    right: Box<Expr>,
  },
  Unary {
    token: Token,
    operator: TokenKind,
    operand: Box<Expr>,
  },
  Call {
    token: Token,
    callee: Box<Expr>,
    arguments: Vec<Expr>,
  },
  Index {
    token: Token,
    receiver: Box<Expr>,
    index: Box<Expr>,
  },
  Assignment {
    token: Token,
    target: Box<Expr>,
    value: Box<Expr>,
  },
  Ternary {
    token: Token,
    condition: Box<Expr>,
    then_branch: Box<Expr>,
    else_branch: Box<Expr>,
  },
  PropertyAccess {
    token: Token,
    object: Box<Expr>,
    property: Token,
  },
  PropertyAssignment {
    token: Token,
    object: Box<Expr>,
    property: Token,
    value: Box<Expr>,
  },
  This {
    token: Token,
  },
  Super {
    token: Token,
    method: Option<Token>,
    is_constructor_call: bool,
  },
  New {
    token: Token,
    call: Box<Expr>,
  },
  PrefixUpdate {
    token: Token,
    operator: TokenKind,
    operand: Box<Expr>,
  },
  PostfixUpdate {
    token: Token,
    operator: TokenKind,
    operand: Box<Expr>,
  },
  Spread {
    token: Token,
    expression: Box<Expr>,
  },
}

impl Expr {
  /// The token the expression begins at, for diagnostics.
  pub fn token(&self) -> &Token {
    match self {
      Expr::Integer { token, .. }
      | Expr::Real { token, .. }
      | Expr::String { token, .. }
      | Expr::Boolean { token, .. }
      | Expr::Null { token }
      | Expr::Array { token, .. }
      | Expr::Object { token, .. }
      | Expr::Template { token, .. }
      | Expr::Identifier { token, .. }
      | Expr::Binary { token, .. }
      | Expr::Unary { token, .. }
      | Expr::Call { token, .. }
      | Expr::Index { token, .. }
      | Expr::Assignment { token, .. }
      | Expr::Ternary { token, .. }
      | Expr::PropertyAccess { token, .. }
      | Expr::PropertyAssignment { token, .. }
      | Expr::This { token }
      | Expr::Super { token, .. }
      | Expr::New { token, .. }
      | Expr::PrefixUpdate { token, .. }
      | Expr::PostfixUpdate { token, .. }
      | Expr::Spread { token, .. } => token,
      Expr::Function(literal) => &literal.token,
    }
  }

  pub fn is_valid_assignment_target(&self) -> bool {
    matches!(
      self,
      Expr::Identifier { .. } | Expr::Index { .. } | Expr::PropertyAccess { .. }
    )
  }
}
