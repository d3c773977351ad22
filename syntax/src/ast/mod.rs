pub mod expression;
pub mod statement;

pub use expression::{Expr, FunctionLiteral};
pub use statement::{ImportKind, Program, Stmt, SwitchCase};
