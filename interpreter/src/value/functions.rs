use super::{Instance, Value};
use crate::environment::Environment;
use crate::interpreter::{Interpreter, Unwind};
use meow_syntax::ast::FunctionLiteral;
use std::fmt;
use std::rc::Rc;

/// How many positional arguments a callable accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Arity {
  pub required: usize,
  pub optional: usize,
  pub variadic: bool,
}

impl Arity {
  pub fn fixed(count: usize) -> Arity {
    Arity {
      required: count,
      optional: 0,
      variadic: false,
    }
  }

  pub fn range(required: usize, optional: usize) -> Arity {
    Arity {
      required,
      optional,
      variadic: false,
    }
  }

  pub fn at_least(required: usize) -> Arity {
    Arity {
      required,
      optional: 0,
      variadic: true,
    }
  }
}

/// A function written in the language: a shared parsed literal plus the
/// environment it closed over.
pub struct ScriptFunction {
  pub literal: Rc<FunctionLiteral>,
  pub closure: Environment,
}

impl ScriptFunction {
  pub fn arity(&self) -> Arity {
    if self.literal.rest_parameter.is_some() {
      Arity::at_least(self.literal.parameters.len())
    } else {
      Arity::fixed(self.literal.parameters.len())
    }
  }
}

type NativeFn = Box<dyn Fn(&mut Interpreter, &[Value]) -> Result<Value, Unwind>>;

/// A function provided by the host. Boxed closures so bound helpers can
/// capture their receiver.
pub struct NativeFunction {
  pub name: String,
  pub arity: Arity,
  pub func: NativeFn,
}

impl NativeFunction {
  pub fn new(
    name: impl Into<String>,
    arity: Arity,
    func: impl Fn(&mut Interpreter, &[Value]) -> Result<Value, Unwind> + 'static,
  ) -> NativeFunction {
    NativeFunction {
      name: name.into(),
      arity,
      func: Box::new(func),
    }
  }

  pub fn create(
    name: impl Into<String>,
    arity: Arity,
    func: impl Fn(&mut Interpreter, &[Value]) -> Result<Value, Unwind> + 'static,
  ) -> Value {
    Value::Function(Function::Native(Rc::new(Self::new(name, arity, func))))
  }
}

impl fmt::Debug for NativeFunction {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "NativeFunction({})", self.name)
  }
}

/// Any callable that is not a class, instance or bound method.
#[derive(Clone)]
pub enum Function {
  Script(Rc<ScriptFunction>),
  Native(Rc<NativeFunction>),
}

impl Function {
  pub fn arity(&self) -> Arity {
    match self {
      Self::Script(function) => function.arity(),
      Self::Native(function) => function.arity,
    }
  }

  pub fn ptr_eq(&self, other: &Function) -> bool {
    match (self, other) {
      (Self::Script(a), Self::Script(b)) => Rc::ptr_eq(a, b),
      (Self::Native(a), Self::Native(b)) => Rc::ptr_eq(a, b),
      _ => false,
    }
  }
}

impl From<ScriptFunction> for Value {
  fn from(function: ScriptFunction) -> Value {
    Value::Function(Function::Script(Rc::new(function)))
  }
}

impl From<NativeFunction> for Value {
  fn from(function: NativeFunction) -> Value {
    Value::Function(Function::Native(Rc::new(function)))
  }
}

/// A function paired with the instance that supplies `this` at call time.
pub struct BoundMethod {
  pub instance: Instance,
  pub function: Function,
}

impl BoundMethod {
  pub fn bind(instance: Instance, function: Function) -> Value {
    Value::BoundMethod(Rc::new(BoundMethod { instance, function }))
  }

  /// Bound methods expose their parts through indexing.
  pub fn get(&self, key: &Value) -> Value {
    match key {
      Value::String(name) if name.as_ref() == "__instance__" => {
        Value::Instance(self.instance.clone())
      }
      Value::String(name) if name.as_ref() == "__function__" => {
        Value::Function(self.function.clone())
      }
      _ => Value::Null,
    }
  }
}
