mod arrays;
mod core;
mod io;
mod json;
mod math;
mod meta;
mod objects;
mod random;
mod strings;
mod system;
mod time;

use ahash::AHashMap;
use meow_interpreter::{
  Arity, Array, Execution, Interpreter, Library, NativeFunction, NativeModules, Object, Unwind,
  Value,
};
use std::rc::Rc;

/// Every native library, keyed by its import name. `core` is special-cased
/// by the module manager: it is injected into global scope, not imported.
pub fn native_modules() -> NativeModules {
  let mut modules = AHashMap::new();
  modules.insert("core".to_string(), core::library());
  modules.insert("math".to_string(), math::library());
  modules.insert("string".to_string(), strings::library());
  modules.insert("array".to_string(), arrays::library());
  modules.insert("object".to_string(), objects::library());
  modules.insert("io".to_string(), io::library());
  modules.insert("system".to_string(), system::library());
  modules.insert("time".to_string(), time::library());
  modules.insert("random".to_string(), random::library());
  modules.insert("json".to_string(), json::library());
  modules.insert("meta".to_string(), meta::library());
  modules
}

pub(crate) struct LibraryBuilder {
  contents: AHashMap<String, Value>,
}

impl LibraryBuilder {
  pub fn new() -> LibraryBuilder {
    LibraryBuilder {
      contents: AHashMap::new(),
    }
  }

  pub fn value(mut self, name: &str, value: impl Into<Value>) -> LibraryBuilder {
    self.contents.insert(name.to_string(), value.into());
    self
  }

  pub fn function(
    mut self,
    name: &'static str,
    arity: Arity,
    function: impl Fn(&mut Interpreter, &[Value]) -> Execution + 'static,
  ) -> LibraryBuilder {
    self
      .contents
      .insert(name.to_string(), NativeFunction::create(name, arity, function));
    self
  }

  pub fn finish(self) -> Library {
    Rc::new(self.contents)
  }
}

// ==== argument accessors shared by the libraries ====

pub(crate) fn string_arg(args: &[Value], index: usize, function: &str) -> Result<Rc<str>, Unwind> {
  match args.get(index) {
    Some(Value::String(value)) => Ok(Rc::clone(value)),
    _ => Err(Unwind::exception(format!(
      "'{function}' expects a string as argument {}",
      index + 1
    ))),
  }
}

pub(crate) fn int_arg(args: &[Value], index: usize, function: &str) -> Result<i64, Unwind> {
  match args.get(index) {
    Some(Value::Int(value)) => Ok(*value),
    _ => Err(Unwind::exception(format!(
      "'{function}' expects an integer as argument {}",
      index + 1
    ))),
  }
}

pub(crate) fn numeric_arg(args: &[Value], index: usize, function: &str) -> Result<f64, Unwind> {
  match args.get(index) {
    Some(Value::Int(value)) => Ok(*value as f64),
    Some(Value::Real(value)) => Ok(*value),
    Some(Value::Bool(value)) => Ok(f64::from(u8::from(*value))),
    _ => Err(Unwind::exception(format!(
      "'{function}' expects a number as argument {}",
      index + 1
    ))),
  }
}

pub(crate) fn array_arg(args: &[Value], index: usize, function: &str) -> Result<Array, Unwind> {
  match args.get(index) {
    Some(Value::Array(value)) => Ok(value.clone()),
    _ => Err(Unwind::exception(format!(
      "'{function}' expects an array as argument {}",
      index + 1
    ))),
  }
}

pub(crate) fn object_arg(args: &[Value], index: usize, function: &str) -> Result<Object, Unwind> {
  match args.get(index) {
    Some(Value::Object(value)) => Ok(value.clone()),
    _ => Err(Unwind::exception(format!(
      "'{function}' expects an object as argument {}",
      index + 1
    ))),
  }
}

pub(crate) fn callable_arg(args: &[Value], index: usize, function: &str) -> Result<Value, Unwind> {
  match args.get(index) {
    Some(value @ (Value::Function(_) | Value::Class(_) | Value::BoundMethod(_))) => {
      Ok(value.clone())
    }
    Some(value @ Value::Instance(_)) => Ok(value.clone()),
    _ => Err(Unwind::exception(format!(
      "'{function}' expects a callable as argument {}",
      index + 1
    ))),
  }
}

/// Run an instance's coercion hook (`__int__`, `__bool__`, ...) if it has
/// one, short-circuiting the built-in conversion.
pub(crate) fn coercion_hook(
  engine: &mut Interpreter,
  value: &Value,
  name: &str,
) -> Option<Execution> {
  match value {
    Value::Instance(instance) => engine.call_dunder(instance, name, Vec::new()),
    _ => None,
  }
}
