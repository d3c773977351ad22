use super::functions::{Arity, NativeFunction};
use super::{Instance, Value};
use crate::modules::NativeLibraries;
use ahash::AHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Keys an object may be indexed by. Only ints, bools and strings hash.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum HashKey {
  Int(i64),
  Bool(bool),
  Str(Rc<str>),
}

impl HashKey {
  pub fn from_value(value: &Value) -> Option<HashKey> {
    match value {
      Value::Int(value) => Some(HashKey::Int(*value)),
      Value::Bool(value) => Some(HashKey::Bool(*value)),
      Value::String(value) => Some(HashKey::Str(Rc::clone(value))),
      _ => None,
    }
  }

  pub fn to_value(&self) -> Value {
    match self {
      HashKey::Int(value) => Value::Int(*value),
      HashKey::Bool(value) => Value::Bool(*value),
      HashKey::Str(value) => Value::String(Rc::clone(value)),
    }
  }
}

/// A shared, mutable, ordered sequence of values.
#[derive(Clone)]
pub struct Array(Rc<RefCell<Vec<Value>>>);

impl Array {
  pub fn new() -> Array {
    Array(Rc::new(RefCell::new(Vec::new())))
  }

  pub fn len(&self) -> usize {
    self.0.borrow().len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.borrow().is_empty()
  }

  pub fn get(&self, index: usize) -> Option<Value> {
    self.0.borrow().get(index).cloned()
  }

  pub fn push(&self, value: Value) {
    self.0.borrow_mut().push(value);
  }

  /// A snapshot of the current elements.
  pub fn to_vec(&self) -> Vec<Value> {
    self.0.borrow().clone()
  }

  pub fn with<T>(&self, action: impl FnOnce(&mut Vec<Value>) -> T) -> T {
    action(&mut self.0.borrow_mut())
  }

  pub fn ptr_eq(&self, other: &Array) -> bool {
    Rc::ptr_eq(&self.0, &other.0)
  }
}

impl Default for Array {
  fn default() -> Self {
    Self::new()
  }
}

impl From<Vec<Value>> for Array {
  fn from(values: Vec<Value>) -> Array {
    Array(Rc::new(RefCell::new(values)))
  }
}

/// A shared, mutable mapping from hashable keys to values.
#[derive(Clone)]
pub struct Object(Rc<RefCell<AHashMap<HashKey, Value>>>);

impl Object {
  pub fn new() -> Object {
    Object(Rc::new(RefCell::new(AHashMap::new())))
  }

  pub fn len(&self) -> usize {
    self.0.borrow().len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.borrow().is_empty()
  }

  pub fn lookup(&self, key: &HashKey) -> Option<Value> {
    self.0.borrow().get(key).cloned()
  }

  pub fn contains(&self, key: &HashKey) -> bool {
    self.0.borrow().contains_key(key)
  }

  pub fn insert(&self, key: HashKey, value: Value) {
    self.0.borrow_mut().insert(key, value);
  }

  /// A snapshot of the current entries, in no guaranteed order.
  pub fn entries(&self) -> Vec<(HashKey, Value)> {
    self
      .0
      .borrow()
      .iter()
      .map(|(key, value)| (key.clone(), value.clone()))
      .collect()
  }

  pub fn ptr_eq(&self, other: &Object) -> bool {
    Rc::ptr_eq(&self.0, &other.0)
  }
}

impl Default for Object {
  fn default() -> Self {
    Self::new()
  }
}

/// Wrap a library function so the receiver becomes the implicit first
/// argument, the way `xs.push(1)` forwards to `array.push(xs, 1)`. The
/// reported required-arity drops by one to account for the receiver.
fn bind_helper(name: &str, receiver: &Value, function: &Value) -> Value {
  let arity = match function {
    Value::Function(function) => function.arity(),
    _ => Arity::fixed(0),
  };
  let bound_arity = Arity {
    required: arity.required.saturating_sub(1),
    ..arity
  };

  let receiver = receiver.clone();
  let function = function.clone();
  NativeFunction::create(name, bound_arity, move |engine, args| {
    let mut full = Vec::with_capacity(args.len() + 1);
    full.push(receiver.clone());
    full.extend_from_slice(args);
    engine.call_value(&function, full)
  })
}

pub(crate) fn array_get(
  array: &Array,
  key: &Value,
  libraries: &NativeLibraries,
) -> Result<Value, String> {
  if let Value::String(name) = key {
    if name.as_ref() == "length" {
      return Ok(Value::from(array.len()));
    }
    if let Some(function) = libraries.array.get(name.as_ref()) {
      return Ok(bind_helper(name, &Value::Array(array.clone()), function));
    }
  }

  if let Value::Int(index) = key {
    let in_range = usize::try_from(*index).ok().and_then(|position| array.get(position));
    return in_range.ok_or_else(|| {
      format!("Array index {index} is out of range (length {})", array.len())
    });
  }

  Err(format!(
    "Cannot index an array with a value of type {}",
    key.kind_name()
  ))
}

pub(crate) fn array_set(array: &Array, key: &Value, value: Value) -> Result<(), String> {
  let Value::Int(index) = key else {
    return Err(format!(
      "Array indices must be integers, not {}",
      key.kind_name()
    ));
  };

  let length = array.len();
  match usize::try_from(*index) {
    Ok(index) if index < length => {
      array.with(|elements| elements[index] = value);
      Ok(())
    }
    _ => Err(format!("Array index {index} is out of range (length {length})")),
  }
}

pub(crate) fn object_get(
  object: &Object,
  key: &Value,
  libraries: &NativeLibraries,
) -> Result<Value, String> {
  let Some(hash_key) = HashKey::from_value(key) else {
    return Err(format!(
      "A value of type {} cannot be used as an object key",
      key.kind_name()
    ));
  };

  if let Some(value) = object.lookup(&hash_key) {
    return Ok(value);
  }

  if let Value::String(name) = key {
    if let Some(function) = libraries.object.get(name.as_ref()) {
      return Ok(bind_helper(name, &Value::Object(object.clone()), function));
    }
  }

  Ok(Value::Null)
}

pub(crate) fn object_set(object: &Object, key: &Value, value: Value) -> Result<(), String> {
  let Some(hash_key) = HashKey::from_value(key) else {
    return Err(format!(
      "A value of type {} cannot be used as an object key",
      key.kind_name()
    ));
  };
  object.insert(hash_key, value);
  Ok(())
}

pub(crate) fn string_get(
  string: &Rc<str>,
  key: &Value,
  libraries: &NativeLibraries,
) -> Result<Value, String> {
  if let Value::String(name) = key {
    if name.as_ref() == "length" {
      return Ok(Value::from(string.len()));
    }
    if let Some(function) = libraries.string.get(name.as_ref()) {
      return Ok(bind_helper(
        name,
        &Value::String(Rc::clone(string)),
        function,
      ));
    }
  }

  if let Value::Int(index) = key {
    let bytes = string.as_bytes();
    return match usize::try_from(*index) {
      Ok(position) if position < bytes.len() => {
        Ok(Value::from((bytes[position] as char).to_string()))
      }
      _ => Err(format!(
        "String index {index} is out of range (length {})",
        bytes.len()
      )),
    };
  }

  Err(format!(
    "Cannot index a string with a value of type {}",
    key.kind_name()
  ))
}

/// Cursor over an iterable value. Instance iteration is driven by the
/// evaluator because `__next__` is a script call.
pub enum ValueIterator {
  Array { array: Array, index: usize },
  Str { string: Rc<str>, index: usize },
  Entries { entries: Vec<(HashKey, Value)>, index: usize },
  Instance { iterator: Instance, next: Option<Value> },
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hash_keys_for_scalars_only() {
    assert!(HashKey::from_value(&Value::Int(1)).is_some());
    assert!(HashKey::from_value(&Value::Bool(true)).is_some());
    assert!(HashKey::from_value(&Value::from("k")).is_some());
    assert!(HashKey::from_value(&Value::Null).is_none());
    assert!(HashKey::from_value(&Value::Real(1.0)).is_none());
    assert!(HashKey::from_value(&Value::from(Vec::new())).is_none());
  }

  #[test]
  fn object_set_then_get_round_trips() {
    let object = Object::new();
    object.insert(HashKey::Int(3), Value::from("three"));
    assert_eq!(object.lookup(&HashKey::Int(3)), Some(Value::from("three")));
    assert_eq!(object.lookup(&HashKey::Int(4)), None);
  }

  #[test]
  fn array_set_requires_index_in_range() {
    let array = Array::from(vec![Value::Int(1), Value::Int(2)]);
    assert!(array_set(&array, &Value::Int(1), Value::Int(9)).is_ok());
    assert!(array_set(&array, &Value::Int(2), Value::Int(9)).is_err());
    assert!(array_set(&array, &Value::Int(-1), Value::Int(9)).is_err());
    assert_eq!(array.get(1), Some(Value::Int(9)));
  }
}
