use crate::{object_arg, LibraryBuilder};
use meow_interpreter::{Arity, HashKey, Library, Object, Unwind, Value};

pub fn library() -> Library {
  LibraryBuilder::new()
    .function("keys", Arity::fixed(1), |_, args| {
      let object = object_arg(args, 0, "keys")?;
      let keys: Vec<Value> = object
        .entries()
        .into_iter()
        .map(|(key, _)| key.to_value())
        .collect();
      Ok(Value::from(keys))
    })
    .function("values", Arity::fixed(1), |_, args| {
      let object = object_arg(args, 0, "values")?;
      let values: Vec<Value> = object.entries().into_iter().map(|(_, value)| value).collect();
      Ok(Value::from(values))
    })
    .function("entries", Arity::fixed(1), |_, args| {
      let object = object_arg(args, 0, "entries")?;
      let entries: Vec<Value> = object
        .entries()
        .into_iter()
        .map(|(key, value)| Value::from(vec![key.to_value(), value]))
        .collect();
      Ok(Value::from(entries))
    })
    .function("has", Arity::fixed(2), |_, args| {
      let object = object_arg(args, 0, "has")?;
      let present = match HashKey::from_value(&args[1]) {
        Some(key) => object.contains(&key),
        None => false,
      };
      Ok(Value::Bool(present))
    })
    .function("merge", Arity::at_least(1), |_, args| {
      let merged = Object::new();
      for argument in args {
        let Value::Object(object) = argument else {
          return Err(Unwind::exception("'merge' only accepts objects"));
        };
        for (key, value) in object.entries() {
          merged.insert(key, value);
        }
      }
      Ok(Value::Object(merged))
    })
    .finish()
}
