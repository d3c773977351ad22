use crate::{array_arg, callable_arg, int_arg, LibraryBuilder};
use meow_interpreter::{Arity, Library, Unwind, Value};
use std::cmp::Ordering;

pub fn library() -> Library {
  LibraryBuilder::new()
    .function("push", Arity::at_least(2), |_, args| {
      let array = array_arg(args, 0, "push")?;
      for value in &args[1..] {
        array.push(value.clone());
      }
      Ok(Value::from(array.len()))
    })
    .function("pop", Arity::fixed(1), |_, args| {
      let array = array_arg(args, 0, "pop")?;
      Ok(array.with(|elements| elements.pop()).into())
    })
    .function("slice", Arity::range(1, 2), |_, args| {
      let array = array_arg(args, 0, "slice")?;
      let length = array.len() as i64;

      let mut start = match args.get(1) {
        Some(_) => int_arg(args, 1, "slice")?,
        None => 0,
      };
      let mut end = match args.get(2) {
        Some(_) => int_arg(args, 2, "slice")?,
        None => length,
      };
      if start < 0 {
        start += length;
      }
      if end < 0 {
        end += length;
      }
      let start = start.max(0) as usize;
      let end = (end.max(0) as usize).min(array.len());

      let slice = if start < end {
        array.to_vec()[start..end].to_vec()
      } else {
        Vec::new()
      };
      Ok(Value::from(slice))
    })
    .function("map", Arity::fixed(2), |engine, args| {
      let array = array_arg(args, 0, "map")?;
      let callback = callable_arg(args, 1, "map")?;

      let mut mapped = Vec::with_capacity(array.len());
      for element in array.to_vec() {
        mapped.push(engine.call_value(&callback, vec![element])?);
      }
      Ok(Value::from(mapped))
    })
    .function("filter", Arity::fixed(2), |engine, args| {
      let array = array_arg(args, 0, "filter")?;
      let callback = callable_arg(args, 1, "filter")?;

      let mut kept = Vec::new();
      for element in array.to_vec() {
        if engine.call_value(&callback, vec![element.clone()])?.is_truthy() {
          kept.push(element);
        }
      }
      Ok(Value::from(kept))
    })
    .function("reduce", Arity::fixed(3), |engine, args| {
      let array = array_arg(args, 0, "reduce")?;
      let callback = callable_arg(args, 1, "reduce")?;

      let mut accumulator = args[2].clone();
      for element in array.to_vec() {
        accumulator = engine.call_value(&callback, vec![accumulator, element])?;
      }
      Ok(accumulator)
    })
    .function("forEach", Arity::fixed(2), |engine, args| {
      let array = array_arg(args, 0, "forEach")?;
      let callback = callable_arg(args, 1, "forEach")?;

      for (index, element) in array.to_vec().into_iter().enumerate() {
        engine.call_value(&callback, vec![element, Value::from(index)])?;
      }
      Ok(Value::Null)
    })
    .function("find", Arity::fixed(2), |engine, args| {
      let array = array_arg(args, 0, "find")?;
      let callback = callable_arg(args, 1, "find")?;

      for (index, element) in array.to_vec().into_iter().enumerate() {
        let keep = engine.call_value(&callback, vec![element.clone(), Value::from(index)])?;
        if keep.is_truthy() {
          return Ok(element);
        }
      }
      Ok(Value::Null)
    })
    .function("findIndex", Arity::fixed(2), |engine, args| {
      let array = array_arg(args, 0, "findIndex")?;
      let callback = callable_arg(args, 1, "findIndex")?;

      for (index, element) in array.to_vec().into_iter().enumerate() {
        let keep = engine.call_value(&callback, vec![element, Value::from(index)])?;
        if keep.is_truthy() {
          return Ok(Value::from(index));
        }
      }
      Ok(Value::Int(-1))
    })
    .function("reverse", Arity::fixed(1), |_, args| {
      let array = array_arg(args, 0, "reverse")?;
      array.with(|elements| elements.reverse());
      Ok(args[0].clone())
    })
    .function("sort", Arity::range(1, 1), |engine, args| {
      let array = array_arg(args, 0, "sort")?;
      let comparator = args.get(1).cloned();

      let mut elements = array.to_vec();
      let mut failure: Option<Unwind> = None;

      elements.sort_by(|a, b| {
        if failure.is_some() {
          return Ordering::Equal;
        }
        match compare(engine, comparator.as_ref(), a, b) {
          Ok(ordering) => ordering,
          Err(unwind) => {
            failure = Some(unwind);
            Ordering::Equal
          }
        }
      });

      if let Some(unwind) = failure {
        return Err(unwind);
      }
      array.with(|current| *current = elements);
      Ok(args[0].clone())
    })
    .function("reserve", Arity::fixed(2), |_, args| {
      let array = array_arg(args, 0, "reserve")?;
      let capacity = int_arg(args, 1, "reserve")?;
      if capacity < 0 {
        return Err(Unwind::exception("Cannot reserve a negative capacity"));
      }
      array.with(|elements| elements.reserve(capacity as usize));
      Ok(Value::Null)
    })
    .function("resize", Arity::range(2, 1), |_, args| {
      let array = array_arg(args, 0, "resize")?;
      let size = int_arg(args, 1, "resize")?;
      if size < 0 {
        return Err(Unwind::exception("Cannot resize to a negative length"));
      }
      let fill = args.get(2).cloned().unwrap_or(Value::Null);
      array.with(|elements| elements.resize(size as usize, fill));
      Ok(Value::Null)
    })
    .function("size", Arity::fixed(1), |_, args| {
      Ok(Value::from(array_arg(args, 0, "size")?.len()))
    })
    .finish()
}

fn compare(
  engine: &mut meow_interpreter::Interpreter,
  comparator: Option<&Value>,
  a: &Value,
  b: &Value,
) -> Result<Ordering, Unwind> {
  if let Some(comparator) = comparator {
    let result = engine.call_value(comparator, vec![a.clone(), b.clone()])?;
    let before = match result {
      Value::Int(value) => value < 0,
      Value::Real(value) => value < 0.0,
      _ => false,
    };
    return Ok(if before { Ordering::Less } else { Ordering::Greater });
  }

  match (a, b) {
    (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
    (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
    (Value::Int(_) | Value::Real(_) | Value::Bool(_), Value::Int(_) | Value::Real(_) | Value::Bool(_)) => {
      let (a, b) = (numeric(a), numeric(b));
      Ok(a.partial_cmp(&b).unwrap_or(Ordering::Equal))
    }
    _ => Err(Unwind::exception(
      "The default sort cannot compare values of different types",
    )),
  }
}

fn numeric(value: &Value) -> f64 {
  match value {
    Value::Int(value) => *value as f64,
    Value::Real(value) => *value,
    Value::Bool(value) => f64::from(u8::from(*value)),
    _ => f64::NAN,
  }
}
