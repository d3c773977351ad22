use crate::{coercion_hook, int_arg, string_arg, LibraryBuilder};
use meow_interpreter::{Arity, Class, HashKey, Instance, Library, Object, Unwind, Value};
use meow_syntax::{Diagnostic, DiagnosticKind, Severity, Token, TokenKind};

/// The functions injected into every global scope.
pub fn library() -> Library {
  LibraryBuilder::new()
    .function("print", Arity::at_least(0), |engine, args| {
      let mut separator = " ".to_string();
      let mut terminator = "\n".to_string();
      let mut count = args.len();

      // a trailing object may carry `sep` / `end` options
      if let Some(Value::Object(options)) = args.last() {
        let mut is_options = false;
        if let Some(Value::String(value)) = options.lookup(&HashKey::Str("sep".into())) {
          separator = value.to_string();
          is_options = true;
        }
        if let Some(Value::String(value)) = options.lookup(&HashKey::Str("end".into())) {
          terminator = value.to_string();
          is_options = true;
        }
        if is_options {
          count -= 1;
        }
      }

      let mut text = String::new();
      for (index, value) in args[..count].iter().enumerate() {
        if index > 0 {
          text.push_str(&separator);
        }
        text.push_str(&engine.stringify(value)?);
      }
      text.push_str(&terminator);

      engine.sink().clone().write(&text);
      Ok(Value::Null)
    })
    .function("len", Arity::fixed(1), |_, args| match &args[0] {
      Value::String(value) => Ok(Value::from(value.len())),
      Value::Array(value) => Ok(Value::from(value.len())),
      Value::Object(value) => Ok(Value::from(value.len())),
      other => Err(Unwind::exception(format!(
        "'len' applies to strings, arrays and objects, not {}",
        other.kind_name()
      ))),
    })
    .function("assert", Arity::range(1, 1), |_, args| {
      if args[0].is_truthy() {
        return Ok(Value::Null);
      }
      let message = match args.get(1) {
        Some(Value::String(message)) => message.to_string(),
        _ => "Assertion failed".to_string(),
      };
      // assertion failures carry the logic-error kind
      let token = Token::synthetic(TokenKind::Identifier, "assert");
      Err(Unwind::Failure(Box::new(Diagnostic::new(
        DiagnosticKind::Logic,
        Severity::Error,
        message,
        token,
      ))))
    })
    .function("typeof", Arity::fixed(1), |_, args| {
      Ok(Value::from(args[0].kind_name()))
    })
    .function("int", Arity::fixed(1), |engine, args| {
      if let Some(result) = coercion_hook(engine, &args[0], "__int__") {
        return result;
      }
      match &args[0] {
        Value::Int(value) => Ok(Value::Int(*value)),
        Value::Real(value) => Ok(Value::Int(real_to_int(*value))),
        Value::Bool(value) => Ok(Value::Int(i64::from(*value))),
        Value::String(text) => parse_int_text(text).map(Value::Int).ok_or_else(|| {
          Unwind::exception(format!("Cannot convert the string '{text}' to an integer"))
        }),
        other => Err(Unwind::exception(format!(
          "Cannot convert a value of type {} to an integer",
          other.kind_name()
        ))),
      }
    })
    .function("real", Arity::fixed(1), |engine, args| {
      if let Some(result) = coercion_hook(engine, &args[0], "__real__") {
        return result;
      }
      match &args[0] {
        Value::Int(value) => Ok(Value::Real(*value as f64)),
        Value::Real(value) => Ok(Value::Real(*value)),
        Value::Bool(value) => Ok(Value::Real(f64::from(u8::from(*value)))),
        Value::String(text) => match text.as_ref() {
          "NaN" => Ok(Value::Real(f64::NAN)),
          "Infinity" => Ok(Value::Real(f64::INFINITY)),
          "-Infinity" => Ok(Value::Real(f64::NEG_INFINITY)),
          _ => text.parse::<f64>().map(Value::Real).map_err(|_| {
            Unwind::exception(format!("Cannot convert the string '{text}' to a real"))
          }),
        },
        other => Err(Unwind::exception(format!(
          "Cannot convert a value of type {} to a real",
          other.kind_name()
        ))),
      }
    })
    .function("bool", Arity::fixed(1), |engine, args| {
      if let Some(result) = coercion_hook(engine, &args[0], "__bool__") {
        return result;
      }
      let value = match &args[0] {
        Value::Real(value) => *value != 0.0 && !value.is_nan(),
        other => other.is_truthy(),
      };
      Ok(Value::Bool(value))
    })
    .function("str", Arity::fixed(1), |engine, args| {
      Ok(Value::from(engine.stringify(&args[0])?))
    })
    .function("array", Arity::fixed(1), |engine, args| {
      if let Some(result) = coercion_hook(engine, &args[0], "__array__") {
        return result;
      }
      match &args[0] {
        Value::Array(array) => Ok(Value::Array(array.clone())),
        Value::String(text) => Ok(Value::from(
          text
            .as_bytes()
            .iter()
            .map(|byte| Value::from((*byte as char).to_string()))
            .collect::<Vec<_>>(),
        )),
        Value::Object(object) => Ok(Value::from(
          object
            .entries()
            .into_iter()
            .map(|(_, value)| value)
            .collect::<Vec<_>>(),
        )),
        other => Err(Unwind::exception(format!(
          "Cannot convert a value of type {} to an array",
          other.kind_name()
        ))),
      }
    })
    .function("object", Arity::fixed(1), |engine, args| {
      if let Some(result) = coercion_hook(engine, &args[0], "__object__") {
        return result;
      }
      match &args[0] {
        Value::Object(object) => Ok(Value::Object(object.clone())),
        Value::Array(array) => {
          let result = Object::new();
          for element in array.to_vec() {
            let Value::Array(pair) = element else {
              return Err(Unwind::exception(
                "Converting an array to an object needs [key, value] pairs",
              ));
            };
            let (Some(key), Some(value), 2) = (pair.get(0), pair.get(1), pair.len()) else {
              return Err(Unwind::exception(
                "Converting an array to an object needs [key, value] pairs",
              ));
            };
            let Some(key) = HashKey::from_value(&key) else {
              return Err(Unwind::exception(
                "Object keys must be ints, bools or strings",
              ));
            };
            result.insert(key, value);
          }
          Ok(Value::Object(result))
        }
        Value::Instance(instance) => {
          let result = Object::new();
          for (key, value) in instance.fields().entries() {
            result.insert(key, value);
          }
          result.insert(
            HashKey::Str("__class__".into()),
            Value::Class(instance.class().clone()),
          );
          Ok(Value::Object(result))
        }
        Value::Class(class) => {
          let result = Object::new();
          for (name, value) in class.static_entries() {
            result.insert(HashKey::Str(name.as_str().into()), value);
          }
          Ok(Value::Object(result))
        }
        other => Err(Unwind::exception(format!(
          "Cannot convert a value of type {} to an object",
          other.kind_name()
        ))),
      }
    })
    .function("instance", Arity::fixed(1), |_, args| match &args[0] {
      Value::Instance(instance) => Ok(Value::Instance(instance.clone())),
      Value::Object(object) => {
        let class_value = object.lookup(&HashKey::Str("__class__".into()));
        let Some(Value::Class(class)) = class_value else {
          return Err(Unwind::exception(
            "The object needs a '__class__' field to become an instance",
          ));
        };
        Ok(Value::Instance(instance_over(class, object.clone())))
      }
      other => Err(Unwind::exception(format!(
        "Cannot convert a value of type {} to an instance",
        other.kind_name()
      ))),
    })
    .function("range", Arity::range(1, 2), |_, args| {
      let (start, stop, step) = match args.len() {
        1 => (0, int_arg(args, 0, "range")?, 1),
        2 => (int_arg(args, 0, "range")?, int_arg(args, 1, "range")?, 1),
        _ => (
          int_arg(args, 0, "range")?,
          int_arg(args, 1, "range")?,
          int_arg(args, 2, "range")?,
        ),
      };
      if step == 0 {
        return Err(Unwind::exception("The 'step' of range() cannot be zero"));
      }

      let mut values = Vec::new();
      let mut current = start;
      while (step > 0 && current < stop) || (step < 0 && current > stop) {
        values.push(Value::Int(current));
        current += step;
      }
      Ok(Value::from(values))
    })
    .function("ord", Arity::fixed(1), |_, args| {
      let text = string_arg(args, 0, "ord")?;
      if text.len() != 1 {
        return Err(Unwind::exception(
          "'ord' accepts exactly one character",
        ));
      }
      Ok(Value::Int(i64::from(text.as_bytes()[0])))
    })
    .function("chr", Arity::fixed(1), |_, args| {
      let code = int_arg(args, 0, "chr")?;
      if !(0..=255).contains(&code) {
        return Err(Unwind::exception("'chr' expects a code in [0, 255]"));
      }
      Ok(Value::from(((code as u8) as char).to_string()))
    })
    .finish()
}

fn instance_over(class: Class, fields: Object) -> Instance {
  Instance::with_fields(class, fields)
}

fn real_to_int(value: f64) -> i64 {
  if value.is_nan() {
    0
  } else if value == f64::INFINITY {
    i64::MAX
  } else if value == f64::NEG_INFINITY {
    i64::MIN
  } else {
    value as i64
  }
}

fn parse_int_text(text: &str) -> Option<i64> {
  if let Some(digits) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
    i64::from_str_radix(digits, 16).ok()
  } else if let Some(digits) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
    i64::from_str_radix(digits, 2).ok()
  } else if let Some(digits) = text.strip_prefix("0o").or_else(|| text.strip_prefix("0O")) {
    i64::from_str_radix(digits, 8).ok()
  } else {
    text.parse().ok()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn int_text_parsing() {
    assert_eq!(parse_int_text("42"), Some(42));
    assert_eq!(parse_int_text("-42"), Some(-42));
    assert_eq!(parse_int_text("0xFF"), Some(255));
    assert_eq!(parse_int_text("0b101"), Some(5));
    assert_eq!(parse_int_text("0o17"), Some(15));
    assert_eq!(parse_int_text("nope"), None);
  }

  #[test]
  fn real_to_int_edges() {
    assert_eq!(real_to_int(f64::NAN), 0);
    assert_eq!(real_to_int(f64::INFINITY), i64::MAX);
    assert_eq!(real_to_int(f64::NEG_INFINITY), i64::MIN);
    assert_eq!(real_to_int(2.9), 2);
  }
}
