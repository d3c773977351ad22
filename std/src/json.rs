use crate::{int_arg, string_arg, LibraryBuilder};
use meow_interpreter::{Arity, HashKey, Library, Object, Unwind, Value};

pub fn library() -> Library {
  LibraryBuilder::new()
    .function("parse", Arity::fixed(1), |_, args| {
      let text = string_arg(args, 0, "parse")?;
      let mut parser = JsonParser::new(&text);
      let value = parser.document().map_err(|message| {
        Unwind::exception(format!("JSON syntax error: {message}"))
      })?;
      Ok(value)
    })
    .function("stringify", Arity::range(1, 2), |_, args| {
      let indent_level = match args.get(1) {
        Some(_) => int_arg(args, 1, "stringify")?.max(0) as usize,
        None => 0,
      };
      let tab_size = match args.get(2) {
        Some(_) => int_arg(args, 2, "stringify")?.max(0) as usize,
        None => 2,
      };
      Ok(Value::from(stringify(&args[0], indent_level, tab_size)))
    })
    .finish()
}

struct JsonParser<'json> {
  bytes: &'json [u8],
  position: usize,
}

impl<'json> JsonParser<'json> {
  fn new(text: &'json str) -> JsonParser<'json> {
    JsonParser {
      bytes: text.as_bytes(),
      position: 0,
    }
  }

  fn peek(&self) -> u8 {
    self.bytes.get(self.position).copied().unwrap_or(0)
  }

  fn advance(&mut self) {
    if self.position < self.bytes.len() {
      self.position += 1;
    }
  }

  fn skip_whitespace(&mut self) {
    while self.peek().is_ascii_whitespace() {
      self.advance();
    }
  }

  fn expect(&mut self, expected: u8) -> Result<(), String> {
    self.skip_whitespace();
    if self.peek() != expected {
      return Err(format!(
        "expected '{}' but found '{}'",
        expected as char, self.peek() as char
      ));
    }
    self.advance();
    Ok(())
  }

  fn document(&mut self) -> Result<Value, String> {
    let value = self.value()?;
    self.skip_whitespace();
    if self.position != self.bytes.len() {
      return Err("extra characters after the JSON document".to_string());
    }
    Ok(value)
  }

  fn value(&mut self) -> Result<Value, String> {
    self.skip_whitespace();
    match self.peek() {
      0 => Err("unexpected end of input".to_string()),
      b'{' => self.object(),
      b'[' => self.array(),
      b'"' => self.string().map(Value::from),
      b't' => self.literal("true", Value::Bool(true)),
      b'f' => self.literal("false", Value::Bool(false)),
      b'n' => self.literal("null", Value::Null),
      b'0'..=b'9' | b'-' => self.number(),
      other => Err(format!("unexpected character '{}'", other as char)),
    }
  }

  fn object(&mut self) -> Result<Value, String> {
    self.expect(b'{')?;
    let object = Object::new();

    self.skip_whitespace();
    if self.peek() == b'}' {
      self.advance();
      return Ok(Value::Object(object));
    }

    loop {
      self.skip_whitespace();
      let key = self.string()?;
      self.expect(b':')?;
      let value = self.value()?;
      object.insert(HashKey::Str(key.into()), value);

      self.skip_whitespace();
      match self.peek() {
        b',' => self.advance(),
        b'}' => {
          self.advance();
          break;
        }
        _ => return Err("expected ',' or '}' in an object".to_string()),
      }
    }
    Ok(Value::Object(object))
  }

  fn array(&mut self) -> Result<Value, String> {
    self.expect(b'[')?;
    let mut elements = Vec::new();

    self.skip_whitespace();
    if self.peek() == b']' {
      self.advance();
      return Ok(Value::from(elements));
    }

    loop {
      elements.push(self.value()?);
      self.skip_whitespace();
      match self.peek() {
        b',' => self.advance(),
        b']' => {
          self.advance();
          break;
        }
        _ => return Err("expected ',' or ']' in an array".to_string()),
      }
    }
    Ok(Value::from(elements))
  }

  fn string(&mut self) -> Result<String, String> {
    self.expect(b'"')?;
    let mut out = Vec::new();

    loop {
      match self.peek() {
        0 => return Err("unterminated string".to_string()),
        b'"' => {
          self.advance();
          break;
        }
        b'\\' => {
          self.advance();
          match self.peek() {
            b'"' => out.push(b'"'),
            b'\\' => out.push(b'\\'),
            b'/' => out.push(b'/'),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0C),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'u' => {
              self.advance();
              let mut code = 0u32;
              for _ in 0..4 {
                let digit = (self.peek() as char)
                  .to_digit(16)
                  .ok_or_else(|| "invalid hex in \\u escape".to_string())?;
                code = code * 16 + digit;
                self.advance();
              }
              let mut buffer = [0u8; 4];
              let encoded = char::from_u32(code)
                .unwrap_or(char::REPLACEMENT_CHARACTER)
                .encode_utf8(&mut buffer);
              out.extend_from_slice(encoded.as_bytes());
              continue;
            }
            other => out.push(other),
          }
          self.advance();
        }
        other => {
          out.push(other);
          self.advance();
        }
      }
    }
    Ok(String::from_utf8_lossy(&out).into_owned())
  }

  fn number(&mut self) -> Result<Value, String> {
    let start = self.position;
    if self.peek() == b'-' {
      self.advance();
    }
    while self.peek().is_ascii_digit() {
      self.advance();
    }

    let mut real = false;
    if self.peek() == b'.' {
      real = true;
      self.advance();
      while self.peek().is_ascii_digit() {
        self.advance();
      }
    }
    if matches!(self.peek(), b'e' | b'E') {
      real = true;
      self.advance();
      if matches!(self.peek(), b'+' | b'-') {
        self.advance();
      }
      while self.peek().is_ascii_digit() {
        self.advance();
      }
    }

    let text = std::str::from_utf8(&self.bytes[start..self.position])
      .map_err(|_| "invalid number".to_string())?;
    if real {
      text
        .parse::<f64>()
        .map(Value::Real)
        .map_err(|_| format!("invalid number '{text}'"))
    } else {
      text
        .parse::<i64>()
        .map(Value::Int)
        .map_err(|_| format!("invalid number '{text}'"))
    }
  }

  fn literal(&mut self, expected: &str, value: Value) -> Result<Value, String> {
    let end = self.position + expected.len();
    if self.bytes.get(self.position..end) == Some(expected.as_bytes()) {
      self.position = end;
      Ok(value)
    } else {
      Err(format!("expected the literal '{expected}'"))
    }
  }
}

fn escape(text: &str) -> String {
  let mut out = String::with_capacity(text.len() + 2);
  out.push('"');
  for byte in text.bytes() {
    match byte {
      b'"' => out.push_str("\\\""),
      b'\\' => out.push_str("\\\\"),
      0x08 => out.push_str("\\b"),
      0x0C => out.push_str("\\f"),
      b'\n' => out.push_str("\\n"),
      b'\r' => out.push_str("\\r"),
      b'\t' => out.push_str("\\t"),
      byte if byte < 0x20 => out.push_str(&format!("\\u{byte:04x}")),
      byte => out.push(byte as char),
    }
  }
  out.push('"');
  out
}

fn stringify(value: &Value, indent_level: usize, tab_size: usize) -> String {
  let current = " ".repeat(indent_level * tab_size);
  let next = " ".repeat((indent_level + 1) * tab_size);

  match value {
    Value::Null => "null".to_string(),
    Value::Int(_) | Value::Real(_) | Value::Bool(_) => value.to_string(),
    Value::String(text) => escape(text),
    Value::Array(array) => {
      let elements = array.to_vec();
      if elements.is_empty() {
        return "[]".to_string();
      }
      let mut out = String::from("[\n");
      for (index, element) in elements.iter().enumerate() {
        out.push_str(&next);
        out.push_str(&stringify(element, indent_level + 1, tab_size));
        if index + 1 < elements.len() {
          out.push(',');
        }
        out.push('\n');
      }
      out.push_str(&current);
      out.push(']');
      out
    }
    Value::Object(object) => {
      let entries = object.entries();
      if entries.is_empty() {
        return "{}".to_string();
      }
      let mut out = String::from("{\n");
      for (index, (key, element)) in entries.iter().enumerate() {
        out.push_str(&next);
        out.push_str(&escape(&key.to_value().to_string()));
        out.push_str(": ");
        out.push_str(&stringify(element, indent_level + 1, tab_size));
        if index + 1 < entries.len() {
          out.push(',');
        }
        out.push('\n');
      }
      out.push_str(&current);
      out.push('}');
      out
    }
    _ => "\"<unsupported type>\"".to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn parse(text: &str) -> Result<Value, String> {
    JsonParser::new(text).document()
  }

  #[test]
  fn scalars() {
    assert_eq!(parse("42"), Ok(Value::Int(42)));
    assert_eq!(parse("-1.5"), Ok(Value::Real(-1.5)));
    assert_eq!(parse("true"), Ok(Value::Bool(true)));
    assert_eq!(parse("null"), Ok(Value::Null));
    assert_eq!(parse("\"a\\nb\""), Ok(Value::from("a\nb")));
  }

  #[test]
  fn nested_structures() {
    let Ok(Value::Object(object)) = parse(r#"{"xs": [1, 2], "ok": true}"#) else {
      panic!("expected an object");
    };
    let Some(Value::Array(xs)) = object.lookup(&HashKey::Str("xs".into())) else {
      panic!("expected an array");
    };
    assert_eq!(xs.len(), 2);
  }

  #[test]
  fn trailing_garbage_is_rejected() {
    assert!(parse("1 2").is_err());
    assert!(parse("{").is_err());
    assert!(parse("").is_err());
  }

  #[test]
  fn stringify_round_trip() {
    let value = Value::from(vec![Value::Int(1), Value::from("two")]);
    let text = stringify(&value, 0, 2);
    assert_eq!(parse(&text).map(|parsed| parsed.to_string()), Ok("[1, two]".to_string()));
  }

  #[test]
  fn unicode_escapes() {
    assert_eq!(parse(r#""\u0041""#), Ok(Value::from("A")));
  }
}
