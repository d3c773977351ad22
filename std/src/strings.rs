use crate::{array_arg, int_arg, string_arg, LibraryBuilder};
use meow_interpreter::{Arity, Library, Unwind, Value};

pub fn library() -> Library {
  LibraryBuilder::new()
    .function("split", Arity::range(1, 1), |_, args| {
      let text = string_arg(args, 0, "split")?;
      let delimiter = match args.get(1) {
        Some(_) => string_arg(args, 1, "split")?.to_string(),
        None => " ".to_string(),
      };

      let parts: Vec<Value> = if delimiter.is_empty() {
        text.chars().map(|c| Value::from(c.to_string())).collect()
      } else {
        text.split(&delimiter).map(Value::from).collect()
      };
      Ok(Value::from(parts))
    })
    .function("join", Arity::fixed(2), |engine, args| {
      let separator = string_arg(args, 0, "join")?;
      let values = array_arg(args, 1, "join")?;

      let mut text = String::new();
      for (index, value) in values.to_vec().iter().enumerate() {
        if index > 0 {
          text.push_str(&separator);
        }
        text.push_str(&engine.stringify(value)?);
      }
      Ok(Value::from(text))
    })
    .function("upper", Arity::fixed(1), |_, args| {
      Ok(Value::from(string_arg(args, 0, "upper")?.to_uppercase()))
    })
    .function("lower", Arity::fixed(1), |_, args| {
      Ok(Value::from(string_arg(args, 0, "lower")?.to_lowercase()))
    })
    .function("trim", Arity::fixed(1), |_, args| {
      Ok(Value::from(string_arg(args, 0, "trim")?.trim()))
    })
    .function("startsWith", Arity::fixed(2), |_, args| {
      let text = string_arg(args, 0, "startsWith")?;
      let prefix = string_arg(args, 1, "startsWith")?;
      Ok(Value::Bool(text.starts_with(prefix.as_ref())))
    })
    .function("endsWith", Arity::fixed(2), |_, args| {
      let text = string_arg(args, 0, "endsWith")?;
      let suffix = string_arg(args, 1, "endsWith")?;
      Ok(Value::Bool(text.ends_with(suffix.as_ref())))
    })
    .function("replace", Arity::fixed(3), |_, args| {
      let text = string_arg(args, 0, "replace")?;
      let from = string_arg(args, 1, "replace")?;
      let to = string_arg(args, 2, "replace")?;
      // only the first occurrence is replaced
      Ok(Value::from(text.replacen(from.as_ref(), &to, 1)))
    })
    .function("contains", Arity::fixed(2), |_, args| {
      let text = string_arg(args, 0, "contains")?;
      let needle = string_arg(args, 1, "contains")?;
      Ok(Value::Bool(text.contains(needle.as_ref())))
    })
    .function("indexOf", Arity::range(2, 1), |_, args| {
      let text = string_arg(args, 0, "indexOf")?;
      let needle = string_arg(args, 1, "indexOf")?;
      let start = match args.get(2) {
        Some(_) => usize::try_from(int_arg(args, 2, "indexOf")?).unwrap_or(0),
        None => 0,
      };

      let found = find_bytes(text.as_bytes(), needle.as_bytes(), start);
      Ok(Value::Int(found.map_or(-1, |position| position as i64)))
    })
    .function("lastIndexOf", Arity::fixed(2), |_, args| {
      let text = string_arg(args, 0, "lastIndexOf")?;
      let needle = string_arg(args, 1, "lastIndexOf")?;
      Ok(Value::Int(
        text.rfind(needle.as_ref()).map_or(-1, |position| position as i64),
      ))
    })
    .function("substring", Arity::range(2, 1), |_, args| {
      let text = string_arg(args, 0, "substring")?;
      let bytes = text.as_bytes();
      let start = int_arg(args, 1, "substring")?.max(0) as usize;
      if start > bytes.len() {
        return Ok(Value::from(""));
      }
      let length = match args.get(2) {
        Some(_) => int_arg(args, 2, "substring")?.max(0) as usize,
        None => bytes.len() - start,
      };
      let end = start.saturating_add(length).min(bytes.len());
      Ok(Value::from(
        String::from_utf8_lossy(&bytes[start..end]).into_owned(),
      ))
    })
    .function("slice", Arity::range(2, 1), |_, args| {
      let text = string_arg(args, 0, "slice")?;
      let bytes = text.as_bytes();
      let length = bytes.len() as i64;

      let mut start = int_arg(args, 1, "slice")?;
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
      let end = (end.max(0) as usize).min(bytes.len());

      if start >= end {
        return Ok(Value::from(""));
      }
      Ok(Value::from(
        String::from_utf8_lossy(&bytes[start..end]).into_owned(),
      ))
    })
    .function("repeat", Arity::fixed(2), |_, args| {
      let text = string_arg(args, 0, "repeat")?;
      let count = int_arg(args, 1, "repeat")?;
      Ok(Value::from(text.repeat(usize::try_from(count).unwrap_or(0))))
    })
    .function("padLeft", Arity::range(2, 1), |_, args| {
      pad(args, "padLeft", true)
    })
    .function("padRight", Arity::range(2, 1), |_, args| {
      pad(args, "padRight", false)
    })
    .function("equalsIgnoreCase", Arity::fixed(2), |_, args| {
      let a = string_arg(args, 0, "equalsIgnoreCase")?;
      let b = string_arg(args, 1, "equalsIgnoreCase")?;
      Ok(Value::Bool(a.to_lowercase() == b.to_lowercase()))
    })
    .function("charAt", Arity::fixed(2), |_, args| {
      let text = string_arg(args, 0, "charAt")?;
      let index = int_arg(args, 1, "charAt")?;
      let character = usize::try_from(index)
        .ok()
        .and_then(|index| text.as_bytes().get(index).copied());
      Ok(match character {
        Some(byte) => Value::from((byte as char).to_string()),
        None => Value::from(""),
      })
    })
    .function("charCodeAt", Arity::fixed(2), |_, args| {
      let text = string_arg(args, 0, "charCodeAt")?;
      let index = int_arg(args, 1, "charCodeAt")?;
      let code = usize::try_from(index)
        .ok()
        .and_then(|index| text.as_bytes().get(index).copied());
      Ok(Value::Int(code.map_or(-1, i64::from)))
    })
    .function("size", Arity::fixed(1), |_, args| {
      Ok(Value::from(string_arg(args, 0, "size")?.len()))
    })
    .finish()
}

/// Byte-offset search from `start`; offsets are not required to fall on
/// character boundaries, matching the byte-oriented string indexing.
fn find_bytes(haystack: &[u8], needle: &[u8], start: usize) -> Option<usize> {
  if start > haystack.len() {
    return None;
  }
  if needle.is_empty() {
    return Some(start);
  }
  haystack[start..]
    .windows(needle.len())
    .position(|window| window == needle)
    .map(|position| position + start)
}

fn pad(args: &[Value], name: &'static str, left: bool) -> Result<Value, Unwind> {
  let text = string_arg(args, 0, name)?;
  let width = int_arg(args, 1, name)?.max(0) as usize;
  let fill = match args.get(2) {
    Some(_) => {
      let fill = string_arg(args, 2, name)?;
      fill.as_bytes().first().copied().unwrap_or(b' ') as char
    }
    None => ' ',
  };

  if text.len() >= width {
    return Ok(Value::String(text));
  }
  let padding: String = std::iter::repeat(fill).take(width - text.len()).collect();
  Ok(Value::from(if left {
    format!("{padding}{text}")
  } else {
    format!("{text}{padding}")
  }))
}
