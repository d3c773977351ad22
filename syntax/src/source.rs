use std::fs;

/// An immutable source file, with a newline offset table so diagnostics can
/// fetch any line in constant time.
#[derive(Debug)]
pub struct SourceFile {
  name: String,
  buffer: String,
  offsets: Vec<usize>,
}

impl SourceFile {
  pub fn from_path(path: &str) -> Result<SourceFile, std::io::Error> {
    let buffer = fs::read_to_string(path)?;
    Ok(Self::build(path.to_string(), buffer))
  }

  pub fn from_source(source: impl Into<String>, name: impl Into<String>) -> SourceFile {
    Self::build(name.into(), source.into())
  }

  fn build(name: String, buffer: String) -> SourceFile {
    let mut offsets = vec![0];
    for (index, byte) in buffer.bytes().enumerate() {
      if byte == b'\n' {
        offsets.push(index + 1);
      }
    }

    SourceFile {
      name,
      buffer,
      offsets,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn buffer(&self) -> &str {
    &self.buffer
  }

  /// The text of 1-based line `n`, without its trailing newline.
  /// Empty outside the valid range.
  pub fn line(&self, n: usize) -> &str {
    if n == 0 || n > self.offsets.len() {
      return "";
    }

    let start = self.offsets[n - 1];
    let mut end = if n == self.offsets.len() {
      self.buffer.len()
    } else {
      self.offsets[n]
    };
    if end > start && self.buffer.as_bytes()[end - 1] == b'\n' {
      end -= 1;
    }

    &self.buffer[start..end]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lines_are_one_based() {
    let file = SourceFile::from_source("first\nsecond\nthird", "test");

    assert_eq!(file.line(0), "");
    assert_eq!(file.line(1), "first");
    assert_eq!(file.line(2), "second");
    assert_eq!(file.line(3), "third");
    assert_eq!(file.line(4), "");
  }

  #[test]
  fn trailing_newline_is_stripped() {
    let file = SourceFile::from_source("only\n", "test");

    assert_eq!(file.line(1), "only");
    assert_eq!(file.line(2), "");
  }

  #[test]
  fn empty_buffer() {
    let file = SourceFile::from_source("", "test");

    assert_eq!(file.buffer(), "");
    assert_eq!(file.line(1), "");
  }
}
