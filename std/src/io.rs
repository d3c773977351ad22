use crate::{string_arg, LibraryBuilder};
use meow_interpreter::{Arity, Library, Unwind, Value};
use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;
use std::time::UNIX_EPOCH;

fn io_error(operation: &str, path: &str, error: std::io::Error) -> Unwind {
  Unwind::exception(format!("Cannot {operation} '{path}': {error}"))
}

pub fn library() -> Library {
  LibraryBuilder::new()
    .function("input", Arity::range(0, 1), |engine, args| {
      if let Some(_prompt) = args.first() {
        let prompt = string_arg(args, 0, "input")?;
        engine.sink().clone().write(&prompt);
        let _ = std::io::stdout().flush();
      }

      let mut line = String::new();
      std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|error| Unwind::exception(format!("Cannot read stdin: {error}")))?;
      while line.ends_with('\n') || line.ends_with('\r') {
        line.pop();
      }
      Ok(Value::from(line))
    })
    .function("read", Arity::fixed(1), |_, args| {
      let path = string_arg(args, 0, "read")?;
      fs::read_to_string(path.as_ref())
        .map(Value::from)
        .map_err(|error| io_error("read", &path, error))
    })
    .function("write", Arity::range(2, 1), |engine, args| {
      let path = string_arg(args, 0, "write")?;
      let content = match &args[1] {
        Value::String(text) => text.to_string(),
        other => engine.stringify(other)?,
      };
      let append = args.get(2).map(Value::is_truthy).unwrap_or(false);

      let result = if append {
        fs::OpenOptions::new()
          .create(true)
          .append(true)
          .open(path.as_ref())
          .and_then(|mut file| file.write_all(content.as_bytes()))
      } else {
        fs::write(path.as_ref(), content)
      };
      result.map_err(|error| io_error("write", &path, error))?;
      Ok(Value::Null)
    })
    .function("fileExists", Arity::fixed(1), |_, args| {
      let path = string_arg(args, 0, "fileExists")?;
      Ok(Value::Bool(Path::new(path.as_ref()).exists()))
    })
    .function("isDirectory", Arity::fixed(1), |_, args| {
      let path = string_arg(args, 0, "isDirectory")?;
      Ok(Value::Bool(Path::new(path.as_ref()).is_dir()))
    })
    .function("listDir", Arity::fixed(1), |_, args| {
      let path = string_arg(args, 0, "listDir")?;
      let entries = fs::read_dir(path.as_ref()).map_err(|error| io_error("list", &path, error))?;

      let mut names = Vec::new();
      for entry in entries {
        let entry = entry.map_err(|error| io_error("list", &path, error))?;
        names.push(Value::from(entry.file_name().to_string_lossy().into_owned()));
      }
      Ok(Value::from(names))
    })
    .function("createDir", Arity::fixed(1), |_, args| {
      let path = string_arg(args, 0, "createDir")?;
      fs::create_dir_all(path.as_ref()).map_err(|error| io_error("create", &path, error))?;
      Ok(Value::Null)
    })
    .function("deleteFile", Arity::fixed(1), |_, args| {
      let path = string_arg(args, 0, "deleteFile")?;
      fs::remove_file(path.as_ref()).map_err(|error| io_error("delete", &path, error))?;
      Ok(Value::Null)
    })
    .function("getFileTimestamp", Arity::fixed(1), |_, args| {
      let path = string_arg(args, 0, "getFileTimestamp")?;
      let metadata = fs::metadata(path.as_ref()).map_err(|error| io_error("stat", &path, error))?;
      let modified = metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map(|duration| duration.as_secs() as i64)
        .unwrap_or(0);
      Ok(Value::Int(modified))
    })
    .function("getFileSize", Arity::fixed(1), |_, args| {
      let path = string_arg(args, 0, "getFileSize")?;
      let metadata = fs::metadata(path.as_ref()).map_err(|error| io_error("stat", &path, error))?;
      Ok(Value::Int(metadata.len() as i64))
    })
    .function("renameFile", Arity::fixed(2), |_, args| {
      let from = string_arg(args, 0, "renameFile")?;
      let to = string_arg(args, 1, "renameFile")?;
      fs::rename(from.as_ref(), to.as_ref()).map_err(|error| io_error("rename", &from, error))?;
      Ok(Value::Null)
    })
    .function("copyFile", Arity::fixed(2), |_, args| {
      let from = string_arg(args, 0, "copyFile")?;
      let to = string_arg(args, 1, "copyFile")?;
      fs::copy(from.as_ref(), to.as_ref()).map_err(|error| io_error("copy", &from, error))?;
      Ok(Value::Null)
    })
    .function("getFileName", Arity::fixed(1), |_, args| {
      let path = string_arg(args, 0, "getFileName")?;
      Ok(path_part(&path, Path::file_name))
    })
    .function("getFileStem", Arity::fixed(1), |_, args| {
      let path = string_arg(args, 0, "getFileStem")?;
      Ok(path_part(&path, Path::file_stem))
    })
    .function("getFileExtension", Arity::fixed(1), |_, args| {
      let path = string_arg(args, 0, "getFileExtension")?;
      Ok(path_part(&path, Path::extension))
    })
    .function("getAbsolutePath", Arity::fixed(1), |_, args| {
      let path = string_arg(args, 0, "getAbsolutePath")?;
      let absolute = fs::canonicalize(path.as_ref())
        .map(|resolved| resolved.to_string_lossy().into_owned())
        .unwrap_or_else(|_| path.to_string());
      Ok(Value::from(absolute))
    })
    .finish()
}

fn path_part(path: &str, part: fn(&Path) -> Option<&std::ffi::OsStr>) -> Value {
  match part(Path::new(path)) {
    Some(value) => Value::from(value.to_string_lossy().into_owned()),
    None => Value::from(""),
  }
}
