use crate::{int_arg, string_arg, LibraryBuilder};
use meow_interpreter::{Arity, Library, Unwind, Value};
use std::process::Command;
use std::time::{Duration, UNIX_EPOCH};

pub fn library() -> Library {
  LibraryBuilder::new()
    .function("exit", Arity::range(0, 1), |_, args| {
      let code = match args.first() {
        Some(_) => int_arg(args, 0, "exit")? as i32,
        None => 0,
      };
      std::process::exit(code);
    })
    .function("getEnv", Arity::fixed(1), |_, args| {
      let name = string_arg(args, 0, "getEnv")?;
      Ok(std::env::var(name.as_ref()).ok().into())
    })
    .function("exec", Arity::fixed(1), |_, args| {
      let command = string_arg(args, 0, "exec")?;

      let shell = if cfg!(windows) { "cmd" } else { "sh" };
      let flag = if cfg!(windows) { "/C" } else { "-c" };
      let output = Command::new(shell)
        .arg(flag)
        .arg(command.as_ref())
        .output()
        .map_err(|error| Unwind::exception(format!("Cannot run '{command}': {error}")))?;

      Ok(Value::from(
        String::from_utf8_lossy(&output.stdout).into_owned(),
      ))
    })
    .function("argv", Arity::fixed(0), |engine, _| {
      let arguments: Vec<Value> = engine
        .argv()
        .iter()
        .map(|argument| Value::from(argument.as_str()))
        .collect();
      Ok(Value::from(arguments))
    })
    .function("clock", Arity::fixed(0), |_, _| {
      let elapsed = UNIX_EPOCH.elapsed().unwrap_or_default();
      Ok(Value::Real(elapsed.as_secs_f64()))
    })
    .function("sleep", Arity::fixed(1), |_, args| {
      let milliseconds = int_arg(args, 0, "sleep")?.max(0) as u64;
      std::thread::sleep(Duration::from_millis(milliseconds));
      Ok(Value::Null)
    })
    .finish()
}
