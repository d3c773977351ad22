use crate::{string_arg, LibraryBuilder};
use meow_interpreter::{
  Arity, HashKey, Library, ModuleManager, Object, Unwind, Value,
};
use meow_syntax::{parse, Lexer, SourceFile, TokenKind};
use std::cell::Cell;
use std::rc::Rc;

/// Reflection over the language itself: the lexer, the parser and the
/// evaluator exposed as script-callable functions.
pub fn library() -> Library {
  let eval_counter = Cell::new(0usize);
  let execute_counter = Cell::new(0usize);

  LibraryBuilder::new()
    .function("tokenize", Arity::fixed(1), |_, args| {
      let source = string_arg(args, 0, "tokenize")?;
      let file = Rc::new(SourceFile::from_source(source.as_ref(), "<tokenize>"));

      let mut tokens = Vec::new();
      for token in Lexer::new(file).tokenize() {
        let entry = Object::new();
        entry.insert(
          HashKey::Str("type".into()),
          Value::from(format!("{:?}", token.kind)),
        );
        entry.insert(HashKey::Str("line".into()), Value::from(token.line));
        entry.insert(HashKey::Str("col".into()), Value::from(token.column));
        entry.insert(HashKey::Str("file".into()), Value::from(token.file()));
        entry.insert(HashKey::Str("lexeme".into()), Value::from(token.lexeme));
        tokens.push(Value::Object(entry));
      }
      Ok(Value::from(tokens))
    })
    .function("parse", Arity::fixed(1), |_, args| {
      check_source(&string_arg(args, 0, "parse")?)
    })
    .function("compile", Arity::fixed(1), |_, args| {
      check_source(&string_arg(args, 0, "compile")?)
    })
    .function("execute", Arity::fixed(1), move |engine, args| {
      let source = string_arg(args, 0, "execute")?;
      let key = format!("<execute:{}>", execute_counter.get());
      execute_counter.set(execute_counter.get() + 1);

      ModuleManager::load_from_source(&engine.modules().clone(), &key, &source)?;
      Ok(Value::Null)
    })
    .function("eval", Arity::fixed(1), move |engine, args| {
      let source = string_arg(args, 0, "eval")?;
      let key = format!("<eval:{}>", eval_counter.get());
      eval_counter.set(eval_counter.get() + 1);

      ModuleManager::load_from_source(&engine.modules().clone(), &key, &source)
    })
    .function("getEnv", Arity::fixed(0), |engine, _| {
      let snapshot = Object::new();
      for (name, value, constant) in engine.environment().flattened() {
        let binding = Object::new();
        binding.insert(HashKey::Str("value".into()), value);
        binding.insert(HashKey::Str("isConstant".into()), Value::Bool(constant));
        snapshot.insert(HashKey::Str(name.as_str().into()), Value::Object(binding));
      }
      Ok(Value::Object(snapshot))
    })
    .finish()
}

/// Lex and parse without evaluating; syntax problems surface as exceptions.
fn check_source(source: &str) -> Result<Value, Unwind> {
  let file = Rc::new(SourceFile::from_source(source, "<parse>"));
  let tokens = Lexer::new(file).tokenize();

  if let Some(unknown) = tokens.iter().find(|token| token.kind == TokenKind::Unknown) {
    return Err(Unwind::exception(format!(
      "Unknown character '{}' at line {}",
      unknown.lexeme, unknown.line
    )));
  }

  match parse(tokens) {
    Ok(_) => Ok(Value::Bool(true)),
    Err(diagnostics) => Err(Unwind::exception(diagnostics[0].message.clone())),
  }
}
