use crate::environment::Environment;
use crate::modules::{ModuleHandle, ModuleManager, NativeLibraries};
use crate::operators::{BinaryOp, OperatorDispatcher, UnaryOp};
use crate::value::{
  Arity, BoundMethod, Class, Function, HashKey, Instance, NativeFunction, Object, ScriptFunction,
  Value, ValueIterator,
};
use crate::value::{array_get, array_set, object_get, object_set, string_get};
use ahash::AHashMap;
use meow_syntax::ast::{Expr, ImportKind, Program, Stmt};
use meow_syntax::{Diagnostic, SourceFile, Token, TokenKind};
use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;

/// Non-local exits threaded through every evaluator function. The first
/// three are control-flow signals consumed by loops and calls; `Thrown`
/// travels until a `catch`; `Exception` is a failure that has not yet been
/// given a source location; `Failure` is a located diagnostic.
#[derive(Debug)]
pub enum Unwind {
  Return(Value),
  Break,
  Continue,
  Thrown(Value),
  Exception(String),
  Failure(Box<Diagnostic>),
}

impl Unwind {
  pub fn exception(message: impl Into<String>) -> Unwind {
    Unwind::Exception(message.into())
  }
}

pub type Execution = Result<Value, Unwind>;

/// Where `log` and `print` write. Tests capture instead of hitting stdout.
#[derive(Clone)]
pub enum LogSink {
  Stdout,
  Capture(Rc<RefCell<String>>),
}

impl LogSink {
  pub fn capture() -> (LogSink, Rc<RefCell<String>>) {
    let buffer = Rc::new(RefCell::new(String::new()));
    (LogSink::Capture(Rc::clone(&buffer)), buffer)
  }

  pub fn write(&self, text: &str) {
    match self {
      LogSink::Stdout => {
        print!("{text}");
        let _ = std::io::stdout().flush();
      }
      LogSink::Capture(buffer) => buffer.borrow_mut().push_str(text),
    }
  }
}

/// The tree-walking evaluator. One instance exists per module evaluation;
/// they share the module manager, operator tables and native libraries
/// through handles.
pub struct Interpreter {
  env: Environment,
  globals: Environment,
  modules: ModuleHandle,
  libraries: Rc<NativeLibraries>,
  dispatcher: Rc<OperatorDispatcher>,
  source: Option<Rc<SourceFile>>,
  exports: Option<Object>,
  caught: Option<Value>,
  argv: Rc<Vec<String>>,
  sink: LogSink,
}

impl Interpreter {
  pub fn new(
    modules: &ModuleHandle,
    source: Option<Rc<SourceFile>>,
    exports: Option<Object>,
  ) -> Interpreter {
    let (libraries, dispatcher, argv, sink) = {
      let manager = modules.borrow();
      (
        manager.libraries(),
        manager.dispatcher(),
        manager.argv(),
        manager.sink(),
      )
    };

    let globals = Environment::global();
    for (name, value) in libraries.core.iter() {
      globals.define(name, value.clone(), false);
    }

    Interpreter {
      env: globals.clone(),
      globals,
      modules: modules.clone(),
      libraries,
      dispatcher,
      source,
      exports,
      caught: None,
      argv,
      sink,
    }
  }

  pub fn get_global(&self, name: &str) -> Value {
    self.globals.find(name)
  }

  pub fn environment(&self) -> &Environment {
    &self.env
  }

  pub fn modules(&self) -> &ModuleHandle {
    &self.modules
  }

  pub fn argv(&self) -> &[String] {
    &self.argv
  }

  pub fn sink(&self) -> &LogSink {
    &self.sink
  }

  pub fn run(&mut self, program: &Program) -> Result<(), Diagnostic> {
    for statement in &program.statements {
      match self.execute(statement) {
        Ok(_) => {}
        Err(Unwind::Return(_)) => return Ok(()),
        Err(Unwind::Break) => {
          return Err(Diagnostic::runtime(
            "'break' outside of a loop",
            statement.token().clone(),
          ))
        }
        Err(Unwind::Continue) => {
          return Err(Diagnostic::runtime(
            "'continue' outside of a loop",
            statement.token().clone(),
          ))
        }
        Err(Unwind::Thrown(value)) => {
          return Err(Diagnostic::runtime(
            format!("Uncaught exception: {value}"),
            statement.token().clone(),
          ))
        }
        Err(Unwind::Exception(message)) => {
          return Err(Diagnostic::runtime(message, statement.token().clone()))
        }
        Err(Unwind::Failure(diagnostic)) => return Err(*diagnostic),
      }
    }
    Ok(())
  }

  fn fail(&self, message: impl Into<String>, token: &Token) -> Unwind {
    Unwind::Failure(Box::new(Diagnostic::runtime(message, token.clone())))
  }

  /// Attach a location to a not-yet-located exception.
  fn locate(&self, unwind: Unwind, token: &Token) -> Unwind {
    match unwind {
      Unwind::Exception(message) => self.fail(message, token),
      other => other,
    }
  }

  fn located(&self, result: Result<Value, String>, token: &Token) -> Execution {
    result.map_err(|message| self.fail(message, token))
  }

  /// Run inside a fresh child scope, restoring the previous scope on every
  /// exit path, normal or unwinding.
  fn in_child<T>(&mut self, action: impl FnOnce(&mut Interpreter) -> T) -> T {
    let previous = self.env.clone();
    self.env = previous.child();
    let result = action(self);
    self.env = previous;
    result
  }

  fn execute_in(&mut self, statement: &Stmt, environment: Environment) -> Execution {
    let previous = std::mem::replace(&mut self.env, environment);
    let result = self.execute(statement);
    self.env = previous;
    result
  }

  // ==== Statements ====

  pub fn execute(&mut self, statement: &Stmt) -> Execution {
    match statement {
      Stmt::Expression { expression, .. } => self.evaluate(expression),

      Stmt::Let { name, value, constant, .. } => {
        let value = match value {
          Some(expression) => self.evaluate(expression)?,
          None => Value::Null,
        };
        self.env.define(&name.lexeme, value.clone(), *constant);
        Ok(value)
      }

      Stmt::Block { statements, .. } => self.in_child(|interpreter| {
        for statement in statements {
          interpreter.execute(statement)?;
        }
        Ok(Value::Null)
      }),

      Stmt::If {
        condition,
        then_branch,
        else_branch,
        ..
      } => self.in_child(|interpreter| {
        if interpreter.evaluate(condition)?.is_truthy() {
          interpreter.execute(then_branch)?;
        } else if let Some(else_branch) = else_branch {
          interpreter.execute(else_branch)?;
        }
        Ok(Value::Null)
      }),

      Stmt::While { condition, body, .. } => self.in_child(|interpreter| {
        while interpreter.evaluate(condition)?.is_truthy() {
          match interpreter.execute(body) {
            Err(Unwind::Break) => break,
            Err(Unwind::Continue) | Ok(_) => {}
            Err(other) => return Err(other),
          }
        }
        Ok(Value::Null)
      }),

      Stmt::DoWhile { body, condition, .. } => self.in_child(|interpreter| {
        loop {
          match interpreter.execute(body) {
            Err(Unwind::Break) => break,
            Err(Unwind::Continue) | Ok(_) => {}
            Err(other) => return Err(other),
          }
          if !interpreter.evaluate(condition)?.is_truthy() {
            break;
          }
        }
        Ok(Value::Null)
      }),

      Stmt::For {
        initializer,
        condition,
        update,
        body,
        ..
      } => self.in_child(|interpreter| {
        if let Some(initializer) = initializer {
          interpreter.execute(initializer)?;
        }
        loop {
          if let Some(condition) = condition {
            if !interpreter.evaluate(condition)?.is_truthy() {
              break;
            }
          }
          match interpreter.execute(body) {
            Err(Unwind::Break) => break,
            Err(Unwind::Continue) | Ok(_) => {}
            Err(other) => return Err(other),
          }
          // continue still runs the update before retesting
          if let Some(update) = update {
            interpreter.evaluate(update)?;
          }
        }
        Ok(Value::Null)
      }),

      Stmt::ForIn {
        token,
        variable,
        collection,
        body,
      } => self.in_child(|interpreter| {
        let collection = interpreter.evaluate(collection)?;
        let mut iterator = interpreter.make_iterator(&collection, token)?;
        while let Some(item) = interpreter.iterator_next(&mut iterator)? {
          interpreter.env.define(&variable.lexeme, item, false);
          match interpreter.execute(body) {
            Err(Unwind::Break) => break,
            Err(Unwind::Continue) | Ok(_) => {}
            Err(other) => return Err(other),
          }
        }
        Ok(Value::Null)
      }),

      Stmt::Return { value, .. } => {
        let value = match value {
          Some(expression) => self.evaluate(expression)?,
          None => Value::Null,
        };
        Err(Unwind::Return(value))
      }

      Stmt::Break { .. } => Err(Unwind::Break),
      Stmt::Continue { .. } => Err(Unwind::Continue),

      Stmt::Throw { token, value } => match value {
        Some(expression) => {
          let value = self.evaluate(expression)?;
          Err(Unwind::Thrown(value))
        }
        // a bare `throw` rethrows the exception being handled
        None => match &self.caught {
          Some(value) => Err(Unwind::Thrown(value.clone())),
          None => Err(self.fail("A bare 'throw' is only allowed inside 'catch'", token)),
        },
      },

      Stmt::Try {
        try_block,
        variable,
        catch_block,
        ..
      } => match self.execute(try_block) {
        Err(Unwind::Thrown(value)) => {
          let saved = self.caught.take();
          self.caught = Some(value.clone());

          let catch_env = self.env.child();
          catch_env.define(&variable.lexeme, value, false);
          let result = self.execute_in(catch_block, catch_env);

          self.caught = saved;
          result.map(|_| Value::Null)
        }
        Err(other) => Err(other),
        Ok(_) => Ok(Value::Null),
      },

      Stmt::Switch { subject, cases, .. } => {
        let subject = self.evaluate(subject)?;

        let mut start = None;
        let mut default = None;
        for (index, case) in cases.iter().enumerate() {
          match &case.value {
            Some(expression) => {
              let value = self.evaluate(expression)?;
              if self.loosely_equal(&subject, &value)? {
                start = Some(index);
                break;
              }
            }
            None => default = Some(index),
          }
        }

        // execution falls through subsequent cases until a break
        if let Some(start) = start.or(default) {
          'cases: for case in &cases[start..] {
            for statement in &case.statements {
              match self.execute(statement) {
                Err(Unwind::Break) => break 'cases,
                Ok(_) => {}
                Err(other) => return Err(other),
              }
            }
          }
        }
        Ok(Value::Null)
      }

      Stmt::Import { token, path, kind } => self.execute_import(token, path, kind),

      Stmt::Export {
        token,
        declaration,
        specifiers,
      } => self.execute_export(token, declaration.as_deref(), specifiers),

      Stmt::Class {
        name,
        superclass,
        methods,
        statics,
        ..
      } => self.execute_class(name, superclass.as_ref(), methods, statics),

      Stmt::Log { expression, .. } => {
        let value = self.evaluate(expression)?;
        let text = self.stringify(&value)?;
        self.sink.write(&text);
        Ok(Value::Null)
      }
    }
  }

  fn execute_import(&mut self, token: &Token, path: &Expr, kind: &ImportKind) -> Execution {
    let path_value = self.evaluate(path)?;
    let Value::String(import_path) = path_value else {
      return Err(self.fail("Import paths must be strings", token));
    };

    let importer = self
      .source
      .as_ref()
      .map(|source| source.name().to_string())
      .unwrap_or_default();

    let exports_value = ModuleManager::load(&self.modules, &importer, &import_path)
      .map_err(|unwind| match unwind {
        Unwind::Exception(message) => self.fail(message, token),
        Unwind::Failure(diagnostic) => {
          Unwind::Failure(Box::new(diagnostic.with_call_site(token.clone())))
        }
        other => other,
      })?;
    let Value::Object(exports) = &exports_value else {
      return Err(self.fail("Module exports were corrupted", token));
    };

    match kind {
      ImportKind::Namespace(namespace) => {
        self
          .env
          .define(&namespace.lexeme, exports_value.clone(), false);
      }
      ImportKind::Named(items) => {
        for (name, alias) in items {
          let key = HashKey::Str(name.lexeme.as_str().into());
          let Some(value) = exports.lookup(&key) else {
            return Err(self.fail(
              format!("Module '{import_path}' does not export '{}'", name.lexeme),
              name,
            ));
          };
          let binding = alias.as_ref().unwrap_or(name);
          self.env.define(&binding.lexeme, value, false);
        }
      }
      ImportKind::All => {
        for (key, value) in exports.entries() {
          if let HashKey::Str(name) = key {
            self.env.define(&name, value, false);
          }
        }
      }
    }

    Ok(Value::Null)
  }

  fn execute_export(
    &mut self,
    token: &Token,
    declaration: Option<&Stmt>,
    specifiers: &[Token],
  ) -> Execution {
    let Some(exports) = self.exports.clone() else {
      return Err(self.fail("'export' is only allowed inside a module", token));
    };

    if !specifiers.is_empty() {
      for specifier in specifiers {
        let value = self.env.find(&specifier.lexeme);
        exports.insert(HashKey::Str(specifier.lexeme.as_str().into()), value);
      }
      return Ok(Value::Null);
    }

    if let Some(declaration) = declaration {
      self.execute(declaration)?;
      match declaration {
        Stmt::Let { name, .. } | Stmt::Class { name, .. } => {
          let value = self.env.find(&name.lexeme);
          exports.insert(HashKey::Str(name.lexeme.as_str().into()), value);
        }
        _ => return Err(self.fail("This form of 'export' is not supported", token)),
      }
    }

    Ok(Value::Null)
  }

  fn execute_class(
    &mut self,
    name: &Token,
    superclass: Option<&Token>,
    methods: &[(Token, Rc<meow_syntax::ast::FunctionLiteral>)],
    statics: &[Stmt],
  ) -> Execution {
    let parent = match superclass {
      Some(super_name) => match self.env.find(&super_name.lexeme) {
        Value::Class(class) => Some(class),
        _ => {
          return Err(self.fail(
            format!("'{}' is not a class", super_name.lexeme),
            super_name,
          ))
        }
      },
      None => None,
    };

    let mut table = AHashMap::new();
    for (method_name, literal) in methods {
      let function = Function::Script(Rc::new(ScriptFunction {
        literal: Rc::clone(literal),
        closure: self.env.clone(),
      }));
      table.insert(method_name.lexeme.clone(), function);
    }

    let class = Class::new(name.lexeme.clone(), parent, table);
    self.env.define(&name.lexeme, Value::Class(class.clone()), false);

    for declaration in statics {
      match declaration {
        Stmt::Let {
          name: static_name,
          value,
          ..
        } => {
          let value = match value {
            Some(expression) => self.evaluate(expression)?,
            None => Value::Null,
          };
          let key = Value::from(static_name.lexeme.as_str());
          self
            .located(class.set(&key, value).map(|_| Value::Null), static_name)?;
        }
        Stmt::Class {
          name: static_name, ..
        } => {
          self.execute(declaration)?;
          let value = self.env.find(&static_name.lexeme);
          let key = Value::from(static_name.lexeme.as_str());
          self
            .located(class.set(&key, value).map(|_| Value::Null), static_name)?;
        }
        _ => {}
      }
    }

    Ok(Value::Null)
  }

  // ==== Expressions ====

  pub fn evaluate(&mut self, expression: &Expr) -> Execution {
    match expression {
      Expr::Integer { value, .. } => Ok(Value::Int(*value)),
      Expr::Real { value, .. } => Ok(Value::Real(*value)),
      Expr::String { value, .. } => Ok(Value::from(value.as_str())),
      Expr::Boolean { value, .. } => Ok(Value::Bool(*value)),
      Expr::Null { .. } => Ok(Value::Null),

      Expr::Array { elements, .. } => {
        let mut values = Vec::with_capacity(elements.len());
        for element in elements {
          if let Expr::Spread { token, expression } = element {
            let collection = self.evaluate(expression)?;
            let mut iterator = self.make_iterator(&collection, token)?;
            while let Some(item) = self.iterator_next(&mut iterator)? {
              values.push(item);
            }
          } else {
            values.push(self.evaluate(element)?);
          }
        }
        Ok(Value::from(values))
      }

      Expr::Object { token, properties } => {
        let object = Object::new();
        for (key, value) in properties {
          let key = self.evaluate(key)?;
          let value = self.evaluate(value)?;
          let Some(hash_key) = HashKey::from_value(&key) else {
            return Err(self.fail(
              format!("A value of type {} cannot be used as an object key", key.kind_name()),
              token,
            ));
          };
          object.insert(hash_key, value);
        }
        Ok(Value::Object(object))
      }

      Expr::Function(literal) => Ok(Value::from(ScriptFunction {
        literal: Rc::clone(literal),
        closure: self.env.clone(),
      })),

      Expr::Template { parts, .. } => {
        let mut text = String::new();
        for part in parts {
          let value = self.evaluate(part)?;
          text.push_str(&self.stringify(&value)?);
        }
        Ok(Value::from(text))
      }

      Expr::Identifier { name, .. } => Ok(self.env.find(name)),

      Expr::Binary {
        token,
        operator,
        left,
        right,
      } => match operator {
        TokenKind::AmpersandAmpersand => {
          let left = self.evaluate(left)?;
          if left.is_falsy() {
            Ok(left)
          } else {
            self.evaluate(right)
          }
        }
        TokenKind::PipePipe => {
          let left = self.evaluate(left)?;
          if left.is_truthy() {
            Ok(left)
          } else {
            self.evaluate(right)
          }
        }
        TokenKind::QuestionQuestion => {
          let left = self.evaluate(left)?;
          if matches!(left, Value::Null) {
            self.evaluate(right)
          } else {
            Ok(left)
          }
        }
        _ => {
          let left = self.evaluate(left)?;
          let right = self.evaluate(right)?;
          self.binary_operation(*operator, left, right, token)
        }
      },

      Expr::Unary {
        token,
        operator,
        operand,
      } => {
        let operand = self.evaluate(operand)?;
        self.unary_operation(*operator, operand, token)
      }

      Expr::Call {
        token,
        callee,
        arguments,
      } => {
        let callee = self.evaluate(callee)?;

        let mut args = Vec::with_capacity(arguments.len());
        for argument in arguments {
          if let Expr::Spread {
            token: spread_token,
            expression,
          } = argument
          {
            let collection = self.evaluate(expression)?;
            let mut iterator = self.make_iterator(&collection, spread_token)?;
            while let Some(item) = self.iterator_next(&mut iterator)? {
              args.push(item);
            }
          } else {
            args.push(self.evaluate(argument)?);
          }
        }

        match self.call_value(&callee, args) {
          Err(Unwind::Exception(message)) => Err(self.fail(message, token)),
          Err(Unwind::Failure(diagnostic)) => {
            Err(Unwind::Failure(Box::new(diagnostic.with_call_site(token.clone()))))
          }
          other => other,
        }
      }

      Expr::Index {
        token,
        receiver,
        index,
      } => {
        let receiver = self.evaluate(receiver)?;
        let key = self.evaluate(index)?;
        self.get_index(&receiver, &key, token)
      }

      Expr::PropertyAccess {
        token,
        object,
        property,
      } => {
        let receiver = self.evaluate(object)?;
        let key = Value::from(property.lexeme.as_str());
        self.get_index(&receiver, &key, token)
      }

      Expr::Assignment { token, target, value } => self.assign(token, target, value),

      Expr::PropertyAssignment {
        token,
        object,
        property,
        value,
      } => {
        let receiver = self.evaluate(object)?;
        let Value::Object(object) = receiver else {
          return Err(self.fail(
            format!("Cannot assign a property on a value of type {}", receiver.kind_name()),
            token,
          ));
        };
        let value = self.evaluate(value)?;
        object.insert(HashKey::Str(property.lexeme.as_str().into()), value);
        Ok(Value::Null)
      }

      Expr::Ternary {
        condition,
        then_branch,
        else_branch,
        ..
      } => {
        if self.evaluate(condition)?.is_truthy() {
          self.evaluate(then_branch)
        } else {
          self.evaluate(else_branch)
        }
      }

      Expr::This { .. } => Ok(self.env.find("this")),

      Expr::Super {
        token,
        method,
        is_constructor_call,
      } => {
        let this = self.env.find("this");
        let Value::Instance(instance) = this else {
          return Err(self.fail("'super' is only allowed inside methods", token));
        };
        let Some(superclass) = instance.class().superclass() else {
          return Err(self.fail("The class has no superclass to reach with 'super'", token));
        };

        let method_name = if *is_constructor_call {
          "init"
        } else {
          match method {
            Some(method) => method.lexeme.as_str(),
            None => "init",
          }
        };
        let Some(function) = superclass.find_method(method_name) else {
          return Err(self.fail(
            format!("No method '{method_name}' on the superclass"),
            token,
          ));
        };

        Ok(BoundMethod::bind(instance.clone(), function))
      }

      Expr::New { call, .. } => self.evaluate(call),

      Expr::PrefixUpdate {
        token,
        operator,
        operand,
      } => self.update(token, *operator, operand, true),

      Expr::PostfixUpdate {
        token,
        operator,
        operand,
      } => self.update(token, *operator, operand, false),

      Expr::Spread { .. } => Ok(Value::Null),
    }
  }

  fn binary_operation(
    &mut self,
    operator: TokenKind,
    left: Value,
    right: Value,
    token: &Token,
  ) -> Execution {
    let Some(op) = BinaryOp::from_token(operator) else {
      return Err(self.fail(format!("'{}' is not a binary operator", token.lexeme), token));
    };

    if let Some(function) = self.dispatcher.binary(op, left.kind(), right.kind()) {
      return self.located(function(&left, &right), token);
    }

    // instances may provide the behavior through a dunder method
    if let Value::Instance(instance) = &left {
      if let Some(method) = instance.class().find_method(op.dunder()) {
        let receiver = instance.clone();
        return self
          .call_function(&method, Some(receiver), vec![right])
          .map_err(|unwind| self.locate(unwind, token));
      }
    }
    if let Value::Instance(instance) = &right {
      if let Some(method) = instance.class().find_method(op.dunder()) {
        let receiver = instance.clone();
        return self
          .call_function(&method, Some(receiver), vec![left])
          .map_err(|unwind| self.locate(unwind, token));
      }
    }

    // instances without __eq__ compare by identity
    if let (Value::Instance(a), Value::Instance(b)) = (&left, &right) {
      match op {
        BinaryOp::Eq => return Ok(Value::Bool(a.ptr_eq(b))),
        BinaryOp::Ne => return Ok(Value::Bool(!a.ptr_eq(b))),
        _ => {}
      }
    }

    Err(self.fail(
      format!(
        "The '{}' operator is not defined for {} and {}",
        token.lexeme,
        left.kind_name(),
        right.kind_name()
      ),
      token,
    ))
  }

  fn unary_operation(&mut self, operator: TokenKind, operand: Value, token: &Token) -> Execution {
    let Some(op) = UnaryOp::from_token(operator) else {
      return Err(self.fail(format!("'{}' is not a unary operator", token.lexeme), token));
    };

    if let Some(function) = self.dispatcher.unary(op, operand.kind()) {
      return self.located(function(&operand), token);
    }

    if let Value::Instance(instance) = &operand {
      if let Some(method) = instance.class().find_method(op.dunder()) {
        let receiver = instance.clone();
        return self
          .call_function(&method, Some(receiver), vec![])
          .map_err(|unwind| self.locate(unwind, token));
      }
    }

    Err(self.fail(
      format!(
        "The '{}' operator is not defined for {}",
        token.lexeme,
        operand.kind_name()
      ),
      token,
    ))
  }

  /// Equality as used by `switch`: table entries where they exist, identity
  /// for instances, kind mismatches are simply unequal.
  fn loosely_equal(&mut self, left: &Value, right: &Value) -> Result<bool, Unwind> {
    if let Some(function) = self.dispatcher.binary(BinaryOp::Eq, left.kind(), right.kind()) {
      let result = function(left, right).map_err(Unwind::exception)?;
      return Ok(result.is_truthy());
    }
    if let (Value::Instance(a), Value::Instance(b)) = (left, right) {
      return Ok(a.ptr_eq(b));
    }
    Ok(false)
  }

  fn assign(&mut self, token: &Token, target: &Expr, value: &Expr) -> Execution {
    match target {
      Expr::Identifier { name, token: target_token } => {
        let value = self.evaluate(value)?;
        match self.env.assign(name, &value) {
          Ok(()) => Ok(value),
          Err(message) => Err(self.fail(message, target_token)),
        }
      }
      Expr::Index {
        receiver,
        index,
        token: index_token,
      } => {
        let receiver = self.evaluate(receiver)?;
        let key = self.evaluate(index)?;
        let value = self.evaluate(value)?;
        self.set_index(&receiver, &key, value.clone(), index_token)?;
        Ok(value)
      }
      Expr::PropertyAccess {
        object,
        property,
        token: access_token,
      } => {
        let receiver = self.evaluate(object)?;
        let value = self.evaluate(value)?;
        self.set_property(&receiver, property, value.clone(), access_token)?;
        Ok(value)
      }
      _ => Err(self.fail("Invalid assignment target", token)),
    }
  }

  /// Property writes bypass `__setitem__`: `a.x = v` always lands in the
  /// instance's fields, while `a[k] = v` goes through the dunder.
  fn set_property(
    &mut self,
    receiver: &Value,
    property: &Token,
    value: Value,
    token: &Token,
  ) -> Result<(), Unwind> {
    let key = Value::from(property.lexeme.as_str());
    match receiver {
      Value::Instance(instance) => {
        self.located(
          object_set(instance.fields(), &key, value).map(|_| Value::Null),
          token,
        )?;
        Ok(())
      }
      Value::Object(object) => {
        self.located(object_set(object, &key, value).map(|_| Value::Null), token)?;
        Ok(())
      }
      Value::Class(class) => {
        self.located(class.set(&key, value).map(|_| Value::Null), token)?;
        Ok(())
      }
      other => Err(self.fail(
        format!("Cannot assign a property on a value of type {}", other.kind_name()),
        token,
      )),
    }
  }

  /// The operand resolves to a place exactly once, so receiver and index
  /// expressions run their side effects a single time.
  fn update(
    &mut self,
    token: &Token,
    operator: TokenKind,
    operand: &Expr,
    prefix: bool,
  ) -> Execution {
    let delta: i64 = if operator == TokenKind::PlusPlus { 1 } else { -1 };

    let require_int = |interpreter: &Interpreter, value: Value| match value {
      Value::Int(value) => Ok(value),
      _ => Err(interpreter.fail("The '++' and '--' operators require an integer", token)),
    };

    let (current, updated) = match operand {
      Expr::Identifier { name, token: target_token } => {
        let current = require_int(self, self.env.find(name))?;
        let updated = Value::Int(current.wrapping_add(delta));
        if let Err(message) = self.env.assign(name, &updated) {
          return Err(self.fail(message, target_token));
        }
        (current, updated)
      }
      Expr::Index { receiver, index, token: index_token } => {
        let receiver = self.evaluate(receiver)?;
        let key = self.evaluate(index)?;
        let value = self.get_index(&receiver, &key, index_token)?;
        let current = require_int(self, value)?;
        let updated = Value::Int(current.wrapping_add(delta));
        self.set_index(&receiver, &key, updated.clone(), index_token)?;
        (current, updated)
      }
      Expr::PropertyAccess { object, property, token: access_token } => {
        let receiver = self.evaluate(object)?;
        let key = Value::from(property.lexeme.as_str());
        let value = self.get_index(&receiver, &key, access_token)?;
        let current = require_int(self, value)?;
        let updated = Value::Int(current.wrapping_add(delta));
        self.set_property(&receiver, property, updated.clone(), access_token)?;
        (current, updated)
      }
      _ => return Err(self.fail("Invalid operand for '++' or '--'", token)),
    };

    if prefix {
      Ok(updated)
    } else {
      Ok(Value::Int(current))
    }
  }

  // ==== Calls ====

  pub fn call_value(&mut self, callee: &Value, args: Vec<Value>) -> Execution {
    let arity = match callee {
      Value::Function(function) => function.arity(),
      Value::Class(class) => class.arity(),
      Value::Instance(instance) => match instance.class().find_method("__call__") {
        Some(method) => method.arity(),
        None => Arity::fixed(0),
      },
      Value::BoundMethod(bound) => bound.function.arity(),
      other => {
        return Err(Unwind::exception(format!(
          "A value of type {} is not callable",
          other.kind_name()
        )))
      }
    };
    check_arity(arity, args.len())?;

    match callee {
      Value::Function(function) => self.call_function(function, None, args),
      Value::Class(class) => self.construct(class, args),
      Value::Instance(instance) => match instance.class().find_method("__call__") {
        Some(method) => self.call_function(&method, Some(instance.clone()), args),
        None => Err(Unwind::exception(format!(
          "An instance of '{}' is not callable (it has no __call__ method)",
          instance.class().name()
        ))),
      },
      Value::BoundMethod(bound) => {
        self.call_function(&bound.function, Some(bound.instance.clone()), args)
      }
      _ => unreachable!(),
    }
  }

  pub fn call_function(
    &mut self,
    function: &Function,
    this: Option<Instance>,
    args: Vec<Value>,
  ) -> Execution {
    match function {
      Function::Script(function) => self.call_script(function, this, args),
      Function::Native(function) => (function.func)(self, &args),
    }
  }

  fn call_script(
    &mut self,
    function: &Rc<ScriptFunction>,
    this: Option<Instance>,
    args: Vec<Value>,
  ) -> Execution {
    let environment = function.closure.child();
    if let Some(instance) = this {
      environment.define("this", Value::Instance(instance), false);
    }

    let literal = &function.literal;
    for (parameter, value) in literal.parameters.iter().zip(args.iter()) {
      environment.define(&parameter.lexeme, value.clone(), false);
    }
    if let Some(rest) = &literal.rest_parameter {
      let extra = args
        .get(literal.parameters.len()..)
        .unwrap_or_default()
        .to_vec();
      environment.define(&rest.lexeme, Value::from(extra), false);
    }

    let previous = std::mem::replace(&mut self.env, environment);
    let result = self.execute(&literal.body);
    self.env = previous;

    match result {
      Ok(_) => Ok(Value::Null),
      Err(Unwind::Return(value)) => Ok(value),
      Err(other) => Err(other),
    }
  }

  /// Calling a class allocates an instance and runs `init` when present.
  fn construct(&mut self, class: &Class, args: Vec<Value>) -> Execution {
    let instance = Instance::new(class.clone());
    if let Some(init) = class.find_method("init") {
      self.call_function(&init, Some(instance.clone()), args)?;
    }
    Ok(Value::Instance(instance))
  }

  pub fn call_dunder(
    &mut self,
    instance: &Instance,
    name: &str,
    args: Vec<Value>,
  ) -> Option<Execution> {
    let method = instance.class().find_method(name)?;
    Some(self.call_function(&method, Some(instance.clone()), args))
  }

  // ==== Indexing ====

  pub fn get_index(&mut self, receiver: &Value, key: &Value, token: &Token) -> Execution {
    let libraries = Rc::clone(&self.libraries);
    match receiver {
      Value::String(string) => self.located(string_get(string, key, &libraries), token),
      Value::Array(array) => self.located(array_get(array, key, &libraries), token),
      Value::Object(object) => self.located(object_get(object, key, &libraries), token),
      Value::Class(class) => self.located(class.get(key), token),
      Value::BoundMethod(bound) => Ok(bound.get(key)),
      Value::Instance(instance) => {
        let instance = instance.clone();
        self.instance_get(&instance, key, token)
      }
      other => Err(self.fail(
        format!("Cannot index a value of type {}", other.kind_name()),
        token,
      )),
    }
  }

  fn instance_get(&mut self, instance: &Instance, key: &Value, token: &Token) -> Execution {
    let libraries = Rc::clone(&self.libraries);
    let value = self.located(object_get(instance.fields(), key, &libraries), token)?;
    if value != Value::Null {
      return Ok(value);
    }

    if let Value::String(name) = key {
      match name.as_ref() {
        "__class__" => return Ok(Value::Class(instance.class().clone())),
        "__fields__" => return Ok(Value::Object(instance.fields().clone())),
        "__instanceof__" => {
          let receiver = instance.clone();
          return Ok(NativeFunction::create(
            "__instanceof__",
            Arity::fixed(1),
            move |_, args| {
              let Value::Class(target) = &args[0] else {
                return Err(Unwind::exception("__instanceof__ expects a class argument"));
              };
              let mut current = Some(receiver.class().clone());
              while let Some(class) = current {
                if class.ptr_eq(target) {
                  return Ok(Value::Bool(true));
                }
                current = class.superclass().cloned();
              }
              Ok(Value::Bool(false))
            },
          ));
        }
        "__hasmethod__" => {
          let receiver = instance.clone();
          return Ok(NativeFunction::create(
            "__hasmethod__",
            Arity::fixed(1),
            move |_, args| {
              let Value::String(name) = &args[0] else {
                return Err(Unwind::exception("__hasmethod__ expects a method name"));
              };
              Ok(Value::Bool(receiver.class().find_method(name).is_some()))
            },
          ));
        }
        "__getmethod__" => {
          let receiver = instance.clone();
          return Ok(NativeFunction::create(
            "__getmethod__",
            Arity::fixed(1),
            move |_, args| {
              let Value::String(name) = &args[0] else {
                return Err(Unwind::exception("__getmethod__ expects a method name"));
              };
              Ok(match receiver.class().find_method(name) {
                Some(function) => Value::Function(function),
                None => Value::Null,
              })
            },
          ));
        }
        _ => {}
      }

      if let Some(method) = instance.class().find_method(name) {
        return Ok(BoundMethod::bind(instance.clone(), method));
      }
    }

    if let Some(getitem) = instance.class().find_method("__getitem__") {
      return self
        .call_function(&getitem, Some(instance.clone()), vec![key.clone()])
        .map_err(|unwind| self.locate(unwind, token));
    }

    Ok(Value::Null)
  }

  pub fn set_index(
    &mut self,
    receiver: &Value,
    key: &Value,
    value: Value,
    token: &Token,
  ) -> Result<(), Unwind> {
    match receiver {
      Value::Array(array) => {
        self.located(array_set(array, key, value).map(|_| Value::Null), token)?;
      }
      Value::Object(object) => {
        self.located(object_set(object, key, value).map(|_| Value::Null), token)?;
      }
      Value::Class(class) => {
        self.located(class.set(key, value).map(|_| Value::Null), token)?;
      }
      Value::Instance(instance) => {
        if let Some(setitem) = instance.class().find_method("__setitem__") {
          self
            .call_function(&setitem, Some(instance.clone()), vec![key.clone(), value])
            .map_err(|unwind| self.locate(unwind, token))?;
        } else {
          self.located(
            object_set(instance.fields(), key, value).map(|_| Value::Null),
            token,
          )?;
        }
      }
      Value::String(_) => {
        return Err(self.fail("Strings are immutable and cannot be assigned into", token))
      }
      other => {
        return Err(self.fail(
          format!("Cannot assign into a value of type {}", other.kind_name()),
          token,
        ))
      }
    }
    Ok(())
  }

  // ==== Iteration ====

  pub fn make_iterator(&mut self, value: &Value, token: &Token) -> Result<ValueIterator, Unwind> {
    match value {
      Value::Array(array) => Ok(ValueIterator::Array {
        array: array.clone(),
        index: 0,
      }),
      Value::String(string) => Ok(ValueIterator::Str {
        string: Rc::clone(string),
        index: 0,
      }),
      Value::Object(object) => Ok(ValueIterator::Entries {
        entries: object.entries(),
        index: 0,
      }),
      Value::Instance(instance) => {
        let Some(method) = instance.class().find_method("__iterator__") else {
          return Err(self.fail(
            "This value is not iterable (it has no __iterator__ method)",
            token,
          ));
        };
        let produced = self
          .call_function(&method, Some(instance.clone()), vec![])
          .map_err(|unwind| self.locate(unwind, token))?;

        match produced {
          Value::Instance(iterator) => {
            let mut iterator = ValueIterator::Instance {
              iterator,
              next: None,
            };
            self.advance_instance_iterator(&mut iterator);
            Ok(iterator)
          }
          // anything without __next__ iterates as empty
          _ => Ok(ValueIterator::Entries {
            entries: Vec::new(),
            index: 0,
          }),
        }
      }
      other => Err(self.fail(
        format!("A value of type {} is not iterable", other.kind_name()),
        token,
      )),
    }
  }

  pub fn iterator_next(&mut self, iterator: &mut ValueIterator) -> Result<Option<Value>, Unwind> {
    match iterator {
      ValueIterator::Array { array, index } => {
        let item = array.get(*index);
        if item.is_some() {
          *index += 1;
        }
        Ok(item)
      }
      ValueIterator::Str { string, index } => {
        let bytes = string.as_bytes();
        if *index < bytes.len() {
          let character = (bytes[*index] as char).to_string();
          *index += 1;
          Ok(Some(Value::from(character)))
        } else {
          Ok(None)
        }
      }
      ValueIterator::Entries { entries, index } => {
        if *index < entries.len() {
          let (key, value) = entries[*index].clone();
          *index += 1;
          let pair = Object::new();
          pair.insert(HashKey::Str("first".into()), key.to_value());
          pair.insert(HashKey::Str("second".into()), value);
          Ok(Some(Value::Object(pair)))
        } else {
          Ok(None)
        }
      }
      ValueIterator::Instance { next, .. } => {
        let value = next.take();
        match value {
          Some(value) => {
            self.advance_instance_iterator(iterator);
            Ok(Some(value))
          }
          None => Ok(None),
        }
      }
    }
  }

  /// Prefetch the next item from a script-defined iterator. A failing
  /// `__next__` ends the iteration.
  fn advance_instance_iterator(&mut self, state: &mut ValueIterator) {
    let ValueIterator::Instance { iterator, next } = state else {
      return;
    };

    let Some(method) = iterator.class().find_method("__next__") else {
      *next = None;
      return;
    };

    let receiver = iterator.clone();
    *next = self
      .call_function(&method, Some(receiver), vec![])
      .ok();
  }

  // ==== Stringification ====

  /// The user-observable rendering: instances consult `__str__`, and nested
  /// containers render their elements the same way.
  pub fn stringify(&mut self, value: &Value) -> Result<String, Unwind> {
    match value {
      Value::Instance(instance) => {
        if let Some(method) = instance.class().find_method("__str__") {
          let receiver = instance.clone();
          if let Value::String(text) = self.call_function(&method, Some(receiver), vec![])? {
            return Ok(text.to_string());
          }
        }
        Ok(format!("{} instance", instance.class().name()))
      }
      Value::Array(array) => {
        let mut text = String::from("[");
        for (index, element) in array.to_vec().iter().enumerate() {
          if index > 0 {
            text.push_str(", ");
          }
          text.push_str(&self.stringify(element)?);
        }
        text.push(']');
        Ok(text)
      }
      Value::Object(object) => {
        let mut text = String::from("{");
        for (index, (key, element)) in object.entries().iter().enumerate() {
          if index > 0 {
            text.push_str(", ");
          }
          text.push_str(&format!("{}: ", key.to_value()));
          text.push_str(&self.stringify(element)?);
        }
        text.push('}');
        Ok(text)
      }
      other => Ok(other.to_string()),
    }
  }
}

fn check_arity(arity: Arity, count: usize) -> Result<(), Unwind> {
  if arity.variadic {
    if count < arity.required {
      return Err(Unwind::exception(format!(
        "Expected at least {} argument(s), but got {count}",
        arity.required
      )));
    }
    return Ok(());
  }

  if count < arity.required || count > arity.required + arity.optional {
    let expected = if arity.optional == 0 {
      arity.required.to_string()
    } else {
      format!("{} to {}", arity.required, arity.required + arity.optional)
    };
    return Err(Unwind::exception(format!(
      "Expected {expected} argument(s), but got {count}"
    )));
  }
  Ok(())
}
