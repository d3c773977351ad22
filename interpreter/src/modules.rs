use crate::interpreter::{Interpreter, LogSink, Unwind};
use crate::operators::OperatorDispatcher;
use crate::value::{HashKey, Object, Value};
use ahash::AHashMap;
use meow_syntax::ast::Program;
use meow_syntax::{parse, Diagnostic, Lexer, SourceFile};
use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// The default extension tried when an import path has none.
pub const MODULE_EXTENSION: &str = "meow";

/// A native library: a name-to-value table built by the host.
pub type Library = Rc<AHashMap<String, Value>>;

/// All registered native modules, keyed by import name.
pub type NativeModules = AHashMap<String, Library>;

/// The libraries the value model consults when binding helper methods on
/// built-in receivers (`xs.push`, `o.keys`, `s.split`), plus the core table
/// injected into every global scope.
pub struct NativeLibraries {
  pub core: Library,
  pub array: Library,
  pub object: Library,
  pub string: Library,
}

pub struct Module {
  pub program: Option<Rc<Program>>,
  pub exports: Value,
}

pub type ModuleHandle = Rc<RefCell<ModuleManager>>;

/// Resolves import paths, caches parsed modules and guarantees each module
/// evaluates at most once per process. Shared by handle between the
/// evaluators it spawns.
pub struct ModuleManager {
  natives: NativeModules,
  cache: AHashMap<String, Module>,
  include: Vec<PathBuf>,
  libraries: Rc<NativeLibraries>,
  dispatcher: Rc<OperatorDispatcher>,
  argv: Rc<Vec<String>>,
  sink: LogSink,
}

impl ModuleManager {
  pub fn new(
    mut natives: NativeModules,
    include: Vec<PathBuf>,
    argv: Vec<String>,
    sink: LogSink,
  ) -> ModuleHandle {
    // core is injected into globals rather than imported by name
    let core = natives.remove("core");
    let lookup = |name: &str| {
      natives
        .get(name)
        .cloned()
        .unwrap_or_else(|| Rc::new(AHashMap::new()))
    };
    let libraries = Rc::new(NativeLibraries {
      core: core.unwrap_or_else(|| Rc::new(AHashMap::new())),
      array: lookup("array"),
      object: lookup("object"),
      string: lookup("string"),
    });

    let mut search = module_path_directories();
    search.extend(include);

    Rc::new(RefCell::new(ModuleManager {
      natives,
      cache: AHashMap::new(),
      include: search,
      libraries,
      dispatcher: Rc::new(OperatorDispatcher::new()),
      argv: Rc::new(argv),
      sink,
    }))
  }

  pub fn libraries(&self) -> Rc<NativeLibraries> {
    Rc::clone(&self.libraries)
  }

  pub fn dispatcher(&self) -> Rc<OperatorDispatcher> {
    Rc::clone(&self.dispatcher)
  }

  pub fn argv(&self) -> Rc<Vec<String>> {
    Rc::clone(&self.argv)
  }

  pub fn sink(&self) -> LogSink {
    self.sink.clone()
  }

  /// Load a module for `import_path`, as requested from `importer_path`
  /// (empty for the entry file). Returns the module's exports object.
  pub fn load(handle: &ModuleHandle, importer_path: &str, import_path: &str) -> Result<Value, Unwind> {
    // native modules resolve by bare name
    {
      let mut manager = handle.borrow_mut();
      if let Some(library) = manager.natives.get(import_path).cloned() {
        if let Some(module) = manager.cache.get(import_path) {
          return Ok(module.exports.clone());
        }

        let exports = Object::new();
        for (name, value) in library.iter() {
          exports.insert(HashKey::Str(name.as_str().into()), value.clone());
        }
        let exports = Value::Object(exports);
        manager.cache.insert(
          import_path.to_string(),
          Module {
            program: None,
            exports: exports.clone(),
          },
        );
        return Ok(exports);
      }
    }

    let resolved = handle.borrow().resolve(importer_path, import_path)?;
    let key = resolved.to_string_lossy().into_owned();

    if let Some(module) = handle.borrow().cache.get(&key) {
      return Ok(module.exports.clone());
    }

    let source = SourceFile::from_path(&key).map_err(|error| {
      Unwind::Failure(Box::new(Diagnostic::fatal(
        format!("Cannot read module '{key}': {error}"),
        key.clone(),
      )))
    })?;

    Self::evaluate(handle, key, Rc::new(source))
  }

  /// Evaluate in-memory source under an opaque cache key.
  pub fn load_from_source(
    handle: &ModuleHandle,
    key: &str,
    source: &str,
  ) -> Result<Value, Unwind> {
    if let Some(module) = handle.borrow().cache.get(key) {
      return Ok(module.exports.clone());
    }

    let source = Rc::new(SourceFile::from_source(source, key));
    Self::evaluate(handle, key.to_string(), source)
  }

  /// Parse and run a module. The cache entry is inserted *before* evaluation
  /// so circular imports observe the partially populated exports bag
  /// instead of recursing forever.
  fn evaluate(handle: &ModuleHandle, key: String, source: Rc<SourceFile>) -> Result<Value, Unwind> {
    let tokens = Lexer::new(Rc::clone(&source)).tokenize();
    let program = parse(tokens)
      .map_err(|mut diagnostics| Unwind::Failure(Box::new(diagnostics.remove(0))))?;
    let program = Rc::new(program);

    let bag = Object::new();
    let exports = Value::Object(bag.clone());
    handle.borrow_mut().cache.insert(
      key,
      Module {
        program: Some(Rc::clone(&program)),
        exports: exports.clone(),
      },
    );

    let mut interpreter = Interpreter::new(handle, Some(source), Some(bag));
    interpreter
      .run(&program)
      .map_err(|diagnostic| Unwind::Failure(Box::new(diagnostic)))?;

    Ok(exports)
  }

  /// Candidate order: sibling of the importer, the include directories
  /// (`MODULE_PATH` then `-I` flags), the working directory, the raw path;
  /// each also retried with the `.meow` extension when it has none.
  fn resolve(&self, importer_path: &str, import_path: &str) -> Result<PathBuf, Unwind> {
    let mut candidates = Vec::new();

    if !importer_path.is_empty() {
      if let Some(parent) = Path::new(importer_path).parent() {
        candidates.push(parent.join(import_path));
      }
    }
    for directory in &self.include {
      candidates.push(directory.join(import_path));
    }
    if let Ok(current) = std::env::current_dir() {
      candidates.push(current.join(import_path));
    }
    candidates.push(PathBuf::from(import_path));

    let mut tried = Vec::new();
    for candidate in candidates {
      let mut attempts = vec![candidate.clone()];
      if candidate.extension().is_none() {
        attempts.push(candidate.with_extension(MODULE_EXTENSION));
      }

      for attempt in attempts {
        if attempt.is_file() {
          return Ok(std::fs::canonicalize(&attempt).unwrap_or(attempt));
        }
        tried.push(attempt.to_string_lossy().into_owned());
      }
    }

    Err(Unwind::exception(format!(
      "Module '{}' was not found (tried: {})",
      import_path,
      tried.join(", ")
    )))
  }
}

/// Directories from the `MODULE_PATH` environment variable, split on the
/// platform's path-list separator.
fn module_path_directories() -> Vec<PathBuf> {
  let separator = if cfg!(windows) { ';' } else { ':' };

  match std::env::var("MODULE_PATH") {
    Ok(value) => value
      .split(separator)
      .filter(|part| !part.is_empty())
      .map(PathBuf::from)
      .collect(),
    Err(_) => Vec::new(),
  }
}
