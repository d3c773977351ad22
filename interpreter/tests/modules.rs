use meow_interpreter::{LogSink, ModuleHandle, ModuleManager, Unwind, Value};
use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

struct Fixture {
  directory: PathBuf,
  manager: ModuleHandle,
  output: Rc<RefCell<String>>,
}

impl Fixture {
  /// A module directory on disk plus a manager searching it.
  fn new(name: &str, files: &[(&str, &str)]) -> Fixture {
    let directory = std::env::temp_dir().join(format!("meow-tests-{}-{name}", std::process::id()));
    let _ = fs::remove_dir_all(&directory);
    fs::create_dir_all(&directory).expect("fixture directory");
    for (file, content) in files {
      fs::write(directory.join(file), content).expect("fixture file");
    }

    let (sink, output) = LogSink::capture();
    let manager = ModuleManager::new(
      meow_std::native_modules(),
      vec![directory.clone()],
      Vec::new(),
      sink,
    );

    Fixture {
      directory,
      manager,
      output,
    }
  }

  fn run(&self, source: &str) -> Result<Value, Unwind> {
    ModuleManager::load_from_source(&self.manager, "<entry>", source)
  }

  fn output(&self) -> String {
    self.output.borrow().clone()
  }
}

impl Drop for Fixture {
  fn drop(&mut self) {
    let _ = fs::remove_dir_all(&self.directory);
  }
}

#[test]
fn named_imports_bind_exports() {
  let fixture = Fixture::new(
    "named",
    &[("lib.meow", "export let answer = 42; export function twice(x) { return x * 2; }")],
  );

  fixture
    .run("import { answer, twice } from \"lib\"; log twice(answer);")
    .expect("entry should run");
  assert_eq!(fixture.output(), "84");
}

#[test]
fn modules_evaluate_exactly_once() {
  let fixture = Fixture::new("cache", &[("m.meow", "log \"init\"; export let x = 42;")]);

  fixture
    .run("import { x } from \"m\"; import { x as y } from \"m\"; log y;")
    .expect("entry should run");
  assert_eq!(fixture.output(), "init42");
}

#[test]
fn both_importers_see_the_same_exports_object() {
  let fixture = Fixture::new(
    "shared",
    &[
      ("state.meow", "export let box = {count: 0};"),
      ("bump.meow", "import { box } from \"state\"; box.count = box.count + 1;"),
    ],
  );

  fixture
    .run("import \"bump\"; import { box } from \"state\"; log box.count;")
    .expect("entry should run");
  assert_eq!(fixture.output(), "1");
}

#[test]
fn namespace_imports() {
  let fixture = Fixture::new("namespace", &[("geometry.meow", "export let sides = 4;")]);

  fixture
    .run("import * as geometry from \"geometry\"; log geometry.sides;")
    .expect("entry should run");
  assert_eq!(fixture.output(), "4");
}

#[test]
fn import_all_binds_every_export() {
  let fixture = Fixture::new(
    "all",
    &[("lib.meow", "export let a = 1; export let b = 2;")],
  );

  fixture
    .run("import \"lib\"; log a + b;")
    .expect("entry should run");
  assert_eq!(fixture.output(), "3");
}

#[test]
fn export_specifier_lists() {
  let fixture = Fixture::new(
    "specifiers",
    &[("lib.meow", "let hidden = 1; let shown = 2; export { shown };")],
  );

  fixture
    .run("import { shown } from \"lib\"; log shown;")
    .expect("entry should run");
  assert_eq!(fixture.output(), "2");
}

#[test]
fn missing_export_is_an_error() {
  let fixture = Fixture::new("missing", &[("lib.meow", "export let a = 1;")]);

  let result = fixture.run("import { nope } from \"lib\";");
  assert!(matches!(result, Err(Unwind::Failure(_))));
}

#[test]
fn missing_module_lists_the_candidates() {
  let fixture = Fixture::new("notfound", &[]);

  let Err(Unwind::Failure(diagnostic)) = fixture.run("import \"ghost\";") else {
    panic!("expected a failure");
  };
  assert!(diagnostic.message.contains("ghost"));
  assert!(diagnostic.message.contains("tried"));
}

#[test]
fn sibling_imports_resolve_relative_to_the_importer() {
  let fixture = Fixture::new(
    "sibling",
    &[
      ("a.meow", "import { helper } from \"b\"; export let result = helper();"),
      ("b.meow", "export function helper() { return \"from b\"; }"),
    ],
  );

  fixture
    .run("import { result } from \"a\"; log result;")
    .expect("entry should run");
  assert_eq!(fixture.output(), "from b");
}

#[test]
fn circular_imports_terminate() {
  let fixture = Fixture::new(
    "circular",
    &[
      ("a.meow", "import \"b\"; export let a = 1;"),
      ("b.meow", "import \"a\"; export let b = 2;"),
    ],
  );

  fixture
    .run("import { a } from \"a\"; log a;")
    .expect("circular imports should not loop");
  assert_eq!(fixture.output(), "1");
}

#[test]
fn native_modules_import_by_name() {
  let fixture = Fixture::new("native", &[]);

  fixture
    .run("import * as math from \"math\"; log math.floor(3.7);")
    .expect("entry should run");
  assert_eq!(fixture.output(), "3");
}

#[test]
fn native_module_import_all() {
  let fixture = Fixture::new("nativeall", &[]);

  fixture
    .run("import \"math\"; log max(1, 9, 4);")
    .expect("entry should run");
  assert_eq!(fixture.output(), "9");
}

#[test]
fn module_runtime_errors_propagate_to_the_importer() {
  let fixture = Fixture::new("broken", &[("bad.meow", "let x = 1 % 0;")]);

  let result = fixture.run("import \"bad\";");
  assert!(matches!(result, Err(Unwind::Failure(_))));
}

#[test]
fn module_parse_errors_propagate() {
  let fixture = Fixture::new("unparsable", &[("bad.meow", "let = ;")]);

  let result = fixture.run("import \"bad\";");
  assert!(matches!(result, Err(Unwind::Failure(_))));
}

#[test]
fn meta_eval_runs_source() {
  let fixture = Fixture::new("metaeval", &[]);

  fixture
    .run("import * as meta from \"meta\"; meta.execute(\"log 1 + 1;\");")
    .expect("entry should run");
  assert_eq!(fixture.output(), "2");
}

#[test]
fn load_from_source_caches_by_key() {
  let fixture = Fixture::new("bykey", &[]);

  fixture.run("log \"once\";").expect("first run");
  fixture.run("log \"once\";").expect("second run is cached");
  assert_eq!(fixture.output(), "once");
}
