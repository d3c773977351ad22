use super::functions::{Arity, Function};
use super::objects::Object;
use super::{HashKey, Value};
use ahash::AHashMap;
use std::cell::RefCell;
use std::rc::Rc;

pub struct ClassData {
  pub name: String,
  pub superclass: Option<Class>,
  pub methods: AHashMap<String, Function>,
  statics: RefCell<AHashMap<String, Value>>,
}

#[derive(Clone)]
pub struct Class(Rc<ClassData>);

impl Class {
  pub fn new(
    name: impl Into<String>,
    superclass: Option<Class>,
    methods: AHashMap<String, Function>,
  ) -> Class {
    Class(Rc::new(ClassData {
      name: name.into(),
      superclass,
      methods,
      statics: RefCell::new(AHashMap::new()),
    }))
  }

  pub fn name(&self) -> &str {
    &self.0.name
  }

  pub fn superclass(&self) -> Option<&Class> {
    self.0.superclass.as_ref()
  }

  /// Walk the inheritance chain for a method.
  pub fn find_method(&self, name: &str) -> Option<Function> {
    if let Some(method) = self.0.methods.get(name) {
      return Some(method.clone());
    }
    self.superclass().and_then(|superclass| superclass.find_method(name))
  }

  /// Constructing a class takes whatever its `init` takes.
  pub fn arity(&self) -> Arity {
    match self.find_method("init") {
      Some(init) => init.arity(),
      None => Arity::fixed(0),
    }
  }

  pub fn get(&self, key: &Value) -> Result<Value, String> {
    let Value::String(name) = key else {
      return Err("Static field names must be strings".to_string());
    };

    match name.as_ref() {
      "__name__" => return Ok(Value::from(self.name())),
      "__super__" => {
        return Ok(match self.superclass() {
          Some(superclass) => Value::Class(superclass.clone()),
          None => Value::Null,
        })
      }
      _ => {}
    }

    Ok(
      self
        .0
        .statics
        .borrow()
        .get(name.as_ref())
        .cloned()
        .unwrap_or(Value::Null),
    )
  }

  pub fn set(&self, key: &Value, value: Value) -> Result<(), String> {
    let Value::String(name) = key else {
      return Err("Static field names must be strings".to_string());
    };
    self.0.statics.borrow_mut().insert(name.to_string(), value);
    Ok(())
  }

  pub fn static_entries(&self) -> Vec<(String, Value)> {
    self
      .0
      .statics
      .borrow()
      .iter()
      .map(|(name, value)| (name.clone(), value.clone()))
      .collect()
  }

  pub fn ptr_eq(&self, other: &Class) -> bool {
    Rc::ptr_eq(&self.0, &other.0)
  }
}

pub struct InstanceData {
  class: Class,
  fields: Object,
}

#[derive(Clone)]
pub struct Instance(Rc<InstanceData>);

impl Instance {
  pub fn new(class: Class) -> Instance {
    Instance(Rc::new(InstanceData {
      class,
      fields: Object::new(),
    }))
  }

  /// Rebuild an instance around an existing field object, used by the
  /// `instance()` coercion in the core library.
  pub fn with_fields(class: Class, fields: Object) -> Instance {
    Instance(Rc::new(InstanceData { class, fields }))
  }

  pub fn class(&self) -> &Class {
    &self.0.class
  }

  pub fn fields(&self) -> &Object {
    &self.0.fields
  }

  pub fn field(&self, name: &str) -> Option<Value> {
    self.0.fields.lookup(&HashKey::Str(name.into()))
  }

  pub fn ptr_eq(&self, other: &Instance) -> bool {
    Rc::ptr_eq(&self.0, &other.0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn methods_resolve_through_superclass() {
    let mut methods = AHashMap::new();
    methods.insert(
      "speak".to_string(),
      Function::Native(Rc::new(super::super::NativeFunction::new(
        "speak",
        Arity::fixed(0),
        |_, _| Ok(Value::Null),
      ))),
    );
    let animal = Class::new("Animal", None, methods);
    let dog = Class::new("Dog", Some(animal), AHashMap::new());

    assert!(dog.find_method("speak").is_some());
    assert!(dog.find_method("fetch").is_none());
  }

  #[test]
  fn special_static_names() {
    let base = Class::new("Base", None, AHashMap::new());
    let derived = Class::new("Derived", Some(base.clone()), AHashMap::new());

    assert_eq!(derived.get(&Value::from("__name__")).unwrap(), Value::from("Derived"));
    assert!(matches!(
      derived.get(&Value::from("__super__")).unwrap(),
      Value::Class(superclass) if superclass.ptr_eq(&base)
    ));
    assert_eq!(base.get(&Value::from("__super__")).unwrap(), Value::Null);
  }

  #[test]
  fn statics_are_mutable() {
    let class = Class::new("Config", None, AHashMap::new());
    class.set(&Value::from("version"), Value::Int(2)).unwrap();
    assert_eq!(class.get(&Value::from("version")).unwrap(), Value::Int(2));
    assert_eq!(class.get(&Value::from("missing")).unwrap(), Value::Null);
    assert!(class.set(&Value::Int(1), Value::Null).is_err());
  }
}
