use crate::value::Value;
use ahash::AHashMap;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone)]
struct Binding {
  value: Value,
  constant: bool,
}

struct Scope {
  bindings: AHashMap<String, Binding>,
  parent: Option<Environment>,
}

/// A lexically nested variable scope. Cloning an environment aliases the
/// same frame, which is how closures capture their defining scope.
#[derive(Clone)]
pub struct Environment(Rc<RefCell<Scope>>);

impl Environment {
  pub fn global() -> Environment {
    Environment(Rc::new(RefCell::new(Scope {
      bindings: AHashMap::new(),
      parent: None,
    })))
  }

  /// A fresh frame whose lookups fall back to this one.
  pub fn child(&self) -> Environment {
    Environment(Rc::new(RefCell::new(Scope {
      bindings: AHashMap::new(),
      parent: Some(self.clone()),
    })))
  }

  /// Always writes the current frame, shadowing any outer binding.
  pub fn define(&self, name: &str, value: Value, constant: bool) {
    self
      .0
      .borrow_mut()
      .bindings
      .insert(name.to_string(), Binding { value, constant });
  }

  /// Walks the parent chain; unbound names read as `null`.
  pub fn find(&self, name: &str) -> Value {
    self.lookup(name).unwrap_or(Value::Null)
  }

  pub fn lookup(&self, name: &str) -> Option<Value> {
    let mut current = Some(self.clone());
    while let Some(environment) = current {
      let scope = environment.0.borrow();
      if let Some(binding) = scope.bindings.get(name) {
        return Some(binding.value.clone());
      }
      current = scope.parent.clone();
    }
    None
  }

  /// Writes the first frame that owns the name, refusing constants. A name
  /// unknown to the whole chain is created in the current frame.
  pub fn assign(&self, name: &str, value: &Value) -> Result<(), String> {
    let mut current = Some(self.clone());
    while let Some(environment) = current {
      let parent = {
        let mut scope = environment.0.borrow_mut();
        if let Some(binding) = scope.bindings.get_mut(name) {
          if binding.constant {
            return Err(format!("Cannot assign to '{name}', it is a constant"));
          }
          binding.value = value.clone();
          return Ok(());
        }
        scope.parent.clone()
      };
      current = parent;
    }

    self.define(name, value.clone(), false);
    Ok(())
  }

  /// Every visible binding, with inner frames shadowing outer ones.
  pub fn flattened(&self) -> Vec<(String, Value, bool)> {
    let mut chain = Vec::new();
    let mut current = Some(self.clone());
    while let Some(environment) = current {
      chain.push(environment.clone());
      current = environment.0.borrow().parent.clone();
    }

    let mut all: AHashMap<String, (Value, bool)> = AHashMap::new();
    for environment in chain.into_iter().rev() {
      for (name, binding) in environment.0.borrow().bindings.iter() {
        all.insert(name.clone(), (binding.value.clone(), binding.constant));
      }
    }

    all
      .into_iter()
      .map(|(name, (value, constant))| (name, value, constant))
      .collect()
  }
}
