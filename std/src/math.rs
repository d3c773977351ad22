use crate::{numeric_arg, LibraryBuilder};
use meow_interpreter::{Arity, Library, Unwind, Value};

fn unary(builder: LibraryBuilder, name: &'static str, function: fn(f64) -> f64) -> LibraryBuilder {
  builder.function(name, Arity::fixed(1), move |_, args| {
    Ok(Value::Real(function(numeric_arg(args, 0, name)?)))
  })
}

fn binary(
  builder: LibraryBuilder,
  name: &'static str,
  function: fn(f64, f64) -> f64,
) -> LibraryBuilder {
  builder.function(name, Arity::fixed(2), move |_, args| {
    Ok(Value::Real(function(
      numeric_arg(args, 0, name)?,
      numeric_arg(args, 1, name)?,
    )))
  })
}

pub fn library() -> Library {
  let mut builder = LibraryBuilder::new()
    .value("PI", std::f64::consts::PI)
    .value("E", std::f64::consts::E);

  for (name, function) in [
    ("sin", f64::sin as fn(f64) -> f64),
    ("cos", f64::cos),
    ("tan", f64::tan),
    ("asin", f64::asin),
    ("acos", f64::acos),
    ("atan", f64::atan),
    ("sqrt", f64::sqrt),
    ("cbrt", f64::cbrt),
    ("exp", f64::exp),
    ("log", f64::ln),
    ("log10", f64::log10),
    ("log2", f64::log2),
    ("abs", f64::abs),
    ("floor", f64::floor),
    ("ceil", f64::ceil),
    ("round", f64::round),
    ("trunc", f64::trunc),
  ] {
    builder = unary(builder, name, function);
  }

  for (name, function) in [
    ("pow", f64::powf as fn(f64, f64) -> f64),
    ("atan2", f64::atan2),
    ("hypot", f64::hypot),
  ] {
    builder = binary(builder, name, function);
  }

  builder
    .function("min", Arity::at_least(1), |_, args| pick(args, "min", false))
    .function("max", Arity::at_least(1), |_, args| pick(args, "max", true))
    .finish()
}

/// Smallest or largest argument, returned as the original value rather than
/// a coerced real.
fn pick(args: &[Value], name: &'static str, largest: bool) -> Result<Value, Unwind> {
  let mut best = args[0].clone();
  let mut best_key = numeric_arg(args, 0, name)?;

  for (index, value) in args.iter().enumerate().skip(1) {
    let key = numeric_arg(args, index, name)?;
    if (largest && key > best_key) || (!largest && key < best_key) {
      best = value.clone();
      best_key = key;
    }
  }
  Ok(best)
}
