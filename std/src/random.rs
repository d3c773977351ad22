use crate::{array_arg, int_arg, LibraryBuilder};
use meow_interpreter::{Arity, Library, Unwind, Value};
use rand::seq::SliceRandom;
use rand::Rng;

pub fn library() -> Library {
  LibraryBuilder::new()
    .function("random", Arity::fixed(0), |_, _| {
      Ok(Value::Real(rand::thread_rng().gen::<f64>()))
    })
    .function("randint", Arity::fixed(2), |_, args| {
      let low = int_arg(args, 0, "randint")?;
      let high = int_arg(args, 1, "randint")?;
      if low > high {
        return Err(Unwind::exception(
          "'randint' expects its lower bound first",
        ));
      }
      Ok(Value::Int(rand::thread_rng().gen_range(low..=high)))
    })
    .function("choice", Arity::fixed(1), |_, args| {
      let array = array_arg(args, 0, "choice")?;
      let elements = array.to_vec();
      match elements.choose(&mut rand::thread_rng()) {
        Some(value) => Ok(value.clone()),
        None => Err(Unwind::exception("'choice' needs a non-empty array")),
      }
    })
    .function("shuffle", Arity::fixed(1), |_, args| {
      let array = array_arg(args, 0, "shuffle")?;
      array.with(|elements| elements.shuffle(&mut rand::thread_rng()));
      Ok(args[0].clone())
    })
    .finish()
}
