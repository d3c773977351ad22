use meow_test::*;

meow_test!(try_catch_binds_the_thrown_value
"
try { throw \"oops\"; } catch (e) { log \"got: \" + e; }
"
outputs "got: oops");

meow_test!(caught_value_is_the_thrown_value
"
class Error { init(code) { this.code = code; } }
let thrown = new Error(42);
let identical;
try {
  throw thrown;
} catch (e) {
  identical = e == thrown;
}
"
  identical == true
);

meow_test!(throw_propagates_through_calls
"
function inner() { throw \"deep\"; }
function outer() { inner(); }
let caught;
try {
  outer();
} catch (e) {
  caught = e;
}
"
  caught == "deep"
);

meow_test!(bare_throw_rethrows
"
let caught;
try {
  try {
    throw \"original\";
  } catch (e) {
    throw;
  }
} catch (e) {
  caught = e;
}
"
  caught == "original"
);

meow_test!(bare_throw_outside_catch_fails
"
throw;
"
RuntimeError);

meow_test!(uncaught_throw_is_a_runtime_error
"
throw \"boom\";
"
RuntimeError);

meow_test!(any_value_can_be_thrown
"
let caught;
try { throw 42; } catch (e) { caught = e; }
let caughtArray;
try { throw [1]; } catch (e) { caughtArray = e.length; }
"
  caught == 42
  caughtArray == 1
);

meow_test!(execution_resumes_after_a_handled_error
"
let after = \"not yet\";
try { throw \"x\"; } catch (e) {}
after = \"resumed\";
"
  after == "resumed"
);

meow_test!(break_and_continue_pass_through_try
"
let total = 0;
for (let i = 0; i < 5; i = i + 1) {
  try {
    if (i == 3) break;
    total = total + 1;
  } catch (e) {}
}
"
  total == 3
);

meow_test!(catch_variable_is_scoped_to_the_catch_block
"
try { throw 1; } catch (boundHere) {}
let isNull = boundHere == null;
"
  isNull == true
);

meow_test!(assert_failure_is_an_error
"
assert(1 == 2, \"math is broken\");
"
RuntimeError);

meow_test!(assert_success_is_silent
"
assert(true);
assert(1, \"ints are truthy\");
let fine = \"ok\";
"
  fine == "ok"
);

meow_test!(runtime_errors_are_catchable_only_as_throws
"
let reached = false;
try {
  let x = 1 % 0;
  reached = true;
} catch (e) {
  reached = \"caught\";
}
"
RuntimeError);

meow_test!(export_outside_a_module_context_works_in_tests
"
export let x = 1;
let seen = x;
"
  seen == 1
);
