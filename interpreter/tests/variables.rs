use meow_test::*;

meow_test!(let_declares
"
let a = 8;
let b;
let bIsNull = b == null;
"
  a == 8
  bIsNull == true
);

meow_test!(assignment_returns_its_value
"
let a;
let b = a = 3;
"
  a == 3
  b == 3
);

meow_test!(blocks_scope_shadowing
"
let a = 1;
let seen;
{
  let a = 2;
  seen = a;
}
"
  a == 1
  seen == 2
);

meow_test!(assignment_writes_the_owning_frame
"
let a = 1;
{
  a = 5;
}
"
  a == 5
);

meow_test!(assigning_an_unknown_name_creates_a_local
"
let leaked;
{
  fresh = 9;
  leaked = fresh;
}
let outsideIsNull = fresh == null;
"
  leaked == 9
  outsideIsNull == true
);

meow_test!(unbound_names_read_as_null
"
let ghostIsNull = nowhere == null;
"
  ghostIsNull == true
);

meow_test!(const_cannot_be_reassigned
"
const pi = 3;
pi = 4;
"
RuntimeError);

meow_test!(const_value_is_readable
"
const greeting = \"hi\";
let copied = greeting;
"
  copied == "hi"
);

meow_test!(compound_assignment_on_variables
"
let a = 10;
a += 5;
a -= 1;
a *= 2;
"
  a == 28
);

meow_test!(exponent_compound_assignment_becomes_real
"
let a = 2;
a **= 3;
"
  a == 8.0
);

meow_test!(missing_semicolon_fails_to_parse
"
let a = 1
"
ParseError);
