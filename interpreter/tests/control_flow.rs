use meow_test::*;

meow_test!(if_else_branches
"
let a;
if (1 < 2) a = \"then\"; else a = \"else\";
let b;
if (1 > 2) b = \"then\"; else b = \"else\";
let c = 0;
if (false) c = 1;
"
  a == "then"
  b == "else"
  c == 0
);

meow_test!(truthiness_drives_conditions
"
let reached = 0;
if (\"\") reached = 1;
if ([]) reached = 2;
if (\"x\") reached = 3;
"
  reached == 3
);

meow_test!(while_loop_with_break_and_continue
"
let i = 0;
let sum = 0;
while (i < 10) {
  i = i + 1;
  if (i % 2 == 0) continue;
  if (i > 7) break;
  sum = sum + i;
}
"
  sum == 16
);

meow_test!(do_while_runs_at_least_once
"
let count = 0;
do {
  count = count + 1;
} while (false);
"
  count == 1
);

meow_test!(c_style_for
"
let sum = 0;
for (let i = 0; i < 5; i = i + 1) {
  sum = sum + i;
}
"
  sum == 10
);

meow_test!(continue_still_runs_the_update
"
let evens = 0;
for (let i = 0; i < 10; i = i + 1) {
  if (i % 2 == 1) continue;
  evens = evens + 1;
}
"
  evens == 5
);

meow_test!(for_without_parentheses
"
let sum = 0;
for let i = 0; i < 3; i = i + 1 {
  sum = sum + i;
}
"
  sum == 3
);

meow_test!(for_in_over_array
"
let sum = 0;
for (x in [1, 2, 3]) {
  sum = sum + x;
}
"
  sum == 6
);

meow_test!(for_in_over_string
"
let collected = \"\";
for (c : \"abc\") {
  collected = collected + c;
}
"
  collected == "abc"
);

meow_test!(for_in_over_object_pairs
"
let o = {a: 1, b: 2};
let sum = 0;
let keys = 0;
for (p in o) {
  sum = sum + p.second;
  keys = keys + 1;
}
"
  sum == 3
  keys == 2
);

meow_test!(nested_loops_break_only_the_inner
"
let total = 0;
for (let i = 0; i < 3; i = i + 1) {
  for (let j = 0; j < 10; j = j + 1) {
    if (j == 2) break;
    total = total + 1;
  }
}
"
  total == 6
);

meow_test!(switch_matches_and_falls_through
"
let trace = \"\";
switch 2 {
  case 1:
    trace = trace + \"one\";
  case 2:
    trace = trace + \"two\";
  case 3:
    trace = trace + \"three\";
}
"
  trace == "twothree"
);

meow_test!(switch_break_stops_fallthrough
"
let trace = \"\";
switch 1 {
  case 1:
    trace = trace + \"one\";
    break;
  case 2:
    trace = trace + \"two\";
}
"
  trace == "one"
);

meow_test!(switch_default_used_only_without_a_match
"
let viaDefault;
switch 99 {
  case 1:
    viaDefault = \"one\";
    break;
  default:
    viaDefault = \"default\";
    break;
  case 2:
    viaDefault = \"two\";
    break;
}

let notDefault;
switch 2 {
  case 1:
    notDefault = \"one\";
    break;
  default:
    notDefault = \"default\";
    break;
  case 2:
    notDefault = \"two\";
    break;
}
"
  viaDefault == "default"
  notDefault == "two"
);

meow_test!(switch_mismatched_kinds_are_not_equal
"
let fell = \"none\";
switch 1 {
  case \"1\":
    fell = \"string\";
    break;
  default:
    fell = \"default\";
}
"
  fell == "default"
);

meow_test!(top_level_break_is_an_error
"
break;
"
RuntimeError);
