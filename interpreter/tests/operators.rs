use meow_test::*;

meow_test!(integer_arithmetic_stays_integer
"
let sum = 2 + 3;
let product = 6 * 7;
let difference = 1 - 4;
let remainder = 17 % 5;
let kind = typeof(sum);
"
  sum == 5
  product == 42
  difference == -3
  remainder == 2
  kind == "int"
);

meow_test!(mixed_arithmetic_promotes
"
let a = 1 + 0.5;
let kind = typeof(a);
"
  a == 1.5
  kind == "real"
);

meow_test!(division_is_always_real
"
let exact = 6 / 2;
let kind = typeof(exact);
let nan = 0 / 0;
let nanIsSelfUnequal = nan != nan;
let positive = 1 / 0;
let negative = -1 / 0;
let positiveIsInfinite = positive == 2 / 0;
let negativeIsOpposite = negative == -positive;
"
  exact == 3.0
  kind == "real"
  nanIsSelfUnequal == true
  positiveIsInfinite == true
  negativeIsOpposite == true
);

meow_test!(modulo_by_zero_fails
"
let oops = 1 % 0;
"
RuntimeError);

meow_test!(exponent_is_always_real
"
let one = 0 ** 0;
let kind = typeof(one);
let kilo = 2 ** 10;
"
  one == 1.0
  kind == "real"
  kilo == 1024.0
);

meow_test!(booleans_count_as_numbers
"
let three = true + 2;
let zero = false * 10;
"
  three == 3
  zero == 0
);

meow_test!(string_concatenation_stringifies_the_other_side
"
let a = \"n=\" + 4;
let b = 4 + \"!\";
let c = \"v: \" + null;
let d = \"\" + [1, 2];
"
  a == "n=4"
  b == "4!"
  c == "v: null"
  d == "[1, 2]"
);

meow_test!(string_and_array_repetition
"
let ab3 = \"ab\" * 3;
let ba3 = 3 * \"ba\";
let empty = \"x\" * -2;
let doubled = [1] * 2;
let count = doubled.length;
"
  ab3 == "ababab"
  ba3 == "bababa"
  empty == ""
  count == 2
);

meow_test!(array_concatenation
"
let joined = [1, 2] + [3];
let count = joined.length;
let last = joined[2];
"
  count == 3
  last == 3
);

meow_test!(null_equality_table
"
let zeroEqualsNull = 0 == null;
let emptyStringEqualsNull = \"\" == null;
let falseEqualsNull = false == null;
let emptyArrayEqualsNull = [] == null;
let emptyObjectEqualsNull = {} == null;
let oneEqualsNull = 1 == null;
let nullEqualsNull = null == null;
"
  zeroEqualsNull == false
  emptyStringEqualsNull == true
  falseEqualsNull == true
  emptyArrayEqualsNull == true
  emptyObjectEqualsNull == true
  oneEqualsNull == false
  nullEqualsNull == true
);

meow_test!(reference_equality_for_arrays
"
let a = [1];
let b = [1];
let same = a == a;
let different = a == b;
"
  same == true
  different == false
);

meow_test!(comparisons
"
let lt = 1 < 1.5;
let ge = 2 >= 2;
let strings = \"apple\" < \"banana\";
let boolCmp = false < 1;
"
  lt == true
  ge == true
  strings == true
  boolCmp == true
);

meow_test!(mismatched_comparison_fails
"
let oops = 1 < \"a\";
"
RuntimeError);

meow_test!(logical_operators_return_operands
"
let a = false || \"fallback\";
let b = \"first\" && \"second\";
let c = 0 && \"unreached\";
let d = null ?? 5;
let e = 0 ?? 5;
"
  a == "fallback"
  b == "second"
  c == 0
  d == 5
  e == 0
);

meow_test!(logical_not_follows_truthiness
"
let a = !null;
let b = !0;
let c = !\"\";
let d = ![];
let e = !{};
let f = !1;
let g = !!\"x\";
"
  a == true
  b == true
  c == true
  d == true
  e == true
  f == false
  g == true
);

meow_test!(bitwise_operators
"
let and = 12 & 10;
let or = 12 | 10;
let xor = 12 ^ 10;
let shl = 1 << 4;
let shr = 32 >> 2;
let not = ~0;
let code = \"a\" & 0xFF;
"
  and == 8
  or == 14
  xor == 6
  shl == 16
  shr == 8
  not == -1
  code == 97
);

meow_test!(unary_minus
"
let a = -3;
let b = -2.5;
let c = -\"a\";
"
  a == -3
  b == -2.5
  c == -97
);

meow_test!(prefix_and_postfix_update
"
let a = 1;
let pre = ++a;
let post = a++;
let b = 5;
let down = --b;
"
  a == 3
  pre == 2
  post == 2
  b == 4
  down == 4
);

meow_test!(update_requires_an_integer
"
let a = 1.5;
++a;
"
RuntimeError);

meow_test!(ternary_expression
"
let big = 10 > 5 ? \"yes\" : \"no\";
let small = 1 > 5 ? \"yes\" : \"no\";
"
  big == "yes"
  small == "no"
);

meow_test!(operator_without_entry_fails
"
let oops = [] - 1;
"
RuntimeError);
