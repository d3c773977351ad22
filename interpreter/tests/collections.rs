use meow_test::*;

meow_test!(array_indexing
"
let xs = [10, 20, 30];
let first = xs[0];
let last = xs[2];
xs[1] = 99;
let updated = xs[1];
let length = xs.length;
"
  first == 10
  last == 30
  updated == 99
  length == 3
);

meow_test!(negative_array_index_fails
"
let xs = [1, 2, 3];
let oops = xs[-1];
"
RuntimeError);

meow_test!(array_index_out_of_range_fails
"
let xs = [1, 2, 3];
let oops = xs[3];
"
RuntimeError);

meow_test!(array_assignment_out_of_range_fails
"
let xs = [1];
xs[1] = 2;
"
RuntimeError);

meow_test!(array_helpers
"
let xs = [3, 1, 2];
xs.push(4, 5);
let popped = xs.pop();
let sorted = xs.sort();
let first = sorted[0];
let doubled = xs.map(function(x) { return x * 2; });
let firstDoubled = doubled[0];
let odds = xs.filter(function(x) { return x % 2 == 1; });
let oddCount = odds.length;
let sum = xs.reduce(function(acc, x) { return acc + x; }, 0);
let where = xs.findIndex(function(x, i) { return x == 4; });
"
  popped == 5
  first == 1
  firstDoubled == 2
  oddCount == 2
  sum == 10
  where == 3
);

meow_test!(array_slice_and_reverse
"
let xs = [1, 2, 3, 4, 5];
let middle = xs.slice(1, 4);
let count = middle.length;
let head = middle[0];
let tail = xs.slice(-2);
let tailHead = tail[0];
xs.reverse();
let reversedHead = xs[0];
"
  count == 3
  head == 2
  tailHead == 4
  reversedHead == 5
);

meow_test!(array_resize_fills_with_null
"
let xs = [1];
xs.resize(3);
let filled = xs[2] == null;
xs.resize(4, 0);
let zero = xs[3];
"
  filled == true
  zero == 0
);

meow_test!(string_indexing_returns_characters
"
let s = \"abc\";
let first = s[0];
let length = s.length;
"
  first == "a"
  length == 3
);

meow_test!(string_index_out_of_range_fails
"
let oops = \"abc\"[3];
"
RuntimeError);

meow_test!(strings_are_immutable
"
let s = \"abc\";
s[0] = \"x\";
"
RuntimeError);

meow_test!(string_helpers
"
let parts = \"a,b,c\".split(\",\");
let count = parts.length;
let upper = \"meow\".upper();
let trimmed = \"  x  \".trim();
let joined = \",\".join([1, 2]);
let sliced = \"hello\".slice(1, 3);
let replaced = \"aaa\".replace(\"a\", \"b\");
let padded = \"7\".padLeft(3, \"0\");
"
  count == 3
  upper == "MEOW"
  trimmed == "x"
  joined == "1,2"
  sliced == "el"
  replaced == "baa"
  padded == "007"
);

meow_test!(object_get_and_set
"
let o = {a: 1, \"b\": 2, [1 + 1]: \"two\", true: \"yes\"};
let a = o.a;
let b = o[\"b\"];
let two = o[2];
let yes = o[true];
o.c = 3;
o[\"d\"] = 4;
let c = o.c;
let d = o.d;
let missingIsNull = o.nope == null;
"
  a == 1
  b == 2
  two == "two"
  yes == "yes"
  c == 3
  d == 4
  missingIsNull == true
);

meow_test!(unhashable_object_key_fails
"
let o = {};
o[[1, 2]] = 3;
"
RuntimeError);

meow_test!(unhashable_literal_key_fails
"
let o = {[[]]: 1};
"
RuntimeError);

meow_test!(object_helpers
"
let o = {a: 1, b: 2};
let keyCount = o.keys().length;
let valueSum = o.values().reduce(function(acc, v) { return acc + v; }, 0);
let hasA = o.has(\"a\");
let hasZ = o.has(\"z\");
let merged = o.merge({c: 3});
let mergedCount = merged.keys().length;
"
  keyCount == 2
  valueSum == 3
  hasA == true
  hasZ == false
  mergedCount == 3
);

meow_test!(objects_share_state_by_reference
"
let a = {n: 1};
let b = a;
b.n = 2;
let seen = a.n;
"
  seen == 2
);

meow_test!(len_builtin
"
let s = len(\"abcd\");
let xs = len([1, 2]);
let o = len({a: 1});
"
  s == 4
  xs == 2
  o == 1
);

meow_test!(len_of_a_number_fails
"
len(1);
"
RuntimeError);

meow_test!(range_builtin
"
let upTo = range(4);
let upToCount = upTo.length;
let between = range(2, 5);
let betweenFirst = between[0];
let stepped = range(10, 0, -2);
let steppedCount = stepped.length;
"
  upToCount == 4
  betweenFirst == 2
  steppedCount == 5
);

meow_test!(indexing_a_number_fails
"
let oops = 5[0];
"
RuntimeError);
