use meow_test::*;

meow_test!(inheritance_and_super
"
class Animal { function init(n) { this.n = n; } function speak() { return this.n + \" speaks\"; } }
class Dog : Animal { function speak() { return super.speak() + \" woof\"; } }
log (new Dog(\"rex\")).speak();
"
outputs "rex speaks woof");

meow_test!(construction_runs_init
"
class Point {
  init(x, y) {
    this.x = x;
    this.y = y;
  }
}
let p = new Point(3, 4);
let x = p.x;
let y = p.y;
"
  x == 3
  y == 4
);

meow_test!(class_without_init_takes_no_arguments
"
class Empty {}
let e = new Empty();
let kind = typeof(e);
"
  kind == "instance"
);

meow_test!(calling_the_class_is_construction
"
class Box { init(v) { this.v = v; } }
let b = Box(7);
let v = b.v;
"
  v == 7
);

meow_test!(methods_bind_this
"
class Greeter {
  init(name) { this.name = name; }
  greet() { return \"hi \" + this.name; }
}
let m = new Greeter(\"meow\").greet;
let text = m();
"
  text == "hi meow"
);

meow_test!(super_init_chains_constructors
"
class Base { init(v) { this.base = v; } }
class Derived : Base {
  init(v) {
    super(v * 2);
    this.own = v;
  }
}
let d = new Derived(5);
let base = d.base;
let own = d.own;
"
  base == 10
  own == 5
);

meow_test!(fields_are_mutable_shared_state
"
class Holder { init() { this.count = 0; } }
let h = new Holder();
let alias = h;
h.count = 3;
let seen = alias.count;
"
  seen == 3
);

meow_test!(static_fields_and_functions
"
class Config {
  static let version = 2;
  static function describe() { return \"v\" + Config.version; }
}
let version = Config.version;
let text = Config.describe();
Config.version = 3;
let bumped = Config.version;
"
  version == 2
  text == "v2"
  bumped == 3
);

meow_test!(class_reflection_names
"
class Base {}
class Child : Base {}
let name = Child.__name__;
let superName = Child.__super__.__name__;
let rootSuperIsNull = Base.__super__ == null;
"
  name == "Child"
  superName == "Base"
  rootSuperIsNull == true
);

meow_test!(instance_reflection
"
class Cat { purr() { return 1; } }
let felix = new Cat();
let sameClass = felix.__class__ == Cat;
let hasPurr = felix.__hasmethod__(\"purr\");
let hasBark = felix.__hasmethod__(\"bark\");
let isCat = felix.__instanceof__(Cat);
"
  sameClass == true
  hasPurr == true
  hasBark == false
  isCat == true
);

meow_test!(instanceof_walks_the_chain
"
class A {}
class B : A {}
class C {}
let b = new B();
let isA = b.__instanceof__(A);
let isC = b.__instanceof__(C);
"
  isA == true
  isC == false
);

meow_test!(str_dunder_controls_stringification
"
class Point {
  init(x, y) { this.x = x; this.y = y; }
  __str__() { return `(%{this.x}, %{this.y})`; }
}
log new Point(1, 2);
log \" \";
log str(new Point(3, 4));
"
outputs "(1, 2) (3, 4)");

meow_test!(instances_without_str_render_their_class
"
class Ghost {}
log new Ghost();
"
outputs "Ghost instance");

meow_test!(call_dunder_makes_instances_callable
"
class Adder {
  init(amount) { this.amount = amount; }
  __call__(x) { return x + this.amount; }
}
let add5 = new Adder(5);
let result = add5(10);
"
  result == 15
);

meow_test!(index_dunders
"
class Wrapper {
  init() { this.data = {}; }
  __getitem__(key) { return this.data[key] ?? \"missing\"; }
  __setitem__(key, value) { this.data[key] = value; }
}
let w = new Wrapper();
w[\"a\"] = 1;
let found = w[\"a\"];
let missing = w[\"b\"];
"
  found == 1
  missing == "missing"
);

meow_test!(operator_dunders
"
class Vec {
  init(x) { this.x = x; }
  __add__(other) { return new Vec(this.x + other.x); }
  __eq__(other) { return this.x == other.x; }
}
let sum = new Vec(1) + new Vec(2);
let x = sum.x;
let equal = new Vec(3) == new Vec(3);
"
  x == 3
  equal == true
);

meow_test!(instances_without_eq_compare_by_identity
"
class Token {}
let a = new Token();
let same = a == a;
let different = a == new Token();
"
  same == true
  different == false
);

meow_test!(iterator_protocol
"
class Range {
  init(stop) { this.stop = stop; }
  __iterator__() { return new RangeCursor(this.stop); }
}
class RangeCursor {
  init(stop) { this.i = 0; this.stop = stop; }
  __next__() {
    if (this.i >= this.stop) throw \"done\";
    let v = this.i;
    this.i = this.i + 1;
    return v;
  }
}
let sum = 0;
for (x in new Range(4)) sum = sum + x;
"
  sum == 6
);

meow_test!(coercion_hooks
"
class Money {
  init(cents) { this.cents = cents; }
  __int__() { return this.cents; }
  __bool__() { return this.cents != 0; }
}
let cents = int(new Money(125));
let truthy = bool(new Money(1));
let falsy = bool(new Money(0));
"
  cents == 125
  truthy == true
  falsy == false
);

meow_test!(bound_method_reflection
"
class Cat { purr() { return \"purr\"; } }
let felix = new Cat();
let method = felix.purr;
let sameInstance = method.__instance__ == felix;
let called = method();
"
  sameInstance == true
  called == "purr"
);

meow_test!(methods_resolve_through_the_chain
"
class A { ping() { return \"a\"; } }
class B : A {}
class C : B {}
let result = new C().ping();
"
  result == "a"
);

meow_test!(missing_method_reads_as_null
"
class Empty {}
let isNull = new Empty().nothing == null;
"
  isNull == true
);

meow_test!(superclass_must_be_a_class
"
let NotAClass = 3;
class Broken : NotAClass {}
"
RuntimeError);
