#[macro_use]
mod common;

#[test]
fn arithmetic_honors_operator_precedence() {
    assert_prints!("print 1 + 2 * 3 - 4 / 2;", ["5"]);
    assert_prints!("print (1 + 2) * 3;", ["9"]);
}

#[test]
fn string_concatenation_and_mixed_type_addition_error() {
    assert_prints!(r#"print "foo" + "bar";"#, ["foobar"]);
    assert_runtime_error!(r#"print "foo" + 1;"#);
}

#[test]
fn closures_see_the_binding_live_at_declaration_even_under_rebinding() {
    assert_prints!(
        r#"
        var a = "global";
        {
          fun showA() { print a; }
          showA();
          var a = "block";
          showA();
        }
        "#,
        ["global", "global"]
    );
}

#[test]
fn classes_support_single_inheritance_and_super_calls() {
    assert_prints!(
        r#"
        class Animal {
          speak() { print "..."; }
        }
        class Dog < Animal {
          speak() {
            super.speak();
            print "Woof";
          }
        }
        Dog().speak();
        "#,
        ["...", "Woof"]
    );
}

#[test]
fn initializer_implicitly_returns_this_even_with_an_explicit_empty_return() {
    assert_prints!(
        r#"
        class Counter {
          init() {
            this.count = 0;
            return;
          }
          increment() {
            this.count = this.count + 1;
            return this;
          }
        }
        var c = Counter();
        print c.increment().increment().count;
        "#,
        ["2"]
    );
}

#[test]
fn recursive_fibonacci() {
    assert_prints!(
        r#"
        fun fib(n) {
          if (n < 2) return n;
          return fib(n - 1) + fib(n - 2);
        }
        print fib(10);
        "#,
        ["55"]
    );
}
