#[macro_use]
mod common;

#[test]
fn functions_can_be_called_with_matching_arity() {
    assert_prints!(
        r#"
        fun add(a, b) { return a + b; }
        print add(1, 2);
        "#,
        ["3"]
    );
}

#[test]
fn calling_with_the_wrong_number_of_arguments_is_a_runtime_error() {
    assert_runtime_error!(
        r#"
        fun add(a, b) { return a + b; }
        add(1);
        "#
    );
}

#[test]
fn calling_a_non_callable_value_is_a_runtime_error() {
    assert_runtime_error!("var x = 1; x();");
}

#[test]
fn a_function_with_no_return_statement_evaluates_to_nil() {
    assert_prints!(
        r#"
        fun sideEffect() { print "ran"; }
        print sideEffect();
        "#,
        ["ran", "nil"]
    );
}

#[test]
fn each_call_gets_its_own_environment() {
    assert_prints!(
        r#"
        fun identity(x) { return x; }
        print identity(1);
        print identity(2);
        "#,
        ["1", "2"]
    );
}

#[test]
fn nested_closures_each_capture_their_own_declaration_scope() {
    assert_prints!(
        r#"
        fun makeCounter() {
          var count = 0;
          fun increment() {
            count = count + 1;
            return count;
          }
          return increment;
        }
        var a = makeCounter();
        var b = makeCounter();
        print a();
        print a();
        print b();
        "#,
        ["1", "2", "1"]
    );
}

#[test]
fn clock_is_available_as_a_native_function() {
    assert_prints!(
        r#"
        var before = clock();
        var after = clock();
        print after >= before;
        "#,
        ["true"]
    );
}
