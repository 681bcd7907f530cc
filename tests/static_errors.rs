#[macro_use]
mod common;

#[test]
fn reading_a_local_variable_in_its_own_initializer_is_a_compile_error() {
    assert_compile_error!("{ var a = a; }");
}

#[test]
fn redeclaring_a_name_in_the_same_scope_is_a_compile_error() {
    assert_compile_error!("{ var a = 1; var a = 2; }");
}

#[test]
fn returning_from_top_level_code_is_a_compile_error() {
    assert_compile_error!("return 1;");
}

#[test]
fn returning_a_value_from_an_initializer_is_a_compile_error() {
    assert_compile_error!("class A { init() { return 1; } }");
}

#[test]
fn using_this_outside_a_class_is_a_compile_error() {
    assert_compile_error!("print this;");
}

#[test]
fn using_super_outside_a_class_is_a_compile_error() {
    assert_compile_error!("print super.foo;");
}

#[test]
fn using_super_in_a_class_with_no_superclass_is_a_compile_error() {
    assert_compile_error!("class A { foo() { super.foo(); } }");
}

#[test]
fn a_class_inheriting_from_itself_is_a_compile_error() {
    assert_compile_error!("class A < A {}");
}

#[test]
fn break_outside_a_loop_is_a_compile_error() {
    assert_compile_error!("break;");
}

#[test]
fn invalid_assignment_target_is_a_compile_error() {
    assert_compile_error!("1 = 2;");
}

#[test]
fn unterminated_string_is_a_compile_error() {
    assert_compile_error!("\"unterminated");
}
