#[macro_use]
mod common;

#[test]
fn instances_store_fields_without_prior_declaration() {
    assert_prints!(
        r#"
        class Point {}
        var p = Point();
        p.x = 1;
        p.y = 2;
        print p.x + p.y;
        "#,
        ["3"]
    );
}

#[test]
fn methods_are_bound_to_the_instance_they_were_looked_up_on() {
    assert_prints!(
        r#"
        class Box {
          init(value) { this.value = value; }
          get() { return this.value; }
        }
        var a = Box(1);
        var b = Box(2);
        print a.get();
        print b.get();
        "#,
        ["1", "2"]
    );
}

#[test]
fn a_bound_method_keeps_its_instance_even_after_reassignment() {
    assert_prints!(
        r#"
        class Box {
          init(value) { this.value = value; }
          get() { return this.value; }
        }
        var a = Box(1);
        var getter = a.get;
        print getter();
        "#,
        ["1"]
    );
}

#[test]
fn accessing_an_undefined_property_is_a_runtime_error() {
    assert_runtime_error!("class Box {} print Box().missing;");
}

#[test]
fn the_class_itself_prints_as_its_bare_name() {
    assert_prints!("class Box {} print Box;", ["Box"]);
}

#[test]
fn an_instance_prints_as_class_name_instance() {
    assert_prints!("class Box {} print Box();", ["Box instance"]);
}

#[test]
fn inherited_methods_are_visible_on_subclass_instances() {
    assert_prints!(
        r#"
        class A { hello() { print "hello from A"; } }
        class B < A {}
        B().hello();
        "#,
        ["hello from A"]
    );
}

#[test]
fn inheriting_from_a_non_class_value_is_a_runtime_error() {
    assert_runtime_error!("var NotAClass = 1; class Sub < NotAClass {}");
}
