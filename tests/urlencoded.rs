use formtree::{build_from_urlencoded, convert_urlencoded, BuildOptions, Schema, SchemaType};
use rstest::rstest;
use serde_json::json;

fn todo_schema() -> Schema {
    Schema::object()
        .with_id("todo")
        .with_property("key", Schema::new(SchemaType::Integer))
        .with_property("completed", Schema::new(SchemaType::Boolean))
        .with_property("title", Schema::new(SchemaType::String))
}

#[rstest]
fn create_form_submission() {
    let value = convert_urlencoded("title=Buy+milk", &BuildOptions::new(), &todo_schema())
        .expect("convert");
    assert_eq!(value, json!({"title": "Buy milk", "completed": false}));
}

#[rstest]
fn update_form_submission() {
    let value = convert_urlencoded(
        "key=4&title=Buy%20milk&completed=on",
        &BuildOptions::new(),
        &todo_schema(),
    )
    .expect("convert");
    assert_eq!(
        value,
        json!({"key": 4, "title": "Buy milk", "completed": true})
    );
}

#[rstest]
fn query_string_with_brackets_and_repeats() {
    let options = BuildOptions::new().with_duplicate_keys(["color"]);
    let value = build_from_urlencoded(
        "?color=red&color=blue&size.w=3&size.h=4&list%5B%5D=a&list[]=b",
        &options,
    )
    .expect("build");
    assert_eq!(
        value,
        json!({"color": ["red", "blue"], "size": {"w": "3", "h": "4"}, "list": ["a", "b"]})
    );
}

#[rstest]
fn non_numeric_brackets_end_the_path() {
    let value = build_from_urlencoded("size[w]=3", &BuildOptions::new()).expect("build");
    assert_eq!(value, json!({"size": "3"}));
}

#[rstest]
fn empty_input_builds_empty_tree() {
    assert_eq!(
        build_from_urlencoded("", &BuildOptions::new()).expect("build"),
        json!({})
    );
}
