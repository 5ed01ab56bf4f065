use binjson::{parse_str, to_string, Value};
use rstest::rstest;

/// Documents parsed here must agree with the serde_json data model once
/// both sides are mapped onto the same tree shape.
#[rstest]
#[case(r#"{"a": 1, "b": -2, "c": "three", "d": null, "e": true}"#)]
#[case(r#"{"nested": {"x": [1, 2, {"y": false}]}}"#)]
#[case(r#"[1, "two", 3.5, null]"#)]
#[case(r#"{"unicode": "héllo wörld"}"#)]
#[case(r#"{"wide": 4294967296, "negwide": -2147483649}"#)]
fn test_tree_matches_serde_json(#[case] input: &str) {
    let ours = parse_str(input).expect("binjson parse");
    let theirs: serde_json::Value = serde_json::from_str(input).expect("serde_json parse");
    assert_eq!(ours, Value::from(theirs));
}

#[rstest]
#[case(r#"{"a":1,"b":[true,null],"c":"x"}"#)]
#[case(r#"[[],{},[{}]]"#)]
fn test_compact_render_is_valid_json(#[case] input: &str) {
    let tree = parse_str(input).unwrap();
    let rendered = to_string(&tree).unwrap();
    let reparsed: serde_json::Value = serde_json::from_str(&rendered).expect("valid JSON output");
    assert_eq!(Value::from(reparsed), tree);
}

#[rstest]
fn test_pretty_render_is_valid_json() {
    let tree = parse_str(r#"{"a":[{"b":1},{}],"c":[]}"#).unwrap();
    let rendered = binjson::to_string_pretty(&tree).unwrap();
    let reparsed: serde_json::Value = serde_json::from_str(&rendered).expect("valid JSON output");
    assert_eq!(Value::from(reparsed), tree);
}

#[rstest]
fn test_serde_value_roundtrip() {
    let tree = parse_str(r#"{"a": [1, -2], "s": "x"}"#).unwrap();
    let json = serde_json::to_string(&tree).unwrap();
    let back: Value = serde_json::from_str(&json).unwrap();
    assert_eq!(back, tree);
}

#[rstest]
fn test_serialize_struct_through_value() {
    #[derive(serde::Serialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    let json = serde_json::to_value(Point { x: 1, y: -2 }).unwrap();
    let tree = Value::from(json);
    assert_eq!(to_string(&tree).unwrap(), r#"{"x":1,"y":-2}"#);
}

#[rstest]
fn test_sorted_members_against_serde_json_input_order() {
    // Input order differs from key order; our tree must not care.
    let ours = parse_str(r#"{"z": 1, "a": 2}"#).unwrap();
    assert_eq!(to_string(&ours).unwrap(), r#"{"a":2,"z":1}"#);
}
