use binjson::{parse_str, to_string, ErrorKind};
use rstest::rstest;

fn string_member(input: &str) -> String {
    parse_str(input)
        .expect("parse")
        .get("s")
        .and_then(|value| value.as_str().map(str::to_string))
        .expect("member `s`")
}

#[rstest]
fn test_surrogate_pair_decodes_to_one_code_point() {
    let text = string_member(r#"{"s": "\ud83d\ude00"}"#);
    assert_eq!(text, "\u{1f600}");
    assert_eq!(text.chars().count(), 1);
}

#[rstest]
fn test_surrogate_pair_reencodes_to_same_escapes() {
    let value = parse_str(r#"{"s": "\ud83d\ude00"}"#).unwrap();
    assert_eq!(to_string(&value).unwrap(), r#"{"s":"\ud83d\ude00"}"#);
}

#[rstest]
fn test_raw_code_point_escapes_on_render() {
    let value = parse_str("{\"s\": \"\u{1f600}\"}").unwrap();
    assert_eq!(to_string(&value).unwrap(), r#"{"s":"\ud83d\ude00"}"#);
}

#[rstest]
fn test_bmp_escape_roundtrip() {
    let text = string_member(r#"{"s": "\u20ac"}"#);
    assert_eq!(text, "\u{20ac}");
}

#[rstest]
fn test_short_hex_run_stays_literal() {
    // Two hex digits followed by a non-hex character: the escape is not
    // consumed, the characters reprocess as plain text.
    assert_eq!(string_member(r#"{"s": "\u12"}"#), "u12");
    assert_eq!(string_member(r#"{"s": "\u12xy"}"#), "u12xy");
    assert_eq!(string_member(r#"{"s": "\uzz"}"#), "uzz");
}

#[rstest]
fn test_non_surrogate_escape_pair_stays_two_characters() {
    assert_eq!(string_member(r#"{"s": "AB"}"#), "AB");
}

#[rstest]
fn test_high_surrogate_with_invalid_low_range_fails() {
    let err = parse_str(r#"{"s": "\ud83d\u0041"}"#).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::MalformedLiteral(_)));
}

#[rstest]
fn test_high_surrogate_with_plain_follower_is_not_an_error() {
    let text = string_member(r#"{"s": "\ud83dAA"}"#);
    assert!(text.ends_with("AA"));
}

#[rstest]
fn test_high_surrogate_with_short_second_escape_fails() {
    let err = parse_str(r#"{"s": "\ud83d\u12x"}"#).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::MalformedLiteral(_)));
}

#[rstest]
fn test_lone_high_surrogate_does_not_eat_followers() {
    let text = string_member(r#"{"s": "\ud83dxy"}"#);
    assert!(text.ends_with("xy"));
}

#[rstest]
fn test_named_escapes_decode() {
    assert_eq!(
        string_member(r#"{"s": "\b\f\n\r\t\v\/\\\""}"#),
        "\u{8}\u{c}\n\r\t\u{b}/\\\""
    );
}

#[rstest]
fn test_control_characters_escape_on_render() {
    let input = format!("{{\"s\": \"{}\"}}", '\u{1}');
    let value = parse_str(&input).unwrap();
    assert_eq!(to_string(&value).unwrap(), r#"{"s":"\u0001"}"#);
}

#[rstest]
fn test_forward_slash_renders_unescaped() {
    let value = parse_str(r#"{"s": "a\/b"}"#).unwrap();
    assert_eq!(to_string(&value).unwrap(), r#"{"s":"a/b"}"#);
}

#[rstest]
fn test_unterminated_string_fails() {
    assert!(parse_str(r#"{"s": "abc"#).is_err());
}

#[rstest]
fn test_invalid_escape_character_fails() {
    let err = parse_str(r#"{"s": "\x41"}"#).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::MalformedLiteral(_)));
}
