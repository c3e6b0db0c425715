use review_core::error::Error;
use review_core::list_literal::{encode_list, parse_items, parse_list};

fn assert_malformed(input: &str) {
    match parse_list(input) {
        Err(Error::MalformedList { .. }) => {}
        other => panic!("expected MalformedList for {input:?}, got {other:?}"),
    }
}

#[test]
fn parses_double_and_single_quoted_lists() {
    let items = parse_list(r#"["Is the budget justified?", "Does it cite prior work?"]"#).expect("parse");
    assert_eq!(items, vec!["Is the budget justified?", "Does it cite prior work?"]);

    let items = parse_list("  ['a', 'b',\n 'c']\n").expect("parse");
    assert_eq!(items, vec!["a", "b", "c"]);
}

#[test]
fn empty_list_and_trailing_comma() {
    assert!(parse_list("[]").expect("empty").is_empty());
    assert!(parse_list("[ \n ]").expect("blank").is_empty());
    assert_eq!(parse_list("['only',]").expect("trailing comma"), vec!["only"]);
}

#[test]
fn the_other_quote_character_is_plain_text() {
    let items = parse_list(r#"["Is it the applicant's plan?"]"#).expect("parse");
    assert_eq!(items, vec!["Is it the applicant's plan?"]);
    let items = parse_list(r"['C:\data\file']").expect("backslashes are literal");
    assert_eq!(items, vec![r"C:\data\file"]);
}

#[test]
fn round_trips_plain_ascii_items() {
    let originals: Vec<String> = vec![
        "Does the proposal define its objectives? (Page 1)".to_string(),
        "   leading and trailing spaces   ".to_string(),
        "symbols: [brackets], commas, and ; semicolons".to_string(),
        String::new(),
    ];
    let encoded = encode_list(&originals).expect("encode");
    assert_eq!(parse_list(&encoded).expect("decode"), originals);
}

#[test]
fn encoder_switches_quote_and_fails_when_none_is_free() {
    let encoded = encode_list(&[r#"say "hi""#]).expect("single quotes available");
    assert_eq!(encoded, r#"['say "hi"']"#);
    assert!(matches!(encode_list(&[r#"it's "both""#]), Err(Error::MalformedList { .. })));
}

#[test]
fn rejects_unbalanced_brackets() {
    assert_malformed("['a', 'b'");
    assert_malformed("'a', 'b']");
    assert_malformed("[['a']]");
    assert_malformed("['a']]");
}

#[test]
fn rejects_stray_quotes_instead_of_truncating() {
    assert_malformed("['it's broken', 'second']");
    assert_malformed("['a'', 'b']");
    assert_malformed("['unterminated]");
}

#[test]
fn rejects_wrapper_text_and_mixed_quotes() {
    assert_malformed("Here are your questions: ['a']");
    assert_malformed("['a'] Hope this helps!");
    assert_malformed("```\n['a']\n```");
    assert_malformed(r#"['a', "b"]"#);
    assert_malformed("[a, b]");
    assert_malformed("['a',, 'b']");
    assert_malformed("");
}

#[test]
fn error_offset_points_at_the_problem() {
    match parse_list("['ok' x]") {
        Err(Error::MalformedList { offset, .. }) => assert_eq!(offset, 6),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn placeholder_means_no_items() {
    assert!(parse_items(r#"["placeholder"]"#).expect("placeholder").is_empty());
    assert!(parse_items("[' Placeholder ']").expect("case and whitespace").is_empty());
    assert_eq!(parse_items("['placeholder', 'Real question?']").expect("mixed"), vec!["Real question?"]);
    // the pure decoder keeps it
    assert_eq!(parse_list(r#"["placeholder"]"#).expect("raw"), vec!["placeholder"]);
}
