use crmsync_model::{VALUE_SEPARATOR, decode_padded, encode_padded};

#[test]
fn encode_wraps_and_separates() {
    let encoded = encode_padded(["1", "2", "35"]);
    assert_eq!(encoded, "\u{1}1\u{1}2\u{1}35\u{1}");
}

#[test]
fn encode_single_value() {
    assert_eq!(encode_padded(["7"]), "\u{1}7\u{1}");
}

#[test]
fn encode_empty_list_is_bare_wrapper() {
    let encoded = encode_padded(Vec::<String>::new());
    assert_eq!(encoded, "\u{1}\u{1}");
}

#[test]
fn decode_drops_wrappers() {
    assert_eq!(decode_padded("\u{1}1\u{1}2\u{1}"), vec!["1", "2"]);
}

#[test]
fn decode_of_bare_wrapper_is_empty() {
    assert_eq!(decode_padded("\u{1}\u{1}"), Vec::<String>::new());
    assert_eq!(decode_padded(""), Vec::<String>::new());
}

#[test]
fn encode_decode_roundtrip() {
    let values = vec!["meeting".to_string(), "phone_call".to_string(), "12".to_string()];
    assert_eq!(decode_padded(&encode_padded(&values)), values);
}

#[test]
fn separator_is_the_control_character() {
    assert_eq!(VALUE_SEPARATOR, '\u{1}');
}
