//! Padded-list encoding for multi-value string columns.
//!
//! The host store packs multi-value fields (e.g. the entity-column-value
//! list of a custom group) into a single string column, wrapping and
//! separating the values with a control character.

/// Separator character used by the host store.
pub const VALUE_SEPARATOR: char = '\u{1}';

/// Encodes a list of values into the padded single-string form.
///
/// The result is wrapped on both sides: `␁a␁b␁` for `["a", "b"]`. An empty
/// list encodes to the bare wrapper `␁␁`.
pub fn encode_padded<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    out.push(VALUE_SEPARATOR);
    for value in values {
        out.push_str(value.as_ref());
        out.push(VALUE_SEPARATOR);
    }
    if out.len() == VALUE_SEPARATOR.len_utf8() {
        out.push(VALUE_SEPARATOR);
    }
    out
}

/// Decodes a padded string back into its values, dropping the wrappers.
#[must_use]
pub fn decode_padded(encoded: &str) -> Vec<String> {
    encoded
        .split(VALUE_SEPARATOR)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}
