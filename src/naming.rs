//! Conversion between source keys (`snake_case`) and API names (`camelCase`).

use once_cell::sync::Lazy;
use regex::Regex;

static WORD_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("static regex"));
static LOWER_UPPER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("static regex"));

/// `some_field_value` -> `someFieldValue`.
///
/// Words after the first are capitalized and the rest of each word is
/// lower-cased.
pub fn snake_to_camel(word: &str) -> String {
    let mut words = word.split('_');
    let mut out = words.next().unwrap_or_default().to_string();
    for w in words {
        let mut chars = w.chars();
        if let Some(first) = chars.next() {
            out.extend(first.to_uppercase());
            out.push_str(&chars.as_str().to_lowercase());
        }
    }
    out
}

/// `someFieldValue` -> `some_field_value`.
///
/// Inserts a word boundary before an uppercase letter that starts a
/// lowercase run, or follows a lowercase letter or digit, then lower-cases
/// the result (`HTTPServer` -> `http_server`).
pub fn camel_to_snake(name: &str) -> String {
    let spaced = WORD_START.replace_all(name, "${1}_${2}");
    LOWER_UPPER
        .replace_all(&spaced, "${1}_${2}")
        .to_lowercase()
}

/// Uppercase the first character, leaving the rest untouched.
pub fn first_upper(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_to_camel_basic() {
        assert_eq!(snake_to_camel("some_field_value"), "someFieldValue");
        assert_eq!(snake_to_camel("image"), "image");
        assert_eq!(snake_to_camel("$name"), "$name");
        assert_eq!(snake_to_camel("run_AS_root"), "runAsRoot");
    }

    #[test]
    fn camel_to_snake_basic() {
        assert_eq!(camel_to_snake("someFieldValue"), "some_field_value");
        assert_eq!(camel_to_snake("image"), "image");
        assert_eq!(camel_to_snake("HTTPServer"), "http_server");
        assert_eq!(camel_to_snake("getHTTPResponse"), "get_http_response");
        assert_eq!(camel_to_snake("version2Name"), "version2_name");
    }

    #[test]
    fn round_trip_for_lowercase_words() {
        for key in ["read_only", "additional_ports", "working_directory", "src"] {
            assert_eq!(camel_to_snake(&snake_to_camel(key)), key);
        }
    }

    #[test]
    fn first_upper_basic() {
        assert_eq!(first_upper("logging"), "Logging");
        assert_eq!(first_upper("additionalPorts"), "AdditionalPorts");
        assert_eq!(first_upper(""), "");
    }
}
