//! Masking and de-masking of record names.

use crate::error::{NameError, NameResult};

/// Separates a base name from its number. Not expected inside base names.
pub const TAG_SEPARATOR: char = '!';

/// A name split into its base and optional number.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct NameHint {
    pub base: String,
    pub number: Option<u64>,
}

impl NameHint {
    /// A hint with no number.
    pub fn plain(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            number: None,
        }
    }

    /// A hint that starts probing at `number`.
    pub fn numbered(base: impl Into<String>, number: u64) -> Self {
        Self {
            base: base.into(),
            number: Some(number),
        }
    }
}

/// Split `name` on its last separator.
///
/// If the text after the separator is not an unsigned integer, the whole
/// string is the base name and there is no number. A separator in the first
/// position never splits.
///
/// ```
/// use procstore_names::{parse_name, NameHint};
///
/// assert_eq!(parse_name("seven!2").unwrap(), NameHint::numbered("seven", 2));
/// assert_eq!(parse_name("seven!x").unwrap(), NameHint::plain("seven!x"));
/// assert_eq!(parse_name("seven").unwrap(), NameHint::plain("seven"));
/// ```
pub fn parse_name(name: &str) -> NameResult<NameHint> {
    if name.is_empty() {
        return Err(NameError::Empty);
    }

    match name.rfind(TAG_SEPARATOR) {
        Some(k) if k > 0 => {
            let suffix = &name[k + TAG_SEPARATOR.len_utf8()..];
            match parse_number(suffix) {
                Some(number) => Ok(NameHint::numbered(&name[..k], number)),
                None => Ok(NameHint::plain(name)),
            }
        }
        _ => Ok(NameHint::plain(name)),
    }
}

fn parse_number(text: &str) -> Option<u64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Append `{separator}{number}` to a base name.
pub fn mask(base: &str, number: u64) -> String {
    format!("{base}{TAG_SEPARATOR}{number}")
}
