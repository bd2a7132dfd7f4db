//! User-supplied per-column conversion callbacks.
//!
//! A small trait-object abstraction standing in for an embedding host's
//! user-callback mechanism: invoke the callback on the raw field text, then
//! coerce whatever it returns into the destination cell.

use crate::error::ConverterError;
use crate::schema::GenericValue;

/// A per-column conversion callback: takes the raw field text (already
/// quote-stripped by the tokenizer) and returns the value to coerce into
/// the output cell, or, for a `Generic` column, the value itself.
pub struct Converter(Box<dyn Fn(&[u32]) -> Result<GenericValue, ConverterError>>);

impl Converter {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[u32]) -> Result<GenericValue, ConverterError> + 'static,
    {
        Converter(Box::new(f))
    }

    /// Identity adapter: the field text becomes a `GenericValue::Text`.
    pub fn identity_text() -> Self {
        Converter::new(|text| {
            Ok(GenericValue::Text(text.iter().filter_map(|&c| char::from_u32(c)).collect()))
        })
    }

    /// Single-byte adapter (`python_byte_converters`/`c_byte_converters`
    /// mode): the field text becomes a `GenericValue::Bytes`, one byte per
    /// code point. Fails if any code point doesn't fit in a byte.
    pub fn identity_bytes() -> Self {
        Converter::new(|text| {
            let mut bytes = Vec::with_capacity(text.len());
            for &cp in text {
                if cp > 255 {
                    return Err(format!("code point {cp} does not fit in a byte").into());
                }
                bytes.push(cp as u8);
            }
            Ok(GenericValue::Bytes(bytes))
        })
    }

    pub(crate) fn invoke(&self, text: &[u32]) -> Result<GenericValue, ConverterError> {
        (self.0)(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cp(s: &str) -> Vec<u32> {
        s.chars().map(|c| c as u32).collect()
    }

    #[test]
    fn identity_text_round_trips() {
        let conv = Converter::identity_text();
        assert_eq!(conv.invoke(&cp("hello")).unwrap(), GenericValue::Text("hello".to_string()));
    }

    #[test]
    fn identity_bytes_round_trips() {
        let conv = Converter::identity_bytes();
        assert_eq!(conv.invoke(&cp("abc")).unwrap(), GenericValue::Bytes(vec![b'a', b'b', b'c']));
    }

    #[test]
    fn identity_bytes_rejects_high_codepoint() {
        let conv = Converter::identity_bytes();
        assert!(conv.invoke(&cp("a\u{0100}")).is_err());
    }

    #[test]
    fn custom_converter_can_fail() {
        let conv = Converter::new(|_text| Err("boom".into()));
        assert!(conv.invoke(&cp("x")).is_err());
    }
}
