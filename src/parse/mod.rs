//! String → value parsers and fixed-width writers.

pub mod complex;
pub mod float;
pub mod int;
pub mod string;

pub(crate) fn is_unicode_space(c: u32) -> bool {
    match char::from_u32(c) {
        Some(ch) => ch.is_whitespace(),
        None => false,
    }
}
