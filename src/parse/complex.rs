//! Complex number grammar: optionally parenthesized, with a pure-imaginary
//! shortcut and a signed-imaginary-part form.

use super::float::parse_float_no_trailing_skip;
use super::is_unicode_space;

/// Parse `(real, imag)` from a complex-number token: optionally parenthesized,
/// with a pure-imaginary shortcut and a signed-imaginary-part form.
pub fn parse_complex(text: &[u32], imaginary_unit: u32) -> Option<(f64, f64)> {
    let len = text.len();
    let mut p = 0usize;

    while p < len && is_unicode_space(text[p]) {
        p += 1;
    }

    let has_paren = p < len && text[p] == '(' as u32;
    if has_paren {
        p += 1;
    }

    let (real0, consumed) = parse_float_no_trailing_skip(&text[p..])?;
    p += consumed;

    let (real, imag);
    if p < len && text[p] == imaginary_unit {
        // Pure imaginary: "1j" => imag = 1, real = 0.
        p += 1;
        real = 0.0;
        imag = real0;
    } else if p < len && (text[p] == '+' as u32 || text[p] == '-' as u32) {
        let (imag_part, consumed2) = parse_float_no_trailing_skip(&text[p..])?;
        p += consumed2;
        if p >= len || text[p] != imaginary_unit {
            return None;
        }
        p += 1;
        real = real0;
        imag = imag_part;
    } else {
        // Real-only complex, e.g. "3" or "(3)".
        real = real0;
        imag = 0.0;
    }

    if has_paren {
        if p >= len || text[p] != ')' as u32 {
            return None;
        }
        p += 1;
    }

    while p < len && is_unicode_space(text[p]) {
        p += 1;
    }

    if p != len {
        return None;
    }

    Some((real, imag))
}
