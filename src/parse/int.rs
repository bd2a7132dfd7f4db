//! Overflow-safe integer parsing.
//!
//! Uses the standard pre-max-test overflow algorithm (reject as soon as
//! `number > max/10`, or `number == max/10` and the next digit would carry
//! past `max`), operating on code-point slices and returning `Option`
//! rather than an out-parameter plus a status flag.

use super::is_unicode_space;

/// Parse a signed integer token in `[min, max]`.
///
/// Skips leading/trailing Unicode whitespace, accepts an optional `+`/`-`
/// sign, requires at least one decimal digit, and rejects the token unless
/// the cursor reaches the end of `text` after trailing whitespace — i.e. the
/// whole token must be consumed, not just a prefix of it.
pub fn parse_int(text: &[u32], min: i64, max: i64) -> Option<i64> {
    let mut p = 0usize;
    let len = text.len();

    while p < len && is_unicode_space(text[p]) {
        p += 1;
    }

    let mut isneg = false;
    if p < len && text[p] == '-' as u32 {
        isneg = true;
        p += 1;
    } else if p < len && text[p] == '+' as u32 {
        p += 1;
    }

    if p >= len || !is_ascii_digit(text[p]) {
        return None;
    }

    let mut number: i64 = 0;
    if isneg {
        let dig_pre_min = -(min % 10);
        let pre_min = min / 10;
        while p < len && is_ascii_digit(text[p]) {
            let d = (text[p] - '0' as u32) as i64;
            if number > pre_min || (number == pre_min && d <= dig_pre_min) {
                number = number * 10 - d;
                p += 1;
            } else {
                return None;
            }
        }
    } else {
        let pre_max = max / 10;
        let dig_pre_max = max % 10;
        while p < len && is_ascii_digit(text[p]) {
            let d = (text[p] - '0' as u32) as i64;
            if number < pre_max || (number == pre_max && d <= dig_pre_max) {
                number = number * 10 + d;
                p += 1;
            } else {
                return None;
            }
        }
    }

    while p < len && is_unicode_space(text[p]) {
        p += 1;
    }

    if p != len {
        return None;
    }

    Some(number)
}

/// Parse an unsigned integer token in `[0, max]`. A leading `-` is always rejected.
pub fn parse_uint(text: &[u32], max: u64) -> Option<u64> {
    let mut p = 0usize;
    let len = text.len();

    while p < len && is_unicode_space(text[p]) {
        p += 1;
    }

    if p < len && text[p] == '-' as u32 {
        return None;
    }
    if p < len && text[p] == '+' as u32 {
        p += 1;
    }

    if p >= len || !is_ascii_digit(text[p]) {
        return None;
    }

    let pre_max = max / 10;
    let dig_pre_max = max % 10;
    let mut number: u64 = 0;
    while p < len && is_ascii_digit(text[p]) {
        let d = (text[p] - '0' as u32) as u64;
        if number < pre_max || (number == pre_max && d <= dig_pre_max) {
            number = number * 10 + d;
            p += 1;
        } else {
            return None;
        }
    }

    while p < len && is_unicode_space(text[p]) {
        p += 1;
    }

    if p != len {
        return None;
    }

    Some(number)
}

/// Boolean parse: parse as `int64` and reduce to `value != 0`.
pub fn parse_bool(text: &[u32]) -> Option<bool> {
    parse_int(text, i64::MIN, i64::MAX).map(|v| v != 0)
}

/// Signed integer parse with the `allow_float_for_int` fallback: a token
/// that is not a plain integer but does parse as a float is truncated
/// toward zero and accepted if the truncated value fits in `[min, max]`.
pub fn parse_int_with_fallback(text: &[u32], min: i64, max: i64, allow_float_for_int: bool) -> Option<i64> {
    if let Some(v) = parse_int(text, min, max) {
        return Some(v);
    }
    if !allow_float_for_int {
        return None;
    }
    let f = super::float::parse_float(text)?;
    if !f.is_finite() {
        return None;
    }
    let truncated = f.trunc();
    if truncated < min as f64 || truncated > max as f64 {
        return None;
    }
    Some(truncated as i64)
}

/// Unsigned counterpart of [`parse_int_with_fallback`].
pub fn parse_uint_with_fallback(text: &[u32], max: u64, allow_float_for_int: bool) -> Option<u64> {
    if let Some(v) = parse_uint(text, max) {
        return Some(v);
    }
    if !allow_float_for_int {
        return None;
    }
    let f = super::float::parse_float(text)?;
    if !f.is_finite() || f < 0.0 {
        return None;
    }
    let truncated = f.trunc();
    if truncated > max as f64 {
        return None;
    }
    Some(truncated as u64)
}

fn is_ascii_digit(c: u32) -> bool {
    (b'0' as u32..=b'9' as u32).contains(&c)
}
