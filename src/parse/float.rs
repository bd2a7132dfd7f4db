//! IEEE double parsing.
//!
//! Strip leading whitespace, require the token to be pure ASCII (reject as
//! soon as any code point is ≥ 128), hand the ASCII slice to a conformant
//! strtod-equivalent (`str::parse::<f64>`, which is itself a correctly
//! rounded parser), then require the rest of the token (after optional
//! trailing whitespace) to be fully consumed.

/// Parse an IEEE double from a code-point token. Returns `None` on any
/// rejection: empty token, non-ASCII code point, or a strtod-equivalent
/// parse that doesn't consume the whole (whitespace-trimmed) token.
pub fn parse_float(text: &[u32]) -> Option<f64> {
    let ascii = to_ascii_str(text)?;
    if ascii.is_empty() {
        return None;
    }

    let trimmed_start = ascii.trim_start();
    if trimmed_start.is_empty() {
        return None;
    }
    let token = trimmed_start.trim_end();
    if token.is_empty() {
        return None;
    }

    parse_strtod_equivalent(token)
}

/// Same as [`parse_float`] but does not skip trailing whitespace, used by the
/// complex-number grammar's real/imaginary-part parse, which needs to see
/// what immediately follows the numeric token.
pub fn parse_float_no_trailing_skip(text: &[u32]) -> Option<(f64, usize)> {
    let ascii = to_ascii_str(text)?;
    let leading = ascii.len() - ascii.trim_start().len();
    let trimmed = &ascii[leading..];

    let token_len = float_token_len(trimmed)?;
    let token = &trimmed[..token_len];
    let value = parse_strtod_equivalent(token)?;
    Some((value, leading + token_len))
}

/// Strict ASCII conversion: any code point ≥ 128 fails the whole token, per
/// "the float parser is strict ASCII; non-ASCII in the token is not a number".
fn to_ascii_str(text: &[u32]) -> Option<String> {
    let mut s = String::with_capacity(text.len());
    for &cp in text {
        if cp >= 128 {
            return None;
        }
        s.push(cp as u8 as char);
    }
    Some(s)
}

fn parse_strtod_equivalent(token: &str) -> Option<f64> {
    // Rust's float parser accepts "inf"/"infinity"/"nan" case-insensitively
    // and signed variants, matching strtod's extended grammar closely enough
    // for this crate's purposes.
    token.parse::<f64>().ok()
}

/// Length of the longest float-looking prefix of `s`, used when the caller
/// (the complex-number grammar) needs to know where the float token ends so
/// it can inspect what follows without having consumed trailing whitespace.
fn float_token_len(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0usize;
    if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
        i += 1;
    }
    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut saw_digit = i > digits_start;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        saw_digit |= i > frac_start;
    }
    if !saw_digit {
        // Could still be inf/infinity/nan.
        return non_numeric_token_len(s);
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }
    if i == 0 {
        None
    } else {
        Some(i)
    }
}

fn non_numeric_token_len(s: &str) -> Option<usize> {
    for word in ["infinity", "inf", "nan"] {
        if s.len() >= word.len() && s[..word.len()].eq_ignore_ascii_case(word) {
            return Some(word.len());
        }
        let signed = format!("+{word}");
        if s.len() >= signed.len() && s[..signed.len()].eq_ignore_ascii_case(&signed) {
            return Some(signed.len());
        }
    }
    if let Some(rest) = s.strip_prefix('-') {
        for word in ["infinity", "inf", "nan"] {
            if rest.len() >= word.len() && rest[..word.len()].eq_ignore_ascii_case(word) {
                return Some(1 + word.len());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cp(s: &str) -> Vec<u32> {
        s.chars().map(|c| c as u32).collect()
    }

    #[test]
    fn parses_plain_float() {
        assert_eq!(parse_float(&cp("12.3")), Some(12.3));
    }

    #[test]
    fn parses_with_surrounding_whitespace() {
        assert_eq!(parse_float(&cp("  12.3  ")), Some(12.3));
    }

    #[test]
    fn parses_scientific_notation() {
        assert_eq!(parse_float(&cp("1e1")), Some(10.0));
    }

    #[test]
    fn rejects_non_ascii() {
        assert_eq!(parse_float(&cp("12\u{00e9}")), None);
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert_eq!(parse_float(&cp("12.3x")), None);
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(parse_float(&cp("")), None);
        assert_eq!(parse_float(&cp("   ")), None);
    }

    #[test]
    fn no_trailing_skip_stops_at_token_end() {
        let (value, len) = parse_float_no_trailing_skip(&cp("1.5+2j")).unwrap();
        assert_eq!(value, 1.5);
        assert_eq!(len, 3);
    }
}
