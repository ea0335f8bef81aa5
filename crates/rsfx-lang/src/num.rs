//! Locale-independent numeric scanning shared by the grammars.
//!
//! The script dialect always uses `.` as the decimal separator, and its
//! grammars lean on `strtod`-style prefix parsing: read as much of a number
//! as possible, report how many bytes were consumed, and never fail hard.

/// Parse a leading number from `s`, `strtod`-style.
///
/// Skips leading ASCII whitespace, then an optional sign, digits, a dot and
/// an exponent. Returns the value and the number of bytes consumed
/// (including the skipped whitespace). A consumed count of zero means no
/// conversion was possible; the value is then `0.0`.
pub(crate) fn parse_number_prefix(s: &str) -> (f64, usize) {
    let b = s.as_bytes();
    let mut pos = 0;

    while pos < b.len() && b[pos].is_ascii_whitespace() {
        pos += 1;
    }

    let num_start = pos;
    if pos < b.len() && (b[pos] == b'+' || b[pos] == b'-') {
        pos += 1;
    }

    let mut digits = 0;
    while pos < b.len() && b[pos].is_ascii_digit() {
        pos += 1;
        digits += 1;
    }
    if pos < b.len() && b[pos] == b'.' {
        pos += 1;
        while pos < b.len() && b[pos].is_ascii_digit() {
            pos += 1;
            digits += 1;
        }
    }
    if digits == 0 {
        return (0.0, 0);
    }

    // Optional exponent; only consumed when well-formed.
    if pos < b.len() && (b[pos] == b'e' || b[pos] == b'E') {
        let mut exp_end = pos + 1;
        if exp_end < b.len() && (b[exp_end] == b'+' || b[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < b.len() && b[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            pos = exp_end;
        }
    }

    match s[num_start..pos].parse::<f64>() {
        Ok(v) => (v, pos),
        Err(_) => (0.0, 0),
    }
}

/// Parse a leading number and truncate it to an integer, `atof`-then-cast.
pub(crate) fn parse_int_prefix(s: &str) -> i64 {
    let (v, n) = parse_number_prefix(s);
    if n == 0 { 0 } else { v as i64 }
}

/// Remove ASCII whitespace immediately surrounding `=` characters, so that
/// `name = value` tokenizes like `name=value`.
pub(crate) fn trim_spaces_around_equals(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(c) = rest.chars().next() {
        if c.is_ascii_whitespace() {
            let trimmed = rest.trim_start_matches(|c: char| c.is_ascii_whitespace());
            if trimmed.starts_with('=') || out.ends_with('=') {
                rest = trimmed;
                continue;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}
