//! Lexical helpers shared by the evaluator and the inference engine
//!
//! Both sides must agree on what counts as an identifier, a number or a
//! quoted literal: a reference answer classified as a number has to pass
//! the number rule it was inferred into.

/// Check for a bare identifier: a letter or underscore followed by
/// letters, digits or underscores.
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse a numeric literal.
///
/// Accepts optionally signed decimal and exponent forms plus `0x`/`0b`
/// integer literals. Words such as `inf` or `NaN` are rejected, as is
/// anything that does not parse to a finite value.
pub fn parse_number(text: &str) -> Option<f64> {
    let s = text.trim();
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    if body.is_empty() {
        return None;
    }

    let prefixed = body
        .strip_prefix("0x")
        .or_else(|| body.strip_prefix("0X"))
        .map(|digits| (digits, 16))
        .or_else(|| {
            body.strip_prefix("0b")
                .or_else(|| body.strip_prefix("0B"))
                .map(|digits| (digits, 2))
        });

    let magnitude = match prefixed {
        Some((digits, radix)) => {
            if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
                return None;
            }
            u64::from_str_radix(digits, radix).ok()? as f64
        }
        None => {
            if !body.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
                return None;
            }
            if !body
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
            {
                return None;
            }
            body.parse::<f64>().ok()?
        }
    };

    if !magnitude.is_finite() {
        return None;
    }
    Some(if negative { -magnitude } else { magnitude })
}

/// Check whether the whole (trimmed) text is one quoted literal, such as
/// `"Studying"` or `'x'`, with nothing before or after the quotes.
pub fn is_quoted_literal(text: &str) -> bool {
    let s = text.trim();
    let mut chars = s.char_indices();
    let quote = match chars.next() {
        Some((_, q @ ('"' | '\'' | '`'))) => q,
        _ => return false,
    };

    let mut escaped = false;
    for (i, c) in chars {
        if escaped {
            escaped = false;
            continue;
        }
        if c == '\\' {
            escaped = true;
        } else if c == quote {
            return i + c.len_utf8() == s.len();
        }
    }
    false
}

/// Split source text into comparison tokens.
///
/// Words (letters, digits, underscores) and quoted literals are single
/// tokens; every other non-whitespace character is its own token.
/// Whitespace is dropped, except inside quotes.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
        } else if matches!(c, '"' | '\'' | '`') {
            chars.next();
            let mut end = text.len();
            let mut escaped = false;
            for (i, ch) in chars.by_ref() {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == c {
                    end = i + ch.len_utf8();
                    break;
                }
            }
            tokens.push(text[start..end].to_string());
        } else if c.is_alphanumeric() || c == '_' {
            let mut end = start;
            while let Some(&(i, ch)) = chars.peek() {
                if ch.is_alphanumeric() || ch == '_' {
                    end = i + ch.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(text[start..end].to_string());
        } else {
            chars.next();
            tokens.push(c.to_string());
        }
    }

    tokens
}

/// Compare two code fragments, ignoring whitespace between tokens.
pub fn expressions_equivalent(submitted: &str, canonical: &str) -> bool {
    submitted.trim() == canonical.trim() || tokenize(submitted) == tokenize(canonical)
}
