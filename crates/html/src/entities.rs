use std::borrow::Cow;

use markup5ever::data::{C1_REPLACEMENTS, NAMED_ENTITIES};

/// Longest name in the WHATWG table, `CounterClockwiseContourIntegral;`.
const MAX_NAMED_LEN: usize = 32;

/// Decodes character references in text content (`&amp;`, `&eacute;`,
/// `&#39;`, `&#x1F600;`), including the legacy names that may omit the
/// trailing `;`.
///
/// Unknown names are left untouched; numeric references to invalid code
/// points decode to U+FFFD.
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    decode(input, false)
}

/// Like [`decode_entities`], for attribute values: a legacy name without `;`
/// followed by `=` or an alphanumeric stays literal, so query strings such as
/// `?a=1&copy=2` survive.
pub fn decode_attribute_entities(input: &str) -> Cow<'_, str> {
    decode(input, true)
}

fn decode(input: &str, in_attribute: bool) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let decoded = if tail.as_bytes().get(1) == Some(&b'#') {
            decode_numeric(tail)
        } else {
            decode_named(tail, in_attribute)
        };
        match decoded {
            Some((text, consumed)) => {
                out.push_str(&text);
                rest = &tail[consumed..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// `&#NNN;` / `&#xHHH;` at the start of `s`, `;` optional. Returns the text
/// and the number of bytes consumed.
fn decode_numeric(s: &str) -> Option<(String, usize)> {
    let bytes = s.as_bytes();
    let (radix, digits_start) = match bytes.get(2) {
        Some(b'x') | Some(b'X') => (16, 3),
        _ => (10, 2),
    };
    let digits_len = s[digits_start..]
        .bytes()
        .take_while(|b| match radix {
            16 => b.is_ascii_hexdigit(),
            _ => b.is_ascii_digit(),
        })
        .count();
    if digits_len == 0 {
        return None;
    }
    let digits = &s[digits_start..digits_start + digits_len];
    let mut consumed = digits_start + digits_len;
    if bytes.get(consumed) == Some(&b';') {
        consumed += 1;
    }

    let ch = match u32::from_str_radix(digits, radix) {
        Ok(cp @ 0x80..=0x9F) => C1_REPLACEMENTS[(cp - 0x80) as usize]
            .or_else(|| char::from_u32(cp))
            .unwrap_or('\u{FFFD}'),
        Ok(cp) if cp != 0 => char::from_u32(cp).unwrap_or('\u{FFFD}'),
        _ => '\u{FFFD}',
    };
    Some((ch.to_string(), consumed))
}

/// Longest named reference at the start of `s`. Only legacy names appear in
/// the table without a trailing `;`, so shorter prefixes can only match
/// those.
fn decode_named(s: &str, in_attribute: bool) -> Option<(String, usize)> {
    let name_len = s[1..]
        .bytes()
        .take(MAX_NAMED_LEN)
        .take_while(u8::is_ascii_alphanumeric)
        .count();
    if name_len == 0 {
        return None;
    }

    if s.as_bytes().get(1 + name_len) == Some(&b';') {
        if let Some(text) = lookup(&s[1..name_len + 2]) {
            return Some((text, name_len + 2));
        }
    }

    for len in (1..=name_len).rev() {
        let Some(text) = lookup(&s[1..1 + len]) else {
            continue;
        };
        let next = s.as_bytes().get(1 + len).copied();
        if in_attribute && next.is_some_and(|b| b == b'=' || b.is_ascii_alphanumeric()) {
            return None;
        }
        return Some((text, 1 + len));
    }
    None
}

/// The table also holds every prefix of every name, mapped to `(0, 0)`.
fn lookup(name: &str) -> Option<String> {
    let &(first, second) = NAMED_ENTITIES.get(name)?;
    if first == 0 {
        return None;
    }
    let mut text = String::new();
    text.push(char::from_u32(first)?);
    if second != 0 {
        text.push(char::from_u32(second)?);
    }
    Some(text)
}
