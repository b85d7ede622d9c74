//! Prompt text repair.
//!
//! Text pasted into a prompt often carries encoding damage: UTF-8 that was
//! decoded as Windows-1252 somewhere along the way ("cafÃ©"), HTML entities,
//! terminal color codes, typographic ligatures. [`fix_text`] undoes these
//! before the prompt is tokenized, so token counts and context truncation see
//! the repaired text.

use unicode_normalization::UnicodeNormalization;

/// Upper bound on stacked mojibake layers undone by [`fix_encoding`].
const MAX_ENCODING_PASSES: usize = 4;

/// Windows-1252 decoding of bytes 0x80..=0x9F. The five bytes Windows-1252
/// leaves undefined map to the matching C1 control, as Latin-1 would.
const CP1252_HIGH: [char; 32] = [
    '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}', '\u{017D}', '\u{008F}',
    '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

/// Apply every repair step, in order.
pub fn fix_text(text: &str) -> String {
    let mut fixed = if text.contains('<') || text.contains('>') {
        text.to_string()
    } else {
        unescape_html(text)
    };
    fixed = remove_terminal_escapes(&fixed);
    fixed = fix_encoding(&fixed);
    fixed = fix_c1_controls(&fixed);
    fixed = fix_latin_ligatures(&fixed);
    fixed = fix_character_width(&fixed);
    fixed = uncurl_quotes(&fixed);
    fixed = fix_line_breaks(&fixed);
    fixed = remove_control_chars(&fixed);
    fixed.nfc().collect()
}

/// Undo UTF-8 that was mis-decoded as Windows-1252 or Latin-1, repeatedly.
pub fn fix_encoding(text: &str) -> String {
    let mut current = text.to_string();
    for _ in 0..MAX_ENCODING_PASSES {
        let fixed = undo_mojibake(&current);
        if fixed == current {
            break;
        }
        current = fixed;
    }
    current
}

/// Re-encode each run of Windows-1252-representable characters and decode it
/// as UTF-8. Byte sequences that are not valid UTF-8 keep their original
/// characters, so correctly decoded accented text passes through.
fn undo_mojibake(text: &str) -> String {
    if text.is_ascii() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut run = Vec::new();
    let mut run_chars = Vec::new();
    for c in text.chars() {
        match encode_cp1252(c) {
            Some(byte) => {
                run.push(byte);
                run_chars.push(c);
            }
            None => {
                decode_run(&run, &run_chars, &mut out);
                run.clear();
                run_chars.clear();
                out.push(c);
            }
        }
    }
    decode_run(&run, &run_chars, &mut out);
    out
}

/// `bytes[i]` is the encoding of `chars[i]`.
fn decode_run(bytes: &[u8], chars: &[char], out: &mut String) {
    let mut pos = 0;
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
        pos += chunk.valid().len();
        let end = pos + chunk.invalid().len();
        out.extend(&chars[pos..end]);
        pos = end;
    }
}

fn encode_cp1252(c: char) -> Option<u8> {
    let code = c as u32;
    if code < 0x80 || (0xA0..=0xFF).contains(&code) {
        return Some(code as u8);
    }
    CP1252_HIGH
        .iter()
        .position(|&m| m == c)
        .map(|i| 0x80 + i as u8)
}

/// Replace C1 control characters with their Windows-1252 meaning.
pub fn fix_c1_controls(text: &str) -> String {
    text.chars()
        .map(|c| match c as u32 {
            code @ 0x80..=0x9F => CP1252_HIGH[(code - 0x80) as usize],
            _ => c,
        })
        .collect()
}

/// Decode named and numeric HTML character references.
pub fn unescape_html(text: &str) -> String {
    html_escape::decode_html_entities(text).into_owned()
}

/// Strip ANSI color/cursor sequences such as `ESC[31m`.
pub fn remove_terminal_escapes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c == '\u{1B}' {
            if let Some(len) = escape_len(&text[i..]) {
                while chars.peek().is_some_and(|&(j, _)| j < i + len) {
                    chars.next();
                }
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Byte length of a `ESC [ (digit|;)* letter` sequence at the start of `s`.
fn escape_len(s: &str) -> Option<usize> {
    let body = s.strip_prefix("\u{1B}[")?;
    let params = body
        .bytes()
        .take_while(|b| b.is_ascii_digit() || *b == b';')
        .count();
    body.as_bytes()
        .get(params)
        .filter(|b| b.is_ascii_alphabetic())
        .map(|_| 2 + params + 1)
}

/// Expand typographic ligatures into their letters.
pub fn fix_latin_ligatures(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{FB00}' => out.push_str("ff"),
            '\u{FB01}' => out.push_str("fi"),
            '\u{FB02}' => out.push_str("fl"),
            '\u{FB03}' => out.push_str("ffi"),
            '\u{FB04}' => out.push_str("ffl"),
            '\u{FB05}' => out.push_str("\u{17F}t"),
            '\u{FB06}' => out.push_str("st"),
            '\u{0132}' => out.push_str("IJ"),
            '\u{0133}' => out.push_str("ij"),
            '\u{01C7}' => out.push_str("LJ"),
            '\u{01C8}' => out.push_str("Lj"),
            '\u{01C9}' => out.push_str("lj"),
            '\u{01CA}' => out.push_str("NJ"),
            '\u{01CB}' => out.push_str("Nj"),
            '\u{01CC}' => out.push_str("nj"),
            '\u{01F1}' => out.push_str("DZ"),
            '\u{01F2}' => out.push_str("Dz"),
            '\u{01F3}' => out.push_str("dz"),
            _ => out.push(c),
        }
    }
    out
}

/// Map full-width ASCII variants and the ideographic space to plain ASCII.
pub fn fix_character_width(text: &str) -> String {
    text.chars()
        .map(|c| match c as u32 {
            0x3000 => ' ',
            code @ 0xFF01..=0xFF5E => char::from_u32(code - 0xFEE0).unwrap_or(c),
            _ => c,
        })
        .collect()
}

/// Replace curly single and double quotes with straight ones.
pub fn uncurl_quotes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' => '\'',
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' => '"',
            _ => c,
        })
        .collect()
}

/// Normalize CRLF, CR and Unicode line/paragraph separators to `\n`.
pub fn fix_line_breaks(text: &str) -> String {
    text.replace("\r\n", "\n")
        .chars()
        .map(|c| match c {
            '\r' | '\u{2028}' | '\u{2029}' | '\u{85}' => '\n',
            _ => c,
        })
        .collect()
}

/// Drop control characters other than tab, newline and form feed, plus
/// byte-order marks and deprecated format characters.
pub fn remove_control_chars(text: &str) -> String {
    text.chars()
        .filter(|&c| {
            !matches!(c,
                '\u{0}'..='\u{8}'
                | '\u{B}'
                | '\u{E}'..='\u{1F}'
                | '\u{7F}'
                | '\u{206A}'..='\u{206F}'
                | '\u{FEFF}'
                | '\u{FFF9}'..='\u{FFFC}')
        })
        .collect()
}
