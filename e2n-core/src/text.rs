use unicode_normalization::UnicodeNormalization;

/// Sanitize a text field read from any source.
///
/// Drops NUL and every control character below U+0020 except TAB, applies
/// Unicode NFC composition, and trims surrounding whitespace. Applied
/// uniformly so the same channel name compares equal across formats.
pub fn clean_text(value: &str) -> String {
    let filtered: String = value
        .chars()
        .filter(|&c| c == '\t' || (c as u32) >= 0x20)
        .collect();
    filtered.nfc().collect::<String>().trim().to_string()
}

/// Like [`clean_text`] but returns `None` for blank results.
pub fn clean_opt(value: Option<&str>) -> Option<String> {
    value.map(clean_text).filter(|v| !v.is_empty())
}

/// Lowercase ASCII slug: runs of anything outside `[a-z0-9]` collapse into
/// `sep`, which is also stripped from both ends. May return an empty string.
pub fn slugify(value: &str, sep: char) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_sep = false;
    for c in value.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_sep && !out.is_empty() {
                out.push(sep);
            }
            pending_sep = false;
            out.push(c);
        } else {
            pending_sep = true;
        }
    }
    out
}

/// Transliterate German umlauts and sharp s before slugging.
pub fn fold_umlauts(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            'ä' => out.push_str("ae"),
            'ö' => out.push_str("oe"),
            'ü' => out.push_str("ue"),
            'Ä' => out.push_str("Ae"),
            'Ö' => out.push_str("Oe"),
            'Ü' => out.push_str("Ue"),
            'ß' => out.push_str("ss"),
            _ => out.push(c),
        }
    }
    out
}
