use std::path::Path;

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Longest sanitized filename, in bytes.
pub const MAX_FILENAME_BYTES: usize = 255;

/// Fallback used when nothing usable survives sanitization.
pub const UNNAMED_FILE: &str = "unnamed_file";

/// Turn an arbitrary client-supplied filename into one safe for object keys.
///
/// Keeps word characters, whitespace, `-`, `_` and `.`; whitespace runs become
/// `_` and runs of `.`, `_`, `-` collapse to their first character. The result
/// is capped at [`MAX_FILENAME_BYTES`], cutting the stem so the extension
/// survives.
pub fn secure_filename(filename: &str) -> String {
    let kept: String = filename
        .nfkd()
        .filter(|&c| !is_combining_mark(c))
        .filter(|&c| c.is_alphanumeric() || c.is_whitespace() || matches!(c, '-' | '_' | '.'))
        .collect();

    let mut out = String::with_capacity(kept.len());
    let mut in_space = false;
    let mut prev_sep: Option<char> = None;
    for c in kept.chars() {
        if c.is_whitespace() {
            in_space = true;
            continue;
        }
        if in_space {
            in_space = false;
            push_collapsed(&mut out, &mut prev_sep, '_');
        }
        push_collapsed(&mut out, &mut prev_sep, c);
    }
    if in_space {
        push_collapsed(&mut out, &mut prev_sep, '_');
    }

    if out.is_empty() || out == "." {
        return UNNAMED_FILE.to_string();
    }

    truncate_keep_extension(out)
}

fn push_collapsed(out: &mut String, prev_sep: &mut Option<char>, c: char) {
    let is_sep = matches!(c, '.' | '_' | '-');
    if is_sep && prev_sep.is_some() {
        return;
    }
    *prev_sep = is_sep.then_some(c);
    out.push(c);
}

fn truncate_keep_extension(name: String) -> String {
    if name.len() <= MAX_FILENAME_BYTES {
        return name;
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if ext.len() < MAX_FILENAME_BYTES => {
            let stem = truncate_bytes(stem, MAX_FILENAME_BYTES - ext.len() - 1);
            format!("{stem}.{ext}")
        }
        _ => truncate_bytes(&name, MAX_FILENAME_BYTES).to_string(),
    }
}

/// Longest prefix of `s` within `max` bytes that ends on a char boundary.
fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Filename without its final extension (`"a.b.png"` gives `"a.b"`).
pub fn file_stem(filename: &str) -> &str {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
}
