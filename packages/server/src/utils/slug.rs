use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Normalize free text into a URL slug.
///
/// Accents are folded ("São" becomes "sao"), runs of whitespace, `_` and `-`
/// become a single `-`, punctuation is dropped and the result never starts or
/// ends with `-`.
pub fn slugify(input: &str) -> String {
    let folded: String = input
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();

    let mut slug = String::with_capacity(folded.len());
    let mut pending_dash = false;
    for c in folded.trim().chars() {
        if c.is_whitespace() || c == '_' || c == '-' {
            pending_dash = true;
        } else if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        }
    }
    slug
}

/// Uppercase and trim an ISO country code.
pub fn normalize_country_code(code: &str) -> String {
    code.trim().to_uppercase()
}
