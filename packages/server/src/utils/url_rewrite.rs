/// Replace the first matching legacy prefix of `url` with `new_host`.
///
/// Prefixes are tried in order, so more specific ones must come first.
/// URLs that match none are returned unchanged.
pub fn rewrite_image_url<S: AsRef<str>>(url: &str, legacy_prefixes: &[S], new_host: &str) -> String {
    legacy_prefixes
        .iter()
        .map(AsRef::as_ref)
        .find_map(|prefix| url.strip_prefix(prefix))
        .map(|rest| format!("{new_host}{rest}"))
        .unwrap_or_else(|| url.to_string())
}

/// Rewritten URL for the `premier_image_url` column; `None` for blank input.
pub fn premier_image_url<S: AsRef<str>>(
    url: &str,
    legacy_prefixes: &[S],
    new_host: &str,
) -> Option<String> {
    let url = url.trim();
    (!url.is_empty()).then(|| rewrite_image_url(url, legacy_prefixes, new_host))
}
