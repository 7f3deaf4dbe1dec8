//! Small string helpers shared by path generation and the flat projection.

use unicode_normalization::UnicodeNormalization;

/// ASCII-fold (NFKD, non-ASCII dropped), lowercase, drop everything but word
/// characters, spaces and hyphens, then collapse whitespace and hyphen runs
/// into single hyphens.
pub fn slugify(value: &str) -> String {
    let cleaned: String = value
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| c.to_ascii_lowercase())
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_ascii_whitespace())
        .collect();

    let mut slug = String::with_capacity(cleaned.len());
    let mut pending_dash = false;
    for c in cleaned.chars() {
        if c == '-' || c.is_ascii_whitespace() {
            pending_dash = true;
            continue;
        }
        if pending_dash && !slug.is_empty() {
            slug.push('-');
        }
        pending_dash = false;
        slug.push(c);
    }
    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}

/// Last segment of a `/`-separated path
pub fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
