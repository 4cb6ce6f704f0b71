//! URL slug generation for categories and products.
//!
//! Uniqueness scope is decided by the caller: it passes in the set of slugs
//! already taken in scope (sibling slugs for a category, every product slug
//! for a product), with the entity being updated already excluded.

use std::collections::HashSet;

use crate::errors::ServiceError;

/// Lowercase, hyphen-separated ASCII token for `text`.
///
/// Returns an empty string when nothing in `text` maps to an ASCII letter or
/// digit.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            let mut buf = [0u8; 4];
            push_piece(&mut out, ch.encode_utf8(&mut buf), &mut pending_hyphen);
        } else if ch == '&' {
            pending_hyphen = true;
            push_piece(&mut out, "and", &mut pending_hyphen);
            pending_hyphen = true;
        } else if let Some(ascii) = transliterate(ch) {
            push_piece(&mut out, ascii, &mut pending_hyphen);
        } else {
            pending_hyphen = true;
        }
    }

    out
}

fn push_piece(out: &mut String, piece: &str, pending_hyphen: &mut bool) {
    if *pending_hyphen && !out.is_empty() {
        out.push('-');
    }
    *pending_hyphen = false;
    out.push_str(piece);
}

fn transliterate(ch: char) -> Option<&'static str> {
    let ascii = match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'č' => "c",
        'ď' | 'đ' | 'ð' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'ğ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' | 'ı' => "i",
        'ł' | 'ľ' => "l",
        'ñ' | 'ń' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'œ' => "oe",
        'ř' => "r",
        'ß' => "ss",
        'ś' | 'š' | 'ş' => "s",
        'ť' | 'ţ' => "t",
        'þ' => "th",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' | 'ų' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        _ => return None,
    };
    Some(ascii)
}

/// First free slug among `base`, `base-1`, `base-2`, ...
///
/// Deterministic for a given `taken` set. At most `taken.len() + 1`
/// suffixes are tried, which always suffices for a consistent set.
pub fn unique_slug(base: &str, taken: &HashSet<String>) -> Result<String, ServiceError> {
    if base.is_empty() {
        return Err(ServiceError::invalid(
            "slug",
            "must contain at least one letter or digit",
        ));
    }
    if !taken.contains(base) {
        return Ok(base.to_string());
    }

    let cap = taken.len() + 1;
    for n in 1..=cap {
        let candidate = format!("{}-{}", base, n);
        if !taken.contains(&candidate) {
            return Ok(candidate);
        }
    }

    Err(ServiceError::structural(format!(
        "no free slug for '{}' after {} attempts",
        base, cap
    )))
}

/// Normalizes `base_text` and resolves collisions against `taken`.
pub fn generate(base_text: &str, taken: &HashSet<String>) -> Result<String, ServiceError> {
    unique_slug(&slugify(base_text), taken)
}

/// Materialized category path: `parent/slug`, or `slug` at the root.
pub fn generate_path(slug: &str, parent_path: Option<&str>) -> String {
    match parent_path {
        Some(parent) if !parent.is_empty() => format!("{}/{}", parent, slug),
        _ => slug.to_string(),
    }
}
