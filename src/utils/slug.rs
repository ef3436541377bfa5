//! Slug normalization.
//!
//! Turns a title or a proposed slug into the `[a-z0-9-]` form used in public
//! URLs. Uniqueness is handled by
//! [`crate::application::services::IdentifierAllocator`].

/// Base used when normalization leaves nothing.
pub const FALLBACK_SLUG: &str = "smartlink";

/// Maps common Latin letters with diacritics to their ASCII base.
fn fold_char(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'č' => "c",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' | 'ě' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'ī' => "i",
        'ð' => "d",
        'ñ' | 'ń' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => "o",
        'œ' => "oe",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' => "u",
        'ý' | 'ÿ' => "y",
        'ś' | 'š' => "s",
        'ß' => "ss",
        'ź' | 'ż' | 'ž' => "z",
        'ł' => "l",
        'ř' => "r",
        'ť' => "t",
        _ => return None,
    };
    Some(folded)
}

/// Normalizes `input` into a slug.
///
/// Lowercases, folds accents, turns every run of other characters into a
/// single hyphen and trims hyphens at both ends. Falls back to
/// [`FALLBACK_SLUG`] when nothing is left.
///
/// # Examples
///
/// ```
/// use smartlink::utils::slug::normalize_slug;
///
/// assert_eq!(normalize_slug("Nightfall"), "nightfall");
/// assert_eq!(normalize_slug("  Café  del Mar!! "), "cafe-del-mar");
/// assert_eq!(normalize_slug("!!!"), "smartlink");
/// ```
pub fn normalize_slug(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for c in input.chars().flat_map(char::to_lowercase) {
        let piece: Option<&str> = if c.is_ascii_lowercase() || c.is_ascii_digit() {
            None
        } else {
            match fold_char(c) {
                Some(folded) => Some(folded),
                None => {
                    pending_hyphen = true;
                    continue;
                }
            }
        };

        if pending_hyphen && !slug.is_empty() {
            slug.push('-');
        }
        pending_hyphen = false;

        match piece {
            Some(folded) => slug.push_str(folded),
            None => slug.push(c),
        }
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Candidate for the `attempt`-th try: the base itself, then `base-1`, `base-2`...
pub fn slug_candidate(base: &str, attempt: u32) -> String {
    if attempt == 0 {
        base.to_string()
    } else {
        format!("{}-{}", base, attempt)
    }
}

/// Whether `slug` is already in normalized form.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
