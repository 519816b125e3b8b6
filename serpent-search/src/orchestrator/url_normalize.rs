//! URL normalisation for cross-provider deduplication.
//!
//! The dedup key deliberately ignores scheme, a leading `www.` and trailing
//! slashes, so the same page reported by two providers with cosmetic URL
//! differences collapses to one result.

/// Scheme and host prefixes removed from the front of a key.
const PREFIXES: &[&str] = &["https://", "http://", "www."];

/// Derive the deduplication key for `raw`.
///
/// Transformations, in order:
///
/// 1. Trim surrounding whitespace and lowercase.
/// 2. Strip leading `http://`, `https://` and `www.` prefixes.
/// 3. Strip trailing slashes.
///
/// The key is idempotent: `dedup_key(&dedup_key(u)) == dedup_key(u)`.
///
/// # Examples
///
/// ```
/// use serpent_search::orchestrator::url_normalize::dedup_key;
///
/// assert_eq!(dedup_key("https://Example.com/path/"), dedup_key("example.com/path"));
/// ```
pub fn dedup_key(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();

    let mut key = lowered.as_str();
    while let Some(rest) = PREFIXES.iter().find_map(|p| key.strip_prefix(p)) {
        key = rest.trim_start();
    }

    key.trim_end_matches(|c: char| c == '/' || c.is_whitespace())
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "https://Example.com/path/",
        "example.com/path",
        "http://www.example.com",
        "HTTPS://WWW.EXAMPLE.COM/",
        "https://http://www.www.nested.example///",
        "https:/",
        "www./",
        "  https://spaced.example/a  ",
        "https://example.com/Path?Q=1#Frag",
        "https:// www.gap.example / ",
        "",
        "/",
    ];

    #[test]
    fn equivalent_urls_share_a_key() {
        assert_eq!(dedup_key("https://Example.com/path/"), "example.com/path");
        assert_eq!(dedup_key("example.com/path"), "example.com/path");
        assert_eq!(dedup_key("http://www.example.com"), "example.com");
        assert_eq!(dedup_key("HTTPS://WWW.EXAMPLE.COM/"), "example.com");
    }

    #[test]
    fn key_is_idempotent() {
        for sample in SAMPLES {
            let once = dedup_key(sample);
            assert_eq!(dedup_key(&once), once, "not idempotent for {sample:?}");
        }
    }

    #[test]
    fn query_and_fragment_are_kept() {
        assert_eq!(
            dedup_key("https://example.com/Path?Q=1#Frag"),
            "example.com/path?q=1#frag"
        );
    }

    #[test]
    fn distinct_paths_stay_distinct() {
        assert_ne!(dedup_key("https://a.example/x"), dedup_key("https://a.example/y"));
        assert_ne!(dedup_key("https://a.example"), dedup_key("https://b.example"));
    }

    #[test]
    fn nested_prefixes_are_stripped() {
        assert_eq!(
            dedup_key("https://http://www.www.nested.example///"),
            "nested.example"
        );
    }
}
