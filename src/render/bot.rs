//! Crawler detection from the `User-Agent` header.

use regex::Regex;
use std::sync::LazyLock;

static BOT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)bot|crawler|spider|crawling|facebookexternalhit|twitterbot|linkedinbot|whatsapp")
        .unwrap()
});

/// Whether the user agent belongs to a known crawler or link-preview fetcher.
pub fn is_bot(user_agent: &str) -> bool {
    BOT_REGEX.is_match(user_agent)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_crawlers() {
        assert!(is_bot("Mozilla/5.0 (compatible; Googlebot/2.1)"));
        assert!(is_bot("facebookexternalhit/1.1"));
        assert!(is_bot("Twitterbot/1.0"));
        assert!(is_bot("LinkedInBot/1.0"));
        assert!(is_bot("WhatsApp/2.23.20.0"));
        assert!(is_bot("Some Spider"));
        assert!(is_bot("AhrefsCRAWLER"));
    }

    #[test]
    fn test_browsers_are_not_bots() {
        assert!(!is_bot(
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15"
        ));
        assert!(!is_bot(""));
    }
}
