//! Bot-check page detection.
//!
//! Heuristic: a snapshot is a bot check if it contains a known challenge
//! element or a known challenge phrase. A results page that merely mentions
//! one of the phrases will also trip it; callers treat the signal as
//! advisory and may retry in another mode.

use scraper::Selector;
use std::sync::LazyLock;

use crate::dom::Snapshot;

/// Elements that only appear on challenge pages.
pub const CAPTCHA_SELECTORS: &[&str] = &[
    "form#captcha-form",
    "div.g-recaptcha",
    "#recaptcha",
    "body.captcha",
    "iframe[src*='recaptcha']",
    "iframe[src*='hcaptcha']",
];

/// Lowercase phrase fragments shown on challenge pages.
pub const CAPTCHA_PHRASES: &[&str] = &[
    "unusual traffic",
    "confirm you are a human",
    "verify you are a human",
    "automated system",
    "suspicious activity",
    "verify it's you",
];

static COMPILED: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    CAPTCHA_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok().map(|sel| (*s, sel)))
        .collect()
});

/// What matched on a challenge page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptchaSignal {
    Selector(&'static str),
    Phrase(&'static str),
}

/// Scan `snapshot` for challenge markers, selectors first.
pub fn detect(snapshot: &Snapshot) -> Option<CaptchaSignal> {
    if let Some((raw, _)) = COMPILED.iter().find(|(_, sel)| snapshot.count(sel) > 0) {
        return Some(CaptchaSignal::Selector(*raw));
    }
    let text = snapshot.text().to_lowercase();
    CAPTCHA_PHRASES
        .iter()
        .find(|phrase| text.contains(*phrase))
        .map(|phrase| CaptchaSignal::Phrase(*phrase))
}
