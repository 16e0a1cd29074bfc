use regex::Regex;
use std::sync::LazyLock;

/// Uploads older than this many days are stale
pub const RECENCY_WINDOW_DAYS: u64 = 14;

/// Same window expressed in the coarser week unit
pub const RECENCY_WINDOW_WEEKS: u64 = 2;

/// Units finer than a week, in English and Chinese
const SUB_WEEK_UNITS: &[&str] = &["minute", "hour", "day", "分鐘", "小時", "天"];
const DAY_UNITS: &[&str] = &["day", "天"];
const WEEK_UNITS: &[&str] = &["week", "週", "周"];

static MAGNITUDE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]+").expect("magnitude pattern is valid"));

/// Decide whether a relative publish time ("3 days ago", "2 週前") is inside the window.
///
/// Missing text counts as recent: absent data must not silently exclude an upload.
/// Minute and hour scale times are always recent, days up to 14 and weeks up to 2
/// are recent, everything else (months, years, unrecognized text) is stale. A unit
/// without a readable number is treated as recent.
pub fn is_recent(time_text: &str) -> bool {
    if time_text.is_empty() {
        return true;
    }
    let text = time_text.trim().to_lowercase();

    if contains_any(&text, SUB_WEEK_UNITS) {
        return match leading_magnitude(&text) {
            Some(days) if contains_any(&text, DAY_UNITS) => days <= RECENCY_WINDOW_DAYS,
            _ => true,
        };
    }

    if contains_any(&text, WEEK_UNITS) {
        return leading_magnitude(&text).map_or(true, |weeks| weeks <= RECENCY_WINDOW_WEEKS);
    }

    false
}

fn contains_any(text: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|token| text.contains(token))
}

/// First integer in the text; overflowing numbers saturate
fn leading_magnitude(text: &str) -> Option<u64> {
    MAGNITUDE
        .find(text)
        .map(|m| m.as_str().parse::<u64>().unwrap_or(u64::MAX))
}
