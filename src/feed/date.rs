use chrono::DateTime;

/// Display format for post dates ("January 15, 2025").
const LONG_DATE_FORMAT: &str = "%B %-d, %Y";

/// Renders an RSS `pubDate` as a long-form date.
///
/// The input is parsed as RFC 2822 (`EEE, dd MMM yyyy HH:mm:ss Z`) and
/// rendered in the offset the feed stated, so the calendar day matches what
/// the publisher wrote. Unparseable input is returned verbatim; this never
/// fails.
pub fn format_pub_date(raw: &str) -> String {
    match DateTime::parse_from_rfc2822(raw.trim()) {
        Ok(dt) => dt.format(LONG_DATE_FORMAT).to_string(),
        Err(e) => {
            tracing::debug!(raw = %raw, error = %e, "pubDate not RFC 2822, keeping raw string");
            raw.to_string()
        }
    }
}
