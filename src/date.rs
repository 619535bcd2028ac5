//! Legacy `\/Date(ms±HHMM)\/` wire literal and ISO-8601 helpers.
//!
//! The legacy form carries signed milliseconds since the Unix epoch plus an
//! optional 4-digit local offset. Recognizing it in incoming strings is a
//! documented compatibility behavior: any string value whose decoded text
//! matches the shape becomes a date token; anything malformed stays a plain
//! string.

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use std::fmt::Write as _;

/// Attempts to decode `/Date(<millis>[±HHMM])/` (post string-unescaping, so
/// without the `\/` escapes). Returns `None` on any deviation from the shape.
#[must_use]
pub(crate) fn parse_legacy_date(text: &str) -> Option<DateTime<FixedOffset>> {
    let inner = text.strip_prefix("/Date(")?.strip_suffix(")/")?;
    if inner.is_empty() {
        return None;
    }

    // The millisecond part may itself be negative, so an offset sign is only
    // looked for past the first character.
    let offset_pos = inner[1..]
        .find(|c| c == '+' || c == '-')
        .map(|i| i + 1);
    let (millis_text, offset_text) = match offset_pos {
        Some(pos) => (&inner[..pos], Some(&inner[pos..])),
        None => (inner, None),
    };

    let millis: i64 = millis_text.parse().ok()?;
    let offset_secs = match offset_text {
        Some(tz) => parse_hhmm_offset(tz)?,
        None => 0,
    };

    let offset = FixedOffset::east_opt(offset_secs)?;
    let utc = DateTime::<Utc>::from_timestamp_millis(millis)?;
    Some(utc.with_timezone(&offset))
}

/// `±HHMM` → signed seconds east of UTC.
fn parse_hhmm_offset(text: &str) -> Option<i32> {
    let (sign, digits) = match text.as_bytes().first()? {
        b'+' => (1, &text[1..]),
        b'-' => (-1, &text[1..]),
        _ => return None,
    };
    if digits.len() != 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(sign * (hours * 3600 + minutes * 60))
}

/// Renders the legacy literal body (no quotes): `\/Date(<millis>[±HHMM])\/`.
/// The offset suffix is emitted only for non-zero offsets.
pub(crate) fn format_legacy_date(out: &mut String, date: &DateTime<FixedOffset>) {
    out.push_str("\\/Date(");
    let _ = write!(out, "{}", date.timestamp_millis());
    let offset_secs = date.offset().local_minus_utc();
    if offset_secs != 0 {
        let sign = if offset_secs < 0 { '-' } else { '+' };
        let abs_minutes = offset_secs.abs() / 60;
        let _ = write!(out, "{}{:02}{:02}", sign, abs_minutes / 60, abs_minutes % 60);
    }
    out.push_str(")\\/");
}

/// ISO-8601 with millisecond precision; `Z` for a zero offset.
#[must_use]
pub(crate) fn format_iso_date(date: &DateTime<FixedOffset>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}
