//! Conversion from canonical timezone names to UTC offsets.

use time::{OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

/// Get the current UTC offset of `canonical_timezone`, e.g. "Pacific/Auckland".
///
/// Returns `None` if the name is not a known timezone.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    get_offset_at(canonical_timezone, OffsetDateTime::now_utc())
}

/// Get the UTC offset of `canonical_timezone` at the instant `at`.
pub fn get_offset_at(canonical_timezone: &str, at: OffsetDateTime) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&at).to_utc())
}
