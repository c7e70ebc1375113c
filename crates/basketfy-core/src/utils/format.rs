//! Display formatting for addresses and on-chain timestamps.

use crate::config::address_display::{MIN_LEN, PREFIX_LEN, SUFFIX_LEN};

/// Truncate an account identifier for display (`0x12...7890`).
///
/// Identifiers shorter than [`MIN_LEN`] format to the empty string.
pub fn format_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() < MIN_LEN {
        return String::new();
    }

    let prefix: String = chars[..PREFIX_LEN].iter().collect();
    let suffix: String = chars[chars.len() - SUFFIX_LEN..].iter().collect();
    format!("{prefix}...{suffix}")
}

const SECONDS_PER_DAY: u64 = 86_400;

/// 9999-12-31T23:59:59Z. Later timestamps display as that date.
const LAST_DISPLAYABLE: u64 = 253_402_300_799;

/// Format a seconds-since-epoch timestamp as an ISO date (`YYYY-MM-DD`, UTC).
pub fn format_date_iso(timestamp: u64) -> String {
    let (year, month, day) = civil_from_days(timestamp.min(LAST_DISPLAYABLE) / SECONDS_PER_DAY);
    format!("{year:04}-{month:02}-{day:02}")
}

/// Days since 1970-01-01 to a proleptic Gregorian `(year, month, day)`.
///
/// Constant time: counts in 400-year eras of 146 097 days, with years
/// starting on March 1st so the leap day closes each year.
fn civil_from_days(days: u64) -> (u64, u64, u64) {
    // 719 468 days separate 0000-03-01 from the Unix epoch.
    let shifted = days + 719_468;
    let era = shifted / 146_097;
    let day_of_era = shifted % 146_097;
    let year_of_era =
        (day_of_era - day_of_era / 1_460 + day_of_era / 36_524 - day_of_era / 146_096) / 365;
    let day_of_year = day_of_era - (365 * year_of_era + year_of_era / 4 - year_of_era / 100);
    // Month index counted from March.
    let mp = (5 * day_of_year + 2) / 153;
    let day = day_of_year - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = era * 400 + year_of_era + u64::from(month <= 2);
    (year, month, day)
}
