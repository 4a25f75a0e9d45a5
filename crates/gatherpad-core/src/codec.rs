//! Line format of a notepad file.
//!
//! One entry per line, either `"[YYYY-MM-DD HH:MM:SS] <code>"` or bare
//! `"<code>"`. Files may mix both forms when the timestamp setting was
//! toggled between registrations.

use chrono::{Local, NaiveDateTime};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const SEPARATOR: &str = "] ";

/// A single stored gathering code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    pub timestamp: Option<NaiveDateTime>,
    pub code: String,
}

impl Entry {
    /// A new entry stamped with the current local time.
    pub fn now(code: impl Into<String>) -> Self {
        Self {
            timestamp: Some(Local::now().naive_local()),
            code: code.into(),
        }
    }

    pub fn untimed(code: impl Into<String>) -> Self {
        Self {
            timestamp: None,
            code: code.into(),
        }
    }
}

/// Build the stored line for `entry` (without the line terminator).
///
/// With timestamps disabled, or when the entry carries none, only the code is
/// written.
pub fn encode(entry: &Entry, enable_timestamp: bool) -> String {
    match (enable_timestamp, entry.timestamp) {
        (true, Some(ts)) => format!("[{}{SEPARATOR}{}", ts.format(TIMESTAMP_FORMAT), entry.code),
        _ => entry.code.clone(),
    }
}

/// Extract the comparable code from a stored line.
///
/// Lines that do not decode under the current setting yield `None`; they
/// still count as entries for display but never match a duplicate.
pub fn decode_for_dedup(line: &str, enable_timestamp: bool) -> Option<String> {
    let code = if enable_timestamp {
        let (_, rest) = line.split_once(SEPARATOR)?;
        rest.trim()
    } else {
        line.trim()
    };

    if code.is_empty() {
        None
    } else {
        Some(code.to_string())
    }
}

/// The line as shown in a numbered listing.
pub fn decode_for_display(line: &str) -> &str {
    line.trim()
}

/// Best-effort structured parse, tolerant of both line forms.
pub fn decode(line: &str) -> Entry {
    let trimmed = line.trim();
    if let Some(inner) = trimmed.strip_prefix('[') {
        if let Some((stamp, rest)) = inner.split_once(SEPARATOR) {
            if let Ok(ts) = NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT) {
                return Entry {
                    timestamp: Some(ts),
                    code: rest.trim().to_string(),
                };
            }
        }
    }
    Entry::untimed(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 14)
            .and_then(|d| d.and_hms_opt(h, m, s))
            .unwrap()
    }

    #[test]
    fn encodes_timestamp_prefix() {
        let e = Entry {
            timestamp: Some(at(9, 5, 7)),
            code: "=f7TXWY8PE2z".to_string(),
        };
        assert_eq!(encode(&e, true), "[2025-03-14 09:05:07] =f7TXWY8PE2z");
        assert_eq!(encode(&e, false), "=f7TXWY8PE2z");
    }

    #[test]
    fn dedup_decode_recovers_code() {
        let e = Entry {
            timestamp: Some(at(23, 59, 59)),
            code: "ab?c=!1".to_string(),
        };
        assert_eq!(
            decode_for_dedup(&encode(&e, true), true).as_deref(),
            Some("ab?c=!1")
        );
        assert_eq!(
            decode_for_dedup(&encode(&e, false), false).as_deref(),
            Some("ab?c=!1")
        );
    }

    #[test]
    fn dedup_skips_lines_without_separator_when_timed() {
        assert_eq!(decode_for_dedup("X1", true), None);
        assert_eq!(decode_for_dedup("[2025-01-01 00:00:00]   ", true), None);
        assert_eq!(decode_for_dedup("   \n", false), None);
    }

    #[test]
    fn dedup_untimed_keeps_whole_line() {
        assert_eq!(
            decode_for_dedup("[2025-01-01 00:00:00] X1\n", false).as_deref(),
            Some("[2025-01-01 00:00:00] X1")
        );
    }

    #[test]
    fn display_only_trims() {
        assert_eq!(
            decode_for_display("  [2025-01-01 00:00:00] X1\n"),
            "[2025-01-01 00:00:00] X1"
        );
    }

    #[test]
    fn structured_decode_handles_mixed_lines() {
        let timed = decode("[2025-03-14 09:05:07] X1");
        assert_eq!(timed.timestamp, Some(at(9, 5, 7)));
        assert_eq!(timed.code, "X1");

        let bare = decode("X2\n");
        assert_eq!(bare, Entry::untimed("X2"));

        let bogus = decode("[not a time] X3");
        assert_eq!(bogus, Entry::untimed("[not a time] X3"));
    }

    #[test]
    fn encoded_line_decodes_back_with_timestamp() {
        let e = Entry {
            timestamp: Some(at(10, 0, 0)),
            code: "A".to_string(),
        };
        let line = encode(&e, true);
        assert_eq!(line, "[2025-03-14 10:00:00] A");
        assert_eq!(decode(&line), e);
        assert_eq!(decode_for_display(&line), "[2025-03-14 10:00:00] A");
    }
}
