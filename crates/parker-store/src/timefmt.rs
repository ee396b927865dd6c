use chrono::{DateTime, Local, LocalResult, NaiveDateTime, TimeZone};
use tracing::error;

/// Textual layout used for every datetime column.
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Render a time in the storage layout, in the local zone.
pub fn encode(t: DateTime<Local>) -> String {
    t.format(DATE_FORMAT).to_string()
}

/// Parse a stored datetime string in the local zone.
///
/// A malformed value decodes to [`zero`] and is logged, so a single bad field
/// never sinks the row it belongs to.
pub fn decode(raw: &str) -> DateTime<Local> {
    let naive = match NaiveDateTime::parse_from_str(raw, DATE_FORMAT) {
        Ok(naive) => naive,
        Err(e) => {
            error!(value = raw, error = %e, "failed to parse datetime");
            return zero();
        }
    };
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(t) => t,
        // DST fold: both instants are valid, take the earlier one.
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            error!(value = raw, "datetime does not exist in the local timezone");
            zero()
        }
    }
}

/// The documented zero value: the Unix epoch rendered in the local zone.
pub fn zero() -> DateTime<Local> {
    DateTime::from(DateTime::UNIX_EPOCH)
}

/// True when `t` is the substitute produced for an undecodable field.
///
/// The zero value is the Unix epoch, itself a storable timestamp: a row that
/// genuinely holds the epoch is indistinguishable from a decode failure.
/// Treat a zero as a hint to check the logs, not as proof of one.
pub fn is_zero(t: DateTime<Local>) -> bool {
    t == zero()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_second_precision() {
        // Midday in winter and summer: unambiguous in every real timezone.
        for t in [
            Local.with_ymd_and_hms(2024, 1, 15, 12, 30, 45).unwrap(),
            Local.with_ymd_and_hms(2024, 7, 15, 12, 30, 45).unwrap(),
        ] {
            assert_eq!(decode(&encode(t)), t);
        }
    }

    #[test]
    fn encodes_in_the_fixed_layout() {
        let t = Local.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        assert_eq!(encode(t), "2024-01-01 08:00:00");
    }

    #[test]
    fn malformed_input_decodes_to_zero() {
        assert!(is_zero(decode("not-a-time")));
        assert!(is_zero(decode("")));
        assert!(is_zero(decode("2024-13-45 99:00:00")));
        assert!(is_zero(decode("0000-00-00 00:00:00")));
    }

    #[test]
    fn valid_input_is_not_zero() {
        assert!(!is_zero(decode("2024-01-01 08:00:00")));
    }

    #[test]
    fn a_stored_epoch_is_indistinguishable_from_decode_failure() {
        assert!(is_zero(decode(&encode(zero()))));
    }
}
