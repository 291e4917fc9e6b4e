/**
 * File naming: capture date string -> canonical file stem
 */

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::error::StemError;
use crate::layout::Layout;

/// Build the canonical stem for a capture date
///
/// Format: YYYY_MM_DD_HH_MM_SS (no timezone, no sub-seconds)
pub fn format_stem(dt: &NaiveDateTime) -> String {
    format!(
        "{:04}_{:02}_{:02}_{:02}_{:02}_{:02}",
        dt.year(),
        dt.month(),
        dt.day(),
        dt.hour(),
        dt.minute(),
        dt.second()
    )
}

/// Parse `raw` strictly against `date_format` and return the new file stem.
///
/// Any disagreement between layout and input is an error; nothing is
/// truncated or reinterpreted.
pub fn derive_stem(date_format: &str, raw: &str) -> Result<String, StemError> {
    let layout = Layout::parse(date_format)?;
    derive_stem_with(&layout, raw)
}

pub fn derive_stem_with(layout: &Layout, raw: &str) -> Result<String, StemError> {
    let dt = layout
        .parse_wall_clock(raw)
        .map_err(|reason| StemError::Mismatch {
            layout: layout.as_str().to_string(),
            value: raw.to_string(),
            reason,
        })?;

    Ok(format_stem(&dt))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORMAT_JPEG: &str = "2006:01:02 15:04:05";
    const FORMAT_MOV: &str = "2006:01:02 15:04:05-07:00";

    #[test]
    fn test_stem_jpeg() {
        let stem = derive_stem(FORMAT_JPEG, "2019:08:05 14:12:13").unwrap();
        assert_eq!(stem, "2019_08_05_14_12_13");
        assert_eq!(stem.len(), 19);
    }

    #[test]
    fn test_stem_mov_drops_offset() {
        let stem = derive_stem(FORMAT_MOV, "2015:07:15 13:56:17+02:00").unwrap();
        assert_eq!(stem, "2015_07_15_13_56_17");
    }

    #[test]
    fn test_stem_is_zero_padded() {
        let stem = derive_stem(FORMAT_JPEG, "0987:01:02 03:04:05").unwrap();
        assert_eq!(stem, "0987_01_02_03_04_05");
    }

    #[test]
    fn test_structure_mismatch_fails() {
        let err = derive_stem("2006:01:02", "2015:07:15 13:56:17+02:00").unwrap_err();
        assert!(matches!(err, StemError::Mismatch { .. }));
    }

    #[test]
    fn test_invalid_inputs_fail() {
        for raw in [
            "2019-08-05 14:12:13",
            "2019:08:05",
            "2019:08:05 14:12",
            "2019:AB:05 14:12:13",
            "0000:00:00 00:00:00",
            "2019:02:30 10:00:00",
            "2019:8:5 14:12:13",
            "19:08:05 14:12:13",
            "2019: 08:05 14:12:13",
            "2019:08:05  14:12:13",
            "+2019:08:05 14:12:13",
            "2019:08:05 14:12:13 ",
            "",
        ] {
            assert!(derive_stem(FORMAT_JPEG, raw).is_err(), "{raw:?} should not parse");
        }
    }

    #[test]
    fn test_short_year_is_not_reinterpreted() {
        let err = derive_stem(FORMAT_JPEG, "19:08:05 14:12:13").unwrap_err();
        assert!(matches!(err, StemError::Mismatch { .. }));
    }

    #[test]
    fn test_twelve_hour_layout_without_pm() {
        let stem = derive_stem("2006-01-02 03:04:05", "2015-07-15 01:56:17").unwrap();
        assert_eq!(stem, "2015_07_15_01_56_17");
    }

    #[test]
    fn test_missing_offset_fails_when_layout_requires_one() {
        assert!(derive_stem(FORMAT_MOV, "2015:07:15 13:56:17").is_err());
    }

    #[test]
    fn test_bad_layout_is_reported() {
        let err = derive_stem("2006-01-02 15:04:05 -07", "2015-07-15 13:56:17 +02").unwrap_err();
        assert!(matches!(err, StemError::Layout(_)));
    }
}
