//! 브로커 타임스탬프 파싱.
//!
//! 오프셋이 있는 ISO-8601/RFC 3339는 그대로 사용하고, 오프셋이 없는 로컬 시각은
//! 가져오기 설정의 시간대(`chrono-tz`)로 해석합니다.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// 슬래시 날짜의 일/월 순서.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOrder {
    /// `31/12/2025 19:44:22` (스페인어 내보내기)
    DayFirst,
    /// `12/31/2025 7:44:22 PM` (영어 내보내기, Tradovate)
    MonthFirst,
}

const ISO_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DAY_FIRST_FORMATS: &[&str] = &[
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
];

const MONTH_FIRST_FORMATS: &[&str] = &[
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M %p",
    "%m/%d/%Y %H:%M",
];

/// 타임스탬프를 절대 시각으로 변환합니다. 인식할 수 없으면 `None`.
pub fn parse_timestamp(raw: &str, order: DateOrder, tz: Tz) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let locale_formats = match order {
        DateOrder::DayFirst => DAY_FIRST_FORMATS,
        DateOrder::MonthFirst => MONTH_FIRST_FORMATS,
    };

    ISO_FORMATS
        .iter()
        .chain(locale_formats)
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| resolve_local(naive, tz))
}

/// 로컬 시각을 UTC로. DST 중복 구간은 이른 쪽, 공백 구간은 한 시간 뒤로 밀어 해석.
pub fn resolve_local(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_day_first() {
        let t = parse_timestamp("31/12/2025 19:44:22", DateOrder::DayFirst, Tz::UTC).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2025, 12, 31, 19, 44, 22).unwrap());
    }

    #[test]
    fn test_month_first_with_meridiem() {
        let t = parse_timestamp("1/6/2025 9:30:15 AM", DateOrder::MonthFirst, Tz::UTC).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2025, 1, 6, 9, 30, 15).unwrap());

        let t = parse_timestamp("01/06/2025 13:05:00", DateOrder::MonthFirst, Tz::UTC).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2025, 1, 6, 13, 5, 0).unwrap());
    }

    #[test]
    fn test_iso_and_offsets() {
        let t = parse_timestamp("2025-01-06T14:30:00Z", DateOrder::DayFirst, Tz::UTC).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2025, 1, 6, 14, 30, 0).unwrap());

        let t = parse_timestamp("2025-01-06T09:30:00-05:00", DateOrder::DayFirst, Tz::UTC)
            .unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2025, 1, 6, 14, 30, 0).unwrap());
    }

    #[test]
    fn test_naive_uses_import_timezone() {
        let t = parse_timestamp(
            "2025-01-06T09:30:00",
            DateOrder::MonthFirst,
            chrono_tz::America::New_York,
        )
        .unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2025, 1, 6, 14, 30, 0).unwrap());
    }

    #[test]
    fn test_unparseable() {
        assert!(parse_timestamp("", DateOrder::DayFirst, Tz::UTC).is_none());
        assert!(parse_timestamp("yesterday", DateOrder::DayFirst, Tz::UTC).is_none());
    }
}
