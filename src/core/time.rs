use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn to_primitive_utc(value: OffsetDateTime) -> PrimitiveDateTime {
    let utc = value.to_offset(UtcOffset::UTC);
    PrimitiveDateTime::new(utc.date(), utc.time())
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

/// Accepts the two timestamp shapes clients send: a full RFC 3339 instant or
/// a bare `YYYY-MM-DD` date, which is taken as midnight UTC.
pub(crate) fn parse_flexible_timestamp(raw: &str) -> Option<PrimitiveDateTime> {
    if let Ok(instant) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(to_primitive_utc(instant));
    }

    let date = Date::parse(raw, format_description!("[year]-[month]-[day]")).ok()?;
    Some(PrimitiveDateTime::new(date, Time::MIDNIGHT))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_primitive_outputs_utc_z() {
        let date = Date::from_calendar_date(2025, time::Month::January, 2).unwrap();
        let time = Time::from_hms(10, 20, 30).unwrap();
        let value = PrimitiveDateTime::new(date, time);
        assert_eq!(format_primitive(value), "2025-01-02T10:20:30Z");
    }

    #[test]
    fn parse_flexible_timestamp_accepts_rfc3339() {
        let parsed = parse_flexible_timestamp("2025-01-02T10:20:30+03:00").expect("rfc3339");
        assert_eq!(format_primitive(parsed), "2025-01-02T07:20:30Z");
    }

    #[test]
    fn parse_flexible_timestamp_accepts_bare_date() {
        let parsed = parse_flexible_timestamp("2025-01-01").expect("bare date");
        assert_eq!(format_primitive(parsed), "2025-01-01T00:00:00Z");
    }

    #[test]
    fn parse_flexible_timestamp_rejects_garbage() {
        assert!(parse_flexible_timestamp("tomorrow").is_none());
        assert!(parse_flexible_timestamp("2025-13-40").is_none());
    }
}
