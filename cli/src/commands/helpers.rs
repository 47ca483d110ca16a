use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;

/// Resolve a `--date` argument against `now`.
///
/// `None` leaves the timestamp to the service (now). Accepts
/// today/yesterday/tomorrow, `YYYY-MM-DD` (local midnight), or RFC 3339.
pub(crate) fn parse_date(date_str: Option<&str>, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
    let Some(s) = date_str else {
        return Ok(None);
    };
    let resolved = match s {
        "today" => now,
        "yesterday" => now - Duration::days(1),
        "tomorrow" => now + Duration::days(1),
        _ => parse_timestamp(s)?,
    };
    Ok(Some(resolved))
}

pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| {
        format!("Invalid date '{s}'. Use YYYY-MM-DD, RFC 3339, or today/yesterday/tomorrow")
    })?;
    Local
        .from_local_datetime(&day.and_time(NaiveTime::MIN))
        .earliest()
        .map(|ts| ts.with_timezone(&Utc))
        .with_context(|| format!("Local midnight does not exist on {s}"))
}

pub(crate) fn format_day(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d").to_string()
}

pub(crate) fn format_time(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

/// Print a "not found" message in the requested format and exit with status 2.
pub(crate) fn exit_not_found(message: &str, json: bool) -> ! {
    if json {
        println!("{}", json_error(message));
    } else {
        eprintln!("{message}");
    }
    std::process::exit(2);
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

/// Signed weight delta, e.g. `-3.2` or `+1.0`.
pub(crate) fn format_change(lbs: f64) -> String {
    format!("{:+.1}", no_neg_zero(lbs))
}

/// Cap `s` at `max` characters, ending in `...` when cut. Widths under 3
/// yield just the ellipsis.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max.saturating_sub(3)).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 17, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_date_none() {
        assert!(parse_date(None, now()).unwrap().is_none());
    }

    #[test]
    fn test_parse_date_keywords() {
        assert_eq!(parse_date(Some("today"), now()).unwrap(), Some(now()));
        assert_eq!(
            parse_date(Some("yesterday"), now()).unwrap(),
            Some(now() - Duration::days(1))
        );
        assert_eq!(
            parse_date(Some("tomorrow"), now()).unwrap(),
            Some(now() + Duration::days(1))
        );
    }

    #[test]
    fn test_parse_date_iso_is_local_midnight() {
        let ts = parse_date(Some("2024-01-15"), now()).unwrap().unwrap();
        let local = ts.with_timezone(&Local);
        assert_eq!(local.date_naive(), NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(local.time(), NaiveTime::MIN);
    }

    #[test]
    fn test_parse_date_rfc3339() {
        let ts = parse_date(Some("2024-01-15T07:30:00Z"), now()).unwrap();
        assert_eq!(ts, Some(Utc.with_ymd_and_hms(2024, 1, 15, 7, 30, 0).unwrap()));
    }

    #[test]
    fn test_parse_date_invalid() {
        assert!(parse_date(Some("nope"), now()).is_err());
    }

    #[test]
    fn test_format_change() {
        assert_eq!(format_change(-3.24), "-3.2");
        assert_eq!(format_change(1.0), "+1.0");
        assert_eq!(format_change(-0.0), "+0.0");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("lunch.jpg", 20), "lunch.jpg");
        assert_eq!(truncate("file:///photos/2024/01/dinner.jpg", 15), "file:///phot...");
    }

    #[test]
    fn test_truncate_utf8() {
        assert_eq!(truncate("déjeuner-photo.jpg", 10), "déjeune...");
    }

    #[test]
    fn test_truncate_narrow_width() {
        assert_eq!(truncate("abcdef", 2), "...");
        assert_eq!(truncate("abcdef", 0), "...");
        assert_eq!(truncate("ab", 2), "ab");
    }

    #[test]
    fn test_no_neg_zero() {
        assert_eq!(no_neg_zero(-0.0).to_bits(), 0.0_f64.to_bits());
        assert_eq!(no_neg_zero(-3.0), -3.0);
    }

    #[test]
    fn test_json_error() {
        assert_eq!(json_error("No goal set"), r#"{"error":"No goal set"}"#);
    }
}
