use chrono::{DateTime, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike, Utc};

use crate::errors::AppError;
use crate::models::Role;

/// The business runs on a fixed UTC-6 clock; there is no DST to handle.
pub fn business_offset() -> FixedOffset {
    FixedOffset::west_opt(6 * 3600).expect("-06:00 is a valid offset")
}

/// Parses an hour-granularity slot label ("HH:MM"). Bookable hours run from
/// 06:00 through 23:00.
pub fn parse_slot(time_slot: &str) -> Option<(u32, u32)> {
    let (hour, minute) = time_slot.split_once(':')?;
    let hour: u32 = hour.parse().ok()?;
    let minute: u32 = minute.parse().ok()?;
    ((6..=23).contains(&hour) && minute < 60).then_some((hour, minute))
}

pub fn slot_hour(time_slot: &str) -> Option<u32> {
    parse_slot(time_slot).map(|(hour, _)| hour)
}

pub(crate) fn to_utc(local: NaiveDateTime) -> DateTime<Utc> {
    match business_offset().from_local_datetime(&local) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        // A fixed offset never produces ambiguous or missing local times.
        _ => Utc.from_utc_datetime(&local),
    }
}

/// First instant of the local calendar day, as UTC.
pub fn local_day_start(date: NaiveDate) -> DateTime<Utc> {
    to_utc(date.and_time(NaiveTime::MIN))
}

/// Last counted second of the local calendar day, as UTC.
pub fn local_day_end(date: NaiveDate) -> DateTime<Utc> {
    let end = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    to_utc(date.and_time(end))
}

/// Combines a calendar date with a slot label into the absolute instant of
/// the slot at the business offset.
pub fn combine_date_slot(date: NaiveDate, time_slot: &str) -> Result<DateTime<Utc>, AppError> {
    let (hour, minute) = parse_slot(time_slot)
        .ok_or_else(|| AppError::Validation(format!("invalid time slot: {time_slot}")))?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| AppError::Validation(format!("invalid time slot: {time_slot}")))?;
    Ok(to_utc(date.and_time(time)))
}

/// Computes the booking instant and enforces the past-slot rule: regular
/// actors may not book a date before today, nor a slot on today whose hour
/// has already started. Admins bypass the rule entirely so historical
/// records can be backfilled.
pub fn validate_booking_time(
    date: NaiveDate,
    time_slot: &str,
    role: Role,
    now: DateTime<Utc>,
) -> Result<DateTime<Utc>, AppError> {
    let (hour, _) = parse_slot(time_slot)
        .ok_or_else(|| AppError::Validation(format!("invalid time slot: {time_slot}")))?;
    let booking_date_time = combine_date_slot(date, time_slot)?;

    if role != Role::Admin {
        let now_local = now.with_timezone(&business_offset());
        let today = now_local.date_naive();

        if date < today {
            return Err(AppError::Validation(
                "cannot create a booking on a past date".to_string(),
            ));
        }
        if date == today && hour < now_local.hour() {
            return Err(AppError::Validation(
                "cannot create a booking in a time slot that has already passed".to_string(),
            ));
        }
    }

    Ok(booking_date_time)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn utc(s: &str) -> DateTime<Utc> {
        Utc.from_utc_datetime(&NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap())
    }

    #[test]
    fn slot_parsing_enforces_bookable_hours() {
        assert_eq!(parse_slot("06:00"), Some((6, 0)));
        assert_eq!(parse_slot("23:00"), Some((23, 0)));
        assert_eq!(parse_slot("05:00"), None);
        assert_eq!(parse_slot("24:00"), None);
        assert_eq!(parse_slot("10:75"), None);
        assert_eq!(parse_slot("ten"), None);
        assert_eq!(parse_slot(""), None);
    }

    #[test]
    fn combining_shifts_into_utc() {
        // 18:00 at UTC-6 is midnight UTC the next day.
        let dt = combine_date_slot(date("2026-03-10"), "18:00").unwrap();
        assert_eq!(dt, utc("2026-03-11 00:00:00"));

        let dt = combine_date_slot(date("2026-03-10"), "06:00").unwrap();
        assert_eq!(dt, utc("2026-03-10 12:00:00"));
    }

    #[test]
    fn past_date_rejected_for_regular_actor() {
        // Local time: 2026-08-07 12:00.
        let now = utc("2026-08-07 18:00:00");
        let result = validate_booking_time(date("2026-08-06"), "10:00", Role::User, now);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn past_hour_today_rejected_for_regular_actor() {
        let now = utc("2026-08-07 18:00:00"); // 12:00 local
        let result = validate_booking_time(date("2026-08-07"), "11:00", Role::User, now);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn current_hour_today_allowed() {
        // The rule is strict: the slot for the hour in progress still books.
        let now = utc("2026-08-07 18:30:00"); // 12:30 local
        let result = validate_booking_time(date("2026-08-07"), "12:00", Role::User, now);
        assert!(result.is_ok());
    }

    #[test]
    fn future_slot_allowed_for_regular_actor() {
        let now = utc("2026-08-07 18:00:00");
        let result = validate_booking_time(date("2026-08-08"), "06:00", Role::User, now);
        assert!(result.is_ok());
    }

    #[test]
    fn admin_bypasses_past_checks() {
        let now = utc("2026-08-07 18:00:00");
        let result = validate_booking_time(date("2020-01-01"), "08:00", Role::Admin, now);
        assert!(result.is_ok());
    }

    #[test]
    fn invalid_slot_rejected_even_for_admin() {
        let now = utc("2026-08-07 18:00:00");
        let result = validate_booking_time(date("2026-08-08"), "03:00", Role::Admin, now);
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
