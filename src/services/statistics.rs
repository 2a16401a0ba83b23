use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rusqlite::Connection;
use serde::Serialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::AttendanceStatus;
use crate::services::pricing::price_for_slot;
use crate::services::scheduling::{business_offset, local_day_end, local_day_start, slot_hour};

/// Resolves a reporting window at the business offset. `week` runs Monday
/// through Sunday of the current week, `month` and `year` cover the current
/// calendar month/year, anything else is the trailing seven days ending
/// today.
pub fn period_range(period: &str, now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let today = now.with_timezone(&business_offset()).date_naive();

    let (start, end) = match period {
        "week" => {
            let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
            (monday, monday + Duration::days(6))
        }
        "month" => {
            let first = today.with_day(1).unwrap_or(today);
            let next_month = if today.month() == 12 {
                NaiveDate::from_ymd_opt(today.year() + 1, 1, 1)
            } else {
                NaiveDate::from_ymd_opt(today.year(), today.month() + 1, 1)
            };
            let last = next_month
                .map(|d| d - Duration::days(1))
                .unwrap_or(today);
            (first, last)
        }
        "year" => {
            let first = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
            let last = NaiveDate::from_ymd_opt(today.year(), 12, 31).unwrap_or(today);
            (first, last)
        }
        _ => (today - Duration::days(7), today),
    };

    (local_day_start(start), local_day_end(end))
}

#[derive(Debug, Serialize)]
pub struct ClientPeriodStats {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub bookings_count: usize,
    pub attendance_count: usize,
    pub attendance_rate: f64,
    pub total_income: f64,
}

/// Attendance and derived income per client over the period. Income counts
/// only attended bookings that have already elapsed; an attended booking in
/// the future (possible through data correction) contributes nothing.
pub fn client_stats(
    conn: &Connection,
    period: &str,
    now: DateTime<Utc>,
) -> Result<Vec<ClientPeriodStats>, AppError> {
    let (start, end) = period_range(period, now);
    let clients = queries::list_clients(conn)?;

    let mut stats = Vec::with_capacity(clients.len());
    for client in clients {
        let bookings = queries::priced_bookings_for_client_in_range(
            conn,
            &client.id,
            &client.name,
            &start,
            &end,
        )?;

        let bookings_count = bookings.len();
        let attendance_count = bookings
            .iter()
            .filter(|b| b.status == Some(AttendanceStatus::Arrived))
            .count();
        let attendance_rate = if bookings_count > 0 {
            attendance_count as f64 / bookings_count as f64
        } else {
            0.0
        };
        let total_income: f64 = bookings
            .iter()
            .filter(|b| b.status == Some(AttendanceStatus::Arrived) && b.date < now)
            .map(|b| price_for_slot(&b.time_slot, &b.pricing))
            .sum();

        stats.push(ClientPeriodStats {
            id: client.id,
            name: client.name,
            phone: client.phone,
            bookings_count,
            attendance_count,
            attendance_rate,
            total_income,
        });
    }
    Ok(stats)
}

#[derive(Debug, Serialize)]
pub struct FinancialStats {
    pub total_income: f64,
    pub by_period: Vec<DateIncome>,
    pub by_court: Vec<CourtIncome>,
    pub by_schedule: Vec<HourIncome>,
}

#[derive(Debug, Serialize)]
pub struct DateIncome {
    pub date: String,
    pub income: f64,
}

#[derive(Debug, Serialize)]
pub struct CourtIncome {
    pub court_id: String,
    pub court_name: String,
    pub income: f64,
}

#[derive(Debug, Serialize)]
pub struct HourIncome {
    pub hour: u32,
    pub income: f64,
}

/// Fleet-wide income over attended, already-elapsed bookings in the window,
/// grouped by calendar date, court and slot hour.
pub fn financial_stats(
    conn: &Connection,
    period: &str,
    now: DateTime<Utc>,
) -> Result<FinancialStats, AppError> {
    let (start, end) = period_range(period, now);
    let bookings = queries::attended_bookings_in_range(conn, &start, &end)?;

    let mut total_income = 0.0;
    let mut by_date: BTreeMap<String, f64> = BTreeMap::new();
    let mut by_court: BTreeMap<String, (String, f64)> = BTreeMap::new();
    let mut by_hour: BTreeMap<u32, f64> = BTreeMap::new();

    for booking in &bookings {
        if booking.date >= now {
            continue;
        }

        let price = price_for_slot(&booking.time_slot, &booking.pricing);
        total_income += price;

        *by_date
            .entry(booking.date.format("%Y-%m-%d").to_string())
            .or_insert(0.0) += price;

        let court = by_court
            .entry(booking.court_name.clone())
            .or_insert_with(|| (booking.court_id.clone(), 0.0));
        court.1 += price;

        if let Some(hour) = slot_hour(&booking.time_slot) {
            *by_hour.entry(hour).or_insert(0.0) += price;
        }
    }

    Ok(FinancialStats {
        total_income,
        by_period: by_date
            .into_iter()
            .map(|(date, income)| DateIncome { date, income })
            .collect(),
        by_court: by_court
            .into_iter()
            .map(|(court_name, (court_id, income))| CourtIncome {
                court_id,
                court_name,
                income,
            })
            .collect(),
        by_schedule: by_hour
            .into_iter()
            .map(|(hour, income)| HourIncome { hour, income })
            .collect(),
    })
}

pub struct FinancialRow {
    pub id: String,
    pub date: DateTime<Utc>,
    pub time_slot: String,
    pub client_name: String,
    pub court_name: String,
    pub price: f64,
    pub deposit: f64,
    pub status: String,
}

/// One row per attended, elapsed booking in the window; the detail sheet of
/// the financial export.
pub fn financial_rows(
    conn: &Connection,
    period: &str,
    now: DateTime<Utc>,
) -> Result<Vec<FinancialRow>, AppError> {
    let (start, end) = period_range(period, now);
    let bookings = queries::attended_bookings_in_range(conn, &start, &end)?;

    Ok(bookings
        .into_iter()
        .filter(|b| b.date < now)
        .map(|b| {
            let price = price_for_slot(&b.time_slot, &b.pricing);
            FinancialRow {
                id: b.id,
                date: b.date,
                time_slot: b.time_slot,
                client_name: b.client_name,
                court_name: b.court_name,
                price,
                deposit: b.deposit,
                status: b.status.map(|s| s.as_str().to_string()).unwrap_or_default(),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{Booking, Client, Court, CourtPricing};
    use chrono::{NaiveDateTime, TimeZone};
    use uuid::Uuid;

    fn utc(s: &str) -> DateTime<Utc> {
        Utc.from_utc_datetime(&NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap())
    }

    #[test]
    fn week_window_runs_monday_through_sunday() {
        // 2026-08-07 12:00 local is a Friday; the week is Aug 3 - Aug 9.
        let now = utc("2026-08-07 18:00:00");
        let (start, end) = period_range("week", now);
        assert_eq!(start, utc("2026-08-03 06:00:00"));
        assert_eq!(end, utc("2026-08-10 05:59:59"));
    }

    #[test]
    fn month_window_covers_the_calendar_month() {
        let now = utc("2026-08-07 18:00:00");
        let (start, end) = period_range("month", now);
        assert_eq!(start, utc("2026-08-01 06:00:00"));
        assert_eq!(end, utc("2026-09-01 05:59:59"));
    }

    #[test]
    fn year_window_covers_the_calendar_year() {
        let now = utc("2026-08-07 18:00:00");
        let (start, end) = period_range("year", now);
        assert_eq!(start, utc("2026-01-01 06:00:00"));
        assert_eq!(end, utc("2027-01-01 05:59:59"));
    }

    #[test]
    fn unknown_period_falls_back_to_trailing_week() {
        let now = utc("2026-08-07 18:00:00");
        let (start, end) = period_range("fortnight", now);
        assert_eq!(start, utc("2026-07-31 06:00:00"));
        assert_eq!(end, utc("2026-08-08 05:59:59"));
    }

    #[test]
    fn december_month_window_rolls_the_year() {
        let now = utc("2026-12-15 18:00:00");
        let (start, end) = period_range("month", now);
        assert_eq!(start, utc("2026-12-01 06:00:00"));
        assert_eq!(end, utc("2027-01-01 05:59:59"));
    }

    fn seed_court(conn: &Connection, name: &str) -> Court {
        let court = Court {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            color: "#123456".to_string(),
            is_original: false,
            pricing: CourtPricing {
                six_am: 100.0,
                seven_to_fifteen: 150.0,
                sixteen_to_twenty_one: 200.0,
                twenty_two: 120.0,
                twenty_three: 80.0,
            },
        };
        queries::insert_court(conn, &court).unwrap();
        court
    }

    fn seed_booking(
        conn: &Connection,
        court: &Court,
        client: Option<&Client>,
        date: DateTime<Utc>,
        time_slot: &str,
        status: Option<AttendanceStatus>,
    ) -> Booking {
        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            user_id: "u1".to_string(),
            court_id: court.id.clone(),
            date,
            time_slot: time_slot.to_string(),
            client_id: client.map(|c| c.id.clone()),
            client_name: client.map(|c| c.name.clone()).unwrap_or_else(|| "Walk-in".to_string()),
            deposit: 25.0,
            status,
            is_permanent: false,
            permanent_end_date: None,
            created_at: date,
            updated_at: date,
        };
        queries::insert_booking(conn, &booking).unwrap();
        booking
    }

    #[test]
    fn client_income_counts_only_elapsed_attended_bookings() {
        let conn = db::init_db(":memory:").unwrap();
        let court = seed_court(&conn, "Center");
        let client = Client {
            id: Uuid::new_v4().to_string(),
            name: "Ana".to_string(),
            phone: "555-0001".to_string(),
            bookings: vec![],
        };
        queries::insert_client(&conn, &client).unwrap();

        let now = utc("2026-08-07 18:00:00");
        // Elapsed and attended: counts toward income (09:00 local -> 150).
        seed_booking(&conn, &court, Some(&client), utc("2026-08-01 15:00:00"), "09:00", Some(AttendanceStatus::Arrived));
        // Attended but in the future: attendance counts, income does not.
        seed_booking(&conn, &court, Some(&client), utc("2026-08-20 15:00:00"), "09:00", Some(AttendanceStatus::Arrived));
        // Elapsed but missed: neither.
        seed_booking(&conn, &court, Some(&client), utc("2026-08-02 15:00:00"), "09:00", Some(AttendanceStatus::NotArrived));

        let stats = client_stats(&conn, "year", now).unwrap();
        assert_eq!(stats.len(), 1);
        let ana = &stats[0];
        assert_eq!(ana.bookings_count, 3);
        assert_eq!(ana.attendance_count, 2);
        assert!((ana.attendance_rate - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(ana.total_income, 150.0);
    }

    #[test]
    fn client_stats_match_by_name_when_unlinked() {
        let conn = db::init_db(":memory:").unwrap();
        let court = seed_court(&conn, "Center");
        let client = Client {
            id: Uuid::new_v4().to_string(),
            name: "Ana".to_string(),
            phone: "555-0001".to_string(),
            bookings: vec![],
        };
        queries::insert_client(&conn, &client).unwrap();

        let now = utc("2026-08-07 18:00:00");
        // Client-less booking that carries only the denormalized name.
        let mut booking = seed_booking(
            &conn,
            &court,
            None,
            utc("2026-08-01 15:00:00"),
            "10:00",
            Some(AttendanceStatus::Arrived),
        );
        booking.client_name = "Ana".to_string();
        queries::update_booking(&conn, &booking).unwrap();

        let stats = client_stats(&conn, "year", now).unwrap();
        assert_eq!(stats[0].bookings_count, 1);
        assert_eq!(stats[0].total_income, 150.0);
    }

    #[test]
    fn fleet_stats_group_by_date_court_and_hour() {
        let conn = db::init_db(":memory:").unwrap();
        let center = seed_court(&conn, "Center");
        let north = seed_court(&conn, "North");

        let now = utc("2026-08-07 18:00:00");
        // Two on the same UTC date, different courts and hours.
        seed_booking(&conn, &center, None, utc("2026-08-01 15:00:00"), "09:00", Some(AttendanceStatus::Arrived));
        seed_booking(&conn, &north, None, utc("2026-08-01 23:00:00"), "17:00", Some(AttendanceStatus::Arrived));
        // Attended but future: excluded entirely.
        seed_booking(&conn, &center, None, utc("2026-08-20 15:00:00"), "09:00", Some(AttendanceStatus::Arrived));
        // Missed: excluded.
        seed_booking(&conn, &north, None, utc("2026-08-02 15:00:00"), "09:00", Some(AttendanceStatus::NotArrived));

        let stats = financial_stats(&conn, "year", now).unwrap();
        assert_eq!(stats.total_income, 350.0);

        assert_eq!(stats.by_period.len(), 1);
        assert_eq!(stats.by_period[0].date, "2026-08-01");
        assert_eq!(stats.by_period[0].income, 350.0);

        assert_eq!(stats.by_court.len(), 2);
        let center_row = stats.by_court.iter().find(|c| c.court_name == "Center").unwrap();
        assert_eq!(center_row.income, 150.0);
        let north_row = stats.by_court.iter().find(|c| c.court_name == "North").unwrap();
        assert_eq!(north_row.income, 200.0);

        assert_eq!(stats.by_schedule.len(), 2);
        assert_eq!(stats.by_schedule[0].hour, 9);
        assert_eq!(stats.by_schedule[0].income, 150.0);
        assert_eq!(stats.by_schedule[1].hour, 17);
        assert_eq!(stats.by_schedule[1].income, 200.0);
    }

    #[test]
    fn financial_rows_carry_derived_prices() {
        let conn = db::init_db(":memory:").unwrap();
        let court = seed_court(&conn, "Center");
        let now = utc("2026-08-07 18:00:00");

        seed_booking(&conn, &court, None, utc("2026-08-01 15:00:00"), "09:00", Some(AttendanceStatus::Arrived));
        seed_booking(&conn, &court, None, utc("2026-08-20 15:00:00"), "09:00", Some(AttendanceStatus::Arrived));

        let rows = financial_rows(&conn, "year", now).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].price, 150.0);
        assert_eq!(rows[0].status, "arrived");
    }
}
