use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use rusqlite::{params, Connection};

use crate::errors::AppError;
use crate::models::{AttendanceStatus, Booking, Client, Court, CourtPricing, LogEntry, Role, User};

pub const DATE_FMT: &str = "%Y-%m-%d %H:%M:%S";

pub fn fmt_utc(dt: &DateTime<Utc>) -> String {
    dt.format(DATE_FMT).to_string()
}

fn parse_utc(s: &str) -> DateTime<Utc> {
    NaiveDateTime::parse_from_str(s, DATE_FMT)
        .map(|n| Utc.from_utc_datetime(&n))
        .unwrap_or_else(|_| Utc::now())
}

// ── Users ──

fn user_from_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
    let role: String = row.get(4)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        role: Role::parse(&role),
    })
}

pub fn insert_user(conn: &Connection, user: &User) -> Result<(), AppError> {
    conn.execute(
        "INSERT INTO users (id, name, email, password, role) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![user.id, user.name, user.email, user.password, user.role.as_str()],
    )?;
    Ok(())
}

pub fn find_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, AppError> {
    let result = conn.query_row(
        "SELECT id, name, email, password, role FROM users WHERE email = ?1",
        params![email],
        user_from_row,
    );

    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn find_user_by_id(conn: &Connection, id: &str) -> Result<Option<User>, AppError> {
    let result = conn.query_row(
        "SELECT id, name, email, password, role FROM users WHERE id = ?1",
        params![id],
        user_from_row,
    );

    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>, AppError> {
    let mut stmt =
        conn.prepare("SELECT id, name, email, password, role FROM users ORDER BY name ASC")?;
    let rows = stmt.query_map([], user_from_row)?;

    let mut users = vec![];
    for row in rows {
        users.push(row?);
    }
    Ok(users)
}

pub fn update_user(conn: &Connection, user: &User) -> Result<(), AppError> {
    conn.execute(
        "UPDATE users SET name = ?1, email = ?2, password = ?3, role = ?4 WHERE id = ?5",
        params![user.name, user.email, user.password, user.role.as_str(), user.id],
    )?;
    Ok(())
}

pub fn delete_user(conn: &Connection, id: &str) -> Result<bool, AppError> {
    let count = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Sessions ──

pub fn insert_session(
    conn: &Connection,
    token: &str,
    user_id: &str,
    expires_at: &DateTime<Utc>,
) -> Result<(), AppError> {
    conn.execute(
        "INSERT INTO sessions (token, user_id, expires_at) VALUES (?1, ?2, ?3)",
        params![token, user_id, fmt_utc(expires_at)],
    )?;
    Ok(())
}

pub fn user_for_session(
    conn: &Connection,
    token: &str,
    now: &DateTime<Utc>,
) -> Result<Option<User>, AppError> {
    let result = conn.query_row(
        "SELECT u.id, u.name, u.email, u.password, u.role
         FROM sessions s
         INNER JOIN users u ON u.id = s.user_id
         WHERE s.token = ?1 AND s.expires_at > ?2",
        params![token, fmt_utc(now)],
        user_from_row,
    );

    match result {
        Ok(user) => Ok(Some(user)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn clear_expired_sessions(conn: &Connection, now: &DateTime<Utc>) -> Result<usize, AppError> {
    let count = conn.execute(
        "DELETE FROM sessions WHERE expires_at <= ?1",
        params![fmt_utc(now)],
    )?;
    Ok(count)
}

// ── Courts ──

fn court_from_row(row: &rusqlite::Row) -> rusqlite::Result<Court> {
    Ok(Court {
        id: row.get(0)?,
        name: row.get(1)?,
        color: row.get(2)?,
        is_original: row.get::<_, i32>(3)? != 0,
        pricing: CourtPricing {
            six_am: row.get(4)?,
            seven_to_fifteen: row.get(5)?,
            sixteen_to_twenty_one: row.get(6)?,
            twenty_two: row.get(7)?,
            twenty_three: row.get(8)?,
        },
    })
}

const COURT_COLS: &str = "id, name, color, is_original, price_six_am, price_seven_to_fifteen, \
                          price_sixteen_to_twenty_one, price_twenty_two, price_twenty_three";

pub fn insert_court(conn: &Connection, court: &Court) -> Result<(), AppError> {
    conn.execute(
        "INSERT INTO courts (id, name, color, is_original, price_six_am, price_seven_to_fifteen,
                             price_sixteen_to_twenty_one, price_twenty_two, price_twenty_three)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            court.id,
            court.name,
            court.color,
            court.is_original as i32,
            court.pricing.six_am,
            court.pricing.seven_to_fifteen,
            court.pricing.sixteen_to_twenty_one,
            court.pricing.twenty_two,
            court.pricing.twenty_three,
        ],
    )?;
    Ok(())
}

pub fn find_court(conn: &Connection, id: &str) -> Result<Option<Court>, AppError> {
    let result = conn.query_row(
        &format!("SELECT {COURT_COLS} FROM courts WHERE id = ?1"),
        params![id],
        court_from_row,
    );

    match result {
        Ok(court) => Ok(Some(court)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_courts(conn: &Connection, is_original: bool) -> Result<Vec<Court>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COURT_COLS} FROM courts WHERE is_original = ?1 ORDER BY name ASC"
    ))?;
    let rows = stmt.query_map(params![is_original as i32], court_from_row)?;

    let mut courts = vec![];
    for row in rows {
        courts.push(row?);
    }
    Ok(courts)
}

pub fn update_court(conn: &Connection, court: &Court) -> Result<(), AppError> {
    conn.execute(
        "UPDATE courts SET name = ?1, color = ?2, price_six_am = ?3, price_seven_to_fifteen = ?4,
                           price_sixteen_to_twenty_one = ?5, price_twenty_two = ?6,
                           price_twenty_three = ?7
         WHERE id = ?8",
        params![
            court.name,
            court.color,
            court.pricing.six_am,
            court.pricing.seven_to_fifteen,
            court.pricing.sixteen_to_twenty_one,
            court.pricing.twenty_two,
            court.pricing.twenty_three,
            court.id,
        ],
    )?;
    Ok(())
}

pub fn delete_court(conn: &Connection, id: &str) -> Result<bool, AppError> {
    let count = conn.execute("DELETE FROM courts WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Clients ──

pub fn insert_client(conn: &Connection, client: &Client) -> Result<(), AppError> {
    conn.execute(
        "INSERT INTO clients (id, name, phone) VALUES (?1, ?2, ?3)",
        params![client.id, client.name, client.phone],
    )?;
    Ok(())
}

fn client_record(conn: &Connection, id: String, name: String, phone: String) -> Result<Client, AppError> {
    let bookings = client_booking_ids(conn, &id)?;
    Ok(Client {
        id,
        name,
        phone,
        bookings,
    })
}

pub fn find_client(conn: &Connection, id: &str) -> Result<Option<Client>, AppError> {
    let result = conn.query_row(
        "SELECT id, name, phone FROM clients WHERE id = ?1",
        params![id],
        |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?)),
    );

    match result {
        Ok((id, name, phone)) => Ok(Some(client_record(conn, id, name, phone)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn find_client_by_name(conn: &Connection, name: &str) -> Result<Option<Client>, AppError> {
    let result = conn.query_row(
        "SELECT id, name, phone FROM clients WHERE name = ?1",
        params![name],
        |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?)),
    );

    match result {
        Ok((id, name, phone)) => Ok(Some(client_record(conn, id, name, phone)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_clients(conn: &Connection) -> Result<Vec<Client>, AppError> {
    let mut stmt = conn.prepare("SELECT id, name, phone FROM clients ORDER BY name ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
    })?;

    let mut clients = vec![];
    for row in rows {
        let (id, name, phone) = row?;
        clients.push(client_record(conn, id, name, phone)?);
    }
    Ok(clients)
}

pub fn update_client(conn: &Connection, id: &str, name: &str, phone: &str) -> Result<bool, AppError> {
    let count = conn.execute(
        "UPDATE clients SET name = ?1, phone = ?2 WHERE id = ?3",
        params![name, phone, id],
    )?;
    Ok(count > 0)
}

/// Removes the client record together with its booking list. Bookings that
/// reference the client keep their now-dangling `client_id`.
pub fn delete_client(conn: &Connection, id: &str) -> Result<bool, AppError> {
    conn.execute("DELETE FROM client_bookings WHERE client_id = ?1", params![id])?;
    let count = conn.execute("DELETE FROM clients WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Client booking links ──

pub fn client_booking_ids(conn: &Connection, client_id: &str) -> Result<Vec<String>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT booking_id FROM client_bookings WHERE client_id = ?1 ORDER BY rowid ASC",
    )?;
    let rows = stmt.query_map(params![client_id], |row| row.get::<_, String>(0))?;

    let mut ids = vec![];
    for row in rows {
        ids.push(row?);
    }
    Ok(ids)
}

pub fn add_client_booking(conn: &Connection, client_id: &str, booking_id: &str) -> Result<(), AppError> {
    conn.execute(
        "INSERT OR IGNORE INTO client_bookings (client_id, booking_id) VALUES (?1, ?2)",
        params![client_id, booking_id],
    )?;
    Ok(())
}

pub fn remove_client_booking(
    conn: &Connection,
    client_id: &str,
    booking_id: &str,
) -> Result<(), AppError> {
    conn.execute(
        "DELETE FROM client_bookings WHERE client_id = ?1 AND booking_id = ?2",
        params![client_id, booking_id],
    )?;
    Ok(())
}

// ── Bookings ──

const BOOKING_COLS: &str = "id, user_id, court_id, date, time_slot, client_id, client_name, \
                            deposit, status, is_permanent, permanent_end_date, created_at, updated_at";

fn booking_from_row(row: &rusqlite::Row) -> rusqlite::Result<Booking> {
    let date: String = row.get(3)?;
    let status: Option<String> = row.get(8)?;
    let permanent_end: Option<String> = row.get(10)?;
    let created_at: String = row.get(11)?;
    let updated_at: String = row.get(12)?;

    Ok(Booking {
        id: row.get(0)?,
        user_id: row.get(1)?,
        court_id: row.get(2)?,
        date: parse_utc(&date),
        time_slot: row.get(4)?,
        client_id: row.get(5)?,
        client_name: row.get(6)?,
        deposit: row.get(7)?,
        status: status.as_deref().map(AttendanceStatus::parse),
        is_permanent: row.get::<_, i32>(9)? != 0,
        permanent_end_date: permanent_end.as_deref().map(parse_utc),
        created_at: parse_utc(&created_at),
        updated_at: parse_utc(&updated_at),
    })
}

pub fn insert_booking(conn: &Connection, booking: &Booking) -> Result<(), AppError> {
    conn.execute(
        "INSERT INTO bookings (id, user_id, court_id, date, time_slot, client_id, client_name,
                               deposit, status, is_permanent, permanent_end_date, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            booking.id,
            booking.user_id,
            booking.court_id,
            fmt_utc(&booking.date),
            booking.time_slot,
            booking.client_id,
            booking.client_name,
            booking.deposit,
            booking.status.map(|s| s.as_str()),
            booking.is_permanent as i32,
            booking.permanent_end_date.as_ref().map(fmt_utc),
            fmt_utc(&booking.created_at),
            fmt_utc(&booking.updated_at),
        ],
    )?;
    Ok(())
}

pub fn find_booking(conn: &Connection, id: &str) -> Result<Option<Booking>, AppError> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLS} FROM bookings WHERE id = ?1"),
        params![id],
        booking_from_row,
    );

    match result {
        Ok(booking) => Ok(Some(booking)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn bookings_for_court(conn: &Connection, court_id: &str) -> Result<Vec<Booking>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLS} FROM bookings WHERE court_id = ?1 ORDER BY date ASC"
    ))?;
    let rows = stmt.query_map(params![court_id], booking_from_row)?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

pub fn bookings_for_court_in_range(
    conn: &Connection,
    court_id: &str,
    start: &DateTime<Utc>,
    end: &DateTime<Utc>,
) -> Result<Vec<Booking>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLS} FROM bookings
         WHERE court_id = ?1 AND date >= ?2 AND date <= ?3
         ORDER BY date ASC"
    ))?;
    let rows = stmt.query_map(
        params![court_id, fmt_utc(start), fmt_utc(end)],
        booking_from_row,
    )?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

pub fn update_booking(conn: &Connection, booking: &Booking) -> Result<(), AppError> {
    conn.execute(
        "UPDATE bookings SET client_id = ?1, client_name = ?2, deposit = ?3, status = ?4,
                             updated_at = ?5
         WHERE id = ?6",
        params![
            booking.client_id,
            booking.client_name,
            booking.deposit,
            booking.status.map(|s| s.as_str()),
            fmt_utc(&booking.updated_at),
            booking.id,
        ],
    )?;
    Ok(())
}

pub fn delete_booking(conn: &Connection, id: &str) -> Result<bool, AppError> {
    let count = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

pub fn booking_exists_at(
    conn: &Connection,
    court_id: &str,
    date: &DateTime<Utc>,
    time_slot: &str,
) -> Result<bool, AppError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE court_id = ?1 AND date = ?2 AND time_slot = ?3",
        params![court_id, fmt_utc(date), time_slot],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// All members of a recurring series. Matching is by client name, so a
/// client renamed mid-series will split the series; documented behavior.
pub fn permanent_series(
    conn: &Connection,
    court_id: &str,
    time_slot: &str,
    client_name: &str,
) -> Result<Vec<Booking>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLS} FROM bookings
         WHERE court_id = ?1 AND time_slot = ?2 AND client_name = ?3 AND is_permanent = 1
         ORDER BY date ASC"
    ))?;
    let rows = stmt.query_map(params![court_id, time_slot, client_name], booking_from_row)?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

pub fn set_permanence(
    conn: &Connection,
    id: &str,
    is_permanent: bool,
    end_date: Option<&DateTime<Utc>>,
    now: &DateTime<Utc>,
) -> Result<(), AppError> {
    conn.execute(
        "UPDATE bookings SET is_permanent = ?1, permanent_end_date = ?2, updated_at = ?3 WHERE id = ?4",
        params![is_permanent as i32, end_date.map(fmt_utc), fmt_utc(now), id],
    )?;
    Ok(())
}

// ── Priced bookings (statistics) ──

/// A booking joined with its court's rate table, the unit the statistics
/// aggregator works over.
pub struct PricedBooking {
    pub id: String,
    pub date: DateTime<Utc>,
    pub time_slot: String,
    pub client_name: String,
    pub deposit: f64,
    pub status: Option<AttendanceStatus>,
    pub court_id: String,
    pub court_name: String,
    pub pricing: CourtPricing,
}

const PRICED_COLS: &str = "b.id, b.date, b.time_slot, b.client_name, b.deposit, b.status, \
                           c.id, c.name, c.price_six_am, c.price_seven_to_fifteen, \
                           c.price_sixteen_to_twenty_one, c.price_twenty_two, c.price_twenty_three";

fn priced_from_row(row: &rusqlite::Row) -> rusqlite::Result<PricedBooking> {
    let date: String = row.get(1)?;
    let status: Option<String> = row.get(5)?;

    Ok(PricedBooking {
        id: row.get(0)?,
        date: parse_utc(&date),
        time_slot: row.get(2)?,
        client_name: row.get(3)?,
        deposit: row.get(4)?,
        status: status.as_deref().map(AttendanceStatus::parse),
        court_id: row.get(6)?,
        court_name: row.get(7)?,
        pricing: CourtPricing {
            six_am: row.get(8)?,
            seven_to_fifteen: row.get(9)?,
            sixteen_to_twenty_one: row.get(10)?,
            twenty_two: row.get(11)?,
            twenty_three: row.get(12)?,
        },
    })
}

/// A client's bookings inside a window, by reference or by denormalized name.
pub fn priced_bookings_for_client_in_range(
    conn: &Connection,
    client_id: &str,
    client_name: &str,
    start: &DateTime<Utc>,
    end: &DateTime<Utc>,
) -> Result<Vec<PricedBooking>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PRICED_COLS}
         FROM bookings b
         INNER JOIN courts c ON c.id = b.court_id
         WHERE (b.client_id = ?1 OR b.client_name = ?2) AND b.date >= ?3 AND b.date <= ?4
         ORDER BY b.date ASC"
    ))?;
    let rows = stmt.query_map(
        params![client_id, client_name, fmt_utc(start), fmt_utc(end)],
        priced_from_row,
    )?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

pub fn attended_bookings_in_range(
    conn: &Connection,
    start: &DateTime<Utc>,
    end: &DateTime<Utc>,
) -> Result<Vec<PricedBooking>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PRICED_COLS}
         FROM bookings b
         INNER JOIN courts c ON c.id = b.court_id
         WHERE b.date >= ?1 AND b.date <= ?2 AND b.status = 'arrived'
         ORDER BY b.date ASC"
    ))?;
    let rows = stmt.query_map(params![fmt_utc(start), fmt_utc(end)], priced_from_row)?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

/// Lifetime aggregate for one client, via the store's grouping primitive.
pub struct ClientAggregate {
    pub total_bookings: i64,
    pub arrived_bookings: i64,
    pub total_deposit: f64,
    pub avg_deposit: f64,
    pub last_booking: Option<DateTime<Utc>>,
}

pub fn client_aggregate(
    conn: &Connection,
    client_id: &str,
    client_name: &str,
) -> Result<ClientAggregate, AppError> {
    let (total, arrived, total_deposit, avg_deposit, last): (i64, i64, f64, f64, Option<String>) =
        conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN status = 'arrived' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(deposit), 0),
                    COALESCE(AVG(deposit), 0),
                    MAX(date)
             FROM bookings
             WHERE client_id = ?1 OR client_name = ?2",
            params![client_id, client_name],
            |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            },
        )?;

    Ok(ClientAggregate {
        total_bookings: total,
        arrived_bookings: arrived,
        total_deposit,
        avg_deposit,
        last_booking: last.as_deref().map(parse_utc),
    })
}

/// A client's bookings with their court names, newest first.
pub fn client_bookings_with_court(
    conn: &Connection,
    client_id: &str,
    client_name: &str,
) -> Result<Vec<(Booking, String)>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLS_PREFIXED}, c.name
         FROM bookings b
         INNER JOIN courts c ON c.id = b.court_id
         WHERE b.client_id = ?1 OR b.client_name = ?2
         ORDER BY b.date DESC"
    ))?;
    let rows = stmt.query_map(params![client_id, client_name], |row| {
        let booking = booking_from_row(row)?;
        let court_name: String = row.get(13)?;
        Ok((booking, court_name))
    })?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

const BOOKING_COLS_PREFIXED: &str = "b.id, b.user_id, b.court_id, b.date, b.time_slot, \
                                     b.client_id, b.client_name, b.deposit, b.status, \
                                     b.is_permanent, b.permanent_end_date, b.created_at, b.updated_at";

// ── Logs ──

pub fn insert_log(conn: &Connection, user: &str, action: &str) -> Result<(), AppError> {
    conn.execute(
        "INSERT INTO logs (user, action, created_at) VALUES (?1, ?2, ?3)",
        params![user, action, fmt_utc(&Utc::now())],
    )?;
    Ok(())
}

pub fn list_logs(conn: &Connection) -> Result<Vec<LogEntry>, AppError> {
    let mut stmt =
        conn.prepare("SELECT id, user, action, created_at FROM logs ORDER BY id DESC")?;
    let rows = stmt.query_map([], |row| {
        let created_at: String = row.get(3)?;
        Ok(LogEntry {
            id: row.get(0)?,
            user: row.get(1)?,
            action: row.get(2)?,
            created_at: parse_utc(&created_at),
        })
    })?;

    let mut logs = vec![];
    for row in rows {
        logs.push(row?);
    }
    Ok(logs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use uuid::Uuid;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn sample_client(name: &str, phone: &str) -> Client {
        Client {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            phone: phone.to_string(),
            bookings: vec![],
        }
    }

    #[test]
    fn duplicate_client_name_is_a_conflict_on_name() {
        let conn = setup_db();
        insert_client(&conn, &sample_client("Ana", "555-0001")).unwrap();

        let err = insert_client(&conn, &sample_client("Ana", "555-0002")).unwrap_err();
        match err {
            AppError::Conflict { field } => assert_eq!(field, "name"),
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_client_phone_is_a_conflict_on_phone() {
        let conn = setup_db();
        insert_client(&conn, &sample_client("Ana", "555-0001")).unwrap();

        let err = insert_client(&conn, &sample_client("Bea", "555-0001")).unwrap_err();
        match err {
            AppError::Conflict { field } => assert_eq!(field, "phone"),
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[test]
    fn conflicting_update_leaves_both_records_untouched() {
        let conn = setup_db();
        let ana = sample_client("Ana", "555-0001");
        let bea = sample_client("Bea", "555-0002");
        insert_client(&conn, &ana).unwrap();
        insert_client(&conn, &bea).unwrap();

        let err = update_client(&conn, &bea.id, "Ana", "555-0002").unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));

        let bea_after = find_client(&conn, &bea.id).unwrap().unwrap();
        assert_eq!(bea_after.name, "Bea");
        let ana_after = find_client(&conn, &ana.id).unwrap().unwrap();
        assert_eq!(ana_after.phone, "555-0001");
    }

    #[test]
    fn client_booking_links_behave_as_a_set() {
        let conn = setup_db();
        let client = sample_client("Ana", "555-0001");
        insert_client(&conn, &client).unwrap();

        add_client_booking(&conn, &client.id, "b1").unwrap();
        add_client_booking(&conn, &client.id, "b2").unwrap();
        add_client_booking(&conn, &client.id, "b1").unwrap();

        assert_eq!(client_booking_ids(&conn, &client.id).unwrap(), vec!["b1", "b2"]);

        remove_client_booking(&conn, &client.id, "b1").unwrap();
        assert_eq!(client_booking_ids(&conn, &client.id).unwrap(), vec!["b2"]);
    }

    #[test]
    fn client_aggregate_empty_is_zeroed() {
        let conn = setup_db();
        let stats = client_aggregate(&conn, "nope", "Nobody").unwrap();
        assert_eq!(stats.total_bookings, 0);
        assert_eq!(stats.arrived_bookings, 0);
        assert_eq!(stats.total_deposit, 0.0);
        assert_eq!(stats.avg_deposit, 0.0);
        assert!(stats.last_booking.is_none());
    }
}
