use chrono::{DateTime, Duration, Months, Utc};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{AttendanceStatus, Booking};
use crate::services::scheduling::business_offset;

const SERIES_WEEKS: i64 = 52;

pub struct ActivationOutcome {
    pub created: usize,
    pub end_date: DateTime<Utc>,
}

pub struct DeactivationOutcome {
    pub kept: usize,
    pub removed: usize,
}

/// Turns a booking into the anchor of a weekly series: one occurrence per
/// week for the next 52 weeks at the same court, slot and time of day.
/// Occurrences that would collide with an existing booking at the same
/// (court, instant, slot) are skipped, which also makes re-activation
/// idempotent. The whole expansion commits or rolls back as one unit.
pub fn activate(
    conn: &mut Connection,
    booking: &Booking,
    now: DateTime<Utc>,
) -> Result<ActivationOutcome, AppError> {
    let end_date = now + Months::new(12);
    let tx = conn.transaction()?;

    let mut new_ids: Vec<String> = Vec::new();
    for week in 1..=SERIES_WEEKS {
        let occurrence_date = booking.date + Duration::days(7 * week);

        if queries::booking_exists_at(&tx, &booking.court_id, &occurrence_date, &booking.time_slot)? {
            continue;
        }

        let occurrence = Booking {
            id: Uuid::new_v4().to_string(),
            user_id: booking.user_id.clone(),
            court_id: booking.court_id.clone(),
            date: occurrence_date,
            time_slot: booking.time_slot.clone(),
            client_id: booking.client_id.clone(),
            client_name: booking.client_name.clone(),
            deposit: booking.deposit,
            status: Some(AttendanceStatus::NotArrived),
            is_permanent: true,
            permanent_end_date: Some(end_date),
            created_at: now,
            updated_at: now,
        };
        queries::insert_booking(&tx, &occurrence)?;
        new_ids.push(occurrence.id);
    }

    if let Some(client_id) = &booking.client_id {
        for id in &new_ids {
            queries::add_client_booking(&tx, client_id, id)?;
        }
    }

    queries::set_permanence(&tx, &booking.id, true, Some(&end_date), &now)?;

    tx.commit()?;
    Ok(ActivationOutcome {
        created: new_ids.len(),
        end_date,
    })
}

/// Collapses the series the given booking belongs to, splitting on its local
/// calendar date: occurrences on or before stay as ordinary bookings, later
/// occurrences are erased (and unlinked from their client). The series
/// cannot be resumed afterwards from the same anchor.
///
/// Membership is matched by client name, not client id: renaming a client
/// mid-series leaves the renamed part behind.
pub fn deactivate(
    conn: &mut Connection,
    booking: &Booking,
    now: DateTime<Utc>,
) -> Result<DeactivationOutcome, AppError> {
    let offset = business_offset();
    let anchor_date = booking.date.with_timezone(&offset).date_naive();

    let tx = conn.transaction()?;
    let series = queries::permanent_series(
        &tx,
        &booking.court_id,
        &booking.time_slot,
        &booking.client_name,
    )?;

    let mut kept = 0usize;
    let mut removed = 0usize;
    for member in &series {
        let member_date = member.date.with_timezone(&offset).date_naive();
        if member_date <= anchor_date {
            queries::set_permanence(&tx, &member.id, false, None, &now)?;
            kept += 1;
        } else {
            if let Some(client_id) = &member.client_id {
                queries::remove_client_booking(&tx, client_id, &member.id)?;
            }
            queries::delete_booking(&tx, &member.id)?;
            removed += 1;
        }
    }

    tx.commit()?;
    Ok(DeactivationOutcome { kept, removed })
}
