use crate::services::scheduling::business_offset;
use crate::services::statistics::{ClientPeriodStats, FinancialRow};

/// One row per client with their period stats.
pub fn clients_csv(stats: &[ClientPeriodStats]) -> String {
    let mut out = String::from("id,name,phone,total_bookings,attended,attendance_rate,income\n");
    for s in stats {
        out.push_str(&format!(
            "{},{},{},{},{},{:.1}%,{:.2}\n",
            csv_field(&s.id),
            csv_field(&s.name),
            csv_field(&s.phone),
            s.bookings_count,
            s.attendance_count,
            s.attendance_rate * 100.0,
            s.total_income,
        ));
    }
    out
}

/// One row per attended, elapsed booking with its derived price.
pub fn financial_csv(rows: &[FinancialRow]) -> String {
    let mut out = String::from("id,date,time_slot,client,court,price,deposit,status\n");
    for r in rows {
        out.push_str(&format!(
            "{},{},{},{},{},{:.2},{:.2},{}\n",
            csv_field(&r.id),
            r.date.with_timezone(&business_offset()).format("%Y-%m-%d"),
            csv_field(&r.time_slot),
            csv_field(&r.client_name),
            csv_field(&r.court_name),
            r.price,
            r.deposit,
            csv_field(&r.status),
        ));
    }
    out
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDateTime, TimeZone, Utc};

    #[test]
    fn client_sheet_has_header_and_percentage_rate() {
        let stats = vec![ClientPeriodStats {
            id: "c1".to_string(),
            name: "Ana".to_string(),
            phone: "555-0001".to_string(),
            bookings_count: 4,
            attendance_count: 3,
            attendance_rate: 0.75,
            total_income: 450.0,
        }];

        let csv = clients_csv(&stats);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,name,phone,total_bookings,attended,attendance_rate,income"
        );
        assert_eq!(lines.next().unwrap(), "c1,Ana,555-0001,4,3,75.0%,450.00");
    }

    #[test]
    fn fields_with_commas_and_quotes_are_escaped() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn financial_sheet_dates_are_local() {
        let date = Utc.from_utc_datetime(
            &NaiveDateTime::parse_from_str("2026-08-02 03:00:00", "%Y-%m-%d %H:%M:%S").unwrap(),
        );
        let rows = vec![FinancialRow {
            id: "b1".to_string(),
            date, // 21:00 on Aug 1 at the business offset
            time_slot: "21:00".to_string(),
            client_name: "Ana".to_string(),
            court_name: "Center".to_string(),
            price: 200.0,
            deposit: 25.0,
            status: "arrived".to_string(),
        }];

        let csv = financial_csv(&rows);
        assert!(csv.contains("b1,2026-08-01,21:00,Ana,Center,200.00,25.00,arrived"));
    }
}
