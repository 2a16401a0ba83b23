use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single court reservation. `date` is the absolute instant of the slot,
/// derived from the calendar date and the slot hour at the business offset
/// (UTC-6). `time_slot` keeps the display form and is the pricing key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub user_id: String,
    pub court_id: String,
    pub date: DateTime<Utc>,
    pub time_slot: String,
    pub client_id: Option<String>,
    pub client_name: String,
    pub deposit: f64,
    pub status: Option<AttendanceStatus>,
    pub is_permanent: bool,
    pub permanent_end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum AttendanceStatus {
    Arrived,
    NotArrived,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Arrived => "arrived",
            AttendanceStatus::NotArrived => "not-arrived",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "arrived" => AttendanceStatus::Arrived,
            _ => AttendanceStatus::NotArrived,
        }
    }
}
