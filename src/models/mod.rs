pub mod booking;
pub mod client;
pub mod court;
pub mod log;
pub mod user;

pub use booking::{AttendanceStatus, Booking};
pub use client::Client;
pub use court::{Court, CourtPricing};
pub use log::LogEntry;
pub use user::{Role, User};
