pub mod auth;
pub mod bookings;
pub mod clients;
pub mod courts;
pub mod health;
pub mod logs;
pub mod stats;
pub mod users;
