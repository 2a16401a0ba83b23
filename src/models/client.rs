use serde::{Deserialize, Serialize};

/// `bookings` mirrors the set of bookings whose `client_id` points here; it
/// is maintained on every booking create/update/delete and permanence change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub bookings: Vec<String>,
}
