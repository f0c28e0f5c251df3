use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// Reservation record in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Reservation {
    pub id: i64,                    // auto-increment id
    pub passenger_name: String,     // trimmed, 1..=160 chars
    pub seat_row: i32,              // 1..=12
    pub seat_column: i32,           // 1..=4
    pub ticket_number: String,      // unique, never changes after insert
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime, // set by the store on insert
}
