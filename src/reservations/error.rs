use thiserror::Error;

use crate::seating::SeatError;

#[derive(Debug, Error)]
pub enum ReservationError {
    #[error("{0}")]
    Validation(String),
    #[error("This seat is already reserved.")]
    SeatTaken,
    #[error("Reservation not found.")]
    NotFound,
    #[error("Database error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl From<SeatError> for ReservationError {
    fn from(e: SeatError) -> Self {
        ReservationError::Validation(e.to_string())
    }
}
