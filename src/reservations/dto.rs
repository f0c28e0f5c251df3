use serde::{Deserialize, Serialize};

use crate::reservations::repo_types::Reservation;
use crate::seating::SeatGrid;

/// Body of `POST /reserve` and `POST /edit/:id`. Fields stay strings so bad input
/// is reported on the form instead of being rejected by the extractor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReservationForm {
    #[serde(default)]
    pub passenger_name: String,
    #[serde(default)]
    pub seat_row: String,
    #[serde(default)]
    pub seat_col: String,
}

impl From<&Reservation> for ReservationForm {
    fn from(r: &Reservation) -> Self {
        Self {
            passenger_name: r.passenger_name.clone(),
            seat_row: r.seat_row.to_string(),
            seat_col: r.seat_column.to_string(),
        }
    }
}

/// Body of `POST /admin_dashboard`.
#[derive(Debug, Deserialize)]
pub struct DeleteReservationForm {
    #[serde(rename = "eTicketNumber", default)]
    pub e_ticket_number: String,
}

/// Everything the admin dashboard shows.
#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub reservations: Vec<Reservation>,
    pub grid: SeatGrid,
    pub total_revenue: i64,
}
