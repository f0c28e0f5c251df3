use tracing::{info, warn};

use crate::reservations::{
    dto::{DashboardSummary, ReservationForm},
    error::ReservationError,
    repo::ReservationStore,
    repo_types::Reservation,
    ticket::normalize_ticket,
};
use crate::seating::{compute_grid, total_revenue, Seat};

pub const MAX_NAME_LEN: usize = 160;

/// A reservation request that passed form validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidReservation {
    pub passenger_name: String,
    pub seat: Seat,
}

fn parse_coordinate(raw: &str, label: &str) -> Result<i32, ReservationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ReservationError::Validation(format!("{label} is required.")));
    }
    raw.parse::<i32>()
        .map_err(|_| ReservationError::Validation(format!("{label} must be a whole number.")))
}

pub fn validate_form(form: &ReservationForm) -> Result<ValidReservation, ReservationError> {
    let passenger_name = form.passenger_name.as_str();
    if passenger_name.trim().is_empty() {
        return Err(ReservationError::Validation(
            "Passenger name is required.".into(),
        ));
    }
    if passenger_name.chars().count() > MAX_NAME_LEN {
        return Err(ReservationError::Validation(format!(
            "Passenger name must be at most {MAX_NAME_LEN} characters."
        )));
    }

    let row = parse_coordinate(&form.seat_row, "Row")?;
    let column = parse_coordinate(&form.seat_col, "Column")?;
    let seat = Seat::new(row, column)?;

    Ok(ValidReservation {
        passenger_name: passenger_name.to_string(),
        seat,
    })
}

pub async fn reserve_seat(
    store: &dyn ReservationStore,
    form: &ReservationForm,
) -> Result<Reservation, ReservationError> {
    let valid = validate_form(form)?;
    let reservation = store.create(&valid.passenger_name, valid.seat).await?;
    info!(
        id = reservation.id,
        row = reservation.seat_row,
        column = reservation.seat_column,
        "seat reserved"
    );
    Ok(reservation)
}

pub async fn edit_reservation(
    store: &dyn ReservationStore,
    id: i64,
    form: &ReservationForm,
) -> Result<Reservation, ReservationError> {
    let valid = validate_form(form)?;
    let reservation = store.update(id, &valid.passenger_name, valid.seat).await?;
    info!(
        id,
        row = reservation.seat_row,
        column = reservation.seat_column,
        "reservation updated"
    );
    Ok(reservation)
}

/// Deletes by ticket number and returns the removed reservation. Input that
/// cannot be a ticket is treated like an unknown ticket: nothing happens and
/// `None` is returned.
pub async fn cancel_by_ticket(
    store: &dyn ReservationStore,
    raw_ticket: &str,
) -> Result<Option<Reservation>, ReservationError> {
    let Some(ticket) = normalize_ticket(raw_ticket) else {
        warn!("delete requested with malformed ticket");
        return Ok(None);
    };
    let Some(reservation) = store.find_by_ticket(&ticket).await? else {
        info!(%ticket, "delete requested for unknown ticket");
        return Ok(None);
    };
    if !store.delete_by_ticket(&ticket).await? {
        // removed by a concurrent request between the lookup and the delete
        info!(%ticket, "reservation already gone");
        return Ok(None);
    }
    info!(%ticket, id = reservation.id, "reservation deleted");
    Ok(Some(reservation))
}

pub async fn dashboard_summary(
    store: &dyn ReservationStore,
) -> Result<DashboardSummary, ReservationError> {
    let reservations = store.list_all().await?;
    let grid = compute_grid(&reservations);
    let total_revenue = total_revenue(&reservations);
    Ok(DashboardSummary {
        reservations,
        grid,
        total_revenue,
    })
}
