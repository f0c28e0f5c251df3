use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Form, Router,
};
use tracing::{error, instrument, warn};

use crate::{
    auth::extractors::AdminSession,
    reservations::{
        dto::{DeleteReservationForm, ReservationForm},
        error::ReservationError,
        services::{cancel_by_ticket, dashboard_summary, edit_reservation, reserve_seat},
    },
    state::AppState,
    views,
};

pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(index))
        .route("/reserve", get(reserve_page).post(reserve))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin_dashboard", get(dashboard).post(delete_reservation))
        .route("/edit/:id", get(edit_page).post(edit))
}

fn status_for(e: &ReservationError) -> StatusCode {
    match e {
        ReservationError::Validation(_) => StatusCode::BAD_REQUEST,
        ReservationError::SeatTaken => StatusCode::CONFLICT,
        ReservationError::NotFound => StatusCode::NOT_FOUND,
        ReservationError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Text shown to the user; storage details stay in the logs.
fn user_message(e: &ReservationError) -> String {
    match e {
        ReservationError::Storage(inner) => {
            error!(error = %inner, "reservation storage error");
            "Database error. Please try again.".to_string()
        }
        other => other.to_string(),
    }
}

fn storage_failure(e: ReservationError) -> Response {
    let msg = user_message(&e);
    (
        status_for(&e),
        views::message_page("Something went wrong", &msg),
    )
        .into_response()
}

#[instrument]
pub async fn index() -> Response {
    views::index_page().into_response()
}

#[instrument]
pub async fn reserve_page() -> Response {
    views::reserve_page(&ReservationForm::default(), None, None).into_response()
}

#[instrument(skip_all)]
pub async fn reserve(State(state): State<AppState>, Form(form): Form<ReservationForm>) -> Response {
    match reserve_seat(state.reservations.as_ref(), &form).await {
        Ok(reservation) => (
            StatusCode::CREATED,
            views::reserve_page(&ReservationForm::default(), None, Some(&reservation)),
        )
            .into_response(),
        Err(e) => {
            if matches!(e, ReservationError::SeatTaken) {
                warn!(row = %form.seat_row, column = %form.seat_col, "seat already reserved");
            }
            let msg = user_message(&e);
            (status_for(&e), views::reserve_page(&form, Some(&msg), None)).into_response()
        }
    }
}

async fn render_dashboard(state: &AppState, notice: Option<&str>) -> Response {
    match dashboard_summary(state.reservations.as_ref()).await {
        Ok(summary) => views::dashboard_page(&summary, notice).into_response(),
        Err(e) => storage_failure(e),
    }
}

#[instrument(skip(state))]
pub async fn dashboard(State(state): State<AppState>, AdminSession(admin): AdminSession) -> Response {
    render_dashboard(&state, None).await
}

#[instrument(skip(state, form))]
pub async fn delete_reservation(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    Form(form): Form<DeleteReservationForm>,
) -> Response {
    let notice = match cancel_by_ticket(state.reservations.as_ref(), &form.e_ticket_number).await {
        Ok(Some(r)) => format!(
            "Reservation deleted: {} (row {}, column {}).",
            r.passenger_name, r.seat_row, r.seat_column
        ),
        Ok(None) => "No reservation found for that e-ticket number.".to_string(),
        Err(e) => return storage_failure(e),
    };
    render_dashboard(&state, Some(&notice)).await
}

#[instrument(skip(state))]
pub async fn edit_page(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    Path(id): Path<i64>,
) -> Response {
    match state.reservations.find_by_id(id).await {
        Ok(Some(r)) => views::edit_page(id, &ReservationForm::from(&r), None).into_response(),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            views::message_page("Not Found", "Reservation not found."),
        )
            .into_response(),
        Err(e) => storage_failure(e),
    }
}

#[instrument(skip(state, form))]
pub async fn edit(
    State(state): State<AppState>,
    AdminSession(admin): AdminSession,
    Path(id): Path<i64>,
    Form(form): Form<ReservationForm>,
) -> Response {
    match edit_reservation(state.reservations.as_ref(), id, &form).await {
        Ok(_) => Redirect::to("/admin_dashboard").into_response(),
        Err(e) => {
            let msg = user_message(&e);
            (status_for(&e), views::edit_page(id, &form, Some(&msg))).into_response()
        }
    }
}
