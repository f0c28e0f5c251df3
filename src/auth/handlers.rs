use axum::{
    extract::{FromRef, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::LoginForm,
        extractors::{clear_session_cookie, session_cookie},
        jwt::JwtKeys,
        services::authenticate,
    },
    state::AppState,
    views,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/admin_login", get(login_page).post(login))
        .route("/admin_logout", post(logout))
}

#[instrument]
pub async fn login_page() -> Response {
    views::login_page("", None).into_response()
}

#[instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    let username = form.username.trim();
    if username.is_empty() || form.password.is_empty() {
        warn!(%username, "login form incomplete");
        return (
            StatusCode::BAD_REQUEST,
            views::login_page(username, Some("Username and password are required.")),
        )
            .into_response();
    }

    let ok = match authenticate(
        state.admins.as_ref(),
        state.verifier.as_ref(),
        username,
        &form.password,
    )
    .await
    {
        Ok(v) => v,
        Err(e) => {
            error!(error = %e, %username, "authenticate failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                views::login_page(username, Some("Login is unavailable right now.")),
            )
                .into_response();
        }
    };

    if !ok {
        return (
            StatusCode::UNAUTHORIZED,
            views::login_page(username, Some("Incorrect username and/or password.")),
        )
            .into_response();
    }

    let keys = JwtKeys::from_ref(&state);
    let token = match keys.sign(username) {
        Ok(t) => t,
        Err(e) => {
            error!(error = %e, "session sign failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                views::login_page(username, Some("Login is unavailable right now.")),
            )
                .into_response();
        }
    };

    info!(%username, "admin logged in");
    let cookie = session_cookie(&token, keys.ttl.as_secs(), state.config.cookie_secure);
    (
        [(header::SET_COOKIE, cookie)],
        Redirect::to("/admin_dashboard"),
    )
        .into_response()
}

#[instrument]
pub async fn logout() -> Response {
    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Redirect::to("/admin_login"),
    )
        .into_response()
}
