//! JSON over HTTP. Handlers stay thin: they authenticate, call into
//! [`crate::service`] and map the outcome to a status code.

mod auth;
mod dashboard;
mod employee;
mod ticket;

use std::{sync::Arc, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use jsonwebtoken::{DecodingKey, EncodingKey};
use tower_http::trace::TraceLayer;

use crate::{config, db};

pub use self::auth::{AuthClaims, AuthError};

pub type SharedAppState = Arc<AppState>;

pub struct AppState {
    store: Arc<dyn db::Store>,

    jwt_expiration_time: Duration,

    jwt_decoding_key: DecodingKey,

    jwt_encoding_key: EncodingKey,
}

impl AppState {
    pub fn new(store: Arc<dyn db::Store>, jwt: &config::Jwt) -> Self {
        Self {
            store,
            jwt_expiration_time: jwt.expiration_time,
            jwt_decoding_key: DecodingKey::from_secret(jwt.secret.as_bytes()),
            jwt_encoding_key: EncodingKey::from_secret(jwt.secret.as_bytes()),
        }
    }
}

pub fn router(state: SharedAppState) -> Router {
    Router::new()
        .route("/auth", post(auth::auth))
        .route("/user", get(auth::get_user))
        .route("/employee", get(employee::list_employees))
        .route("/dashboard", get(dashboard::get_dashboard))
        .route("/search", get(ticket::search_tickets))
        .route("/ticket", get(ticket::list_tickets).post(ticket::add_ticket))
        .route(
            "/ticket/:id",
            get(ticket::get_ticket)
                .patch(ticket::edit_ticket)
                .delete(ticket::delete_ticket),
        )
        .route("/ticket/:id/assign", post(ticket::assign_ticket))
        .route("/ticket/:id/assign-to-me", post(ticket::assign_ticket_to_me))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Logs the store failure and hides it behind a plain 500.
fn store_failure(e: &db::Error) -> Response {
    tracing::error!(error = %e, "store failure");
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}
