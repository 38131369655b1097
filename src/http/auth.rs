use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, State},
    http::{request, StatusCode},
    response::{IntoResponse, Response},
    Json, RequestPartsExt as _,
};
use axum_extra::TypedHeader;
use derive_more::From;
use headers::{authorization::Bearer, Authorization};
use jsonwebtoken::{decode, encode, Header, Validation};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::task;

use crate::{api, db, permission::Actor};

use super::{store_failure, SharedAppState};

#[derive(Deserialize)]
pub(super) struct AuthInput {
    email: String,
    password: String,
}

pub(super) async fn auth(
    State(state): State<SharedAppState>,
    Json(AuthInput { email, password }): Json<AuthInput>,
) -> Result<String, AuthError> {
    use AuthError as E;

    let employee = state
        .store
        .get_employee_by_email(&email)
        .await?
        .filter(|e| !e.disabled)
        .ok_or(E::WrongLoginOrPassword)?;

    let hash = employee.password_hash.clone();
    let verified = task::spawn_blocking(move || hash.verify(&password))
        .await
        .unwrap_or(false);
    if !verified {
        tracing::info!(employee = %employee.id, "rejected login");
        return Err(E::WrongLoginOrPassword);
    }

    let expires_at = OffsetDateTime::now_utc() + state.jwt_expiration_time;
    encode(
        &Header::default(),
        &AuthClaims {
            employee_id: employee.id,
            exp: expires_at.unix_timestamp(),
        },
        &state.jwt_encoding_key,
    )
    .map_err(|_| E::InvalidToken)
}

#[derive(Debug, From)]
pub enum AuthError {
    #[from]
    DbError(db::Error),
    Disabled,
    InvalidToken,
    WrongLoginOrPassword,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            Self::DbError(e) => return store_failure(&e),
            Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::Disabled | Self::WrongLoginOrPassword => {
                StatusCode::FORBIDDEN
            }
        }
        .into_response()
    }
}

pub(super) async fn get_user(
    State(state): State<SharedAppState>,
    actor: Actor,
) -> Result<Json<api::Employee>, AuthError> {
    let me = state
        .store
        .get_employee_by_id(actor.id)
        .await?
        .ok_or(AuthError::InvalidToken)?;
    Ok(Json(api::Employee::from(&me)))
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct AuthClaims {
    employee_id: api::employee::Id,
    exp: i64,
}

#[async_trait]
impl FromRequestParts<SharedAppState> for AuthClaims {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut request::Parts,
        state: &SharedAppState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AuthError::InvalidToken)?;
        let token_data = decode::<Self>(
            bearer.token(),
            &state.jwt_decoding_key,
            &Validation::default(),
        )
        .map_err(|_| AuthError::InvalidToken)?;

        Ok(token_data.claims)
    }
}

/// Identity and role are looked up on every request, so a role change or
/// a disabled account takes effect without waiting for the token to
/// expire.
#[async_trait]
impl FromRequestParts<SharedAppState> for Actor {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut request::Parts,
        state: &SharedAppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = AuthClaims::from_request_parts(parts, state).await?;
        let employee = state
            .store
            .get_employee_by_id(claims.employee_id)
            .await?
            .ok_or(AuthError::InvalidToken)?;
        if employee.disabled {
            return Err(AuthError::Disabled);
        }
        Ok(Actor::from(&employee))
    }
}
