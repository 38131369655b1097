use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::{api, permission::Actor, service::employee};

use super::{store_failure, SharedAppState};

impl IntoResponse for employee::Error {
    fn into_response(self) -> Response {
        match self {
            Self::Store(e) => store_failure(&e),
            Self::PermissionDenied(_) => StatusCode::FORBIDDEN.into_response(),
        }
    }
}

pub(super) async fn list_employees(
    State(state): State<SharedAppState>,
    actor: Actor,
) -> Result<Json<Vec<api::employee::Listing>>, employee::Error> {
    Ok(Json(employee::list(&*state.store, &actor).await?))
}
