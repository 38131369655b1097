use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use derive_more::From;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    api, db, permission::Actor, scope::SubScope, service::dashboard,
};

use super::{store_failure, SharedAppState};

#[derive(Deserialize)]
pub(super) struct DashboardInput {
    #[serde(default)]
    scope: SubScope,
}

pub(super) async fn get_dashboard(
    State(state): State<SharedAppState>,
    actor: Actor,
    Query(DashboardInput { scope }): Query<DashboardInput>,
) -> Result<Json<api::Dashboard>, DashboardError> {
    let snapshot = dashboard::snapshot(
        &*state.store,
        actor.scope(scope),
        OffsetDateTime::now_utc(),
    )
    .await?;
    Ok(Json(snapshot))
}

#[derive(Debug, From)]
pub enum DashboardError {
    #[from]
    DbError(db::Error),
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        match self {
            Self::DbError(e) => store_failure(&e),
        }
    }
}
