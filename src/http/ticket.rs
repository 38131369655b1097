use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use derive_more::From;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    api::{
        self,
        ticket::{parse_deadline, Kind, Priority, Status},
    },
    permission::{Actor, PermissionDenied},
    scope::SubScope,
    service::{
        assignment::{self, Outcome},
        search,
        ticket::{self, Edit, NewTicket},
        InvalidArgument,
    },
};

use super::{store_failure, SharedAppState};

impl IntoResponse for ticket::Error {
    fn into_response(self) -> Response {
        match self {
            Self::Store(e) => return store_failure(&e),
            Self::InvalidArgument(InvalidArgument(field)) => {
                tracing::debug!(field, "invalid argument");
                StatusCode::BAD_REQUEST
            }
            Self::PermissionDenied(PermissionDenied) => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::EmployeeNotFound(id) => {
                tracing::error!(employee = %id, "dangling employee reference");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
        .into_response()
    }
}

#[derive(Deserialize)]
pub(super) struct ScopeInput {
    #[serde(default)]
    scope: SubScope,
}

pub(super) async fn list_tickets(
    State(state): State<SharedAppState>,
    actor: Actor,
    Query(ScopeInput { scope }): Query<ScopeInput>,
) -> Result<Json<api::ticket::List>, ticket::Error> {
    let store = &*state.store;
    let tickets = ticket::list(store, &actor, scope).await?;
    Ok(Json(ticket::list_items(store, tickets).await?))
}

#[derive(Deserialize)]
pub(super) struct SearchInput {
    #[serde(default)]
    q: String,
    #[serde(default)]
    scope: SubScope,
}

pub(super) async fn search_tickets(
    State(state): State<SharedAppState>,
    actor: Actor,
    Query(SearchInput { q, scope }): Query<SearchInput>,
) -> Result<Json<api::ticket::List>, ticket::Error> {
    let store = &*state.store;
    let tickets = search::search(store, &actor, &q, scope).await?;
    Ok(Json(ticket::list_items(store, tickets).await?))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AddTicketInput {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "type")]
    kind: Kind,
    priority: Priority,
    #[serde(default)]
    deadline: Option<String>,
    #[serde(default)]
    reporter_id: Option<api::employee::Id>,
}

pub(super) async fn add_ticket(
    State(state): State<SharedAppState>,
    actor: Actor,
    Json(input): Json<AddTicketInput>,
) -> Result<(StatusCode, Json<api::Ticket>), ticket::Error> {
    let store = &*state.store;
    let new = NewTicket {
        title: input.title,
        description: input.description,
        kind: input.kind,
        priority: input.priority,
        deadline: input.deadline.as_deref().and_then(parse_deadline),
        reporter: input.reporter_id,
    };
    let created =
        ticket::create(store, &actor, new, OffsetDateTime::now_utc()).await?;
    Ok((StatusCode::CREATED, Json(ticket::describe(store, created).await?)))
}

pub(super) async fn get_ticket(
    State(state): State<SharedAppState>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<Json<api::Ticket>, ticket::Error> {
    let store = &*state.store;
    let found = ticket::get(store, &actor, &id).await?;
    Ok(Json(ticket::describe(store, found).await?))
}

#[derive(Deserialize)]
#[serde(content = "data", rename_all = "camelCase", tag = "op")]
pub(super) enum EditTicketInput {
    EditTitle {
        title: String,
    },
    EditDescription {
        description: String,
    },
    SetType {
        #[serde(rename = "type")]
        kind: Kind,
    },
    SetPriority {
        priority: Priority,
    },
    /// Unreadable or missing deadlines clear it.
    SetDeadline {
        #[serde(default)]
        deadline: Option<String>,
    },
    SetStatus {
        status: Status,
    },
}

impl From<EditTicketInput> for Edit {
    fn from(op: EditTicketInput) -> Self {
        use EditTicketInput as Op;

        match op {
            Op::EditTitle { title } => Self::Title(title),
            Op::EditDescription { description } => {
                Self::Description(description)
            }
            Op::SetType { kind } => Self::Kind(kind),
            Op::SetPriority { priority } => Self::Priority(priority),
            Op::SetDeadline { deadline } => {
                Self::Deadline(deadline.as_deref().and_then(parse_deadline))
            }
            Op::SetStatus { status } => Self::Status(status),
        }
    }
}

pub(super) async fn edit_ticket(
    State(state): State<SharedAppState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(op): Json<EditTicketInput>,
) -> Result<Json<api::Ticket>, ticket::Error> {
    let store = &*state.store;
    let edited = ticket::edit(store, &actor, &id, op.into()).await?;
    Ok(Json(ticket::describe(store, edited).await?))
}

pub(super) async fn delete_ticket(
    State(state): State<SharedAppState>,
    actor: Actor,
    Path(id): Path<String>,
) -> Result<StatusCode, ticket::Error> {
    ticket::delete(&*state.store, &actor, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AssignTicketInput {
    assignee_id: String,
    #[serde(default)]
    revision: Option<i64>,
}

#[derive(Default, Deserialize)]
pub(super) struct AssignToMeInput {
    #[serde(default)]
    revision: Option<i64>,
}

pub(super) async fn assign_ticket(
    State(state): State<SharedAppState>,
    actor: Actor,
    Path(id): Path<String>,
    Json(input): Json<AssignTicketInput>,
) -> Result<Json<api::Ticket>, AssignTicketError> {
    let store = &*state.store;
    let outcome = assignment::assign(
        store,
        &actor,
        &id,
        &input.assignee_id,
        input.revision,
        OffsetDateTime::now_utc(),
    )
    .await?;
    respond_assigned(&state, outcome).await
}

pub(super) async fn assign_ticket_to_me(
    State(state): State<SharedAppState>,
    actor: Actor,
    Path(id): Path<String>,
    input: Option<Json<AssignToMeInput>>,
) -> Result<Json<api::Ticket>, AssignTicketError> {
    let Json(input) = input.unwrap_or_default();
    let outcome = assignment::assign_to_self(
        &*state.store,
        &actor,
        &id,
        input.revision,
        OffsetDateTime::now_utc(),
    )
    .await?;
    respond_assigned(&state, outcome).await
}

async fn respond_assigned(
    state: &SharedAppState,
    outcome: Outcome,
) -> Result<Json<api::Ticket>, AssignTicketError> {
    match outcome {
        Outcome::Assigned(assigned) => {
            Ok(Json(ticket::describe(&*state.store, assigned).await?))
        }
        Outcome::NotFound => Err(AssignTicketError::TicketNotFound),
        Outcome::Conflict => Err(AssignTicketError::Conflict),
    }
}

#[derive(Debug, From)]
pub enum AssignTicketError {
    #[from]
    Assignment(assignment::Error),
    #[from]
    Describe(ticket::Error),
    Conflict,
    TicketNotFound,
}

impl IntoResponse for AssignTicketError {
    fn into_response(self) -> Response {
        use assignment::Error as E;

        match self {
            Self::Assignment(E::Store(e)) => return store_failure(&e),
            Self::Assignment(E::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
            Self::Assignment(E::PermissionDenied(_)) => StatusCode::FORBIDDEN,
            Self::Describe(e) => return e.into_response(),
            Self::Conflict => StatusCode::CONFLICT,
            Self::TicketNotFound => StatusCode::NOT_FOUND,
        }
        .into_response()
    }
}
