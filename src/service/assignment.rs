//! Moving tickets between service-desk employees.
//!
//! The current assignee says who owns a ticket now; the handling history
//! records everyone who ever owned it. Both change together, in a single
//! store operation guarded by the ticket revision.

use derive_more::From;
use time::OffsetDateTime;

use crate::{
    db::{
        self, employee,
        ticket::{self, Assignment},
        Store, Ticket,
    },
    permission::{ensure, Actor, PermissionDenied},
};

use super::{parse_id, InvalidArgument};

#[derive(Clone, Debug)]
pub enum Outcome {
    Assigned(Ticket),
    NotFound,
    /// Someone else changed the ticket first.
    Conflict,
}

impl Outcome {
    pub fn is_assigned(&self) -> bool {
        matches!(self, Self::Assigned(_))
    }
}

#[derive(Debug, From)]
pub enum Error {
    #[from]
    Store(db::Error),
    #[from]
    InvalidArgument(InvalidArgument),
    #[from]
    PermissionDenied(PermissionDenied),
}

/// Hands the ticket to `assignee_id`.
///
/// With `expected_revision` set, the assignment only happens if the ticket
/// is still at that revision; otherwise the revision read here is used.
pub async fn assign(
    store: &dyn Store,
    actor: &Actor,
    ticket_id: &str,
    assignee_id: &str,
    expected_revision: Option<i64>,
    now: OffsetDateTime,
) -> Result<Outcome, Error> {
    let ticket_id = parse_id(ticket_id, "ticket id")?;
    let assignee_id = parse_id(assignee_id, "assignee id")?;
    assign_parsed(store, actor, ticket_id, assignee_id, expected_revision, now)
        .await
}

/// Service desk claiming a ticket for themselves.
pub async fn assign_to_self(
    store: &dyn Store,
    actor: &Actor,
    ticket_id: &str,
    expected_revision: Option<i64>,
    now: OffsetDateTime,
) -> Result<Outcome, Error> {
    let ticket_id = parse_id(ticket_id, "ticket id")?;
    assign_parsed(store, actor, ticket_id, actor.id, expected_revision, now)
        .await
}

async fn assign_parsed(
    store: &dyn Store,
    actor: &Actor,
    ticket_id: ticket::Id,
    assignee_id: employee::Id,
    expected_revision: Option<i64>,
    now: OffsetDateTime,
) -> Result<Outcome, Error> {
    ensure(actor.can_assign())?;

    let assignee = store
        .get_employee_by_id(assignee_id)
        .await?
        .filter(|e| !e.disabled)
        .ok_or(InvalidArgument("assignee id"))?;

    let Some(ticket) = store.find_ticket(ticket_id).await? else {
        return Ok(Outcome::NotFound);
    };
    let revision = expected_revision.unwrap_or(ticket.revision);

    match store
        .assign_ticket(ticket_id, revision, assignee.id, now)
        .await?
    {
        Assignment::Assigned => {
            tracing::info!(
                ticket = %ticket_id,
                assignee = %assignee.id,
                by = %actor.id,
                "ticket assigned",
            );
            Ok(store
                .find_ticket(ticket_id)
                .await?
                .map_or(Outcome::NotFound, Outcome::Assigned))
        }
        Assignment::NotFound => Ok(Outcome::NotFound),
        Assignment::Conflict => {
            tracing::warn!(
                ticket = %ticket_id,
                expected_revision = revision,
                "assignment lost a race",
            );
            Ok(Outcome::Conflict)
        }
    }
}
