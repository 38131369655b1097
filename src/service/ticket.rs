use derive_more::From;
use itertools::Itertools as _;
use time::OffsetDateTime;

use crate::{
    api,
    db::{
        self, employee,
        ticket::{self, Filter, Kind, Priority, Status},
        Store, Ticket,
    },
    permission::{ensure, Actor, PermissionDenied},
    scope::SubScope,
};

use super::{parse_id, InvalidArgument};

pub const MAX_TITLE_LEN: usize = 120;

pub const MAX_DESCRIPTION_LEN: usize = 2000;

#[derive(Clone, Debug)]
pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub kind: Kind,
    pub priority: Priority,
    pub deadline: Option<OffsetDateTime>,
    /// Service desk may report on behalf of someone else.
    pub reporter: Option<employee::Id>,
}

#[derive(Clone, Debug)]
pub enum Edit {
    Title(String),
    Description(String),
    Kind(Kind),
    Priority(Priority),
    Deadline(Option<OffsetDateTime>),
    Status(Status),
}

#[derive(Debug, From)]
pub enum Error {
    #[from]
    Store(db::Error),
    #[from]
    InvalidArgument(InvalidArgument),
    #[from]
    PermissionDenied(PermissionDenied),
    NotFound,
    EmployeeNotFound(employee::Id),
}

fn validate_title(title: &str) -> Result<String, InvalidArgument> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > MAX_TITLE_LEN {
        return Err(InvalidArgument("title"));
    }
    Ok(title.to_owned())
}

fn validate_description(
    description: &str,
) -> Result<String, InvalidArgument> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(InvalidArgument("description"));
    }
    Ok(description.to_owned())
}

/// Files a new report. Whatever the caller wants, it starts out `Open` and
/// unassigned.
pub async fn create(
    store: &dyn Store,
    actor: &Actor,
    new: NewTicket,
    now: OffsetDateTime,
) -> Result<Ticket, Error> {
    let title = validate_title(&new.title)?;
    let description = validate_description(&new.description)?;

    let reporter = match new.reporter {
        Some(id) if id != actor.id && actor.can_report_for_others() => store
            .get_employee_by_id(id)
            .await?
            .ok_or(InvalidArgument("reporter"))?
            .id,
        _ => actor.id,
    };

    let ticket = Ticket {
        id: ticket::Id::new(),
        title,
        description,
        kind: new.kind,
        priority: new.priority,
        deadline: new.deadline,
        status: Status::Open,
        reporter,
        assignee: None,
        handling: Vec::new(),
        revision: 0,
        created_at: now,
    };
    store.insert_ticket(&ticket).await?;

    tracing::info!(
        ticket = %ticket.id,
        reporter = %ticket.reporter,
        by = %actor.id,
        "ticket reported",
    );
    Ok(ticket)
}

pub async fn get(
    store: &dyn Store,
    actor: &Actor,
    id: &str,
) -> Result<Ticket, Error> {
    let id = parse_id(id, "ticket id")?;
    let ticket = store.find_ticket(id).await?.ok_or(Error::NotFound)?;
    ensure(actor.can_view(&ticket))?;
    Ok(ticket)
}

/// Tickets in the actor's scope, newest first.
pub async fn list(
    store: &dyn Store,
    actor: &Actor,
    sub: SubScope,
) -> Result<Vec<Ticket>, Error> {
    let filter = Filter::new(actor.scope(sub));
    Ok(store.find_tickets(&filter).await?)
}

pub async fn edit(
    store: &dyn Store,
    actor: &Actor,
    id: &str,
    edit: Edit,
) -> Result<Ticket, Error> {
    let id = parse_id(id, "ticket id")?;
    let mut ticket = store.find_ticket(id).await?.ok_or(Error::NotFound)?;
    ensure(actor.can_edit(&ticket))?;

    match edit {
        Edit::Title(title) => ticket.title = validate_title(&title)?,
        Edit::Description(description) => {
            ticket.description = validate_description(&description)?;
        }
        Edit::Kind(kind) => ticket.kind = kind,
        Edit::Priority(priority) => ticket.priority = priority,
        Edit::Deadline(deadline) => ticket.deadline = deadline,
        Edit::Status(status) => {
            tracing::debug!(
                ticket = %ticket.id,
                from = %ticket.status,
                to = %status,
                "status changed",
            );
            ticket.status = status;
        }
    }

    if !store.replace_ticket(&ticket).await? {
        return Err(Error::NotFound);
    }
    store.find_ticket(id).await?.ok_or(Error::NotFound)
}

/// Hard delete. The handling history goes with the ticket.
pub async fn delete(
    store: &dyn Store,
    actor: &Actor,
    id: &str,
) -> Result<(), Error> {
    let id = parse_id(id, "ticket id")?;
    let ticket = store.find_ticket(id).await?.ok_or(Error::NotFound)?;
    ensure(actor.can_delete(&ticket))?;

    if !store.delete_ticket(id).await? {
        return Err(Error::NotFound);
    }
    tracing::info!(ticket = %id, by = %actor.id, "ticket deleted");
    Ok(())
}

/// Resolves reporter and assignee of a single ticket.
pub async fn describe(
    store: &dyn Store,
    ticket: Ticket,
) -> Result<api::Ticket, Error> {
    let ids = ticket
        .assignee
        .into_iter()
        .chain([ticket.reporter])
        .collect::<Vec<_>>();
    let employees = store.get_employees_by_ids(&ids).await?;
    let lookup = |id: employee::Id| {
        employees
            .get(&id)
            .map(api::Employee::from)
            .ok_or(Error::EmployeeNotFound(id))
    };

    Ok(api::Ticket {
        reporter: lookup(ticket.reporter)?,
        assignee: ticket.assignee.map(&lookup).transpose()?,
        handling: ticket.handling.iter().map(Into::into).collect(),
        id: ticket.id,
        title: ticket.title,
        description: ticket.description,
        kind: ticket.kind,
        priority: ticket.priority,
        deadline: ticket.deadline,
        status: ticket.status,
        revision: ticket.revision,
        created_at: ticket.created_at,
    })
}

/// Formats tickets for a list view, with people shown by name.
pub async fn list_items(
    store: &dyn Store,
    tickets: Vec<Ticket>,
) -> Result<api::ticket::List, Error> {
    let ids = tickets
        .iter()
        .map(|t| t.reporter)
        .chain(tickets.iter().filter_map(|t| t.assignee))
        .unique()
        .collect::<Vec<_>>();
    let employees = store.get_employees_by_ids(&ids).await?;
    let name = |id: employee::Id| {
        employees
            .get(&id)
            .map(|e| e.name.clone())
            .ok_or(Error::EmployeeNotFound(id))
    };

    let tickets = tickets
        .into_iter()
        .map(|t| {
            Ok(api::ticket::ListItem {
                reporter_name: name(t.reporter)?,
                assignee_name: t.assignee.map(&name).transpose()?,
                id: t.id,
                title: t.title,
                status: t.status,
                priority: t.priority,
                deadline: t.deadline,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(api::ticket::List {
        total_count: tickets.len(),
        tickets,
    })
}
