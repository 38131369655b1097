use std::{collections::HashMap, error::Error as StdError, str::FromStr};

use async_trait::async_trait;
use derive_more::Display;
use enum_utils::TryFromRepr;
use itertools::Itertools as _;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio_postgres::{
    types::{
        accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql,
        Type,
    },
    Row,
};
use uuid::Uuid;

use crate::scope::Scope;

use super::{employee, Client, Error, Tickets};

#[derive(Clone, Debug)]
pub struct Ticket {
    pub id: Id,
    pub title: String,
    pub description: String,
    pub kind: Kind,
    pub priority: Priority,
    pub deadline: Option<OffsetDateTime>,
    pub status: Status,
    pub reporter: employee::Id,
    pub assignee: Option<employee::Id>,
    pub handling: Vec<Handling>,
    pub revision: i64,
    pub created_at: OffsetDateTime,
}

/// Entry of the append-only audit trail of who worked a ticket.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Handling {
    pub employee: employee::Id,
    pub at: OffsetDateTime,
}

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    Hash,
    PartialEq,
    Serialize,
)]
pub struct Id(Uuid);

impl Id {
    pub fn new() -> Self {
        Id(Uuid::new_v4())
    }
}

impl From<u128> for Id {
    fn from(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }
}

impl FromStr for Id {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl FromSql<'_> for Id {
    accepts!(UUID);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        Uuid::from_sql(ty, raw).map(Self)
    }
}

impl ToSql for Id {
    accepts!(UUID);

    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.0.to_sql(ty, out)
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    Hash,
    TryFromRepr,
    PartialEq,
    Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Status {
    /// Reported and waiting for the service desk.
    Open = 1,

    /// Someone from the service desk works on it.
    InProgress = 2,

    /// Waiting on the reporter or a third party.
    OnHold = 3,

    /// Fixed, waiting for the reporter to confirm.
    Resolved = 4,

    /// Done, with or without a resolution.
    Closed = 5,
}

impl Status {
    /// Every status, in the order reports list them.
    pub const ALL: [Self; 5] = [
        Self::Open,
        Self::InProgress,
        Self::OnHold,
        Self::Resolved,
        Self::Closed,
    ];

    /// Whether the ticket still needs work.
    pub fn is_unresolved(self) -> bool {
        matches!(self, Self::Open | Self::InProgress | Self::OnHold)
    }
}

int2_enum_sql!(Status, "invalid status");

#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    TryFromRepr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Priority {
    Low = 1,
    Medium = 2,
    High = 3,
}

int2_enum_sql!(Priority, "invalid priority");

#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    Hash,
    PartialEq,
    Serialize,
    TryFromRepr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Kind {
    Hardware = 1,
    Software = 2,
    Service = 3,
}

int2_enum_sql!(Kind, "invalid ticket kind");

/// Narrows a ticket query.
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    pub scope: Scope,
    pub status: Option<Status>,
    /// Only tickets whose deadline is strictly earlier than this.
    pub deadline_before: Option<OffsetDateTime>,
    /// Alternatives of lowercase phrases. A ticket matches when its title
    /// or description contains every phrase of at least one alternative.
    /// Empty means no keyword restriction.
    pub keywords: Vec<Vec<String>>,
}

impl Filter {
    pub fn new(scope: Scope) -> Self {
        Self {
            scope,
            status: None,
            deadline_before: None,
            keywords: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_deadline_before(mut self, at: OffsetDateTime) -> Self {
        self.deadline_before = Some(at);
        self
    }

    pub fn with_keywords(mut self, keywords: Vec<Vec<String>>) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn matches(&self, ticket: &Ticket) -> bool {
        self.scope.matches(ticket)
            && self.status.map_or(true, |s| ticket.status == s)
            && self.deadline_before.map_or(true, |at| {
                ticket.deadline.is_some_and(|deadline| deadline < at)
            })
            && self.matches_keywords(ticket)
    }

    fn matches_keywords(&self, ticket: &Ticket) -> bool {
        if self.keywords.is_empty() {
            return true;
        }
        let title = ticket.title.to_lowercase();
        let description = ticket.description.to_lowercase();
        self.keywords.iter().any(|phrases| {
            phrases.iter().all(|phrase| {
                title.contains(phrase.as_str())
                    || description.contains(phrase.as_str())
            })
        })
    }

    /// Renders the filter as a SQL condition over `tickets`, numbering
    /// placeholders from `$1`.
    fn to_sql(&self) -> (String, Vec<&(dyn ToSql + Sync)>) {
        let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();
        let mut conditions = Vec::new();

        match &self.scope {
            Scope::All => {}
            Scope::Empty => conditions.push("FALSE".to_owned()),
            Scope::ReportedBy(id) => {
                params.push(id);
                conditions.push(format!("reporter_id = ${}", params.len()));
            }
            Scope::AssignedTo(id) => {
                params.push(id);
                conditions.push(format!("assignee_id = ${}", params.len()));
            }
            Scope::Handling(id) => {
                params.push(id);
                let n = params.len();
                conditions.push(format!(
                    "(assignee_id = ${n} OR EXISTS (\
                        SELECT 1 FROM ticket_handling h \
                        WHERE h.ticket_id = tickets.id \
                          AND h.employee_id = ${n}))"
                ));
            }
        }
        if let Some(status) = &self.status {
            params.push(status);
            conditions.push(format!("status = ${}", params.len()));
        }
        if let Some(at) = &self.deadline_before {
            params.push(at);
            conditions.push(format!("deadline < ${}", params.len()));
        }
        if !self.keywords.is_empty() {
            let alternatives = self
                .keywords
                .iter()
                .map(|phrases| {
                    let all = phrases
                        .iter()
                        .map(|phrase| {
                            params.push(phrase);
                            let n = params.len();
                            format!(
                                "(strpos(lower(title), ${n}) > 0 \
                                  OR strpos(lower(description), ${n}) > 0)"
                            )
                        })
                        .collect::<Vec<_>>();
                    format!("({})", all.join(" AND "))
                })
                .collect::<Vec<_>>();
            conditions.push(format!("({})", alternatives.join(" OR ")));
        }

        let sql = if conditions.is_empty() {
            "TRUE".to_owned()
        } else {
            conditions.join(" AND ")
        };
        (sql, params)
    }
}

/// Result of a compare-and-swap assignment.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Assignment {
    Assigned,
    NotFound,
    /// The ticket changed since the expected revision was read.
    Conflict,
}

fn from_row(row: &Row, handling: Vec<Handling>) -> Ticket {
    Ticket {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        kind: row.get("kind"),
        priority: row.get("priority"),
        deadline: row.get("deadline"),
        status: row.get("status"),
        reporter: row.get("reporter_id"),
        assignee: row.get("assignee_id"),
        handling,
        revision: row.get("revision"),
        created_at: row.get("created_at"),
    }
}

const SELECT_TICKETS: &str = "\
    SELECT id, title, description, kind, priority, deadline, status, \
           reporter_id, assignee_id, revision, created_at \
    FROM tickets";

impl Client {
    async fn get_handling(
        &self,
        ids: &[Id],
    ) -> Result<HashMap<Id, Vec<Handling>>, Error> {
        const SQL: &str = "\
            SELECT ticket_id, employee_id, handled_at \
            FROM ticket_handling \
            WHERE ticket_id IN (SELECT unnest($1::UUID[])) \
            ORDER BY seq";
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        Ok(self
            .0
            .query(SQL, &[&ids])
            .await?
            .iter()
            .map(|row| {
                (
                    row.get::<_, Id>("ticket_id"),
                    Handling {
                        employee: row.get("employee_id"),
                        at: row.get("handled_at"),
                    },
                )
            })
            .into_group_map())
    }
}

#[async_trait]
impl Tickets for Client {
    async fn find_ticket(&self, id: Id) -> Result<Option<Ticket>, Error> {
        let sql = format!("{SELECT_TICKETS} WHERE id = $1");
        let Some(row) = self.0.query_opt(sql.as_str(), &[&id]).await? else {
            return Ok(None);
        };
        let mut handling = self.get_handling(&[id]).await?;
        Ok(Some(from_row(&row, handling.remove(&id).unwrap_or_default())))
    }

    async fn find_tickets(
        &self,
        filter: &Filter,
    ) -> Result<Vec<Ticket>, Error> {
        let (condition, params) = filter.to_sql();
        let sql = format!(
            "{SELECT_TICKETS} WHERE {condition} \
             ORDER BY created_at DESC, id DESC"
        );
        let rows = self.0.query(sql.as_str(), &params).await?;

        let ids = rows.iter().map(|row| row.get("id")).collect::<Vec<Id>>();
        let mut handling = self.get_handling(&ids).await?;

        Ok(rows
            .iter()
            .map(|row| {
                let id: Id = row.get("id");
                from_row(row, handling.remove(&id).unwrap_or_default())
            })
            .collect())
    }

    async fn insert_ticket(&self, ticket: &Ticket) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO tickets (id, title, description, kind, priority, \
                                 deadline, status, reporter_id, assignee_id, \
                                 revision, created_at) \
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)";

        self.0
            .execute(
                SQL,
                &[
                    &ticket.id,
                    &ticket.title,
                    &ticket.description,
                    &ticket.kind,
                    &ticket.priority,
                    &ticket.deadline,
                    &ticket.status,
                    &ticket.reporter,
                    &ticket.assignee,
                    &ticket.revision,
                    &ticket.created_at,
                ],
            )
            .await?;
        Ok(())
    }

    async fn replace_ticket(&self, ticket: &Ticket) -> Result<bool, Error> {
        // Assignee and handling history move only through `assign_ticket`.
        const SQL: &str = "\
            UPDATE tickets \
            SET title = $2, \
                description = $3, \
                kind = $4, \
                priority = $5, \
                deadline = $6, \
                status = $7, \
                revision = revision + 1 \
            WHERE id = $1";

        let updated = self
            .0
            .execute(
                SQL,
                &[
                    &ticket.id,
                    &ticket.title,
                    &ticket.description,
                    &ticket.kind,
                    &ticket.priority,
                    &ticket.deadline,
                    &ticket.status,
                ],
            )
            .await?;
        Ok(updated > 0)
    }

    async fn delete_ticket(&self, id: Id) -> Result<bool, Error> {
        const SQL: &str = "DELETE FROM tickets WHERE id = $1";
        Ok(self.0.execute(SQL, &[&id]).await? > 0)
    }

    async fn assign_ticket(
        &self,
        id: Id,
        expected_revision: i64,
        assignee: employee::Id,
        at: OffsetDateTime,
    ) -> Result<Assignment, Error> {
        const SQL: &str = "\
            WITH updated AS ( \
                UPDATE tickets \
                SET assignee_id = $2, \
                    revision = revision + 1 \
                WHERE id = $1 AND revision = $3 \
                RETURNING id \
            ) \
            INSERT INTO ticket_handling (ticket_id, employee_id, handled_at) \
            SELECT id, $2, $4 FROM updated \
            RETURNING ticket_id";
        const EXISTS_SQL: &str = "SELECT 1 FROM tickets WHERE id = $1";

        let assigned = self
            .0
            .query_opt(SQL, &[&id, &assignee, &expected_revision, &at])
            .await?
            .is_some();
        if assigned {
            return Ok(Assignment::Assigned);
        }

        let exists = self.0.query_opt(EXISTS_SQL, &[&id]).await?.is_some();
        Ok(if exists {
            Assignment::Conflict
        } else {
            Assignment::NotFound
        })
    }

    async fn count_tickets(&self, filter: &Filter) -> Result<usize, Error> {
        let (condition, params) = filter.to_sql();
        let sql = format!("SELECT COUNT(*) FROM tickets WHERE {condition}");
        let count = self
            .0
            .query_one(sql.as_str(), &params)
            .await?
            .get::<_, i64>(0);
        Ok(usize::try_from(count).unwrap_or_default())
    }

    async fn count_tickets_by_status(
        &self,
        filter: &Filter,
    ) -> Result<HashMap<Status, usize>, Error> {
        let (condition, params) = filter.to_sql();
        let sql = format!(
            "SELECT status, COUNT(*) AS count FROM tickets \
             WHERE {condition} \
             GROUP BY status"
        );
        Ok(self
            .0
            .query(sql.as_str(), &params)
            .await?
            .iter()
            .map(|row| {
                let count = row.get::<_, i64>("count");
                (
                    row.get::<_, Status>("status"),
                    usize::try_from(count).unwrap_or_default(),
                )
            })
            .collect())
    }
}
