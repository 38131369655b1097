/// Stores a `#[repr(u8)]` enum as `INT2`.
macro_rules! int2_enum_sql {
    ($ty:ty, $what:literal) => {
        impl ::tokio_postgres::types::FromSql<'_> for $ty {
            ::tokio_postgres::types::accepts!(INT2);

            fn from_sql(
                ty: &::tokio_postgres::types::Type,
                raw: &[u8],
            ) -> Result<Self, Box<dyn ::std::error::Error + Sync + Send>> {
                let repr = <i16 as ::tokio_postgres::types::FromSql>::from_sql(
                    ty, raw,
                )?;
                let repr = u8::try_from(repr)?;
                let value = Self::try_from(repr).map_err(|_| $what)?;
                Ok(value)
            }
        }

        impl ::tokio_postgres::types::ToSql for $ty {
            ::tokio_postgres::types::accepts!(INT2);

            ::tokio_postgres::types::to_sql_checked!();

            fn to_sql(
                &self,
                ty: &::tokio_postgres::types::Type,
                out: &mut ::tokio_postgres::types::private::BytesMut,
            ) -> Result<
                ::tokio_postgres::types::IsNull,
                Box<dyn ::std::error::Error + Sync + Send>,
            > {
                let repr = i16::from((*self) as u8);
                ::tokio_postgres::types::ToSql::to_sql(&repr, ty, out)
            }
        }
    };
}

pub mod employee;
pub mod memory;
pub mod ticket;

use std::collections::HashMap;

use async_trait::async_trait;
use derive_more::{Display, From};
use time::OffsetDateTime;
use tokio_postgres::{tls::NoTlsStream, NoTls, Socket};

use crate::config;

pub use self::{employee::Employee, ticket::Ticket};

/// Failure of the underlying store.
#[derive(Debug, Display, From)]
pub enum Error {
    Postgres(tokio_postgres::Error),
}

impl std::error::Error for Error {}

pub type Connection = tokio_postgres::Connection<Socket, NoTlsStream>;

/// Everything the handlers need from persistence.
pub trait Store: Tickets + Employees {}

impl<T: Tickets + Employees> Store for T {}

#[async_trait]
pub trait Tickets: Send + Sync {
    async fn find_ticket(
        &self,
        id: ticket::Id,
    ) -> Result<Option<Ticket>, Error>;

    /// Newest first.
    async fn find_tickets(
        &self,
        filter: &ticket::Filter,
    ) -> Result<Vec<Ticket>, Error>;

    async fn insert_ticket(&self, ticket: &Ticket) -> Result<(), Error>;

    /// Overwrites the editable fields and bumps the revision. Returns
    /// `false` if there is no such ticket.
    async fn replace_ticket(&self, ticket: &Ticket) -> Result<bool, Error>;

    async fn delete_ticket(&self, id: ticket::Id) -> Result<bool, Error>;

    /// Sets the assignee and appends to the handling history in one step,
    /// provided the ticket is still at `expected_revision`.
    async fn assign_ticket(
        &self,
        id: ticket::Id,
        expected_revision: i64,
        assignee: employee::Id,
        at: OffsetDateTime,
    ) -> Result<ticket::Assignment, Error>;

    async fn count_tickets(
        &self,
        filter: &ticket::Filter,
    ) -> Result<usize, Error>;

    /// Statuses without tickets are absent from the map.
    async fn count_tickets_by_status(
        &self,
        filter: &ticket::Filter,
    ) -> Result<HashMap<ticket::Status, usize>, Error>;
}

#[async_trait]
pub trait Employees: Send + Sync {
    async fn get_employee_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Employee>, Error>;

    async fn get_employee_by_id(
        &self,
        id: employee::Id,
    ) -> Result<Option<Employee>, Error>;

    async fn get_employees_by_ids(
        &self,
        ids: &[employee::Id],
    ) -> Result<HashMap<employee::Id, Employee>, Error>;

    /// Everyone, ordered by name, with their reported ticket counts.
    async fn list_employees(&self) -> Result<Vec<employee::Listing>, Error>;
}

pub async fn connect(
    config: config::Db,
) -> Result<(Client, Connection), Error> {
    tokio_postgres::connect(&config.url, NoTls)
        .await
        .map(|(client, connection)| (Client(client), connection))
        .map_err(Into::into)
}

pub struct Client(tokio_postgres::Client);

impl Client {
    /// Creates missing tables.
    pub async fn migrate(&self) -> Result<(), Error> {
        self.0.batch_execute(include_str!("schema.sql")).await?;
        Ok(())
    }
}
