use std::{collections::HashMap, error::Error as StdError, str::FromStr};

use async_trait::async_trait;
use derive_more::Display;
use enum_utils::TryFromRepr;
use serde::{Deserialize, Serialize};
use tokio_postgres::{
    types::{
        accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql,
        Type,
    },
    Row,
};
use uuid::Uuid;

use super::{Client, Employees, Error};

#[derive(Clone, Debug)]
pub struct Employee {
    pub id: Id,
    pub name: String,
    pub role: Role,
    pub contact: Contact,
    pub disabled: bool,
    pub password_hash: PasswordHash,
}

/// Directory row: an employee with the number of tickets they reported.
#[derive(Clone, Debug)]
pub struct Listing {
    pub employee: Employee,
    pub reported_tickets: usize,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Contact {
    pub email: String,
    pub phone: String,
    pub location: String,
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
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
pub struct Id(Uuid);

impl Id {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
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
#[repr(u8)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Reports tickets and follows up on their own reports.
    Regular = 1,

    /// Triages, assigns and resolves tickets of everyone.
    ServiceDesk = 2,
}

int2_enum_sql!(Role, "invalid role");

/// Bcrypt hash of an employee password.
#[derive(Clone, Debug, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn new(secret: &str) -> Result<Self, bcrypt::BcryptError> {
        Self::with_cost(secret, bcrypt::DEFAULT_COST)
    }

    pub fn with_cost(
        secret: &str,
        cost: u32,
    ) -> Result<Self, bcrypt::BcryptError> {
        bcrypt::hash(secret, cost).map(Self)
    }

    /// Malformed hashes never verify.
    pub fn verify(&self, secret: &str) -> bool {
        bcrypt::verify(secret, &self.0).unwrap_or(false)
    }
}

impl FromSql<'_> for PasswordHash {
    accepts!(TEXT);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        String::from_sql(ty, raw).map(Self)
    }
}

impl ToSql for PasswordHash {
    accepts!(TEXT);

    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.0.to_sql(ty, out)
    }
}

fn from_row(row: &Row) -> Employee {
    Employee {
        id: row.get("id"),
        name: row.get("name"),
        role: row.get("role"),
        contact: Contact {
            email: row.get("email"),
            phone: row.get("phone"),
            location: row.get("location"),
        },
        disabled: row.get("disabled"),
        password_hash: row.get("password_hash"),
    }
}

#[async_trait]
impl Employees for Client {
    async fn get_employee_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Employee>, Error> {
        const SQL: &str = "\
            SELECT id, name, role, email, phone, location, \
                   disabled, password_hash \
            FROM employees \
            WHERE lower(email) = lower($1) \
            LIMIT 1";
        Ok(self.0.query_opt(SQL, &[&email]).await?.as_ref().map(from_row))
    }

    async fn get_employee_by_id(
        &self,
        id: Id,
    ) -> Result<Option<Employee>, Error> {
        const SQL: &str = "\
            SELECT id, name, role, email, phone, location, \
                   disabled, password_hash \
            FROM employees \
            WHERE id = $1 \
            LIMIT 1";
        Ok(self.0.query_opt(SQL, &[&id]).await?.as_ref().map(from_row))
    }

    async fn list_employees(&self) -> Result<Vec<Listing>, Error> {
        const SQL: &str = "\
            SELECT e.id, e.name, e.role, e.email, e.phone, e.location, \
                   e.disabled, e.password_hash, \
                   COALESCE(r.reported, 0) AS reported \
            FROM employees e \
            LEFT JOIN ( \
                SELECT reporter_id, COUNT(*) AS reported \
                FROM tickets \
                GROUP BY reporter_id \
            ) r ON r.reporter_id = e.id \
            ORDER BY e.name, e.id";

        Ok(self
            .0
            .query(SQL, &[])
            .await?
            .iter()
            .map(|row| Listing {
                employee: from_row(row),
                reported_tickets: usize::try_from(row.get::<_, i64>("reported"))
                    .unwrap_or_default(),
            })
            .collect())
    }

    async fn get_employees_by_ids(
        &self,
        ids: &[Id],
    ) -> Result<HashMap<Id, Employee>, Error> {
        const SQL: &str = "\
            SELECT id, name, role, email, phone, location, \
                   disabled, password_hash \
            FROM employees \
            WHERE id IN (SELECT unnest($1::UUID[])) \
            LIMIT $2";

        let limit = i64::try_from(ids.len()).unwrap_or(i64::MAX);

        Ok(self
            .0
            .query(SQL, &[&ids, &limit])
            .await?
            .iter()
            .map(|row| {
                let employee = from_row(row);
                (employee.id, employee)
            })
            .collect())
    }
}
