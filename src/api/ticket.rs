use serde::{Deserialize, Serialize};
use time::{
    format_description::well_known::Rfc3339, macros::format_description,
    Date, OffsetDateTime, PrimitiveDateTime,
};

use crate::{api, db};

pub use crate::db::ticket::{Id, Kind, Priority, Status};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Id,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: Kind,
    pub priority: Priority,
    #[serde(with = "time::serde::rfc3339::option")]
    pub deadline: Option<OffsetDateTime>,
    pub status: Status,
    pub reporter: api::Employee,
    pub assignee: Option<api::Employee>,
    pub handling: Vec<Handling>,
    pub revision: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Handling {
    pub employee_id: api::employee::Id,
    #[serde(with = "time::serde::rfc3339")]
    pub at: OffsetDateTime,
}

impl From<&db::ticket::Handling> for Handling {
    fn from(handling: &db::ticket::Handling) -> Self {
        Self {
            employee_id: handling.employee,
            at: handling.at,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListItem {
    pub id: Id,
    pub title: String,
    pub status: Status,
    pub priority: Priority,
    #[serde(with = "time::serde::rfc3339::option")]
    pub deadline: Option<OffsetDateTime>,
    pub reporter_name: String,
    pub assignee_name: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub tickets: Vec<ListItem>,
    pub total_count: usize,
}

/// Reads a deadline as typed by a person.
///
/// Accepts RFC 3339 timestamps, `YYYY-MM-DDTHH:MM:SS` (taken as UTC) and
/// plain `YYYY-MM-DD` dates (midnight UTC). Anything else, like the
/// "7 days" some older tickets carry, means there is no deadline.
pub fn parse_deadline(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(at) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(at);
    }
    if let Ok(at) = PrimitiveDateTime::parse(
        raw,
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    ) {
        return Some(at.assume_utc());
    }
    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|date| date.midnight().assume_utc())
}
