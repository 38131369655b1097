use serde::{Deserialize, Serialize};

use crate::db;

pub use crate::db::employee::{Id, Role};

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Employee {
    pub id: Id,
    pub name: String,
    pub role: Role,
    pub email: String,
}

impl From<&db::Employee> for Employee {
    fn from(employee: &db::Employee) -> Self {
        Self {
            id: employee.id,
            name: employee.name.clone(),
            role: employee.role,
            email: employee.contact.email.clone(),
        }
    }
}

/// Row of the service desk's employee directory.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: Id,
    pub name: String,
    pub role: Role,
    pub email: String,
    pub disabled: bool,
    pub reported_ticket_count: usize,
}

impl From<db::employee::Listing> for Listing {
    fn from(listing: db::employee::Listing) -> Self {
        let db::employee::Listing {
            employee,
            reported_tickets,
        } = listing;
        Self {
            id: employee.id,
            name: employee.name,
            role: employee.role,
            email: employee.contact.email,
            disabled: employee.disabled,
            reported_ticket_count: reported_tickets,
        }
    }
}
