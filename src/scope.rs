//! Which tickets an employee gets to see.

use serde::{Deserialize, Serialize};

use crate::db::{
    employee::{self, Role},
    Ticket,
};

/// Predicate over tickets, kept as data so every store can evaluate it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Scope {
    All,
    /// Matches nothing.
    Empty,
    ReportedBy(employee::Id),
    AssignedTo(employee::Id),
    /// Assigned to the employee now, or handled by them at some point.
    Handling(employee::Id),
}

/// Selection a service-desk employee makes between their own queue and
/// everything.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SubScope {
    #[default]
    My,
    All,
}

/// Regular employees always get their own reports, whatever `sub` says.
pub fn resolve(
    role: Role,
    user: Option<employee::Id>,
    sub: SubScope,
) -> Scope {
    match (role, sub, user) {
        (Role::ServiceDesk, SubScope::All, _) => Scope::All,
        (_, _, None) => Scope::Empty,
        (Role::Regular, _, Some(id)) => Scope::ReportedBy(id),
        (Role::ServiceDesk, SubScope::My, Some(id)) => Scope::AssignedTo(id),
    }
}

impl Scope {
    pub fn matches(&self, ticket: &Ticket) -> bool {
        match *self {
            Self::All => true,
            Self::Empty => false,
            Self::ReportedBy(id) => ticket.reporter == id,
            Self::AssignedTo(id) => ticket.assignee == Some(id),
            Self::Handling(id) => {
                ticket.assignee == Some(id)
                    || ticket.handling.iter().any(|h| h.employee == id)
            }
        }
    }

    /// Widens an assignee scope to everything the employee ever handled.
    pub fn including_history(self) -> Self {
        match self {
            Self::AssignedTo(id) => Self::Handling(id),
            other => other,
        }
    }
}
