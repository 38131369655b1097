use crate::{
    db::{
        employee::{self, Role},
        Employee, Ticket,
    },
    scope::{self, Scope, SubScope},
};

/// Employee on whose behalf a request runs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Actor {
    pub id: employee::Id,
    pub role: Role,
}

/// Requested action isn't allowed for the [`Actor`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PermissionDenied;

impl From<&Employee> for Actor {
    fn from(employee: &Employee) -> Self {
        Self {
            id: employee.id,
            role: employee.role,
        }
    }
}

impl Actor {
    pub fn can_view_all(&self) -> bool {
        self.role == Role::ServiceDesk
    }

    /// Only the service desk moves tickets between people.
    pub fn can_assign(&self) -> bool {
        self.role == Role::ServiceDesk
    }

    pub fn can_list_employees(&self) -> bool {
        self.role == Role::ServiceDesk
    }

    pub fn can_report_for_others(&self) -> bool {
        self.role == Role::ServiceDesk
    }

    pub fn can_view(&self, ticket: &Ticket) -> bool {
        self.can_view_all() || self.is_reporter_of(ticket)
    }

    pub fn can_edit(&self, ticket: &Ticket) -> bool {
        self.role == Role::ServiceDesk || self.is_reporter_of(ticket)
    }

    pub fn can_delete(&self, ticket: &Ticket) -> bool {
        self.can_edit(ticket)
    }

    pub fn scope(&self, sub: SubScope) -> Scope {
        scope::resolve(self.role, Some(self.id), sub)
    }

    fn is_reporter_of(&self, ticket: &Ticket) -> bool {
        ticket.reporter == self.id
    }
}

/// Turns a capability check into a `Result`.
pub fn ensure(allowed: bool) -> Result<(), PermissionDenied> {
    if allowed {
        Ok(())
    } else {
        Err(PermissionDenied)
    }
}
