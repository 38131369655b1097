//! In-process store, used by tests and local experiments.

use std::collections::HashMap;

use async_trait::async_trait;
use itertools::Itertools as _;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::{
    employee,
    ticket::{self, Assignment, Handling},
    Employee, Employees, Error, Ticket, Tickets,
};

#[derive(Default)]
pub struct Store {
    tickets: RwLock<Vec<Ticket>>,
    employees: RwLock<HashMap<employee::Id, Employee>>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_employees(
        employees: impl IntoIterator<Item = Employee>,
    ) -> Self {
        Self {
            tickets: RwLock::default(),
            employees: RwLock::new(
                employees.into_iter().map(|e| (e.id, e)).collect(),
            ),
        }
    }

    pub async fn add_employee(&self, employee: Employee) {
        self.employees.write().await.insert(employee.id, employee);
    }
}

#[async_trait]
impl Tickets for Store {
    async fn find_ticket(
        &self,
        id: ticket::Id,
    ) -> Result<Option<Ticket>, Error> {
        Ok(self.tickets.read().await.iter().find(|t| t.id == id).cloned())
    }

    async fn find_tickets(
        &self,
        filter: &ticket::Filter,
    ) -> Result<Vec<Ticket>, Error> {
        let mut found = self
            .tickets
            .read()
            .await
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect::<Vec<_>>();
        // Insertion order breaks ties between equal timestamps.
        found.reverse();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(found)
    }

    async fn insert_ticket(&self, ticket: &Ticket) -> Result<(), Error> {
        self.tickets.write().await.push(ticket.clone());
        Ok(())
    }

    async fn replace_ticket(&self, ticket: &Ticket) -> Result<bool, Error> {
        let mut tickets = self.tickets.write().await;
        let Some(stored) = tickets.iter_mut().find(|t| t.id == ticket.id)
        else {
            return Ok(false);
        };
        stored.title.clone_from(&ticket.title);
        stored.description.clone_from(&ticket.description);
        stored.kind = ticket.kind;
        stored.priority = ticket.priority;
        stored.deadline = ticket.deadline;
        stored.status = ticket.status;
        stored.revision += 1;
        Ok(true)
    }

    async fn delete_ticket(&self, id: ticket::Id) -> Result<bool, Error> {
        let mut tickets = self.tickets.write().await;
        let before = tickets.len();
        tickets.retain(|t| t.id != id);
        Ok(tickets.len() < before)
    }

    async fn assign_ticket(
        &self,
        id: ticket::Id,
        expected_revision: i64,
        assignee: employee::Id,
        at: OffsetDateTime,
    ) -> Result<Assignment, Error> {
        let mut tickets = self.tickets.write().await;
        let Some(ticket) = tickets.iter_mut().find(|t| t.id == id) else {
            return Ok(Assignment::NotFound);
        };
        if ticket.revision != expected_revision {
            return Ok(Assignment::Conflict);
        }
        ticket.assignee = Some(assignee);
        ticket.handling.push(Handling {
            employee: assignee,
            at,
        });
        ticket.revision += 1;
        Ok(Assignment::Assigned)
    }

    async fn count_tickets(
        &self,
        filter: &ticket::Filter,
    ) -> Result<usize, Error> {
        Ok(self
            .tickets
            .read()
            .await
            .iter()
            .filter(|t| filter.matches(t))
            .count())
    }

    async fn count_tickets_by_status(
        &self,
        filter: &ticket::Filter,
    ) -> Result<HashMap<ticket::Status, usize>, Error> {
        let tickets = self.tickets.read().await;
        let mut counts = HashMap::new();
        for t in tickets.iter().filter(|t| filter.matches(t)) {
            *counts.entry(t.status).or_default() += 1;
        }
        Ok(counts)
    }
}

#[async_trait]
impl Employees for Store {
    async fn get_employee_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Employee>, Error> {
        Ok(self
            .employees
            .read()
            .await
            .values()
            .find(|e| e.contact.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn get_employee_by_id(
        &self,
        id: employee::Id,
    ) -> Result<Option<Employee>, Error> {
        Ok(self.employees.read().await.get(&id).cloned())
    }

    async fn get_employees_by_ids(
        &self,
        ids: &[employee::Id],
    ) -> Result<HashMap<employee::Id, Employee>, Error> {
        let employees = self.employees.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| employees.get(id).map(|e| (*id, e.clone())))
            .collect())
    }

    async fn list_employees(&self) -> Result<Vec<employee::Listing>, Error> {
        let employees = self.employees.read().await;
        let tickets = self.tickets.read().await;
        let reported = tickets.iter().map(|t| t.reporter).counts();

        let mut listings = employees
            .values()
            .map(|e| employee::Listing {
                employee: e.clone(),
                reported_tickets: reported.get(&e.id).copied().unwrap_or(0),
            })
            .collect::<Vec<_>>();
        listings.sort_by(|a, b| {
            (&a.employee.name, a.employee.id)
                .cmp(&(&b.employee.name, b.employee.id))
        });
        Ok(listings)
    }
}
