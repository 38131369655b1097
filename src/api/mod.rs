//! Shapes exchanged with HTTP clients.

pub mod employee;
pub mod ticket;

pub use crate::service::dashboard::{
    Bucket, OpenAndOverdue, Rollup, Snapshot as Dashboard, StatusBreakdown,
};

pub use self::{employee::Employee, ticket::Ticket};
