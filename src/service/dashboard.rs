//! Ticket statistics for the dashboard.
//!
//! Everything here is read-only and computed per request. Counts come from
//! the store separately, so a snapshot may lag behind concurrent writes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    db::{
        self,
        ticket::{Filter, Status},
        Store,
    },
    scope::Scope,
};

/// Ticket count per status, always listing every status in
/// [`Status::ALL`] order so charts come out the same every time.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBreakdown {
    pub labels: Vec<String>,
    pub counts: Vec<usize>,
    pub total: usize,
}

impl StatusBreakdown {
    pub fn from_counts(counts: &HashMap<Status, usize>) -> Self {
        let counts = Status::ALL
            .iter()
            .map(|s| counts.get(s).copied().unwrap_or_default())
            .collect::<Vec<_>>();
        Self {
            labels: Status::ALL.iter().map(ToString::to_string).collect(),
            total: counts.iter().sum(),
            counts,
        }
    }

    pub fn count(&self, status: Status) -> usize {
        Status::ALL
            .iter()
            .position(|s| *s == status)
            .and_then(|i| self.counts.get(i))
            .copied()
            .unwrap_or_default()
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAndOverdue {
    pub total: usize,
    pub open: usize,
    /// Open tickets past their deadline. Tickets without one never count.
    pub overdue: usize,
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Bucket {
    pub count: usize,
    pub percent: f64,
}

impl Bucket {
    fn of(count: usize, total: usize) -> Self {
        let percent = if total == 0 {
            0.0
        } else {
            count as f64 * 100.0 / total as f64
        };
        Self { count, percent }
    }
}

/// Five statuses folded into three buckets.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Rollup {
    pub total: usize,
    /// Open, in progress and on hold.
    pub open: Bucket,
    pub resolved: Bucket,
    pub closed: Bucket,
}

impl From<&StatusBreakdown> for Rollup {
    fn from(breakdown: &StatusBreakdown) -> Self {
        let total = breakdown.total;
        let open = Status::ALL
            .into_iter()
            .filter(|s| s.is_unresolved())
            .map(|s| breakdown.count(s))
            .sum();
        Self {
            total,
            open: Bucket::of(open, total),
            resolved: Bucket::of(breakdown.count(Status::Resolved), total),
            closed: Bucket::of(breakdown.count(Status::Closed), total),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub status_breakdown: StatusBreakdown,
    pub open_and_overdue: OpenAndOverdue,
    pub rollup: Rollup,
}

pub async fn status_breakdown(
    store: &dyn Store,
    scope: Scope,
) -> Result<StatusBreakdown, db::Error> {
    let counts = store.count_tickets_by_status(&Filter::new(scope)).await?;
    Ok(StatusBreakdown::from_counts(&counts))
}

pub async fn open_and_overdue(
    store: &dyn Store,
    scope: Scope,
    now: OffsetDateTime,
) -> Result<OpenAndOverdue, db::Error> {
    let all = Filter::new(scope);
    let open = all.clone().with_status(Status::Open);
    let overdue = open.clone().with_deadline_before(now);

    let (total, open, overdue) = tokio::try_join!(
        store.count_tickets(&all),
        store.count_tickets(&open),
        store.count_tickets(&overdue),
    )?;
    Ok(OpenAndOverdue {
        total,
        open,
        overdue,
    })
}

pub async fn snapshot(
    store: &dyn Store,
    scope: Scope,
    now: OffsetDateTime,
) -> Result<Snapshot, db::Error> {
    let (status_breakdown, open_and_overdue) = tokio::try_join!(
        status_breakdown(store, scope),
        open_and_overdue(store, scope, now),
    )?;
    tracing::debug!(?scope, total = status_breakdown.total, "dashboard built");
    Ok(Snapshot {
        rollup: Rollup::from(&status_breakdown),
        status_breakdown,
        open_and_overdue,
    })
}

#[cfg(test)]
mod tests {
    use time::{macros::datetime, Duration};

    use crate::db::{
        employee::{self, Role},
        memory,
        ticket::{self, Kind, Priority},
        Ticket, Tickets as _,
    };

    use super::*;

    const NOW: OffsetDateTime = datetime!(2025-10-17 12:00 UTC);

    fn ticket(
        reporter: u128,
        status: Status,
        deadline: Option<OffsetDateTime>,
    ) -> Ticket {
        Ticket {
            id: ticket::Id::new(),
            title: "Laptop".into(),
            description: "Does not boot".into(),
            kind: Kind::Hardware,
            priority: Priority::High,
            deadline,
            status,
            reporter: employee::Id::from(reporter),
            assignee: None,
            handling: Vec::new(),
            revision: 0,
            created_at: NOW,
        }
    }

    async fn store_with(tickets: Vec<Ticket>) -> memory::Store {
        let store = memory::Store::new();
        for t in &tickets {
            store.insert_ticket(t).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn empty_set_keeps_all_labels() {
        let store = memory::Store::new();
        let breakdown = status_breakdown(&store, Scope::All).await.unwrap();
        assert_eq!(
            breakdown.labels,
            ["Open", "InProgress", "OnHold", "Resolved", "Closed"],
        );
        assert_eq!(breakdown.counts, [0; 5]);
        assert_eq!(breakdown.total, 0);

        let rollup = Rollup::from(&breakdown);
        assert_eq!(rollup.open.percent, 0.0);
        assert_eq!(rollup.resolved.percent, 0.0);
        assert_eq!(rollup.closed.percent, 0.0);

        let counts = open_and_overdue(&store, Scope::All, NOW).await.unwrap();
        assert_eq!(
            counts,
            OpenAndOverdue {
                total: 0,
                open: 0,
                overdue: 0,
            },
        );
    }

    #[tokio::test]
    async fn breaks_down_and_rolls_up() {
        let store = store_with(vec![
            ticket(1, Status::Open, None),
            ticket(1, Status::Open, None),
            ticket(1, Status::InProgress, None),
            ticket(1, Status::Resolved, None),
            ticket(1, Status::Closed, None),
        ])
        .await;

        let breakdown = status_breakdown(&store, Scope::All).await.unwrap();
        assert_eq!(breakdown.counts, [2, 1, 0, 1, 1]);
        assert_eq!(breakdown.total, 5);

        let rollup = Rollup::from(&breakdown);
        assert_eq!(rollup.open.count, 3);
        assert_eq!(rollup.open.percent, 60.0);
        assert_eq!(rollup.resolved.count, 1);
        assert_eq!(rollup.resolved.percent, 20.0);
        assert_eq!(rollup.closed.count, 1);
        assert_eq!(rollup.closed.percent, 20.0);
    }

    #[tokio::test]
    async fn rollup_percentages_add_up() {
        let store = store_with(vec![
            ticket(1, Status::Open, None),
            ticket(1, Status::OnHold, None),
            ticket(1, Status::Resolved, None),
        ])
        .await;

        let rollup = Rollup::from(
            &status_breakdown(&store, Scope::All).await.unwrap(),
        );
        let sum = rollup.open.percent
            + rollup.resolved.percent
            + rollup.closed.percent;
        assert!((sum - 100.0).abs() < 1e-9, "sum is {sum}");
    }

    #[tokio::test]
    async fn counts_overdue_open_tickets() {
        let yesterday = NOW - Duration::days(1);
        let tomorrow = NOW + Duration::days(1);
        let store = store_with(vec![
            ticket(1, Status::Open, Some(yesterday)),
            ticket(1, Status::Open, Some(tomorrow)),
        ])
        .await;

        let counts = open_and_overdue(&store, Scope::All, NOW).await.unwrap();
        assert_eq!(
            counts,
            OpenAndOverdue {
                total: 2,
                open: 2,
                overdue: 1,
            },
        );
    }

    #[tokio::test]
    async fn overdue_skips_missing_deadlines_and_other_statuses() {
        let yesterday = NOW - Duration::days(1);
        let store = store_with(vec![
            ticket(1, Status::Open, None),
            ticket(1, Status::InProgress, Some(yesterday)),
            ticket(1, Status::Closed, Some(yesterday)),
        ])
        .await;

        let counts = open_and_overdue(&store, Scope::All, NOW).await.unwrap();
        assert_eq!(counts.total, 3);
        assert_eq!(counts.open, 1);
        assert_eq!(counts.overdue, 0);
    }

    #[tokio::test]
    async fn respects_scope() {
        let store = store_with(vec![
            ticket(1, Status::Open, None),
            ticket(2, Status::Closed, None),
            ticket(2, Status::Closed, None),
        ])
        .await;
        let scope = crate::scope::resolve(
            Role::Regular,
            Some(employee::Id::from(2)),
            crate::scope::SubScope::My,
        );

        let snapshot = snapshot(&store, scope, NOW).await.unwrap();
        assert_eq!(snapshot.status_breakdown.counts, [0, 0, 0, 0, 2]);
        assert_eq!(snapshot.open_and_overdue.total, 2);
        assert_eq!(snapshot.open_and_overdue.open, 0);
        assert_eq!(snapshot.rollup.closed.percent, 100.0);
    }
}
