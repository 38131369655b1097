pub mod common;

use helpdesk::api::ticket::{Kind, Priority, Status};
use reqwest::StatusCode;
use serde_json::json;
use time::macros::datetime;

#[tokio::test]
async fn creates_valid_ticket() {
    let app = common::spawn_app().await;
    let ticket = app
        .login("Alice")
        .await
        .add_ticket(json!({
            "title": "  Printer jammed ",
            "description": "Third floor",
            "type": "HARDWARE",
            "priority": "HIGH",
            "deadline": "2030-01-15",
        }))
        .await
        .unwrap();
    assert_eq!(ticket.title, "Printer jammed");
    assert_eq!(ticket.description, "Third floor");
    assert_eq!(ticket.kind, Kind::Hardware);
    assert_eq!(ticket.priority, Priority::High);
    assert_eq!(ticket.deadline, Some(datetime!(2030-01-15 0:00 UTC)));
    assert_eq!(ticket.status, Status::Open);
    assert_eq!(ticket.reporter.id, common::employee_id(common::ALICE));
    assert_eq!(ticket.reporter.name, "Alice");
    assert_eq!(ticket.assignee, None);
    assert!(ticket.handling.is_empty());
    assert_eq!(ticket.revision, 0);
}

#[tokio::test]
async fn ignores_unreadable_deadline() {
    let app = common::spawn_app().await;
    let ticket = app
        .login("Alice")
        .await
        .add_ticket(json!({
            "title": "VPN",
            "type": "SOFTWARE",
            "priority": "LOW",
            "deadline": "next friday",
        }))
        .await
        .unwrap();
    assert_eq!(ticket.deadline, None);
}

#[tokio::test]
async fn regular_employee_always_reports_for_themselves() {
    let app = common::spawn_app().await;
    let ticket = app
        .login("Alice")
        .await
        .add_ticket(json!({
            "title": "Badge",
            "type": "SERVICE",
            "priority": "LOW",
            "reporterId": common::employee_id(common::BOB),
        }))
        .await
        .unwrap();
    assert_eq!(ticket.reporter.id, common::employee_id(common::ALICE));
}

#[tokio::test]
async fn service_desk_reports_on_behalf_of_others() {
    let app = common::spawn_app().await;
    let ticket = app
        .login("Carol")
        .await
        .add_ticket(json!({
            "title": "Phoned in: monitor flickers",
            "type": "HARDWARE",
            "priority": "MEDIUM",
            "reporterId": common::employee_id(common::BOB),
        }))
        .await
        .unwrap();
    assert_eq!(ticket.reporter.id, common::employee_id(common::BOB));
    assert_eq!(ticket.reporter.name, "Bob");

    let bobs = app.login("Bob").await.list_tickets(None).await.unwrap();
    assert_eq!(bobs.total_count, 1);
}

#[tokio::test]
async fn cant_report_for_unknown_employee() {
    let app = common::spawn_app().await;
    let status = app
        .login("Carol")
        .await
        .add_ticket(json!({
            "title": "Ghost",
            "type": "SERVICE",
            "priority": "LOW",
            "reporterId": common::employee_id(42),
        }))
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cant_create_without_title() {
    let app = common::spawn_app().await;
    let status = app
        .login("Alice")
        .await
        .add_ticket(json!({
            "title": "   ",
            "type": "SOFTWARE",
            "priority": "LOW",
        }))
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cant_create_with_too_long_title() {
    let app = common::spawn_app().await;
    let status = app
        .login("Alice")
        .await
        .add_ticket(json!({
            "title": "x".repeat(121),
            "type": "SOFTWARE",
            "priority": "LOW",
        }))
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
