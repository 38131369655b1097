pub mod common;

use reqwest::StatusCode;

#[tokio::test]
async fn reporter_deletes_own_ticket() {
    let app = common::spawn_app().await;
    let alice = app.login("Alice").await;
    let ticket = alice.report("Duplicate").await;

    alice.delete_ticket(ticket.id).await.unwrap();

    let status = alice.get_ticket(ticket.id).await.unwrap_err();
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(alice.list_tickets(None).await.unwrap().total_count, 0);
}

#[tokio::test]
async fn service_desk_deletes_assigned_ticket() {
    let app = common::spawn_app().await;
    let ticket = app.login("Alice").await.report("Spam").await;

    let carol = app.login("Carol").await;
    carol.assign_ticket_to_me(ticket.id, None).await.unwrap();
    carol.delete_ticket(ticket.id).await.unwrap();

    let status = carol.delete_ticket(ticket.id).await.unwrap_err();
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn cant_delete_someone_elses_ticket() {
    let app = common::spawn_app().await;
    let ticket = app.login("Alice").await.report("Keep me").await;

    let status = app
        .login("Bob")
        .await
        .delete_ticket(ticket.id)
        .await
        .unwrap_err();
    assert_eq!(status, StatusCode::FORBIDDEN);
}
