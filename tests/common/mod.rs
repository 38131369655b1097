use std::{fmt::Display, sync::Arc, time::Duration};

use helpdesk::{
    api, config,
    db::{
        employee::{Contact, Employee, Id, PasswordHash, Role},
        memory,
    },
    http::{self, AppState},
};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub const PASSWORD: &str = "password";

/// Regular employees.
pub const ALICE: u128 = 1;
pub const BOB: u128 = 2;

/// Service desk.
pub const CAROL: u128 = 3;
pub const DAVE: u128 = 4;

/// Regular employee whose account is disabled.
pub const ERIN: u128 = 5;

fn staff() -> Vec<Employee> {
    [
        (ALICE, "Alice", Role::Regular, false),
        (BOB, "Bob", Role::Regular, false),
        (CAROL, "Carol", Role::ServiceDesk, false),
        (DAVE, "Dave", Role::ServiceDesk, false),
        (ERIN, "Erin", Role::Regular, true),
    ]
    .into_iter()
    .map(|(id, name, role, disabled)| Employee {
        id: Id::from(id),
        name: name.into(),
        role,
        contact: Contact {
            email: email(name),
            phone: String::new(),
            location: "HQ".into(),
        },
        disabled,
        password_hash: PasswordHash::with_cost(PASSWORD, 4)
            .expect("failed to hash a password"),
    })
    .collect()
}

pub fn email(name: &str) -> String {
    format!("{}@example.com", name.to_lowercase())
}

/// Running server backed by a fresh in-memory store.
pub struct App {
    base_url: String,
}

pub async fn spawn_app() -> App {
    let store = memory::Store::with_employees(staff());
    let jwt = config::Jwt {
        secret: "secret".into(),
        expiration_time: Duration::from_secs(60 * 60),
    };
    let state = AppState::new(Arc::new(store), &jwt);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind a listener");
    let addr = listener.local_addr().expect("failed to get an address");
    tokio::spawn(async move {
        axum::serve(listener, http::router(Arc::new(state)))
            .await
            .expect("server failed");
    });

    App {
        base_url: format!("http://{addr}"),
    }
}

impl App {
    pub fn client(&self) -> Client {
        Client {
            inner: reqwest::Client::new(),
            base_url: self.base_url.clone(),
            auth_token: None,
        }
    }

    /// Client authenticated as one of the seeded employees.
    pub async fn login(&self, name: &str) -> Client {
        self.client().auth(&email(name), PASSWORD).await
    }
}

pub struct Client {
    inner: reqwest::Client,
    base_url: String,
    pub auth_token: Option<String>,
}

impl Client {
    pub async fn try_auth(
        &self,
        email: &str,
        password: &str,
    ) -> Result<String, StatusCode> {
        Ok(self
            .request(Method::POST, "/auth")
            .json(&json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .text()
            .await
            .expect("failed to get a response"))
    }

    pub async fn auth(mut self, email: &str, password: &str) -> Self {
        self.auth_token = Some(
            self.try_auth(email, password)
                .await
                .expect("wrong status code"),
        );
        self
    }

    pub async fn user(&self) -> Result<api::Employee, StatusCode> {
        send(self.request(Method::GET, "/user")).await
    }

    pub async fn list_employees(
        &self,
    ) -> Result<Vec<api::employee::Listing>, StatusCode> {
        send(self.request(Method::GET, "/employee")).await
    }

    pub async fn add_ticket(
        &self,
        input: Value,
    ) -> Result<api::Ticket, StatusCode> {
        let res = self
            .request(Method::POST, "/ticket")
            .json(&input)
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?;
        assert_eq!(res.status(), StatusCode::CREATED);
        Ok(res.json().await.expect("failed to get a response"))
    }

    /// Reports a medium priority software ticket with no deadline.
    pub async fn report(&self, title: &str) -> api::Ticket {
        self.add_ticket(json!({
            "title": title,
            "description": format!("{title} description"),
            "type": "SOFTWARE",
            "priority": "MEDIUM",
        }))
        .await
        .expect("failed to report a ticket")
    }

    pub async fn get_ticket(
        &self,
        id: impl Display,
    ) -> Result<api::Ticket, StatusCode> {
        send(self.request(Method::GET, &format!("/ticket/{id}"))).await
    }

    pub async fn list_tickets(
        &self,
        scope: Option<&str>,
    ) -> Result<api::ticket::List, StatusCode> {
        let path = match scope {
            Some(scope) => format!("/ticket?scope={scope}"),
            None => "/ticket".into(),
        };
        send(self.request(Method::GET, &path)).await
    }

    pub async fn search(
        &self,
        q: &str,
        scope: Option<&str>,
    ) -> Result<api::ticket::List, StatusCode> {
        let mut query = vec![("q", q)];
        query.extend(scope.map(|s| ("scope", s)));
        send(self.request(Method::GET, "/search").query(&query)).await
    }

    pub async fn edit_ticket(
        &self,
        id: impl Display,
        op: Value,
    ) -> Result<api::Ticket, StatusCode> {
        send(
            self.request(Method::PATCH, &format!("/ticket/{id}"))
                .json(&op),
        )
        .await
    }

    pub async fn delete_ticket(
        &self,
        id: impl Display,
    ) -> Result<(), StatusCode> {
        let res = self
            .request(Method::DELETE, &format!("/ticket/{id}"))
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?;
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        Ok(())
    }

    pub async fn assign_ticket(
        &self,
        id: impl Display,
        assignee_id: impl Display,
        revision: Option<i64>,
    ) -> Result<api::Ticket, StatusCode> {
        send(
            self.request(Method::POST, &format!("/ticket/{id}/assign"))
                .json(&json!({
                    "assigneeId": assignee_id.to_string(),
                    "revision": revision,
                })),
        )
        .await
    }

    pub async fn assign_ticket_to_me(
        &self,
        id: impl Display,
        revision: Option<i64>,
    ) -> Result<api::Ticket, StatusCode> {
        send(
            self.request(
                Method::POST,
                &format!("/ticket/{id}/assign-to-me"),
            )
            .json(&json!({ "revision": revision })),
        )
        .await
    }

    pub async fn dashboard(
        &self,
        scope: Option<&str>,
    ) -> Result<api::Dashboard, StatusCode> {
        let path = match scope {
            Some(scope) => format!("/dashboard?scope={scope}"),
            None => "/dashboard".into(),
        };
        send(self.request(Method::GET, &path)).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req =
            self.inner.request(method, format!("{}{path}", self.base_url));
        if let Some(token) = &self.auth_token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        req
    }
}

async fn send<T: DeserializeOwned>(
    req: RequestBuilder,
) -> Result<T, StatusCode> {
    Ok(req
        .send()
        .await
        .expect("failed to send a request")
        .error_for_status()
        .map_err(|e| e.status().expect("status error"))?
        .json::<T>()
        .await
        .expect("failed to get a response"))
}

pub fn employee_id(id: u128) -> api::employee::Id {
    api::employee::Id::from(id)
}
