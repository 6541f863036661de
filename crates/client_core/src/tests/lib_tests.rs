use std::sync::Arc;

use super::*;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use shared::domain::TransactionAction;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    sync::Mutex,
};

#[derive(Clone, Default)]
struct ServerState {
    bodies: Arc<Mutex<Vec<(&'static str, Value)>>>,
}

impl ServerState {
    async fn record(&self, endpoint: &'static str, body: Value) {
        self.bodies.lock().await.push((endpoint, body));
    }

    async fn bodies_for(&self, endpoint: &str) -> Vec<Value> {
        self.bodies
            .lock()
            .await
            .iter()
            .filter(|(name, _)| *name == endpoint)
            .map(|(_, body)| body.clone())
            .collect()
    }
}

async fn handle_item(Path(id): Path<String>) -> Response {
    match id.as_str() {
        "missing" => (
            StatusCode::NOT_FOUND,
            Json(json!({"success": false, "message": "Item not found"})),
        )
            .into_response(),
        "refused" => Json(json!({"success": false})).into_response(),
        "broken" => Json(json!({"success": true, "name": "Drill"})).into_response(),
        "crash" => (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded").into_response(),
        _ => Json(json!({
            "success": true,
            "name": id.clone(),
            "location": "Lab A",
            "quantity": 5,
        }))
        .into_response(),
    }
}

async fn handle_check_email(State(state): State<ServerState>, Json(body): Json<Value>) -> Json<Value> {
    state.record("check-email", body.clone()).await;
    if body["email"] == "ada@lab.org" {
        Json(json!({
            "success": true,
            "exists": true,
            "first_name": "Ada",
            "last_name": "Lovelace",
        }))
    } else {
        Json(json!({"success": true, "exists": false}))
    }
}

async fn handle_register(State(state): State<ServerState>, Json(body): Json<Value>) -> Json<Value> {
    state.record("register-user", body).await;
    Json(json!({"success": true}))
}

async fn handle_transaction(
    State(state): State<ServerState>,
    Json(body): Json<Value>,
) -> Json<Value> {
    let quantity = body["quantity"].as_u64().unwrap_or_default();
    state.record("transaction", body).await;
    if quantity > 5 {
        Json(json!({"success": false, "message": "Insufficient quantity"}))
    } else {
        Json(json!({"success": true}))
    }
}

async fn spawn_backend() -> (String, ServerState) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let state = ServerState::default();
    let app = Router::new()
        .route("/item/:id", get(handle_item))
        .route("/check-email", post(handle_check_email))
        .route("/register-user", post(handle_register))
        .route("/transaction", post(handle_transaction))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), state)
}

fn id(raw: &str) -> ItemId {
    ItemId::parse(raw).expect("item id")
}

#[tokio::test]
async fn fetch_item_maps_success_payload() {
    let (server_url, _state) = spawn_backend().await;
    let client = HttpReservationClient::new(&server_url).expect("client");

    let item = client.fetch_item(&id("42")).await.expect("item");
    assert_eq!(
        item,
        Item {
            id: id("42"),
            name: "42".into(),
            location: "Lab A".into(),
            remaining_quantity: 5,
        }
    );
}

#[tokio::test]
async fn fetch_item_encodes_id_as_single_segment() {
    let (server_url, _state) = spawn_backend().await;
    let client = HttpReservationClient::new(&server_url).expect("client");

    let item = client.fetch_item(&id("kit#1?x")).await.expect("item");
    assert_eq!(item.name, "kit#1?x");
}

#[tokio::test]
async fn fetch_item_from_encoded_route_reaches_decoded_id() {
    let (server_url, _state) = spawn_backend().await;
    let client = HttpReservationClient::new(&server_url).expect("client");

    let route_id = ItemId::from_route("/item/caf%C3%A9").expect("route id");
    assert_eq!(
        client.endpoint(&["item", route_id.as_str()]).path(),
        "/item/caf%C3%A9"
    );
    let item = client.fetch_item(&route_id).await.expect("item");
    assert_eq!(item.name, "café");
}

#[tokio::test]
async fn fetch_item_failures_are_classified() {
    let (server_url, _state) = spawn_backend().await;
    let client = HttpReservationClient::new(&server_url).expect("client");

    match client.fetch_item(&id("missing")).await {
        Err(ClientError::Rejected { message }) => {
            assert_eq!(message.as_deref(), Some("Item not found"))
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert!(matches!(
        client.fetch_item(&id("refused")).await,
        Err(ClientError::Rejected { message: None })
    ));
    assert!(matches!(
        client.fetch_item(&id("broken")).await,
        Err(ClientError::Malformed(_))
    ));
    assert!(matches!(
        client.fetch_item(&id("crash")).await,
        Err(ClientError::Status(500))
    ));
}

#[tokio::test]
async fn check_email_distinguishes_known_and_unknown() {
    let (server_url, state) = spawn_backend().await;
    let client = HttpReservationClient::new(&server_url).expect("client");

    assert_eq!(
        client.check_email("ada@lab.org").await.expect("known"),
        EmailLookup::Known {
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
        }
    );
    assert_eq!(
        client.check_email("a@b.com").await.expect("unknown"),
        EmailLookup::Unknown
    );
    assert_eq!(
        state.bodies_for("check-email").await,
        vec![json!({"email": "ada@lab.org"}), json!({"email": "a@b.com"})]
    );
}

#[tokio::test]
async fn register_user_posts_names() {
    let (server_url, state) = spawn_backend().await;
    let client = HttpReservationClient::new(&server_url).expect("client");

    client
        .register_user(&RegisterUserRequest {
            email: "a@b.com".into(),
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
        })
        .await
        .expect("register");
    assert_eq!(
        state.bodies_for("register-user").await,
        vec![json!({"email": "a@b.com", "first_name": "Grace", "last_name": "Hopper"})]
    );
}

#[tokio::test]
async fn submit_transaction_surfaces_backend_message() {
    let (server_url, state) = spawn_backend().await;
    let client = HttpReservationClient::new(&server_url).expect("client");

    let request = TransactionRequest {
        id: id("42"),
        first_name: "Ada".into(),
        last_name: "Lovelace".into(),
        email: "ada@lab.org".into(),
        name: "Drill".into(),
        location: "Lab A".into(),
        quantity: 9,
        action: TransactionAction::Remove,
    };
    let err = client
        .submit_transaction(&request)
        .await
        .expect_err("must be rejected");
    assert_eq!(err.user_message("fallback"), "Insufficient quantity");

    let bodies = state.bodies_for("transaction").await;
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["action"], "remove");
    assert_eq!(bodies[0]["id"], "42");
    assert_eq!(bodies[0]["location"], "Lab A");
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");

    let client = HttpReservationClient::new(&format!("http://{addr}")).expect("client");
    let err = client
        .check_email("a@b.com")
        .await
        .expect_err("nothing is listening");
    assert!(matches!(err, ClientError::Transport(_)));
    assert_eq!(
        err.user_message("fallback"),
        crate::error::COMMUNICATION_ERROR
    );
}

#[tokio::test]
async fn truncated_body_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept");
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.expect("read request");
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
        }
        socket
            .write_all(
                b"HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 200\r\n\r\n{\"succ",
            )
            .await
            .expect("write response");
        let _ = socket.shutdown().await;
    });

    let client = HttpReservationClient::new(&format!("http://{addr}")).expect("client");
    let err = client
        .fetch_item(&id("42"))
        .await
        .expect_err("body ends early");
    assert!(matches!(err, ClientError::Transport(_)), "{err:?}");
    assert_eq!(
        err.user_message(crate::form::LOAD_ITEM_ERROR),
        crate::error::COMMUNICATION_ERROR
    );
}

#[test]
fn endpoints_respect_base_path() {
    let client = HttpReservationClient::new("http://inventory.lab:5000/api/").expect("client");
    assert_eq!(
        client.endpoint(&["item", "42"]).as_str(),
        "http://inventory.lab:5000/api/item/42"
    );

    let client = HttpReservationClient::new("http://localhost:5000").expect("client");
    assert_eq!(
        client.endpoint(&["check-email"]).as_str(),
        "http://localhost:5000/check-email"
    );
}

#[test]
fn rejects_unusable_server_urls() {
    assert!(matches!(
        HttpReservationClient::new("not a url"),
        Err(ClientError::InvalidUrl(_))
    ));
    assert!(matches!(
        HttpReservationClient::new("mailto:ops@lab.org"),
        Err(ClientError::InvalidUrl(_))
    ));
}

#[tokio::test]
async fn form_workflow_against_http_backend() {
    let (server_url, state) = spawn_backend().await;
    let client = HttpReservationClient::new(&server_url).expect("client");
    let mut form = ReservationForm::default();

    let effect = form.mount(Some("/item/Drill"));
    drive(&client, &mut form, effect).await;
    assert_eq!(form.item().map(|item| item.location.as_str()), Some("Lab A"));

    form.set_email("ada@lab.org");
    let effect = form.blur_email();
    drive(&client, &mut form, effect).await;
    assert_eq!(form.email_status(), EmailStatus::Recognized);

    form.set_quantity_input("6");
    let effect = form.submit();
    drive(&client, &mut form, effect).await;
    assert_eq!(form.error(), Some("Insufficient quantity"));
    assert_eq!(form.requester().email, "ada@lab.org");

    form.set_quantity_input("2");
    let effect = form.submit();
    drive(&client, &mut form, effect).await;
    assert_eq!(form.error(), None);
    assert_eq!(form.notice(), Some(crate::form::TRANSACTION_SUBMITTED));
    assert!(form.requester().email.is_empty());
    assert_eq!(state.bodies_for("transaction").await.len(), 2);
}
