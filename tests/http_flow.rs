// End-to-end tests driving the router in-process
use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use rust_comanda::account::{Account, PasswordHasherConfig, SessionKeys};
use rust_comanda::api::build_app_with;
use rust_comanda::config::{AppConfig, ServiceKind};
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    app: Router,
    keys: Arc<SessionKeys>,
    config: AppConfig,
    _dir: TempDir,
}

async fn spawn(kind: ServiceKind) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let mut config = AppConfig::default();
    config.server.data_dir = dir.path().to_string_lossy().into_owned();
    config.service.kind = kind;

    let keys = Arc::new(SessionKeys::new(b"integration-secret", 3600));
    let hasher = PasswordHasherConfig::new(1).with_memory_kib(64);
    let app = build_app_with(&config, keys.clone(), hasher).await.unwrap();

    TestApp {
        app,
        keys,
        config,
        _dir: dir,
    }
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

impl TestApp {
    async fn call(&self, method: Method, uri: &str, auth: Option<&str>, body: Option<Value>) -> Reply {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        Reply {
            status,
            headers,
            body,
        }
    }

    async fn register(&self, username: &str, password: &str) -> Reply {
        self.call(
            Method::POST,
            "/register",
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await
    }

    async fn login(&self, username: &str, password: &str) -> Reply {
        self.call(
            Method::POST,
            "/login",
            None,
            Some(json!({ "username": username, "password": password })),
        )
        .await
    }

    async fn bearer(&self, username: &str, password: &str) -> String {
        assert_eq!(self.register(username, password).await.status, StatusCode::CREATED);
        let reply = self.login(username, password).await;
        assert_eq!(reply.status, StatusCode::OK);
        format!("Bearer {}", reply.body["token"].as_str().unwrap())
    }
}

#[tokio::test]
async fn test_order_lifecycle_end_to_end() {
    let app = spawn(ServiceKind::Orders).await;
    let auth = app.bearer("ana", "x1").await;

    let created = app
        .call(
            Method::POST,
            "/tareas",
            Some(&auth),
            Some(json!({ "category": "Comida", "items": [{ "sku": "COM-002" }] })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["message"], "Pedido creado");
    let order = &created.body["pedido"];
    assert_eq!(order["total"], 95.0);
    assert_eq!(order["items"][0]["cantidad"], 1);
    assert_eq!(order["estado"], "nuevo");
    let id = order["id"].as_str().unwrap().to_string();

    let updated = app
        .call(
            Method::PUT,
            &format!("/tareas/{}", id),
            Some(&auth),
            Some(json!({ "estado": "listo" })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["pedido"]["estado"], "listo");
    assert_eq!(updated.body["pedido"]["total"], 95.0);

    let deleted = app
        .call(Method::DELETE, &format!("/tareas/{}", id), Some(&auth), None)
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(deleted.body["message"], "Pedido eliminado");
    assert_eq!(deleted.body["pedido"]["id"], id.as_str());

    let listed = app.call(Method::GET, "/tareas", Some(&auth), None).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body, json!([]));
}

#[tokio::test]
async fn test_update_with_items_replaces_total() {
    let app = spawn(ServiceKind::Orders).await;
    let auth = app.bearer("ana", "x1").await;

    let created = app
        .call(
            Method::POST,
            "/tareas",
            Some(&auth),
            Some(json!({ "categoria": "Comida", "items": [{ "sku": "COM-002" }] })),
        )
        .await;
    let id = created.body["pedido"]["id"].as_str().unwrap().to_string();

    let updated = app
        .call(
            Method::PUT,
            &format!("/tareas/{}", id),
            Some(&auth),
            Some(json!({ "items": [{ "sku": "CAF-001", "cantidad": 3 }] })),
        )
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["pedido"]["total"], 105.0);
    assert_eq!(updated.body["pedido"]["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_overflowing_total_is_rejected_and_store_stays_readable() {
    let app = spawn(ServiceKind::Orders).await;
    let auth = app.bearer("ana", "x1").await;
    let overflowing = json!([{ "sku": "X", "precio": 1e308, "cantidad": 2 }]);

    let created = app
        .call(
            Method::POST,
            "/tareas",
            Some(&auth),
            Some(json!({ "categoria": "Comida", "items": [{ "sku": "COM-002" }] })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.body["pedido"]["id"].as_str().unwrap().to_string();

    let rejected_create = app
        .call(
            Method::POST,
            "/tareas",
            Some(&auth),
            Some(json!({ "categoria": "Comida", "items": overflowing.clone() })),
        )
        .await;
    assert_eq!(rejected_create.status, StatusCode::BAD_REQUEST);
    assert!(rejected_create.body["error"].is_string());

    let rejected_update = app
        .call(
            Method::PUT,
            &format!("/tareas/{}", id),
            Some(&auth),
            Some(json!({ "estado": "listo", "items": overflowing })),
        )
        .await;
    assert_eq!(rejected_update.status, StatusCode::BAD_REQUEST);

    // Nothing was written: the collection still loads and the order is unchanged
    let listed = app.call(Method::GET, "/tareas", Some(&auth), None).await;
    assert_eq!(listed.status, StatusCode::OK);
    assert_eq!(listed.body.as_array().unwrap().len(), 1);
    assert_eq!(listed.body[0]["total"], 95.0);
    assert_eq!(listed.body[0]["estado"], "nuevo");

    let raw = std::fs::read_to_string(app.config.records_path()).unwrap();
    assert!(!raw.contains("null"));
}

#[tokio::test]
async fn test_menu_only_on_orders_service() {
    let orders = spawn(ServiceKind::Orders).await;
    let menu = orders.call(Method::GET, "/menu", None, None).await;
    assert_eq!(menu.status, StatusCode::OK);
    assert_eq!(menu.body["menu"][1]["categoria"], "Comida");

    let tasks = spawn(ServiceKind::Tasks).await;
    let missing = tasks.call(Method::GET, "/menu", None, None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_task_crud_and_validation() {
    let app = spawn(ServiceKind::Tasks).await;
    let auth = app.bearer("ana", "x1").await;

    let invalid = app
        .call(Method::POST, "/tareas", Some(&auth), Some(json!({ "titulo": "solo" })))
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.body["error"], "titulo y descripcion son obligatorios");

    let created = app
        .call(
            Method::POST,
            "/tareas",
            Some(&auth),
            Some(json!({ "titulo": "Comprar", "descripcion": "pan" })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.body["tarea"]["id"].as_str().unwrap().to_string();

    let updated = app
        .call(
            Method::PUT,
            &format!("/tareas/{}", id),
            Some(&auth),
            Some(json!({ "descripcion": "pan y leche" })),
        )
        .await;
    assert_eq!(updated.body["tarea"]["titulo"], "Comprar");
    assert_eq!(updated.body["tarea"]["descripcion"], "pan y leche");

    let missing = app
        .call(Method::PUT, "/tareas/nope", Some(&auth), Some(json!({ "titulo": "x" })))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["error"], "Tarea no encontrada");

    let before = app.call(Method::GET, "/tareas", Some(&auth), None).await;
    let gone = app.call(Method::DELETE, "/tareas/nope", Some(&auth), None).await;
    let after = app.call(Method::GET, "/tareas", Some(&auth), None).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(before.body, after.body);
}

#[tokio::test]
async fn test_register_conflict_and_validation() {
    let app = spawn(ServiceKind::Tasks).await;

    let first = app.register("ana", "x1").await;
    assert_eq!(first.status, StatusCode::CREATED);
    assert!(first.body["message"].is_string());

    let second = app.register("ana", "x2").await;
    assert_eq!(second.status, StatusCode::CONFLICT);

    let stored: Vec<Value> =
        serde_json::from_str(&std::fs::read_to_string(app.config.users_path()).unwrap()).unwrap();
    assert_eq!(stored.len(), 1);

    let missing = app
        .call(Method::POST, "/register", None, Some(json!({ "username": "bob" })))
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.body["error"], "username y password son obligatorios");
}

#[tokio::test]
async fn test_login_does_not_reveal_usernames() {
    let app = spawn(ServiceKind::Tasks).await;
    app.register("ana", "x1").await;

    let wrong_password = app.login("ana", "bad").await;
    let unknown_user = app.login("nobody", "x1").await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_user.body);
}

#[tokio::test]
async fn test_session_gate() {
    let app = spawn(ServiceKind::Tasks).await;

    let no_header = app.call(Method::GET, "/tareas", None, None).await;
    assert_eq!(no_header.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        no_header.body["error"],
        "Acceso denegado: falta el header Authorization"
    );

    let bad_format = app.call(Method::GET, "/tareas", Some("Token abc"), None).await;
    assert_eq!(bad_format.status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        bad_format.body["error"],
        "Formato de Authorization invalido. Usa: Bearer <token>"
    );

    let bad_token = app.call(Method::GET, "/tareas", Some("Bearer abc"), None).await;
    assert_eq!(bad_token.status, StatusCode::FORBIDDEN);
    assert_eq!(bad_token.body["error"], "Token invalido o expirado");
}

#[tokio::test]
async fn test_token_expiry_window() {
    let app = spawn(ServiceKind::Tasks).await;
    let account = Account {
        id: "1".to_string(),
        username: "ghost".to_string(),
        password_hash: String::new(),
    };
    let now = chrono::Utc::now().timestamp() as u64;

    let fresh = app.keys.issue_at(&account, now - 59 * 60).unwrap();
    let reply = app
        .call(Method::GET, "/tareas", Some(&format!("Bearer {}", fresh)), None)
        .await;
    // Claims are not checked against the user directory, so an unknown account still passes
    assert_eq!(reply.status, StatusCode::OK);

    let stale = app.keys.issue_at(&account, now - 61 * 60).unwrap();
    let reply = app
        .call(Method::GET, "/tareas", Some(&format!("Bearer {}", stale)), None)
        .await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = spawn(ServiceKind::Tasks).await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ nope"))
        .unwrap();

    let response = app.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_unknown_route_and_cors() {
    let app = spawn(ServiceKind::Tasks).await;

    let missing = app.call(Method::GET, "/nowhere", None, None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["error"], "Ruta no encontrada");
    assert_eq!(missing.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");

    let preflight = app.call(Method::OPTIONS, "/tareas", None, None).await;
    assert_eq!(preflight.status, StatusCode::NO_CONTENT);
    assert_eq!(preflight.headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(
        preflight.headers[header::ACCESS_CONTROL_ALLOW_HEADERS],
        "Content-Type, Authorization"
    );
    assert_eq!(
        preflight.headers[header::ACCESS_CONTROL_ALLOW_METHODS],
        "GET, POST, PUT, DELETE, OPTIONS"
    );
}

#[tokio::test]
async fn test_store_files_created_at_startup() {
    let app = spawn(ServiceKind::Orders).await;
    assert_eq!(std::fs::read_to_string(app.config.users_path()).unwrap(), "[]");
    assert_eq!(std::fs::read_to_string(app.config.records_path()).unwrap(), "[]");
}

#[tokio::test]
async fn test_corrupt_store_is_opaque_500() {
    let app = spawn(ServiceKind::Tasks).await;
    let auth = app.bearer("ana", "x1").await;
    std::fs::write(app.config.records_path(), "not json").unwrap();

    let reply = app.call(Method::GET, "/tareas", Some(&auth), None).await;
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(reply.body["error"], "Error en el servidor");
}
