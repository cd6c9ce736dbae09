use super::types::*;
use super::ApiState;
use crate::account::Claims;
use crate::error::ServiceError;
use crate::resource::{Catalog, CollectionRecord};
use axum::{
    debug_handler,
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde_json::Value;
use tracing::debug;

/// Unwrap a JSON body, turning axum's plain-text rejection into a 400 JSON error.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ServiceError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| ServiceError::Validation(rejection.body_text()))
}

//
// === Accounts ===
//

/// POST /register
pub async fn handle_register<R: CollectionRecord>(
    State(state): State<ApiState<R>>,
    payload: Result<Json<CredentialsBody>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let body = json_body(payload)?;
    let username = body.username.unwrap_or_default();
    let password = body.password.unwrap_or_default();

    state.credentials.register(&username, &password).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageBody {
            message: "Usuario registrado correctamente".to_string(),
        }),
    ))
}

/// POST /login
pub async fn handle_login<R: CollectionRecord>(
    State(state): State<ApiState<R>>,
    payload: Result<Json<CredentialsBody>, JsonRejection>,
) -> Result<Json<TokenBody>, ServiceError> {
    let body = json_body(payload)?;
    let username = body.username.unwrap_or_default();
    let password = body.password.unwrap_or_default();

    let token = state.credentials.login(&username, &password).await?;
    Ok(Json(TokenBody { token }))
}

//
// === Catalog ===
//

/// GET /menu
pub async fn handle_menu<R: CollectionRecord>(State(state): State<ApiState<R>>) -> Json<Catalog> {
    Json(state.records.catalog().clone())
}

//
// === Records ===
//

/// GET /tareas
pub async fn handle_list<R: CollectionRecord>(
    State(state): State<ApiState<R>>,
) -> Result<Json<Vec<R>>, ServiceError> {
    Ok(Json(state.records.list().await?))
}

/// POST /tareas
pub async fn handle_create<R: CollectionRecord>(
    State(state): State<ApiState<R>>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<R::Draft>, JsonRejection>,
) -> Result<impl IntoResponse, ServiceError> {
    let draft = json_body(payload)?;
    let record = state.records.create(draft).await?;
    debug!("{} {} created by {}", R::ENVELOPE_KEY, record.id(), claims.username);

    let body = envelope(R::CREATED_MESSAGE, R::ENVELOPE_KEY, &record)?;
    Ok((StatusCode::CREATED, Json(body)))
}

/// PUT /tareas/:id
pub async fn handle_update<R: CollectionRecord>(
    State(state): State<ApiState<R>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    payload: Result<Json<R::Patch>, JsonRejection>,
) -> Result<Json<Value>, ServiceError> {
    let patch = json_body(payload)?;
    let record = state.records.update(&id, patch).await?;
    debug!("{} {} updated by {}", R::ENVELOPE_KEY, id, claims.username);

    Ok(Json(envelope(R::UPDATED_MESSAGE, R::ENVELOPE_KEY, &record)?))
}

/// DELETE /tareas/:id
pub async fn handle_delete<R: CollectionRecord>(
    State(state): State<ApiState<R>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ServiceError> {
    let removed = state.records.delete(&id).await?;
    debug!("{} {} deleted by {}", R::ENVELOPE_KEY, id, claims.username);

    Ok(Json(envelope(R::DELETED_MESSAGE, R::ENVELOPE_KEY, &removed)?))
}

/// Anything no route matched
#[debug_handler]
pub async fn handle_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "Ruta no encontrada".to_string(),
        }),
    )
}
