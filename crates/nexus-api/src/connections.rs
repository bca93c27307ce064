use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use nexus_core::{present, Connection, ConnectionPatch, NewConnection, TagsInput};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{required, ApiError, ApiResult};
use crate::AppState;

pub async fn list(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<Connection>>> {
    Ok(Json(state.store.list_connections(id).await?))
}

/// Store recently used tags without failing the request that used them.
pub(crate) async fn remember(state: &AppState, user_id: i64, tags: &[String]) {
    if tags.is_empty() {
        return;
    }
    if let Err(e) = state.store.remember_tags(user_id, tags).await {
        tracing::warn!(user_id, error = %e, "could not update recent tags");
    }
}

#[derive(Debug, Deserialize)]
pub struct AddConnectionBody {
    user_id: Option<i64>,
    contact_id: Option<i64>,
    relationship_description: Option<String>,
    note: Option<String>,
    tags: Option<TagsInput>,
    what_they_are_working_on: Option<String>,
}

pub async fn add(
    State(state): State<AppState>,
    body: Result<Json<AddConnectionBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let Json(body) = body?;
    let user_id = required(body.user_id, "user_id")?;
    let contact_id = required(body.contact_id, "contact_id")?;
    let description = required(body.relationship_description, "relationship_description")?;
    let tags = body.tags.map(|t| t.normalize()).unwrap_or_default();

    state
        .store
        .add_connection(&NewConnection {
            user_id,
            contact_id,
            relationship_description: Some(description),
            note: body.note,
            tags: tags.clone(),
            what_they_are_working_on: body.what_they_are_working_on,
        })
        .await?;
    remember(&state, user_id, &tags).await;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Connection added successfully" })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct UpdateConnectionBody {
    user_id: Option<i64>,
    contact_id: Option<i64>,
    #[serde(default, deserialize_with = "present")]
    relationship_description: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    note: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    tags: Option<Option<TagsInput>>,
    #[serde(default, deserialize_with = "present")]
    what_they_are_working_on: Option<Option<String>>,
}

/// Serves both `PUT /connections` and `PUT /connections/update`.
pub async fn update(
    State(state): State<AppState>,
    body: Result<Json<UpdateConnectionBody>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(body) = body?;
    let user_id = required(body.user_id, "user_id")?;
    let contact_id = required(body.contact_id, "contact_id")?;

    // `null` or an empty list clears the column
    let tags = body
        .tags
        .map(|t| t.map(|t| t.normalize()).unwrap_or_default());
    let patch = ConnectionPatch {
        relationship_description: body.relationship_description,
        note: body.note,
        tags: tags.clone(),
        what_they_are_working_on: body.what_they_are_working_on,
    };
    if patch.is_empty() {
        return Err(ApiError::BadRequest("No fields to update".into()));
    }

    if !state.store.update_connection(user_id, contact_id, &patch).await? {
        return Err(ApiError::NotFound(format!(
            "Connection from {user_id} to {contact_id} not found"
        )));
    }
    if let Some(tags) = &tags {
        remember(&state, user_id, tags).await;
    }
    Ok(Json(json!({ "message": "Connection updated successfully" })))
}

#[derive(Debug, Deserialize)]
pub struct RemoveConnectionBody {
    user_id: Option<i64>,
    contact_id: Option<i64>,
}

pub async fn remove(
    State(state): State<AppState>,
    body: Result<Json<RemoveConnectionBody>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(body) = body?;
    let user_id = required(body.user_id, "user_id")?;
    let contact_id = required(body.contact_id, "contact_id")?;

    if state.store.get_person(user_id).await?.is_none() {
        return Err(crate::people::not_found(user_id));
    }
    if state.store.get_person(contact_id).await?.is_none() {
        return Err(ApiError::NotFound(format!(
            "Contact with ID {contact_id} not found"
        )));
    }
    if state.store.remove_connection(user_id, contact_id).await? == 0 {
        return Err(ApiError::NotFound(format!(
            "Connection from {user_id} to {contact_id} not found"
        )));
    }
    Ok(Json(json!({ "message": "Connection removed successfully" })))
}
