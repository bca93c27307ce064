use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use nexus_core::{NewPerson, Person, PersonPatch, Profile, TagsInput};
use serde::Deserialize;

use crate::error::{required_text, ApiError, ApiResult};
use crate::AppState;

pub(crate) fn not_found(id: i64) -> ApiError {
    ApiError::NotFound(format!("User with ID {id} not found"))
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Person>>> {
    Ok(Json(state.store.list_people().await?))
}

pub async fn show(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Json<Person>> {
    let person = state.store.get_person(id).await?.ok_or_else(|| not_found(id))?;
    Ok(Json(person))
}

#[derive(Debug, Deserialize)]
pub struct CreatePersonBody {
    username: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    password: Option<String>,
    #[serde(flatten)]
    profile: Profile,
    recent_tags: Option<TagsInput>,
}

pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<CreatePersonBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Person>)> {
    let Json(body) = body?;
    let new = NewPerson {
        username: Some(required_text(body.username, "username")?),
        first_name: required_text(body.first_name, "first_name")?,
        last_name: required_text(body.last_name, "last_name")?,
        profile: body.profile,
        recent_tags: body.recent_tags.map(|t| t.normalize()),
    };
    let password = body.password.filter(|p| !p.is_empty());
    let person = state.store.create_person(&new, password.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(person)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Result<Json<PersonPatch>, JsonRejection>,
) -> ApiResult<Json<Person>> {
    let Json(patch) = body?;
    let person = state
        .store
        .update_person(id, &patch)
        .await?
        .ok_or_else(|| not_found(id))?;
    Ok(Json(person))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<Person>>> {
    let term = params
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Search term is required".into()))?;
    tracing::debug!(term = %term, "searching people");
    Ok(Json(state.store.search_people(&term).await?))
}

pub async fn recent_tags(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<String>>> {
    let tags = state.store.recent_tags(id).await?.ok_or_else(|| not_found(id))?;
    Ok(Json(tags))
}
