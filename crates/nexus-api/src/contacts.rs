use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use nexus_core::{NewConnection, Person, TagsInput};
use serde::{Deserialize, Serialize};

use crate::connections::remember;
use crate::error::{required, required_text, ApiResult};
use crate::people::not_found;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateContactBody {
    user_id: Option<i64>,
    contact_text: Option<String>,
    tags: Option<TagsInput>,
}

#[derive(Debug, Serialize)]
pub struct CreateContactResponse {
    success: bool,
    message: String,
    user: Person,
    user_id: i64,
    connection_error: bool,
}

/// Turn a free-text description into a new person connected to `user_id`.
///
/// Once the contact row exists the request succeeds; a failed connection is
/// reported through `connection_error` instead of an error status.
pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<CreateContactBody>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CreateContactResponse>)> {
    let Json(body) = body?;
    let user_id = required(body.user_id, "user_id")?;
    let text = required_text(body.contact_text, "contact_text")?;
    let tags = body.tags.map(|t| t.normalize()).unwrap_or_default();

    let user = state
        .store
        .get_person(user_id)
        .await?
        .ok_or_else(|| not_found(user_id))?;
    tracing::debug!(user_id, text_len = text.len(), tags = ?tags, "creating contact from text");

    let extraction = state.extractor.extract_contact(&text).await?;
    tracing::debug!(method = ?extraction.method, message = %extraction.message, "contact extracted");

    let description = state
        .extractor
        .describe_relationship(&user, &text, &tags)
        .await;

    let contact = state
        .store
        .create_contact(&extraction.first_name, &extraction.last_name, &extraction.profile)
        .await?;

    let note = Some(extraction.note).filter(|n| !n.trim().is_empty());
    let connected = state
        .store
        .add_connection(&NewConnection {
            user_id,
            contact_id: contact.id,
            relationship_description: Some(description),
            note,
            tags: tags.clone(),
            what_they_are_working_on: extraction.what_they_are_working_on,
        })
        .await;
    let connection_error = match connected {
        Ok(()) => {
            remember(&state, user_id, &tags).await;
            false
        }
        Err(e) => {
            tracing::warn!(user_id, contact_id = contact.id, error = %e, "contact created without connection");
            true
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(CreateContactResponse {
            success: true,
            message: "Contact created successfully".into(),
            user_id: contact.id,
            user: contact,
            connection_error,
        }),
    ))
}
