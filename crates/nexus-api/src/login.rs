use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    username: Option<String>,
    password: Option<String>,
}

fn login_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "status": "error", "message": message }))).into_response()
}

/// Login replies use `{status, message}` rather than the usual `{error}` shape.
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginBody>, JsonRejection>,
) -> Response {
    let credentials = body
        .ok()
        .and_then(|Json(b)| Some((b.username?, b.password?)));
    let Some((username, password)) = credentials else {
        return login_error(StatusCode::BAD_REQUEST, "Username and password are required");
    };

    let person = match state.store.verify_login(&username, &password).await {
        Ok(Some(id)) => state.store.get_person(id).await,
        Ok(None) => {
            return login_error(StatusCode::UNAUTHORIZED, "Invalid username or password");
        }
        Err(e) => Err(e),
    };
    match person {
        Ok(Some(user)) => {
            tracing::info!(user_id = user.id, "login succeeded");
            Json(json!({ "status": "success", "user_id": user.id, "user": user })).into_response()
        }
        Ok(None) => login_error(StatusCode::UNAUTHORIZED, "Invalid username or password"),
        Err(e) => {
            tracing::error!(error = %e, "login failed");
            login_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Login service unavailable. Please try again later.",
            )
        }
    }
}

/// Always 200; the client fires this on app open and ignores failures.
pub async fn update_last_login(State(state): State<AppState>, Path(id): Path<i64>) -> Response {
    let message = match state.store.get_person(id).await {
        Ok(None) => {
            tracing::debug!(id, "last login for unknown user");
            "User not found but operation recorded"
        }
        Ok(Some(_)) => match state.store.touch_last_login(id).await {
            Ok(true) => "Last login timestamp updated successfully",
            Ok(false) => "No update needed for last login",
            Err(e) => {
                tracing::warn!(id, error = %e, "could not record last login");
                "Error recorded but continuing operation"
            }
        },
        Err(e) => {
            tracing::warn!(id, error = %e, "could not record last login");
            "Error recorded but continuing operation"
        }
    };
    Json(json!({ "message": message })).into_response()
}
