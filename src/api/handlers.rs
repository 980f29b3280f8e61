//! Request handlers

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

use crate::api::extract::ApiJson;
use crate::error::{AppError, Result};
use crate::gallery::GalleryScope;
use crate::identity::Identity;
use crate::inference::validate_prompt;
use crate::repository::{GeneratedImage, UserRecord};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateImageRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

impl GenerateImageRequest {
    fn prompt(&self) -> Result<&str> {
        let prompt = self
            .prompt
            .as_deref()
            .ok_or_else(|| AppError::Validation("prompt is required".to_string()))?;
        validate_prompt(prompt)?;
        Ok(prompt)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateImageResponse {
    pub image_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stored_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gallery: Option<Vec<GeneratedImage>>,
}

#[derive(Debug, Deserialize)]
pub struct SaveUserRequest {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct GalleryQuery {
    #[serde(default)]
    pub scope: GalleryScope,
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /generate-image`: inference only, nothing is stored
pub async fn generate_image(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<GenerateImageRequest>,
) -> Result<Json<GenerateImageResponse>> {
    let prompt = request.prompt()?;

    let image_url = state.generator.generate(prompt).await.map_err(|e| {
        error!(error = %e, "Error generating image");
        e
    })?;

    info!("Image generated successfully");
    Ok(Json(GenerateImageResponse { image_url }))
}

/// `POST /generations`: the full workflow for the calling user
pub async fn create_generation(
    State(state): State<Arc<AppState>>,
    identity: Option<Extension<Identity>>,
    ApiJson(request): ApiJson<GenerateImageRequest>,
) -> Result<Json<GenerationResponse>> {
    let prompt = request.prompt()?;
    let identity = identity.map(|Extension(identity)| identity);

    let outcome = state.workflow.run(prompt, identity.as_ref()).await.map_err(|e| {
        error!(error = %e, stage = ?e.stage(), "Error processing image");
        e
    })?;

    Ok(Json(GenerationResponse {
        image_url: outcome.image_data_uri,
        stored_url: outcome.stored.map(|stored| stored.public_url),
        gallery: outcome.gallery,
    }))
}

/// `GET /images?scope=all|mine`
pub async fn list_images(
    State(state): State<Arc<AppState>>,
    identity: Option<Extension<Identity>>,
    Query(query): Query<GalleryQuery>,
) -> Result<Json<Vec<GeneratedImage>>> {
    let identity = identity.map(|Extension(identity)| identity);
    let images = state.gallery.list(query.scope, identity.as_ref()).await?;
    Ok(Json(images))
}

async fn save(state: &AppState, request: SaveUserRequest) -> Result<()> {
    info!(user_id = %request.id, "Attempting to save user");

    if request.id.trim().is_empty() {
        return Err(AppError::Validation("user id is required".to_string()));
    }
    state
        .users
        .upsert_user(UserRecord {
            id: request.id,
            email: request.email.unwrap_or_default(),
            last_sign_in: Utc::now(),
        })
        .await
}

/// `POST /save-user`: synchronous user mirror write. Every failure, including an
/// unreadable body, answers `{message, error}`.
pub async fn save_user(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<SaveUserRequest>, JsonRejection>,
) -> Response {
    let result = match payload {
        Ok(Json(request)) => save(&state, request).await,
        Err(rejection) => Err(AppError::from(rejection)),
    };

    match result {
        Ok(()) => {
            info!("User saved successfully");
            Json(MessageResponse {
                message: "User saved successfully".to_string(),
            })
            .into_response()
        }
        Err(e) => {
            error!(error = %e, "Error saving user");
            (
                e.status_code(),
                Json(json!({ "message": "Error saving user", "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

/// `POST /events/signed-in`: sign-in notification from the identity provider
pub async fn signed_in(
    State(state): State<Arc<AppState>>,
    identity: Option<Extension<Identity>>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let Some(Extension(identity)) = identity else {
        return Err(AppError::Unauthenticated(
            "signed-in event without a user".to_string(),
        ));
    };

    // Fire and forget; the mirror logs its own failures.
    drop(state.user_mirror.on_signed_in(&identity));

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: "User sync scheduled".to_string(),
        }),
    ))
}
