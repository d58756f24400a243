use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use bytes::Bytes;
use crate::errors::{AppError, AppResult};
use crate::models::{predictions_to_json, ClassifyUrlRequest};
use crate::services::{ClassificationOutput, ImageSource};
use crate::state::AppState;
use super::extract::AppJson;

pub const TOKENS_REMAINING_HEADER: &str = "x-tokens-remaining";

pub async fn classify_url(
    State(state): State<AppState>,
    AppJson(request): AppJson<ClassifyUrlRequest>,
) -> AppResult<Response> {
    tracing::debug!("Classify-by-url request from {}", request.username);

    let output = state
        .classification
        .classify(&request.username, &request.password, ImageSource::Url(request.url))
        .await?;

    Ok(classification_response(output))
}

// Credentials and the image travel together as multipart form fields
struct UploadForm {
    username: Option<String>,
    password: Option<String>,
    image: Option<Bytes>,
}

pub async fn classify_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Response> {
    // A wrong content type is rejected here, before any field is read
    let mut multipart = multipart?;
    let form = read_upload_form(&mut multipart).await?;

    let username = form
        .username
        .ok_or_else(|| AppError::InvalidInput("Missing username field".into()))?;
    let password = form
        .password
        .ok_or_else(|| AppError::InvalidInput("Missing password field".into()))?;

    tracing::debug!("Classify-by-upload request from {}", username);

    let output = state
        .classification
        .classify(&username, &password, ImageSource::Upload(form.image))
        .await?;

    Ok(classification_response(output))
}

async fn read_upload_form(multipart: &mut Multipart) -> AppResult<UploadForm> {
    let mut form = UploadForm {
        username: None,
        password: None,
        image: None,
    };

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "username" => form.username = Some(field.text().await?),
            "password" => form.password = Some(field.text().await?),
            "image" => {
                // A form submitted without choosing a file carries an empty filename
                let selected = field.file_name().map(|f| !f.is_empty()).unwrap_or(false);
                let data = field.bytes().await?;
                if selected {
                    tracing::debug!("Received image upload of {} bytes", data.len());
                    form.image = Some(data);
                } else {
                    tracing::debug!("Image field present but no file selected");
                }
            }
            other => {
                tracing::warn!("Unexpected form field: {}", other);
            }
        }
    }

    Ok(form)
}

fn classification_response(output: ClassificationOutput) -> Response {
    (
        StatusCode::OK,
        [(TOKENS_REMAINING_HEADER, output.remaining_tokens.to_string())],
        Json(predictions_to_json(&output.predictions)),
    )
        .into_response()
}
