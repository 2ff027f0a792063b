// Contains the Axum handler functions for each endpoint.
// These handlers process requests, interact with the image store and the
// view cache, and generate responses.

use crate::{
    app::AppState,
    error::AppError,
    models::{Person, ViewQuery},
    views::ViewData,
};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Query, State},
    http::header,
    response::{Html, IntoResponse, Redirect, Response},
};
use tracing::{debug, info};
use uuid::Uuid;

pub const MAX_UPLOAD_SIZE_BYTES: usize = 100 * 1024 * 1024; // 100MB limit for uploaded images.

// --- GET /upload ---
// Serves the upload form.
pub async fn upload_form(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let html = state.views.render("upload", &ViewData::new())?;
    Ok(Html(html))
}

// --- POST /upload ---
// Stores the multipart "image" field under its client-supplied filename,
// streaming the field body to disk chunk by chunk, then redirects to the
// view page for the new image. Fields other than "image" are ignored.
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    let request_id = Uuid::new_v4();

    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some("image") {
            debug!(
                "Ignoring multipart field: {}",
                field.name().unwrap_or("unnamed")
            );
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("The 'image' field has no filename.".into()))?;
        info!("Upload request: id={}, request_id={}", file_name, request_id);

        let mut writer = state.store.create(&file_name).await?;
        while let Some(chunk) = field.chunk().await? {
            writer.write_chunk(&chunk).await?;
        }
        let bytes_written = writer.finish().await?;
        debug!("Stored {} bytes under id={}", bytes_written, file_name);

        let location = format!("/view?id={}", urlencoding::encode(&file_name));
        return Ok(Redirect::to(&location).into_response());
    }

    Err(AppError::BadRequest(
        "Missing 'image' field in multipart request.".to_string(),
    ))
}

// --- GET /view ---
// Streams the stored image back. The Content-Type stays generic; browsers
// sniff the actual format from the bytes.
pub async fn view_image(
    State(state): State<AppState>,
    Query(query): Query<ViewQuery>,
) -> Result<Response, AppError> {
    let stream = state.store.read_stream(&query.id).await?;
    Ok((
        [(header::CONTENT_TYPE, mime::IMAGE_STAR.as_ref())],
        Body::from_stream(stream),
    )
        .into_response())
}

// --- GET /list ---
// Renders the list view with every stored image.
pub async fn list_images(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let images = state.store.list().await?;
    debug!("Listing {} stored images.", images.len());

    let mut data = ViewData::new();
    data.insert("images".to_string(), images.into());
    let html = state.views.render("list", &data)?;
    Ok(Html(html))
}

// --- GET /json ---
// Returns a fixed demo record showing JSON serialization.
pub async fn demo_json() -> Json<Person> {
    Json(Person {
        age: 12,
        name: "Afra",
        sex: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_demo_json_record_is_fixed() {
        let Json(person) = demo_json().await;
        let json = serde_json::to_value(&person).unwrap();
        assert_eq!(json, serde_json::json!({"age": 12, "name": "Afra", "sex": true}));
    }
}
