//! Request extractors reporting failures through the API error envelope.

use axum::extract::FromRequest;

use crate::error::AppError;

/// `Json<T>` whose rejections (bad syntax, missing fields, wrong content
/// type) become `400 VALIDATION_ERROR` responses.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
