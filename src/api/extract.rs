//! Extractors that report rejections through [`AppError`]

use axum::extract::FromRequest;

use crate::error::AppError;

/// `Json` whose rejections (malformed JSON, missing fields, wrong content type) become
/// `AppError::Validation` and are rendered with the usual `{error}` body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);
