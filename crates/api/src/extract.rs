//! Request extractors whose rejections go through [`AppError`].
//!
//! axum's own `Json`, `Query` and `Path` answer malformed input with a plain
//! text body (and 422 for a body that does not match the schema). These wrap
//! them so every bad request comes back as a JSON `validation` error.

use axum::extract::{FromRequest, FromRequestParts};

use crate::middleware::error_handling::AppError;

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ValidJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ValidQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ValidPath<T>(pub T);
