pub(crate) mod entity;
pub(crate) mod instance;
pub(crate) mod property;

use axum::extract::rejection::JsonRejection;
use axum::Json;

use crate::ApiError;

/// Unwraps a JSON body, turning framework rejections into `ApiError`s so
/// they render with the same `{"message": ...}` shape.
pub(crate) fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    let Json(value) = payload?;
    Ok(value)
}
