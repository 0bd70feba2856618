//! Client-facing error type.
//!
//! Every failure a request can end in maps to one [`ApiError`] variant, which
//! renders as `{"detail": "<message>"}` with the matching status code.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Shown when the OCR provider rejects the image itself.
pub const UNPROCESSABLE_IMAGE_DETAIL: &str = "OCR provider couldn't process the image (E301). \
     Try re-saving the image as JPEG, upload a larger/clearer image, or paste the OCR text manually.";

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    #[error("Rate limit exceeded, try again later")]
    RateLimited,

    /// The model call failed after all retries.
    #[error("Upstream analysis service error")]
    Upstream,

    /// No JSON object could be recovered from the model output.
    #[error("Failed to parse JSON from Gemini response")]
    Parse,

    #[error("{}", UNPROCESSABLE_IMAGE_DETAIL)]
    UnprocessableImage,

    #[error("Audio transcription failed")]
    Transcription,

    /// The OCR provider reported a failure or could not be reached.
    #[error("OCR error: {0}")]
    Ocr(String),

    /// The OCR provider answered with a reply we could not read.
    #[error("OCR failed; provide OCR text manually or check server logs.")]
    OcrUnavailable,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Upstream | ApiError::Parse => StatusCode::BAD_GATEWAY,
            ApiError::UnprocessableImage => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Transcription | ApiError::Ocr(_) | ApiError::OcrUnavailable => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            log::warn!("Request failed with {status}: {self}");
        }
        (status, Json(serde_json::json!({ "detail": self.to_string() }))).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        ApiError::Validation(format!("Invalid multipart body: {}", e.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[test]
    fn status_table() {
        assert_eq!(ApiError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::RateLimited.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(ApiError::Upstream.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(ApiError::Parse.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(ApiError::UnprocessableImage.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(ApiError::Transcription.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::Ocr("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::OcrUnavailable.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn renders_detail_body() {
        let response = ApiError::Ocr("quota exceeded".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value, serde_json::json!({"detail": "OCR error: quota exceeded"}));
    }

    #[test]
    fn unprocessable_image_message() {
        assert!(ApiError::UnprocessableImage.to_string().starts_with(
            "OCR provider couldn't process the image (E301). Try re-saving"
        ));
    }
}
