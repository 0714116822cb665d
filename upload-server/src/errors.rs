use actix_multipart::MultipartError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use bucket_storage::StorageError;
use thiserror::Error;


#[derive(Debug, Error)]
pub enum UploadErr {
    #[error("Form field {0} is missing")]
    MissingField(&'static str),

    #[error("Failed to parse multipart form")]
    Malformed(#[source] MultipartError),

    #[error("Upload exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("Failed to read uploaded data")]
    Read(#[source] MultipartError),

    #[error("Failed to store object")]
    Storage(#[from] StorageError),
}

impl ResponseError for UploadErr {
    fn status_code(&self) -> StatusCode {
        match self {
            UploadErr::MissingField(_) => StatusCode::BAD_REQUEST,
            UploadErr::Malformed(_) => StatusCode::BAD_REQUEST,
            UploadErr::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            UploadErr::Read(_) => StatusCode::INTERNAL_SERVER_ERROR,
            UploadErr::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    // Details stay in the server log.
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).finish()
    }
}

/// Failures that stop the process before it serves traffic.
#[derive(Debug, Error)]
pub enum ServerErr {
    #[error("Cannot create object storage")]
    Storage(#[from] StorageError),

    #[error("HTTP server failure")]
    Io(#[from] std::io::Error),
}
