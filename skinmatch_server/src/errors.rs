use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use skinmatch_engine::MatchingError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("{0}")]
    InvalidRequest(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "detail": self.to_string() }).to_string())
    }
}

impl From<MatchingError> for ServerError {
    fn from(e: MatchingError) -> Self {
        if e.is_client_error() {
            Self::InvalidRequest(e.to_string())
        } else {
            Self::BackendError(e.to_string())
        }
    }
}

#[cfg(test)]
mod test {
    use actix_web::body::MessageBody;

    use super::*;

    #[test]
    fn client_errors_map_to_400_with_detail_body() {
        let err = ServerError::from(MatchingError::InvalidRequest("Country 'ZZ' is not supported".to_string()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        let body = err.error_response().into_body().try_into_bytes().unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(body["detail"].as_str().unwrap().contains("not supported"));
    }

    #[test]
    fn backend_errors_map_to_500() {
        let err = ServerError::BackendError("db gone".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
