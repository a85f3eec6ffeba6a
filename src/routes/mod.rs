// Route exports
pub mod interests;
pub mod profiles;

use actix_web::dev::Payload;
use actix_web::http::{header, StatusCode};
use actix_web::{error, web, FromRequest, HttpRequest, HttpResponse, ResponseError};
use std::future::{ready, Ready};
use std::sync::Arc;

use crate::core::{InterestWorkflow, ProfileDirectory, SearchLimits, ServiceError};
use crate::models::{ErrorResponse, Principal};
use crate::services::{InterestStore, ProfileStore, TokenVerifier};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<ProfileDirectory>,
    pub interests: Arc<InterestWorkflow>,
    pub verifier: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        interests: Arc<dyn InterestStore>,
        limits: SearchLimits,
        verifier: TokenVerifier,
    ) -> Self {
        let directory = Arc::new(ProfileDirectory::new(profiles, limits));
        let workflow = Arc::new(InterestWorkflow::new(directory.clone(), interests));

        Self {
            directory,
            interests: workflow,
            verifier: Arc::new(verifier),
        }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(profiles::configure)
            .configure(interests::configure),
    );
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
            ServiceError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::InvalidOperation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::InvalidState(_) => StatusCode::CONFLICT,
            ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ServiceError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ServiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();

        // Storage details stay in the logs
        let message = match self {
            ServiceError::Storage(e) => {
                tracing::error!("Storage failure: {}", e);
                "internal storage error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(status).json(ErrorResponse {
            error: self.code().to_string(),
            message,
            status_code: status.as_u16(),
        })
    }
}

/// JSON error response for payload errors
#[derive(Debug)]
pub struct PayloadError(ErrorResponse);

impl std::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.0.error, self.0.message)
    }
}

impl std::error::Error for PayloadError {}

impl ResponseError for PayloadError {
    fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::BadRequest().json(&self.0)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    PayloadError(ErrorResponse {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    })
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    tracing::info!("Query payload error on {}: {}", req.path(), err);
    PayloadError(ErrorResponse {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    })
    .into()
}

/// Resolves the calling broker from the `Authorization` header
impl FromRequest for Principal {
    type Error = ServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = match req.app_data::<web::Data<AppState>>() {
            Some(state) => {
                let value = req
                    .headers()
                    .get(header::AUTHORIZATION)
                    .and_then(|value| value.to_str().ok());
                state.verifier.principal_from_header(value)
            }
            None => {
                tracing::error!("Application state missing, rejecting request to {}", req.path());
                Err(ServiceError::Unauthenticated)
            }
        };

        ready(result)
    }
}
