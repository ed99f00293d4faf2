use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::{json, Value};

use crate::db::DbError;
use crate::freshbots::ProvisioningError;
use crate::models::FieldError;

/// Body sent for every 5xx; the cause stays in the logs
const INTERNAL_ERROR_MESSAGE: &str = "We're sorry, but something went wrong.";

#[derive(Debug, thiserror::Error)]
pub enum BotAdminError {
    #[error("missing, invalid or expired credentials")]
    Unauthorized,
    #[error("user is not an account administrator")]
    AccessDenied,
    #[error("feature {0} is not enabled for the account")]
    FeatureDisabled(&'static str),
    #[error("record not found")]
    NotFound,
    #[error("request validation failed")]
    Validation(Vec<FieldError>),
    #[error("bot record is invalid")]
    RecordInvalid(Vec<FieldError>),
    #[error("error at bot side, status {status}, response {body}")]
    Provisioning { status: u16, body: Value },
    #[error("account {0} has no main portal")]
    MissingMainPortal(i64),
    #[error("database failure")]
    Database(#[from] DbError),
    #[error("provisioning call failed")]
    Transport(#[from] ProvisioningError),
}

impl BotAdminError {
    /// Failures whose cause is hidden from the caller and logged instead
    pub fn is_internal(&self) -> bool {
        self.status_code().is_server_error()
    }

    fn error_code(&self) -> &'static str {
        match self {
            BotAdminError::Unauthorized => "invalid_credentials",
            BotAdminError::AccessDenied => "access_denied",
            BotAdminError::FeatureDisabled(_) => "require_feature",
            BotAdminError::NotFound => "not_found",
            BotAdminError::Validation(_) | BotAdminError::RecordInvalid(_) => "invalid_value",
            _ => "internal_error",
        }
    }
}

impl ResponseError for BotAdminError {
    fn status_code(&self) -> StatusCode {
        match self {
            BotAdminError::Unauthorized => StatusCode::UNAUTHORIZED,
            BotAdminError::AccessDenied | BotAdminError::FeatureDisabled(_) => StatusCode::FORBIDDEN,
            BotAdminError::NotFound => StatusCode::NOT_FOUND,
            BotAdminError::Validation(_) => StatusCode::BAD_REQUEST,
            BotAdminError::RecordInvalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            BotAdminError::Provisioning { .. }
            | BotAdminError::MissingMainPortal(_)
            | BotAdminError::Database(_)
            | BotAdminError::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        match self {
            BotAdminError::NotFound => HttpResponse::build(status).finish(),
            BotAdminError::Validation(errors) | BotAdminError::RecordInvalid(errors) => {
                HttpResponse::build(status).json(json!({
                    "description": "Validation failed",
                    "errors": errors,
                }))
            }
            BotAdminError::Unauthorized => HttpResponse::build(status).json(json!({
                "code": self.error_code(),
                "message": "You have to be logged in to perform this action.",
            })),
            BotAdminError::AccessDenied => HttpResponse::build(status).json(json!({
                "code": self.error_code(),
                "message": "You are not authorized to perform this action.",
            })),
            BotAdminError::FeatureDisabled(feature) => HttpResponse::build(status).json(json!({
                "code": self.error_code(),
                "message": format!(
                    "The {} feature(s) is/are not supported in your plan. Please upgrade your account to use it.",
                    feature
                ),
            })),
            _ => HttpResponse::build(status).json(json!({
                "code": self.error_code(),
                "message": INTERNAL_ERROR_MESSAGE,
            })),
        }
    }
}
