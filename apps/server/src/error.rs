use std::io::Error as IoError;

use sitecheck::{CheckError, ConfigError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0:#}")]
    Io(#[from] IoError),
    #[error("Address parsing error: {0}")]
    AddrParse(#[from] std::net::AddrParseError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Checker setup failed: {0}")]
    Checker(#[from] CheckError),
    #[error("Template error: {0}")]
    Template(#[from] tera::Error),
}

impl actix_web::ResponseError for AppError {
    fn error_response(&self) -> actix_web::HttpResponse {
        tracing::error!(error = %self, "request failed");
        actix_web::HttpResponse::InternalServerError().finish()
    }
}
