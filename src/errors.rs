use actix_web::{HttpResponse, ResponseError};
use askama::Template;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    /// Malformed percent-encoding in a query string.
    Decode(String),
    /// An auxiliary fetch failed, returned a non-success status or timed out.
    Fetch(String),
    /// The UDPipe service rejected a request or could not be reached.
    Service(String),
    Template(askama::Error),
    Config(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Decode(e) => write!(f, "Decode error: {e}"),
            AppError::Fetch(e) => write!(f, "Fetch failure: {e}"),
            AppError::Service(e) => write!(f, "Service error: {e}"),
            AppError::Template(e) => write!(f, "Template error: {e}"),
            AppError::Config(e) => write!(f, "Configuration error: {e}"),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Decode(e) => HttpResponse::BadRequest().body(format!("Bad Request: {e}")),
            AppError::Fetch(_) | AppError::Service(_) => {
                log::warn!("{self}");
                HttpResponse::BadGateway().body("Bad Gateway")
            }
            _ => {
                log::error!("{self}");
                HttpResponse::InternalServerError().body("Internal Server Error")
            }
        }
    }
}

impl From<askama::Error> for AppError {
    fn from(e: askama::Error) -> Self {
        AppError::Template(e)
    }
}

impl From<std::string::FromUtf8Error> for AppError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        AppError::Decode(e.to_string())
    }
}

/// Render a template into an HTML 200 response.
pub fn render(tmpl: impl Template) -> Result<HttpResponse, AppError> {
    let html = tmpl.render()?;
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html))
}
