use crate::config::ConfigError;
use crate::decision::DecisionError;
use crate::encapsulation::{EncapsulationError, RegistryError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Decision(DecisionError),
    Registry(RegistryError),
    Encapsulation(EncapsulationError),
    Usage(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Decision(err) => write!(f, "decision error: {}", err),
            AppError::Registry(err) => write!(f, "registry error: {}", err),
            AppError::Encapsulation(err) => write!(f, "encapsulation error: {}", err),
            AppError::Usage(message) => write!(f, "usage error: {}", message),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Decision(err) => Some(err),
            AppError::Registry(err) => Some(err),
            AppError::Encapsulation(err) => Some(err),
            AppError::Usage(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Decision(DecisionError::ScenarioNotFound(_))
            | AppError::Decision(DecisionError::CriterionNotFound { .. }) => StatusCode::NOT_FOUND,
            AppError::Decision(DecisionError::DuplicateScenario(_))
            | AppError::Decision(DecisionError::DuplicateCriterion(_))
            | AppError::Registry(RegistryError::Duplicate(_)) => StatusCode::CONFLICT,
            AppError::Decision(DecisionError::OutOfRange { .. })
            | AppError::Registry(RegistryError::RatingOutOfRange { .. }) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Usage(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Encapsulation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<DecisionError> for AppError {
    fn from(value: DecisionError) -> Self {
        Self::Decision(value)
    }
}

impl From<RegistryError> for AppError {
    fn from(value: RegistryError) -> Self {
        Self::Registry(value)
    }
}

impl From<EncapsulationError> for AppError {
    fn from(value: EncapsulationError) -> Self {
        Self::Encapsulation(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decision::ScenarioId;

    #[test]
    fn maps_decision_errors_to_statuses() {
        let missing = AppError::from(DecisionError::ScenarioNotFound(ScenarioId::new("gone")));
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);

        let out_of_range = AppError::from(DecisionError::OutOfRange {
            value: 101,
            min: 0,
            max: 100,
        });
        assert_eq!(
            out_of_range.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
