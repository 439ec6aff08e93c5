use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::controller::ScenarioController;
use super::criterion::{validate_value, CriterionId};
use super::mechanism::RankingEntryView;
use super::scenario::ScenarioId;
use super::DecisionError;
use crate::encapsulation::AlgorithmRegistry;

/// Shared state for the scenario endpoints.
#[derive(Clone)]
pub struct DecisionState {
    pub controller: Arc<ScenarioController>,
    pub registry: Arc<AlgorithmRegistry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ValueUpdate {
    pub value: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActivationUpdate {
    pub active: bool,
}

/// Router builder exposing scenario management and ranking over HTTP.
pub fn scenario_router(
    controller: Arc<ScenarioController>,
    registry: Arc<AlgorithmRegistry>,
) -> Router {
    Router::new()
        .route(
            "/api/v1/scenarios",
            get(list_handler).post(create_handler),
        )
        .route(
            "/api/v1/scenarios/:scenario_id",
            get(scenario_handler).delete(delete_handler),
        )
        .route(
            "/api/v1/scenarios/:scenario_id/criteria/:criterion_id/value",
            put(value_handler),
        )
        .route(
            "/api/v1/scenarios/:scenario_id/criteria/:criterion_id/active",
            put(activation_handler),
        )
        .route(
            "/api/v1/scenarios/:scenario_id/ranking",
            get(ranking_handler),
        )
        .with_state(DecisionState {
            controller,
            registry,
        })
}

pub(crate) async fn list_handler(State(state): State<DecisionState>) -> Response {
    (StatusCode::OK, Json(state.controller.scenarios())).into_response()
}

pub(crate) async fn create_handler(State(state): State<DecisionState>) -> Response {
    let scenario = state.controller.create_new_scenario();
    (StatusCode::CREATED, Json(scenario)).into_response()
}

pub(crate) async fn scenario_handler(
    State(state): State<DecisionState>,
    Path(scenario_id): Path<String>,
) -> Response {
    match state.controller.scenario(&ScenarioId(scenario_id)) {
        Ok(scenario) => (StatusCode::OK, Json(scenario)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_handler(
    State(state): State<DecisionState>,
    Path(scenario_id): Path<String>,
) -> Response {
    let id = ScenarioId(scenario_id);
    match state.controller.delete_scenario_counted(&id) {
        Ok((outcome, remaining)) => {
            let payload = json!({
                "scenario_id": id,
                "outcome": outcome,
                "remaining": remaining,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn value_handler(
    State(state): State<DecisionState>,
    Path((scenario_id, criterion_id)): Path<(String, String)>,
    Json(update): Json<ValueUpdate>,
) -> Response {
    let scenario = ScenarioId(scenario_id);
    let criterion = CriterionId(criterion_id);
    let result = validate_value(update.value)
        .and_then(|value| state.controller.set_criterion_value(&scenario, &criterion, value))
        .and_then(|_| state.controller.scenario(&scenario));

    match result {
        Ok(snapshot) => criterion_response(&snapshot, &criterion),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn activation_handler(
    State(state): State<DecisionState>,
    Path((scenario_id, criterion_id)): Path<(String, String)>,
    Json(update): Json<ActivationUpdate>,
) -> Response {
    let scenario = ScenarioId(scenario_id);
    let criterion = CriterionId(criterion_id);
    let result = state
        .controller
        .criterion_activation_change(&scenario, &criterion, update.active)
        .and_then(|_| state.controller.scenario(&scenario));

    match result {
        Ok(snapshot) => criterion_response(&snapshot, &criterion),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn ranking_handler(
    State(state): State<DecisionState>,
    Path(scenario_id): Path<String>,
) -> Response {
    let id = ScenarioId(scenario_id);
    match state.controller.rank(&id, &state.registry) {
        Ok(ranking) => {
            let entries: Vec<RankingEntryView> = ranking.iter().map(|entry| entry.view()).collect();
            let payload = json!({
                "scenario_id": id,
                "ranking": entries,
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn criterion_response(snapshot: &super::Scenario, criterion: &CriterionId) -> Response {
    match snapshot.criterion(criterion) {
        Ok(current) => (StatusCode::OK, Json(current)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) fn error_response(error: DecisionError) -> Response {
    let status = match error {
        DecisionError::ScenarioNotFound(_) | DecisionError::CriterionNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        DecisionError::DuplicateScenario(_) | DecisionError::DuplicateCriterion(_) => {
            StatusCode::CONFLICT
        }
        DecisionError::OutOfRange { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}
